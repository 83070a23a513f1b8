//! Two-level symbol table for the Jack compiler.
//!
//! The symbol table maintains two scopes:
//! - **Class scope**: `static` and `field` variables, persists across subroutines
//! - **Subroutine scope**: `argument` and `local` variables, reset per subroutine
//!
//! Lookup is subroutine-first, allowing local variables to shadow class-level ones.

use std::collections::HashMap;

/// A variable's type: one of the three primitives, or a class name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Int,
    Char,
    Boolean,
    ClassName(String),
}

impl Type {
    pub fn as_str(&self) -> &str {
        match self {
            Type::Int => "int",
            Type::Char => "char",
            Type::Boolean => "boolean",
            Type::ClassName(name) => name,
        }
    }
}

/// The kind of symbol, determining its VM segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    /// Class-level static variable → `static` segment
    Static,
    /// Class-level field variable → `this` segment
    Field,
    /// Subroutine argument → `argument` segment
    Argument,
    /// Subroutine local variable → `local` segment
    Local,
}

impl SymbolKind {
    /// Convert to VM segment name — the single point of truth for the
    /// kind-to-segment mapping (spec §4.4).
    #[inline]
    pub fn to_segment(self) -> &'static str {
        match self {
            SymbolKind::Static => "static",
            SymbolKind::Field => "this",
            SymbolKind::Argument => "argument",
            SymbolKind::Local => "local",
        }
    }

    /// Check if this is a class-level symbol.
    #[inline]
    pub fn is_class_level(self) -> bool {
        matches!(self, SymbolKind::Static | SymbolKind::Field)
    }
}

/// A symbol entry in the symbol table (`VarInfo` in spec §3).
#[derive(Debug, Clone)]
pub struct VarInfo {
    pub name: String,
    pub var_type: Type,
    pub kind: SymbolKind,
    pub index: u16,
}

impl VarInfo {
    /// Get the VM segment for this symbol.
    #[inline]
    pub fn segment(&self) -> &'static str {
        self.kind.to_segment()
    }
}

/// Two-level symbol table for Jack compilation.
///
/// Class scope (`static`, `field`) persists for the whole class; subroutine
/// scope (`arg`, `var`) is cleared at the start of every subroutine.
#[derive(Debug, Default)]
pub struct SymbolTable {
    class_scope: HashMap<String, VarInfo>,
    subroutine_scope: HashMap<String, VarInfo>,
    static_count: u16,
    field_count: u16,
    argument_count: u16,
    local_count: u16,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear class-level symbols and zero the static/field counters.
    /// Called at the start of `compile_class`.
    pub fn reset_class(&mut self) {
        self.class_scope.clear();
        self.static_count = 0;
        self.field_count = 0;
        self.reset_subroutine();
    }

    /// Clear subroutine-level symbols and zero the argument/local counters.
    /// Class-level symbols remain accessible. Called at the start of every
    /// subroutine (spec §3 invariants).
    pub fn reset_subroutine(&mut self) {
        self.subroutine_scope.clear();
        self.argument_count = 0;
        self.local_count = 0;
    }

    /// Define a new symbol in the scope implied by its kind.
    ///
    /// `index` is assigned as the current count for that kind, then the
    /// counter is incremented. Per spec §4.2, a duplicate name within one
    /// scope **overwrites** the prior entry rather than raising an error —
    /// the newest definition wins, and it still consumes a fresh index (it
    /// does not reuse the shadowed entry's index).
    pub fn add(&mut self, name: &str, var_type: Type, kind: SymbolKind) -> u16 {
        let index = match kind {
            SymbolKind::Static => {
                let i = self.static_count;
                self.static_count += 1;
                i
            }
            SymbolKind::Field => {
                let i = self.field_count;
                self.field_count += 1;
                i
            }
            SymbolKind::Argument => {
                let i = self.argument_count;
                self.argument_count += 1;
                i
            }
            SymbolKind::Local => {
                let i = self.local_count;
                self.local_count += 1;
                i
            }
        };

        let symbol = VarInfo {
            name: name.to_string(),
            var_type,
            kind,
            index,
        };

        if kind.is_class_level() {
            self.class_scope.insert(name.to_string(), symbol);
        } else {
            self.subroutine_scope.insert(name.to_string(), symbol);
        }

        index
    }

    /// Look up a symbol by name, searching subroutine scope first so that
    /// locals/args shadow same-named class members.
    pub fn find(&self, name: &str) -> Option<&VarInfo> {
        self.subroutine_scope
            .get(name)
            .or_else(|| self.class_scope.get(name))
    }

    /// Count of symbols already defined for a given kind.
    pub fn var_count(&self, kind: SymbolKind) -> u16 {
        match kind {
            SymbolKind::Static => self.static_count,
            SymbolKind::Field => self.field_count,
            SymbolKind::Argument => self.argument_count,
            SymbolKind::Local => self.local_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_symbol_table_is_empty() {
        let table = SymbolTable::new();
        assert_eq!(table.var_count(SymbolKind::Static), 0);
        assert_eq!(table.var_count(SymbolKind::Field), 0);
        assert_eq!(table.var_count(SymbolKind::Argument), 0);
        assert_eq!(table.var_count(SymbolKind::Local), 0);
        assert!(table.find("x").is_none());
    }

    #[test]
    fn test_add_static_variables() {
        let mut table = SymbolTable::new();
        table.reset_class();

        table.add("a", Type::Int, SymbolKind::Static);
        table.add("b", Type::Int, SymbolKind::Static);

        assert_eq!(table.var_count(SymbolKind::Static), 2);

        let a = table.find("a").unwrap();
        assert_eq!(a.kind, SymbolKind::Static);
        assert_eq!(a.index, 0);
        assert_eq!(a.segment(), "static");

        let b = table.find("b").unwrap();
        assert_eq!(b.index, 1);
    }

    #[test]
    fn test_add_field_variables() {
        let mut table = SymbolTable::new();
        table.reset_class();

        table.add("x", Type::Int, SymbolKind::Field);
        table.add("y", Type::Int, SymbolKind::Field);

        assert_eq!(table.var_count(SymbolKind::Field), 2);

        let x = table.find("x").unwrap();
        assert_eq!(x.segment(), "this");
        assert_eq!(x.index, 0);
        assert_eq!(table.find("y").unwrap().index, 1);
    }

    #[test]
    fn test_index_counters_are_independent_per_kind() {
        let mut table = SymbolTable::new();
        table.reset_class();

        table.add("a", Type::Int, SymbolKind::Static);
        table.add("b", Type::Int, SymbolKind::Static);
        table.add("c", Type::Int, SymbolKind::Field);

        assert_eq!(table.find("a").unwrap().index, 0);
        assert_eq!(table.find("b").unwrap().index, 1);
        assert_eq!(table.find("c").unwrap().index, 0);
    }

    #[test]
    fn test_subroutine_scope() {
        let mut table = SymbolTable::new();
        table.reset_class();
        table.reset_subroutine();

        table.add("x", Type::Int, SymbolKind::Argument);
        table.add("y", Type::Int, SymbolKind::Local);

        assert_eq!(table.var_count(SymbolKind::Argument), 1);
        assert_eq!(table.var_count(SymbolKind::Local), 1);
        assert_eq!(table.find("x").unwrap().segment(), "argument");
        assert_eq!(table.find("y").unwrap().segment(), "local");
    }

    #[test]
    fn test_subroutine_reset_clears_locals_but_not_class_scope() {
        let mut table = SymbolTable::new();
        table.reset_class();
        table.add("field1", Type::Int, SymbolKind::Field);

        table.reset_subroutine();
        table.add("x", Type::Int, SymbolKind::Local);
        assert!(table.find("x").is_some());
        assert!(table.find("field1").is_some());

        table.reset_subroutine();
        assert!(table.find("x").is_none());
        assert_eq!(table.var_count(SymbolKind::Local), 0);
        assert!(table.find("field1").is_some());
    }

    #[test]
    fn test_subroutine_scope_shadows_class_scope() {
        let mut table = SymbolTable::new();
        table.reset_class();
        table.add("x", Type::Int, SymbolKind::Field);

        table.reset_subroutine();
        table.add("x", Type::Boolean, SymbolKind::Local);

        let sym = table.find("x").unwrap();
        assert_eq!(sym.kind, SymbolKind::Local);
        assert_eq!(sym.var_type, Type::Boolean);
    }

    #[test]
    fn test_duplicate_definition_in_same_scope_overwrites_silently() {
        // spec §4.2: the newest definition wins, no error is raised.
        let mut table = SymbolTable::new();
        table.reset_class();
        table.reset_subroutine();

        table.add("x", Type::Int, SymbolKind::Local);
        table.add("x", Type::Boolean, SymbolKind::Local);

        let sym = table.find("x").unwrap();
        assert_eq!(sym.var_type, Type::Boolean);
        assert_eq!(sym.index, 1, "each add still consumes a fresh index");
        assert_eq!(table.var_count(SymbolKind::Local), 2);
    }

    #[test]
    fn test_kind_to_segment_mapping() {
        assert_eq!(SymbolKind::Static.to_segment(), "static");
        assert_eq!(SymbolKind::Field.to_segment(), "this");
        assert_eq!(SymbolKind::Argument.to_segment(), "argument");
        assert_eq!(SymbolKind::Local.to_segment(), "local");
    }

    #[test]
    fn test_synthetic_this_argument_for_methods() {
        let mut table = SymbolTable::new();
        table.reset_class();
        table.reset_subroutine();

        table.add("this", Type::ClassName("Test".to_string()), SymbolKind::Argument);
        table.add("x", Type::Int, SymbolKind::Argument);
        table.add("y", Type::Int, SymbolKind::Argument);

        assert_eq!(table.find("this").unwrap().index, 0);
        assert_eq!(table.find("x").unwrap().index, 1);
        assert_eq!(table.find("y").unwrap().index, 2);
        assert_eq!(table.var_count(SymbolKind::Argument), 3);
    }
}
