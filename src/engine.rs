//! Compilation engine: a recursive-descent parser with one-token lookahead
//! that compiles Jack source straight to VM code, without ever building an
//! intermediate AST. Every grammar production either consumes tokens,
//! updates the symbol tables, or emits VM instructions — usually all three.

use crate::error::CompileError;
use crate::symbol_table::{SymbolKind, SymbolTable, Type, VarInfo};
use crate::token::{Keyword, Span, Token};
use crate::tokenizer::TokenStream;
use crate::vm_writer::VMWriter;

/// Maximum expression nesting depth before the engine bails out with a
/// syntax error, guarding against stack overflow on pathological input
/// like `((((((...))))))`.
const MAX_EXPR_DEPTH: usize = 250;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubroutineKind {
    Constructor,
    Function,
    Method,
}

/// Drives tokenizer, symbol tables and VM writer together to compile one
/// Jack class.
pub struct CompilationEngine {
    tokens: TokenStream,
    symbols: SymbolTable,
    vm: VMWriter,
    label_counter: u32,
    expr_depth: usize,
    class_name: String,
    current_subroutine: String,
}

impl CompilationEngine {
    /// Compile a single Jack class (the unit of compilation; spec.md §1
    /// notes each class compiles independently) from its token stream,
    /// returning the generated VM code.
    pub fn compile(tokens: Vec<crate::token::SpannedToken>) -> Result<String, CompileError> {
        let mut engine = Self {
            tokens: TokenStream::new(tokens),
            symbols: SymbolTable::new(),
            vm: VMWriter::new(),
            label_counter: 0,
            expr_depth: 0,
            class_name: String::new(),
            current_subroutine: String::new(),
        };
        engine.compile_class()?;
        Ok(engine.vm.into_output())
    }

    /// "ClassName" before any subroutine is entered, "ClassName.subName"
    /// once inside one — used for diagnostic context (spec.md §7).
    fn context(&self) -> String {
        if self.current_subroutine.is_empty() {
            self.class_name.clone()
        } else {
            format!("{}.{}", self.class_name, self.current_subroutine)
        }
    }

    fn next_label_id(&mut self) -> u32 {
        self.label_counter += 1;
        self.label_counter
    }

    fn lookup_or_error(&self, name: &str, span: Span) -> Result<VarInfo, CompileError> {
        self.symbols
            .find(name)
            .cloned()
            .ok_or_else(|| CompileError::undefined_variable(name, span, self.context()))
    }

    /// Consume `int | char | boolean | <identifier>`.
    fn parse_type(&mut self) -> Result<Type, CompileError> {
        let ty = match self.tokens.current().token.clone() {
            Token::Keyword(Keyword::Int) => Type::Int,
            Token::Keyword(Keyword::Char) => Type::Char,
            Token::Keyword(Keyword::Boolean) => Type::Boolean,
            Token::Identifier(name) => Type::ClassName(name),
            other => {
                let span = self.tokens.current_span();
                return Err(CompileError::invalid_type(&other, span, self.context()));
            }
        };
        self.tokens.advance();
        Ok(ty)
    }

    // ========================================================================
    // Class
    // ========================================================================

    fn compile_class(&mut self) -> Result<(), CompileError> {
        self.tokens.expect_keyword(Keyword::Class, "<top level>")?;
        self.class_name = self.tokens.expect_identifier("<top level>")?;
        self.symbols.reset_class();
        self.tokens.expect_symbol('{', &self.context())?;

        while self.tokens.at_keyword(Keyword::Static) || self.tokens.at_keyword(Keyword::Field) {
            self.compile_class_var_dec()?;
        }

        while self.tokens.at_keyword(Keyword::Constructor)
            || self.tokens.at_keyword(Keyword::Function)
            || self.tokens.at_keyword(Keyword::Method)
        {
            self.compile_subroutine()?;
            self.current_subroutine.clear();
        }

        self.tokens.expect_symbol('}', &self.context())?;
        Ok(())
    }

    fn compile_class_var_dec(&mut self) -> Result<(), CompileError> {
        let kind = if self.tokens.at_keyword(Keyword::Static) {
            self.tokens.advance();
            SymbolKind::Static
        } else {
            self.tokens.expect_keyword(Keyword::Field, &self.context())?;
            SymbolKind::Field
        };

        let var_type = self.parse_type()?;
        let name = self.tokens.expect_identifier(&self.context())?;
        self.symbols.add(&name, var_type.clone(), kind);

        while self.tokens.at_symbol(',') {
            self.tokens.advance();
            let name = self.tokens.expect_identifier(&self.context())?;
            self.symbols.add(&name, var_type.clone(), kind);
        }

        self.tokens.expect_symbol(';', &self.context())
    }

    // ========================================================================
    // Subroutine
    // ========================================================================

    fn compile_subroutine(&mut self) -> Result<(), CompileError> {
        self.symbols.reset_subroutine();

        let sub_kind = match self.tokens.keyword_val()? {
            Keyword::Constructor => SubroutineKind::Constructor,
            Keyword::Function => SubroutineKind::Function,
            Keyword::Method => SubroutineKind::Method,
            _ => {
                let span = self.tokens.current_span();
                return Err(CompileError::syntax(
                    span,
                    "constructor | function | method",
                    &self.tokens.current().token.clone(),
                    self.context(),
                ));
            }
        };
        self.tokens.advance();

        if sub_kind == SubroutineKind::Method {
            self.symbols.add(
                "this",
                Type::ClassName(self.class_name.clone()),
                SymbolKind::Argument,
            );
        }

        if self.tokens.at_keyword(Keyword::Void) {
            self.tokens.advance();
        } else {
            self.parse_type()?;
        }

        let sub_name = self.tokens.expect_identifier(&self.context())?;
        self.current_subroutine = sub_name.clone();

        self.tokens.expect_symbol('(', &self.context())?;
        self.compile_parameter_list()?;
        self.tokens.expect_symbol(')', &self.context())?;

        self.tokens.expect_symbol('{', &self.context())?;

        // Consume every `var` declaration before emitting anything, so the
        // `function` header below can carry the correct local count — the
        // single-pass design's critical ordering constraint (spec.md §5).
        while self.tokens.at_keyword(Keyword::Var) {
            self.compile_var_dec()?;
        }

        let local_count = self.symbols.var_count(SymbolKind::Local);
        self.vm
            .write_function(&format!("{}.{}", self.class_name, sub_name), local_count);

        match sub_kind {
            SubroutineKind::Constructor => {
                let field_count = self.symbols.var_count(SymbolKind::Field);
                self.vm.write_push("constant", field_count);
                self.vm.write_call("Memory.alloc", 1);
                self.vm.write_pop("pointer", 0);
            }
            SubroutineKind::Method => {
                self.vm.write_push("argument", 0);
                self.vm.write_pop("pointer", 0);
            }
            SubroutineKind::Function => {}
        }

        self.compile_statements()?;
        self.tokens.expect_symbol('}', &self.context())
    }

    fn compile_parameter_list(&mut self) -> Result<(), CompileError> {
        if self.tokens.at_symbol(')') {
            return Ok(());
        }
        loop {
            let var_type = self.parse_type()?;
            let name = self.tokens.expect_identifier(&self.context())?;
            self.symbols.add(&name, var_type, SymbolKind::Argument);
            if self.tokens.at_symbol(',') {
                self.tokens.advance();
                continue;
            }
            break;
        }
        Ok(())
    }

    fn compile_var_dec(&mut self) -> Result<(), CompileError> {
        self.tokens.expect_keyword(Keyword::Var, &self.context())?;
        let var_type = self.parse_type()?;
        let name = self.tokens.expect_identifier(&self.context())?;
        self.symbols.add(&name, var_type.clone(), SymbolKind::Local);

        while self.tokens.at_symbol(',') {
            self.tokens.advance();
            let name = self.tokens.expect_identifier(&self.context())?;
            self.symbols.add(&name, var_type.clone(), SymbolKind::Local);
        }

        self.tokens.expect_symbol(';', &self.context())
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn compile_statements(&mut self) -> Result<(), CompileError> {
        loop {
            if self.tokens.at_keyword(Keyword::Let) {
                self.compile_let()?;
            } else if self.tokens.at_keyword(Keyword::If) {
                self.compile_if()?;
            } else if self.tokens.at_keyword(Keyword::While) {
                self.compile_while()?;
            } else if self.tokens.at_keyword(Keyword::Do) {
                self.compile_do()?;
            } else if self.tokens.at_keyword(Keyword::Return) {
                self.compile_return()?;
            } else {
                return Ok(());
            }
        }
    }

    fn compile_let(&mut self) -> Result<(), CompileError> {
        self.tokens.expect_keyword(Keyword::Let, &self.context())?;
        let span = self.tokens.current_span();
        let name = self.tokens.expect_identifier(&self.context())?;
        let symbol = self.lookup_or_error(&name, span)?;

        if self.tokens.at_symbol('[') {
            self.tokens.advance();
            self.vm.write_push(symbol.segment(), symbol.index);
            self.compile_expression()?;
            self.tokens.expect_symbol(']', &self.context())?;
            self.vm.write_arithmetic("add");

            self.tokens.expect_symbol('=', &self.context())?;
            self.compile_expression()?;

            // Standard Nand2Tetris three-step array store: stash the RHS,
            // then re-derive the target address, so the address computed
            // above survives evaluating the RHS expression.
            self.vm.write_pop("temp", 0);
            self.vm.write_pop("pointer", 1);
            self.vm.write_push("temp", 0);
            self.vm.write_pop("that", 0);
        } else {
            self.tokens.expect_symbol('=', &self.context())?;
            self.compile_expression()?;
            self.vm.write_pop(symbol.segment(), symbol.index);
        }

        self.tokens.expect_symbol(';', &self.context())
    }

    fn compile_if(&mut self) -> Result<(), CompileError> {
        self.tokens.expect_keyword(Keyword::If, &self.context())?;
        self.tokens.expect_symbol('(', &self.context())?;
        self.compile_expression()?;
        self.tokens.expect_symbol(')', &self.context())?;
        self.vm.write_arithmetic("not");

        let n = self.next_label_id();
        let start_label = format!("IF_START_{}", n);
        let end_label = format!("IF_END_{}", n);

        self.vm.write_if_goto(&start_label);
        self.tokens.expect_symbol('{', &self.context())?;
        self.compile_statements()?;
        self.tokens.expect_symbol('}', &self.context())?;
        self.vm.write_goto(&end_label);
        self.vm.write_label(&start_label);

        if self.tokens.at_keyword(Keyword::Else) {
            self.tokens.advance();
            self.tokens.expect_symbol('{', &self.context())?;
            self.compile_statements()?;
            self.tokens.expect_symbol('}', &self.context())?;
        }

        self.vm.write_label(&end_label);
        Ok(())
    }

    fn compile_while(&mut self) -> Result<(), CompileError> {
        let n = self.next_label_id();
        let start_label = format!("WHILE_START_{}", n);
        let end_label = format!("WHILE_END_{}", n);

        self.tokens.expect_keyword(Keyword::While, &self.context())?;
        self.vm.write_label(&start_label);
        self.tokens.expect_symbol('(', &self.context())?;
        self.compile_expression()?;
        self.tokens.expect_symbol(')', &self.context())?;
        self.vm.write_arithmetic("not");
        self.vm.write_if_goto(&end_label);

        self.tokens.expect_symbol('{', &self.context())?;
        self.compile_statements()?;
        self.tokens.expect_symbol('}', &self.context())?;
        self.vm.write_goto(&start_label);

        self.vm.write_label(&end_label);
        Ok(())
    }

    fn compile_do(&mut self) -> Result<(), CompileError> {
        self.tokens.expect_keyword(Keyword::Do, &self.context())?;
        let name = self.tokens.expect_identifier(&self.context())?;
        self.compile_call(name)?;
        self.vm.write_pop("temp", 0);
        self.tokens.expect_symbol(';', &self.context())
    }

    fn compile_return(&mut self) -> Result<(), CompileError> {
        self.tokens.expect_keyword(Keyword::Return, &self.context())?;
        if self.tokens.at_symbol(';') {
            self.vm.write_push("constant", 0);
        } else {
            self.compile_expression()?;
        }
        self.tokens.expect_symbol(';', &self.context())?;
        self.vm.write_return();
        Ok(())
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn compile_expression(&mut self) -> Result<(), CompileError> {
        self.compile_term()?;

        loop {
            let op = match &self.tokens.current().token {
                Token::Symbol(c) if "+-*/&|<>=".contains(*c) => *c,
                _ => return Ok(()),
            };
            self.tokens.advance();
            self.compile_term()?;
            match op {
                '+' => self.vm.write_arithmetic("add"),
                '-' => self.vm.write_arithmetic("sub"),
                '&' => self.vm.write_arithmetic("and"),
                '|' => self.vm.write_arithmetic("or"),
                '<' => self.vm.write_arithmetic("lt"),
                '>' => self.vm.write_arithmetic("gt"),
                '=' => self.vm.write_arithmetic("eq"),
                '*' => self.vm.write_call("Math.multiply", 2),
                '/' => self.vm.write_call("Math.divide", 2),
                _ => unreachable!("guarded by the match above"),
            }
        }
    }

    fn compile_term(&mut self) -> Result<(), CompileError> {
        self.expr_depth += 1;
        if self.expr_depth > MAX_EXPR_DEPTH {
            self.expr_depth -= 1;
            let span = self.tokens.current_span();
            let found = self.tokens.current().token.clone();
            return Err(CompileError::syntax(
                span,
                "an expression within the nesting limit",
                &found,
                self.context(),
            ));
        }
        let result = self.compile_term_inner();
        self.expr_depth -= 1;
        result
    }

    fn compile_term_inner(&mut self) -> Result<(), CompileError> {
        match self.tokens.current().token.clone() {
            Token::IntegerConstant(n) => {
                self.tokens.advance();
                self.vm.write_push("constant", n);
            }

            Token::StringConstant(s) => {
                self.tokens.advance();
                self.compile_string_constant(&s);
            }

            Token::Keyword(Keyword::True) => {
                self.tokens.advance();
                self.vm.write_push("constant", 1);
                self.vm.write_arithmetic("neg");
            }
            Token::Keyword(Keyword::False) | Token::Keyword(Keyword::Null) => {
                self.tokens.advance();
                self.vm.write_push("constant", 0);
            }
            Token::Keyword(Keyword::This) => {
                self.tokens.advance();
                self.vm.write_push("pointer", 0);
            }
            Token::Keyword(other) => {
                let span = self.tokens.current_span();
                return Err(CompileError::invalid_keyword_constant(
                    other.as_str(),
                    span,
                    self.context(),
                ));
            }

            Token::Symbol('-') => {
                self.tokens.advance();
                self.compile_term()?;
                self.vm.write_arithmetic("neg");
            }
            Token::Symbol('~') => {
                self.tokens.advance();
                self.compile_term()?;
                self.vm.write_arithmetic("not");
            }
            Token::Symbol('(') => {
                self.tokens.advance();
                self.compile_expression()?;
                self.tokens.expect_symbol(')', &self.context())?;
            }

            Token::Identifier(name) => {
                let span = self.tokens.current_span();
                match self.tokens.peek_ahead(1) {
                    Some(Token::Symbol('[')) => {
                        self.tokens.advance();
                        let symbol = self.lookup_or_error(&name, span)?;
                        self.vm.write_push(symbol.segment(), symbol.index);
                        self.tokens.expect_symbol('[', &self.context())?;
                        self.compile_expression()?;
                        self.tokens.expect_symbol(']', &self.context())?;
                        self.vm.write_arithmetic("add");
                        self.vm.write_pop("pointer", 1);
                        self.vm.write_push("that", 0);
                    }
                    Some(Token::Symbol('(')) | Some(Token::Symbol('.')) => {
                        self.tokens.advance();
                        self.compile_call(name)?;
                    }
                    _ => {
                        self.tokens.advance();
                        let symbol = self.lookup_or_error(&name, span)?;
                        self.vm.write_push(symbol.segment(), symbol.index);
                    }
                }
            }

            other => {
                let span = self.tokens.current_span();
                return Err(CompileError::syntax(span, "a term", &other, self.context()));
            }
        }
        Ok(())
    }

    fn compile_string_constant(&mut self, s: &str) {
        self.vm.write_push("constant", s.chars().count() as u16);
        self.vm.write_call("String.new", 1);
        for c in s.chars() {
            self.vm.write_push("constant", c as u16);
            self.vm.write_call("String.appendChar", 2);
        }
    }

    /// Compile a subroutine call. `id` is the identifier already consumed
    /// by the caller (either the leading name in a `do` statement, or a
    /// term whose lookahead was `(`/`.`); `current_token` on entry is the
    /// `(` or `.` that follows it.
    fn compile_call(&mut self, id: String) -> Result<(), CompileError> {
        let (callee, mut n_args) = if let Some(symbol) = self.symbols.find(&id).cloned() {
            // `id` resolves to a variable: a method call on that object.
            self.vm.write_push(symbol.segment(), symbol.index);
            let class = match &symbol.var_type {
                Type::ClassName(name) => name.clone(),
                other => other.as_str().to_string(),
            };
            (class, 1u16)
        } else if self.tokens.at_symbol('.') {
            // `id` is a class name: a function or constructor call, no
            // implicit receiver.
            (id.clone(), 0u16)
        } else {
            // Bare call: a method on the current object.
            self.vm.write_push("pointer", 0);
            (self.class_name.clone(), 1u16)
        };

        let sub_name = if self.tokens.at_symbol('.') {
            self.tokens.advance();
            self.tokens.expect_identifier(&self.context())?
        } else {
            id
        };

        self.tokens.expect_symbol('(', &self.context())?;
        let arg_count = self.compile_expression_list()?;
        self.tokens.expect_symbol(')', &self.context())?;
        n_args += arg_count;

        self.vm
            .write_call(&format!("{}.{}", callee, sub_name), n_args);
        Ok(())
    }

    fn compile_expression_list(&mut self) -> Result<u16, CompileError> {
        if self.tokens.at_symbol(')') {
            return Ok(0);
        }
        self.compile_expression()?;
        let mut count = 1u16;
        while self.tokens.at_symbol(',') {
            self.tokens.advance();
            self.compile_expression()?;
            count += 1;
        }
        Ok(count)
    }
}
