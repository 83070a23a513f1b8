//! Jack Compiler — single-pass Jack to VM code compiler.
//!
//! Compiles Jack source straight to Hack VM code for the Nand2Tetris
//! virtual machine, in one pass with no intermediate AST:
//!
//! - [`tokenizer`] segments characters into classified tokens.
//! - [`symbol_table`] assigns each variable a VM segment and index.
//! - [`vm_writer`] emits VM instruction text.
//! - [`engine`] drives all three with one-token lookahead recursive descent.
//!
//! # Usage
//!
//! ```no_run
//! use jack_compiler::{compile_file, compile_directory};
//! use std::path::Path;
//!
//! // Compile a single file.
//! let result = compile_file(Path::new("Main.jack"));
//!
//! // Compile every .jack file under a directory, recursively.
//! let results = compile_directory(Path::new("Square/"));
//! ```

pub mod engine;
pub mod error;
pub mod symbol_table;
pub mod token;
pub mod tokenizer;
pub mod vm_writer;

use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

pub use engine::CompilationEngine;
pub use error::CompileError;
pub use symbol_table::{SymbolKind, SymbolTable, Type, VarInfo};
pub use tokenizer::JackTokenizer;
pub use vm_writer::VMWriter;

/// Result of compiling a single Jack file.
#[derive(Debug)]
pub struct CompileResult {
    /// The filename (without extension) that was compiled.
    pub filename: String,
    /// The original `.jack` path, when compiled from disk (absent for
    /// in-memory `compile_source` calls).
    pub source_path: Option<PathBuf>,
    /// The generated VM code (empty if an error occurred).
    pub vm_code: String,
    /// The error that aborted compilation, if any. Compilation stops at
    /// the first error (spec.md §4.4/§7 — no error recovery).
    pub error: Option<CompileError>,
}

impl CompileResult {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Compile a single Jack file from disk.
pub fn compile_file(path: &Path) -> CompileResult {
    let filename = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string();

    let source = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            return CompileResult {
                filename,
                source_path: Some(path.to_path_buf()),
                vm_code: String::new(),
                error: Some(CompileError::io(path, e)),
            };
        }
    };

    let mut result = compile_source(&source, &filename);
    result.source_path = Some(path.to_path_buf());
    result
}

/// Compile Jack source text held in memory.
pub fn compile_source(source: &str, filename: &str) -> CompileResult {
    let filename = filename.to_string();

    let tokens = match JackTokenizer::new(source).tokenize() {
        Ok(tokens) => tokens,
        Err(e) => {
            return CompileResult {
                filename,
                source_path: None,
                vm_code: String::new(),
                error: Some(e),
            };
        }
    };

    match CompilationEngine::compile(tokens) {
        Ok(vm_code) => CompileResult {
            filename,
            source_path: None,
            vm_code,
            error: None,
        },
        Err(e) => CompileResult {
            filename,
            source_path: None,
            vm_code: String::new(),
            error: Some(e),
        },
    }
}

/// Recursively collect every `.jack` file under `dir` (spec.md §6:
/// "Directory traversal is recursive").
fn collect_jack_files(dir: &Path) -> Result<Vec<PathBuf>, CompileError> {
    let mut files = Vec::new();
    let mut stack = vec![dir.to_path_buf()];

    while let Some(current) = stack.pop() {
        let entries = fs::read_dir(&current).map_err(|e| CompileError::io(&current, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| CompileError::io(&current, e))?;
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.extension().is_some_and(|ext| ext == "jack") {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Compile every `.jack` file found recursively under `dir`. File-level
/// compilation is independent (spec.md §5), so files are compiled in
/// parallel.
pub fn compile_directory(dir: &Path) -> Vec<CompileResult> {
    let jack_files = match collect_jack_files(dir) {
        Ok(files) => files,
        Err(e) => {
            return vec![CompileResult {
                filename: dir.to_string_lossy().to_string(),
                source_path: None,
                vm_code: String::new(),
                error: Some(e),
            }];
        }
    };

    jack_files
        .par_iter()
        .map(|path| compile_file(path))
        .collect()
}

/// Write a compile result's VM code to disk.
///
/// When `output_dir` is given, the `.vm` file is written there as
/// `<filename>.vm`. Otherwise it is written alongside the original
/// source file (spec.md §6: `foo.jack` → `foo.vm`), which requires
/// `result.source_path` to be set (i.e. the result came from
/// `compile_file`/`compile_directory`, not `compile_source`).
pub fn write_result(
    result: &CompileResult,
    output_dir: Option<&Path>,
) -> Result<(), CompileError> {
    let vm_path = match output_dir {
        Some(dir) => dir.join(format!("{}.vm", result.filename)),
        None => match &result.source_path {
            Some(src) => src.with_extension("vm"),
            None => PathBuf::from(format!("{}.vm", result.filename)),
        },
    };
    fs::write(&vm_path, &result.vm_code).map_err(|e| CompileError::io(&vm_path, e))
}
