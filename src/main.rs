//! Jack Compiler CLI - Compiles Jack files to VM code.
//!
//! Usage:
//!     jack_compiler <file.jack | directory>
//!     jack_compiler <file.jack | directory> --output <dir>

use clap::Parser as ClapParser;
use jack_compiler::{compile_directory, compile_file, write_result};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(ClapParser, Debug)]
#[command(name = "jack_compiler")]
#[command(version = "1.0.0")]
#[command(about = "Jack to VM code compiler")]
#[command(author = "nand2tetris")]
struct Args {
    /// Input file or directory (searched recursively for `.jack` files)
    #[arg(value_name = "INPUT", default_value = ".")]
    input: PathBuf,

    /// Output directory (defaults to alongside each input file)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let results = if args.input.is_file() {
        vec![compile_file(&args.input)]
    } else if args.input.is_dir() {
        compile_directory(&args.input)
    } else {
        eprintln!("Error: Input not found: {}", args.input.display());
        return ExitCode::from(2);
    };

    if results.is_empty() {
        eprintln!("Error: No .jack files found in {}", args.input.display());
        return ExitCode::from(2);
    }

    let mut has_errors = false;

    for result in &results {
        if result.is_ok() {
            match write_result(result, args.output.as_deref()) {
                Ok(()) => {
                    println!("Compiled {}.jack -> {}.vm", result.filename, result.filename);
                }
                Err(e) => {
                    eprintln!("Error writing {}.vm: {}", result.filename, e);
                    has_errors = true;
                }
            }
        } else {
            has_errors = true;
            if let Some(err) = &result.error {
                eprintln!("{}: {}", result.filename, err);
            }
        }
    }

    if has_errors {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}
