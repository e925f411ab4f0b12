//! Pebble Compiler
//!
//! A small whole-program compiler for Pebble: a statically typed,
//! expression-oriented toy language with integers, booleans, local
//! variables, block scoping, `if`/`while`, and a fixed set of built-in
//! functions (`print_int`, `print_bool`, `read_int`).
//!
//! The pipeline is a straight line of pure functions, each consuming its
//! predecessor's output: [`tokenizer::tokenize`] → [`parser::Parser`] →
//! [`typechecker::TypeChecker`] → either [`interpreter::Interpreter`] (the
//! `interpret` command) or [`ir_generator::IrGenerator`] → [`asm::generate_assembly`]
//! (the `ir`/`asm`/`compile` commands). Every pass threads the same
//! [`pebble_core::SourceLocation`] and uses its own instantiation of
//! [`pebble_core::SymbolTable`] over whatever payload it tracks.

pub mod asm;
pub mod ast;
pub mod builtins;
pub mod config;
pub mod errors;
pub mod interpreter;
pub mod ir;
pub mod ir_generator;
pub mod parser;
pub mod runtime;
pub mod test_runner;
pub mod tokenizer;
pub mod typechecker;

use std::fs;
use std::path::Path;
use std::process::Command;

use ast::{Expr, ExprKind, Literal};
use config::CompilerConfig;
use errors::ParseError;
use pebble_core::SourceLocation;

/// Parses `source` into a single root expression. An empty token stream is
/// the parser's sentinel "no program" (`Ok(None)`); every downstream pass
/// needs an `Expr` to walk, so it's represented here as the `Unit` literal
/// it's observably equivalent to (empty program, nothing happens, nothing
/// is printed).
pub fn parse_program(file: &str, source: &str) -> Result<Expr, ParseError> {
    match parser::Parser::new(file, source).parse()? {
        Some(expr) => Ok(expr),
        None => Ok(Expr::new(
            SourceLocation::stdin(1, 1),
            ExprKind::Literal(Literal::Unit),
        )),
    }
}

/// Runs tokenize → parse → typecheck → IR generation, returning the flat
/// instruction list. Used by the `ir`/`asm`/`compile`/`test-prints`/`end`
/// commands and by the bundled test runner.
pub fn generate_ir(file: &str, source: &str) -> Result<Vec<ir::Instruction>, String> {
    let expr = parse_program(file, source).map_err(|e| e.to_string())?;
    typechecker::TypeChecker::new()
        .check(&expr)
        .map_err(|e| e.to_string())?;
    Ok(ir_generator::IrGenerator::generate_program(&expr))
}

/// Runs the full pipeline through assembly generation, returning the
/// AT&T-syntax text.
pub fn generate_asm(file: &str, source: &str) -> Result<String, String> {
    let instructions = generate_ir(file, source)?;
    asm::generate_assembly(&instructions).map_err(|e| e.to_string())
}

/// Compiles `source` all the way to a native executable at `output`,
/// shelling out to the system assembler/linker (`config.cc`, default `cc`)
/// exactly the way the teacher's `compile_file_with_config` shells out to
/// `clang`: write the generated text to a temp file, invoke the compiler
/// driver once, check its exit status, clean up.
pub fn compile_to_executable(
    file: &str,
    source: &str,
    output: &Path,
    config: &CompilerConfig,
) -> Result<(), String> {
    let assembly = generate_asm(file, source)?;

    let asm_path = output.with_extension("s");
    fs::write(&asm_path, &assembly)
        .map_err(|e| format!("failed to write assembly file: {e}"))?;

    let runtime_path = runtime::write_to_temp_file()?;

    let result = Command::new(&config.cc)
        .arg(&asm_path)
        .arg(&runtime_path)
        .arg("-o")
        .arg(output)
        .output();

    fs::remove_file(&runtime_path).ok();
    if !config.keep_asm {
        fs::remove_file(&asm_path).ok();
    }

    let output_status = result.map_err(|e| format!("failed to run '{}': {e}", config.cc))?;
    if !output_status.status.success() {
        let stderr = String::from_utf8_lossy(&output_status.stderr);
        return Err(format!("{} failed:\n{stderr}", config.cc));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_source_parses_as_unit() {
        let expr = parse_program("t.pebble", "").unwrap();
        assert!(matches!(expr.kind, ExprKind::Literal(Literal::Unit)));
    }

    #[test]
    fn generate_ir_surfaces_type_errors_as_strings() {
        let err = generate_ir("t.pebble", "1 + true").unwrap_err();
        assert!(!err.is_empty());
    }

    #[test]
    fn generate_asm_wraps_ir_with_program_boilerplate() {
        let asm = generate_asm("t.pebble", "1 + 1").unwrap();
        assert!(asm.contains("main:"));
        assert!(asm.contains("call print_int"));
    }
}
