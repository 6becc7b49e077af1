//! Compiler library: compiles a Pascal-dialect source string to textual
//! stack-machine assembly.

pub mod ast;
pub mod codegen;
pub mod constexpr;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod sema;
pub mod symtab;
pub mod token;
pub mod types;

pub use ast::Program;
pub use error::CompileError;

use tracing::{debug, info};

/// Runs the full pipeline: lex, parse, analyze, generate.
pub fn compile(source: &str) -> Result<String, CompileError> {
    let tokens = lexer::lex(source)?;
    debug!(count = tokens.len(), "lexed tokens");

    let program = parser::parse(tokens)?;
    debug!(name = %program.name, "parsed program");

    sema::analyze(&program)?;
    info!(name = %program.name, "semantic analysis passed");

    let asm = codegen::generate(&program)?;
    info!(bytes = asm.len(), "generated assembly");

    Ok(asm)
}
