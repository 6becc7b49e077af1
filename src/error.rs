//! Compiler-wide diagnostic type: one enum variant per error category rather
//! than a single opaque `String`.

use std::fmt;

/// Any failure that can terminate compilation.
#[derive(Debug, Clone, PartialEq)]
pub enum CompileError {
    /// An illegal byte was found while scanning (line, offending text).
    Lexical { line: usize, message: String },
    /// The parser hit an unexpected token or premature end of input.
    Syntax { line: usize, message: String },
    /// A declaration is ill-formed: duplicate name, bad bound, bad discriminator, ...
    Declaration { line: usize, message: String },
    /// An expression or statement has the wrong type.
    Typing { line: usize, message: String },
    /// A variable was read before any path initialized it.
    UseBeforeInit { line: usize, name: String },
    /// The code generator found a symbol or tag the analyzer should have rejected.
    Internal { message: String },
}

impl CompileError {
    pub fn lexical(line: usize, message: impl Into<String>) -> Self {
        CompileError::Lexical { line, message: message.into() }
    }

    pub fn syntax(line: usize, message: impl Into<String>) -> Self {
        CompileError::Syntax { line, message: message.into() }
    }

    pub fn declaration(line: usize, message: impl Into<String>) -> Self {
        CompileError::Declaration { line, message: message.into() }
    }

    pub fn typing(line: usize, message: impl Into<String>) -> Self {
        CompileError::Typing { line, message: message.into() }
    }

    pub fn use_before_init(line: usize, name: impl Into<String>) -> Self {
        CompileError::UseBeforeInit { line, name: name.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        CompileError::Internal { message: message.into() }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Lexical { line, message } => {
                write!(f, "line {line}: lexical error: {message}")
            }
            CompileError::Syntax { line, message } => {
                write!(f, "line {line}: syntax error: {message}")
            }
            CompileError::Declaration { line, message } => {
                write!(f, "line {line}: declaration error: {message}")
            }
            CompileError::Typing { line, message } => {
                write!(f, "line {line}: type error: {message}")
            }
            CompileError::UseBeforeInit { line, name } => {
                write!(f, "line {line}: '{name}' used before being initialized")
            }
            CompileError::Internal { message } => {
                write!(f, "internal compiler error: {message}")
            }
        }
    }
}

impl std::error::Error for CompileError {}

impl From<std::io::Error> for CompileError {
    fn from(e: std::io::Error) -> Self {
        CompileError::Internal { message: format!("I/O error: {e}") }
    }
}

impl From<std::fmt::Error> for CompileError {
    fn from(e: std::fmt::Error) -> Self {
        CompileError::Internal { message: format!("output formatting error: {e}") }
    }
}
