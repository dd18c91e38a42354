//! Error types for the AutoMaTA interpreter
//!
//! Every error is unrecoverable at the point of detection: the run is
//! aborted and the error is reported with the name of the scope it
//! happened in. There is no partial continuation.

use std::fmt;

/// Error kinds in AutoMaTA
#[derive(Debug, Clone)]
pub enum ErrorKind {
    // Lookup errors
    UnknownVariable(String),
    UnknownFunction(String),
    UnknownLibrary(String),

    // Registration errors
    VariableExists(String),
    FunctionExists(String),

    // Evaluation errors
    TypeMismatch {
        name: String,
        expected: &'static str,
        got: &'static str,
    },
    MissingOperand(String),

    // Parse errors
    ExpectedNumber(String),
    UnterminatedString(String),
    MacroArity {
        key: String,
        expected: usize,
        got: usize,
    },
    MalformedMacro(String),
    UnterminatedBlock(String),
    UnterminatedFunction(String),
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::UnknownVariable(name) => {
                write!(f, "tried resolving unknown variable '{}'", name)
            }
            ErrorKind::UnknownFunction(name) => {
                write!(f, "tried calling unknown function '{}'", name)
            }
            ErrorKind::UnknownLibrary(name) => write!(f, "unknown library '{}'", name),
            ErrorKind::VariableExists(name) => {
                write!(f, "tried registering variable '{}' but it already exists", name)
            }
            ErrorKind::FunctionExists(name) => {
                write!(f, "tried registering function '{}' but it already exists", name)
            }
            ErrorKind::TypeMismatch { name, expected, got } => {
                write!(f, "expected '{}' to be {}, got {}", name, expected, got)
            }
            ErrorKind::MissingOperand(op) => {
                write!(f, "operator '{}' is missing its right operand", op)
            }
            ErrorKind::ExpectedNumber(text) => {
                write!(f, "expected number, got '{}'", text)
            }
            ErrorKind::UnterminatedString(text) => {
                write!(f, "unterminated string literal in '{}'", text)
            }
            ErrorKind::MacroArity { key, expected, got } => {
                write!(
                    f,
                    "macro '{}' called with {} arguments, expected {}",
                    key, got, expected
                )
            }
            ErrorKind::MalformedMacro(line) => write!(f, "malformed macro definition '{}'", line),
            ErrorKind::UnterminatedBlock(opener) => {
                write!(f, "'{}' block is never closed", opener)
            }
            ErrorKind::UnterminatedFunction(name) => {
                write!(f, "function '@{}' is never closed with '@'", name)
            }
        }
    }
}

/// An AutoMaTA error, optionally tagged with the scope it occurred in
#[derive(Debug, Clone)]
pub struct AmtaError {
    pub kind: ErrorKind,
    pub scope: Option<String>,
}

impl AmtaError {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, scope: None }
    }

    pub fn in_scope(kind: ErrorKind, scope: &str) -> Self {
        Self {
            kind,
            scope: Some(scope.to_string()),
        }
    }
}

impl fmt::Display for AmtaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(scope) = &self.scope {
            write!(f, "[scope: {}] {}", scope, self.kind)
        } else {
            write!(f, "error: {}", self.kind)
        }
    }
}

impl std::error::Error for AmtaError {}

/// Result type for AutoMaTA operations
pub type Result<T> = std::result::Result<T, AmtaError>;
