use std::fmt;

use super::parser::ParseError;
use crate::diagnostic::Diagnostic;
use crate::lexer::LexError;

/// Evaluation failures. Runtime errors carry reproduction context
/// (names, operators, offending values) rather than source positions.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// Undefined variable on get/set, with a snapshot of every name
    /// bound in the chain at the time of the failure.
    Scope {
        action: &'static str,
        name: String,
        bound: Vec<String>,
    },
    /// Assignment whose left side is not a bare reference.
    Reference { target: String },
    /// Non-numeric operand, non-callable call, non-indexable body,
    /// non-numeric index, or a parameter annotation mismatch.
    Type { message: String },
    /// Division or modulo by zero.
    Arithmetic { operator: String },
    /// Vector or string index outside `0 <= i < len`.
    Index { index: f64, length: usize },
}

impl RuntimeError {
    pub fn scope(action: &'static str, name: impl Into<String>, bound: Vec<String>) -> Self {
        Self::Scope { action, name: name.into(), bound }
    }

    pub fn reference(target: impl Into<String>) -> Self {
        Self::Reference { target: target.into() }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::Type { message: message.into() }
    }

    pub fn arithmetic(operator: impl Into<String>) -> Self {
        Self::Arithmetic { operator: operator.into() }
    }

    pub fn index(index: f64, length: usize) -> Self {
        Self::Index { index, length }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            Self::Scope { action, name, bound } => {
                Diagnostic::error(format!("Cannot {action} undefined variable '{name}'"))
                    .with_code("E0301")
                    .with_note(format!("bound names: {}", bound.join(", ")))
            }
            Self::Reference { target } => {
                Diagnostic::error(format!("Cannot assign to the non-variable {target}"))
                    .with_code("E0302")
            }
            Self::Type { message } => Diagnostic::error(message.clone()).with_code("E0303"),
            Self::Arithmetic { .. } => {
                Diagnostic::error("Unable to divide by 0!").with_code("E0304")
            }
            Self::Index { index, length } => Diagnostic::error(format!(
                "Index {index} is out of bounds for length {length}"
            ))
            .with_code("E0305"),
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scope { action, name, bound } => {
                write!(f, "Cannot {action} undefined variable '{name}'")?;
                if !bound.is_empty() {
                    write!(f, " (bound: {})", bound.join(", "))?;
                }
                Ok(())
            }
            Self::Reference { target } => {
                write!(f, "Cannot assign to the non-variable {target}")
            }
            Self::Type { message } => write!(f, "Type error: {message}"),
            Self::Arithmetic { operator } => {
                write!(f, "Unable to divide by 0! (operator `{operator}`)")
            }
            Self::Index { index, length } => {
                write!(f, "Index {index} is out of bounds for length {length}")
            }
        }
    }
}

impl std::error::Error for RuntimeError {}

/// Top-level failure surfaced by `run`/`parse_only`: one of the three
/// pipeline stages, each convertible to a renderable diagnostic.
#[derive(Debug, Clone)]
pub enum Error {
    Lex(LexError),
    Parse(ParseError),
    Runtime(RuntimeError),
}

impl Error {
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            Self::Lex(err) => err.to_diagnostic(),
            Self::Parse(err) => err.to_diagnostic(),
            Self::Runtime(err) => err.to_diagnostic(),
        }
    }

    pub fn is_runtime(&self) -> bool {
        matches!(self, Self::Runtime(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lex(err) => err.fmt(f),
            Self::Parse(err) => err.fmt(f),
            Self::Runtime(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {}

impl From<LexError> for Error {
    fn from(err: LexError) -> Self {
        Self::Lex(err)
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Self::Parse(err)
    }
}

impl From<RuntimeError> for Error {
    fn from(err: RuntimeError) -> Self {
        Self::Runtime(err)
    }
}
