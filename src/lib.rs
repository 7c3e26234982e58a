pub mod ast;
pub mod cli;
pub mod diagnostic;
pub mod format;
pub mod interpreter;
pub mod lexer;
pub mod stream;
pub mod token;
pub mod value;

pub use ast::Expr;
pub use interpreter::{parse_only, run, run_in, runtime, Error, RuntimeError, Scope};
pub use lexer::Lexer;
pub use token::{Kind, Token};
pub use value::Value;
