pub mod ast;
#[cfg(feature = "cli")]
pub mod cli;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod operators;
pub mod parser;
pub mod registry;
pub mod sampling;
pub mod transform;
pub mod value;

pub use ast::{Expr, Token, TokenKind};
pub use engine::Engine;
pub use error::{Error, EvalError, RangeError, SyntaxError};
pub use evaluator::{EvalContext, Evaluator};
pub use lexer::Lexer;
pub use parser::Parser;
pub use registry::{EvalFuture, Registry, TransformFn, sync_transform};
pub use sampling::{bucket_sample, fraction_to_key, stable_sample};
pub use value::Value;
