//! Error taxonomy for tokenizing, parsing, evaluating and sampling.

use thiserror::Error;

/// Raised by the lexer and parser when an expression is malformed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyntaxError {
    #[error("Unexpected character '{ch}' at offset {offset}")]
    UnexpectedCharacter { ch: char, offset: usize },

    #[error("Unterminated string starting at offset {0}")]
    UnterminatedString(usize),

    #[error("Invalid number literal '{text}' at offset {offset}")]
    InvalidNumber { text: String, offset: usize },

    #[error("Unexpected {found} at offset {offset}, expected {expected}")]
    UnexpectedToken {
        found: String,
        expected: String,
        offset: usize,
    },

    #[error("Unexpected end of expression, expected {0}")]
    UnexpectedEof(String),

    #[error("Expression nests too deeply at offset {offset}")]
    NestingTooDeep { offset: usize },
}

/// Raised by the sampling primitives when a fraction or hash falls outside
/// the fixed-width key space.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RangeError {
    #[error("Fraction {0} is outside of the range [0, 1]")]
    FractionOutOfRange(f64),

    #[error("Hash '{0}' is not exactly 64 hex characters")]
    InvalidHashLength(String),

    #[error("Bucket total must be positive, got {0}")]
    InvalidBucketTotal(i64),
}

/// Raised while walking an expression tree.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("Unknown operator: {0}")]
    UnknownOperator(String),

    #[error("Unknown transform: {0}")]
    UnknownTransform(String),

    #[error("Type error: {0}")]
    TypeError(String),

    #[error("Invalid arguments for transform '{name}': {message}")]
    InvalidArguments { name: String, message: String },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid regular expression: {0}")]
    InvalidRegex(String),

    #[error(transparent)]
    Range(#[from] RangeError),

    /// Error raised by a host-registered operator or transform.
    #[error("{0}")]
    Custom(String),
}

/// Any failure surfaced by [`crate::Engine`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Syntax error: {0}")]
    Syntax(#[from] SyntaxError),

    #[error("Evaluation error: {0}")]
    Eval(EvalError),

    #[error("Range error: {0}")]
    Range(#[from] RangeError),
}

impl From<EvalError> for Error {
    fn from(e: EvalError) -> Self {
        match e {
            EvalError::Range(r) => Error::Range(r),
            other => Error::Eval(other),
        }
    }
}

impl Error {
    pub fn is_syntax(&self) -> bool {
        matches!(self, Error::Syntax(_))
    }

    pub fn is_eval(&self) -> bool {
        matches!(self, Error::Eval(_))
    }

    pub fn is_range(&self) -> bool {
        matches!(self, Error::Range(_))
    }
}
