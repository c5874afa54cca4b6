use std::path::PathBuf;

use thiserror::Error;

use crate::lexer::TokenKind;

/// Error type returned by user-supplied template functions
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Input position that no token category could classify
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized input at position {position}")]
pub struct LexError {
    pub position: usize,
}

/// Grammar violation found while parsing a token stream
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "expected {}, found {} at position {position}",
    describe_expected(.expected),
    describe_found(.found)
)]
pub struct SyntaxError {
    pub expected: Vec<TokenKind>,
    /// `None` when the input ended early
    pub found: Option<TokenKind>,
    pub position: usize,
}

fn describe_expected(expected: &[TokenKind]) -> String {
    match expected {
        [] => "nothing".to_string(),
        [only] => only.to_string(),
        [init @ .., last] => {
            let init: Vec<String> = init.iter().map(ToString::to_string).collect();
            format!("{} or {}", init.join(", "), last)
        }
    }
}

fn describe_found(found: &Option<TokenKind>) -> String {
    match found {
        Some(kind) => kind.to_string(),
        None => "end of input".to_string(),
    }
}

/// Calls nested past the supported depth
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("calls nested deeper than {limit} levels at position {position}")]
pub struct NestingError {
    pub limit: usize,
    pub position: usize,
}

/// Failure while rendering a parsed document
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("undefined variable <{name}>")]
    UndefinedVariable { name: String },

    #[error("undefined function ${name} taking {arity} argument(s)")]
    UndefinedFunction { name: String, arity: usize },

    #[error("function ${name} failed: {cause}")]
    FunctionFailure {
        name: String,
        #[source]
        cause: BoxError,
    },

    #[error("calls nested deeper than {limit} levels")]
    NestingTooDeep { limit: usize },
}

/// Any failure turning template source into output
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    Nesting(#[from] NestingError),

    #[error(transparent)]
    Eval(#[from] EvalError),
}

/// Invalid arguments passed to a built-in function
#[derive(Debug, Error)]
pub enum BuiltinError {
    #[error("argument {position} must be true or false, got {value:?}")]
    NotBoolean { position: usize, value: String },

    #[error("argument {position} must be a non-negative integer, got {value:?}")]
    NotInteger { position: usize, value: String },

    #[error("argument {position} must be a single character, got {value:?}")]
    NotChar { position: usize, value: String },

    #[error("start index {start} is past the end of a string of length {length}")]
    OutOfRange { start: usize, length: usize },

    #[error(transparent)]
    Regex(#[from] regex::Error),

    #[error("cannot parse {value:?} as a date or date/time")]
    InvalidDateTime { value: String },

    #[error("invalid date/time format {format:?}")]
    InvalidFormat { format: String },

    #[error("{key:?} is not defined in {table}")]
    UndefinedKey { table: String, key: String },

    #[error("width {width} exceeds the limit of {limit}")]
    TooWide { width: usize, limit: usize },

    #[error("cannot evaluate {expression:?}: {message}")]
    Calc { expression: String, message: String },
}

/// Problem loading or validating an output set
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error("output {name:?} is defined more than once")]
    DuplicateOutput { name: String },

    #[error("output {name:?} has an invalid template {template:?}: {source}")]
    InvalidTemplate {
        name: String,
        template: String,
        #[source]
        source: Error,
    },
}

/// Failure rendering one entry of an output set
#[derive(Debug, Error)]
#[error("failed to render output {name:?} = {template:?}: {source}")]
pub struct OutputError {
    pub name: String,
    pub template: String,
    #[source]
    pub source: EvalError,
}
