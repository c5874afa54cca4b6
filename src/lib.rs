//! Lexer, parser and renderer for output templates.
//!
//! A template mixes literal text with `<Variable>` references and
//! `$Function(arg, ...)` calls whose arguments are templates themselves:
//!
//! ```text
//! v<Major>.<Minor>.$PadLeft(<Build>, 4, 0)
//! ```
//!
//! Rendering is strictly linear: [`tokenize`] feeds [`Parser`], whose
//! [`Document`] is rendered by a [`Renderer`] against a [`VariableSource`]
//! and a [`FunctionSource`]. Every stage fails on the first error.

mod ast;
mod builtins;
mod error;
mod lexer;
mod outputs;
mod parser;
mod processor;
mod registry;
mod template;

pub use ast::{Document, MAX_NESTING, Node};
pub use error::{
    BoxError, BuiltinError, ConfigError, Error, EvalError, LexError, NestingError, OutputError,
    SyntaxError,
};
pub use lexer::{Token, TokenKind, tokenize};
pub use outputs::{OutputDef, OutputSet, TEMPORARY_PREFIX};
pub use parser::Parser;
pub use processor::{FunctionSource, Renderer, VariableSource, render};
pub use registry::{Arity, FunctionRegistry, MissingKey};
pub use template::Template;

/// Tokenize and parse a template into its document tree
pub fn parse(input: &str) -> Result<Document, Error> {
    let tokens = tokenize(input)?;
    Parser::new(tokens).parse()
}
