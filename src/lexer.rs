use std::fmt;

use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;
use tracing::trace;

use crate::error::LexError;

#[derive(Parser)]
#[grammar = "template.pest"]
struct TemplateLexer;

/// Category of a lexed token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Variable reference: `<Name>`
    Var,
    /// Function name: `$Name`, always followed by `(`
    Func,
    /// Any run of characters that starts no other token
    Text,
    LParen,
    RParen,
    Comma,
    /// Spaces and tabs, never newlines
    Whitespace,
    Newline,
}

impl TokenKind {
    fn from_rule(rule: Rule) -> Option<Self> {
        match rule {
            Rule::var => Some(TokenKind::Var),
            Rule::func => Some(TokenKind::Func),
            Rule::text => Some(TokenKind::Text),
            Rule::lparen => Some(TokenKind::LParen),
            Rule::rparen => Some(TokenKind::RParen),
            Rule::comma => Some(TokenKind::Comma),
            Rule::blank => Some(TokenKind::Whitespace),
            Rule::newline => Some(TokenKind::Newline),
            _ => None,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Var => "variable",
            TokenKind::Func => "function",
            TokenKind::Text => "text",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::Comma => "','",
            TokenKind::Whitespace => "whitespace",
            TokenKind::Newline => "newline",
        };
        f.write_str(name)
    }
}

/// A classified slice of the template source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    /// Byte offset of the token in the source
    pub position: usize,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind, text: &'a str, position: usize) -> Self {
        Self {
            kind,
            text,
            position,
        }
    }

    /// The name a `Var` or `Func` token refers to, without its delimiters.
    /// Other kinds return their text unchanged.
    pub fn name(&self) -> &'a str {
        match self.kind {
            TokenKind::Func => self.text.strip_prefix('$').unwrap_or(self.text),
            TokenKind::Var => self
                .text
                .strip_prefix('<')
                .and_then(|t| t.strip_suffix('>'))
                .unwrap_or(self.text),
            _ => self.text,
        }
    }

    /// Byte offset just past the end of this token
    pub fn end(&self) -> usize {
        self.position + self.text.len()
    }

    fn from_pair(pair: Pair<'a, Rule>) -> Option<Self> {
        let kind = TokenKind::from_rule(pair.as_rule())?;
        let span = pair.as_span();
        Some(Token::new(kind, span.as_str(), span.start()))
    }
}

/// Split a template into tokens.
///
/// Scanning is a single left-to-right pass; at each position the first
/// matching category wins in this order: function, variable, punctuation,
/// whitespace, newline, text.
pub fn tokenize(input: &str) -> Result<Vec<Token<'_>>, LexError> {
    let mut pairs = TemplateLexer::parse(Rule::template, input).map_err(LexError::from_pest)?;

    let Some(template) = pairs.next() else {
        return Ok(Vec::new());
    };

    let tokens: Vec<Token> = template.into_inner().filter_map(Token::from_pair).collect();
    trace!(tokens = tokens.len(), "tokenized template");
    Ok(tokens)
}

impl LexError {
    fn from_pest(err: pest::error::Error<Rule>) -> Self {
        let position = match err.location {
            pest::error::InputLocation::Pos(pos) => pos,
            pest::error::InputLocation::Span((start, _)) => start,
        };
        LexError { position }
    }
}
