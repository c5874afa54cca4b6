use tracing::debug;

use crate::ast::{Document, MAX_NESTING, Node};
use crate::error::{Error, NestingError, SyntaxError};
use crate::lexer::{Token, TokenKind};

const PRIMARY: &[TokenKind] = &[TokenKind::Var, TokenKind::Func, TokenKind::Text];

/// Alternatives reported when input ends where an argument should start
const UNTERMINATED: &[TokenKind] = &[
    TokenKind::Var,
    TokenKind::Func,
    TokenKind::Text,
    TokenKind::RParen,
];

/// Where an expression is being read.
///
/// At document level every token is content. Inside a call argument a comma
/// or a closing parenthesis ends the argument, and whitespace next to either
/// is a separator rather than text. A `(` inside an argument opens a text
/// group that runs to its matching `)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Document,
    Argument,
}

/// Recursive descent parser over a token stream
pub struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
    end: usize,
    /// Calls currently open around `pos`
    depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<Token<'a>>) -> Self {
        let end = tokens.last().map(Token::end).unwrap_or(0);
        Self {
            tokens,
            pos: 0,
            end,
            depth: 0,
        }
    }

    /// Parse the whole token stream into a document.
    ///
    /// Outside of calls `(`, `)`, `,` and whitespace are plain content, so
    /// any input without `$Name(` parses to literal text and renders back
    /// unchanged. Fails on the first grammar violation or on calls nested
    /// deeper than [`MAX_NESTING`]; no partial document is returned.
    pub fn parse(mut self) -> Result<Document, Error> {
        let mut document = Document::new();
        while self.peek().is_some() {
            self.parse_expr(Scope::Document, &mut document)?;
        }
        debug!(nodes = document.len(), "parsed template");
        Ok(document)
    }

    /// `expr := primary+`, appended flat onto `document`
    fn parse_expr(&mut self, scope: Scope, document: &mut Document) -> Result<(), Error> {
        let mut primaries = 0;
        let mut groups = 0;
        while let Some(token) = self.peek() {
            if !self.starts_primary(token, scope, groups) {
                break;
            }
            let node = match token.kind {
                TokenKind::Var => {
                    self.pos += 1;
                    Node::Variable(token.name().to_string())
                }
                TokenKind::Func => self.parse_function()?,
                _ => Node::Literal(self.parse_text(scope, &mut groups)),
            };
            document.push(node);
            primaries += 1;
        }

        if primaries == 0 {
            let expected = match (scope, self.peek()) {
                (Scope::Argument, None) => UNTERMINATED,
                _ => PRIMARY,
            };
            return Err(self.unexpected(expected).into());
        }
        Ok(())
    }

    /// `function := Func LParen commaexpr RParen`
    fn parse_function(&mut self) -> Result<Node, Error> {
        let func = self.expect(TokenKind::Func)?;
        if self.depth == MAX_NESTING {
            return Err(NestingError {
                limit: MAX_NESTING,
                position: func.position,
            }
            .into());
        }
        self.expect(TokenKind::LParen)?;

        self.depth += 1;
        let args = self.parse_arguments()?;
        self.depth -= 1;
        self.expect(TokenKind::RParen)?;

        Ok(Node::Call {
            name: func.name().to_string(),
            args,
        })
    }

    /// `commaexpr := argument (Comma argument)*`, stopping before the `)`
    fn parse_arguments(&mut self) -> Result<Vec<Document>, Error> {
        let mut args = vec![self.parse_argument()?];
        while self.eat(TokenKind::Comma) {
            args.push(self.parse_argument()?);
        }

        if self.peek_kind() != Some(TokenKind::RParen) {
            return Err(self.unexpected(&[TokenKind::Comma, TokenKind::RParen]).into());
        }
        Ok(args)
    }

    /// `argument := Whitespace? expr Whitespace?`
    fn parse_argument(&mut self) -> Result<Document, Error> {
        self.eat(TokenKind::Whitespace);
        let mut argument = Document::new();
        self.parse_expr(Scope::Argument, &mut argument)?;
        self.eat(TokenKind::Whitespace);
        Ok(argument)
    }

    /// `text := Text+`, also taking in punctuation and spacing that is
    /// content in the current scope. `groups` counts text groups left open.
    fn parse_text(&mut self, scope: Scope, groups: &mut usize) -> String {
        let mut text = String::new();
        while let Some(token) = self.peek() {
            if matches!(token.kind, TokenKind::Var | TokenKind::Func)
                || !self.starts_primary(token, scope, *groups)
            {
                break;
            }
            if scope == Scope::Argument {
                match token.kind {
                    TokenKind::LParen => *groups += 1,
                    TokenKind::RParen => *groups -= 1,
                    _ => {}
                }
            }
            text.push_str(token.text);
            self.pos += 1;
        }
        text
    }

    fn starts_primary(&self, token: Token<'a>, scope: Scope, groups: usize) -> bool {
        match (scope, token.kind) {
            (Scope::Document, _) => true,
            (Scope::Argument, _) if groups > 0 => true,
            (Scope::Argument, TokenKind::Comma | TokenKind::RParen) => false,
            (Scope::Argument, TokenKind::Whitespace) => !matches!(
                self.tokens.get(self.pos + 1).map(|t| t.kind),
                None | Some(TokenKind::Comma | TokenKind::RParen)
            ),
            (Scope::Argument, _) => true,
        }
    }

    fn peek(&self) -> Option<Token<'a>> {
        self.tokens.get(self.pos).copied()
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.peek_kind() == Some(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token<'a>, SyntaxError> {
        match self.peek() {
            Some(token) if token.kind == kind => {
                self.pos += 1;
                Ok(token)
            }
            _ => Err(self.unexpected(&[kind])),
        }
    }

    fn unexpected(&self, expected: &[TokenKind]) -> SyntaxError {
        let found = self.peek();
        SyntaxError {
            expected: expected.to_vec(),
            found: found.map(|t| t.kind),
            position: found.map(|t| t.position).unwrap_or(self.end),
        }
    }
}
