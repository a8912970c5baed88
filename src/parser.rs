use crate::{
    ast::{Expr, Token, TokenKind},
    error::SyntaxError,
    registry::Registry,
    value::Value,
};
use std::mem;

/// Bound on nested groups, brackets, calls and prefix operators
pub const MAX_NESTING: usize = 64;

/// Bound on the height of the resulting tree, which evaluation recurses over
pub const MAX_TREE_HEIGHT: usize = 256;

/// Precedence-climbing parser over a token stream.
///
/// Which tokens are binary or unary operators, and how tightly binary
/// operators bind, is read from the registry while parsing.
///
/// Expressions nesting deeper than [`MAX_NESTING`] or producing a tree taller
/// than [`MAX_TREE_HEIGHT`] are rejected with [`SyntaxError::NestingTooDeep`].
pub struct Parser<'r> {
    tokens: std::vec::IntoIter<Token>,
    current_token: Token,
    registry: &'r Registry,
    depth: usize,
    /// Height of the most recently parsed subtree
    height: usize,
}

impl<'r> Parser<'r> {
    pub fn new(tokens: Vec<Token>, registry: &'r Registry) -> Self {
        let mut tokens = tokens.into_iter();
        let current_token = tokens
            .next()
            .unwrap_or_else(|| Token::new(TokenKind::Eof, 0));
        Parser {
            tokens,
            current_token,
            registry,
            depth: 0,
            height: 0,
        }
    }

    fn too_deep(&self) -> SyntaxError {
        SyntaxError::NestingTooDeep {
            offset: self.current_token.offset,
        }
    }

    fn enter(&mut self) -> Result<(), SyntaxError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(self.too_deep());
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    /// Records `height` as the height of the subtree just built.
    fn set_height(&mut self, height: usize) -> Result<(), SyntaxError> {
        if height > MAX_TREE_HEIGHT {
            return Err(self.too_deep());
        }
        self.height = height;
        Ok(())
    }

    fn advance(&mut self) {
        let offset = self.current_token.offset;
        self.current_token = self
            .tokens
            .next()
            .unwrap_or_else(|| Token::new(TokenKind::Eof, offset));
    }

    fn check(&self, kind: &TokenKind) -> bool {
        mem::discriminant(&self.current_token.kind) == mem::discriminant(kind)
    }

    fn unexpected(&self, expected: &str) -> SyntaxError {
        match &self.current_token.kind {
            TokenKind::Eof => SyntaxError::UnexpectedEof(expected.to_string()),
            found => SyntaxError::UnexpectedToken {
                found: found.to_string(),
                expected: expected.to_string(),
                offset: self.current_token.offset,
            },
        }
    }

    fn expect(&mut self, expected: TokenKind) -> Result<(), SyntaxError> {
        if !self.check(&expected) {
            return Err(self.unexpected(&expected.to_string()));
        }
        self.advance();
        Ok(())
    }

    fn expect_identifier(&mut self) -> Result<String, SyntaxError> {
        match mem::replace(&mut self.current_token.kind, TokenKind::Eof) {
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(name)
            }
            other => {
                self.current_token.kind = other;
                Err(self.unexpected("identifier"))
            }
        }
    }

    /// Parses a complete expression, requiring all input to be consumed.
    pub fn parse(&mut self) -> Result<Expr, SyntaxError> {
        let expr = self.parse_expression()?;
        self.expect(TokenKind::Eof)?;
        Ok(expr)
    }

    pub fn parse_expression(&mut self) -> Result<Expr, SyntaxError> {
        self.enter()?;
        let expr = self.parse_conditional()?;
        self.leave();
        Ok(expr)
    }

    /// `test ? consequent : alternate`, lowest precedence, right-associative
    fn parse_conditional(&mut self) -> Result<Expr, SyntaxError> {
        let test = self.parse_binary(i32::MIN)?;

        if !self.check(&TokenKind::Question) {
            return Ok(test);
        }
        let mut height = self.height;
        self.advance();
        let consequent = self.parse_expression()?;
        height = height.max(self.height);
        self.expect(TokenKind::Colon)?;
        let alternate = self.parse_expression()?;
        self.set_height(height.max(self.height) + 1)?;

        Ok(Expr::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        })
    }

    fn current_binary_precedence(&self) -> Option<i32> {
        match &self.current_token.kind {
            TokenKind::Operator(symbol) => self.registry.binary_op(symbol).map(|op| op.precedence),
            _ => None,
        }
    }

    /// Folds binary operators whose precedence is at least `min_precedence`.
    ///
    /// The right operand is parsed with a strictly higher threshold, which
    /// makes equal-precedence chains left-associative.
    fn parse_binary(&mut self, min_precedence: i32) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_unary()?;
        let mut height = self.height;

        while let Some(precedence) = self.current_binary_precedence() {
            if precedence < min_precedence {
                break;
            }
            let op = match mem::replace(&mut self.current_token.kind, TokenKind::Eof) {
                TokenKind::Operator(op) => op,
                other => {
                    self.current_token.kind = other;
                    break;
                }
            };
            self.advance();

            let right = self.parse_binary(precedence.saturating_add(1))?;
            height = height.max(self.height) + 1;
            self.set_height(height)?;

            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, SyntaxError> {
        if let TokenKind::Operator(symbol) = &self.current_token.kind
            && self.registry.unary_op(symbol).is_some()
        {
            let op = symbol.clone();
            self.advance();
            self.enter()?;
            let operand = self.parse_unary()?;
            self.leave();
            self.set_height(self.height + 1)?;
            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
            });
        }
        self.parse_postfix()
    }

    /// Member access, bracket filters and transforms, applied left to right
    fn parse_postfix(&mut self) -> Result<Expr, SyntaxError> {
        let mut expr = self.parse_primary()?;
        let mut height = self.height;

        loop {
            match self.current_token.kind {
                TokenKind::Dot => {
                    self.advance();
                    let name = self.expect_identifier()?;
                    height += 1;
                    expr = Expr::Member {
                        subject: Box::new(expr),
                        property: Box::new(Expr::Literal(Value::String(name))),
                        computed: false,
                    };
                }
                TokenKind::LBracket => {
                    self.advance();
                    let inner = self.parse_expression()?;
                    height = height.max(self.height) + 1;
                    self.expect(TokenKind::RBracket)?;

                    expr = if inner.has_relative_identifier() {
                        Expr::Filter {
                            subject: Box::new(expr),
                            predicate: Box::new(inner),
                        }
                    } else {
                        Expr::Member {
                            subject: Box::new(expr),
                            property: Box::new(inner),
                            computed: true,
                        }
                    };
                }
                TokenKind::Pipe => {
                    self.advance();
                    let name = self.expect_identifier()?;
                    let args = if self.check(&TokenKind::LParen) {
                        self.advance();
                        let args = self.parse_list(TokenKind::RParen)?;
                        height = height.max(self.height);
                        args
                    } else {
                        Vec::new()
                    };
                    height += 1;
                    expr = Expr::Transform {
                        subject: Box::new(expr),
                        name,
                        args,
                    };
                }
                _ => break,
            }
            self.set_height(height)?;
        }
        self.height = height;
        Ok(expr)
    }

    /// Parse primary expressions: literals, identifiers, groups and
    /// collection literals
    fn parse_primary(&mut self) -> Result<Expr, SyntaxError> {
        self.height = 1;
        match mem::replace(&mut self.current_token.kind, TokenKind::Eof) {
            TokenKind::Float(n) => {
                self.advance();
                Ok(Expr::Literal(Value::Float(n)))
            }
            TokenKind::Integer(n) => {
                self.advance();
                Ok(Expr::Literal(Value::Integer(n)))
            }
            TokenKind::String(s) => {
                self.advance();
                Ok(Expr::Literal(Value::String(s)))
            }
            TokenKind::Boolean(b) => {
                self.advance();
                Ok(Expr::Literal(Value::Boolean(b)))
            }
            TokenKind::Null => {
                self.advance();
                Ok(Expr::Literal(Value::Null))
            }
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(Expr::Identifier {
                    name,
                    relative: false,
                })
            }
            // `.name` at the start of an operand refers to the filter element
            TokenKind::Dot => {
                self.advance();
                let name = self.expect_identifier()?;
                Ok(Expr::Identifier {
                    name,
                    relative: true,
                })
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::LBracket => {
                self.advance();
                let items = self.parse_list(TokenKind::RBracket)?;
                self.set_height(self.height + 1)?;
                Ok(Expr::Array(items))
            }
            TokenKind::LBrace => {
                self.advance();
                self.parse_object_literal()
            }
            token => {
                self.current_token.kind = token;
                Err(self.unexpected("operand"))
            }
        }
    }

    /// Comma-separated expressions up to and including `close`
    fn parse_list(&mut self, close: TokenKind) -> Result<Vec<Expr>, SyntaxError> {
        let mut items = vec![];
        let mut height = 0;

        while !self.check(&close) {
            items.push(self.parse_expression()?);
            height = height.max(self.height);

            if !self.check(&close) {
                self.expect(TokenKind::Comma)?;
            }
        }

        self.expect(close)?;
        self.height = height;
        Ok(items)
    }

    fn parse_object_literal(&mut self) -> Result<Expr, SyntaxError> {
        let mut pairs = vec![];
        let mut height = 0;

        while !self.check(&TokenKind::RBrace) {
            let key = match mem::replace(&mut self.current_token.kind, TokenKind::Eof) {
                TokenKind::String(s) | TokenKind::Identifier(s) => s,
                other => {
                    self.current_token.kind = other;
                    return Err(self.unexpected("string or identifier as object key"));
                }
            };
            self.advance();

            self.expect(TokenKind::Colon)?;

            let value = self.parse_expression()?;
            height = height.max(self.height);
            pairs.push((key, value));

            if !self.check(&TokenKind::RBrace) {
                self.expect(TokenKind::Comma)?;
            }
        }

        self.expect(TokenKind::RBrace)?;
        self.set_height(height + 1)?;
        Ok(Expr::Object(pairs))
    }
}
