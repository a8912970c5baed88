use crate::{
    ast::{Token, TokenKind},
    error::SyntaxError,
    registry::Registry,
};

/// Turns an expression into tokens, recognising whichever operator symbols
/// the registry currently holds.
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    /// Non-alphabetic operator symbols, longest first
    symbols: Vec<Vec<char>>,
    /// Alphabetic operator symbols such as `in`
    words: Vec<String>,
    /// Whether a `-` followed by a digit starts a negative literal
    operand_expected: bool,
}

impl Lexer {
    pub fn new(input: &str, registry: &Registry) -> Self {
        let mut symbols = Vec::new();
        let mut words = Vec::new();
        for symbol in registry.symbols() {
            if is_word(symbol) {
                words.push(symbol.to_string());
            } else {
                symbols.push(symbol.chars().collect::<Vec<_>>());
            }
        }
        symbols.sort_by(|a, b| b.len().cmp(&a.len()));

        Lexer {
            input: input.chars().collect(),
            position: 0,
            symbols,
            words,
            operand_expected: true,
        }
    }

    /// Tokenizes the whole input, ending with an `Eof` token.
    pub fn tokenize(mut self) -> Result<Vec<Token>, SyntaxError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        log::trace!("tokenized {} tokens", tokens.len());
        Ok(tokens)
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    fn read_string(&mut self, quote: char) -> Result<String, SyntaxError> {
        let start = self.position;
        let mut result = String::new();
        self.advance(); // opening quote

        while let Some(ch) = self.current_char() {
            match ch {
                c if c == quote => {
                    self.advance();
                    return Ok(result);
                }
                '\\' => {
                    self.advance();
                    match self.current_char() {
                        Some('n') => result.push('\n'),
                        Some('t') => result.push('\t'),
                        Some('r') => result.push('\r'),
                        // Any other escaped character stands for itself
                        Some(ch) => result.push(ch),
                        None => return Err(SyntaxError::UnterminatedString(start)),
                    }
                    self.advance();
                }
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        Err(SyntaxError::UnterminatedString(start))
    }

    fn read_number(&mut self, negative: bool) -> Result<TokenKind, SyntaxError> {
        let start = self.position;
        let mut number = String::new();
        if negative {
            number.push('-');
            self.advance();
        }
        let mut is_float = false;

        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else if ch == '.'
                && !is_float
                && self.peek_char(1).is_some_and(|c| c.is_ascii_digit())
            {
                is_float = true;
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        let invalid = || SyntaxError::InvalidNumber {
            text: number.clone(),
            offset: start,
        };
        if is_float {
            number.parse::<f64>().map(TokenKind::Float).map_err(|_| invalid())
        } else {
            // Literals past i64 degrade to floats, like any JSON number would
            match number.parse::<i64>() {
                Ok(n) => Ok(TokenKind::Integer(n)),
                Err(_) => number.parse::<f64>().map(TokenKind::Float).map_err(|_| invalid()),
            }
        }
    }

    /// Longest registered non-alphabetic symbol starting at the cursor.
    fn match_symbol(&self) -> Option<String> {
        let rest = &self.input[self.position..];
        self.symbols
            .iter()
            .find(|symbol| rest.starts_with(symbol))
            .map(|symbol| symbol.iter().collect())
    }

    pub fn next_token(&mut self) -> Result<Token, SyntaxError> {
        self.skip_whitespace();
        let offset = self.position;
        let kind = self.next_kind()?;
        self.operand_expected = matches!(
            kind,
            TokenKind::Operator(_)
                | TokenKind::LParen
                | TokenKind::LBracket
                | TokenKind::LBrace
                | TokenKind::Comma
                | TokenKind::Colon
                | TokenKind::Question
        );
        Ok(Token::new(kind, offset))
    }

    fn next_kind(&mut self) -> Result<TokenKind, SyntaxError> {
        let Some(ch) = self.current_char() else {
            return Ok(TokenKind::Eof);
        };

        match ch {
            '"' | '\'' => return self.read_string(ch).map(TokenKind::String),
            c if c.is_ascii_digit() => return self.read_number(false),
            '-' if self.operand_expected
                && self.peek_char(1).is_some_and(|c| c.is_ascii_digit()) =>
            {
                return self.read_number(true);
            }
            _ => {}
        }

        // Registered symbols win over identifiers and punctuation, so `_=`
        // is not an identifier and `||` is not two pipes.
        if let Some(symbol) = self.match_symbol() {
            self.position += symbol.chars().count();
            return Ok(TokenKind::Operator(symbol));
        }

        if ch.is_alphabetic() || ch == '_' {
            let ident = self.read_identifier();
            return Ok(match ident.as_str() {
                "true" => TokenKind::Boolean(true),
                "false" => TokenKind::Boolean(false),
                "null" => TokenKind::Null,
                word if self.words.iter().any(|w| w == word) => {
                    TokenKind::Operator(word.to_string())
                }
                _ => TokenKind::Identifier(ident),
            });
        }

        let kind = match ch {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '?' => TokenKind::Question,
            '.' => TokenKind::Dot,
            '|' => TokenKind::Pipe,
            ch => {
                return Err(SyntaxError::UnexpectedCharacter {
                    ch,
                    offset: self.position,
                });
            }
        };
        self.advance();
        Ok(kind)
    }
}

fn is_word(symbol: &str) -> bool {
    symbol.chars().all(|c| c.is_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input, &Registry::with_defaults())
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            kinds("true false null in"),
            vec![
                TokenKind::Boolean(true),
                TokenKind::Boolean(false),
                TokenKind::Null,
                TokenKind::Operator("in".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_pipe() {
        assert_eq!(
            kinds("a|t(1)"),
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::Pipe,
                TokenKind::Identifier("t".into()),
                TokenKind::LParen,
                TokenKind::Integer(1),
                TokenKind::RParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_or_is_not_two_pipes() {
        assert_eq!(
            kinds("a || b"),
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::Operator("||".into()),
                TokenKind::Identifier("b".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_offsets() {
        let tokens = Lexer::new("a  ==  'b'", &Registry::with_defaults())
            .tokenize()
            .unwrap();
        let offsets: Vec<usize> = tokens.iter().map(|t| t.offset).collect();
        assert_eq!(offsets, vec![0, 3, 7, 10]);
    }
}
