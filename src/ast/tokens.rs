/// Kind (and payload) of a lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    /// Floating-point number
    ///
    /// # Examples
    /// ```text
    /// 3.14
    /// -0.5
    /// ```
    Float(f64),

    /// Integer
    ///
    /// # Examples
    /// ```text
    /// 42
    /// -10
    /// ```
    Integer(i64),

    /// String literal enclosed in single or double quotes
    ///
    /// # Examples
    /// ```text
    /// "release"
    /// 'it\'s'
    /// ```
    String(String),

    /// `true` or `false`
    Boolean(bool),

    /// `null`
    Null,

    /// Field name
    ///
    /// Must start with letter or underscore, followed by letters, digits, or underscores.
    ///
    /// # Examples
    /// ```text
    /// normandy
    /// userId
    /// _internal
    /// ```
    Identifier(String),

    /// Any symbol currently registered as a binary or unary operator.
    ///
    /// Alphabetic symbols such as `in` are only recognised as whole words.
    ///
    /// # Examples
    /// ```text
    /// ==
    /// &&
    /// in
    /// ```
    Operator(String),

    // Delimiters
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,

    /// Separates transform arguments, array items and object pairs
    Comma,

    /// Object pair separator and ternary alternate
    Colon,

    /// Ternary test
    Question,

    /// Member access, or a relative identifier inside a filter
    Dot,

    /// Transform application
    ///
    /// # Examples
    /// ```text
    /// normandy.userId|stableSample(0.5)
    /// ```
    Pipe,

    /// End of input
    Eof,
}

/// A token together with the character offset it starts at.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

impl Token {
    pub fn new(kind: TokenKind, offset: usize) -> Self {
        Token { kind, offset }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Float(n) => write!(f, "number {}", n),
            TokenKind::Integer(n) => write!(f, "number {}", n),
            TokenKind::String(s) => write!(f, "string {:?}", s),
            TokenKind::Boolean(b) => write!(f, "boolean {}", b),
            TokenKind::Null => write!(f, "null"),
            TokenKind::Identifier(name) => write!(f, "identifier '{}'", name),
            TokenKind::Operator(op) => write!(f, "operator '{}'", op),
            TokenKind::LParen => write!(f, "'('"),
            TokenKind::RParen => write!(f, "')'"),
            TokenKind::LBracket => write!(f, "'['"),
            TokenKind::RBracket => write!(f, "']'"),
            TokenKind::LBrace => write!(f, "'{{'"),
            TokenKind::RBrace => write!(f, "'}}'"),
            TokenKind::Comma => write!(f, "','"),
            TokenKind::Colon => write!(f, "':'"),
            TokenKind::Question => write!(f, "'?'"),
            TokenKind::Dot => write!(f, "'.'"),
            TokenKind::Pipe => write!(f, "'|'"),
            TokenKind::Eof => write!(f, "end of expression"),
        }
    }
}
