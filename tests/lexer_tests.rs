// tests/lexer_tests.rs

use recipe_filter::{EvalError, Lexer, Registry, SyntaxError, TokenKind, Value};

fn kinds_with(input: &str, registry: &Registry) -> Vec<TokenKind> {
    Lexer::new(input, registry)
        .tokenize()
        .unwrap()
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

fn kinds(input: &str) -> Vec<TokenKind> {
    kinds_with(input, &Registry::with_defaults())
}

fn op(symbol: &str) -> TokenKind {
    TokenKind::Operator(symbol.to_string())
}

fn ident(name: &str) -> TokenKind {
    TokenKind::Identifier(name.to_string())
}

// ============================================================================
// Punctuation
// ============================================================================

#[test]
fn test_punctuation_tokens() {
    let test_cases = vec![
        ("(", TokenKind::LParen),
        (")", TokenKind::RParen),
        ("[", TokenKind::LBracket),
        ("]", TokenKind::RBracket),
        ("{", TokenKind::LBrace),
        ("}", TokenKind::RBrace),
        (",", TokenKind::Comma),
        (":", TokenKind::Colon),
        ("?", TokenKind::Question),
        (".", TokenKind::Dot),
        ("|", TokenKind::Pipe),
    ];

    for (input, expected) in test_cases {
        assert_eq!(kinds(input), vec![expected, TokenKind::Eof], "Failed for input: {}", input);
    }
}

#[test]
fn test_empty_input() {
    assert_eq!(kinds(""), vec![TokenKind::Eof]);
    assert_eq!(kinds("   \n\t "), vec![TokenKind::Eof]);
}

// ============================================================================
// Operators
// ============================================================================

#[test]
fn test_default_operator_symbols() {
    for symbol in [
        "==", "!=", "<", "<=", ">", ">=", "&&", "||", "+", "-", "*", "/", "//", "%", "^", "!",
    ] {
        let input = format!("a {} b", symbol);
        let tokens = kinds(&input);
        assert_eq!(tokens[1], op(symbol), "Failed for symbol: {}", symbol);
    }
}

#[test]
fn test_longest_symbol_wins() {
    assert_eq!(kinds("a<=b"), vec![ident("a"), op("<="), ident("b"), TokenKind::Eof]);
    assert_eq!(kinds("a//b"), vec![ident("a"), op("//"), ident("b"), TokenKind::Eof]);
    assert_eq!(kinds("!=!"), vec![op("!="), op("!"), TokenKind::Eof]);
}

#[test]
fn test_word_operators_are_whole_words() {
    assert_eq!(
        kinds("inside in list"),
        vec![ident("inside"), op("in"), ident("list"), TokenKind::Eof]
    );
    assert_eq!(
        kinds("a intersect b"),
        vec![ident("a"), op("intersect"), ident("b"), TokenKind::Eof]
    );
}

#[test]
fn test_registered_symbol_is_tokenized() {
    let mut registry = Registry::with_defaults();
    registry.add_binary_op("_=", 20, |l, r| Ok(Value::Boolean(l == r)));

    assert_eq!(
        kinds_with("_foo _= bar", &registry),
        vec![ident("_foo"), op("_="), ident("bar"), TokenKind::Eof]
    );
}

#[test]
fn test_removed_symbol_is_rejected() {
    let mut registry = Registry::with_defaults();
    assert!(registry.remove_op("+"));

    let result = Lexer::new("1+2", &registry).tokenize();
    assert_eq!(
        result,
        Err(SyntaxError::UnexpectedCharacter { ch: '+', offset: 1 })
    );
}

#[test]
fn test_removed_prefix_of_longer_symbol() {
    let mut registry = Registry::with_defaults();
    registry.remove_op("!");

    assert_eq!(kinds_with("a != b", &registry)[1], op("!="));
    assert!(Lexer::new("!a", &registry).tokenize().is_err());
}

#[test]
fn test_empty_registry_has_no_operators() {
    let registry = Registry::new();
    assert!(Lexer::new("a && b", &registry).tokenize().is_err());
    assert_eq!(
        kinds_with("a.b", &registry),
        vec![ident("a"), TokenKind::Dot, ident("b"), TokenKind::Eof]
    );
}

#[test]
fn test_unary_only_symbol() {
    let mut registry = Registry::with_defaults();
    registry.add_unary_op("~", |v| Ok(v));
    assert_eq!(kinds_with("~x", &registry), vec![op("~"), ident("x"), TokenKind::Eof]);
}

#[test]
fn test_async_registration_is_tokenized() {
    let mut registry = Registry::with_defaults();
    registry.add_binary_op_async("<>", 20, |l: Value, r: Value| async move {
        Ok::<_, EvalError>(Value::Boolean(l != r))
    });
    assert_eq!(kinds_with("1<>2", &registry)[1], op("<>"));
}

// ============================================================================
// Literals
// ============================================================================

#[test]
fn test_numbers() {
    assert_eq!(
        kinds("42 2.5 0"),
        vec![
            TokenKind::Integer(42),
            TokenKind::Float(2.5),
            TokenKind::Integer(0),
            TokenKind::Eof
        ]
    );
}

#[test]
fn test_integer_overflow_becomes_float() {
    assert_eq!(
        kinds("9223372036854775807 99999999999999999999"),
        vec![
            TokenKind::Integer(i64::MAX),
            TokenKind::Float(1e20),
            TokenKind::Eof
        ]
    );
}

#[test]
fn test_negative_numbers_only_in_operand_position() {
    assert_eq!(kinds("-7"), vec![TokenKind::Integer(-7), TokenKind::Eof]);
    assert_eq!(
        kinds("5-3"),
        vec![TokenKind::Integer(5), op("-"), TokenKind::Integer(3), TokenKind::Eof]
    );
    assert_eq!(
        kinds("5 - -3.5"),
        vec![TokenKind::Integer(5), op("-"), TokenKind::Float(-3.5), TokenKind::Eof]
    );
    assert_eq!(
        kinds("[-1]"),
        vec![
            TokenKind::LBracket,
            TokenKind::Integer(-1),
            TokenKind::RBracket,
            TokenKind::Eof
        ]
    );
}

#[test]
fn test_integer_followed_by_member_access() {
    assert_eq!(
        kinds("1.a"),
        vec![TokenKind::Integer(1), TokenKind::Dot, ident("a"), TokenKind::Eof]
    );
}

#[test]
fn test_strings() {
    assert_eq!(
        kinds(r#""double" 'single'"#),
        vec![
            TokenKind::String("double".into()),
            TokenKind::String("single".into()),
            TokenKind::Eof
        ]
    );
}

#[test]
fn test_string_escapes() {
    assert_eq!(
        kinds(r#""say \"hi\"\n" 'it\'s'"#),
        vec![
            TokenKind::String("say \"hi\"\n".into()),
            TokenKind::String("it's".into()),
            TokenKind::Eof
        ]
    );
}

#[test]
fn test_operators_inside_strings_are_text() {
    assert_eq!(
        kinds(r#""a && b""#),
        vec![TokenKind::String("a && b".into()), TokenKind::Eof]
    );
}

#[test]
fn test_keywords() {
    assert_eq!(
        kinds("true false null truthy"),
        vec![
            TokenKind::Boolean(true),
            TokenKind::Boolean(false),
            TokenKind::Null,
            ident("truthy"),
            TokenKind::Eof
        ]
    );
}

// ============================================================================
// Whole expressions
// ============================================================================

#[test]
fn test_filter_expression() {
    assert_eq!(
        kinds("addons[.id == 'x']"),
        vec![
            ident("addons"),
            TokenKind::LBracket,
            TokenKind::Dot,
            ident("id"),
            op("=="),
            TokenKind::String("x".into()),
            TokenKind::RBracket,
            TokenKind::Eof
        ]
    );
}

#[test]
fn test_multiline_whitespace() {
    let input = "normandy.channel\n    == 'beta'\n\t&& true";
    assert_eq!(
        kinds(input),
        vec![
            ident("normandy"),
            TokenKind::Dot,
            ident("channel"),
            op("=="),
            TokenKind::String("beta".into()),
            op("&&"),
            TokenKind::Boolean(true),
            TokenKind::Eof
        ]
    );
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_unexpected_character() {
    assert_eq!(
        Lexer::new("1 # 2", &Registry::with_defaults()).tokenize(),
        Err(SyntaxError::UnexpectedCharacter { ch: '#', offset: 2 })
    );
}

#[test]
fn test_unterminated_string() {
    assert_eq!(
        Lexer::new("a == 'abc", &Registry::with_defaults()).tokenize(),
        Err(SyntaxError::UnterminatedString(5))
    );
    assert_eq!(
        Lexer::new(r#""trailing\"#, &Registry::with_defaults()).tokenize(),
        Err(SyntaxError::UnterminatedString(0))
    );
}
