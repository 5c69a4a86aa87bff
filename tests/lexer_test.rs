use proptest::prelude::*;

use loxpad::lexer::{LexicalErrorKind, Lexer, Span, TokenKind};

fn tokenize(input: &str) -> Vec<Result<TokenKind, LexicalErrorKind>> {
    let mut scanner = Lexer::new(input);
    let mut tokens = Vec::new();
    // Every call consumes at least one character or returns EOF.
    for _ in 0..=input.len() + 1 {
        match scanner.next_token() {
            Ok(token) => {
                let done = matches!(token.kind, TokenKind::Eof);
                tokens.push(Ok(token.kind));
                if done {
                    return tokens;
                }
            }
            Err(error) => tokens.push(Err(error.kind)),
        }
    }
    panic!("Lexer did not reach EOF for {input:?}");
}

#[test]
fn smoke_test() {
    let mut scanner = Lexer::new("");
    let token = scanner.next_token().expect("Empty input lexes");
    assert_eq!(token.kind, TokenKind::Eof);
    assert_eq!(token.span, Span::new(0, 0));
}

#[test]
fn test_statement() {
    assert_eq!(
        tokenize("var x = (1 + 2.5) * y;"),
        vec![
            Ok(TokenKind::KeywordVar),
            Ok(TokenKind::Ident),
            Ok(TokenKind::Equal),
            Ok(TokenKind::LeftParenthesis),
            Ok(TokenKind::NumericLiteral),
            Ok(TokenKind::Plus),
            Ok(TokenKind::NumericLiteral),
            Ok(TokenKind::RightParenthesis),
            Ok(TokenKind::Star),
            Ok(TokenKind::Ident),
            Ok(TokenKind::Semicolon),
            Ok(TokenKind::Eof),
        ]
    );
}

#[test]
fn test_two_character_operators() {
    assert_eq!(
        tokenize("! != = == < <= > >="),
        vec![
            Ok(TokenKind::Bang),
            Ok(TokenKind::BangEqual),
            Ok(TokenKind::Equal),
            Ok(TokenKind::EqualEqual),
            Ok(TokenKind::LessThan),
            Ok(TokenKind::LessThanEqual),
            Ok(TokenKind::GreaterThan),
            Ok(TokenKind::GreaterThanEqual),
            Ok(TokenKind::Eof),
        ]
    );
}

#[test]
fn test_comments_are_skipped() {
    assert_eq!(
        tokenize("// a comment\nprint 1; // trailing\n// end"),
        vec![
            Ok(TokenKind::KeywordPrint),
            Ok(TokenKind::NumericLiteral),
            Ok(TokenKind::Semicolon),
            Ok(TokenKind::Eof),
        ]
    );
}

#[test]
fn test_trailing_dot_is_not_a_fraction() {
    assert_eq!(
        tokenize("1.foo"),
        vec![
            Ok(TokenKind::NumericLiteral),
            Ok(TokenKind::Dot),
            Ok(TokenKind::Ident),
            Ok(TokenKind::Eof),
        ]
    );
}

#[test]
fn test_multiline_string() {
    let mut scanner = Lexer::new("\"one\ntwo\"");
    let token = scanner.next_token().expect("String is closed");
    assert_eq!(token.kind, TokenKind::StringLiteral);
    assert_eq!(scanner.get_lexeme(&token.span), Some("\"one\ntwo\""));
    assert_eq!(scanner.get_line_breaks().get_line_from_span(token.span), 1);
}

#[test]
fn test_unclosed_string_is_incomplete() {
    let mut scanner = Lexer::new("print \"abc");
    let _ = scanner.next_token();
    let error = scanner.next_token().expect_err("String is never closed");
    assert_eq!(error.kind, LexicalErrorKind::UnclosedString);
    assert!(error.is_incomplete());
}

#[test]
fn test_unrecognized_character_is_not_incomplete() {
    let mut scanner = Lexer::new("@");
    let error = scanner.next_token().expect_err("`@` is not Lox");
    assert_eq!(error.kind, LexicalErrorKind::Unrecognized('@'));
    assert!(!error.is_incomplete());
    assert_eq!(error.code(), "LX001");
}

#[test]
fn test_line_breaks() {
    let scanner = Lexer::new("a\nb\n\nc");
    let line_breaks = scanner.get_line_breaks();
    assert_eq!(line_breaks.get_line(0), 1);
    assert_eq!(line_breaks.get_line(2), 2);
    assert_eq!(line_breaks.get_line(5), 4);
    assert_eq!(line_breaks.get_max_line(), 4);
}

// Property-based tests

fn symbol_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("(".to_string()),
        Just(")".to_string()),
        Just("{".to_string()),
        Just("}".to_string()),
        Just(",".to_string()),
        Just(".".to_string()),
        Just("-".to_string()),
        Just("+".to_string()),
        Just(";".to_string()),
        Just("*".to_string()),
        Just("!".to_string()),
        Just("!=".to_string()),
        Just("=".to_string()),
        Just("==".to_string()),
        Just("<".to_string()),
        Just("<=".to_string()),
        Just(">".to_string()),
        Just(">=".to_string()),
        Just("/".to_string()),
    ]
}

fn numeric_literal_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[0-9]+".prop_map(|s| s),          // Integer literals
        "[0-9]+\\.[0-9]+".prop_map(|s| s)  // Decimal literals
    ]
}

fn string_literal_strategy() -> impl Strategy<Value = String> {
    "[^\"]*".prop_map(|s: String| format!("\"{}\"", s))
}

fn identifier_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z_][a-zA-Z0-9_]*".prop_map(|s| s)
}

fn token_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        symbol_strategy(),
        numeric_literal_strategy(),
        string_literal_strategy(),
        identifier_strategy(),
    ]
}

proptest! {
    #[test]
    fn test_lexer_always_terminates(input in "\\PC*") {
        let tokens = tokenize(&input);
        prop_assert_eq!(tokens.last(), Some(&Ok(TokenKind::Eof)));
    }

    #[test]
    fn test_valid_tokens_lex_without_errors(tokens in prop::collection::vec(token_strategy(), 0..20)) {
        let input = tokens.join(" ");
        let lexed = tokenize(&input);
        prop_assert!(lexed.iter().all(|token| token.is_ok()));
        // `/` followed by `/` would start a comment, so only count when there are no slashes.
        if !input.contains('/') {
            prop_assert_eq!(lexed.len(), tokens.len() + 1);
        }
    }
}
