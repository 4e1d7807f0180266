use pretty_assertions::assert_eq;

use super::*;

fn kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source)
        .unwrap()
        .into_iter()
        .map(|token| token.kind)
        .collect()
}

#[test]
fn test_simple_declaration() {
    assert_eq!(
        kinds("let x = 5;"),
        vec![
            TokenKind::Let,
            TokenKind::Identifier,
            TokenKind::Equals,
            TokenKind::Number,
            TokenKind::Semicolon,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_keywords_and_identifiers() {
    assert_eq!(
        kinds("func function OnEvent Scope new scope onEvent import"),
        vec![
            TokenKind::Func,
            TokenKind::Function,
            TokenKind::OnEvent,
            TokenKind::Scope,
            TokenKind::New,
            TokenKind::Identifier,
            TokenKind::Identifier,
            TokenKind::Import,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_two_char_operators_are_greedy() {
    assert_eq!(
        kinds("== != >= <= && || = ! > <"),
        vec![
            TokenKind::EqualsEquals,
            TokenKind::BangEquals,
            TokenKind::GreaterEquals,
            TokenKind::LessEquals,
            TokenKind::And,
            TokenKind::Or,
            TokenKind::Equals,
            TokenKind::Bang,
            TokenKind::Greater,
            TokenKind::Less,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_negative_number_literal() {
    let tokens = tokenize("range(5, -3)").unwrap();
    assert_eq!(tokens[4].kind, TokenKind::Number);
    assert_eq!(tokens[4].text, "-3");
}

#[test]
fn test_minus_after_operand_is_binary() {
    assert_eq!(
        kinds("x-1"),
        vec![
            TokenKind::Identifier,
            TokenKind::Minus,
            TokenKind::Number,
            TokenKind::Eof,
        ]
    );
    assert_eq!(
        kinds("-x"),
        vec![TokenKind::Minus, TokenKind::Identifier, TokenKind::Eof]
    );
}

#[test]
fn test_number_allows_single_decimal_point() {
    let tokens = tokenize("3.14.5").unwrap();
    assert_eq!(tokens[0].text, "3.14");
    assert_eq!(tokens[1].kind, TokenKind::Dot);
    assert_eq!(tokens[2].text, "5");
}

#[test]
fn test_string_escapes() {
    let tokens = tokenize(r#""a\nb\t\"q\" \\ \x" 'it\'s'"#).unwrap();
    assert_eq!(tokens[0].kind, TokenKind::StringLiteral);
    assert_eq!(tokens[0].text, "a\nb\t\"q\" \\ x");
    assert_eq!(tokens[1].text, "it's");
}

#[test]
fn test_unterminated_string_newline() {
    let err = tokenize("let s = \"abc\nlog(s)").unwrap_err();
    assert!(err.message.contains("newline found before closing quote"));
    assert_eq!(err.line, 1);
}

#[test]
fn test_unterminated_string_eof() {
    let err = tokenize("'abc").unwrap_err();
    assert!(err.message.contains("reached end of file"));
}

#[test]
fn test_comments_are_skipped() {
    let source = r#"
        // line comment
        let a = 1; /* block
        comment */ let b = 2;
    "#;
    let tokens = tokenize(source).unwrap();
    assert_eq!(tokens.len(), 11);
    assert_eq!(tokens[5].kind, TokenKind::Let);
    assert_eq!(tokens[5].line, 4);
}

#[test]
fn test_unterminated_block_comment() {
    let err = tokenize("let a = 1; /* never closed").unwrap_err();
    assert_eq!(err.message, "Unterminated multi-line comment");
}

#[test]
fn test_single_ampersand_and_pipe_rejected() {
    let err = tokenize("a & b").unwrap_err();
    assert_eq!(err.message, "Unrecognised character in source: &");
    let err = tokenize("a | b").unwrap_err();
    assert_eq!(err.message, "Unrecognised character in source: |");
}

#[test]
fn test_unknown_character_position() {
    let err = tokenize("let a = 1;\n  @").unwrap_err();
    assert_eq!(err.line, 2);
    assert_eq!(err.column, 3);
    assert_eq!(err.to_string(), "Unrecognised character in source: @ at line 2, column 3");
}

#[test]
fn test_token_positions() {
    let tokens = tokenize("let x\n  = 10").unwrap();
    assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
    assert_eq!((tokens[1].line, tokens[1].column), (1, 5));
    assert_eq!((tokens[2].line, tokens[2].column), (2, 3));
    assert_eq!((tokens[3].line, tokens[3].column), (2, 5));
}

#[test]
fn test_empty_source_is_just_eof() {
    assert_eq!(kinds(""), vec![TokenKind::Eof]);
    assert_eq!(kinds("   // nothing\n"), vec![TokenKind::Eof]);
}
