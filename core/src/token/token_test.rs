#[cfg(test)]
mod tests {
    use crate::token::{Token, Tokenizer};

    fn id(s: &str) -> Token {
        Token::Id(s.to_string())
    }

    #[test]
    fn basic() {
        let t1 = Tokenizer::tokenize(r#"xs[1] m["k"] 'a' true false"#);
        let e1 = vec![
            id("xs"),
            Token::LBracket,
            Token::Int(1),
            Token::RBracket,
            id("m"),
            Token::LBracket,
            Token::Str("k".to_string()),
            Token::RBracket,
            Token::Char('a'),
            Token::Bool(true),
            Token::Bool(false),
        ];
        assert_eq!(t1.unwrap(), e1);
    }

    #[test]
    fn test_composite_literal_tokens() {
        let tokens = Tokenizer::tokenize("[...]int{1, 2} map[string]int{\"x\": 1}").unwrap();
        let expected = vec![
            Token::LBracket,
            Token::Ellipsis,
            Token::RBracket,
            id("int"),
            Token::LBrace,
            Token::Int(1),
            Token::Comma,
            Token::Int(2),
            Token::RBrace,
            Token::Map,
            Token::LBracket,
            id("string"),
            Token::RBracket,
            id("int"),
            Token::LBrace,
            Token::Str("x".to_string()),
            Token::Colon,
            Token::Int(1),
            Token::RBrace,
        ];
        assert_eq!(tokens, expected);
    }

    #[test]
    fn test_statement_tokens() {
        let tokens = Tokenizer::tokenize("v, ok := m[k]; const c = -1").unwrap();
        let expected = vec![
            id("v"),
            Token::Comma,
            id("ok"),
            Token::Define,
            id("m"),
            Token::LBracket,
            id("k"),
            Token::RBracket,
            Token::Semicolon,
            Token::Const,
            id("c"),
            Token::Assign,
            Token::Sub,
            Token::Int(1),
        ];
        assert_eq!(tokens, expected);
    }

    #[test]
    fn test_pointer_tokens() {
        let tokens = Tokenizer::tokenize("(*p)[0] &a").unwrap();
        let expected = vec![
            Token::LParen,
            Token::Star,
            id("p"),
            Token::RParen,
            Token::LBracket,
            Token::Int(0),
            Token::RBracket,
            Token::Amp,
            id("a"),
        ];
        assert_eq!(tokens, expected);
    }

    #[test]
    fn test_number_literals() {
        let tokens = Tokenizer::tokenize("42 0x1F 0o17 017 0b101 1_000 1.5 .25 1e3 2i 1.5i").unwrap();
        let expected = vec![
            Token::Int(42),
            Token::Int(31),
            Token::Int(15),
            Token::Int(15),
            Token::Int(5),
            Token::Int(1000),
            Token::Float(1.5),
            Token::Float(0.25),
            Token::Float(1000.0),
            Token::Imag(2.0),
            Token::Imag(1.5),
        ];
        assert_eq!(tokens, expected);
    }

    #[test]
    fn test_large_integer_literal() {
        let tokens = Tokenizer::tokenize("18446744073709551616").unwrap();
        assert_eq!(tokens, vec![Token::Int(1 << 64)]);
    }

    #[test]
    fn test_string_escapes() {
        let tokens = Tokenizer::tokenize(r#""a\tb\n" "\x41\u00e9" '\n' '\''"#).unwrap();
        let expected = vec![
            Token::Str("a\tb\n".to_string()),
            Token::Str("Aé".to_string()),
            Token::Char('\n'),
            Token::Char('\''),
        ];
        assert_eq!(tokens, expected);
    }

    #[test]
    fn test_raw_string() {
        let tokens = Tokenizer::tokenize("`a\\n\nb`").unwrap();
        assert_eq!(tokens, vec![Token::Str("a\\n\nb".to_string())]);
    }

    #[test]
    fn test_keyword_prefix_is_identifier() {
        let tokens = Tokenizer::tokenize("mapping constant truthy").unwrap();
        assert_eq!(tokens, vec![id("mapping"), id("constant"), id("truthy")]);
    }

    #[test]
    fn test_newline_inserts_semicolon() {
        let src = "x := 1\ny := xs[\n0,\n]\n";
        let tokens = Tokenizer::tokenize(src).unwrap();
        let expected = vec![
            id("x"),
            Token::Define,
            Token::Int(1),
            Token::Semicolon,
            id("y"),
            Token::Define,
            id("xs"),
            Token::LBracket,
            Token::Int(0),
            Token::Comma,
            Token::RBracket,
            Token::Semicolon,
        ];
        assert_eq!(tokens, expected);
    }

    #[test]
    fn test_comments() {
        let src = "a // trailing\n/* block\n comment */ b";
        let tokens = Tokenizer::tokenize(src).unwrap();
        assert_eq!(tokens, vec![id("a"), Token::Semicolon, id("b")]);
    }

    #[test]
    fn test_spans() {
        let (tokens, spans) = Tokenizer::tokenize_enhanced_with_spans("ab[12]").unwrap();
        assert_eq!(tokens.len(), spans.len());
        assert_eq!(spans[0].start.column, 1);
        assert_eq!(spans[0].end.column, 3);
        assert_eq!(spans[2].start.column, 4);
        assert_eq!(spans[2].end.column, 6);
    }

    #[test]
    fn test_errors() {
        assert!(Tokenizer::tokenize("\"open").is_err());
        assert!(Tokenizer::tokenize("'ab'").is_err());
        assert!(Tokenizer::tokenize("''").is_err());
        assert!(Tokenizer::tokenize("1e").is_err());
        assert!(Tokenizer::tokenize("0x").is_err());
        assert!(Tokenizer::tokenize("12abc").is_err());
        assert!(Tokenizer::tokenize("a + b").is_err());
        assert!(Tokenizer::tokenize("/* open").is_err());
        assert!(Tokenizer::tokenize("\"\\xff\"").is_err());
    }

    #[test]
    fn test_error_position() {
        let err = Tokenizer::tokenize_enhanced_with_spans("x\n  @").unwrap_err();
        let span = err.span.unwrap();
        assert_eq!(span.start.line, 2);
        assert_eq!(span.start.column, 3);
        assert!(err.message.contains("Unknown punctuation"));
    }
}
