#[cfg(test)]
mod scanner_tests {
    use treelox::error::LoxError;
    use treelox::scanner::*;
    use treelox::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source);
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    #[test]
    fn test_scanner_01_symbols() {
        assert_token_sequence(
            "({*.,+*})",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::STAR, "*"),
                (TokenType::DOT, "."),
                (TokenType::COMMA, ","),
                (TokenType::PLUS, "+"),
                (TokenType::STAR, "*"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_two_char_operators_take_longest_match() {
        assert_token_sequence(
            "!= ! == = <= < >= >",
            &[
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::BANG, "!"),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::EQUAL, "="),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::LESS, "<"),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::GREATER, ">"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_keywords_and_identifiers() {
        assert_token_sequence(
            "class Foo < _bar { orchid or nil }",
            &[
                (TokenType::CLASS, "class"),
                (TokenType::IDENTIFIER, "Foo"),
                (TokenType::LESS, "<"),
                (TokenType::IDENTIFIER, "_bar"),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::IDENTIFIER, "orchid"),
                (TokenType::OR, "or"),
                (TokenType::NIL, "nil"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_numbers_have_no_leading_or_trailing_dot() {
        let (tokens, errors) = scan_tokens("12.5 7. .5");
        assert!(errors.is_empty());

        let kinds: Vec<&str> = tokens.iter().map(|t| t.token_type.name()).collect();
        assert_eq!(
            kinds,
            ["NUMBER", "NUMBER", "DOT", "DOT", "NUMBER", "EOF"]
        );
        assert_eq!(tokens[0].literal(), Some(Literal::Number(12.5)));
        assert_eq!(tokens[1].literal(), Some(Literal::Number(7.0)));
        assert_eq!(tokens[4].literal(), Some(Literal::Number(5.0)));
    }

    #[test]
    fn test_comments_and_newlines_track_lines() {
        let (tokens, errors) = scan_tokens("// header\nvar a; // trailing\n\nprint a;");
        assert!(errors.is_empty());

        let var = &tokens[0];
        assert_eq!(var.token_type, TokenType::VAR);
        assert_eq!(var.line, 2);

        let print = tokens
            .iter()
            .find(|t| t.token_type == TokenType::PRINT)
            .expect("print token");
        assert_eq!(print.line, 4);

        let eof = tokens.last().expect("eof token");
        assert_eq!(eof.token_type, TokenType::EOF);
        assert_eq!(eof.line, 4);
    }

    #[test]
    fn test_multiline_string_literal() {
        let (tokens, errors) = scan_tokens("\"one\ntwo\" x");
        assert!(errors.is_empty());
        assert_eq!(tokens[0].literal(), Some(Literal::Str("one\ntwo".into())));
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn test_unterminated_string_is_reported() {
        let (tokens, errors) = scan_tokens("print \"oops\nstill going");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "[line 2] Error: Unterminated string.");
        assert_eq!(tokens.last().map(|t| t.line), Some(2));
    }

    #[test]
    fn test_unexpected_chars_token_sequence() {
        let source = ",.$(#";
        let scanner = Scanner::new(source);

        let results: Vec<_> = scanner.collect();

        // 0: COMMA ','
        // 1: DOT '.'
        // 2: Error for '$'
        // 3: LEFT_PAREN '('
        // 4: Error for '#'
        // 5: EOF
        assert_eq!(results.len(), 6, "Expected 6 items in result");

        assert_token_matches(&results[0], TokenType::COMMA, ",");
        assert_token_matches(&results[1], TokenType::DOT, ".");
        assert_token_matches(&results[3], TokenType::LEFT_PAREN, "(");
        assert_token_matches(&results[5], TokenType::EOF, "");

        let error_count = results.iter().filter(|r| r.is_err()).count();
        assert_eq!(error_count, 2, "Expected 2 error messages");

        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert!(
                err.to_string().contains("Unexpected character"),
                "Error message should contain 'Unexpected character', got: {}",
                err
            );
        }

        fn assert_token_matches(
            result: &Result<Token, LoxError>,
            expected_type: TokenType,
            expected_lexeme: &str,
        ) {
            match result {
                Ok(token) => {
                    assert_eq!(
                        token.token_type, expected_type,
                        "Expected token type {:?}, got {:?}",
                        expected_type, token.token_type
                    );
                    assert_eq!(
                        token.lexeme, expected_lexeme,
                        "Expected lexeme '{}', got '{}'",
                        expected_lexeme, token.lexeme
                    );
                }
                Err(e) => panic!("Expected token but got error: {}", e),
            }
        }
    }

    #[test]
    fn test_non_ascii_character_is_one_error() {
        let (tokens, errors) = scan_tokens("a é b");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "[line 1] Error: Unexpected character: é");
        assert_eq!(tokens.len(), 3);
    }

    #[test]
    fn test_token_display_and_json() {
        let (tokens, _) = scan_tokens("var n = 3; \"hi\"");
        let rendered: Vec<String> = tokens.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            [
                "VAR var null",
                "IDENTIFIER n null",
                "EQUAL = null",
                "NUMBER 3 3.0",
                "SEMICOLON ; null",
                "STRING \"hi\" hi",
                "EOF  null",
            ]
        );

        let json: serde_json::Value = serde_json::to_value(&tokens).expect("tokens serialize");
        assert_eq!(json[3]["token_type"]["NUMBER"], 3.0);
        assert_eq!(json[0]["lexeme"], "var");
        assert_eq!(json[0]["line"], 1);
    }
}
