//! Tokenizer coverage for the expression-language lexer (spec.md §3.2, §4.1).

#[cfg(test)]
mod tests {
    use soy_compiler::lexer::expr::{tokenize, TokenType};

    #[test]
    fn tokenizes_a_variable_reference() {
        let tokens = tokenize("$name");
        assert_eq!(tokens[0].token_type, TokenType::Variable);
        assert_eq!(tokens[0].str_value, "name");
    }

    #[test]
    fn tokenizes_string_literals_with_either_quote_style() {
        let double = tokenize("\"hi\"");
        let single = tokenize("'hi'");
        assert_eq!(double[0].token_type, TokenType::String);
        assert_eq!(double[0].str_value, "hi");
        assert_eq!(single[0].token_type, TokenType::String);
        assert_eq!(single[0].str_value, "hi");
    }

    #[test]
    fn tokenizes_integer_and_float_numbers() {
        let tokens = tokenize("1 2.5");
        assert_eq!(tokens[0].token_type, TokenType::Number);
        assert_eq!(tokens[0].num_value, 1.0);
        assert_eq!(tokens[1].num_value, 2.5);
    }

    #[test]
    fn prefers_the_longest_matching_operator() {
        let tokens = tokenize("$a?.b");
        assert!(tokens[1].is_operator("?."));
    }

    #[test]
    fn null_coalesce_is_its_own_two_char_operator() {
        let tokens = tokenize("$a ?? $b");
        assert!(tokens[1].is_operator("??"));
    }

    #[test]
    fn recognises_reserved_keywords_distinct_from_identifiers() {
        let tokens = tokenize("true and false");
        assert_eq!(tokens[0].token_type, TokenType::Keyword);
        assert_eq!(tokens[1].token_type, TokenType::Keyword);
        assert_eq!(tokens[2].token_type, TokenType::Keyword);
    }

    #[test]
    fn ends_every_stream_with_an_eof_token() {
        let tokens = tokenize("1");
        assert!(tokens.last().unwrap().is_eof());
    }

    #[test]
    fn reports_error_tokens_for_unterminated_strings() {
        let tokens = tokenize("\"unterminated");
        assert!(tokens.iter().any(|t| t.token_type == TokenType::Error));
    }
}
