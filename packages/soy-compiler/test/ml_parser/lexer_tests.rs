//! Raw-text HTML tokenizer coverage (spec.md §3.2, §4.2).

#[cfg(test)]
mod tests {
    use soy_compiler::lexer::html::{tokenize, TokenType};

    #[test]
    fn tokenizes_an_open_tag_with_one_attribute() {
        let tokens = tokenize(r#"<div class="a">"#);
        assert_eq!(tokens[0].token_type, TokenType::TagOpenStart);
        assert_eq!(tokens[0].text, "div");
        assert!(tokens.iter().any(|t| t.token_type == TokenType::AttrName && t.text == "class"));
        assert!(tokens.iter().any(|t| t.token_type == TokenType::AttrValueText && t.text == "a"));
        assert!(tokens.iter().any(|t| t.token_type == TokenType::TagOpenEnd));
    }

    #[test]
    fn tokenizes_a_self_closing_tag_with_the_void_end_token() {
        let tokens = tokenize("<br/>");
        assert!(tokens.iter().any(|t| t.token_type == TokenType::TagOpenEndVoid));
    }

    #[test]
    fn tokenizes_a_close_tag() {
        let tokens = tokenize("</div>");
        let close = tokens.iter().find(|t| t.token_type == TokenType::TagClose).unwrap();
        assert_eq!(close.text, "div");
    }

    #[test]
    fn plain_text_runs_until_the_next_angle_bracket() {
        let tokens = tokenize("hello <b>world</b>");
        assert_eq!(tokens[0].token_type, TokenType::Text);
        assert_eq!(tokens[0].text, "hello ");
    }

    #[test]
    fn recognises_comment_delimiters() {
        let tokens = tokenize("<!-- note -->");
        assert_eq!(tokens[0].token_type, TokenType::CommentStart);
        assert!(tokens.iter().any(|t| t.token_type == TokenType::CommentEnd));
    }

    #[test]
    fn attribute_values_can_use_either_quote_style() {
        let tokens = tokenize(r#"<a href='x'>"#);
        assert!(tokens.iter().any(|t| t.token_type == TokenType::AttrValueText && t.text == "x"));
    }

    #[test]
    fn ends_every_stream_with_an_eof_token() {
        let tokens = tokenize("<div>");
        assert!(tokens.last().unwrap().is_eof());
    }
}
