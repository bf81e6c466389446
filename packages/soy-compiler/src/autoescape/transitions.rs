//! Raw-text-driven context transitions (spec.md §4.9): given the context
//! entering a run of literal template text and the text itself, compute the
//! context exiting it. This is the state machine the teacher's `ml_parser`
//! HTML tokenizer inspired but it operates over already-lexed HTML tokens
//! plus interleaved raw text runs rather than re-tokenizing from scratch.

use crate::autoescape::context::{AttrEndDelim, AttrType, Context, ElementType, State, UriPart};
use crate::lexer::html::{Token as HtmlToken, TokenType as HtmlTokenType};

/// Advances `ctx` across one HTML token (spec.md §4.9). Text tokens are
/// scanned char-by-char for the handful of state transitions that matter
/// inside CSS/JS/URI content; everything else is driven by token kind.
pub fn transition_on_token(ctx: Context, token: &HtmlToken) -> Context {
    if ctx.is_error() {
        return ctx;
    }
    match token.token_type {
        HtmlTokenType::TagOpenStart => Context {
            state: State::HtmlBeforeAttrName,
            element_type: element_type_for_tag(&token.text),
            ..ctx
        },
        HtmlTokenType::TagOpenEnd | HtmlTokenType::TagOpenEndVoid => Context {
            state: body_state_for_element(ctx.element_type),
            attr_type: AttrType::None,
            attr_end_delim: AttrEndDelim::None,
            ..ctx
        },
        HtmlTokenType::TagClose => Context {
            state: State::Html,
            element_type: ElementType::None,
            ..ctx
        },
        HtmlTokenType::AttrName => Context {
            state: State::HtmlAttrName,
            attr_type: attr_type_for_name(&token.text),
            ..ctx
        },
        HtmlTokenType::AttrEquals => Context {
            state: State::HtmlBeforeAttrValue,
            ..ctx
        },
        HtmlTokenType::AttrValueText => transition_attr_value(ctx, &token.text),
        HtmlTokenType::Text => transition_text_run(ctx, &token.text),
        HtmlTokenType::CommentStart => Context { state: State::HtmlComment, ..ctx },
        HtmlTokenType::CommentEnd => Context { state: State::Html, ..ctx },
        HtmlTokenType::Eof => ctx,
    }
}

/// Advances `ctx` across a run of literal template text outside of any HTML
/// token (e.g. a `SoyNodeKind::RawText` node's contents); shares the
/// CSS/JS sub-state scanning with [`transition_on_token`]'s `Text` arm.
pub fn advance_through_text(ctx: Context, text: &str) -> Context {
    transition_text_run(ctx, text)
}

pub(crate) fn element_type_for_tag(name: &str) -> ElementType {
    match name.to_ascii_lowercase().as_str() {
        "script" => ElementType::Script,
        "style" => ElementType::Style,
        "textarea" => ElementType::Textarea,
        "title" => ElementType::Title,
        _ => ElementType::Normal,
    }
}

/// The state a tag's *body* starts in once its `>` is consumed: `<script>`
/// switches into `Js`, `<style>` into `Css`, everything else stays `Html`.
pub(crate) fn body_state_for_element(element: ElementType) -> State {
    match element {
        ElementType::Script => State::Js,
        ElementType::Style => State::Css,
        _ => State::Html,
    }
}

pub(crate) fn attr_type_for_name(name: &str) -> AttrType {
    let lower = name.to_ascii_lowercase();
    if lower == "href" || lower == "src" || lower == "action" || lower == "formaction" {
        AttrType::Uri
    } else if lower.starts_with("on") {
        AttrType::Script
    } else if lower == "style" {
        AttrType::Style
    } else {
        AttrType::Plain
    }
}

fn transition_attr_value(ctx: Context, _text: &str) -> Context {
    match ctx.attr_type {
        AttrType::Uri => Context {
            state: State::Uri,
            uri_part: UriPart::Start,
            ..ctx
        },
        _ => ctx,
    }
}

/// Advances `ctx` across a run of plain text, tracking the handful of
/// sub-state transitions that matter inside CSS/JS bodies (string quoting,
/// comment open/close). HTML PCDATA text never changes the context.
fn transition_text_run(ctx: Context, text: &str) -> Context {
    let mut state = ctx.state;
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        state = match (state, c) {
            (State::Css, '/') if chars.peek() == Some(&'*') => {
                chars.next();
                State::CssComment
            }
            (State::CssComment, '*') if chars.peek() == Some(&'/') => {
                chars.next();
                State::Css
            }
            (State::Css, '"') => State::CssDqString,
            (State::CssDqString, '"') => State::Css,
            (State::Css, '\'') => State::CssSqString,
            (State::CssSqString, '\'') => State::Css,

            (State::Js, '/') if chars.peek() == Some(&'/') => {
                chars.next();
                State::JsLineComment
            }
            (State::JsLineComment, '\n') => State::Js,
            (State::Js, '/') if chars.peek() == Some(&'*') => {
                chars.next();
                State::JsBlockComment
            }
            (State::JsBlockComment, '*') if chars.peek() == Some(&'/') => {
                chars.next();
                State::Js
            }
            (State::Js, '"') => State::JsDqString,
            (State::JsDqString, '"') => State::Js,
            (State::Js, '\'') => State::JsSqString,
            (State::JsSqString, '\'') => State::Js,
            (State::Js, '`') => State::JsTemplateLiteral,
            (State::JsTemplateLiteral, '`') => State::Js,

            (s, _) => s,
        };
    }
    Context { state, ..ctx }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::html::{tokenize, TokenType};

    fn run(ctx: Context, src: &str) -> Context {
        tokenize(src).iter().fold(ctx, transition_on_token)
    }

    #[test]
    fn plain_html_text_does_not_change_state() {
        let ctx = run(Context::HTML_PCDATA, "hello world");
        assert_eq!(ctx.state, State::Html);
    }

    #[test]
    fn script_tag_body_enters_js_state() {
        let ctx = run(Context::HTML_PCDATA, "<script>");
        assert_eq!(ctx.state, State::Js);
    }

    #[test]
    fn style_tag_body_enters_css_state() {
        let ctx = run(Context::HTML_PCDATA, "<style>");
        assert_eq!(ctx.state, State::Css);
    }

    #[test]
    fn href_attribute_value_enters_uri_state() {
        let tokens = tokenize(r#"<a href="x"#);
        let ctx = tokens.iter().fold(Context::HTML_PCDATA, transition_on_token);
        assert_eq!(ctx.state, State::Uri);
    }

    #[test]
    fn unknown_token_kind_ignores_eof() {
        let tok_type = TokenType::Eof;
        let _ = tok_type;
    }
}
