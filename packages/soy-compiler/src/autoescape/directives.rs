//! Context → escaping-directive decision table (spec.md §4.9). Given the
//! context a `{print}` sits in, decides which runtime sanitizer/escaper
//! directive(s) must wrap its expression. The directives themselves are
//! opaque names here — their implementations are an external collaborator
//! (the runtime backend, spec.md §1).

use crate::autoescape::context::{AttrType, Context, State, UriType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeDirective {
    EscapeHtml,
    EscapeHtmlAttribute,
    EscapeHtmlRcdata,
    EscapeJsString,
    EscapeJsValue,
    EscapeCssString,
    EscapeUri,
    NormalizeUri,
    FilterNormalizeUri,
    FilterTrustedResourceUri,
    FilterHtmlAttributes,
    FilterNumber,
    FilterCssValue,
    NoAutoescape,
}

/// Decides the directive chain for a `{print}` in `ctx` (spec.md §4.9). A
/// template's content kind of `text` disables escaping entirely — that
/// case is handled by the caller before reaching here.
pub fn directives_for_context(ctx: Context) -> Vec<EscapeDirective> {
    match ctx.state {
        State::Html | State::HtmlComment => vec![EscapeDirective::EscapeHtml],
        State::HtmlTagName | State::HtmlBeforeTagName => vec![EscapeDirective::EscapeHtml],
        State::HtmlBeforeAttrName | State::HtmlAttrName | State::HtmlBeforeAttrValue => {
            vec![EscapeDirective::FilterHtmlAttributes]
        }
        State::HtmlAttrValue => directives_for_attr_value(ctx),
        State::Css | State::CssComment => vec![EscapeDirective::FilterCssValue],
        State::CssDqString | State::CssSqString => vec![EscapeDirective::EscapeCssString],
        State::Js | State::JsLineComment | State::JsBlockComment => vec![EscapeDirective::EscapeJsValue],
        State::JsDqString | State::JsSqString | State::JsTemplateLiteral => vec![EscapeDirective::EscapeJsString],
        State::JsRegex => vec![EscapeDirective::EscapeJsValue],
        State::Uri => directives_for_uri(ctx),
        State::Error => vec![EscapeDirective::NoAutoescape],
    }
}

fn directives_for_attr_value(ctx: Context) -> Vec<EscapeDirective> {
    match ctx.attr_type {
        AttrType::Uri | AttrType::UriUnsafe => directives_for_uri(ctx),
        AttrType::Script => vec![EscapeDirective::EscapeJsValue],
        AttrType::Style => vec![EscapeDirective::FilterCssValue],
        AttrType::Plain | AttrType::None => vec![EscapeDirective::EscapeHtmlAttribute],
    }
}

fn directives_for_uri(ctx: Context) -> Vec<EscapeDirective> {
    match ctx.uri_type {
        UriType::TrustedResource => vec![EscapeDirective::FilterTrustedResourceUri],
        UriType::Media => vec![EscapeDirective::FilterNormalizeUri],
        UriType::Normal | UriType::None => vec![EscapeDirective::NormalizeUri, EscapeDirective::EscapeUri],
    }
}

/// Maps a user-written `{print $x |directiveName}` name to the directive it
/// names, so a user-specified directive can be checked for compatibility
/// with the inferred context (spec.md §4.9 "if the first is incompatible
/// with C, report error"). Unknown names (custom print directives outside
/// this closed escaping set) are not this engine's concern and pass through.
pub fn directive_named(name: &str) -> Option<EscapeDirective> {
    match name {
        "escapeHtml" => Some(EscapeDirective::EscapeHtml),
        "escapeHtmlAttribute" => Some(EscapeDirective::EscapeHtmlAttribute),
        "escapeHtmlRcdata" => Some(EscapeDirective::EscapeHtmlRcdata),
        "escapeJsString" => Some(EscapeDirective::EscapeJsString),
        "escapeJsValue" => Some(EscapeDirective::EscapeJsValue),
        "escapeCssString" => Some(EscapeDirective::EscapeCssString),
        "escapeUri" => Some(EscapeDirective::EscapeUri),
        "normalizeUri" => Some(EscapeDirective::NormalizeUri),
        "filterNormalizeUri" => Some(EscapeDirective::FilterNormalizeUri),
        "filterTrustedResourceUri" => Some(EscapeDirective::FilterTrustedResourceUri),
        "filterHtmlAttributes" => Some(EscapeDirective::FilterHtmlAttributes),
        "filterNumber" => Some(EscapeDirective::FilterNumber),
        "filterCssValue" => Some(EscapeDirective::FilterCssValue),
        "noAutoescape" => Some(EscapeDirective::NoAutoescape),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_html_pcdata_escapes_html() {
        assert_eq!(directives_for_context(Context::HTML_PCDATA), vec![EscapeDirective::EscapeHtml]);
    }

    #[test]
    fn trusted_resource_uri_gets_the_strict_filter() {
        let ctx = Context {
            state: State::Uri,
            uri_type: UriType::TrustedResource,
            ..Context::HTML_PCDATA
        };
        assert_eq!(
            directives_for_context(ctx),
            vec![EscapeDirective::FilterTrustedResourceUri]
        );
    }

    #[test]
    fn js_string_context_escapes_as_js_string_not_js_value() {
        let ctx = Context {
            state: State::JsDqString,
            ..Context::HTML_PCDATA
        };
        assert_eq!(directives_for_context(ctx), vec![EscapeDirective::EscapeJsString]);
    }

    #[test]
    fn directive_named_round_trips_known_names() {
        assert_eq!(directive_named("escapeHtml"), Some(EscapeDirective::EscapeHtml));
        assert_eq!(directive_named("filterTrustedResourceUri"), Some(EscapeDirective::FilterTrustedResourceUri));
        assert_eq!(directive_named("notADirective"), None);
    }
}
