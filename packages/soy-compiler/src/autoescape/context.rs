//! The `Context` tuple the autoescaper threads through a template body
//! (spec.md §4.9 / SPEC_FULL.md §4.9), and its `union()` operation used to
//! merge the contexts exiting the branches of an `{if}`/`{switch}`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum State {
    Html,
    HtmlBeforeTagName,
    HtmlTagName,
    HtmlBeforeAttrName,
    HtmlAttrName,
    HtmlBeforeAttrValue,
    HtmlAttrValue,
    HtmlComment,
    Css,
    CssComment,
    CssDqString,
    CssSqString,
    Js,
    JsLineComment,
    JsBlockComment,
    JsDqString,
    JsSqString,
    JsRegex,
    JsTemplateLiteral,
    Uri,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementType {
    None,
    Script,
    Style,
    Textarea,
    Title,
    Normal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttrType {
    None,
    Plain,
    Uri,
    UriUnsafe,
    Script,
    Style,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttrEndDelim {
    None,
    DoubleQuote,
    SingleQuote,
    SpaceOrTagEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlashType {
    None,
    RegexCanFollow,
    DivCanFollow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UriPart {
    None,
    Start,
    PreQuery,
    Query,
    Fragment,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UriType {
    None,
    Normal,
    TrustedResource,
    Media,
}

/// The context the autoescaper tracks at every point in a template's raw
/// text (spec.md §4.9): `(state, elementType, attrType, attrEndDelim,
/// slashType, uriPart, uriType, jsTemplateLiteralNestingDepth)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    pub state: State,
    pub element_type: ElementType,
    pub attr_type: AttrType,
    pub attr_end_delim: AttrEndDelim,
    pub slash_type: SlashType,
    pub uri_part: UriPart,
    pub uri_type: UriType,
    pub js_template_literal_nesting_depth: u32,
}

impl Context {
    pub const HTML_PCDATA: Context = Context {
        state: State::Html,
        element_type: ElementType::None,
        attr_type: AttrType::None,
        attr_end_delim: AttrEndDelim::None,
        slash_type: SlashType::None,
        uri_part: UriPart::None,
        uri_type: UriType::None,
        js_template_literal_nesting_depth: 0,
    };

    pub const ERROR: Context = Context {
        state: State::Error,
        element_type: ElementType::None,
        attr_type: AttrType::None,
        attr_end_delim: AttrEndDelim::None,
        slash_type: SlashType::None,
        uri_part: UriPart::None,
        uri_type: UriType::None,
        js_template_literal_nesting_depth: 0,
    };

    pub fn is_error(&self) -> bool {
        self.state == State::Error
    }

    /// The context a template with this `{content_kind}` must both begin and
    /// end in (spec.md §4.9 "strict block start/end contexts").
    pub fn start_context_for(kind: crate::ast::ContentKind) -> Context {
        use crate::ast::ContentKind::*;
        match kind {
            Html => Context::HTML_PCDATA,
            Attributes => Context {
                state: State::HtmlBeforeAttrName,
                ..Context::HTML_PCDATA
            },
            Css => Context {
                state: State::Css,
                ..Context::HTML_PCDATA
            },
            Uri | TrustedResourceUri => Context {
                state: State::Uri,
                uri_part: UriPart::Start,
                uri_type: if kind == TrustedResourceUri {
                    UriType::TrustedResource
                } else {
                    UriType::Normal
                },
                ..Context::HTML_PCDATA
            },
            Js => Context {
                state: State::Js,
                ..Context::HTML_PCDATA
            },
            Text => Context::HTML_PCDATA,
        }
    }

    /// Merges the exit contexts of two branches of an `{if}`/`{switch}`
    /// (spec.md §4.9): identical contexts merge trivially; anything else is
    /// an `IllegalRecontextualisation`-worthy mismatch, reported by the
    /// caller, represented here as [`Context::ERROR`].
    pub fn union(a: Context, b: Context) -> Context {
        if a == b {
            a
        } else {
            Context::ERROR
        }
    }
}
