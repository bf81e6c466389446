//! Top-level and statement AST (`SoyNode`, spec.md §3.2, §3.4, §6.1).

use serde::{Deserialize, Serialize};

use crate::node::{ChildIds, Identifier, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemplateVisibility {
    Public,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemplateDeclKind {
    Basic,
    Delegate,
    Element,
}

/// A render unit's promised output type (spec.md §3.4, GLOSSARY).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentKind {
    Html,
    Attributes,
    Css,
    Uri,
    TrustedResourceUri,
    Js,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AutoescapeMode {
    Strict,
    Contextual,
    DeprecatedNoncontextual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuoteStyle {
    None,
    Single,
    Double,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateData {
    pub name: Identifier,
    pub decl_kind: TemplateDeclKind,
    pub content_kind: Option<ContentKind>,
    pub autoescape: AutoescapeMode,
    pub params: Vec<NodeId>,
    pub state_vars: Vec<NodeId>,
    pub strict_html: bool,
    pub visibility: TemplateVisibility,
    pub require_css: Vec<String>,
    pub delegate_package: Option<String>,
    pub delegate_variant: Option<String>,
    pub body: Vec<NodeId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SoyNodeKind {
    FileSet { files: Vec<NodeId> },
    File {
        namespace: String,
        imports: Vec<NodeId>,
        templates: Vec<NodeId>,
    },
    Import { symbols: Vec<Identifier>, from_path: String },

    Template(TemplateData),

    Param {
        name: Identifier,
        ty_node: Option<NodeId>,
        required: bool,
        injected: bool,
        default: Option<NodeId>,
    },

    Let {
        name: Identifier,
        value: Option<NodeId>,
        content: Vec<NodeId>,
        kind: Option<ContentKind>,
    },

    Print {
        expr: NodeId,
        /// User-specified directives, if any; empty means "infer" (spec.md §4.9).
        directives: Vec<Identifier>,
    },

    If {
        branches: Vec<(NodeId, Vec<NodeId>)>,
        else_branch: Option<Vec<NodeId>>,
    },

    Switch {
        expr: NodeId,
        cases: Vec<(Vec<NodeId>, Vec<NodeId>)>,
        default: Option<Vec<NodeId>>,
    },

    For {
        var_name: Identifier,
        list_expr: NodeId,
        body: Vec<NodeId>,
        if_empty: Option<Vec<NodeId>>,
    },

    CallBasic {
        template_name: Identifier,
        data_all: bool,
        params: Vec<NodeId>,
    },

    CallDelegate {
        template_name: Identifier,
        variant: Option<NodeId>,
        data_all: bool,
        params: Vec<NodeId>,
    },

    CallParamValue { name: Identifier, value: NodeId },
    CallParamContent {
        name: Identifier,
        content: Vec<NodeId>,
        kind: Option<ContentKind>,
    },

    Msg {
        desc: Option<String>,
        body: Vec<NodeId>,
        fallback: Option<Vec<NodeId>>,
    },

    RawText(String),
    /// `{literal}...{/literal}`: raw, uninterpreted text.
    Literal(String),

    HtmlOpenTag {
        name: String,
        attributes: Vec<NodeId>,
        self_closing: bool,
    },
    HtmlCloseTag { name: String },
    HtmlAttribute { name: String, value: Option<NodeId> },
    HtmlAttributeValue { quote: QuoteStyle, parts: Vec<NodeId> },
    HtmlComment(String),

    Velog { logging_id: NodeId, body: Vec<NodeId> },
}

impl SoyNodeKind {
    pub fn child_ids(&self) -> ChildIds {
        use SoyNodeKind::*;
        match self {
            FileSet { files } => files.iter().copied().collect(),
            File { imports, templates, .. } => imports.iter().chain(templates).copied().collect(),
            Import { .. } => ChildIds::new(),
            Template(data) => {
                let mut ids: ChildIds = data.params.iter().copied().collect();
                ids.extend(data.state_vars.iter().copied());
                ids.extend(data.body.iter().copied());
                ids
            }
            Param { ty_node, default, .. } => {
                let mut ids = ChildIds::new();
                ids.extend(ty_node.iter().copied());
                ids.extend(default.iter().copied());
                ids
            }
            Let { value, content, .. } => {
                let mut ids: ChildIds = ChildIds::new();
                ids.extend(value.iter().copied());
                ids.extend(content.iter().copied());
                ids
            }
            Print { expr, .. } => ChildIds::from_slice(&[*expr]),
            If { branches, else_branch } => {
                let mut ids: ChildIds = ChildIds::new();
                for (cond, body) in branches {
                    ids.push(*cond);
                    ids.extend(body.iter().copied());
                }
                if let Some(e) = else_branch {
                    ids.extend(e.iter().copied());
                }
                ids
            }
            Switch { expr, cases, default } => {
                let mut ids: ChildIds = ChildIds::from_slice(&[*expr]);
                for (exprs, body) in cases {
                    ids.extend(exprs.iter().copied());
                    ids.extend(body.iter().copied());
                }
                if let Some(d) = default {
                    ids.extend(d.iter().copied());
                }
                ids
            }
            For {
                list_expr,
                body,
                if_empty,
                ..
            } => {
                let mut ids: ChildIds = ChildIds::from_slice(&[*list_expr]);
                ids.extend(body.iter().copied());
                if let Some(e) = if_empty {
                    ids.extend(e.iter().copied());
                }
                ids
            }
            CallBasic { params, .. } => params.iter().copied().collect(),
            CallDelegate { params, variant, .. } => {
                let mut ids: ChildIds = ChildIds::new();
                ids.extend(variant.iter().copied());
                ids.extend(params.iter().copied());
                ids
            }
            CallParamValue { value, .. } => ChildIds::from_slice(&[*value]),
            CallParamContent { content, .. } => content.iter().copied().collect(),
            Msg { body, fallback, .. } => {
                let mut ids: ChildIds = body.iter().copied().collect();
                if let Some(f) = fallback {
                    ids.extend(f.iter().copied());
                }
                ids
            }
            RawText(_) | Literal(_) | HtmlCloseTag { .. } | HtmlComment(_) => ChildIds::new(),
            HtmlOpenTag { attributes, .. } => attributes.iter().copied().collect(),
            HtmlAttribute { value, .. } => value.iter().copied().collect(),
            HtmlAttributeValue { parts, .. } => parts.iter().copied().collect(),
            Velog { logging_id, body } => {
                let mut ids: ChildIds = ChildIds::from_slice(&[*logging_id]);
                ids.extend(body.iter().copied());
                ids
            }
        }
    }
}
