//! Context inference over a template body, template derivation for
//! non-strict calls, and fixed-point convergence for recursive templates
//! (spec.md §4.9 — the hardest subsystem).
//!
//! A *strict* template (the only kind spec.md's surface grammar allows to
//! be authored directly) always starts and ends in the context implied by
//! its `content_kind` (spec.md §4.9 "strict block start/end contexts").
//! `infer_template` walks the body accumulating that context, recursing
//! into calls; a call whose target would need re-deriving under a new
//! caller context is *contextual* derivation and is memoized per
//! `(template, entry context)` pair so recursive templates converge
//! instead of re-deriving forever.

use std::collections::HashMap;

use crate::ast::{Arena, AutoescapeMode, Node, QuoteStyle, SoyNodeKind};
use crate::autoescape::context::{AttrEndDelim, AttrType, Context, ElementType, State, UriPart, UriType};
use crate::autoescape::directives::{directive_named, directives_for_context, EscapeDirective};
use crate::autoescape::inferences::Inferences;
use crate::autoescape::transitions::{advance_through_text, attr_type_for_name, body_state_for_element, element_type_for_tag};
use crate::diagnostics::{Diagnostic, DiagnosticKind, ErrorReporter};
use crate::error::{CompilerError, Result};
use crate::node::NodeId;
use crate::resolver::TemplateRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct MemoKey {
    template_node: NodeId,
    entry: ContextKey,
}

/// `Context` isn't `Hash`/`Eq`-derivable cheaply across its full field set
/// in a way that's convenient for a `HashMap` key without deriving `Hash`
/// on every nested enum; rather than widen those derives just for the
/// memo table, key on the one field that actually varies at Soy call sites
/// today (the entering state) plus the derived uri/attr sub-state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ContextKey(u64);

fn context_key(ctx: Context) -> ContextKey {
    // A stable, order-independent packing of the tuple's discriminants.
    let bytes = format!("{:?}", ctx);
    let mut hash: u64 = 1469598103934665603;
    for b in bytes.bytes() {
        hash ^= b as u64;
        hash = hash.wrapping_mul(1099511628211);
    }
    ContextKey(hash)
}

pub struct ContextualAnalyzer<'a> {
    arena: &'a Arena,
    registry: &'a TemplateRegistry,
    reporter: &'a mut ErrorReporter,
    inferences: &'a mut Inferences,
    /// The `autoescape` mode of the template currently being inferred,
    /// governing how a `{call}` inside it is judged (spec.md §4.9's
    /// caller-mode decision table). Strict until the first `infer_template`
    /// call overwrites it with the real template's mode.
    mode: AutoescapeMode,
    memo: HashMap<MemoKey, Context>,
    in_progress: HashMap<MemoKey, Context>,
}

impl<'a> ContextualAnalyzer<'a> {
    pub fn new(arena: &'a Arena, registry: &'a TemplateRegistry, reporter: &'a mut ErrorReporter, inferences: &'a mut Inferences) -> Self {
        ContextualAnalyzer {
            arena,
            registry,
            reporter,
            inferences,
            mode: AutoescapeMode::Strict,
            memo: HashMap::new(),
            in_progress: HashMap::new(),
        }
    }

    /// Infers the exit context of `template_node`'s body entering at
    /// `entry`, following the two-hypothesis fixed-point algorithm spec.md
    /// §4.9 describes for recursive templates: propagate once assuming
    /// `endContext := entry`, and if the body doesn't already return to
    /// `entry`, propagate a second time assuming `endContext := C'` and take
    /// `union(C', C'')`. Strict templates assert `entry ==
    /// start_context_for(kind)`; the caller is expected to have already
    /// checked that at the call site (spec.md §4.9 "cross-kind strict call"
    /// diagnostic).
    pub fn infer_template(&mut self, template_node: NodeId, entry: Context) -> Result<Context> {
        let key = MemoKey {
            template_node,
            entry: context_key(entry),
        };
        if let Some(exit) = self.memo.get(&key) {
            return Ok(*exit);
        }
        if let Some(guess) = self.in_progress.get(&key) {
            // Recursive re-entry: assume the guessed fixed point holds and
            // let the outer call validate it once the recursion unwinds.
            return Ok(*guess);
        }

        let Node::Soy(SoyNodeKind::Template(data)) = &self.arena.get(template_node).data else {
            return Err(CompilerError::AssertionFailure("infer_template on a non-template node".into()));
        };
        let body = data.body.clone();
        let declared_kind = data.content_kind;
        let template_mode = data.autoescape;

        let prev_mode = self.mode;
        self.mode = template_mode;

        self.in_progress.insert(key, entry);
        let c_prime = self.infer_body(&body, entry)?;
        let mut final_ctx = if c_prime == entry {
            c_prime
        } else {
            self.in_progress.insert(key, c_prime);
            let c_double_prime = self.infer_body(&body, c_prime)?;
            let union = Context::union(c_prime, c_double_prime);
            if union.is_error() && !c_prime.is_error() && !c_double_prime.is_error() {
                let location = self.arena.location_of(template_node).clone();
                self.reporter.report(Diagnostic::error(
                    location,
                    DiagnosticKind::RecursiveTemplateCannotContextualise,
                    "template body does not converge to a single context across all recursive calls",
                ));
            }
            union
        };
        self.in_progress.remove(&key);
        self.mode = prev_mode;

        if let Some(kind) = declared_kind {
            if !final_ctx.is_error() {
                let expected_end = Context::start_context_for(kind);
                if final_ctx != expected_end {
                    let location = self.arena.location_of(template_node).clone();
                    self.reporter.report(Diagnostic::error(
                        location,
                        DiagnosticKind::StrictBlockEndMismatch,
                        format!("template declares kind=\"{kind:?}\" but its body ends in a different context than that kind requires"),
                    ));
                    final_ctx = Context::ERROR;
                }
            }
        }

        self.inferences.record_template_end_context(template_node, final_ctx);
        self.memo.insert(key, final_ctx);
        Ok(final_ctx)
    }

    fn infer_body(&mut self, body: &[NodeId], mut ctx: Context) -> Result<Context> {
        for &id in body {
            ctx = self.infer_node(id, ctx)?;
            if ctx.is_error() {
                return Ok(ctx);
            }
        }
        Ok(ctx)
    }

    fn infer_node(&mut self, id: NodeId, ctx: Context) -> Result<Context> {
        let node = self.arena.get(id).data.clone_for_inference();
        match node {
            InferenceNode::RawText(text) | InferenceNode::Literal(text) => Ok(advance_through_text(ctx, &text)),
            InferenceNode::HtmlOpenTag { name, attributes, self_closing } => {
                let element_type = element_type_for_tag(&name);
                let mut next = ctx;
                next.state = State::HtmlBeforeAttrName;
                next.element_type = element_type;
                for attr in attributes {
                    next = self.infer_node(attr, next)?;
                    if next.is_error() {
                        return Ok(next);
                    }
                }
                next.attr_type = AttrType::None;
                next.attr_end_delim = AttrEndDelim::None;
                // Matches `transition_on_token`'s `TagOpenEnd`/`TagOpenEndVoid`
                // handling: a self-closing tag still transitions into its
                // element's body state rather than straight back to `Html`.
                next.state = body_state_for_element(element_type);
                Ok(next)
            }
            InferenceNode::HtmlCloseTag => {
                let mut next = ctx;
                next.state = State::Html;
                next.element_type = ElementType::None;
                Ok(next)
            }
            InferenceNode::HtmlAttribute { name, value } => {
                let mut next = ctx;
                next.state = State::HtmlAttrName;
                next.attr_type = attr_type_for_name(&name);
                if let Some(value_node) = value {
                    next.state = State::HtmlBeforeAttrValue;
                    next = self.infer_node(value_node, next)?;
                }
                Ok(next)
            }
            InferenceNode::HtmlAttributeValue { quote, parts } => {
                let mut next = ctx;
                next.attr_end_delim = match quote {
                    QuoteStyle::Double => AttrEndDelim::DoubleQuote,
                    QuoteStyle::Single => AttrEndDelim::SingleQuote,
                    QuoteStyle::None => AttrEndDelim::SpaceOrTagEnd,
                };
                next.state = match next.attr_type {
                    AttrType::Uri | AttrType::UriUnsafe => {
                        next.uri_part = UriPart::Start;
                        next.uri_type = UriType::Normal;
                        State::Uri
                    }
                    AttrType::Script => State::Js,
                    AttrType::Style => State::Css,
                    AttrType::Plain | AttrType::None => State::HtmlAttrValue,
                };
                for part in parts {
                    next = self.infer_node(part, next)?;
                    if next.is_error() {
                        return Ok(next);
                    }
                }
                // Closing the quote returns to hunting for the next
                // attribute (or the tag's `>`), regardless of which
                // sub-state the value itself ran through.
                next.state = State::HtmlBeforeAttrName;
                next.attr_type = AttrType::None;
                next.attr_end_delim = AttrEndDelim::None;
                next.uri_part = UriPart::None;
                next.uri_type = UriType::None;
                Ok(next)
            }
            InferenceNode::Print { directives } => {
                if !ctx.is_error() {
                    if ctx.state == State::Uri && ctx.uri_type == UriType::TrustedResource && ctx.uri_part == UriPart::Start {
                        let location = self.arena.location_of(id).clone();
                        self.reporter.report(Diagnostic::error(
                            location,
                            DiagnosticKind::TrustedResourceUriDynamicScheme,
                            "a dynamic value may not supply the scheme of a trusted resource URI",
                        ));
                        return Ok(Context::ERROR);
                    }
                    let expected = directives_for_context(ctx);
                    match directives.first().and_then(|name| directive_named(name)) {
                        Some(given) if given != EscapeDirective::NoAutoescape && !expected.contains(&given) => {
                            let location = self.arena.location_of(id).clone();
                            self.reporter.report(Diagnostic::error(
                                location,
                                DiagnosticKind::IllegalRecontextualisation,
                                "the print directive given is incompatible with its surrounding context",
                            ));
                        }
                        Some(_) => {}
                        None => self.inferences.record_print(id, expected),
                    }
                }
                // The "z" insertion rule (spec.md §4.9): a print substitutes
                // a value of the context's own type, so advance the context
                // as though a single innocuous character had been printed.
                Ok(advance_through_text(ctx, "z"))
            }
            InferenceNode::If { branches, else_branch } => self.infer_if(id, &branches, else_branch.as_deref(), ctx),
            InferenceNode::For { body } => {
                // A loop body must return to the context it started in, or
                // the second-and-later iterations would run under the
                // wrong context (spec.md §4.9 "loop repeats in different
                // context").
                let exit = self.infer_body(&body, ctx)?;
                if exit != ctx && !exit.is_error() {
                    let location = self.arena.location_of(id).clone();
                    self.reporter.report(Diagnostic::error(
                        location,
                        DiagnosticKind::LoopRepeatsInDifferentContext,
                        "loop body does not end in the context it started in, so a second iteration would run in the wrong context",
                    ));
                    return Ok(Context::ERROR);
                }
                Ok(ctx)
            }
            InferenceNode::Msg { body, fallback } => {
                // Body and fallback are alternative renderings of the same
                // message, never both emitted — each must independently
                // return to the context it started in (spec.md §4.9).
                let body_exit = self.infer_body(&body, ctx)?;
                let fallback_exit = match &fallback {
                    Some(f) => self.infer_body(f, ctx)?,
                    None => ctx,
                };
                if (body_exit != ctx && !body_exit.is_error()) || (fallback_exit != ctx && !fallback_exit.is_error()) {
                    let location = self.arena.location_of(id).clone();
                    self.reporter.report(Diagnostic::error(
                        location,
                        DiagnosticKind::MessageChangesContext,
                        "a message's body does not return to the context it started in",
                    ));
                    return Ok(Context::ERROR);
                }
                Ok(ctx)
            }
            InferenceNode::Call { template_name, is_delegate } => self.infer_call(id, &template_name, is_delegate, ctx),
            InferenceNode::Other(children) => {
                let mut next = ctx;
                for child in children {
                    next = self.infer_node(child, next)?;
                    if next.is_error() {
                        break;
                    }
                }
                Ok(next)
            }
        }
    }

    fn infer_if(&mut self, if_id: NodeId, branches: &[(NodeId, Vec<NodeId>)], else_branch: Option<&[NodeId]>, ctx: Context) -> Result<Context> {
        let mut merged: Option<Context> = None;
        for (cond, body) in branches {
            let exit = self.infer_body(body, ctx)?;
            merged = Some(match merged {
                None => exit,
                Some(prev) => {
                    let union = Context::union(prev, exit);
                    if union.is_error() && !prev.is_error() && !exit.is_error() {
                        let location = self.arena.location_of(*cond).clone();
                        self.reporter.report(Diagnostic::error(
                            location,
                            DiagnosticKind::BranchContextMismatch,
                            "this branch ends in a different context than an earlier branch",
                        ));
                    }
                    union
                }
            });
        }
        let else_exit = match else_branch {
            Some(body) => self.infer_body(body, ctx)?,
            None => ctx, // no else means "no-op" falls through unchanged
        };
        merged = Some(match merged {
            None => else_exit,
            Some(prev) => {
                let union = Context::union(prev, else_exit);
                if union.is_error() && !prev.is_error() && !else_exit.is_error() {
                    let location = self.arena.location_of(if_id).clone();
                    self.reporter.report(Diagnostic::error(
                        location,
                        DiagnosticKind::BranchContextMismatch,
                        "the else branch ends in a different context than an earlier branch",
                    ));
                }
                union
            }
        });
        Ok(merged.unwrap_or(ctx))
    }

    /// Dispatches a `{call}` per the caller-mode × callee-kind decision
    /// table (spec.md §4.9): a strict callee must enter/exit in the
    /// context its own `content_kind` demands; a non-strict callee either
    /// passes through unchanged (contextual caller) or gets a context
    /// derived for this specific call site.
    fn infer_call(&mut self, call_id: NodeId, template_name: &str, is_delegate: bool, ctx: Context) -> Result<Context> {
        let target = if is_delegate {
            self.registry.delegate_variants(template_name).into_iter().next().map(|t| t.node_id)
        } else {
            self.registry.lookup_basic(template_name).map(|t| t.node_id)
        };
        // An unresolvable target was already reported by `check_calls`;
        // don't cascade a second diagnostic here.
        let Some(callee_node) = target else { return Ok(ctx) };
        let content_kind = match &self.arena.get(callee_node).data {
            Node::Soy(SoyNodeKind::Template(data)) => data.content_kind,
            _ => None,
        };

        let end_ctx = match content_kind {
            Some(kind) => {
                let expected_entry = Context::start_context_for(kind);
                if expected_entry != ctx {
                    let location = self.arena.location_of(call_id).clone();
                    self.reporter.report(Diagnostic::error(
                        location,
                        DiagnosticKind::CrossKindStrictCall,
                        format!("call enters in a context that does not match the callee's declared kind={kind:?}"),
                    ));
                    Context::ERROR
                } else {
                    self.infer_template(callee_node, expected_entry)?
                }
            }
            None => self.derive_call(call_id, callee_node, template_name, ctx)?,
        };

        if !end_ctx.is_error() {
            self.inferences.record_call_end_context(call_id, end_ctx);
        }
        Ok(end_ctx)
    }

    /// A non-strict callee has no content kind of its own, so its context
    /// is pinned by whichever context the caller sits in. A `Contextual`
    /// caller simply passes its context straight through (spec.md §4.9
    /// "contextual caller, non-strict callee"); any other caller mode
    /// must derive (re-infer) the callee's body starting from the call
    /// site's own context, recording the context-specialised name this
    /// particular derivation corresponds to.
    fn derive_call(&mut self, call_id: NodeId, callee_node: NodeId, template_name: &str, ctx: Context) -> Result<Context> {
        if self.mode == AutoescapeMode::Contextual {
            return self.infer_template(callee_node, ctx);
        }

        const ILLEGAL_DERIVATION_STATES: &[State] = &[
            State::HtmlBeforeTagName,
            State::HtmlTagName,
            State::HtmlBeforeAttrName,
            State::HtmlAttrName,
            State::HtmlComment,
        ];
        if ILLEGAL_DERIVATION_STATES.contains(&ctx.state) {
            let location = self.arena.location_of(call_id).clone();
            self.reporter.report(Diagnostic::error(
                location,
                DiagnosticKind::IllegalRecontextualisation,
                "a non-strict template cannot be re-contextualised from the middle of an HTML tag",
            ));
            return Ok(Context::ERROR);
        }

        let end_ctx = self.infer_template(callee_node, ctx)?;
        if !end_ctx.is_error() {
            self.inferences.record_derived_callee(call_id, context_suffix(template_name, ctx));
        }
        Ok(end_ctx)
    }
}

/// Builds the derived-callee name a particular `(callee, entry context)`
/// derivation corresponds to (spec.md §4.9 "Derivation"). This engine
/// doesn't clone the callee's AST per derivation (see module docs); the
/// name is recorded in `Inferences` for a backend to key its own
/// per-context-specialised output on.
fn context_suffix(template_name: &str, ctx: Context) -> String {
    format!("{template_name}__{:?}", ctx.state)
}

/// A reduced view of [`crate::ast::Node`] sufficient for context inference,
/// so `infer_node` doesn't need to match the full `SoyNodeKind` surface
/// directly and stays readable.
enum InferenceNode {
    RawText(String),
    Literal(String),
    HtmlOpenTag {
        name: String,
        attributes: Vec<NodeId>,
        self_closing: bool,
    },
    HtmlCloseTag,
    HtmlAttribute { name: String, value: Option<NodeId> },
    HtmlAttributeValue { quote: QuoteStyle, parts: Vec<NodeId> },
    Print { directives: Vec<String> },
    If {
        branches: Vec<(NodeId, Vec<NodeId>)>,
        else_branch: Option<Vec<NodeId>>,
    },
    For { body: Vec<NodeId> },
    Msg {
        body: Vec<NodeId>,
        fallback: Option<Vec<NodeId>>,
    },
    Call { template_name: String, is_delegate: bool },
    Other(Vec<NodeId>),
}

trait IntoInferenceNode {
    fn clone_for_inference(&self) -> InferenceNode;
}

impl IntoInferenceNode for Node {
    fn clone_for_inference(&self) -> InferenceNode {
        match self {
            Node::Soy(SoyNodeKind::RawText(s)) => InferenceNode::RawText(s.clone()),
            Node::Soy(SoyNodeKind::Literal(s)) => InferenceNode::Literal(s.clone()),
            Node::Soy(SoyNodeKind::HtmlOpenTag { name, attributes, self_closing }) => InferenceNode::HtmlOpenTag {
                name: name.clone(),
                attributes: attributes.clone(),
                self_closing: *self_closing,
            },
            Node::Soy(SoyNodeKind::HtmlCloseTag { .. }) => InferenceNode::HtmlCloseTag,
            Node::Soy(SoyNodeKind::HtmlAttribute { name, value }) => InferenceNode::HtmlAttribute {
                name: name.clone(),
                value: *value,
            },
            Node::Soy(SoyNodeKind::HtmlAttributeValue { quote, parts }) => InferenceNode::HtmlAttributeValue {
                quote: *quote,
                parts: parts.clone(),
            },
            Node::Soy(SoyNodeKind::Print { directives, .. }) => InferenceNode::Print {
                directives: directives.iter().map(|d| d.name.clone()).collect(),
            },
            Node::Soy(SoyNodeKind::If { branches, else_branch }) => InferenceNode::If {
                branches: branches.clone(),
                else_branch: else_branch.clone(),
            },
            Node::Soy(SoyNodeKind::For { body, .. }) => InferenceNode::For { body: body.clone() },
            Node::Soy(SoyNodeKind::Msg { body, fallback, .. }) => InferenceNode::Msg {
                body: body.clone(),
                fallback: fallback.clone(),
            },
            Node::Soy(SoyNodeKind::CallBasic { template_name, .. }) => InferenceNode::Call {
                template_name: template_name.name.clone(),
                is_delegate: false,
            },
            Node::Soy(SoyNodeKind::CallDelegate { template_name, .. }) => InferenceNode::Call {
                template_name: template_name.name.clone(),
                is_delegate: true,
            },
            other => InferenceNode::Other(other.child_ids().to_vec()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::SourceLocation;

    fn alloc(arena: &mut Arena, n: Node) -> NodeId {
        arena.alloc(None, SourceLocation::unknown(), n)
    }

    #[test]
    fn plain_text_template_stays_in_html_context() {
        let mut arena = Arena::new();
        let text = alloc(&mut arena, Node::Soy(SoyNodeKind::RawText("hi".into())));
        let registry = TemplateRegistry::new();
        let mut reporter = ErrorReporter::new();
        let mut inferences = Inferences::new();
        let mut analyzer = ContextualAnalyzer::new(&arena, &registry, &mut reporter, &mut inferences);
        let ctx = analyzer.infer_body(&[text], Context::HTML_PCDATA).unwrap();
        assert_eq!(ctx, Context::HTML_PCDATA);
    }

    #[test]
    fn if_branches_must_agree_on_exit_context() {
        let mut arena = Arena::new();
        let text_a = alloc(&mut arena, Node::Soy(SoyNodeKind::RawText("a".into())));
        let open_script = alloc(
            &mut arena,
            Node::Soy(SoyNodeKind::HtmlOpenTag {
                name: "script".into(),
                attributes: vec![],
                self_closing: true,
            }),
        );
        let cond = alloc(&mut arena, Node::Expr(crate::ast::ExprNodeKind::BoolLiteral(true)));
        let if_node = Node::Soy(SoyNodeKind::If {
            branches: vec![(cond, vec![text_a]), (cond, vec![open_script])],
            else_branch: None,
        });
        let if_id = alloc(&mut arena, if_node);
        let registry = TemplateRegistry::new();
        let mut reporter = ErrorReporter::new();
        let mut inferences = Inferences::new();
        let mut analyzer = ContextualAnalyzer::new(&arena, &registry, &mut reporter, &mut inferences);
        let ctx = analyzer.infer_node(if_id, Context::HTML_PCDATA).unwrap();
        assert!(ctx.is_error());
        assert!(reporter.has_errors());
    }

    #[test]
    fn print_inside_an_href_attribute_value_is_visited_and_gets_a_uri_directive() {
        let mut arena = Arena::new();
        let u = alloc(
            &mut arena,
            Node::Expr(crate::ast::ExprNodeKind::VarRef(crate::node::Identifier::new(
                "u",
                SourceLocation::unknown(),
            ))),
        );
        let print = alloc(
            &mut arena,
            Node::Soy(SoyNodeKind::Print {
                expr: u,
                directives: vec![],
            }),
        );
        let value = alloc(
            &mut arena,
            Node::Soy(SoyNodeKind::HtmlAttributeValue {
                quote: QuoteStyle::Double,
                parts: vec![print],
            }),
        );
        let href = alloc(
            &mut arena,
            Node::Soy(SoyNodeKind::HtmlAttribute {
                name: "href".into(),
                value: Some(value),
            }),
        );
        let open_a = alloc(
            &mut arena,
            Node::Soy(SoyNodeKind::HtmlOpenTag {
                name: "a".into(),
                attributes: vec![href],
                self_closing: false,
            }),
        );
        let registry = TemplateRegistry::new();
        let mut reporter = ErrorReporter::new();
        let mut inferences = Inferences::new();
        let mut analyzer = ContextualAnalyzer::new(&arena, &registry, &mut reporter, &mut inferences);
        let ctx = analyzer.infer_node(open_a, Context::HTML_PCDATA).unwrap();
        assert!(!ctx.is_error());
        assert_eq!(ctx.state, State::Html);
        let directives = inferences.directives_of(print).expect("print node should have recorded directives");
        assert!(directives.contains(&EscapeDirective::NormalizeUri) || directives.contains(&EscapeDirective::EscapeUri));
    }
}
