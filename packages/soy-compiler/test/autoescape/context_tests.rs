//! `Context` coverage beyond its inline tests (spec.md §4.9): the
//! remaining `start_context_for` branches and union's error path by field.

#[cfg(test)]
mod tests {
    use soy_compiler::ast::ContentKind;
    use soy_compiler::autoescape::context::{AttrType, Context, State, UriType};

    #[test]
    fn start_context_for_html_is_plain_pcdata() {
        let ctx = Context::start_context_for(ContentKind::Html);
        assert_eq!(ctx, Context::HTML_PCDATA);
    }

    #[test]
    fn start_context_for_attributes_begins_before_an_attr_name() {
        let ctx = Context::start_context_for(ContentKind::Attributes);
        assert_eq!(ctx.state, State::HtmlBeforeAttrName);
    }

    #[test]
    fn start_context_for_css_begins_in_the_css_state() {
        let ctx = Context::start_context_for(ContentKind::Css);
        assert_eq!(ctx.state, State::Css);
    }

    #[test]
    fn start_context_for_trusted_resource_uri_sets_the_trusted_uri_type() {
        let ctx = Context::start_context_for(ContentKind::TrustedResourceUri);
        assert_eq!(ctx.uri_type, UriType::TrustedResource);
    }

    #[test]
    fn start_context_for_js_begins_in_the_js_state() {
        let ctx = Context::start_context_for(ContentKind::Js);
        assert_eq!(ctx.state, State::Js);
    }

    #[test]
    fn union_distinguishes_contexts_that_differ_only_by_attr_type() {
        let a = Context { attr_type: AttrType::Plain, ..Context::HTML_PCDATA };
        let b = Context { attr_type: AttrType::Uri, ..Context::HTML_PCDATA };
        assert!(Context::union(a, b).is_error());
    }
}
