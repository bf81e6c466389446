//! Coverage of the HTML structure nodes the template-body parser produces
//! (spec.md §3.2, §4.2): `HtmlOpenTag`/`HtmlCloseTag`/`HtmlAttribute` land as
//! flat siblings in a template's body, unvalidated for nesting.

#[cfg(test)]
mod tests {
    use soy_compiler::ast::{Arena, Node, SoyNodeKind};
    use soy_compiler::diagnostics::ErrorReporter;
    use soy_compiler::node::NodeId;
    use soy_compiler::parser::soy::parse_file;
    use soy_compiler::source::SourceFilePath;

    fn template_body(src: &str) -> (Arena, Vec<NodeId>) {
        let mut arena = Arena::new();
        let mut reporter = ErrorReporter::new();
        let file_id = parse_file(&mut arena, &mut reporter, SourceFilePath::new("t.soy"), src);
        assert!(!reporter.has_errors());
        let templates = match &arena.get(file_id).data {
            Node::Soy(SoyNodeKind::File { templates, .. }) => templates.clone(),
            other => panic!("expected a file, got {other:?}"),
        };
        let body = match &arena.get(templates[0]).data {
            Node::Soy(SoyNodeKind::Template(data)) => data.body.clone(),
            other => panic!("expected a template, got {other:?}"),
        };
        (arena, body)
    }

    #[test]
    fn open_tag_collects_its_attributes() {
        let (arena, body) = template_body(
            r#"{namespace ns}
            {template .t}
              <div class="a" id="b"></div>
            {/template}
            "#,
        );
        let open = body.iter().find_map(|&id| match &arena.get(id).data {
            Node::Soy(SoyNodeKind::HtmlOpenTag { name, attributes, self_closing }) => {
                Some((name.clone(), attributes.clone(), *self_closing))
            }
            _ => None,
        });
        let (name, attributes, self_closing) = open.expect("expected an open tag in the body");
        assert_eq!(name, "div");
        assert_eq!(attributes.len(), 2);
        assert!(!self_closing);
    }

    #[test]
    fn self_closing_tag_sets_the_flag_and_has_no_separate_close_tag() {
        let (arena, body) = template_body(
            r#"{namespace ns}
            {template .t}
              <input type="text"/>
            {/template}
            "#,
        );
        let self_closing = body.iter().any(|&id| {
            matches!(&arena.get(id).data, Node::Soy(SoyNodeKind::HtmlOpenTag { self_closing: true, .. }))
        });
        assert!(self_closing);
        let has_close = body.iter().any(|&id| matches!(&arena.get(id).data, Node::Soy(SoyNodeKind::HtmlCloseTag { .. })));
        assert!(!has_close);
    }

    #[test]
    fn close_tag_carries_its_element_name() {
        let (arena, body) = template_body(
            r#"{namespace ns}
            {template .t}
              <span></span>
            {/template}
            "#,
        );
        let close_name = body.iter().find_map(|&id| match &arena.get(id).data {
            Node::Soy(SoyNodeKind::HtmlCloseTag { name }) => Some(name.clone()),
            _ => None,
        });
        assert_eq!(close_name.as_deref(), Some("span"));
    }

    #[test]
    fn attribute_without_a_value_has_no_value_node() {
        let (arena, body) = template_body(
            r#"{namespace ns}
            {template .t}
              <input disabled/>
            {/template}
            "#,
        );
        let open = body.iter().find_map(|&id| match &arena.get(id).data {
            Node::Soy(SoyNodeKind::HtmlOpenTag { attributes, .. }) => Some(attributes.clone()),
            _ => None,
        });
        let attributes = open.expect("expected an open tag");
        let attr_value = match &arena.get(attributes[0]).data {
            Node::Soy(SoyNodeKind::HtmlAttribute { name, value }) => {
                assert_eq!(name, "disabled");
                *value
            }
            other => panic!("expected an attribute, got {other:?}"),
        };
        assert!(attr_value.is_none());
    }

    #[test]
    fn nesting_is_not_validated_mismatched_close_tags_still_parse() {
        let (arena, _reporter) = {
            let mut arena = Arena::new();
            let mut reporter = ErrorReporter::new();
            let _ = parse_file(
                &mut arena,
                &mut reporter,
                SourceFilePath::new("t.soy"),
                r#"{namespace ns}
                {template .t}
                  <div><span></div></span>
                {/template}
                "#,
            );
            (arena, reporter)
        };
        assert!(arena.check_integrity().is_ok());
    }
}
