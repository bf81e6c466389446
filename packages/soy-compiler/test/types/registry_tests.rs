//! Additional `TypeRegistry` coverage beyond its inline unit tests
//! (spec.md §3.3, §4.3): composite interning, assignability of
//! lists/records, and display formatting.

#[cfg(test)]
mod tests {
    use soy_compiler::types::{RecordField, TypeRegistry};

    #[test]
    fn list_of_equal_element_types_interns_to_the_same_id() {
        let mut reg = TypeRegistry::new();
        let a = reg.list(reg.string);
        let b = reg.list(reg.string);
        assert_eq!(a, b);
    }

    #[test]
    fn list_is_assignable_when_its_element_type_is() {
        let mut reg = TypeRegistry::new();
        let list_number = reg.list(reg.number);
        let list_int = reg.list(reg.int);
        assert!(reg.is_assignable(list_number, list_int));
        assert!(!reg.is_assignable(list_int, list_number));
    }

    #[test]
    fn records_sort_fields_by_name_before_interning() {
        let mut reg = TypeRegistry::new();
        let a = reg.record(vec![
            RecordField { name: "b".into(), ty: reg.int },
            RecordField { name: "a".into(), ty: reg.string },
        ]);
        let b = reg.record(vec![
            RecordField { name: "a".into(), ty: reg.string },
            RecordField { name: "b".into(), ty: reg.int },
        ]);
        assert_eq!(a, b);
    }

    #[test]
    fn is_nullable_is_true_for_null_and_for_unions_containing_it() {
        let mut reg = TypeRegistry::new();
        let nullable_string = reg.get_or_create_union(vec![reg.string, reg.null]).unwrap();
        assert!(reg.is_nullable(reg.null));
        assert!(reg.is_nullable(nullable_string));
        assert!(!reg.is_nullable(reg.string));
    }

    #[test]
    fn display_renders_list_and_union_shapes_readably() {
        let mut reg = TypeRegistry::new();
        let list_string = reg.list(reg.string);
        assert_eq!(reg.display(list_string), "list<string>");

        let union = reg.get_or_create_union(vec![reg.int, reg.string]).unwrap();
        let rendered = reg.display(union);
        assert!(rendered.contains("int") && rendered.contains("string"));
    }

    #[test]
    fn resolve_by_name_finds_every_pre_registered_primitive() {
        let reg = TypeRegistry::new();
        for name in ["any", "unknown", "null", "bool", "int", "float", "number", "string"] {
            assert!(reg.resolve_by_name(name).is_ok(), "missing primitive `{name}`");
        }
        assert!(reg.resolve_by_name("not_a_type").is_err());
    }
}
