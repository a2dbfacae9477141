//! Property tests for qualified name resolution

use edmx::names::{parse_type_reference, resolve_alias, resolve_target, AliasMap};
use proptest::prelude::*;

fn aliases() -> AliasMap {
    let mut aliases = AliasMap::new();
    aliases.insert("f".to_string(), "foo".to_string());
    aliases.insert("display".to_string(), "org.example.vocabularies.display".to_string());
    aliases
}

proptest! {
    #[test]
    fn unaliased_names_are_unchanged(name in "[a-eg-z][a-z]{0,6}(\\.[A-Za-z]{1,8}){0,3}(/[A-Za-z.]{1,8}){0,2}") {
        prop_assume!(!name.starts_with("display."));
        prop_assert_eq!(resolve_alias(&name, &aliases()), name.clone());
    }

    #[test]
    fn resolution_is_idempotent(name in "(f|display|bar)\\.[A-Z][a-z]{0,6}(/[A-Za-z]{1,8}){0,2}") {
        let aliases = aliases();
        let once = resolve_alias(&name, &aliases);
        prop_assert_eq!(resolve_alias(&once, &aliases), once.clone());
    }

    #[test]
    fn alias_resolution_keeps_path_suffix(
        simple in "[A-Z][a-z]{0,6}",
        path in "(/[A-Za-z_.]{1,8}){0,3}",
    ) {
        let resolved = resolve_alias(&format!("f.{}{}", simple, path), &aliases());
        prop_assert_eq!(resolved, format!("foo.{}{}", simple, path));
    }

    #[test]
    fn own_container_children_are_shortened(child in "[A-Za-z_]{1,12}") {
        let target = format!("f.Container/{}", child);
        prop_assert_eq!(resolve_target(&target, &aliases(), Some("foo.Container")), child);
    }

    #[test]
    fn collection_wrapper_sets_flag(simple in "[A-Z][a-z]{0,6}") {
        let reference = parse_type_reference(&format!("Collection(f.{})", simple), &aliases());
        prop_assert!(reference.is_collection);
        prop_assert_eq!(reference.name, format!("foo.{}", simple));
    }
}
