//! Qualified name resolution
//!
//! EDM names are written either namespace-qualified (`org.example.Worker`) or
//! alias-qualified (`f.Worker`). This module rewrites alias-qualified names to
//! their namespace-qualified form and unwraps `Collection(...)` type references.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Alias to namespace mapping
pub type AliasMap = HashMap<String, String>;

static COLLECTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^Collection\((.+)\)$").unwrap());

/// A parsed `Type` attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeReference {
    /// Namespace-qualified type name
    pub name: String,
    /// Whether the reference was wrapped in `Collection(...)`
    pub is_collection: bool,
}

/// Build the qualified name `namespace.name`
pub fn qualified_name(namespace: &str, name: &str) -> String {
    format!("{}.{}", namespace, name)
}

/// Resolve an alias-qualified name against the alias table
///
/// Only a name whose qualifier (the part before any `/` path) is a single
/// identifier followed by exactly one `.` can be alias-qualified. The
/// qualifier is replaced by its namespace and everything after it, including
/// a `/` path, is kept verbatim. All other names are returned unchanged.
pub fn resolve_alias(name: &str, aliases: &AliasMap) -> String {
    let qualifier_end = name.find('/').unwrap_or(name.len());
    let qualified = &name[..qualifier_end];

    if let Some((alias, _)) = qualified.split_once('.') {
        if qualified.matches('.').count() == 1 {
            if let Some(namespace) = aliases.get(alias) {
                return format!("{}{}", namespace, &name[alias.len()..]);
            }
        }
    }

    name.to_string()
}

/// Resolve a path that may point into an entity container
///
/// Used for `NavigationPropertyBinding/@Target` and the `EntitySet` of
/// operation imports. A path naming a direct child of `container` is
/// shortened to the child's name; any other path stays qualified.
pub fn resolve_target(target: &str, aliases: &AliasMap, container: Option<&str>) -> String {
    let resolved = resolve_alias(target, aliases);

    if let Some(container) = container {
        if let Some(rest) = resolved
            .strip_prefix(container)
            .and_then(|rest| rest.strip_prefix('/'))
        {
            if !rest.contains('/') {
                return rest.to_string();
            }
        }
    }

    resolved
}

/// Parse a `Type` attribute, unwrapping `Collection(...)` and resolving aliases
pub fn parse_type_reference(type_name: &str, aliases: &AliasMap) -> TypeReference {
    match COLLECTION.captures(type_name).and_then(|c| c.get(1)) {
        Some(inner) => TypeReference {
            name: resolve_alias(inner.as_str(), aliases),
            is_collection: true,
        },
        None => TypeReference {
            name: resolve_alias(type_name, aliases),
            is_collection: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aliases() -> AliasMap {
        let mut aliases = AliasMap::new();
        aliases.insert("display".to_string(), "org.example.vocabularies.display".to_string());
        aliases.insert("f".to_string(), "foo".to_string());
        aliases
    }

    #[test]
    fn test_resolve_alias_types() {
        let aliases = aliases();
        assert_eq!(
            resolve_alias("display.Foo", &aliases),
            "org.example.vocabularies.display.Foo"
        );
        assert_eq!(resolve_alias("display.bar.Foo", &aliases), "display.bar.Foo");
        assert_eq!(resolve_alias("bar.Foo", &aliases), "bar.Foo");
        assert_eq!(resolve_alias("Foo", &aliases), "Foo");
    }

    #[test]
    fn test_resolve_alias_paths() {
        let aliases = aliases();
        assert_eq!(
            resolve_alias("display.Container/Foo", &aliases),
            "org.example.vocabularies.display.Container/Foo"
        );
        assert_eq!(resolve_alias("f.Container/a.b/c", &aliases), "foo.Container/a.b/c");
        assert_eq!(resolve_alias("Employees/Team", &aliases), "Employees/Team");
    }

    #[test]
    fn test_resolve_target() {
        let aliases = aliases();
        let container = Some("foo.Container");
        assert_eq!(resolve_target("f.Container/Managers", &aliases, container), "Managers");
        assert_eq!(resolve_target("foo.Container/Managers", &aliases, container), "Managers");
        assert_eq!(
            resolve_target("other.Container/Foo", &aliases, container),
            "other.Container/Foo"
        );
        assert_eq!(
            resolve_target("f.Container/Foo/Bar", &aliases, container),
            "foo.Container/Foo/Bar"
        );
        assert_eq!(resolve_target("Employees", &aliases, container), "Employees");
        assert_eq!(resolve_target("f.Manager", &aliases, container), "foo.Manager");
        assert_eq!(
            resolve_target("f.Container/Managers", &aliases, None),
            "foo.Container/Managers"
        );
    }

    #[test]
    fn test_resolve_target_requires_path_separator() {
        let aliases = aliases();
        assert_eq!(
            resolve_target("foo.ContainerX/Managers", &aliases, Some("foo.Container")),
            "foo.ContainerX/Managers"
        );
    }

    #[test]
    fn test_parse_type_reference() {
        let aliases = aliases();
        assert_eq!(
            parse_type_reference("f.Bar", &aliases),
            TypeReference { name: "foo.Bar".to_string(), is_collection: false }
        );
        assert_eq!(
            parse_type_reference("Collection(f.Bar)", &aliases),
            TypeReference { name: "foo.Bar".to_string(), is_collection: true }
        );
        assert_eq!(
            parse_type_reference("Collection(Edm.String)", &aliases),
            TypeReference { name: "Edm.String".to_string(), is_collection: true }
        );
    }

    #[test]
    fn test_qualified_name() {
        assert_eq!(qualified_name("foo", "Worker"), "foo.Worker");
    }
}
