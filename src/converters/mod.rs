//! CSDL/XML to JSON metadata conversion
//!
//! This module turns an `<Edmx>` element tree into the JSON form of the
//! metadata: one entry per qualified type, container and operation name,
//! `$`-prefixed keys for EDM attributes, and `$EntityContainer` naming the
//! default container.
//!
//! Conversion runs two traversals over the same tree. The first only collects
//! aliases, because a schema may use an alias declared by a later schema. The
//! second builds the result.

mod aggregate;
mod facets;
mod handlers;
mod traverse;

pub use aggregate::{Aggregate, JsonObject, ENTITY_CONTAINER_KEY};
pub use facets::{
    enum_member_value, parse_boolean, process_facet_attributes, set_flag, DEFAULT_UNDERLYING_TYPE,
    FACET_ATTRIBUTES, MAX_SAFE_INTEGER,
};
pub use traverse::{traverse, ConfigEntry, ConfigNode, Handler};

use once_cell::sync::Lazy;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::documents::{Document, Element};
use crate::error::Result;

/// Configuration of the alias-collecting traversal
static ALIAS_CONFIG: Lazy<ConfigNode<Aggregate>> = Lazy::new(|| {
    ConfigNode::new()
        .with(
            "Reference",
            ConfigEntry::new().with_include(
                ConfigNode::new().with("Include", ConfigEntry::handler(handlers::collect_include_alias)),
            ),
        )
        .with(
            "DataServices",
            ConfigEntry::new().with_children(
                ConfigNode::new().with("Schema", ConfigEntry::handler(handlers::collect_schema_alias)),
            ),
        )
});

/// Configuration of the converting traversal
static FULL_CONFIG: Lazy<ConfigNode<Aggregate>> = Lazy::new(|| {
    ConfigNode::new()
        .with(
            "Reference",
            ConfigEntry::handler(handlers::process_reference).with_include(
                ConfigNode::new().with("Include", ConfigEntry::handler(handlers::process_include)),
            ),
        )
        .with(
            "DataServices",
            ConfigEntry::new().with_children(ConfigNode::new().with(
                "Schema",
                ConfigEntry::handler(handlers::process_schema).with_children(schema_config()),
            )),
        )
});

fn schema_config() -> ConfigNode<Aggregate> {
    ConfigNode::new()
        .with(
            "EntityType",
            ConfigEntry::handler(handlers::process_entity_type).with_children(
                structured_type_config().with(
                    "Key",
                    ConfigEntry::new().with_children(
                        ConfigNode::new()
                            .with("PropertyRef", ConfigEntry::handler(handlers::process_property_ref)),
                    ),
                ),
            ),
        )
        .with(
            "ComplexType",
            ConfigEntry::handler(handlers::process_complex_type)
                .with_children(structured_type_config()),
        )
        .with(
            "EnumType",
            ConfigEntry::handler(handlers::process_enum_type).with_children(
                ConfigNode::new().with("Member", ConfigEntry::handler(handlers::process_enum_member)),
            ),
        )
        .with(
            "TypeDefinition",
            ConfigEntry::handler(handlers::process_type_definition),
        )
        .with(
            "Action",
            ConfigEntry::handler(handlers::process_action).with_children(operation_config()),
        )
        .with(
            "Function",
            ConfigEntry::handler(handlers::process_function).with_children(operation_config()),
        )
        .with(
            "EntityContainer",
            ConfigEntry::handler(handlers::process_entity_container)
                .with_children(container_config()),
        )
}

fn structured_type_config() -> ConfigNode<Aggregate> {
    ConfigNode::new()
        .with("Property", ConfigEntry::handler(handlers::process_property))
        .with(
            "NavigationProperty",
            ConfigEntry::handler(handlers::process_navigation_property).with_children(
                ConfigNode::new()
                    .with("OnDelete", ConfigEntry::handler(handlers::process_on_delete))
                    .with(
                        "ReferentialConstraint",
                        ConfigEntry::handler(handlers::process_referential_constraint),
                    ),
            ),
        )
}

fn operation_config() -> ConfigNode<Aggregate> {
    ConfigNode::new()
        .with("Parameter", ConfigEntry::handler(handlers::process_parameter))
        .with("ReturnType", ConfigEntry::handler(handlers::process_return_type))
}

fn container_config() -> ConfigNode<Aggregate> {
    let bindings = || {
        ConfigNode::new().with(
            "NavigationPropertyBinding",
            ConfigEntry::handler(handlers::process_navigation_property_binding),
        )
    };

    ConfigNode::new()
        .with(
            "EntitySet",
            ConfigEntry::handler(handlers::process_entity_set).with_children(bindings()),
        )
        .with(
            "Singleton",
            ConfigEntry::handler(handlers::process_singleton).with_children(bindings()),
        )
        .with("ActionImport", ConfigEntry::handler(handlers::process_action_import))
        .with("FunctionImport", ConfigEntry::handler(handlers::process_function_import))
}

/// Resolve an alias-qualified name against an aggregate's alias table
pub fn resolve_alias(name: &str, aggregate: &Aggregate) -> String {
    aggregate.resolve_alias(name)
}

/// Convert the root element of a CSDL/XML document to its JSON form
///
/// The root is expected to be `<Edmx>`; its `Reference` and `DataServices`
/// children are converted, anything else is ignored.
pub fn convert(root: &Element) -> Result<JsonValue> {
    let mut aggregate = Aggregate::new();

    traverse(root, &mut aggregate, &*ALIAS_CONFIG)?;
    debug!(aliases = aggregate.aliases.len(), "collected aliases");

    traverse(root, &mut aggregate, &*FULL_CONFIG)?;
    let result = aggregate.into_result();
    debug!(entries = result.len(), "converted metadata");

    Ok(JsonValue::Object(result))
}

/// Parse a CSDL/XML document and convert it to its JSON form
pub fn convert_str(xml: &str) -> Result<JsonValue> {
    let root = Document::from_string(xml)?.into_root()?;
    convert(&root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_convert_empty_edmx() {
        assert_eq!(convert_str("<Edmx/>").unwrap(), json!({}));
    }

    #[test]
    fn test_resolve_alias_with_aggregate() {
        let mut aggregate = Aggregate::new();
        aggregate.add_alias("display", "org.example.vocabularies.display");

        assert_eq!(
            resolve_alias("display.Container/Foo", &aggregate),
            "org.example.vocabularies.display.Container/Foo"
        );
        assert_eq!(resolve_alias("bar.Foo", &aggregate), "bar.Foo");
    }

    #[test]
    fn test_alias_declared_by_later_schema() {
        let result = convert_str(
            r#"<Edmx><DataServices>
                <Schema Namespace="bar"><ComplexType Name="C"><Property Name="p" Type="f.T"/></ComplexType></Schema>
                <Schema Namespace="foo" Alias="f"/>
            </DataServices></Edmx>"#,
        )
        .unwrap();

        assert_eq!(result["bar.C"]["p"]["$Type"], json!("foo.T"));
    }

    #[test]
    fn test_unknown_elements_are_ignored() {
        let result = convert_str(
            r#"<Edmx><Custom/><DataServices><Schema Namespace="foo">
                <Annotations Target="foo.T"><Annotation Term="x.y"/></Annotations>
                <Term Name="t" Type="Edm.String"/>
                <EntityType Name="T"><Annotation Term="x.y"/><Unknown/></EntityType>
            </Schema></DataServices></Edmx>"#,
        )
        .unwrap();

        assert_eq!(result, json!({"foo.T": {"$kind": "EntityType", "$Key": []}}));
    }

    #[test]
    fn test_missing_required_attribute_fails() {
        let result = convert_str(
            r#"<Edmx><DataServices><Schema Namespace="foo">
                <EntityType Name="T"><Property Name="p"/></EntityType>
            </Schema></DataServices></Edmx>"#,
        );
        assert!(matches!(
            result,
            Err(crate::error::Error::MissingAttribute { .. })
        ));
    }
}
