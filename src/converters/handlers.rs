//! Element handlers
//!
//! One handler per EDM construct. Each reads its element's attributes and
//! adds to the result held by the [`Aggregate`]; handlers for nested
//! constructs extend the definition their enclosing handler created.

use serde_json::{json, Value as JsonValue};
use tracing::{debug, warn};

use super::aggregate::{Aggregate, JsonObject};
use super::facets::{self, enum_member_value, process_facet_attributes, set_flag, set_string};
use crate::documents::Element;
use crate::error::Result;

/// Register the alias of a `Schema` (alias pass)
pub fn collect_schema_alias(element: &Element, aggregate: &mut Aggregate) -> Result<()> {
    let namespace = element.required_attribute("Namespace")?;
    if let Some(alias) = element.attribute("Alias") {
        aggregate.add_alias(alias, namespace);
    }
    Ok(())
}

/// Register the alias of a referenced `Include` (alias pass)
pub fn collect_include_alias(element: &Element, aggregate: &mut Aggregate) -> Result<()> {
    collect_schema_alias(element, aggregate)
}

/// `<Reference Uri>`: remember the URI for the `Include` children
pub fn process_reference(element: &Element, aggregate: &mut Aggregate) -> Result<()> {
    let uri = element.required_attribute("Uri")?;
    aggregate.set_reference(uri);
    Ok(())
}

/// `<Include Namespace Alias?>`: record the referenced namespace
pub fn process_include(element: &Element, aggregate: &mut Aggregate) -> Result<()> {
    let namespace = element.required_attribute("Namespace")?;
    if let Some(alias) = element.attribute("Alias") {
        aggregate.add_alias(alias, namespace);
    }
    let uri = aggregate.current_reference()?.to_string();
    let mut reference = JsonObject::new();
    reference.insert("$kind".to_string(), json!("Reference"));
    reference.insert("$ref".to_string(), json!(uri));
    aggregate.add_reference(namespace, reference)
}

/// `<Schema Namespace Alias?>`
pub fn process_schema(element: &Element, aggregate: &mut Aggregate) -> Result<()> {
    collect_schema_alias(element, aggregate)?;
    let namespace = element.required_attribute("Namespace")?;
    debug!(namespace, "converting schema");
    aggregate.set_schema(namespace);
    Ok(())
}

/// `<EntityType>`
pub fn process_entity_type(element: &Element, aggregate: &mut Aggregate) -> Result<()> {
    process_structured_type(element, aggregate, "EntityType")
}

/// `<ComplexType>`
pub fn process_complex_type(element: &Element, aggregate: &mut Aggregate) -> Result<()> {
    process_structured_type(element, aggregate, "ComplexType")
}

fn process_structured_type(element: &Element, aggregate: &mut Aggregate, kind: &str) -> Result<()> {
    let name = aggregate.qualified_name(element.required_attribute("Name")?)?;
    let attributes = &element.attributes;

    let mut definition = JsonObject::new();
    definition.insert("$kind".to_string(), json!(kind));
    if kind == "EntityType" {
        definition.insert("$Key".to_string(), JsonValue::Array(Vec::new()));
    }
    if let Some(base_type) = element.attribute("BaseType") {
        definition.insert("$BaseType".to_string(), json!(aggregate.resolve_alias(base_type)));
    }
    set_flag(&mut definition, attributes, "Abstract", false);
    set_flag(&mut definition, attributes, "OpenType", false);
    set_flag(&mut definition, attributes, "HasStream", false);

    aggregate.add_type(name, definition)
}

/// `<PropertyRef Name Alias?>` below `<Key>`
pub fn process_property_ref(element: &Element, aggregate: &mut Aggregate) -> Result<()> {
    let name = element.required_attribute("Name")?;
    let key_part = match element.attribute("Alias") {
        Some(alias) => json!({ alias: name }),
        None => json!(name),
    };

    let definition = aggregate.current_type_mut()?;
    match definition
        .entry("$Key")
        .or_insert_with(|| JsonValue::Array(Vec::new()))
    {
        JsonValue::Array(key) => key.push(key_part),
        other => *other = JsonValue::Array(vec![key_part]),
    }
    Ok(())
}

/// Copy `Type` (with `Collection(...)` unwrapped) and `Nullable` into `target`
fn process_type_attributes(
    element: &Element,
    aggregate: &Aggregate,
    target: &mut JsonObject,
) -> Result<()> {
    let type_reference = aggregate.type_reference(element.required_attribute("Type")?);
    if type_reference.is_collection {
        target.insert("$isCollection".to_string(), JsonValue::Bool(true));
    }
    target.insert("$Type".to_string(), JsonValue::String(type_reference.name));
    set_flag(target, &element.attributes, "Nullable", true);
    Ok(())
}

/// `<Property Name Type ...>`
pub fn process_property(element: &Element, aggregate: &mut Aggregate) -> Result<()> {
    let name = element.required_attribute("Name")?;

    let mut definition = JsonObject::new();
    definition.insert("$kind".to_string(), json!("Property"));
    process_type_attributes(element, aggregate, &mut definition)?;
    process_facet_attributes(&element.attributes, &mut definition);
    set_string(&mut definition, &element.attributes, "DefaultValue");

    aggregate.add_property(name, definition)
}

/// `<NavigationProperty Name Type Partner? ContainsTarget?>`
pub fn process_navigation_property(element: &Element, aggregate: &mut Aggregate) -> Result<()> {
    let name = element.required_attribute("Name")?;

    let mut definition = JsonObject::new();
    definition.insert("$kind".to_string(), json!("NavigationProperty"));
    process_type_attributes(element, aggregate, &mut definition)?;
    set_string(&mut definition, &element.attributes, "Partner");
    set_flag(&mut definition, &element.attributes, "ContainsTarget", false);

    aggregate.add_property(name, definition)
}

/// `<OnDelete Action>` below `<NavigationProperty>`
pub fn process_on_delete(element: &Element, aggregate: &mut Aggregate) -> Result<()> {
    let action = element.required_attribute("Action")?;
    aggregate
        .current_property_mut()?
        .insert("$OnDelete".to_string(), json!(action));
    Ok(())
}

/// `<ReferentialConstraint Property ReferencedProperty>` below `<NavigationProperty>`
pub fn process_referential_constraint(element: &Element, aggregate: &mut Aggregate) -> Result<()> {
    let property = element.required_attribute("Property")?;
    let referenced = element.required_attribute("ReferencedProperty")?;

    let definition = aggregate.current_property_mut()?;
    let constraints = definition
        .entry("$ReferentialConstraint")
        .or_insert_with(|| JsonValue::Object(JsonObject::new()));
    if let JsonValue::Object(constraints) = constraints {
        constraints.insert(property.to_string(), json!(referenced));
    }
    Ok(())
}

/// `<EnumType Name UnderlyingType? IsFlags?>`
pub fn process_enum_type(element: &Element, aggregate: &mut Aggregate) -> Result<()> {
    let name = aggregate.qualified_name(element.required_attribute("Name")?)?;
    let underlying_type = element
        .attribute("UnderlyingType")
        .unwrap_or(facets::DEFAULT_UNDERLYING_TYPE);

    let mut definition = JsonObject::new();
    definition.insert("$kind".to_string(), json!("EnumType"));
    if underlying_type != facets::DEFAULT_UNDERLYING_TYPE {
        definition.insert("$UnderlyingType".to_string(), json!(underlying_type));
    }
    set_flag(&mut definition, &element.attributes, "IsFlags", false);

    aggregate.add_type(name, definition)?;
    aggregate.start_enum(underlying_type);
    Ok(())
}

/// `<Member Name Value?>` below `<EnumType>`
///
/// Without `Value` a member takes the previous member's value plus one,
/// starting at zero.
pub fn process_enum_member(element: &Element, aggregate: &mut Aggregate) -> Result<()> {
    let name = element.required_attribute("Name")?;

    let value = match element.attribute("Value") {
        None => {
            let value = aggregate.enum_member_counter();
            aggregate.set_enum_member_value(value);
            enum_member_value(value, aggregate.enum_underlying_type())
        }
        Some(literal) => match literal.trim().parse::<i64>() {
            Ok(value) => {
                aggregate.set_enum_member_value(value);
                enum_member_value(value, aggregate.enum_underlying_type())
            }
            Err(_) => {
                warn!(member = name, value = literal, "non-numeric enum member value");
                let position = aggregate.enum_member_counter();
                aggregate.set_enum_member_value(position);
                json!(literal)
            }
        },
    };

    aggregate
        .current_type_mut()?
        .insert(name.to_string(), value);
    Ok(())
}

/// `<TypeDefinition Name UnderlyingType ...facets>`
pub fn process_type_definition(element: &Element, aggregate: &mut Aggregate) -> Result<()> {
    let name = aggregate.qualified_name(element.required_attribute("Name")?)?;
    let underlying_type = element.required_attribute("UnderlyingType")?;

    let mut definition = JsonObject::new();
    definition.insert("$kind".to_string(), json!("TypeDefinition"));
    definition.insert(
        "$UnderlyingType".to_string(),
        json!(aggregate.resolve_alias(underlying_type)),
    );
    process_facet_attributes(&element.attributes, &mut definition);

    aggregate.add_type(name, definition)
}

/// `<Action>`
pub fn process_action(element: &Element, aggregate: &mut Aggregate) -> Result<()> {
    process_operation(element, aggregate, "Action")
}

/// `<Function>`
pub fn process_function(element: &Element, aggregate: &mut Aggregate) -> Result<()> {
    process_operation(element, aggregate, "Function")
}

fn process_operation(element: &Element, aggregate: &mut Aggregate, kind: &str) -> Result<()> {
    let name = aggregate.qualified_name(element.required_attribute("Name")?)?;
    let attributes = &element.attributes;

    let mut overload = JsonObject::new();
    overload.insert("$kind".to_string(), json!(kind));
    set_flag(&mut overload, attributes, "IsBound", false);
    set_string(&mut overload, attributes, "EntitySetPath");
    set_flag(&mut overload, attributes, "IsComposable", false);
    overload.insert("$Parameter".to_string(), JsonValue::Array(Vec::new()));

    aggregate.add_overload(name, overload)
}

/// `<Parameter Name Type ...>` below `<Action>` or `<Function>`
pub fn process_parameter(element: &Element, aggregate: &mut Aggregate) -> Result<()> {
    let name = element.required_attribute("Name")?;

    let mut parameter = JsonObject::new();
    parameter.insert("$kind".to_string(), json!("Parameter"));
    parameter.insert("$Name".to_string(), json!(name));
    process_type_attributes(element, aggregate, &mut parameter)?;
    process_facet_attributes(&element.attributes, &mut parameter);

    let overload = aggregate.current_overload_mut()?;
    match overload
        .entry("$Parameter")
        .or_insert_with(|| JsonValue::Array(Vec::new()))
    {
        JsonValue::Array(parameters) => parameters.push(JsonValue::Object(parameter)),
        other => *other = JsonValue::Array(vec![JsonValue::Object(parameter)]),
    }
    Ok(())
}

/// `<ReturnType Type ...>` below `<Action>` or `<Function>`
pub fn process_return_type(element: &Element, aggregate: &mut Aggregate) -> Result<()> {
    let mut return_type = JsonObject::new();
    process_type_attributes(element, aggregate, &mut return_type)?;
    process_facet_attributes(&element.attributes, &mut return_type);

    aggregate
        .current_overload_mut()?
        .insert("$ReturnType".to_string(), JsonValue::Object(return_type));
    Ok(())
}

/// `<EntityContainer Name>`
pub fn process_entity_container(element: &Element, aggregate: &mut Aggregate) -> Result<()> {
    let name = aggregate.qualified_name(element.required_attribute("Name")?)?;
    debug!(container = name.as_str(), "converting entity container");

    let mut definition = JsonObject::new();
    definition.insert("$kind".to_string(), json!("EntityContainer"));
    aggregate.add_container(name, definition)
}

/// `<EntitySet Name EntityType IncludeInServiceDocument?>`
pub fn process_entity_set(element: &Element, aggregate: &mut Aggregate) -> Result<()> {
    let name = element.required_attribute("Name")?;
    let entity_type = element.required_attribute("EntityType")?;

    let mut definition = JsonObject::new();
    definition.insert("$kind".to_string(), json!("EntitySet"));
    definition.insert("$Type".to_string(), json!(aggregate.resolve_alias(entity_type)));
    set_flag(&mut definition, &element.attributes, "IncludeInServiceDocument", true);

    aggregate.add_container_child(name, definition)
}

/// `<Singleton Name Type>`
pub fn process_singleton(element: &Element, aggregate: &mut Aggregate) -> Result<()> {
    let name = element.required_attribute("Name")?;
    let singleton_type = element.required_attribute("Type")?;

    let mut definition = JsonObject::new();
    definition.insert("$kind".to_string(), json!("Singleton"));
    definition.insert("$Type".to_string(), json!(aggregate.resolve_alias(singleton_type)));

    aggregate.add_container_child(name, definition)
}

/// `<NavigationPropertyBinding Path Target>` below `<EntitySet>` or `<Singleton>`
pub fn process_navigation_property_binding(
    element: &Element,
    aggregate: &mut Aggregate,
) -> Result<()> {
    let path = element.required_attribute("Path")?;
    let target = aggregate.resolve_target(element.required_attribute("Target")?);

    let definition = aggregate.current_container_child_mut()?;
    let bindings = definition
        .entry("$NavigationPropertyBinding")
        .or_insert_with(|| JsonValue::Object(JsonObject::new()));
    if let JsonValue::Object(bindings) = bindings {
        bindings.insert(path.to_string(), json!(target));
    }
    Ok(())
}

/// `<ActionImport Name Action EntitySet? IncludeInServiceDocument?>`
pub fn process_action_import(element: &Element, aggregate: &mut Aggregate) -> Result<()> {
    process_operation_import(element, aggregate, "Action")
}

/// `<FunctionImport Name Function EntitySet? IncludeInServiceDocument?>`
pub fn process_function_import(element: &Element, aggregate: &mut Aggregate) -> Result<()> {
    process_operation_import(element, aggregate, "Function")
}

fn process_operation_import(
    element: &Element,
    aggregate: &mut Aggregate,
    kind: &str,
) -> Result<()> {
    let name = element.required_attribute("Name")?;
    let operation = element.required_attribute(kind)?;

    let mut definition = JsonObject::new();
    definition.insert("$kind".to_string(), json!(format!("{}Import", kind)));
    definition.insert(format!("${}", kind), json!(aggregate.resolve_alias(operation)));
    if let Some(entity_set) = element.attribute("EntitySet") {
        definition.insert("$EntitySet".to_string(), json!(aggregate.resolve_target(entity_set)));
    }
    set_flag(&mut definition, &element.attributes, "IncludeInServiceDocument", true);

    aggregate.add_container_child(name, definition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn schema_aggregate() -> Aggregate {
        let mut aggregate = Aggregate::new();
        aggregate.add_alias("f", "foo");
        aggregate.set_schema("foo");
        aggregate
    }

    #[test]
    fn test_schema_registers_alias() {
        let mut aggregate = Aggregate::new();
        let schema = Element::new("Schema")
            .with_attribute("Namespace", "foo")
            .with_attribute("Alias", "f");

        process_schema(&schema, &mut aggregate).unwrap();

        assert_eq!(aggregate.current_schema(), Some("foo"));
        assert_eq!(aggregate.aliases.get("f").map(String::as_str), Some("foo"));
    }

    #[test]
    fn test_property_missing_type() {
        let mut aggregate = schema_aggregate();
        process_complex_type(&Element::new("ComplexType").with_attribute("Name", "Worker"), &mut aggregate)
            .unwrap();

        let err = process_property(&Element::new("Property").with_attribute("Name", "p1"), &mut aggregate)
            .unwrap_err();

        match err {
            Error::MissingAttribute { element, attribute } => {
                assert_eq!(element, "Property");
                assert_eq!(attribute, "Type");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_key_without_alias() {
        let mut aggregate = schema_aggregate();
        process_entity_type(&Element::new("EntityType").with_attribute("Name", "Worker"), &mut aggregate)
            .unwrap();
        process_property_ref(&Element::new("PropertyRef").with_attribute("Name", "ID"), &mut aggregate)
            .unwrap();
        process_property_ref(
            &Element::new("PropertyRef")
                .with_attribute("Name", "Bar/Baz")
                .with_attribute("Alias", "qux"),
            &mut aggregate,
        )
        .unwrap();

        assert_eq!(
            aggregate.result()["foo.Worker"]["$Key"],
            json!(["ID", {"qux": "Bar/Baz"}])
        );
    }

    #[test]
    fn test_enum_member_after_explicit_value() {
        let mut aggregate = schema_aggregate();
        process_enum_type(&Element::new("EnumType").with_attribute("Name", "E"), &mut aggregate).unwrap();
        for member in [
            Element::new("Member").with_attribute("Name", "A").with_attribute("Value", "5"),
            Element::new("Member").with_attribute("Name", "B"),
            Element::new("Member").with_attribute("Name", "C").with_attribute("Value", "1"),
            Element::new("Member").with_attribute("Name", "D"),
        ] {
            process_enum_member(&member, &mut aggregate).unwrap();
        }

        assert_eq!(
            aggregate.result()["foo.E"],
            json!({"$kind": "EnumType", "A": 5, "B": 6, "C": 1, "D": 2})
        );
    }

    #[test]
    fn test_type_definition_facets() {
        let mut aggregate = schema_aggregate();
        let element = Element::new("TypeDefinition")
            .with_attribute("Name", "Amount")
            .with_attribute("UnderlyingType", "Edm.Decimal")
            .with_attribute("Precision", "16")
            .with_attribute("Scale", "variable");

        process_type_definition(&element, &mut aggregate).unwrap();

        assert_eq!(
            aggregate.result()["foo.Amount"],
            json!({
                "$kind": "TypeDefinition",
                "$UnderlyingType": "Edm.Decimal",
                "$Precision": 16,
                "$Scale": "variable"
            })
        );
    }

    #[test]
    fn test_parameter_outside_operation() {
        let mut aggregate = schema_aggregate();
        let parameter = Element::new("Parameter")
            .with_attribute("Name", "p")
            .with_attribute("Type", "Edm.String");

        let result = process_parameter(&parameter, &mut aggregate);

        assert!(matches!(result, Err(Error::Structure(_))));
    }

    #[test]
    fn test_include_requires_reference() {
        let mut aggregate = Aggregate::new();
        let include = Element::new("Include").with_attribute("Namespace", "qux");
        assert!(matches!(
            process_include(&include, &mut aggregate),
            Err(Error::Structure(_))
        ));
    }

    #[test]
    fn test_property_nullable_and_default_value() {
        let mut aggregate = schema_aggregate();
        process_complex_type(&Element::new("ComplexType").with_attribute("Name", "Worker"), &mut aggregate)
            .unwrap();
        let property = Element::new("Property")
            .with_attribute("Name", "Status")
            .with_attribute("Type", "f.Status")
            .with_attribute("Nullable", "false")
            .with_attribute("DefaultValue", "Active");

        process_property(&property, &mut aggregate).unwrap();

        assert_eq!(
            aggregate.result()["foo.Worker"]["Status"],
            json!({
                "$kind": "Property",
                "$Type": "foo.Status",
                "$Nullable": false,
                "$DefaultValue": "Active"
            })
        );
    }
}
