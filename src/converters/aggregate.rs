//! Conversion state
//!
//! The [`Aggregate`] is created per conversion and threaded through every
//! handler. It owns the result document and remembers which definition the
//! enclosing element created, by key, so nested handlers can extend it.

use serde_json::{Map, Value as JsonValue};

use crate::error::{Error, Result};
use crate::names::{self, AliasMap, TypeReference};

/// JSON object type of the result document
pub type JsonObject = Map<String, JsonValue>;

/// Key of the default entity container's qualified name in the result
pub const ENTITY_CONTAINER_KEY: &str = "$EntityContainer";

/// Mutable state of one conversion
#[derive(Debug, Default)]
pub struct Aggregate {
    /// Alias to namespace mapping, filled from `Schema` and `Include`
    pub aliases: AliasMap,
    current_schema: Option<String>,
    current_container: Option<String>,
    current_reference: Option<String>,
    current_type: Option<String>,
    current_property: Option<String>,
    current_container_child: Option<String>,
    current_operation: Option<String>,
    enum_underlying_type: String,
    enum_member_counter: i64,
    result: JsonObject,
}

impl Aggregate {
    /// Create an empty aggregate
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `alias` for `namespace`
    pub fn add_alias(&mut self, alias: &str, namespace: &str) {
        self.aliases.insert(alias.to_string(), namespace.to_string());
    }

    /// Resolve an alias-qualified name
    pub fn resolve_alias(&self, name: &str) -> String {
        names::resolve_alias(name, &self.aliases)
    }

    /// Resolve a container path relative to the current entity container
    pub fn resolve_target(&self, target: &str) -> String {
        names::resolve_target(target, &self.aliases, self.current_container.as_deref())
    }

    /// Parse a `Type` attribute
    pub fn type_reference(&self, type_name: &str) -> TypeReference {
        names::parse_type_reference(type_name, &self.aliases)
    }

    /// Start processing the schema with the given namespace
    pub fn set_schema(&mut self, namespace: &str) {
        self.current_schema = Some(namespace.to_string());
    }

    /// Namespace of the schema being processed
    pub fn current_schema(&self) -> Option<&str> {
        self.current_schema.as_deref()
    }

    /// Qualify a schema child's name with the current namespace
    pub fn qualified_name(&self, name: &str) -> Result<String> {
        let namespace = self
            .current_schema
            .as_deref()
            .ok_or_else(|| Error::Structure(format!("'{}' declared outside of a Schema", name)))?;
        Ok(names::qualified_name(namespace, name))
    }

    /// Start a referenced document with the given URI
    pub fn set_reference(&mut self, uri: &str) {
        self.current_reference = Some(uri.to_string());
    }

    /// URI of the reference being processed
    pub fn current_reference(&self) -> Result<&str> {
        self.current_reference
            .as_deref()
            .ok_or_else(|| Error::Structure("Include outside of a Reference".to_string()))
    }

    /// Add a top-level entry for an included namespace
    pub fn add_reference(&mut self, namespace: &str, reference: JsonObject) -> Result<()> {
        self.claim(namespace, "included namespace")?;
        self.result
            .insert(namespace.to_string(), JsonValue::Object(reference));
        Ok(())
    }

    /// Fail when a top-level entry already uses `qualified_name`
    fn claim(&self, qualified_name: &str, what: &str) -> Result<()> {
        if self.result.contains_key(qualified_name) {
            return Err(Error::Structure(format!(
                "{} '{}' collides with an earlier definition",
                what, qualified_name
            )));
        }
        Ok(())
    }

    /// Add a type definition and make it the current type
    pub fn add_type(&mut self, qualified_name: String, definition: JsonObject) -> Result<()> {
        self.claim(&qualified_name, "type")?;
        self.result
            .insert(qualified_name.clone(), JsonValue::Object(definition));
        self.current_type = Some(qualified_name);
        self.current_property = None;
        Ok(())
    }

    /// The type definition being populated
    pub fn current_type_mut(&mut self) -> Result<&mut JsonObject> {
        let key = self
            .current_type
            .as_deref()
            .ok_or_else(|| Error::Structure("no enclosing type".to_string()))?;
        object_mut(&mut self.result, key)
    }

    /// Add a property to the current type and make it the current property
    pub fn add_property(&mut self, name: &str, definition: JsonObject) -> Result<()> {
        self.current_type_mut()?
            .insert(name.to_string(), JsonValue::Object(definition));
        self.current_property = Some(name.to_string());
        Ok(())
    }

    /// The property of the current type being populated
    pub fn current_property_mut(&mut self) -> Result<&mut JsonObject> {
        let name = self
            .current_property
            .clone()
            .ok_or_else(|| Error::Structure("no enclosing property".to_string()))?;
        object_mut(self.current_type_mut()?, &name)
    }

    /// Start an enum type with the given underlying type
    pub fn start_enum(&mut self, underlying_type: &str) {
        self.enum_underlying_type = underlying_type.to_string();
        self.enum_member_counter = 0;
    }

    /// Underlying type of the enum type being populated
    pub fn enum_underlying_type(&self) -> &str {
        &self.enum_underlying_type
    }

    /// Value of the next enum member without an explicit `Value`
    pub fn enum_member_counter(&self) -> i64 {
        self.enum_member_counter
    }

    /// Record the value of the enum member just added
    pub fn set_enum_member_value(&mut self, value: i64) {
        self.enum_member_counter = value.saturating_add(1);
    }

    /// Add an entity container and designate it as the default container
    pub fn add_container(&mut self, qualified_name: String, definition: JsonObject) -> Result<()> {
        self.claim(&qualified_name, "entity container")?;
        self.result.insert(
            ENTITY_CONTAINER_KEY.to_string(),
            JsonValue::String(qualified_name.clone()),
        );
        self.result
            .insert(qualified_name.clone(), JsonValue::Object(definition));
        self.current_container = Some(qualified_name);
        self.current_container_child = None;
        Ok(())
    }

    /// Qualified name of the entity container being populated
    pub fn current_container(&self) -> Option<&str> {
        self.current_container.as_deref()
    }

    /// The entity container being populated
    pub fn current_container_mut(&mut self) -> Result<&mut JsonObject> {
        let key = self
            .current_container
            .as_deref()
            .ok_or_else(|| Error::Structure("no enclosing EntityContainer".to_string()))?;
        object_mut(&mut self.result, key)
    }

    /// Add a child (entity set, singleton, import) to the current container
    pub fn add_container_child(&mut self, name: &str, definition: JsonObject) -> Result<()> {
        self.current_container_mut()?
            .insert(name.to_string(), JsonValue::Object(definition));
        self.current_container_child = Some(name.to_string());
        Ok(())
    }

    /// The entity set or singleton being populated
    pub fn current_container_child_mut(&mut self) -> Result<&mut JsonObject> {
        let name = self
            .current_container_child
            .clone()
            .ok_or_else(|| Error::Structure("no enclosing EntitySet or Singleton".to_string()))?;
        object_mut(self.current_container_mut()?, &name)
    }

    /// Append an overload to the operation with the given qualified name
    pub fn add_overload(&mut self, qualified_name: String, overload: JsonObject) -> Result<()> {
        let overloads = self
            .result
            .entry(qualified_name.clone())
            .or_insert_with(|| JsonValue::Array(Vec::new()));

        match overloads {
            JsonValue::Array(overloads) => overloads.push(JsonValue::Object(overload)),
            _ => {
                return Err(Error::Structure(format!(
                    "operation '{}' collides with a non-operation definition",
                    qualified_name
                )))
            }
        }

        self.current_operation = Some(qualified_name);
        Ok(())
    }

    /// The most recently added overload of the current operation
    pub fn current_overload_mut(&mut self) -> Result<&mut JsonObject> {
        let key = self
            .current_operation
            .as_deref()
            .ok_or_else(|| Error::Structure("no enclosing Action or Function".to_string()))?;

        self.result
            .get_mut(key)
            .and_then(JsonValue::as_array_mut)
            .and_then(|overloads| overloads.last_mut())
            .and_then(JsonValue::as_object_mut)
            .ok_or_else(|| Error::Structure(format!("no overload of '{}'", key)))
    }

    /// The result document built so far
    pub fn result(&self) -> &JsonObject {
        &self.result
    }

    /// Finish the conversion, returning the result document
    pub fn into_result(self) -> JsonObject {
        self.result
    }
}

fn object_mut<'a>(map: &'a mut JsonObject, key: &str) -> Result<&'a mut JsonObject> {
    map.get_mut(key)
        .and_then(JsonValue::as_object_mut)
        .ok_or_else(|| Error::Structure(format!("'{}' is not a definition", key)))
}
