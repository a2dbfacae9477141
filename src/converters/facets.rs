//! Facet and attribute value coercion
//!
//! CSDL/XML carries every value as an attribute string; the JSON form uses
//! numbers and booleans and leaves out values equal to their EDM default.

use serde_json::{Map, Value as JsonValue};
use tracing::warn;

use crate::documents::AttributeMap;

/// Facet attributes copied by [`process_facet_attributes`]
pub const FACET_ATTRIBUTES: [&str; 5] = ["Precision", "Scale", "Unicode", "MaxLength", "SRID"];

/// Underlying type of an enum type without `UnderlyingType`
pub const DEFAULT_UNDERLYING_TYPE: &str = "Edm.Int32";

/// Largest magnitude a consumer with double precision numbers represents exactly
pub const MAX_SAFE_INTEGER: u64 = (1 << 53) - 1;

/// Copy the facet attributes into `target` as `$`-prefixed, typed keys
///
/// `Precision` and `MaxLength` become integers, `Scale` becomes an integer
/// unless it is `variable`, `SRID` stays a string and `Unicode` is only
/// written when it is `false`. Absent facets write nothing.
pub fn process_facet_attributes(attributes: &AttributeMap, target: &mut Map<String, JsonValue>) {
    for facet in FACET_ATTRIBUTES {
        let Some(value) = attributes.get(facet) else {
            continue;
        };

        let coerced = match facet {
            "Precision" => parse_integer(facet, value),
            "Scale" if value == "variable" => JsonValue::String(value.clone()),
            "Scale" => parse_integer(facet, value),
            "MaxLength" if value == "max" => JsonValue::String(value.clone()),
            "MaxLength" => parse_integer(facet, value),
            "Unicode" => match parse_boolean(value) {
                Some(true) => continue,
                Some(false) => JsonValue::Bool(false),
                None => {
                    warn!(facet, value = value.as_str(), "ignoring non-boolean facet value");
                    continue;
                }
            },
            _ => JsonValue::String(value.clone()),
        };

        target.insert(format!("${}", facet), coerced);
    }
}

/// Write `$name` for a boolean attribute whose value differs from `default`
///
/// Missing attributes and values equal to the EDM default write nothing.
pub fn set_flag(
    target: &mut Map<String, JsonValue>,
    attributes: &AttributeMap,
    name: &str,
    default: bool,
) {
    let Some(value) = attributes.get(name) else {
        return;
    };

    match parse_boolean(value) {
        Some(flag) if flag != default => {
            target.insert(format!("${}", name), JsonValue::Bool(flag));
        }
        Some(_) => {}
        None => warn!(attribute = name, value = value.as_str(), "ignoring non-boolean value"),
    }
}

/// Write `$name` with the attribute's string value, if present
pub fn set_string(target: &mut Map<String, JsonValue>, attributes: &AttributeMap, name: &str) {
    if let Some(value) = attributes.get(name) {
        target.insert(format!("${}", name), JsonValue::String(value.clone()));
    }
}

/// Parse an `xs:boolean` lexical value
pub fn parse_boolean(value: &str) -> Option<bool> {
    match value {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Parse an integer facet; non-numeric input becomes `null`
fn parse_integer(facet: &str, value: &str) -> JsonValue {
    match value.trim().parse::<i64>() {
        Ok(n) => JsonValue::from(n),
        Err(_) => {
            warn!(facet, value, "non-numeric facet value");
            JsonValue::Null
        }
    }
}

/// Encode an enum member value for the enum's underlying type
///
/// `Edm.Int64` values beyond [`MAX_SAFE_INTEGER`] are written as decimal
/// strings so they survive consumers with double precision numbers.
pub fn enum_member_value(value: i64, underlying_type: &str) -> JsonValue {
    if underlying_type == "Edm.Int64" && value.unsigned_abs() > MAX_SAFE_INTEGER {
        JsonValue::String(value.to_string())
    } else {
        JsonValue::from(value)
    }
}
