//! Structural pre-check of raw catalog documents against the embedded
//! JSON Schema (`schema/vss_catalog.schema.json`).
//!
//! The schema only covers per-field types; the loader owns every rule that
//! spans fields or nodes. Running it first turns type errors deep inside the
//! tree into messages carrying a JSON pointer instead of a bare serde error.

use crate::error::MalformedCatalogError;
use jsonschema::JSONSchema;
use serde_json::Value;
use std::sync::OnceLock;

const CATALOG_SCHEMA: &str = include_str!("../schema/vss_catalog.schema.json");

/// The parsed catalog schema; parsed once per process.
pub fn catalog_schema() -> Result<&'static Value, MalformedCatalogError> {
    static SCHEMA: OnceLock<Result<Value, String>> = OnceLock::new();
    SCHEMA
        .get_or_init(|| serde_json::from_str(CATALOG_SCHEMA).map_err(|err| err.to_string()))
        .as_ref()
        .map_err(|err| MalformedCatalogError::Schema {
            details: vec![format!("embedded catalog schema is invalid JSON: {err}")],
        })
}

fn compiled_schema() -> Result<&'static JSONSchema, MalformedCatalogError> {
    static COMPILED: OnceLock<Result<JSONSchema, String>> = OnceLock::new();
    let schema = catalog_schema()?;
    COMPILED
        .get_or_init(|| {
            JSONSchema::compile(schema)
                .map_err(|err| format!("compiling embedded catalog schema: {err}"))
        })
        .as_ref()
        .map_err(|err| MalformedCatalogError::Schema {
            details: vec![err.clone()],
        })
}

/// Validate `catalog` and report every violation with its JSON pointer.
pub(crate) fn validate_against_schema(catalog: &Value) -> Result<(), MalformedCatalogError> {
    let compiled = compiled_schema()?;
    if let Err(errors) = compiled.validate(catalog) {
        let details = errors
            .map(|err| format!("{}: {}", err.instance_path, err))
            .collect::<Vec<_>>();
        return Err(MalformedCatalogError::Schema { details });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn embedded_schema_parses() {
        let schema = catalog_schema().unwrap();
        assert_eq!(
            schema.pointer("/definitions/node/properties/type/enum/0"),
            Some(&json!("branch"))
        );
    }

    #[test]
    fn compiled_schema_is_built_once() {
        let first = compiled_schema().unwrap();
        let second = compiled_schema().unwrap();
        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn nested_type_errors_carry_pointer() {
        let catalog = json!({
            "Vehicle": {
                "type": "branch",
                "uuid": "00000000000000000000000000000001",
                "children": {
                    "Speed": {
                        "type": "sensor",
                        "datatype": "float",
                        "min": "zero",
                        "uuid": "00000000000000000000000000000002"
                    }
                }
            }
        });
        let err = validate_against_schema(&catalog).unwrap_err();
        let MalformedCatalogError::Schema { details } = err else {
            panic!("expected schema error, got {err:?}");
        };
        assert_eq!(details.len(), 1);
        assert!(
            details[0].starts_with("/Vehicle/children/Speed/min"),
            "unexpected detail: {}",
            details[0]
        );
    }

    #[test]
    fn accepts_unknown_extra_fields() {
        let catalog = json!({
            "Vehicle": {
                "type": "branch",
                "uuid": "00000000000000000000000000000001",
                "$file_name$": "spec/VehicleSignalSpecification.vspec",
                "children": {}
            }
        });
        validate_against_schema(&catalog).unwrap();
    }
}
