//! Checks candidate values against a signal definition and normalizes them.
//!
//! `validate` is a pure function of the node and the raw JSON value, so it can
//! be called from any number of threads against a shared index. Values may
//! arrive typed (`123.4`, `true`, `[1, 2]`) or textual (`"123.4"`, `"true"`,
//! `"[1, 2]"`); both forms normalize to the same `SignalValue`.

use crate::catalog::{Constraint, Node, NodeBody, ScalarType, SignalSpec};
use crate::error::ValidationError;
use serde::Serialize;
use serde_json::{Number, Value};

/// A value in the canonical in-memory representation of its datatype.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SignalValue {
    Bool(bool),
    String(String),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    Array(Vec<SignalValue>),
}

impl SignalValue {
    /// Plain JSON form, as a producer would have sent it.
    pub fn to_json(&self) -> Value {
        match self {
            SignalValue::Bool(flag) => Value::Bool(*flag),
            SignalValue::String(text) => Value::String(text.clone()),
            SignalValue::I8(v) => Value::from(*v),
            SignalValue::U8(v) => Value::from(*v),
            SignalValue::I16(v) => Value::from(*v),
            SignalValue::U16(v) => Value::from(*v),
            SignalValue::I32(v) => Value::from(*v),
            SignalValue::U32(v) => Value::from(*v),
            SignalValue::I64(v) => Value::from(*v),
            SignalValue::U64(v) => Value::from(*v),
            // Widen through the shortest decimal form so 123.4f32 stays 123.4.
            SignalValue::F32(v) => v
                .to_string()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map_or(Value::Null, Value::Number),
            SignalValue::F64(v) => Number::from_f64(*v).map_or(Value::Null, Value::Number),
            SignalValue::Array(items) => Value::Array(items.iter().map(Self::to_json).collect()),
        }
    }
}

/// Validate `raw` against `node` and return it in canonical form.
pub fn validate(node: &Node, raw: &Value) -> Result<SignalValue, ValidationError> {
    let spec = match node.body() {
        NodeBody::Signal(spec) => spec,
        NodeBody::Branch { .. } => {
            return Err(ValidationError::WrongKind {
                name: node.name().to_string(),
            });
        }
    };

    if !spec.datatype.array {
        return check_scalar(spec, raw);
    }

    let parsed;
    let elements = match raw {
        Value::Array(items) => items,
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Array(items)) => {
                parsed = items;
                &parsed
            }
            _ => return Err(mismatch(spec.datatype.to_string(), raw)),
        },
        other => return Err(mismatch(spec.datatype.to_string(), other)),
    };

    elements
        .iter()
        .enumerate()
        .map(|(index, element)| {
            check_scalar(spec, element).map_err(|err| ValidationError::Element {
                index,
                source: Box::new(err),
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(SignalValue::Array)
}

/// Validate a textual value, e.g. one read from a command line or a CSV cell.
pub fn validate_text(node: &Node, text: &str) -> Result<SignalValue, ValidationError> {
    validate(node, &Value::String(text.to_string()))
}

fn check_scalar(spec: &SignalSpec, raw: &Value) -> Result<SignalValue, ValidationError> {
    let scalar = spec.datatype.scalar;
    match scalar {
        ScalarType::Boolean => match raw {
            Value::Bool(flag) => Ok(SignalValue::Bool(*flag)),
            Value::String(text) if text == "true" => Ok(SignalValue::Bool(true)),
            Value::String(text) if text == "false" => Ok(SignalValue::Bool(false)),
            other => Err(mismatch(scalar.as_str(), other)),
        },
        ScalarType::String => {
            let Value::String(text) = raw else {
                return Err(mismatch(scalar.as_str(), raw));
            };
            check_allowed(&spec.constraint, text)?;
            Ok(SignalValue::String(text.clone()))
        }
        ScalarType::Float | ScalarType::Double => {
            let number = float_of(raw)
                .filter(|number| number.is_finite())
                .ok_or_else(|| mismatch(scalar.as_str(), raw))?;
            // Bounds apply to the value as received; narrowing to f32 first
            // could push an in-bounds value just past an inclusive bound.
            check_range(&spec.constraint, number)?;
            if scalar == ScalarType::Double {
                Ok(SignalValue::F64(number))
            } else if number.abs() > f64::from(f32::MAX) {
                Err(mismatch("float within f32 range", raw))
            } else {
                Ok(SignalValue::F32(number as f32))
            }
        }
        _ => {
            let expected = || match scalar.integer_range() {
                Some((lo, hi)) => format!("{} in {lo}..={hi}", scalar.as_str()),
                None => scalar.as_str().to_string(),
            };
            let number = integer_of(raw).ok_or_else(|| mismatch(expected(), raw))?;
            check_range(&spec.constraint, number as f64)?;
            narrow_integer(scalar, number).ok_or_else(|| mismatch(expected(), raw))
        }
    }
}

fn check_range(constraint: &Constraint, number: f64) -> Result<(), ValidationError> {
    let Constraint::Range { min, max } = constraint else {
        return Ok(());
    };
    let below = min.is_some_and(|min| number < min);
    let above = max.is_some_and(|max| number > max);
    if below || above {
        return Err(ValidationError::Range {
            value: number,
            min: *min,
            max: *max,
        });
    }
    Ok(())
}

fn check_allowed(constraint: &Constraint, text: &str) -> Result<(), ValidationError> {
    match constraint {
        Constraint::Allowed(allowed) if !allowed.iter().any(|candidate| candidate == text) => {
            Err(ValidationError::NotAllowed {
                value: text.to_string(),
                allowed: allowed.clone(),
            })
        }
        _ => Ok(()),
    }
}

fn narrow_integer(scalar: ScalarType, number: i128) -> Option<SignalValue> {
    let value = match scalar {
        ScalarType::Int8 => SignalValue::I8(i8::try_from(number).ok()?),
        ScalarType::UInt8 => SignalValue::U8(u8::try_from(number).ok()?),
        ScalarType::Int16 => SignalValue::I16(i16::try_from(number).ok()?),
        ScalarType::UInt16 => SignalValue::U16(u16::try_from(number).ok()?),
        ScalarType::Int32 => SignalValue::I32(i32::try_from(number).ok()?),
        ScalarType::UInt32 => SignalValue::U32(u32::try_from(number).ok()?),
        ScalarType::Int64 => SignalValue::I64(i64::try_from(number).ok()?),
        ScalarType::UInt64 => SignalValue::U64(u64::try_from(number).ok()?),
        _ => return None,
    };
    Some(value)
}

fn float_of(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Integral value of `raw`; `3.0` counts, `3.5` does not.
fn integer_of(raw: &Value) -> Option<i128> {
    match raw {
        Value::Number(number) => number
            .as_i64()
            .map(i128::from)
            .or_else(|| number.as_u64().map(i128::from))
            .or_else(|| number.as_f64().and_then(integral)),
        Value::String(text) => {
            let text = text.trim();
            text.parse::<i128>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().and_then(integral))
        }
        _ => None,
    }
}

// `3.0` and `1e2` count as integers; `3.5` does not.
fn integral(f: f64) -> Option<i128> {
    (f.is_finite() && f.fract() == 0.0 && f.abs() < 1e30).then_some(f as i128)
}

fn mismatch(expected: impl Into<String>, raw: &Value) -> ValidationError {
    ValidationError::TypeMismatch {
        expected: expected.into(),
        found: describe(raw),
    }
}

fn describe(raw: &Value) -> String {
    match raw {
        Value::Null => "null".to_string(),
        Value::Bool(flag) => format!("boolean {flag}"),
        Value::Number(number) => format!("number {number}"),
        Value::String(text) => format!("string {text:?}"),
        Value::Array(items) => format!("array of {}", items.len()),
        Value::Object(_) => "object".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{LoadOptions, load_catalog_from_value};
    use serde_json::json;

    fn leaf(datatype: &str, extra: Value) -> crate::catalog::Catalog {
        let mut node = json!({
            "type": "sensor",
            "datatype": datatype,
            "uuid": "000000000000000000000000000000ff",
        });
        if let (Some(target), Value::Object(fields)) = (node.as_object_mut(), extra) {
            target.extend(fields);
        }
        let doc = json!({
            "Vehicle": {
                "type": "branch",
                "uuid": "00000000000000000000000000000001",
                "children": { "Signal": node }
            }
        });
        load_catalog_from_value(doc, &LoadOptions::default()).unwrap()
    }

    fn signal(catalog: &crate::catalog::Catalog) -> &Node {
        catalog
            .nodes()
            .find(|node| node.name() == "Signal")
            .unwrap()
    }

    #[test]
    fn booleans_accept_only_canonical_forms() {
        let catalog = leaf("boolean", json!({}));
        let node = signal(&catalog);
        assert_eq!(validate(node, &json!(true)), Ok(SignalValue::Bool(true)));
        assert_eq!(validate_text(node, "false"), Ok(SignalValue::Bool(false)));
        for bad in [json!("TRUE"), json!(1), json!("yes"), json!(null)] {
            assert!(matches!(
                validate(node, &bad),
                Err(ValidationError::TypeMismatch { .. })
            ));
        }
    }

    #[test]
    fn integers_respect_bit_width() {
        let catalog = leaf("int8", json!({}));
        let node = signal(&catalog);
        assert_eq!(validate(node, &json!(-128)), Ok(SignalValue::I8(-128)));
        assert_eq!(validate_text(node, " 127 "), Ok(SignalValue::I8(127)));
        assert_eq!(validate(node, &json!(4.0)), Ok(SignalValue::I8(4)));
        for (typed, text) in [(json!(3.0), "3.0"), (json!(1e2), "1e2")] {
            assert_eq!(validate(node, &typed), validate_text(node, text));
        }
        assert_eq!(validate_text(node, "1e2"), Ok(SignalValue::I8(100)));
        let rejected = [
            json!(128),
            json!(-129),
            json!(1.5),
            json!("12a"),
            json!("1.5"),
            json!("1e3"),
        ];
        for bad in rejected {
            assert!(matches!(
                validate(node, &bad),
                Err(ValidationError::TypeMismatch { .. })
            ));
        }

        let catalog = leaf("uint64", json!({}));
        let node = signal(&catalog);
        assert_eq!(
            validate(node, &json!(u64::MAX)),
            Ok(SignalValue::U64(u64::MAX))
        );
        assert!(validate(node, &json!(-1)).is_err());
    }

    #[test]
    fn floats_reject_non_finite_and_overflow() {
        let catalog = leaf("float", json!({}));
        let node = signal(&catalog);
        assert_eq!(validate_text(node, "1.5"), Ok(SignalValue::F32(1.5)));
        assert!(validate_text(node, "NaN").is_err());
        assert!(validate_text(node, "inf").is_err());
        assert!(validate(node, &json!(1e39)).is_err());

        let catalog = leaf("double", json!({}));
        let node = signal(&catalog);
        assert_eq!(validate(node, &json!(1e39)), Ok(SignalValue::F64(1e39)));
    }

    #[test]
    fn declared_bounds_win_over_bit_width() {
        let catalog = leaf("uint16", json!({"min": 0, "max": 1000}));
        let node = signal(&catalog);
        assert!(matches!(
            validate(node, &json!(-1)),
            Err(ValidationError::Range { .. })
        ));
        assert!(matches!(
            validate(node, &json!(70000)),
            Err(ValidationError::Range { .. })
        ));
    }

    #[test]
    fn range_is_checked_before_narrowing() {
        let catalog = leaf("float", json!({"min": 0.1, "max": 0.3}));
        let node = signal(&catalog);
        assert!(validate(node, &json!(0.1)).is_ok());
        assert!(validate(node, &json!(0.3)).is_ok());
        assert!(matches!(
            validate(node, &json!(0.30001)),
            Err(ValidationError::Range { .. })
        ));
    }

    #[test]
    fn arrays_check_every_element() {
        let catalog = leaf("uint8[]", json!({"max": 10}));
        let node = signal(&catalog);
        assert_eq!(validate(node, &json!([])), Ok(SignalValue::Array(vec![])));
        assert_eq!(
            validate_text(node, "[1, 2]"),
            Ok(SignalValue::Array(vec![SignalValue::U8(1), SignalValue::U8(2)]))
        );

        let err = validate(node, &json!([1, 11, 2])).unwrap_err();
        assert!(matches!(err, ValidationError::Element { index: 1, .. }));
        assert!(matches!(err.root_cause(), ValidationError::Range { .. }));

        assert!(matches!(
            validate(node, &json!(3)),
            Err(ValidationError::TypeMismatch { .. })
        ));
        assert!(matches!(
            validate_text(node, "3"),
            Err(ValidationError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn string_arrays_check_membership() {
        let catalog = leaf("string[]", json!({"allowed": ["A", "B"]}));
        let node = signal(&catalog);
        assert!(validate(node, &json!(["A", "B", "A"])).is_ok());
        let err = validate(node, &json!(["A", "c"])).unwrap_err();
        assert!(matches!(
            err.root_cause(),
            ValidationError::NotAllowed { value, .. } if value == "c"
        ));
    }

    #[test]
    fn strings_are_not_coerced() {
        let catalog = leaf("string", json!({}));
        let node = signal(&catalog);
        assert_eq!(
            validate(node, &json!("  padded ")),
            Ok(SignalValue::String("  padded ".to_string()))
        );
        assert!(validate(node, &json!(5)).is_err());
    }

    #[test]
    fn normalized_values_serialize_as_plain_json() {
        let value = SignalValue::Array(vec![SignalValue::F32(123.4), SignalValue::Bool(true)]);
        assert_eq!(value.to_json(), json!([123.4, true]));
    }
}
