//! Explicit validation tables for environment and runtime variables.
//!
//! Each function declares the fields it needs as a `&[Field]` table. The
//! table is checked against the raw JSON before anything is deserialized, so a
//! bad configuration bundle is rejected before any data is touched.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::error::ValidationError;

pub const RUNTIME_VARIABLES: &str = "RuntimeVariables";

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum FieldKind {
    /// non-blank string
    Text,
    /// string, may be empty
    AnyText,
    /// string or number
    Scalar,
    Object,
    Array,
}

impl FieldKind {
    fn expected(self) -> &'static str {
        match self {
            FieldKind::Text | FieldKind::AnyText => "a string",
            FieldKind::Scalar => "a string or a number",
            FieldKind::Object => "an object",
            FieldKind::Array => "an array",
        }
    }

    fn admits(self, value: &Value) -> bool {
        match self {
            FieldKind::Text | FieldKind::AnyText => value.is_string(),
            FieldKind::Scalar => value.is_string() || value.is_number(),
            FieldKind::Object => value.is_object(),
            FieldKind::Array => value.is_array(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl Field {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Field { name, kind }
    }
}

fn qualified(scope: Option<&str>, name: &str) -> String {
    match scope {
        Some(scope) => format!("{}.{}", scope, name),
        None => name.to_string(),
    }
}

/// Check that every field in `fields` is present in `object` with the
/// declared kind. Unknown fields are ignored.
pub fn validate(
    object: &Map<String, Value>,
    scope: Option<&str>,
    fields: &[Field],
) -> Result<(), ValidationError> {
    for field in fields {
        let value = object
            .get(field.name)
            .filter(|v| !v.is_null())
            .ok_or_else(|| ValidationError::MissingField(qualified(scope, field.name)))?;

        if !field.kind.admits(value) {
            return Err(ValidationError::WrongType {
                field: qualified(scope, field.name),
                expected: field.kind.expected(),
            });
        }

        if field.kind == FieldKind::Text && value.as_str().is_some_and(|s| s.trim().is_empty()) {
            return Err(ValidationError::Blank(qualified(scope, field.name)));
        }
    }
    Ok(())
}

/// Deserialize a single field, naming it in the error when its contents do
/// not have the expected shape.
pub fn extract<T: DeserializeOwned>(
    object: &Map<String, Value>,
    scope: Option<&str>,
    name: &str,
) -> Result<T, ValidationError> {
    let value = object
        .get(name)
        .ok_or_else(|| ValidationError::MissingField(qualified(scope, name)))?;
    T::deserialize(value).map_err(|e| ValidationError::InvalidValue {
        field: qualified(scope, name),
        reason: e.to_string(),
    })
}

/// Render a scalar field as text. Numbers are formatted without quotes.
pub fn text(object: &Map<String, Value>, scope: Option<&str>, name: &str) -> Result<String, ValidationError> {
    match object.get(name) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(_) => Err(ValidationError::WrongType {
            field: qualified(scope, name),
            expected: FieldKind::Scalar.expected(),
        }),
        None => Err(ValidationError::MissingField(qualified(scope, name))),
    }
}

pub fn nested<'a>(
    object: &'a Map<String, Value>,
    name: &str,
) -> Result<&'a Map<String, Value>, ValidationError> {
    match object.get(name) {
        Some(Value::Object(inner)) => Ok(inner),
        Some(_) => Err(ValidationError::WrongType {
            field: name.to_string(),
            expected: FieldKind::Object.expected(),
        }),
        None => Err(ValidationError::MissingField(name.to_string())),
    }
}

pub fn runtime_variables(event: &Value) -> Result<&Map<String, Value>, ValidationError> {
    match event.get(RUNTIME_VARIABLES) {
        Some(Value::Object(vars)) => Ok(vars),
        Some(_) => Err(ValidationError::WrongType {
            field: RUNTIME_VARIABLES.to_string(),
            expected: FieldKind::Object.expected(),
        }),
        None => Err(ValidationError::MissingField(RUNTIME_VARIABLES.to_string())),
    }
}

/// The correlation id of a run. Read before any validation so that even a
/// rejected request can be traced; falls back to `"0"`.
pub fn run_id(event: &Value) -> String {
    runtime_variables(event)
        .ok()
        .and_then(|vars| text(vars, None, "run_id").ok())
        .unwrap_or_else(|| "0".to_string())
}

/// Required environment variables, looked up once and checked for blanks.
#[derive(Debug, Default)]
pub struct Environment(HashMap<&'static str, String>);

impl Environment {
    pub fn load(
        names: &[&'static str],
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Environment, ValidationError> {
        let mut values = HashMap::with_capacity(names.len());
        for name in names {
            let value = lookup(name).ok_or_else(|| ValidationError::MissingField(name.to_string()))?;
            if value.trim().is_empty() {
                return Err(ValidationError::Blank(name.to_string()));
            }
            values.insert(*name, value);
        }
        Ok(Environment(values))
    }

    pub fn take(&mut self, name: &str) -> String {
        self.0.remove(name).unwrap_or_default()
    }
}

/// Accepts a JSON string or number and yields its text.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct TextVisitor;

    impl<'de> serde::de::Visitor<'de> for TextVisitor {
        type Value = String;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            f.write_str("a string or a number")
        }

        fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_string<E: serde::de::Error>(self, v: String) -> Result<String, E> {
            Ok(v)
        }

        fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<String, E> {
            Ok(v.to_string())
        }
    }

    deserializer.deserialize_any(TextVisitor)
}

/// Like [`string_or_number`], but a JSON null yields `None`.
pub fn optional_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct OptionalVisitor;

    impl<'de> serde::de::Visitor<'de> for OptionalVisitor {
        type Value = Option<String>;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            f.write_str("null, a string or a number")
        }

        fn visit_none<E: serde::de::Error>(self) -> Result<Option<String>, E> {
            Ok(None)
        }

        fn visit_unit<E: serde::de::Error>(self) -> Result<Option<String>, E> {
            Ok(None)
        }

        fn visit_some<D: serde::Deserializer<'de>>(self, d: D) -> Result<Option<String>, D::Error> {
            string_or_number(d).map(Some)
        }
    }

    deserializer.deserialize_option(OptionalVisitor)
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    const FIELDS: &[Field] = &[
        Field::new("period", FieldKind::Text),
        Field::new("labels", FieldKind::Object),
        Field::new("types", FieldKind::Array),
    ];

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_validate_accepts_complete_object() {
        let vars = object(json!({"period": "201809", "labels": {}, "types": [2], "extra": true}));
        assert!(validate(&vars, None, FIELDS).is_ok());
    }

    #[test]
    fn test_validate_reports_first_problem() {
        let vars = object(json!({"period": "201809", "types": [2]}));
        assert_eq!(
            validate(&vars, Some("ingestion_parameters"), FIELDS),
            Err(ValidationError::MissingField("ingestion_parameters.labels".to_string()))
        );

        let vars = object(json!({"period": 201809, "labels": {}, "types": []}));
        assert_eq!(
            validate(&vars, None, FIELDS),
            Err(ValidationError::WrongType {
                field: "period".to_string(),
                expected: "a string"
            })
        );

        let vars = object(json!({"period": "  ", "labels": {}, "types": []}));
        assert_eq!(
            validate(&vars, None, FIELDS),
            Err(ValidationError::Blank("period".to_string()))
        );

        let vars = object(json!({"period": "201809", "labels": null, "types": []}));
        assert!(matches!(
            validate(&vars, None, FIELDS),
            Err(ValidationError::MissingField(_))
        ));
    }

    #[test]
    fn test_extract_names_field() {
        let vars = object(json!({"statuses": {"Clear": "two"}}));
        let err = extract::<HashMap<String, i64>>(&vars, None, "statuses").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidValue { ref field, .. } if field == "statuses"));
    }

    #[test]
    fn test_run_id() {
        assert_eq!(run_id(&json!({"RuntimeVariables": {"run_id": "bob"}})), "bob");
        assert_eq!(run_id(&json!({"RuntimeVariables": {"run_id": 42}})), "42");
        assert_eq!(run_id(&json!({"RuntimeVariables": {}})), "0");
        assert_eq!(run_id(&json!({})), "0");
    }

    #[test]
    fn test_environment_load() {
        let vars: HashMap<&str, &str> =
            HashMap::from([("CHECKPOINT", "0"), ("METHOD_NAME", " ")]);
        let lookup = |k: &str| vars.get(k).map(|v| v.to_string());

        let mut env = Environment::load(&["CHECKPOINT"], lookup).unwrap();
        assert_eq!(env.take("CHECKPOINT"), "0");

        assert_eq!(
            Environment::load(&["CHECKPOINT", "METHOD_NAME"], lookup).unwrap_err(),
            ValidationError::Blank("METHOD_NAME".to_string())
        );
        assert_eq!(
            Environment::load(&["RESULTS_BUCKET_NAME"], lookup).unwrap_err(),
            ValidationError::MissingField("RESULTS_BUCKET_NAME".to_string())
        );
    }
}
