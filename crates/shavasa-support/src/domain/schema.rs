//! Declarative record schemas
//!
//! Every write goes through [`Schema::validate`], which casts a raw JSON body
//! into typed field values, applies defaults and collects every field failure
//! into a single [`ValidationError`].

use chrono::{DateTime, NaiveDate, SubsecRound, TimeZone, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::domain::value_objects::RecordId;

/// How a field value is cast
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Boolean,
    Timestamp,
    /// Identifier of a record in another model
    Reference(&'static str),
    /// Text restricted to the listed values
    OneOf(&'static [&'static str]),
}

impl FieldKind {
    fn cast_kind(&self) -> &'static str {
        match self {
            FieldKind::Text | FieldKind::OneOf(_) => "string",
            FieldKind::Boolean => "Boolean",
            FieldKind::Timestamp => "date",
            FieldKind::Reference(_) => "ObjectId",
        }
    }
}

/// Value applied when a field is absent or null
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldDefault {
    /// Leave the field unset
    Unset,
    Null,
    Bool(bool),
    /// Time of validation
    Now,
}

/// One field descriptor
#[derive(Clone, Copy, Debug)]
pub struct FieldSpec {
    pub path: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub unique: bool,
    pub default: FieldDefault,
}

impl FieldSpec {
    pub const fn required(path: &'static str, kind: FieldKind) -> Self {
        Self { path, kind, required: true, unique: false, default: FieldDefault::Unset }
    }

    pub const fn optional(path: &'static str, kind: FieldKind, default: FieldDefault) -> Self {
        Self { path, kind, required: false, unique: false, default }
    }

    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// Model name plus its ordered field descriptors
#[derive(Debug)]
pub struct Schema {
    pub model: &'static str,
    pub fields: &'static [FieldSpec],
}

/// A cast field value
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Null,
    Text(String),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
    Reference(RecordId),
}

/// Output of a successful validation, keyed by field path
#[derive(Debug, Default)]
pub struct ValidatedDocument {
    values: BTreeMap<&'static str, FieldValue>,
}

impl ValidatedDocument {
    pub fn take_text(&mut self, path: &str) -> Option<String> {
        match self.values.remove(path) {
            Some(FieldValue::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn take_bool(&mut self, path: &str) -> Option<bool> {
        match self.values.remove(path) {
            Some(FieldValue::Boolean(flag)) => Some(flag),
            _ => None,
        }
    }

    pub fn take_timestamp(&mut self, path: &str) -> Option<DateTime<Utc>> {
        match self.values.remove(path) {
            Some(FieldValue::Timestamp(at)) => Some(at),
            _ => None,
        }
    }

    pub fn take_reference(&mut self, path: &str) -> Option<RecordId> {
        match self.values.remove(path) {
            Some(FieldValue::Reference(id)) => Some(id),
            _ => None,
        }
    }

    pub fn get(&self, path: &str) -> Option<&FieldValue> {
        self.values.get(path)
    }
}

impl Schema {
    /// Paths carrying a uniqueness constraint
    pub fn unique_paths(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().filter(|field| field.unique).map(|field| field.path)
    }

    pub fn validate(&self, body: &Value) -> Result<ValidatedDocument, ValidationError> {
        self.validate_at(body, Utc::now())
    }

    /// Validate with an explicit clock for `Now` defaults.
    /// Timestamps are kept at millisecond precision, the resolution of the store.
    pub fn validate_at(&self, body: &Value, now: DateTime<Utc>) -> Result<ValidatedDocument, ValidationError> {
        let now = now.trunc_subsecs(3);
        let empty = serde_json::Map::new();
        let object = body.as_object().unwrap_or(&empty);

        let mut document = ValidatedDocument::default();
        let mut errors = Vec::new();

        for field in self.fields {
            let raw = object.get(field.path).filter(|value| !value.is_null());

            let Some(raw) = raw else {
                if field.required {
                    errors.push(FieldError::required(field.path));
                    continue;
                }
                let value = match field.default {
                    FieldDefault::Unset => continue,
                    FieldDefault::Null => FieldValue::Null,
                    FieldDefault::Bool(flag) => FieldValue::Boolean(flag),
                    FieldDefault::Now => FieldValue::Timestamp(now),
                };
                document.values.insert(field.path, value);
                continue;
            };

            match cast(field, raw) {
                Ok(FieldValue::Text(text)) if field.required && text.is_empty() => {
                    errors.push(FieldError::required(field.path));
                }
                Ok(value) => {
                    document.values.insert(field.path, value);
                }
                Err(error) => errors.push(error),
            }
        }

        if errors.is_empty() {
            Ok(document)
        } else {
            Err(ValidationError::new(self.model, errors))
        }
    }
}

fn cast(field: &FieldSpec, raw: &Value) -> Result<FieldValue, FieldError> {
    let failed = || FieldError::cast(field.path, field.kind.cast_kind(), raw);

    match field.kind {
        FieldKind::Text => cast_text(raw).map(FieldValue::Text).ok_or_else(failed),
        FieldKind::OneOf(allowed) => {
            let text = cast_text(raw).ok_or_else(failed)?;
            if allowed.contains(&text.as_str()) {
                Ok(FieldValue::Text(text))
            } else {
                Err(FieldError::not_in_enum(field.path, text))
            }
        }
        FieldKind::Boolean => cast_bool(raw).map(FieldValue::Boolean).ok_or_else(failed),
        FieldKind::Timestamp => cast_timestamp(raw).map(FieldValue::Timestamp).ok_or_else(failed),
        FieldKind::Reference(_) => raw
            .as_str()
            .and_then(RecordId::parse)
            .map(FieldValue::Reference)
            .ok_or_else(failed),
    }
}

fn cast_text(raw: &Value) -> Option<String> {
    match raw {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn cast_bool(raw: &Value) -> Option<bool> {
    match raw {
        Value::Bool(flag) => Some(*flag),
        Value::String(text) => match text.as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        },
        Value::Number(number) => match number.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn cast_timestamp(raw: &Value) -> Option<DateTime<Utc>> {
    let at = match raw {
        Value::String(text) => DateTime::parse_from_rfc3339(text)
            .map(|at| at.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(text, "%Y-%m-%d")
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
                    .map(|at| at.and_utc())
            }),
        Value::Number(number) => number
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        _ => None,
    };
    at.map(|at| at.trunc_subsecs(3))
}

fn js_type_name(raw: &Value) -> &'static str {
    match raw {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "Array",
        Value::Object(_) => "Object",
    }
}

/// Failure of a single field
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldError {
    pub name: &'static str,
    pub kind: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    pub message: String,
}

impl FieldError {
    fn required(path: &str) -> Self {
        Self {
            name: "ValidatorError",
            kind: "required".into(),
            path: path.into(),
            value: None,
            message: format!("Path `{path}` is required."),
        }
    }

    fn not_in_enum(path: &str, value: String) -> Self {
        Self {
            name: "ValidatorError",
            kind: "enum".into(),
            path: path.into(),
            message: format!("`{value}` is not a valid enum value for path `{path}`."),
            value: Some(Value::String(value)),
        }
    }

    fn cast(path: &str, kind: &str, raw: &Value) -> Self {
        let shown = match raw {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        Self {
            name: "CastError",
            kind: kind.into(),
            path: path.into(),
            value: Some(raw.clone()),
            message: format!(
                "Cast to {kind} failed for value \"{shown}\" (type {}) at path \"{path}\"",
                js_type_name(raw)
            ),
        }
    }
}

/// Every field failure of one validation run
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    pub model: &'static str,
    pub errors: Vec<FieldError>,
    pub message: String,
}

impl ValidationError {
    fn new(model: &'static str, errors: Vec<FieldError>) -> Self {
        let details = errors
            .iter()
            .map(|error| format!("{}: {}", error.path, error.message))
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            model,
            message: format!("{model} validation failed: {details}"),
            errors,
        }
    }

    pub fn field(&self, path: &str) -> Option<&FieldError> {
        self.errors.iter().find(|error| error.path == path)
    }
}

struct ErrorsByPath<'a>(&'a [FieldError]);

impl Serialize for ErrorsByPath<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for error in self.0 {
            map.serialize_entry(&error.path, error)?;
        }
        map.end()
    }
}

impl Serialize for ValidationError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(4))?;
        map.serialize_entry("errors", &ErrorsByPath(&self.errors))?;
        map.serialize_entry("_message", &format!("{} validation failed", self.model))?;
        map.serialize_entry("name", "ValidationError")?;
        map.serialize_entry("message", &self.message)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    static SAMPLE: Schema = Schema {
        model: "Sample",
        fields: &[
            FieldSpec::required("title", FieldKind::Text).unique(),
            FieldSpec::optional("enabled", FieldKind::Boolean, FieldDefault::Bool(true)),
            FieldSpec::optional("createdAt", FieldKind::Timestamp, FieldDefault::Now),
            FieldSpec::optional("owner", FieldKind::Reference("Owner"), FieldDefault::Null),
            FieldSpec::optional("state", FieldKind::OneOf(&["Open", "Closed"]), FieldDefault::Unset),
        ],
    };

    #[test]
    fn test_defaults_applied() {
        let now = Utc::now();
        let mut doc = SAMPLE.validate_at(&json!({ "title": "x" }), now).unwrap();

        assert_eq!(doc.take_text("title").as_deref(), Some("x"));
        assert_eq!(doc.take_bool("enabled"), Some(true));
        assert_eq!(doc.take_timestamp("createdAt"), Some(now.trunc_subsecs(3)));
        assert_eq!(doc.get("owner"), Some(&FieldValue::Null));
        assert!(doc.get("state").is_none());
    }

    #[test]
    fn test_missing_and_empty_required() {
        let err = SAMPLE.validate(&json!({})).unwrap_err();
        assert_eq!(err.field("title").unwrap().kind, "required");

        let err = SAMPLE.validate(&json!({ "title": "" })).unwrap_err();
        assert_eq!(err.field("title").unwrap().kind, "required");
        assert_eq!(err.message, "Sample validation failed: title: Path `title` is required.");
    }

    #[test]
    fn test_non_object_body_is_empty_document() {
        let err = SAMPLE.validate(&json!(["title"])).unwrap_err();
        assert!(err.field("title").is_some());
    }

    #[test]
    fn test_casts() {
        let mut doc = SAMPLE
            .validate(&json!({
                "title": 42,
                "enabled": "no",
                "createdAt": "2024-01-15T10:00:00Z",
                "owner": "65a1f0c2e4b0a1b2c3d4e5f6",
                "state": "Open",
            }))
            .unwrap();

        assert_eq!(doc.take_text("title").as_deref(), Some("42"));
        assert_eq!(doc.take_bool("enabled"), Some(false));
        assert_eq!(
            doc.take_timestamp("createdAt").unwrap().to_rfc3339(),
            "2024-01-15T10:00:00+00:00"
        );
        assert_eq!(
            doc.take_reference("owner").unwrap().to_hex(),
            "65a1f0c2e4b0a1b2c3d4e5f6"
        );
        assert_eq!(doc.take_text("state").as_deref(), Some("Open"));
    }

    #[test]
    fn test_collects_every_failure() {
        let err = SAMPLE
            .validate(&json!({
                "title": { "nested": true },
                "enabled": "maybe",
                "owner": "nope",
                "state": "Pending",
            }))
            .unwrap_err();

        assert_eq!(err.errors.len(), 4);
        assert_eq!(err.field("title").unwrap().name, "CastError");
        assert_eq!(err.field("enabled").unwrap().kind, "Boolean");
        assert_eq!(err.field("owner").unwrap().kind, "ObjectId");
        assert_eq!(err.field("state").unwrap().kind, "enum");
    }

    #[test]
    fn test_error_body_shape() {
        let err = SAMPLE.validate(&json!({ "enabled": true })).unwrap_err();
        let body = serde_json::to_value(&err).unwrap();

        assert_eq!(body["name"], "ValidationError");
        assert_eq!(body["_message"], "Sample validation failed");
        assert_eq!(body["errors"]["title"]["kind"], "required");
        assert_eq!(body["errors"]["title"]["path"], "title");
    }

    #[test]
    fn test_timestamps_truncated_to_millis() {
        let now = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
        let mut doc = SAMPLE.validate_at(&json!({ "title": "x" }), now).unwrap();
        assert_eq!(doc.take_timestamp("createdAt").unwrap().timestamp_subsec_nanos(), 123_000_000);

        let mut doc = SAMPLE
            .validate(&json!({ "title": "x", "createdAt": "2024-01-15T10:00:00.987654321Z" }))
            .unwrap();
        assert_eq!(doc.take_timestamp("createdAt").unwrap().timestamp_subsec_nanos(), 987_000_000);
    }

    #[test]
    fn test_unique_paths() {
        assert_eq!(SAMPLE.unique_paths().collect::<Vec<_>>(), vec!["title"]);
    }
}
