//! Support agent entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::domain::schema::{FieldDefault, FieldKind, FieldSpec, Schema, ValidationError};
use crate::domain::value_objects::RecordId;

/// Person who can be assigned ownership of tickets
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    #[serde(rename = "_id")]
    #[schema(value_type = String)]
    pub id: RecordId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub description: String,
    pub active: bool,
    pub date_created: DateTime<Utc>,
}

impl Agent {
    pub const SCHEMA: Schema = Schema {
        model: "SupportAgent",
        fields: &[
            FieldSpec::required("name", FieldKind::Text),
            FieldSpec::required("email", FieldKind::Text).unique(),
            FieldSpec::required("phone", FieldKind::Text),
            FieldSpec::required("description", FieldKind::Text),
            FieldSpec::optional("active", FieldKind::Boolean, FieldDefault::Bool(true)),
            FieldSpec::optional("dateCreated", FieldKind::Timestamp, FieldDefault::Now),
        ],
    };

    /// Build a new agent from a request body, assigning a fresh id
    pub fn from_body(body: &Value) -> Result<Self, ValidationError> {
        let mut doc = Self::SCHEMA.validate(body)?;

        Ok(Self {
            id: RecordId::new(),
            name: doc.take_text("name").unwrap_or_default(),
            email: doc.take_text("email").unwrap_or_default(),
            phone: doc.take_text("phone").unwrap_or_default(),
            description: doc.take_text("description").unwrap_or_default(),
            active: doc.take_bool("active").unwrap_or(true),
            date_created: doc.take_timestamp("dateCreated").unwrap_or_else(Utc::now),
        })
    }
}
