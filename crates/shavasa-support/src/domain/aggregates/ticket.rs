//! Support ticket entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

use crate::domain::aggregates::Agent;
use crate::domain::schema::{FieldDefault, FieldKind, FieldSpec, Schema, ValidationError};
use crate::domain::value_objects::RecordId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum TicketStatus {
    New,
    Assigned,
    Resolved,
}

impl TicketStatus {
    pub const ALL: &'static [&'static str] = &["New", "Assigned", "Resolved"];

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::New => "New",
            TicketStatus::Assigned => "Assigned",
            TicketStatus::Resolved => "Resolved",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "New" => Ok(TicketStatus::New),
            "Assigned" => Ok(TicketStatus::Assigned),
            "Resolved" => Ok(TicketStatus::Resolved),
            other => Err(format!("unknown ticket status: {other}")),
        }
    }
}

/// Unit of reported work
///
/// `severity` and `kind` are free text, only `status` is constrained.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    #[serde(rename = "_id")]
    #[schema(value_type = String)]
    pub id: RecordId,
    pub topic: String,
    pub description: String,
    pub date_created: DateTime<Utc>,
    pub severity: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[schema(value_type = Option<String>)]
    pub assigned_to: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TicketStatus>,
    pub resolved_on: Option<DateTime<Utc>>,
}

impl Ticket {
    pub const SCHEMA: Schema = Schema {
        model: "SupportTicket",
        fields: &[
            FieldSpec::required("topic", FieldKind::Text),
            FieldSpec::required("description", FieldKind::Text),
            FieldSpec::optional("dateCreated", FieldKind::Timestamp, FieldDefault::Now),
            FieldSpec::required("severity", FieldKind::Text),
            FieldSpec::required("type", FieldKind::Text),
            FieldSpec::optional("assignedTo", FieldKind::Reference("SupportAgent"), FieldDefault::Null),
            FieldSpec::optional("status", FieldKind::OneOf(TicketStatus::ALL), FieldDefault::Unset),
            FieldSpec::optional("resolvedOn", FieldKind::Timestamp, FieldDefault::Null),
        ],
    };

    /// Build a new ticket from a request body, assigning a fresh id.
    /// `assignedTo` is not checked against existing agents.
    pub fn from_body(body: &Value) -> Result<Self, ValidationError> {
        let mut doc = Self::SCHEMA.validate(body)?;

        Ok(Self {
            id: RecordId::new(),
            topic: doc.take_text("topic").unwrap_or_default(),
            description: doc.take_text("description").unwrap_or_default(),
            date_created: doc.take_timestamp("dateCreated").unwrap_or_else(Utc::now),
            severity: doc.take_text("severity").unwrap_or_default(),
            kind: doc.take_text("type").unwrap_or_default(),
            assigned_to: doc.take_reference("assignedTo"),
            status: doc.take_text("status").and_then(|status| status.parse().ok()),
            resolved_on: doc.take_timestamp("resolvedOn"),
        })
    }

    /// Replace the agent reference with the agent record
    pub fn populate(self, agent: Option<Agent>) -> PopulatedTicket {
        PopulatedTicket {
            id: self.id,
            topic: self.topic,
            description: self.description,
            date_created: self.date_created,
            severity: self.severity,
            kind: self.kind,
            assigned_to: agent,
            status: self.status,
            resolved_on: self.resolved_on,
        }
    }
}

/// Ticket with `assignedTo` expanded to the full agent
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PopulatedTicket {
    #[serde(rename = "_id")]
    #[schema(value_type = String)]
    pub id: RecordId,
    pub topic: String,
    pub description: String,
    pub date_created: DateTime<Utc>,
    pub severity: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub assigned_to: Option<Agent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TicketStatus>,
    pub resolved_on: Option<DateTime<Utc>>,
}
