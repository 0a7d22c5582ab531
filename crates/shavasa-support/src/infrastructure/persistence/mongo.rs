//! MongoDB repository implementations

use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{doc, Document};
use futures::TryStreamExt;
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{FindOptions, IndexOptions};
use mongodb::{Client, Collection, Database, IndexModel};
use serde::{Deserialize, Serialize};

use crate::domain::aggregates::{Agent, Ticket};
use crate::domain::query::{TicketFilter, TicketQuery};
use crate::domain::schema::Schema;
use crate::domain::value_objects::RecordId;
use crate::ports::outbound::{AgentRepository, RepositoryError, TicketRepository};

pub const AGENT_COLLECTION: &str = "supportagents";
pub const TICKET_COLLECTION: &str = "supporttickets";

const DUPLICATE_KEY: i32 = 11000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AgentDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    name: String,
    email: String,
    phone: String,
    description: String,
    active: bool,
    date_created: bson::DateTime,
}

impl From<&Agent> for AgentDocument {
    fn from(agent: &Agent) -> Self {
        Self {
            id: agent.id.object_id(),
            name: agent.name.clone(),
            email: agent.email.clone(),
            phone: agent.phone.clone(),
            description: agent.description.clone(),
            active: agent.active,
            date_created: bson::DateTime::from_chrono(agent.date_created),
        }
    }
}

impl From<AgentDocument> for Agent {
    fn from(doc: AgentDocument) -> Self {
        Self {
            id: doc.id.into(),
            name: doc.name,
            email: doc.email,
            phone: doc.phone,
            description: doc.description,
            active: doc.active,
            date_created: doc.date_created.to_chrono(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TicketDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    topic: String,
    description: String,
    date_created: bson::DateTime,
    severity: String,
    #[serde(rename = "type")]
    kind: String,
    assigned_to: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status: Option<String>,
    resolved_on: Option<bson::DateTime>,
}

impl From<&Ticket> for TicketDocument {
    fn from(ticket: &Ticket) -> Self {
        Self {
            id: ticket.id.object_id(),
            topic: ticket.topic.clone(),
            description: ticket.description.clone(),
            date_created: bson::DateTime::from_chrono(ticket.date_created),
            severity: ticket.severity.clone(),
            kind: ticket.kind.clone(),
            assigned_to: ticket.assigned_to.map(|id| id.object_id()),
            status: ticket.status.map(|status| status.as_str().to_owned()),
            resolved_on: ticket.resolved_on.map(bson::DateTime::from_chrono),
        }
    }
}

impl TryFrom<TicketDocument> for Ticket {
    type Error = RepositoryError;

    fn try_from(doc: TicketDocument) -> Result<Self, Self::Error> {
        let status = doc
            .status
            .map(|status| status.parse())
            .transpose()
            .map_err(RepositoryError::Serialization)?;

        Ok(Self {
            id: doc.id.into(),
            topic: doc.topic,
            description: doc.description,
            date_created: doc.date_created.to_chrono(),
            severity: doc.severity,
            kind: doc.kind,
            assigned_to: doc.assigned_to.map(RecordId::from),
            status,
            resolved_on: doc.resolved_on.map(|at| at.to_chrono()),
        })
    }
}

/// Equality filter document for a ticket query
pub fn ticket_filter_document(filter: &TicketFilter) -> Document {
    let mut document = Document::new();
    if let Some(status) = &filter.status {
        document.insert("status", status.as_str());
    }
    if let Some(assigned_to) = filter.assigned_to {
        document.insert("assignedTo", assigned_to.object_id());
    }
    if let Some(severity) = &filter.severity {
        document.insert("severity", severity.as_str());
    }
    if let Some(kind) = &filter.kind {
        document.insert("type", kind.as_str());
    }
    document
}

/// Sort and window options. `_id` breaks ties so the order is stable.
pub fn ticket_find_options(query: &TicketQuery) -> FindOptions {
    let mut sort = Document::new();
    if let Some(by) = &query.sort {
        let field = if by.field == "id" { "_id" } else { by.field.as_str() };
        sort.insert(field, by.order.direction());
    }
    if !sort.contains_key("_id") {
        sort.insert("_id", 1);
    }

    let skip = query.pagination.map(|window| window.skip());
    let limit = query
        .pagination
        .map(|window| i64::try_from(window.limit).unwrap_or(i64::MAX));

    FindOptions::builder().sort(sort).skip(skip).limit(limit).build()
}

fn map_error(error: mongodb::error::Error) -> RepositoryError {
    match error.kind.as_ref() {
        ErrorKind::ServerSelection { .. } | ErrorKind::Io(_) | ErrorKind::DnsResolve { .. } => {
            RepositoryError::Connection(error.to_string())
        }
        ErrorKind::BsonSerialization(_) | ErrorKind::BsonDeserialization(_) => {
            RepositoryError::Serialization(error.to_string())
        }
        _ => RepositoryError::Query(error.to_string()),
    }
}

/// Map a duplicate key write error onto the unique field it violated
fn map_insert_error(error: mongodb::error::Error, schema: &Schema, collection: &str, record: &Document) -> RepositoryError {
    if let ErrorKind::Write(WriteFailure::WriteError(write_error)) = error.kind.as_ref() {
        if write_error.code == DUPLICATE_KEY {
            let path = schema
                .unique_paths()
                .find(|path| write_error.message.contains(&format!("{path}_")))
                .or_else(|| schema.unique_paths().next())
                .unwrap_or("_id");

            let value = match record.get(path) {
                Some(bson::Bson::String(value)) => value.clone(),
                Some(other) => other.to_string(),
                None => String::new(),
            };

            return RepositoryError::DuplicateKey {
                collection: collection.into(),
                path: path.into(),
                value,
            };
        }
    }
    map_error(error)
}

/// Process-wide database handle.
///
/// Created once at startup and closed explicitly on shutdown.
pub struct MongoStore {
    client: Client,
    database: Database,
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, RepositoryError> {
        tracing::debug!("setting up mongo client");

        let client = Client::with_uri_str(uri)
            .await
            .map_err(|e| RepositoryError::Connection(e.to_string()))?;
        let database = client.database(database);

        Ok(Self { client, database })
    }

    /// Create the unique indexes declared by the record schemas
    pub async fn setup_collections(&self) -> Result<(), RepositoryError> {
        for (name, schema) in [(AGENT_COLLECTION, &Agent::SCHEMA), (TICKET_COLLECTION, &Ticket::SCHEMA)] {
            let collection = self.database.collection::<Document>(name);

            for path in schema.unique_paths() {
                tracing::debug!(collection = name, path, "creating unique index");

                let mut keys = Document::new();
                keys.insert(path, 1);

                collection
                    .create_index(
                        IndexModel::builder()
                            .keys(keys)
                            .options(Some(IndexOptions::builder().unique(true).build()))
                            .build(),
                        None,
                    )
                    .await
                    .map_err(map_error)?;
            }
        }

        Ok(())
    }

    pub fn agents(&self) -> MongoAgentRepository {
        MongoAgentRepository {
            database: self.database.clone(),
            collection: self.database.collection(AGENT_COLLECTION),
        }
    }

    pub fn tickets(&self) -> MongoTicketRepository {
        MongoTicketRepository {
            database: self.database.clone(),
            collection: self.database.collection(TICKET_COLLECTION),
        }
    }

    pub async fn close(self) {
        tracing::debug!("closing mongo client");
        self.client.shutdown().await;
    }
}

async fn ping(database: &Database) -> Result<(), RepositoryError> {
    database
        .run_command(doc! { "ping": 1 }, None)
        .await
        .map(|_| ())
        .map_err(map_error)
}

pub struct MongoAgentRepository {
    database: Database,
    collection: Collection<AgentDocument>,
}

#[async_trait]
impl AgentRepository for MongoAgentRepository {
    async fn insert(&self, agent: &Agent) -> Result<(), RepositoryError> {
        let document = AgentDocument::from(agent);

        self.collection.insert_one(&document, None).await.map_err(|error| {
            let record = bson::to_document(&document).unwrap_or_default();
            map_insert_error(error, &Agent::SCHEMA, AGENT_COLLECTION, &record)
        })?;

        Ok(())
    }

    async fn find_by_ids(&self, ids: &[RecordId]) -> Result<Vec<Agent>, RepositoryError> {
        let ids: Vec<ObjectId> = ids.iter().map(|id| id.object_id()).collect();

        let documents: Vec<AgentDocument> = self
            .collection
            .find(doc! { "_id": { "$in": ids } }, None)
            .await
            .map_err(map_error)?
            .try_collect()
            .await
            .map_err(map_error)?;

        Ok(documents.into_iter().map(Agent::from).collect())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        ping(&self.database).await
    }
}

pub struct MongoTicketRepository {
    database: Database,
    collection: Collection<TicketDocument>,
}

#[async_trait]
impl TicketRepository for MongoTicketRepository {
    async fn insert(&self, ticket: &Ticket) -> Result<(), RepositoryError> {
        let document = TicketDocument::from(ticket);

        self.collection.insert_one(&document, None).await.map_err(|error| {
            let record = bson::to_document(&document).unwrap_or_default();
            map_insert_error(error, &Ticket::SCHEMA, TICKET_COLLECTION, &record)
        })?;

        Ok(())
    }

    async fn find(&self, query: &TicketQuery) -> Result<Vec<Ticket>, RepositoryError> {
        let filter = ticket_filter_document(&query.filter);
        tracing::debug!(%filter, "finding tickets");

        let documents: Vec<TicketDocument> = self
            .collection
            .find(filter, ticket_find_options(query))
            .await
            .map_err(map_error)?
            .try_collect()
            .await
            .map_err(map_error)?;

        documents.into_iter().map(Ticket::try_from).collect()
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        ping(&self.database).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::query::{Pagination, SortOrder, TicketSort};
    use serde_json::json;

    #[test]
    fn test_filter_document() {
        let id = RecordId::new();
        let filter = TicketFilter {
            status: Some("New".into()),
            assigned_to: Some(id),
            severity: None,
            kind: Some("Bug".into()),
        };

        let document = ticket_filter_document(&filter);
        assert_eq!(
            document,
            doc! { "status": "New", "assignedTo": id.object_id(), "type": "Bug" }
        );
        assert!(ticket_filter_document(&TicketFilter::default()).is_empty());
    }

    #[test]
    fn test_find_options_default_order() {
        let options = ticket_find_options(&TicketQuery::default());
        assert_eq!(options.sort, Some(doc! { "_id": 1 }));
        assert_eq!(options.skip, None);
        assert_eq!(options.limit, None);
    }

    #[test]
    fn test_find_options_sort_and_window() {
        let query = TicketQuery {
            sort: Some(TicketSort { field: "dateCreated".into(), order: SortOrder::Descending }),
            pagination: Some(Pagination { page: 3, limit: 10 }),
            ..Default::default()
        };

        let options = ticket_find_options(&query);
        assert_eq!(options.sort, Some(doc! { "dateCreated": -1, "_id": 1 }));
        assert_eq!(options.skip, Some(20));
        assert_eq!(options.limit, Some(10));
    }

    #[test]
    fn test_find_options_sort_by_id() {
        let query = TicketQuery {
            sort: Some(TicketSort { field: "id".into(), order: SortOrder::Descending }),
            ..Default::default()
        };
        assert_eq!(ticket_find_options(&query).sort, Some(doc! { "_id": -1 }));
    }

    #[test]
    fn test_ticket_document_round_trip() {
        let ticket = Ticket::from_body(&json!({
            "topic": "T", "description": "D", "severity": "High", "type": "Bug",
            "status": "Assigned", "assignedTo": "65a1f0c2e4b0a1b2c3d4e5f6",
        }))
        .unwrap();

        let document = bson::to_document(&TicketDocument::from(&ticket)).unwrap();
        assert_eq!(document.get_str("type").unwrap(), "Bug");
        assert!(document.get_object_id("assignedTo").is_ok());
        assert!(document.get_datetime("dateCreated").is_ok());
        assert_eq!(document.get("resolvedOn"), Some(&bson::Bson::Null));

        let back: TicketDocument = bson::from_document(document).unwrap();
        assert_eq!(Ticket::try_from(back).unwrap(), ticket);
    }

    #[test]
    fn test_stored_agent_matches_created_agent() {
        let agent = Agent::from_body(&json!({
            "name": "A", "email": "a@x.com", "phone": "1", "description": "d",
        }))
        .unwrap();

        let document = bson::to_document(&AgentDocument::from(&agent)).unwrap();
        let back: AgentDocument = bson::from_document(document).unwrap();
        assert_eq!(Agent::from(back), agent);
    }

    #[test]
    fn test_unset_status_is_omitted() {
        let ticket = Ticket::from_body(&json!({
            "topic": "T", "description": "D", "severity": "High", "type": "Bug",
        }))
        .unwrap();

        let document = bson::to_document(&TicketDocument::from(&ticket)).unwrap();
        assert!(!document.contains_key("status"));
        assert_eq!(document.get("assignedTo"), Some(&bson::Bson::Null));
    }
}
