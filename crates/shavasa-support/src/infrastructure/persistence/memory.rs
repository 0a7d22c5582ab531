//! In-memory repository implementations for testing

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use crate::domain::aggregates::{Agent, Ticket};
use crate::domain::query::TicketQuery;
use crate::domain::schema::Schema;
use crate::domain::value_objects::RecordId;
use crate::ports::outbound::{AgentRepository, RepositoryError, TicketRepository};

/// Reject `candidate` if it shares a unique field value with any stored record
fn check_unique<'a>(
    schema: &Schema,
    collection: &str,
    stored: impl Iterator<Item = &'a Value> + Clone,
    candidate: &Value,
) -> Result<(), RepositoryError> {
    for path in schema.unique_paths() {
        let Some(value) = candidate.get(path).filter(|value| !value.is_null()) else {
            continue;
        };

        if stored.clone().any(|existing| existing.get(path) == Some(value)) {
            return Err(RepositoryError::DuplicateKey {
                collection: collection.into(),
                path: path.into(),
                value: value.as_str().map(str::to_owned).unwrap_or_else(|| value.to_string()),
            });
        }
    }
    Ok(())
}

fn to_value<T: serde::Serialize>(record: &T) -> Result<Value, RepositoryError> {
    serde_json::to_value(record).map_err(|e| RepositoryError::Serialization(e.to_string()))
}

/// Agent plus the serialized form its unique fields are checked against
struct StoredAgent {
    agent: Agent,
    document: Value,
}

/// In-memory agent repository (for testing)
#[derive(Default)]
pub struct InMemoryAgentRepository {
    agents: RwLock<Vec<StoredAgent>>,
}

impl InMemoryAgentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AgentRepository for InMemoryAgentRepository {
    async fn insert(&self, agent: &Agent) -> Result<(), RepositoryError> {
        let document = to_value(agent)?;

        // uniqueness check and insert under one lock
        let mut agents = self.agents.write();
        check_unique(
            &Agent::SCHEMA,
            "supportagents",
            agents.iter().map(|stored| &stored.document),
            &document,
        )?;

        agents.push(StoredAgent {
            agent: agent.clone(),
            document,
        });
        Ok(())
    }

    async fn find_by_ids(&self, ids: &[RecordId]) -> Result<Vec<Agent>, RepositoryError> {
        let agents = self.agents.read();
        Ok(agents
            .iter()
            .filter(|stored| ids.contains(&stored.agent.id))
            .map(|stored| stored.agent.clone())
            .collect())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

/// In-memory ticket repository (for testing)
#[derive(Default)]
pub struct InMemoryTicketRepository {
    tickets: RwLock<Vec<Ticket>>,
}

impl InMemoryTicketRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TicketRepository for InMemoryTicketRepository {
    async fn insert(&self, ticket: &Ticket) -> Result<(), RepositoryError> {
        self.tickets.write().push(ticket.clone());
        Ok(())
    }

    async fn find(&self, query: &TicketQuery) -> Result<Vec<Ticket>, RepositoryError> {
        let matching: Vec<Ticket> = self
            .tickets
            .read()
            .iter()
            .filter(|ticket| query.filter.matches(ticket))
            .cloned()
            .collect();

        Ok(query.arrange(matching))
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
