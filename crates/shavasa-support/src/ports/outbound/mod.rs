//! Outbound ports (Repository traits)
//!
//! Hexagonal architecture: these are the interfaces that infrastructure must implement.

use async_trait::async_trait;

use crate::domain::aggregates::{Agent, Ticket};
use crate::domain::query::TicketQuery;
use crate::domain::value_objects::RecordId;

/// Agent repository port
#[async_trait]
pub trait AgentRepository: Send + Sync {
    /// Insert a new agent, rejecting duplicates on unique fields
    async fn insert(&self, agent: &Agent) -> Result<(), RepositoryError>;

    /// Fetch every agent whose id is in `ids`, in no particular order
    async fn find_by_ids(&self, ids: &[RecordId]) -> Result<Vec<Agent>, RepositoryError>;

    /// Round trip to the backing store
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Ticket repository port
#[async_trait]
pub trait TicketRepository: Send + Sync {
    /// Insert a new ticket
    async fn insert(&self, ticket: &Ticket) -> Result<(), RepositoryError>;

    /// Run a filtered, sorted and paged query
    async fn find(&self, query: &TicketQuery) -> Result<Vec<Ticket>, RepositoryError>;

    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Repository error type
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RepositoryError {
    #[error("E11000 duplicate key error collection: {collection} dup key: {{ {path}: \"{value}\" }}")]
    DuplicateKey {
        collection: String,
        path: String,
        value: String,
    },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}
