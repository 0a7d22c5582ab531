//! Inbound ports (Use case traits)

use async_trait::async_trait;
use serde_json::Value;

use crate::application::dto::ListTicketsParams;
use crate::domain::aggregates::{Agent, PopulatedTicket, Ticket};
use crate::error::SupportError;

/// Support desk use cases
#[async_trait]
pub trait SupportUseCases: Send + Sync {
    /// Validate and store a new agent
    async fn create_agent(&self, body: &Value) -> Result<Agent, SupportError>;

    /// Validate and store a new ticket
    async fn create_ticket(&self, body: &Value) -> Result<Ticket, SupportError>;

    /// Filter, sort and page tickets, expanding their assigned agents
    async fn list_tickets(&self, params: &ListTicketsParams) -> Result<Vec<PopulatedTicket>, SupportError>;

    /// Check that both collections can be reached
    async fn check_store(&self) -> Result<(), SupportError>;
}
