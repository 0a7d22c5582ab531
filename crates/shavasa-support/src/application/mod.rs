//! Application layer
//!
//! Orchestrates validation, persistence and the agent lookup join.

pub mod dto;

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::application::dto::ListTicketsParams;
use crate::domain::aggregates::{Agent, PopulatedTicket, Ticket};
use crate::domain::query::TicketQuery;
use crate::domain::value_objects::RecordId;
use crate::error::SupportError;
use crate::ports::inbound::SupportUseCases;
use crate::ports::outbound::{AgentRepository, TicketRepository};

/// Support desk application service
#[derive(Clone)]
pub struct SupportDesk {
    agents: Arc<dyn AgentRepository>,
    tickets: Arc<dyn TicketRepository>,
}

impl SupportDesk {
    pub fn new(agents: Arc<dyn AgentRepository>, tickets: Arc<dyn TicketRepository>) -> Self {
        Self { agents, tickets }
    }

    /// Expand `assignedTo` with one batch lookup. Missing agents become null.
    async fn populate(&self, tickets: Vec<Ticket>) -> Result<Vec<PopulatedTicket>, SupportError> {
        let mut ids: Vec<RecordId> = tickets.iter().filter_map(|ticket| ticket.assigned_to).collect();
        ids.sort();
        ids.dedup();

        let agents: HashMap<RecordId, Agent> = if ids.is_empty() {
            HashMap::new()
        } else {
            self.agents
                .find_by_ids(&ids)
                .await?
                .into_iter()
                .map(|agent| (agent.id, agent))
                .collect()
        };

        Ok(tickets
            .into_iter()
            .map(|ticket| {
                let agent = ticket.assigned_to.and_then(|id| agents.get(&id).cloned());
                ticket.populate(agent)
            })
            .collect())
    }
}

#[async_trait]
impl SupportUseCases for SupportDesk {
    async fn create_agent(&self, body: &Value) -> Result<Agent, SupportError> {
        let agent = Agent::from_body(body)?;
        self.agents.insert(&agent).await?;

        tracing::debug!(agent_id = %agent.id, "support agent created");
        Ok(agent)
    }

    async fn create_ticket(&self, body: &Value) -> Result<Ticket, SupportError> {
        let ticket = Ticket::from_body(body)?;
        self.tickets.insert(&ticket).await?;

        tracing::debug!(ticket_id = %ticket.id, "support ticket created");
        Ok(ticket)
    }

    async fn list_tickets(&self, params: &ListTicketsParams) -> Result<Vec<PopulatedTicket>, SupportError> {
        let query = TicketQuery::parse(params)?;
        let tickets = self.tickets.find(&query).await?;
        self.populate(tickets).await
    }

    async fn check_store(&self) -> Result<(), SupportError> {
        self.agents.ping().await?;
        self.tickets.ping().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::{InMemoryAgentRepository, InMemoryTicketRepository};
    use crate::ports::outbound::RepositoryError;
    use serde_json::json;

    fn desk() -> SupportDesk {
        SupportDesk::new(
            Arc::new(InMemoryAgentRepository::new()),
            Arc::new(InMemoryTicketRepository::new()),
        )
    }

    fn agent_body(email: &str) -> Value {
        json!({ "name": "A", "email": email, "phone": "1", "description": "d" })
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let desk = desk();
        desk.create_agent(&agent_body("a@x.com")).await.unwrap();

        let err = desk.create_agent(&agent_body("a@x.com")).await.unwrap_err();
        assert!(matches!(
            err,
            SupportError::Repository(RepositoryError::DuplicateKey { ref path, .. }) if path == "email"
        ));
    }

    #[tokio::test]
    async fn test_list_populates_assigned_agent() {
        let desk = desk();
        let agent = desk.create_agent(&agent_body("a@x.com")).await.unwrap();

        desk.create_ticket(&json!({
            "topic": "T", "description": "D", "severity": "High", "type": "Bug",
            "assignedTo": agent.id.to_hex(),
        }))
        .await
        .unwrap();
        desk.create_ticket(&json!({
            "topic": "U", "description": "D", "severity": "Low", "type": "Bug",
        }))
        .await
        .unwrap();

        let params = ListTicketsParams { assigned_to: Some(agent.id.to_hex()), ..Default::default() };
        let tickets = desk.list_tickets(&params).await.unwrap();

        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].assigned_to.as_ref().unwrap().name, "A");
    }

    #[tokio::test]
    async fn test_dangling_reference_is_null() {
        let desk = desk();
        desk.create_ticket(&json!({
            "topic": "T", "description": "D", "severity": "High", "type": "Bug",
            "assignedTo": RecordId::new().to_hex(),
        }))
        .await
        .unwrap();

        let tickets = desk.list_tickets(&ListTicketsParams::default()).await.unwrap();
        assert_eq!(tickets.len(), 1);
        assert!(tickets[0].assigned_to.is_none());
    }

    #[tokio::test]
    async fn test_bad_filter_is_cast_error() {
        let params = ListTicketsParams { assigned_to: Some("nope".into()), ..Default::default() };
        let err = desk().list_tickets(&params).await.unwrap_err();
        assert!(matches!(err, SupportError::Cast(_)));
    }

    struct UnreachableAgents;

    #[async_trait]
    impl AgentRepository for UnreachableAgents {
        async fn insert(&self, _agent: &Agent) -> Result<(), RepositoryError> {
            Err(RepositoryError::Connection("server selection timeout".into()))
        }

        async fn find_by_ids(&self, _ids: &[RecordId]) -> Result<Vec<Agent>, RepositoryError> {
            Err(RepositoryError::Connection("server selection timeout".into()))
        }

        async fn ping(&self) -> Result<(), RepositoryError> {
            Err(RepositoryError::Connection("server selection timeout".into()))
        }
    }

    #[tokio::test]
    async fn test_check_store() {
        desk().check_store().await.unwrap();

        let down = SupportDesk::new(Arc::new(UnreachableAgents), Arc::new(InMemoryTicketRepository::new()));
        let err = down.check_store().await.unwrap_err();
        assert!(matches!(err, SupportError::Repository(RepositoryError::Connection(_))));
    }

    #[tokio::test]
    async fn test_invalid_ticket_not_stored() {
        let desk = desk();
        let err = desk.create_ticket(&json!({ "topic": "T" })).await.unwrap_err();
        assert!(matches!(err, SupportError::Validation(_)));

        let tickets = desk.list_tickets(&ListTicketsParams::default()).await.unwrap();
        assert!(tickets.is_empty());
    }
}
