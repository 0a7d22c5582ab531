//! Shavasa Support Desk
//!
//! Support agents, support tickets and the ticket list query, laid out as
//! a hexagonal core:
//!
//! - **Domain Layer**: records, declarative schemas, ticket queries
//! - **Application Layer**: the [`SupportDesk`] service
//! - **Ports Layer**: use case and repository traits
//! - **Infrastructure Layer**: in-memory and MongoDB repositories
//!
//! Every write is validated against the record's [`Schema`] first. The
//! ticket → agent reference is a plain id, expanded at read time.

pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod ports;

pub use application::dto::ListTicketsParams;
pub use application::SupportDesk;
pub use domain::aggregates::{Agent, PopulatedTicket, Ticket, TicketStatus};
pub use domain::query::{CastError, TicketQuery};
pub use domain::schema::{Schema, ValidationError};
pub use domain::value_objects::RecordId;
pub use error::{Result, SupportError};
pub use infrastructure::persistence::{InMemoryAgentRepository, InMemoryTicketRepository, MongoStore};
pub use ports::inbound::SupportUseCases;
pub use ports::outbound::{AgentRepository, RepositoryError, TicketRepository};
