//! Persistence adapters

pub mod memory;
pub mod mongo;

pub use memory::{InMemoryAgentRepository, InMemoryTicketRepository};
pub use mongo::{MongoAgentRepository, MongoStore, MongoTicketRepository};
