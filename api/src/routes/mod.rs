//! API Routes

pub mod agents;
pub mod health;
pub mod tickets;
