//! Error Types

use thiserror::Error;

use crate::domain::query::CastError;
use crate::domain::schema::ValidationError;
use crate::ports::outbound::RepositoryError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SupportError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Cast(#[from] CastError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub type Result<T> = std::result::Result<T, SupportError>;
