use storage::error::StorageError;
use storage::models::ReferenceKind;
use thiserror::Error;
use uuid::Uuid;

/// Outcomes of the athlete workflow that callers can act on, plus an opaque
/// storage failure.
#[derive(Debug, Error)]
pub enum AthleteError {
    #[error("{kind} '{name}' not found")]
    ReferenceNotFound { kind: ReferenceKind, name: String },

    #[error("An athlete with cpf {cpf} already exists")]
    DuplicateKey { cpf: String },

    #[error("Athlete not found with id: {id}")]
    NotFound { id: Uuid },

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Storage failure: {0}")]
    StorageFailure(#[source] StorageError),
}

impl AthleteError {
    /// Translation for operations addressed by athlete id.
    pub fn for_id(id: Uuid) -> impl FnOnce(StorageError) -> Self {
        move |error| match error {
            StorageError::NotFound => Self::NotFound { id },
            other => Self::from(other),
        }
    }
}

impl From<StorageError> for AthleteError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::ReferenceNotFound { kind, name } => Self::ReferenceNotFound { kind, name },
            StorageError::DuplicateKey(cpf) => Self::DuplicateKey { cpf },
            other => Self::StorageFailure(other),
        }
    }
}
