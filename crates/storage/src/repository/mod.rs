use async_trait::async_trait;
use uuid::Uuid;

use crate::dto::athlete::{AthleteFilter, UpdateAthleteRequest};
use crate::error::{Result, StorageError};
use crate::models::{Athlete, AthleteSummary, NewAthlete, ReferenceKind, ResolvedReferences};

pub mod athlete;
pub mod category;
pub mod reference;
pub mod training_center;

/// Name-based lookup of the records an athlete points to.
#[async_trait]
pub trait ReferenceResolver: Send + Sync {
    async fn find_category_id(&self, name: &str) -> Result<Option<i32>>;

    async fn find_training_center_id(&self, name: &str) -> Result<Option<i32>>;

    /// Resolve both names, checking the category first so that it is the
    /// error reported when both are unknown.
    async fn resolve(&self, category: &str, training_center: &str) -> Result<ResolvedReferences> {
        let category_id =
            self.find_category_id(category)
                .await?
                .ok_or_else(|| StorageError::ReferenceNotFound {
                    kind: ReferenceKind::Category,
                    name: category.to_string(),
                })?;

        let training_center_id = self
            .find_training_center_id(training_center)
            .await?
            .ok_or_else(|| StorageError::ReferenceNotFound {
                kind: ReferenceKind::TrainingCenter,
                name: training_center.to_string(),
            })?;

        Ok(ResolvedReferences {
            category_id,
            training_center_id,
        })
    }
}

/// Persistence for athlete records.
///
/// Mutations are all-or-nothing. `create` and `update_partial` report a
/// clash on the cpf as [`StorageError::DuplicateKey`]; lookups by id that
/// match nothing return [`StorageError::NotFound`].
#[async_trait]
pub trait AthleteStore: Send + Sync {
    async fn create(&self, athlete: &NewAthlete) -> Result<Athlete>;

    async fn find_by_id(&self, id: Uuid) -> Result<Athlete>;

    /// One page of matching athletes plus the total number of matches.
    async fn list(&self, filter: &AthleteFilter) -> Result<(Vec<AthleteSummary>, i64)>;

    async fn update_partial(&self, id: Uuid, patch: &UpdateAthleteRequest) -> Result<Athlete>;

    async fn delete(&self, id: Uuid) -> Result<()>;
}
