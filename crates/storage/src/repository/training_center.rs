use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::training_center::CreateTrainingCenterRequest;
use crate::error::{Result, StorageError};
use crate::models::TrainingCenter;

pub struct TrainingCenterRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TrainingCenterRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all training centers
    pub async fn list(&self) -> Result<Vec<TrainingCenter>> {
        let centers = sqlx::query_as::<_, TrainingCenter>(
            r#"
            SELECT pk_id, id, name, address, owner
            FROM training_centers
            ORDER BY name
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        Ok(centers)
    }

    /// Find training center by its external ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<TrainingCenter> {
        let center = sqlx::query_as::<_, TrainingCenter>(
            r#"
            SELECT pk_id, id, name, address, owner
            FROM training_centers
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(center)
    }

    pub async fn find_pk_by_name(&self, name: &str) -> Result<Option<i32>> {
        let pk_id =
            sqlx::query_scalar::<_, i32>("SELECT pk_id FROM training_centers WHERE name = $1")
                .bind(name)
                .fetch_optional(self.pool)
                .await?;

        Ok(pk_id)
    }

    /// Create a new training center
    pub async fn create(&self, req: &CreateTrainingCenterRequest) -> Result<TrainingCenter> {
        let center = sqlx::query_as::<_, TrainingCenter>(
            r#"
            INSERT INTO training_centers (id, name, address, owner)
            VALUES ($1, $2, $3, $4)
            RETURNING pk_id, id, name, address, owner
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&req.name)
        .bind(&req.address)
        .bind(&req.owner)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            let error = StorageError::from(e);
            if error.is_unique_violation() {
                return StorageError::ConstraintViolation(format!(
                    "Training center '{}' already exists",
                    req.name
                ));
            }
            error
        })?;

        Ok(center)
    }
}
