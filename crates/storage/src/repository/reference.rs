use async_trait::async_trait;
use sqlx::PgPool;

use super::ReferenceResolver;
use super::category::CategoryRepository;
use super::training_center::TrainingCenterRepository;
use crate::error::Result;

/// Resolves category and training center names against Postgres.
pub struct ReferenceRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReferenceRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl<'a> ReferenceResolver for ReferenceRepository<'a> {
    async fn find_category_id(&self, name: &str) -> Result<Option<i32>> {
        CategoryRepository::new(self.pool).find_pk_by_name(name).await
    }

    async fn find_training_center_id(&self, name: &str) -> Result<Option<i32>> {
        TrainingCenterRepository::new(self.pool)
            .find_pk_by_name(name)
            .await
    }
}
