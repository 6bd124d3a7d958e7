use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::category::CreateCategoryRequest;
use crate::error::{Result, StorageError};
use crate::models::Category;

pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all categories
    pub async fn list(&self) -> Result<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT pk_id, id, name
            FROM categories
            ORDER BY name
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        Ok(categories)
    }

    /// Find category by its external ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Category> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            SELECT pk_id, id, name
            FROM categories
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(category)
    }

    /// Internal id of the category with exactly this name
    pub async fn find_pk_by_name(&self, name: &str) -> Result<Option<i32>> {
        let pk_id = sqlx::query_scalar::<_, i32>("SELECT pk_id FROM categories WHERE name = $1")
            .bind(name)
            .fetch_optional(self.pool)
            .await?;

        Ok(pk_id)
    }

    /// Create a new category
    pub async fn create(&self, req: &CreateCategoryRequest) -> Result<Category> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (id, name)
            VALUES ($1, $2)
            RETURNING pk_id, id, name
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&req.name)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            let error = StorageError::from(e);
            if error.is_unique_violation() {
                return StorageError::ConstraintViolation(format!(
                    "Category '{}' already exists",
                    req.name
                ));
            }
            error
        })?;

        Ok(category)
    }
}
