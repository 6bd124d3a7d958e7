use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::AthleteStore;
use crate::dto::athlete::{AthleteFilter, UpdateAthleteRequest};
use crate::error::{ATHLETE_CPF_CONSTRAINT, Result, StorageError};
use crate::models::{Athlete, AthleteSummary, NewAthlete};

const ATHLETE_COLUMNS: &str = r#"
    a.id, a.name, a.cpf, a.age, a.weight, a.height, a.sex, a.created_at,
    a.category_id, c.name AS category_name,
    a.training_center_id, t.name AS training_center_name
"#;

const REFERENCE_JOINS: &str = r#"
    JOIN categories c ON c.pk_id = a.category_id
    JOIN training_centers t ON t.pk_id = a.training_center_id
"#;

pub struct AthleteRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AthleteRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl<'a> AthleteStore for AthleteRepository<'a> {
    /// Insert a new athlete inside its own transaction
    async fn create(&self, athlete: &NewAthlete) -> Result<Athlete> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            WITH a AS (
                INSERT INTO athletes (id, name, cpf, age, weight, height, sex, created_at,
                                      category_id, training_center_id)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                RETURNING *
            )
            SELECT {ATHLETE_COLUMNS}
            FROM a
            {REFERENCE_JOINS}
            "#
        );

        let created = sqlx::query_as::<_, Athlete>(&sql)
            .bind(athlete.id)
            .bind(&athlete.name)
            .bind(&athlete.cpf)
            .bind(athlete.age)
            .bind(athlete.weight)
            .bind(athlete.height)
            .bind(&athlete.sex)
            .bind(athlete.created_at)
            .bind(athlete.category_id)
            .bind(athlete.training_center_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_write_error(e, &athlete.cpf))?;

        tx.commit()
            .await
            .map_err(|e| map_write_error(e, &athlete.cpf))?;

        Ok(created)
    }

    /// Find athlete by ID
    async fn find_by_id(&self, id: Uuid) -> Result<Athlete> {
        let sql = format!(
            r#"
            SELECT {ATHLETE_COLUMNS}
            FROM athletes a
            {REFERENCE_JOINS}
            WHERE a.id = $1
            "#
        );

        let athlete = sqlx::query_as::<_, Athlete>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(StorageError::NotFound)?;

        Ok(athlete)
    }

    async fn list(&self, filter: &AthleteFilter) -> Result<(Vec<AthleteSummary>, i64)> {
        let pagination = filter.pagination();
        let offset = pagination.offset() as i64;
        let limit = i64::from(pagination.limit());

        // Count and page are read from the same snapshot.
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let mut count_query = QueryBuilder::new("SELECT COUNT(*) FROM athletes a WHERE 1=1");
        push_filters(&mut count_query, filter);

        let total_items = count_query
            .build_query_scalar::<i64>()
            .fetch_one(&mut *tx)
            .await?;

        let mut query = QueryBuilder::new(
            r#"
            SELECT a.id, a.name, a.cpf,
                   c.name AS category_name,
                   t.name AS training_center_name
            FROM athletes a
            "#,
        );
        query.push(REFERENCE_JOINS);
        query.push(" WHERE 1=1");
        push_filters(&mut query, filter);
        query.push(" ORDER BY a.pk_id LIMIT ");
        query.push_bind(limit);
        query.push(" OFFSET ");
        query.push_bind(offset);

        let athletes = query
            .build_query_as::<AthleteSummary>()
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok((athletes, total_items))
    }

    /// Apply only the fields present in `patch`
    async fn update_partial(&self, id: Uuid, patch: &UpdateAthleteRequest) -> Result<Athlete> {
        if patch.is_empty() {
            return self.find_by_id(id).await;
        }

        let mut tx = self.pool.begin().await?;

        let mut query = QueryBuilder::<Postgres>::new("WITH a AS (UPDATE athletes SET ");
        {
            let mut assignments = query.separated(", ");
            if let Some(ref name) = patch.name {
                assignments.push("name = ");
                assignments.push_bind_unseparated(name.clone());
            }
            if let Some(ref cpf) = patch.cpf {
                assignments.push("cpf = ");
                assignments.push_bind_unseparated(cpf.clone());
            }
            if let Some(age) = patch.age {
                assignments.push("age = ");
                assignments.push_bind_unseparated(age);
            }
            if let Some(weight) = patch.weight {
                assignments.push("weight = ");
                assignments.push_bind_unseparated(weight);
            }
            if let Some(height) = patch.height {
                assignments.push("height = ");
                assignments.push_bind_unseparated(height);
            }
            if let Some(ref sex) = patch.sex {
                assignments.push("sex = ");
                assignments.push_bind_unseparated(sex.clone());
            }
        }
        query.push(" WHERE id = ");
        query.push_bind(id);
        query.push(" RETURNING *) SELECT ");
        query.push(ATHLETE_COLUMNS);
        query.push(" FROM a ");
        query.push(REFERENCE_JOINS);

        let cpf = patch.cpf.as_deref().unwrap_or_default();

        let updated = query
            .build_query_as::<Athlete>()
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_write_error(e, cpf))?
            .ok_or(StorageError::NotFound)?;

        tx.commit().await.map_err(|e| map_write_error(e, cpf))?;

        Ok(updated)
    }

    /// Delete an athlete by ID
    async fn delete(&self, id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM athletes WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        tx.commit().await?;

        Ok(())
    }
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &AthleteFilter) {
    if let Some(name) = filter.name() {
        query.push(" AND a.name ILIKE ");
        query.push_bind(format!("%{}%", escape_like(name)));
        query.push(" ESCAPE '\\'");
    }

    if let Some(cpf) = filter.cpf() {
        query.push(" AND a.cpf = ");
        query.push_bind(cpf.to_string());
    }
}

/// Escape LIKE wildcards so user input is matched literally.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn map_write_error(error: sqlx::Error, cpf: &str) -> StorageError {
    let error = StorageError::from(error);

    if error.is_unique_violation() && error.constraint() == Some(ATHLETE_CPF_CONSTRAINT) {
        return StorageError::DuplicateKey(cpf.to_string());
    }

    if error.is_foreign_key_violation() {
        return StorageError::ConstraintViolation(
            "Referenced category or training center no longer exists".to_string(),
        );
    }

    error
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like_plain_input() {
        assert_eq!(escape_like("ana"), "ana");
    }

    #[test]
    fn test_escape_like_wildcards() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
    }

    #[test]
    fn test_map_write_error_passes_through_other_errors() {
        let error = map_write_error(sqlx::Error::RowNotFound, "12345678900");
        assert!(matches!(error, StorageError::Database(sqlx::Error::RowNotFound)));
    }
}
