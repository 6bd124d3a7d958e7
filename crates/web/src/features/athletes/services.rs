use chrono::Utc;
use storage::{
    dto::athlete::{AthleteFilter, CreateAthleteRequest, UpdateAthleteRequest},
    models::{Athlete, AthleteSummary, NewAthlete},
    repository::{AthleteStore, ReferenceResolver},
};
use uuid::Uuid;

use super::AthleteError;

pub type Result<T> = std::result::Result<T, AthleteError>;

/// Create a new athlete after resolving its category and training center
pub async fn create_athlete(
    resolver: &impl ReferenceResolver,
    store: &impl AthleteStore,
    request: &CreateAthleteRequest,
) -> Result<Athlete> {
    let references = resolver
        .resolve(&request.category.name, &request.training_center.name)
        .await?;

    let record = NewAthlete {
        id: Uuid::new_v4(),
        name: request.name.clone(),
        cpf: request.cpf.clone(),
        age: request.age,
        weight: request.weight,
        height: request.height,
        sex: request.sex.clone(),
        created_at: Utc::now().naive_utc(),
        category_id: references.category_id,
        training_center_id: references.training_center_id,
    };

    match store.create(&record).await {
        Ok(athlete) => {
            tracing::info!(athlete_id = %athlete.id, "Athlete created");
            Ok(athlete)
        }
        Err(e) => {
            let error = AthleteError::from(e);
            if let AthleteError::DuplicateKey { ref cpf } = error {
                tracing::warn!(cpf = %cpf, "Rejected athlete with duplicate cpf");
            }
            Err(error)
        }
    }
}

/// List athletes matching the filter, one page at a time
pub async fn list_athletes(
    store: &impl AthleteStore,
    filter: &AthleteFilter,
) -> Result<(Vec<AthleteSummary>, i64)> {
    filter.validate().map_err(AthleteError::InvalidQuery)?;

    let page = store.list(filter).await?;
    Ok(page)
}

/// Get athlete by ID
pub async fn get_athlete(store: &impl AthleteStore, id: Uuid) -> Result<Athlete> {
    store.find_by_id(id).await.map_err(AthleteError::for_id(id))
}

/// Apply a sparse patch to an athlete
pub async fn update_athlete(
    store: &impl AthleteStore,
    id: Uuid,
    patch: &UpdateAthleteRequest,
) -> Result<Athlete> {
    let athlete = store
        .update_partial(id, patch)
        .await
        .map_err(AthleteError::for_id(id))?;

    tracing::info!(athlete_id = %id, "Athlete updated");
    Ok(athlete)
}

/// Delete an athlete
pub async fn delete_athlete(store: &impl AthleteStore, id: Uuid) -> Result<()> {
    store.delete(id).await.map_err(AthleteError::for_id(id))?;

    tracing::info!(athlete_id = %id, "Athlete deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use storage::dto::athlete::NamedReference;
    use storage::error::{Result as StorageResult, StorageError};
    use storage::models::ReferenceKind;

    use super::*;

    struct MemoryReferences {
        categories: HashMap<String, i32>,
        training_centers: HashMap<String, i32>,
    }

    impl MemoryReferences {
        fn new() -> Self {
            Self {
                categories: HashMap::from([("Scale".to_string(), 1), ("RX".to_string(), 2)]),
                training_centers: HashMap::from([("CT King".to_string(), 10)]),
            }
        }
    }

    #[async_trait]
    impl ReferenceResolver for MemoryReferences {
        async fn find_category_id(&self, name: &str) -> StorageResult<Option<i32>> {
            Ok(self.categories.get(name).copied())
        }

        async fn find_training_center_id(&self, name: &str) -> StorageResult<Option<i32>> {
            Ok(self.training_centers.get(name).copied())
        }
    }

    /// Keeps rows in insertion order; the cpf check and the insert happen
    /// under one lock, like a unique constraint.
    #[derive(Default)]
    struct MemoryStore {
        rows: Mutex<Vec<Athlete>>,
    }

    impl MemoryStore {
        fn len(&self) -> usize {
            self.rows.lock().unwrap().len()
        }
    }

    fn reference_name(id: i32) -> String {
        format!("ref-{id}")
    }

    #[async_trait]
    impl AthleteStore for MemoryStore {
        async fn create(&self, athlete: &NewAthlete) -> StorageResult<Athlete> {
            let mut rows = self.rows.lock().unwrap();
            if rows.iter().any(|row| row.cpf == athlete.cpf) {
                return Err(StorageError::DuplicateKey(athlete.cpf.clone()));
            }

            let stored = Athlete {
                id: athlete.id,
                name: athlete.name.clone(),
                cpf: athlete.cpf.clone(),
                age: athlete.age,
                weight: athlete.weight,
                height: athlete.height,
                sex: athlete.sex.clone(),
                created_at: athlete.created_at,
                category_id: athlete.category_id,
                category_name: reference_name(athlete.category_id),
                training_center_id: athlete.training_center_id,
                training_center_name: reference_name(athlete.training_center_id),
            };
            rows.push(stored.clone());
            Ok(stored)
        }

        async fn find_by_id(&self, id: Uuid) -> StorageResult<Athlete> {
            self.rows
                .lock()
                .unwrap()
                .iter()
                .find(|row| row.id == id)
                .cloned()
                .ok_or(StorageError::NotFound)
        }

        async fn list(&self, filter: &AthleteFilter) -> StorageResult<(Vec<AthleteSummary>, i64)> {
            let rows = self.rows.lock().unwrap();
            let needle = filter.name().map(str::to_lowercase);
            let matching: Vec<&Athlete> = rows
                .iter()
                .filter(|row| {
                    needle
                        .as_ref()
                        .is_none_or(|n| row.name.to_lowercase().contains(n.as_str()))
                })
                .filter(|row| filter.cpf().is_none_or(|cpf| row.cpf == cpf))
                .collect();

            let pagination = filter.pagination();
            let page = matching
                .iter()
                .skip(pagination.offset() as usize)
                .take(pagination.limit() as usize)
                .map(|row| AthleteSummary {
                    id: row.id,
                    name: row.name.clone(),
                    cpf: row.cpf.clone(),
                    category_name: row.category_name.clone(),
                    training_center_name: row.training_center_name.clone(),
                })
                .collect();

            Ok((page, matching.len() as i64))
        }

        async fn update_partial(
            &self,
            id: Uuid,
            patch: &UpdateAthleteRequest,
        ) -> StorageResult<Athlete> {
            let mut rows = self.rows.lock().unwrap();
            if let Some(ref cpf) = patch.cpf {
                if rows.iter().any(|row| row.id != id && &row.cpf == cpf) {
                    return Err(StorageError::DuplicateKey(cpf.clone()));
                }
            }

            let row = rows
                .iter_mut()
                .find(|row| row.id == id)
                .ok_or(StorageError::NotFound)?;
            if let Some(ref name) = patch.name {
                row.name = name.clone();
            }
            if let Some(ref cpf) = patch.cpf {
                row.cpf = cpf.clone();
            }
            if let Some(age) = patch.age {
                row.age = age;
            }
            if let Some(weight) = patch.weight {
                row.weight = weight;
            }
            if let Some(height) = patch.height {
                row.height = height;
            }
            if let Some(ref sex) = patch.sex {
                row.sex = sex.clone();
            }
            Ok(row.clone())
        }

        async fn delete(&self, id: Uuid) -> StorageResult<()> {
            let mut rows = self.rows.lock().unwrap();
            let index = rows
                .iter()
                .position(|row| row.id == id)
                .ok_or(StorageError::NotFound)?;
            rows.remove(index);
            Ok(())
        }
    }

    /// Store whose every call fails like a dropped connection.
    struct BrokenStore;

    #[async_trait]
    impl AthleteStore for BrokenStore {
        async fn create(&self, _athlete: &NewAthlete) -> StorageResult<Athlete> {
            Err(StorageError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn find_by_id(&self, _id: Uuid) -> StorageResult<Athlete> {
            Err(StorageError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn list(&self, _filter: &AthleteFilter) -> StorageResult<(Vec<AthleteSummary>, i64)> {
            Err(StorageError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn update_partial(
            &self,
            _id: Uuid,
            _patch: &UpdateAthleteRequest,
        ) -> StorageResult<Athlete> {
            Err(StorageError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn delete(&self, _id: Uuid) -> StorageResult<()> {
            Err(StorageError::Database(sqlx::Error::PoolTimedOut))
        }
    }

    fn request(name: &str, cpf: &str) -> CreateAthleteRequest {
        CreateAthleteRequest {
            name: name.to_string(),
            cpf: cpf.to_string(),
            age: 25,
            weight: Decimal::from(80),
            height: Decimal::from(175),
            sex: "M".to_string(),
            category: NamedReference::new("Scale"),
            training_center: NamedReference::new("CT King"),
        }
    }

    #[tokio::test]
    async fn test_create_resolves_references() {
        let refs = MemoryReferences::new();
        let store = MemoryStore::default();

        let mut rx = request("Beatriz", "10000000001");
        rx.category = NamedReference::new("RX");

        let scale = create_athlete(&refs, &store, &request("Ana", "10000000000"))
            .await
            .unwrap();
        let rx = create_athlete(&refs, &store, &rx).await.unwrap();

        assert_eq!(store.len(), 2);
        assert_ne!(scale.id, rx.id);
        assert_eq!(scale.category_id, 1);
        assert_eq!(rx.category_id, 2);
        assert_eq!(scale.training_center_id, 10);
        assert_eq!(rx.training_center_id, 10);
    }

    #[tokio::test]
    async fn test_create_with_unknown_category_writes_nothing() {
        let refs = MemoryReferences::new();
        let store = MemoryStore::default();

        let mut req = request("Ana", "10000000000");
        req.category = NamedReference::new("Nonexistent");

        let err = create_athlete(&refs, &store, &req).await.unwrap_err();

        assert!(matches!(
            err,
            AthleteError::ReferenceNotFound {
                kind: ReferenceKind::Category,
                ref name,
            } if name == "Nonexistent"
        ));
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn test_create_with_unknown_training_center() {
        let refs = MemoryReferences::new();
        let store = MemoryStore::default();

        let mut req = request("Ana", "10000000000");
        req.training_center = NamedReference::new("Nowhere Gym");

        let err = create_athlete(&refs, &store, &req).await.unwrap_err();

        assert!(matches!(
            err,
            AthleteError::ReferenceNotFound {
                kind: ReferenceKind::TrainingCenter,
                ..
            }
        ));
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_cpf_is_conflict() {
        let refs = MemoryReferences::new();
        let store = MemoryStore::default();

        create_athlete(&refs, &store, &request("Ana", "10000000000"))
            .await
            .unwrap();
        let err = create_athlete(&refs, &store, &request("Other", "10000000000"))
            .await
            .unwrap_err();

        assert!(matches!(err, AthleteError::DuplicateKey { ref cpf } if cpf == "10000000000"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_duplicate_creates_store_one_row() {
        let refs = Arc::new(MemoryReferences::new());
        let store = Arc::new(MemoryStore::default());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let refs = Arc::clone(&refs);
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    create_athlete(&*refs, &*store, &request(&format!("Twin {i}"), "20000000000"))
                        .await
                })
            })
            .collect();

        let mut created = 0;
        let mut duplicates = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(AthleteError::DuplicateKey { .. }) => duplicates += 1,
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        assert_eq!(created, 1);
        assert_eq!(duplicates, 7);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_partial_update_leaves_omitted_fields() {
        let refs = MemoryReferences::new();
        let store = MemoryStore::default();
        let created = create_athlete(&refs, &store, &request("Ana", "10000000000"))
            .await
            .unwrap();

        let patch = UpdateAthleteRequest {
            height: Some(Decimal::from(180)),
            ..UpdateAthleteRequest::default()
        };
        let updated = update_athlete(&store, created.id, &patch).await.unwrap();

        assert_eq!(updated.weight, Decimal::from(80));
        assert_eq!(updated.height, Decimal::from(180));
        assert_eq!(updated.name, "Ana");
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.id, created.id);
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_not_found() {
        let store = MemoryStore::default();
        let id = Uuid::new_v4();

        let err = update_athlete(&store, id, &UpdateAthleteRequest::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AthleteError::NotFound { id: missing } if missing == id));
    }

    #[tokio::test]
    async fn test_list_filters_compose() {
        let refs = MemoryReferences::new();
        let store = MemoryStore::default();
        for (name, cpf) in [
            ("Ana Lima", "12345678900"),
            ("Mariana", "12345678901"),
            ("Bruno", "12345678902"),
        ] {
            create_athlete(&refs, &store, &request(name, cpf))
                .await
                .unwrap();
        }

        let filter = AthleteFilter {
            name: Some("ANA".to_string()),
            ..AthleteFilter::default()
        };
        let (items, total) = list_athletes(&store, &filter).await.unwrap();
        assert_eq!(total, 2);
        assert!(items.iter().all(|a| a.name.to_lowercase().contains("ana")));

        let filter = AthleteFilter {
            name: Some("ana".to_string()),
            cpf: Some("12345678900".to_string()),
            ..AthleteFilter::default()
        };
        let (items, total) = list_athletes(&store, &filter).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(items[0].name, "Ana Lima");

        let filter = AthleteFilter {
            name: Some("ana".to_string()),
            cpf: Some("12345678902".to_string()),
            ..AthleteFilter::default()
        };
        let (items, _) = list_athletes(&store, &filter).await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_pagination_covers_every_athlete_once() {
        let refs = MemoryReferences::new();
        let store = MemoryStore::default();
        for i in 0..25 {
            create_athlete(&refs, &store, &request(&format!("Athlete {i}"), &format!("{:011}", i)))
                .await
                .unwrap();
        }

        let mut seen = HashSet::new();
        let mut pages = 0;
        for page in 1.. {
            let filter = AthleteFilter {
                page,
                page_size: 10,
                ..AthleteFilter::default()
            };
            let (items, total) = list_athletes(&store, &filter).await.unwrap();
            assert_eq!(total, 25);
            if items.is_empty() {
                break;
            }
            pages += 1;
            for item in items {
                assert!(seen.insert(item.id), "athlete listed twice");
            }
        }

        assert_eq!(pages, 3);
        assert_eq!(seen.len(), 25);
    }

    #[tokio::test]
    async fn test_list_rejects_bad_pagination() {
        let store = MemoryStore::default();
        let filter = AthleteFilter {
            page_size: 500,
            ..AthleteFilter::default()
        };

        let err = list_athletes(&store, &filter).await.unwrap_err();
        assert!(matches!(err, AthleteError::InvalidQuery(_)));
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let refs = MemoryReferences::new();
        let store = MemoryStore::default();
        let created = create_athlete(&refs, &store, &request("Ana", "10000000000"))
            .await
            .unwrap();

        delete_athlete(&store, created.id).await.unwrap();
        let err = delete_athlete(&store, created.id).await.unwrap_err();

        assert!(matches!(err, AthleteError::NotFound { id } if id == created.id));
    }

    #[tokio::test]
    async fn test_get_never_created_id() {
        let store = MemoryStore::default();
        let id = Uuid::new_v4();

        let err = get_athlete(&store, id).await.unwrap_err();

        assert!(matches!(err, AthleteError::NotFound { id: missing } if missing == id));
        assert!(err.to_string().contains(&id.to_string()));
    }

    #[tokio::test]
    async fn test_storage_errors_are_opaque_failures() {
        let refs = MemoryReferences::new();

        let err = create_athlete(&refs, &BrokenStore, &request("Ana", "10000000000"))
            .await
            .unwrap_err();
        assert!(matches!(err, AthleteError::StorageFailure(_)));

        let err = get_athlete(&BrokenStore, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AthleteError::StorageFailure(_)));
    }
}
