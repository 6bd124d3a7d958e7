use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

/// A stored athlete joined with the names of its category and training center.
#[derive(Debug, Clone, FromRow)]
pub struct Athlete {
    pub id: Uuid,
    pub name: String,
    pub cpf: String,
    pub age: i32,
    pub weight: Decimal,
    pub height: Decimal,
    pub sex: String,
    pub created_at: NaiveDateTime,
    pub category_id: i32,
    pub category_name: String,
    pub training_center_id: i32,
    pub training_center_name: String,
}

/// Listing row.
#[derive(Debug, Clone, FromRow)]
pub struct AthleteSummary {
    pub id: Uuid,
    pub name: String,
    pub cpf: String,
    pub category_name: String,
    pub training_center_name: String,
}

/// Fully built record ready to be inserted. The id, timestamp and resolved
/// reference ids are assigned by the caller before it reaches storage.
#[derive(Debug, Clone)]
pub struct NewAthlete {
    pub id: Uuid,
    pub name: String,
    pub cpf: String,
    pub age: i32,
    pub weight: Decimal,
    pub height: Decimal,
    pub sex: String,
    pub created_at: NaiveDateTime,
    pub category_id: i32,
    pub training_center_id: i32,
}
