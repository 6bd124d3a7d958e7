use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::common::{PaginationParams, default_page, default_page_size};
use crate::models::{Athlete, AthleteSummary};

/// Reference to a category or training center by its unique name
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct NamedReference {
    #[validate(length(min = 1, max = 50, message = "Name must be between 1 and 50 characters"))]
    pub name: String,
}

impl NamedReference {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Response containing the full athlete record
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AthleteResponse {
    pub id: Uuid,
    pub name: String,
    pub cpf: String,
    pub age: i32,
    pub weight: Decimal,
    pub height: Decimal,
    pub sex: String,
    pub created_at: NaiveDateTime,
    pub category: NamedReference,
    pub training_center: NamedReference,
}

/// Athlete entry in a paginated listing
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AthleteSummaryResponse {
    pub id: Uuid,
    pub name: String,
    pub cpf: String,
    pub category: NamedReference,
    pub training_center: NamedReference,
}

/// Request payload for creating a new athlete
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateAthleteRequest {
    #[validate(length(min = 1, max = 50, message = "Name must be between 1 and 50 characters"))]
    pub name: String,

    #[validate(custom(function = "validate_cpf"))]
    pub cpf: String,

    #[validate(range(min = 0, max = 150, message = "Age must be between 0 and 150"))]
    pub age: i32,

    #[validate(custom(function = "validate_weight"))]
    pub weight: Decimal,

    #[validate(custom(function = "validate_height"))]
    pub height: Decimal,

    #[validate(custom(function = "validate_sex"))]
    pub sex: String,

    #[validate(nested)]
    pub category: NamedReference,

    #[validate(nested)]
    pub training_center: NamedReference,
}

/// Sparse patch for an existing athlete. Omitted fields stay `None` and are
/// left untouched in storage.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateAthleteRequest {
    #[validate(length(min = 1, max = 50))]
    pub name: Option<String>,

    #[validate(custom(function = "validate_cpf"))]
    pub cpf: Option<String>,

    #[validate(range(min = 0, max = 150))]
    pub age: Option<i32>,

    #[validate(custom(function = "validate_weight"))]
    pub weight: Option<Decimal>,

    #[validate(custom(function = "validate_height"))]
    pub height: Option<Decimal>,

    #[validate(custom(function = "validate_sex"))]
    pub sex: Option<String>,
}

impl UpdateAthleteRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.cpf.is_none()
            && self.age.is_none()
            && self.weight.is_none()
            && self.height.is_none()
            && self.sex.is_none()
    }
}

/// Query parameters for listing athletes
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AthleteFilter {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Case-insensitive substring match on the athlete name
    pub name: Option<String>,
    /// Exact match on the cpf
    pub cpf: Option<String>,
}

impl Default for AthleteFilter {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
            name: None,
            cpf: None,
        }
    }
}

impl AthleteFilter {
    pub fn pagination(&self) -> PaginationParams {
        PaginationParams::new(self.page, self.page_size)
    }

    /// Name filter with blank input treated as absent.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn cpf(&self) -> Option<&str> {
        self.cpf.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn validate(&self) -> Result<(), String> {
        self.pagination().validate()?;

        if let Some(name) = self.name() {
            if name.chars().count() > 50 {
                return Err("name filter must be at most 50 characters".to_string());
            }
        }

        if let Some(cpf) = self.cpf() {
            if !is_valid_cpf(cpf) {
                return Err("cpf filter must be exactly 11 digits".to_string());
            }
        }

        Ok(())
    }
}

// Validation helpers
fn is_valid_cpf(cpf: &str) -> bool {
    cpf.len() == 11 && cpf.chars().all(|c| c.is_ascii_digit())
}

fn validate_cpf(cpf: &str) -> Result<(), validator::ValidationError> {
    if is_valid_cpf(cpf) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("invalid_cpf")
            .with_message("cpf must be exactly 11 digits".into()))
    }
}

fn validate_sex(sex: &str) -> Result<(), validator::ValidationError> {
    const VALID_SEXES: &[&str] = &["M", "F"];

    if VALID_SEXES.contains(&sex) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("invalid_sex"))
    }
}

// Bounds match the NUMERIC(6, 2) and NUMERIC(5, 2) columns.
const MAX_WEIGHT: Decimal = Decimal::from_parts(10000, 0, 0, false, 0);
const MAX_HEIGHT: Decimal = Decimal::from_parts(1000, 0, 0, false, 0);
const MEASURE_SCALE: u32 = 2;

fn validate_weight(weight: &Decimal) -> Result<(), validator::ValidationError> {
    validate_measure(weight, MAX_WEIGHT)
}

fn validate_height(height: &Decimal) -> Result<(), validator::ValidationError> {
    validate_measure(height, MAX_HEIGHT)
}

fn validate_measure(value: &Decimal, max: Decimal) -> Result<(), validator::ValidationError> {
    if !value.is_sign_positive() || value.is_zero() {
        return Err(validator::ValidationError::new("must_be_positive")
            .with_message("must be greater than 0".into()));
    }

    if *value >= max {
        return Err(validator::ValidationError::new("out_of_range")
            .with_message(format!("must be less than {}", max).into()));
    }

    if value.normalize().scale() > MEASURE_SCALE {
        return Err(validator::ValidationError::new("too_precise")
            .with_message("must have at most 2 decimal places".into()));
    }

    Ok(())
}

impl From<Athlete> for AthleteResponse {
    fn from(athlete: Athlete) -> Self {
        Self {
            id: athlete.id,
            name: athlete.name,
            cpf: athlete.cpf,
            age: athlete.age,
            weight: athlete.weight,
            height: athlete.height,
            sex: athlete.sex,
            created_at: athlete.created_at,
            category: NamedReference::new(athlete.category_name),
            training_center: NamedReference::new(athlete.training_center_name),
        }
    }
}

impl From<AthleteSummary> for AthleteSummaryResponse {
    fn from(summary: AthleteSummary) -> Self {
        Self {
            id: summary.id,
            name: summary.name,
            cpf: summary.cpf,
            category: NamedReference::new(summary.category_name),
            training_center: NamedReference::new(summary.training_center_name),
        }
    }
}
