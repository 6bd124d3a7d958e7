use utoipa::OpenApi;

use crate::features;

#[derive(OpenApi)]
#[openapi(
    paths(
        features::athletes::handlers::list_athletes,
        features::athletes::handlers::get_athlete,
        features::athletes::handlers::create_athlete,
        features::athletes::handlers::update_athlete,
        features::athletes::handlers::delete_athlete,
        features::categories::handlers::list_categories,
        features::categories::handlers::get_category,
        features::categories::handlers::create_category,
        features::training_centers::handlers::list_training_centers,
        features::training_centers::handlers::get_training_center,
        features::training_centers::handlers::create_training_center,
    ),
    components(
        schemas(
            storage::dto::athlete::CreateAthleteRequest,
            storage::dto::athlete::UpdateAthleteRequest,
            storage::dto::athlete::AthleteResponse,
            storage::dto::athlete::AthleteSummaryResponse,
            storage::dto::athlete::NamedReference,
            storage::dto::category::CreateCategoryRequest,
            storage::dto::category::CategoryResponse,
            storage::dto::training_center::CreateTrainingCenterRequest,
            storage::dto::training_center::TrainingCenterResponse,
            storage::dto::common::PaginationMeta,
        )
    ),
    tags(
        (name = "athletes", description = "Athlete records"),
        (name = "categories", description = "Athlete categories"),
        (name = "training_centers", description = "Training centers"),
    )
)]
pub struct ApiDoc;
