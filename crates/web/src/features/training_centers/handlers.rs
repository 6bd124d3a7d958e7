use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::{
    Database,
    dto::training_center::{CreateTrainingCenterRequest, TrainingCenterResponse},
};
use uuid::Uuid;
use validator::Validate;

use crate::error::WebError;

use super::services;

#[utoipa::path(
    get,
    path = "/api/training_centers",
    responses(
        (status = 200, description = "List all training centers successfully", body = Vec<TrainingCenterResponse>)
    ),
    tag = "training_centers"
)]
pub async fn list_training_centers(
    State(db): State<Database>,
) -> Result<Json<Vec<TrainingCenterResponse>>, WebError> {
    let centers = services::list_training_centers(db.pool()).await?;

    let response: Vec<TrainingCenterResponse> = centers
        .into_iter()
        .map(TrainingCenterResponse::from)
        .collect();

    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/training_centers/{id}",
    params(
        ("id" = Uuid, Path, description = "Training center ID")
    ),
    responses(
        (status = 200, description = "Training center found", body = TrainingCenterResponse),
        (status = 404, description = "Training center not found")
    ),
    tag = "training_centers"
)]
pub async fn get_training_center(
    State(db): State<Database>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Response, WebError> {
    let Path(id) = id?;
    let center = services::get_training_center(db.pool(), id).await?;

    Ok(Json(TrainingCenterResponse::from(center)).into_response())
}

#[utoipa::path(
    post,
    path = "/api/training_centers",
    request_body = CreateTrainingCenterRequest,
    responses(
        (status = 201, description = "Training center created successfully", body = TrainingCenterResponse),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Training center name already exists")
    ),
    tag = "training_centers"
)]
pub async fn create_training_center(
    State(db): State<Database>,
    req: Result<Json<CreateTrainingCenterRequest>, JsonRejection>,
) -> Result<Response, WebError> {
    let Json(req) = req?;
    req.validate()?;

    let center = services::create_training_center(db.pool(), &req).await?;
    tracing::info!(training_center = %center.name, "Training center created");

    Ok((StatusCode::CREATED, Json(TrainingCenterResponse::from(center))).into_response())
}
