use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::{
    Database,
    dto::{
        athlete::{
            AthleteFilter, AthleteResponse, AthleteSummaryResponse, CreateAthleteRequest,
            UpdateAthleteRequest,
        },
        common::PaginatedResponse,
    },
    repository::{athlete::AthleteRepository, reference::ReferenceRepository},
};
use uuid::Uuid;
use validator::Validate;

use crate::error::WebError;

use super::services;

#[utoipa::path(
    get,
    path = "/api/athletes",
    params(AthleteFilter),
    responses(
        (status = 200, description = "Page of athletes matching the filters", body = PaginatedResponse<AthleteSummaryResponse>),
        (status = 400, description = "Invalid query parameters")
    ),
    tag = "athletes"
)]
pub async fn list_athletes(
    State(db): State<Database>,
    filter: Result<Query<AthleteFilter>, QueryRejection>,
) -> Result<Response, WebError> {
    let Query(filter) = filter?;

    let repo = AthleteRepository::new(db.pool());
    let (athletes, total_items) = services::list_athletes(&repo, &filter).await?;

    let response = PaginatedResponse::new(
        athletes
            .into_iter()
            .map(AthleteSummaryResponse::from)
            .collect(),
        filter.page,
        filter.page_size,
        total_items,
    );

    Ok(Json(response).into_response())
}

#[utoipa::path(
    get,
    path = "/api/athletes/{id}",
    params(
        ("id" = Uuid, Path, description = "Athlete ID")
    ),
    responses(
        (status = 200, description = "Athlete found", body = AthleteResponse),
        (status = 404, description = "Athlete not found")
    ),
    tag = "athletes"
)]
pub async fn get_athlete(
    State(db): State<Database>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Response, WebError> {
    let Path(id) = id?;
    let repo = AthleteRepository::new(db.pool());
    let athlete = services::get_athlete(&repo, id).await?;

    Ok(Json(AthleteResponse::from(athlete)).into_response())
}

#[utoipa::path(
    post,
    path = "/api/athletes",
    request_body = CreateAthleteRequest,
    responses(
        (status = 201, description = "Athlete created successfully", body = AthleteResponse),
        (status = 400, description = "Validation error or unknown category / training center"),
        (status = 409, description = "An athlete with this cpf already exists")
    ),
    tag = "athletes"
)]
pub async fn create_athlete(
    State(db): State<Database>,
    req: Result<Json<CreateAthleteRequest>, JsonRejection>,
) -> Result<Response, WebError> {
    let Json(req) = req?;
    req.validate()?;

    let references = ReferenceRepository::new(db.pool());
    let repo = AthleteRepository::new(db.pool());
    let athlete = services::create_athlete(&references, &repo, &req).await?;

    Ok((StatusCode::CREATED, Json(AthleteResponse::from(athlete))).into_response())
}

#[utoipa::path(
    patch,
    path = "/api/athletes/{id}",
    params(
        ("id" = Uuid, Path, description = "Athlete ID")
    ),
    request_body = UpdateAthleteRequest,
    responses(
        (status = 200, description = "Athlete updated successfully", body = AthleteResponse),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Athlete not found"),
        (status = 409, description = "An athlete with this cpf already exists")
    ),
    tag = "athletes"
)]
pub async fn update_athlete(
    State(db): State<Database>,
    id: Result<Path<Uuid>, PathRejection>,
    patch: Result<Json<UpdateAthleteRequest>, JsonRejection>,
) -> Result<Response, WebError> {
    let Path(id) = id?;
    let Json(patch) = patch?;
    patch.validate()?;

    let repo = AthleteRepository::new(db.pool());
    let updated = services::update_athlete(&repo, id, &patch).await?;

    Ok(Json(AthleteResponse::from(updated)).into_response())
}

#[utoipa::path(
    delete,
    path = "/api/athletes/{id}",
    params(
        ("id" = Uuid, Path, description = "Athlete ID")
    ),
    responses(
        (status = 204, description = "Athlete deleted successfully"),
        (status = 404, description = "Athlete not found")
    ),
    tag = "athletes"
)]
pub async fn delete_athlete(
    State(db): State<Database>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Response, WebError> {
    let Path(id) = id?;
    let repo = AthleteRepository::new(db.pool());
    services::delete_athlete(&repo, id).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}
