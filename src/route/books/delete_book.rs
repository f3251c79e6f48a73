use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::{ApiError, ErrorVerbosityProvider, InternalServerError},
    extractor::path::ApiPath,
    state::ApiState,
};

/// Fixed acknowledgement payload. Deleting a missing id is acknowledged too.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteBookResponse {
    pub data: String,
}

impl IntoResponse for DeleteBookResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[utoipa::path(
    delete,
    path = "/book/{id}",
    tag = "books",
    params(("id" = i64, Path, description = "Book id")),
    responses(
        (status = 200, description = "Deletion acknowledged", body = DeleteBookResponse),
        (status = 500, description = "Internal server error"),
    )
)]
pub async fn delete_book(
    State(state): State<ApiState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<DeleteBookResponse, ApiError> {
    let deleted = state
        .book_store()
        .delete(id)
        .await
        .map_err(|err| InternalServerError::from_generic_error(state.error_verbosity(), err))?;

    tracing::debug!(id, deleted, "Book delete executed");

    Ok(DeleteBookResponse {
        data: "ok".to_string(),
    })
}
