use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ApiError, ErrorVerbosityProvider, InternalServerError},
    extractor::json::ApiJson,
    state::ApiState,
};

use super::{Book, NewBook};

#[derive(Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CreateBookResponse {
    pub book: Book,
}

impl IntoResponse for CreateBookResponse {
    fn into_response(self) -> Response {
        (StatusCode::CREATED, Json(self)).into_response()
    }
}

#[utoipa::path(
    post,
    path = "/book",
    tag = "books",
    request_body = NewBook,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Malformed request body"),
        (status = 500, description = "Internal server error"),
    )
)]
pub async fn create_book(
    State(state): State<ApiState>,
    ApiJson(new_book): ApiJson<NewBook>,
) -> Result<CreateBookResponse, ApiError> {
    let book = state
        .book_store()
        .insert(&new_book)
        .await
        .map_err(|err| InternalServerError::from_generic_error(state.error_verbosity(), err))?;

    tracing::debug!(id = book.id, "Book created");

    Ok(CreateBookResponse { book })
}
