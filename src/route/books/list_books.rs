use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ApiError, ErrorVerbosityProvider, InternalServerError},
    state::ApiState,
};

use super::Book;

#[derive(Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListBooksResponse {
    pub books: Vec<Book>,
}

impl IntoResponse for ListBooksResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[utoipa::path(
    get,
    path = "/book",
    tag = "books",
    responses(
        (status = 200, description = "All stored books in insertion order", body = Vec<Book>),
        (status = 500, description = "Internal server error"),
    )
)]
pub async fn list_books(State(state): State<ApiState>) -> Result<ListBooksResponse, ApiError> {
    let books = state
        .book_store()
        .list()
        .await
        .map_err(|err| InternalServerError::from_generic_error(state.error_verbosity(), err))?;

    Ok(ListBooksResponse { books })
}
