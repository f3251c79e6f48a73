use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ErrorVerbosityProvider, ResourceError, ResourceErrorProvider},
    extractor::{json::ApiJson, path::ApiPath},
    state::ApiState,
};

use super::{Book, NewBook};

#[derive(Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UpdateBookResponse {
    pub book: Book,
}

impl IntoResponse for UpdateBookResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "error_type")]
pub enum UpdateBookErrorType {
    NotFound {
        #[serde(skip)]
        id: i64,
    },
    Database {
        #[serde(skip)]
        reason: String,
    },
}

#[derive(Debug, Serialize)]
pub struct UpdateBookErrorContext {
    pub reason: String,
}

impl ResourceErrorProvider for UpdateBookErrorType {
    type Context = UpdateBookErrorContext;

    fn headers(&self) -> Option<HeaderMap> {
        None
    }

    fn status_code(&self) -> StatusCode {
        match self {
            UpdateBookErrorType::NotFound { .. } => StatusCode::NOT_FOUND,
            UpdateBookErrorType::Database { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            UpdateBookErrorType::NotFound { .. } => "Book not found",
            UpdateBookErrorType::Database { .. } => "Database operation failed",
        }
    }

    fn context(&self) -> Self::Context {
        match self {
            UpdateBookErrorType::NotFound { id } => UpdateBookErrorContext {
                reason: format!("Book with id {} not found", id),
            },
            UpdateBookErrorType::Database { reason } => UpdateBookErrorContext {
                reason: reason.clone(),
            },
        }
    }
}

#[utoipa::path(
    put,
    path = "/book/{id}",
    tag = "books",
    params(("id" = i64, Path, description = "Book id")),
    request_body = NewBook,
    responses(
        (status = 200, description = "The updated book, id unchanged", body = Book),
        (status = 400, description = "Malformed request body"),
        (status = 404, description = "Book not found"),
        (status = 500, description = "Internal server error"),
    )
)]
pub async fn update_book(
    State(state): State<ApiState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(new_book): ApiJson<NewBook>,
) -> Result<UpdateBookResponse, ResourceError<UpdateBookErrorType, UpdateBookErrorContext>> {
    let book = state
        .book_store()
        .update(id, &new_book)
        .await
        .map_err(|err| {
            tracing::error!(%err, "Failed to update book");

            ResourceError::new(
                state.error_verbosity(),
                UpdateBookErrorType::Database {
                    reason: format!("{err:#}"),
                },
            )
        })?
        .ok_or_else(|| {
            ResourceError::new(state.error_verbosity(), UpdateBookErrorType::NotFound { id })
        })?;

    tracing::debug!(id = book.id, "Book updated");

    Ok(UpdateBookResponse { book })
}
