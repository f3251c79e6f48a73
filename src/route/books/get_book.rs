use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ErrorVerbosityProvider, ResourceError, ResourceErrorProvider},
    extractor::path::ApiPath,
    state::ApiState,
};

use super::Book;

#[derive(Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GetBookResponse {
    pub book: Book,
}

impl IntoResponse for GetBookResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "error_type")]
pub enum GetBookErrorType {
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
pub struct GetBookErrorContext {
    pub reason: String,
}

impl ResourceErrorProvider for GetBookErrorType {
    type Context = GetBookErrorContext;

    fn headers(&self) -> Option<HeaderMap> {
        None
    }

    fn status_code(&self) -> StatusCode {
        match self {
            GetBookErrorType::NotFound { .. } => StatusCode::NOT_FOUND,
            GetBookErrorType::Database { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            GetBookErrorType::NotFound { .. } => "Book not found",
            GetBookErrorType::Database { .. } => "Database operation failed",
        }
    }

    fn context(&self) -> Self::Context {
        match self {
            GetBookErrorType::NotFound { id } => GetBookErrorContext {
                reason: format!("Book with id {} not found", id),
            },
            GetBookErrorType::Database { reason } => GetBookErrorContext {
                reason: reason.clone(),
            },
        }
    }
}

#[utoipa::path(
    get,
    path = "/book/{id}",
    tag = "books",
    params(("id" = i64, Path, description = "Book id")),
    responses(
        (status = 200, description = "The book with the given id", body = Book),
        (status = 404, description = "Book not found"),
        (status = 500, description = "Internal server error"),
    )
)]
pub async fn get_book(
    State(state): State<ApiState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<GetBookResponse, ResourceError<GetBookErrorType, GetBookErrorContext>> {
    let book = state
        .book_store()
        .find_by_id(id)
        .await
        .map_err(|err| {
            tracing::error!(%err, "Failed to query book");

            ResourceError::new(
                state.error_verbosity(),
                GetBookErrorType::Database {
                    reason: format!("{err:#}"),
                },
            )
        })?
        .ok_or_else(|| {
            ResourceError::new(state.error_verbosity(), GetBookErrorType::NotFound { id })
        })?;

    Ok(GetBookResponse { book })
}
