use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use thiserror::Error;

use crate::domain::errors::DomainError;
use crate::envelope::Envelope;

const GENERIC_FAILURE: &str = "Request failed";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    /// The backend refused the request or could not be reached. The message
    /// is already resolved for display.
    #[error("{0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Maps a domain failure, using `fallback` when the backend gave no
    /// usable message, e.g. "Failed to dispatch items".
    pub fn from_domain(e: DomainError, fallback: &str) -> Self {
        match e {
            DomainError::NotFound(_) => AppError::NotFound(e.to_string()),
            DomainError::InvalidInput(msg) => AppError::BadRequest(msg),
            DomainError::Validation(v) => AppError::BadRequest(v.to_string()),
            DomainError::Upstream(u) => AppError::Upstream(u.user_message(fallback)),
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }

    /// Adapter for `map_err` with a per-operation fallback.
    pub fn fallback(fallback: &'static str) -> impl Fn(DomainError) -> AppError {
        move |e| AppError::from_domain(e, fallback)
    }
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        AppError::from_domain(e, GENERIC_FAILURE)
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::Internal(detail) => {
                log::error!("internal error: {detail}");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(Envelope::<()>::failure(message))
    }
}
