use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use pdpcore::error::BackendError;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum AppError {
    #[error("400 Bad Request: {0}")]
    BadRequest(String),
    #[error("401 Unauthorized: {0}")]
    Unauthorized(&'static str),
    #[error("409 Conflict")]
    Conflict,
    #[error("500 Internal Server Error")]
    InternalServerError,
    #[error("503 Service Unavailable")]
    ServiceUnavailable,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Conflict => StatusCode::CONFLICT,
            AppError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AppError::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<pdpac::error::Error> for AppError {
    fn from(e: pdpac::error::Error) -> Self {
        use pdpac::error::Error;
        match e {
            Error::Validation(e) => AppError::BadRequest(e.to_string()),
            Error::NotReady => AppError::ServiceUnavailable,
            Error::Backend(BackendError::ConstraintViolation(e)) => {
                log::info!("policy rejected by store constraint: {e}");
                AppError::Conflict
            }
            e => {
                log::error!("request failed: {e}");
                AppError::InternalServerError
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}
