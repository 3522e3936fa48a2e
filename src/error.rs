use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("geocoding failed: {0}")]
    Geocoding(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
    #[error("not found")]
    NotFound,
    #[error("day {day_number} is outside the trip's {total_days} days")]
    OutOfRange { day_number: u32, total_days: u32 },
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Config(_)
            | AppError::Io(_)
            | AppError::Database(_)
            | AppError::Migration(_)
            | AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Http(_) | AppError::Geocoding(_) => StatusCode::BAD_GATEWAY,
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound | AppError::OutOfRange { .. } => StatusCode::NOT_FOUND,
        }
    }

    /// Text shown to the user; store failures never leak driver details.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Database(_) | AppError::Migration(_) => {
                "Could not reach the journal database. Your entry was kept, please try saving again."
                    .into()
            }
            AppError::Io(_) | AppError::Other(_) | AppError::Config(_) => {
                "Something went wrong. Please try again.".into()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        }
        (status, self.user_message()).into_response()
    }
}
