use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::{
    cart::ParseError,
    dto::orders::FormError,
    response::ApiResponse,
    services::{auth_service::AuthError, order_service::StoreError},
};

pub const LOGIN_REQUIRED: &str = "Please log in to access this page.";
const TRY_AGAIN: &str = "Something went wrong. Please try again.";

/// Bad or missing user input; never a server fault.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error(transparent)]
    Cart(#[from] ParseError),

    #[error(transparent)]
    Form(#[from] FormError),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Not Found")]
    NotFound,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl From<ParseError> for AppError {
    fn from(err: ParseError) -> Self {
        Self::Validation(err.into())
    }
}

impl From<FormError> for AppError {
    fn from(err: FormError) -> Self {
        Self::Validation(err.into())
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Store(StoreError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Store(StoreError::Rejected(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Store(StoreError::Database(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(AuthError::InvalidCredentials) => StatusCode::UNAUTHORIZED,
            Self::Auth(AuthError::DuplicateUsername) => StatusCode::CONFLICT,
            Self::Auth(AuthError::MissingField(_) | AuthError::InvalidField(_)) => {
                StatusCode::BAD_REQUEST
            }
            Self::Auth(AuthError::PasswordHash | AuthError::Database(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Notice shown to the user. Server-side failures get a generic text.
    pub fn flash_message(&self) -> String {
        match self {
            Self::Validation(ValidationError::Cart(err)) => match err {
                ParseError::InvalidQuantity(item) => format!("Invalid quantity for {item}."),
                ParseError::ItemNotAvailable(item) => format!("Item '{item}' is not available."),
                ParseError::IncorrectFormat => {
                    "Invalid item data format. Please try again.".to_string()
                }
                ParseError::NoItemsSelected => "Please select at least one item!".to_string(),
            },
            Self::Validation(ValidationError::Form(err)) => match err {
                FormError::MissingField(_) => "Please fill in all required fields.".to_string(),
                FormError::InvalidPhone => "Please enter a valid phone number.".to_string(),
            },
            Self::Store(StoreError::Unavailable(_)) => {
                "Service temporarily unavailable. Please try again later.".to_string()
            }
            Self::Store(StoreError::Rejected(_)) => {
                "Failed to save order. Please try again.".to_string()
            }
            Self::Store(StoreError::Database(_)) => {
                "An error occurred while saving your order. Please try again.".to_string()
            }
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => "Invalid credentials".to_string(),
                AuthError::DuplicateUsername => {
                    "Username already exists, please choose another.".to_string()
                }
                AuthError::MissingField(_) => "Please fill in all required fields.".to_string(),
                AuthError::InvalidField(field) => format!("Please enter a valid {field}."),
                AuthError::PasswordHash | AuthError::Database(_) => TRY_AGAIN.to_string(),
            },
            Self::NotFound => "Not found.".to_string(),
            Self::Unauthorized => LOGIN_REQUIRED.to_string(),
            Self::Internal(_) => TRY_AGAIN.to_string(),
        }
    }

    /// Log with full context; server faults at error level.
    pub fn log(&self) {
        if self.status().is_server_error() {
            tracing::error!(error = ?self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }
    }
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();
        let status = self.status();
        let message = if status.is_server_error() {
            status
                .canonical_reason()
                .unwrap_or("Internal Server Error")
                .to_string()
        } else {
            self.to_string()
        };

        let body = ApiResponse::failure(
            message,
            ErrorData {
                error: self.flash_message(),
            },
        );

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
