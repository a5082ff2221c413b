//! One-shot notices carried in the session to the next rendered page.

use axum::response::{IntoResponse, Redirect, Response};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::error::AppError;

const FLASH_KEY: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub level: FlashLevel,
    pub message: String,
}

impl FlashMessage {
    /// CSS class used by the templates.
    pub fn class(&self) -> &'static str {
        match self.level {
            FlashLevel::Success => "flash-success",
            FlashLevel::Error => "flash-error",
        }
    }
}

/// Queue a notice. A session failure only loses the notice.
pub async fn push(session: &Session, level: FlashLevel, message: impl Into<String>) {
    let mut pending: Vec<FlashMessage> = match session.get(FLASH_KEY).await {
        Ok(existing) => existing.unwrap_or_default(),
        Err(err) => {
            tracing::warn!(error = %err, "could not read flash messages");
            Vec::new()
        }
    };
    pending.push(FlashMessage {
        level,
        message: message.into(),
    });
    if let Err(err) = session.insert(FLASH_KEY, pending).await {
        tracing::warn!(error = %err, "could not store flash message");
    }
}

/// Drain queued notices.
pub async fn take(session: &Session) -> Vec<FlashMessage> {
    match session.remove::<Vec<FlashMessage>>(FLASH_KEY).await {
        Ok(messages) => messages.unwrap_or_default(),
        Err(err) => {
            tracing::warn!(error = %err, "could not read flash messages");
            Vec::new()
        }
    }
}

/// Request-boundary conversion: log, queue the user-facing notice, redirect.
pub async fn redirect_with_error(session: &Session, err: AppError, to: &str) -> Response {
    err.log();
    push(session, FlashLevel::Error, err.flash_message()).await;
    Redirect::to(to).into_response()
}

pub async fn redirect_with_success(session: &Session, message: &str, to: &str) -> Response {
    push(session, FlashLevel::Success, message).await;
    Redirect::to(to).into_response()
}
