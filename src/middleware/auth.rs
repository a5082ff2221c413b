//! Session-backed authentication.
//!
//! A session is either anonymous or carries the id of a logged-in user under
//! [`USER_ID_KEY`]. Login cycles the session id and stores the user id;
//! logout removes it; expiry is handled by the session layer.

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use serde::Serialize;
use tower_sessions::Session;

use crate::{
    error::{AppError, LOGIN_REQUIRED},
    flash::{self, FlashLevel},
    models::User,
    services::auth_service,
    state::AppState,
};

pub const USER_ID_KEY: &str = "user_id";
pub const LOGIN_PATH: &str = "/auth/login";
pub const DEFAULT_AFTER_LOGIN: &str = "/viewMenu.html";

/// The logged-in user as seen by handlers and templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    pub first_name: String,
}

impl From<User> for CurrentUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            first_name: user.first_name,
        }
    }
}

/// Resolves the session to its user, or `None` when anonymous.
///
/// A session pointing at a user that no longer exists is treated as
/// anonymous and cleared.
pub struct MaybeUser(pub Option<CurrentUser>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let Some(session) = parts.extensions.get::<Session>() else {
            return Ok(Self(None));
        };

        let user_id = match session.get::<i64>(USER_ID_KEY).await {
            Ok(Some(id)) => id,
            Ok(None) => return Ok(Self(None)),
            Err(err) => {
                tracing::warn!(error = %err, "session unreadable, treating as anonymous");
                return Ok(Self(None));
            }
        };

        match auth_service::find_user(&state.pool, user_id).await {
            Ok(Some(user)) => Ok(Self(Some(user.into()))),
            Ok(None) => {
                if let Err(err) = session.remove::<i64>(USER_ID_KEY).await {
                    tracing::warn!(error = %err, user_id, "failed to clear stale session user");
                }
                Ok(Self(None))
            }
            Err(err) => {
                tracing::error!(error = %err, user_id, "failed to load session user");
                Ok(Self(None))
            }
        }
    }
}

/// Gate for the order flow. When login is required, anonymous page requests
/// are sent to the login form with a `next` marker and API requests get 401.
pub struct OrderAccess(pub Option<CurrentUser>);

impl FromRequestParts<AppState> for OrderAccess {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Response> {
        let MaybeUser(user) = MaybeUser::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        if user.is_some() || !state.settings.require_login {
            return Ok(Self(user));
        }

        // Nested routers see a stripped uri.
        let uri = parts
            .extensions
            .get::<OriginalUri>()
            .map_or(&parts.uri, |original| &original.0);

        if uri.path().starts_with("/api/") {
            return Err(AppError::Unauthorized.into_response());
        }

        if let Some(session) = parts.extensions.get::<Session>() {
            flash::push(session, FlashLevel::Error, LOGIN_REQUIRED).await;
        }
        let next = uri
            .path_and_query()
            .map_or_else(|| uri.path(), |pq| pq.as_str());
        Err(Redirect::to(&login_redirect(next)).into_response())
    }
}

/// `/auth/login?next=<path>`
pub fn login_redirect(next: &str) -> String {
    format!("{LOGIN_PATH}?next={}", urlencoding::encode(next))
}

/// Only same-site absolute paths are followed after login. Browsers drop
/// tabs and newlines from a `Location`, so any byte outside visible ASCII
/// disqualifies the path.
pub fn safe_next(next: Option<&str>) -> &str {
    match next.map(str::trim) {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.contains('\\')
                && path.bytes().all(|b| b.is_ascii_graphic()) =>
        {
            path
        }
        _ => DEFAULT_AFTER_LOGIN,
    }
}

/// Move the session to Authenticated. The id is cycled to avoid fixation.
pub async fn login_user(session: &Session, user: &User) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(USER_ID_KEY, user.id).await
}

/// Move the session back to Anonymous.
pub async fn logout_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<i64>(USER_ID_KEY).await?;
    Ok(())
}
