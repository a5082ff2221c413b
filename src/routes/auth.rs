use axum::{
    Form, Router,
    extract::{Query, State},
    response::Response,
    routing::get,
};
use tower_sessions::Session;

use crate::{
    dto::auth::{LoginRequest, NextQuery, RegisterRequest},
    error::AppError,
    flash,
    middleware::auth::{LOGIN_PATH, MaybeUser, login_redirect, login_user, logout_user, safe_next},
    services::auth_service::{AuthError, register_user, verify_credentials},
    state::AppState,
    views::{LoginTemplate, PageContext, RegisterTemplate},
};

const REGISTER_PATH: &str = "/auth/register";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", get(register_form).post(register))
        .route("/login", get(login_form).post(login))
        .route("/logout", get(logout))
}

pub async fn register_form(session: Session, MaybeUser(user): MaybeUser) -> RegisterTemplate {
    RegisterTemplate {
        page: PageContext::load(&session, user).await,
    }
}

pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(payload): Form<RegisterRequest>,
) -> Response {
    match register_user(&state.pool, payload).await {
        Ok(_) => {
            flash::redirect_with_success(
                &session,
                "Registration successful. Please log in.",
                LOGIN_PATH,
            )
            .await
        }
        Err(err) => flash::redirect_with_error(&session, err.into(), REGISTER_PATH).await,
    }
}

pub async fn login_form(
    session: Session,
    MaybeUser(user): MaybeUser,
    Query(query): Query<NextQuery>,
) -> LoginTemplate {
    LoginTemplate {
        page: PageContext::load(&session, user).await,
        next: query.next.unwrap_or_default(),
    }
}

pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(payload): Form<LoginRequest>,
) -> Response {
    let next = payload.next.as_deref().filter(|n| !n.trim().is_empty());
    let back_to_form = next.map_or_else(|| LOGIN_PATH.to_string(), login_redirect);

    let user = match verify_credentials(&state.pool, &payload.username, &payload.password).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            tracing::warn!(username = %payload.username.trim(), "login rejected");
            let err = AppError::from(AuthError::InvalidCredentials);
            return flash::redirect_with_error(&session, err, &back_to_form).await;
        }
        Err(err) => return flash::redirect_with_error(&session, err.into(), &back_to_form).await,
    };

    if let Err(err) = login_user(&session, &user).await {
        let err = AppError::Internal(anyhow::anyhow!("session write failed: {err}"));
        return flash::redirect_with_error(&session, err, &back_to_form).await;
    }

    tracing::info!(user_id = user.id, "user logged in");
    flash::redirect_with_success(&session, "Login successful.", safe_next(next)).await
}

pub async fn logout(session: Session) -> Response {
    if let Err(err) = logout_user(&session).await {
        tracing::warn!(error = %err, "failed to clear session user");
    }
    flash::redirect_with_success(&session, "Logged out successfully.", "/").await
}
