use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Deserialize, Debug, ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    /// Local path to return to after a successful login.
    pub next: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct NextQuery {
    pub next: Option<String>,
}
