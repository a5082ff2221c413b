use bistro_orders::{
    config::AppConfig,
    db::{create_pool, run_migrations},
    dto::auth::RegisterRequest,
    services::auth_service::{AuthError, register_user},
};

/// Creates a demo account for local development. Safe to run repeatedly.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database).await?;
    run_migrations(&pool).await?;

    let username = std::env::var("DEMO_USERNAME").unwrap_or_else(|_| "demo".to_string());
    let password = std::env::var("DEMO_PASSWORD").unwrap_or_else(|_| "demo123".to_string());

    let request = RegisterRequest {
        username: username.clone(),
        password,
        first_name: "Demo".to_string(),
        last_name: "Customer".to_string(),
        email: format!("{username}@example.com"),
    };

    match register_user(&pool, request).await {
        Ok(user) => println!("Created user {} (id={})", user.username, user.id),
        Err(AuthError::DuplicateUsername) => println!("User {username} already exists"),
        Err(err) => return Err(err.into()),
    }
    Ok(())
}
