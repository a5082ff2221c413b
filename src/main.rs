use tower_sessions_sqlx_store::PostgresStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bistro_orders::{
    catalog::Catalog,
    config::AppConfig,
    db::{create_pool, run_migrations},
    routes::create_app,
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,bistro_orders=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    if config.uses_dev_secret() {
        tracing::warn!("SECRET_KEY is not set; sessions are signed with the development key");
    }
    if !config.session.secure_cookie {
        tracing::warn!("SESSION_SECURE is off; session cookies are sent over plain HTTP");
    }

    let pool = create_pool(&config.database).await?;
    run_migrations(&pool).await?;

    tracing::info!(
        cart_encoding = %config.orders.cart_encoding,
        require_login = config.orders.require_login,
        "order pipeline configured"
    );

    let state = AppState::new(
        pool.clone(),
        Catalog::bistro_menu(),
        config.orders.clone(),
        config.database.timeout,
    );
    let app = create_app(state, PostgresStore::new(pool), &config.session);

    let addr = config.socket_addr()?;
    tracing::info!("listening on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;

    Ok(())
}
