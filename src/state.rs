use std::{sync::Arc, time::Duration};

use crate::{
    catalog::Catalog,
    config::OrderSettings,
    db::{DbPool, OrmConn, create_orm_conn},
};

/// Shared per-process state. Everything but the pool is immutable.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub catalog: Arc<Catalog>,
    pub settings: Arc<OrderSettings>,
    pub db_timeout: Duration,
}

impl AppState {
    pub fn new(
        pool: DbPool,
        catalog: Catalog,
        settings: OrderSettings,
        db_timeout: Duration,
    ) -> Self {
        let orm = create_orm_conn(&pool);
        Self {
            pool,
            orm,
            catalog: Arc::new(catalog),
            settings: Arc::new(settings),
            db_timeout,
        }
    }
}
