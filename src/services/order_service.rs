use std::time::Duration;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QueryOrder, RuntimeErr, Set, TransactionTrait,
};
use sqlx::error::ErrorKind;
use thiserror::Error;

use crate::{
    cart::{self, CartPayload},
    db::OrmConn,
    dto::orders::{OrderReceipt, OrderWithItems},
    entity::{
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{ActiveModel as OrderActive, Entity as Orders, Model as OrderModel},
    },
    error::{AppError, AppResult},
    middleware::auth::CurrentUser,
    models::{CustomerInfo, Order, OrderItem},
    pricing::{self, PricedOrder},
    state::AppState,
};

/// SQLSTATE for a value that does not fit its numeric column.
const NUMERIC_VALUE_OUT_OF_RANGE: &str = "22003";

#[derive(Debug, Error)]
pub enum StoreError {
    /// No connection, or the call did not finish in time. Retry later.
    #[error("order store unavailable: {0}")]
    Unavailable(String),

    /// A constraint refused the write.
    #[error("order rejected by the store: {0}")]
    Rejected(String),

    #[error("order store error: {0}")]
    Database(DbErr),
}

impl From<DbErr> for StoreError {
    fn from(err: DbErr) -> Self {
        let sqlx_err = match &err {
            DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => {
                return Self::Unavailable(err.to_string());
            }
            DbErr::Exec(RuntimeErr::SqlxError(e)) | DbErr::Query(RuntimeErr::SqlxError(e)) => e,
            _ => return Self::Database(err),
        };

        match sqlx_err {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::WorkerCrashed => Self::Unavailable(err.to_string()),
            sqlx::Error::Database(db_err)
                if !matches!(db_err.kind(), ErrorKind::Other)
                    || db_err.code().as_deref() == Some(NUMERIC_VALUE_OUT_OF_RANGE) =>
            {
                Self::Rejected(db_err.message().to_string())
            }
            _ => Self::Database(err),
        }
    }
}

/// Transactional persistence of orders and their line items.
pub struct OrderStore<'a> {
    conn: &'a OrmConn,
    timeout: Duration,
}

impl<'a> OrderStore<'a> {
    pub const fn new(conn: &'a OrmConn, timeout: Duration) -> Self {
        Self { conn, timeout }
    }

    /// Write the header and every line in one transaction and return the new
    /// order id. Nothing is visible unless all rows were written. Identical
    /// calls create distinct orders.
    pub async fn save_order(
        &self,
        customer: &CustomerInfo,
        order: &PricedOrder,
        owner: Option<i64>,
    ) -> Result<i64, StoreError> {
        tokio::time::timeout(self.timeout, self.save_order_inner(customer, order, owner))
            .await
            .map_err(|_| StoreError::Unavailable(format!("no answer within {:?}", self.timeout)))?
    }

    async fn save_order_inner(
        &self,
        customer: &CustomerInfo,
        order: &PricedOrder,
        owner: Option<i64>,
    ) -> Result<i64, StoreError> {
        let txn = self.conn.begin().await?;

        match write_order(&txn, customer, order, owner).await {
            Ok(order_id) => {
                txn.commit().await?;
                Ok(order_id)
            }
            Err(err) => {
                if let Err(rollback_err) = txn.rollback().await {
                    tracing::error!(error = %rollback_err, "order rollback failed");
                }
                Err(err.into())
            }
        }
    }

    pub async fn find_order(&self, order_id: i64) -> Result<Option<OrderWithItems>, StoreError> {
        let Some(order) = Orders::find_by_id(order_id).one(self.conn).await? else {
            return Ok(None);
        };

        let items = OrderItems::find()
            .filter(OrderItemCol::OrderId.eq(order.order_id))
            .order_by_asc(OrderItemCol::Id)
            .all(self.conn)
            .await?
            .into_iter()
            .map(order_item_from_entity)
            .collect();

        Ok(Some(OrderWithItems {
            order: order_from_entity(order),
            items,
        }))
    }
}

// Header first so the items' foreign key resolves.
async fn write_order(
    txn: &DatabaseTransaction,
    customer: &CustomerInfo,
    order: &PricedOrder,
    owner: Option<i64>,
) -> Result<i64, DbErr> {
    let header = OrderActive {
        order_id: NotSet,
        customer_name: Set(customer.customer_name.clone()),
        phone_number: Set(customer.phone_number.clone()),
        customer_address: Set(customer.customer_address.clone()),
        total_price: Set(order.total),
        order_date: NotSet,
        user_id: Set(owner),
    }
    .insert(txn)
    .await?;

    for (item_name, line) in &order.lines {
        OrderItemActive {
            id: NotSet,
            order_id: Set(header.order_id),
            item_name: Set(item_name.clone()),
            quantity: Set(line.quantity),
            item_total: Set(line.line_total),
        }
        .insert(txn)
        .await?;
    }

    Ok(header.order_id)
}

/// Parse, price and persist one order for `user`.
pub async fn submit_order(
    state: &AppState,
    customer: CustomerInfo,
    payload: &CartPayload,
    user: Option<&CurrentUser>,
) -> AppResult<OrderReceipt> {
    if state.settings.require_login && user.is_none() {
        return Err(AppError::Unauthorized);
    }

    let cart = cart::parse(payload, &state.catalog)?;
    let priced = pricing::price(&cart, &state.catalog)?;

    let order_id = OrderStore::new(&state.orm, state.db_timeout)
        .save_order(&customer, &priced, user.map(|u| u.id))
        .await?;

    tracing::info!(
        order_id,
        lines = priced.lines.len(),
        total = %priced.total,
        user_id = ?user.map(|u| u.id),
        "order saved"
    );

    Ok(OrderReceipt::new(order_id, customer, priced))
}

fn order_from_entity(model: OrderModel) -> Order {
    Order {
        order_id: model.order_id,
        customer_name: model.customer_name,
        phone_number: model.phone_number,
        customer_address: model.customer_address,
        total_price: model.total_price,
        order_date: model.order_date.with_timezone(&Utc),
        user_id: model.user_id,
    }
}

fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        item_name: model.item_name,
        quantity: model.quantity,
        item_total: model.item_total,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        catalog::Catalog,
        config::{DatabaseConfig, OrderSettings},
        db::create_lazy_pool,
    };

    fn unreachable_state(settings: OrderSettings) -> AppState {
        let config = DatabaseConfig {
            url: Some("postgres://nobody@127.0.0.1:1/none".into()),
            host: String::new(),
            port: 0,
            user: String::new(),
            password: String::new(),
            name: String::new(),
            max_connections: 1,
            timeout: Duration::from_millis(200),
        };
        let pool = create_lazy_pool(&config).unwrap();
        AppState::new(pool, Catalog::bistro_menu(), settings, config.timeout)
    }

    fn customer() -> CustomerInfo {
        CustomerInfo::new("Ada", "9800000000", "Thamel", None).unwrap()
    }

    #[test]
    fn connection_errors_are_unavailable() {
        let err = StoreError::from(DbErr::Conn(RuntimeErr::Internal("refused".into())));
        assert!(matches!(err, StoreError::Unavailable(_)));

        let err = StoreError::from(DbErr::Exec(RuntimeErr::SqlxError(sqlx::Error::PoolTimedOut)));
        assert!(matches!(err, StoreError::Unavailable(_)));
    }

    #[test]
    fn other_errors_stay_internal() {
        let err = StoreError::from(DbErr::Custom("boom".into()));
        assert!(matches!(err, StoreError::Database(_)));

        let err = StoreError::from(DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::RowNotFound)));
        assert!(matches!(err, StoreError::Database(_)));
    }

    #[tokio::test]
    async fn login_gate_runs_before_anything_else() {
        let state = unreachable_state(OrderSettings::default());
        let payload = CartPayload::Encoded("Pasta=1".into());
        let err = submit_order(&state, customer(), &payload, None).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));
    }

    #[tokio::test]
    async fn invalid_cart_never_reaches_the_store() {
        let settings = OrderSettings {
            require_login: false,
            ..OrderSettings::default()
        };
        let state = unreachable_state(settings);
        let payload = CartPayload::Encoded("Pizza=1".into());
        let err = submit_order(&state, customer(), &payload, None).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Validation(crate::error::ValidationError::Cart(
                crate::cart::ParseError::ItemNotAvailable(_)
            ))
        ));
    }

    #[tokio::test]
    async fn oversized_order_never_reaches_the_store() {
        let settings = OrderSettings {
            require_login: false,
            ..OrderSettings::default()
        };
        let state = unreachable_state(settings);
        let payload = CartPayload::Encoded("Pasta=1000000".into());
        let err = submit_order(&state, customer(), &payload, None).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Validation(crate::error::ValidationError::Cart(
                crate::cart::ParseError::InvalidQuantity(ref item)
            )) if item == "Pasta"
        ));
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unreachable_database_is_reported_as_unavailable() {
        let settings = OrderSettings {
            require_login: false,
            ..OrderSettings::default()
        };
        let state = unreachable_state(settings);
        let payload = CartPayload::Encoded("Pasta=1".into());
        let err = submit_order(&state, customer(), &payload, None).await.unwrap_err();
        assert!(matches!(err, AppError::Store(StoreError::Unavailable(_))));
    }
}
