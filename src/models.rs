use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub order_id: i64,
    pub customer_name: String,
    pub phone_number: String,
    pub customer_address: Option<String>,
    #[schema(value_type = String)]
    pub total_price: Decimal,
    pub order_date: DateTime<Utc>,
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub item_name: String,
    pub quantity: i32,
    #[schema(value_type = String)]
    pub item_total: Decimal,
}

/// Validated customer fields of an order form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CustomerInfo {
    pub customer_name: String,
    pub phone_number: String,
    pub customer_address: Option<String>,
    /// Shown on the confirmation only; not stored.
    pub house_no: Option<String>,
}
