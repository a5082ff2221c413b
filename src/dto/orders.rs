use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use utoipa::ToSchema;

use crate::{
    catalog::CatalogEntry,
    models::{CustomerInfo, Order, OrderItem},
    pricing::PricedOrder,
};

pub const CUSTOMER_NAME_FIELD: &str = "customer-name";
pub const PHONE_NUMBER_FIELD: &str = "phone-number";
pub const CUSTOMER_ADDRESS_FIELD: &str = "customer-address";
pub const HOUSE_NO_FIELD: &str = "house-no";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid phone number")]
    InvalidPhone,
}

impl CustomerInfo {
    /// Name, phone and address are required; phone is 7 to 15 digits with
    /// an optional leading `+`, ignoring spaces and dashes.
    pub fn new(
        customer_name: &str,
        phone_number: &str,
        customer_address: &str,
        house_no: Option<&str>,
    ) -> Result<Self, FormError> {
        let customer_name = required(customer_name, CUSTOMER_NAME_FIELD)?;
        let phone_number = required(phone_number, PHONE_NUMBER_FIELD)?;
        let customer_address = required(customer_address, CUSTOMER_ADDRESS_FIELD)?;

        if !is_phone_number(&phone_number) {
            return Err(FormError::InvalidPhone);
        }

        Ok(Self {
            customer_name,
            phone_number,
            customer_address: Some(customer_address),
            house_no: house_no
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string),
        })
    }

    pub fn from_form(fields: &HashMap<String, String>) -> Result<Self, FormError> {
        let field = |name: &str| fields.get(name).map(String::as_str).unwrap_or("");
        Self::new(
            field(CUSTOMER_NAME_FIELD),
            field(PHONE_NUMBER_FIELD),
            field(CUSTOMER_ADDRESS_FIELD),
            fields.get(HOUSE_NO_FIELD).map(String::as_str),
        )
    }
}

fn required(value: &str, field: &'static str) -> Result<String, FormError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(FormError::MissingField(field));
    }
    Ok(value.to_string())
}

fn is_phone_number(raw: &str) -> bool {
    let compact: String = raw.chars().filter(|c| !matches!(c, ' ' | '-')).collect();
    let digits = compact.strip_prefix('+').unwrap_or(&compact);
    (7..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}

/// JSON order submission. `items` maps item name to quantity.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub customer_name: String,
    pub phone_number: String,
    pub customer_address: String,
    pub house_no: Option<String>,
    #[schema(value_type = Object)]
    pub items: Map<String, Value>,
}

impl CreateOrderRequest {
    pub fn customer(&self) -> Result<CustomerInfo, FormError> {
        CustomerInfo::new(
            &self.customer_name,
            &self.phone_number,
            &self.customer_address,
            self.house_no.as_deref(),
        )
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReceiptLine {
    pub item_name: String,
    pub quantity: i32,
    #[schema(value_type = String)]
    pub unit_price: Decimal,
    #[schema(value_type = String)]
    pub line_total: Decimal,
}

/// Outcome of a successful submission.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderReceipt {
    pub order_id: i64,
    pub customer: CustomerInfo,
    pub lines: Vec<ReceiptLine>,
    #[schema(value_type = String)]
    pub total: Decimal,
}

impl OrderReceipt {
    pub fn new(order_id: i64, customer: CustomerInfo, order: PricedOrder) -> Self {
        let lines = order
            .lines
            .into_iter()
            .map(|(item_name, line)| ReceiptLine {
                item_name,
                quantity: line.quantity,
                unit_price: line.unit_price,
                line_total: line.line_total,
            })
            .collect();
        Self {
            order_id,
            customer,
            lines,
            total: order.total,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MenuList {
    pub currency: String,
    pub items: Vec<CatalogEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_keeps_optional_house_number() {
        let info = CustomerInfo::new(" Ada ", "980-000-0000", " Thamel ", Some("  ")).unwrap();
        assert_eq!(info.customer_name, "Ada");
        assert_eq!(info.phone_number, "980-000-0000");
        assert_eq!(info.customer_address.as_deref(), Some("Thamel"));
        assert_eq!(info.house_no, None);

        let info = CustomerInfo::new("Ada", "+977 9800000000", "Thamel", Some("12B")).unwrap();
        assert_eq!(info.house_no.as_deref(), Some("12B"));
    }

    #[test]
    fn requires_all_customer_fields() {
        assert_eq!(
            CustomerInfo::new("", "9800000000", "Thamel", None),
            Err(FormError::MissingField(CUSTOMER_NAME_FIELD))
        );
        assert_eq!(
            CustomerInfo::new("Ada", "9800000000", "  ", None),
            Err(FormError::MissingField(CUSTOMER_ADDRESS_FIELD))
        );
    }

    #[test]
    fn phone_must_be_numeric() {
        for bad in ["call me", "12345", "+1234567890123456", "98000O0000"] {
            assert_eq!(
                CustomerInfo::new("Ada", bad, "Thamel", None),
                Err(FormError::InvalidPhone),
                "{bad}"
            );
        }
    }

    #[test]
    fn reads_dashed_form_fields() {
        let fields = HashMap::from([
            (CUSTOMER_NAME_FIELD.to_string(), "Ada".to_string()),
            (PHONE_NUMBER_FIELD.to_string(), "9800000000".to_string()),
            (CUSTOMER_ADDRESS_FIELD.to_string(), "Thamel".to_string()),
        ]);
        let info = CustomerInfo::from_form(&fields).unwrap();
        assert_eq!(info.customer_name, "Ada");
        assert_eq!(info.house_no, None);
    }
}
