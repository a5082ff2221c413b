//! Server-rendered pages.
//!
//! Money is formatted before it reaches a template so the templates stay free
//! of custom filters.

use askama::Template;
use askama_web::WebTemplate;
use tower_sessions::Session;

use crate::{
    cart::{Cart, CartEncoding, ITEMS_FIELD},
    catalog::{Catalog, format_currency},
    dto::orders::OrderReceipt,
    flash::{self, FlashMessage},
    middleware::auth::CurrentUser,
    pricing::PricedOrder,
};

/// Data every page needs: the current user and pending notices.
pub struct PageContext {
    pub user: Option<CurrentUser>,
    pub flashes: Vec<FlashMessage>,
}

impl PageContext {
    pub async fn load(session: &Session, user: Option<CurrentUser>) -> Self {
        Self {
            user,
            flashes: flash::take(session).await,
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct HomeTemplate {
    pub page: PageContext,
}

#[derive(Template, WebTemplate)]
#[template(path = "aboutus.html")]
pub struct AboutTemplate {
    pub page: PageContext,
}

#[derive(Template, WebTemplate)]
#[template(path = "contactus.html")]
pub struct ContactTemplate {
    pub page: PageContext,
}

pub struct MenuRow {
    pub name: String,
    pub price: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "menu.html")]
pub struct MenuTemplate {
    pub page: PageContext,
    pub items: Vec<MenuRow>,
}

impl MenuTemplate {
    pub fn new(page: PageContext, catalog: &Catalog, currency: &str) -> Self {
        let items = catalog
            .entries()
            .iter()
            .map(|entry| MenuRow {
                name: entry.name.clone(),
                price: format_currency(currency, entry.unit_price),
            })
            .collect();
        Self { page, items }
    }
}

pub struct LineRow {
    pub name: String,
    pub quantity: i32,
    pub unit_price: String,
    pub line_total: String,
}

/// Hidden inputs that carry the cart from the menu to the order form.
pub struct HiddenField {
    pub name: String,
    pub value: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "order.html")]
pub struct OrderFormTemplate {
    pub page: PageContext,
    pub lines: Vec<LineRow>,
    pub total: String,
    pub hidden: Vec<HiddenField>,
}

impl OrderFormTemplate {
    pub fn new(
        page: PageContext,
        cart: &Cart,
        priced: &PricedOrder,
        encoding: CartEncoding,
        currency: &str,
    ) -> Self {
        let lines = priced
            .lines
            .iter()
            .map(|(name, line)| LineRow {
                name: name.clone(),
                quantity: line.quantity,
                unit_price: format_currency(currency, line.unit_price),
                line_total: format_currency(currency, line.line_total),
            })
            .collect();

        let hidden = match cart.encode(encoding) {
            Some(value) => vec![HiddenField {
                name: ITEMS_FIELD.to_string(),
                value,
            }],
            None => cart
                .lines()
                .map(|(name, qty)| HiddenField {
                    name: name.to_string(),
                    value: qty.to_string(),
                })
                .collect(),
        };

        Self {
            page,
            lines,
            total: format_currency(currency, priced.total),
            hidden,
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "order_summary.html")]
pub struct OrderSummaryTemplate {
    pub page: PageContext,
    pub order_id: i64,
    pub customer_name: String,
    pub phone_number: String,
    pub customer_address: String,
    pub house_no: String,
    pub lines: Vec<LineRow>,
    pub total: String,
}

impl OrderSummaryTemplate {
    pub fn new(page: PageContext, receipt: &OrderReceipt, currency: &str) -> Self {
        let customer = &receipt.customer;
        Self {
            page,
            order_id: receipt.order_id,
            customer_name: customer.customer_name.clone(),
            phone_number: customer.phone_number.clone(),
            customer_address: customer.customer_address.clone().unwrap_or_default(),
            house_no: customer
                .house_no
                .clone()
                .unwrap_or_else(|| "N/A".to_string()),
            lines: receipt
                .lines
                .iter()
                .map(|line| LineRow {
                    name: line.item_name.clone(),
                    quantity: line.quantity,
                    unit_price: format_currency(currency, line.unit_price),
                    line_total: format_currency(currency, line.line_total),
                })
                .collect(),
            total: format_currency(currency, receipt.total),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub page: PageContext,
    pub next: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub page: PageContext,
}
