use std::collections::HashMap;

use axum::{
    Form, Router,
    extract::State,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use tower_sessions::Session;

use crate::{
    cart::CartPayload,
    dto::orders::OrderReceipt,
    error::AppResult,
    flash,
    middleware::auth::{CurrentUser, OrderAccess},
    models::CustomerInfo,
    routes::pages::MENU_PATH,
    services::order_service::submit_order,
    state::AppState,
    views::{OrderSummaryTemplate, PageContext},
};

pub const ORDER_PATH: &str = "/order.html";

pub fn router() -> Router<AppState> {
    Router::new().route(ORDER_PATH, get(order_form).post(place_order))
}

/// The order form only exists as the answer to a menu submission.
pub async fn order_form(OrderAccess(_): OrderAccess) -> Redirect {
    Redirect::to(MENU_PATH)
}

pub async fn place_order(
    State(state): State<AppState>,
    session: Session,
    OrderAccess(user): OrderAccess,
    Form(fields): Form<HashMap<String, String>>,
) -> Response {
    match submit_form(&state, fields, user.as_ref()).await {
        Ok(receipt) => {
            let page = PageContext::load(&session, user).await;
            OrderSummaryTemplate::new(page, &receipt, &state.settings.currency_label)
                .into_response()
        }
        Err(err) => flash::redirect_with_error(&session, err, MENU_PATH).await,
    }
}

async fn submit_form(
    state: &AppState,
    fields: HashMap<String, String>,
    user: Option<&CurrentUser>,
) -> AppResult<OrderReceipt> {
    let customer = CustomerInfo::from_form(&fields)?;
    let payload = CartPayload::from_form(state.settings.cart_encoding, fields);
    submit_order(state, customer, &payload, user).await
}
