use std::collections::HashMap;

use axum::{
    Form, Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
};
use tower_sessions::Session;

use crate::{
    cart::{self, Cart, CartPayload},
    error::AppResult,
    flash,
    middleware::auth::{MaybeUser, OrderAccess},
    pricing::{self, PricedOrder},
    state::AppState,
    views::{
        AboutTemplate, ContactTemplate, HomeTemplate, MenuTemplate, OrderFormTemplate, PageContext,
    },
};

pub const MENU_PATH: &str = "/viewMenu.html";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/index.html", get(home))
        .route("/aboutus.html", get(about))
        .route("/contactus.html", get(contact))
        .route(MENU_PATH, get(menu).post(preview_order))
}

pub async fn home(session: Session, MaybeUser(user): MaybeUser) -> HomeTemplate {
    HomeTemplate {
        page: PageContext::load(&session, user).await,
    }
}

pub async fn about(session: Session, MaybeUser(user): MaybeUser) -> AboutTemplate {
    AboutTemplate {
        page: PageContext::load(&session, user).await,
    }
}

pub async fn contact(session: Session, MaybeUser(user): MaybeUser) -> ContactTemplate {
    ContactTemplate {
        page: PageContext::load(&session, user).await,
    }
}

pub async fn menu(
    State(state): State<AppState>,
    session: Session,
    OrderAccess(user): OrderAccess,
) -> MenuTemplate {
    let page = PageContext::load(&session, user).await;
    MenuTemplate::new(page, &state.catalog, &state.settings.currency_label)
}

/// Price the menu selection and show the order form. Nothing is stored.
pub async fn preview_order(
    State(state): State<AppState>,
    session: Session,
    OrderAccess(user): OrderAccess,
    Form(fields): Form<HashMap<String, String>>,
) -> Response {
    match priced_selection(&state, fields) {
        Ok((cart, priced)) => {
            let page = PageContext::load(&session, user).await;
            OrderFormTemplate::new(
                page,
                &cart,
                &priced,
                state.settings.cart_encoding,
                &state.settings.currency_label,
            )
            .into_response()
        }
        Err(err) => flash::redirect_with_error(&session, err, MENU_PATH).await,
    }
}

fn priced_selection(
    state: &AppState,
    fields: HashMap<String, String>,
) -> AppResult<(Cart, PricedOrder)> {
    let cart = cart::parse(&CartPayload::Fields(fields), &state.catalog)?;
    let priced = pricing::price(&cart, &state.catalog)?;
    tracing::debug!(lines = cart.len(), total = %priced.total, "menu selection priced");
    Ok((cart, priced))
}
