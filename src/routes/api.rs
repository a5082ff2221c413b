use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};

use crate::{
    cart::CartPayload,
    dto::orders::{CreateOrderRequest, MenuList, OrderReceipt, OrderWithItems},
    error::{AppError, AppResult},
    middleware::auth::{MaybeUser, OrderAccess},
    response::ApiResponse,
    services::order_service::{OrderStore, submit_order},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/menu", get(menu))
        .route("/orders", post(create_order))
        .route("/orders/{id}", get(get_order))
}

#[utoipa::path(
    get,
    path = "/api/menu",
    responses(
        (status = 200, description = "Menu items and prices", body = ApiResponse<MenuList>)
    ),
    tag = "Menu"
)]
pub async fn menu(State(state): State<AppState>) -> Json<ApiResponse<MenuList>> {
    let data = MenuList {
        currency: state.settings.currency_label.clone(),
        items: state.catalog.entries().to_vec(),
    };
    Json(ApiResponse::success("OK", data))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order placed", body = ApiResponse<OrderReceipt>),
        (status = 400, description = "Invalid cart or customer details"),
        (status = 401, description = "Login required"),
        (status = 503, description = "Order store unavailable")
    ),
    security(("session_cookie" = [])),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    OrderAccess(user): OrderAccess,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<OrderReceipt>>)> {
    let customer = payload.customer()?;
    let cart = CartPayload::Structured(payload.items);
    let receipt = submit_order(&state, customer, &cart, user.as_ref()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Order placed", receipt)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = i64, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order with its items", body = ApiResponse<OrderWithItems>),
        (status = 401, description = "Login required"),
        (status = 404, description = "No such order for this user")
    ),
    security(("session_cookie" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let user = user.ok_or(AppError::Unauthorized)?;

    let order = OrderStore::new(&state.orm, state.db_timeout)
        .find_order(id)
        .await?
        .filter(|found| found.order.user_id == Some(user.id))
        .ok_or(AppError::NotFound)?;

    Ok(Json(ApiResponse::success("OK", order)))
}
