use utoipa::{
    Modify, OpenApi,
    openapi::{
        self, OpenApi as OpenApiSpec,
        security::{ApiKey, ApiKeyValue, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    catalog::CatalogEntry,
    dto::orders::{CreateOrderRequest, MenuList, OrderReceipt, OrderWithItems, ReceiptLine},
    middleware::session::SESSION_COOKIE_NAME,
    models::{CustomerInfo, Order, OrderItem},
    response::ApiResponse,
    routes::{api, health},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "session_cookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(SESSION_COOKIE_NAME))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        health::readiness,
        api::menu,
        api::create_order,
        api::get_order
    ),
    components(
        schemas(
            CatalogEntry,
            CustomerInfo,
            Order,
            OrderItem,
            CreateOrderRequest,
            MenuList,
            OrderReceipt,
            ReceiptLine,
            OrderWithItems,
            health::HealthData,
            ApiResponse<MenuList>,
            ApiResponse<OrderReceipt>,
            ApiResponse<OrderWithItems>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and readiness"),
        (name = "Menu", description = "Catalog of orderable items"),
        (name = "Orders", description = "Order submission and lookup"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
