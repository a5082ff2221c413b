use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use bistro_orders::{
    cart::CartEncoding,
    catalog::Catalog,
    config::{DatabaseConfig, OrderSettings, SessionSettings},
    db::create_lazy_pool,
    routes::create_app,
    state::AppState,
};
use tower::ServiceExt;
use tower_sessions::MemoryStore;

// Every test runs against a database that refuses connections, so any
// request that reaches the order store fails as "unavailable".
fn app(settings: OrderSettings) -> Router {
    app_with_session(
        settings,
        SessionSettings {
            secret_key: "test-secret".into(),
            secure_cookie: false,
        },
    )
}

fn app_with_session(settings: OrderSettings, session: SessionSettings) -> Router {
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
    let pool = create_lazy_pool(&config).expect("lazy pool");
    let state = AppState::new(pool, Catalog::bistro_menu(), settings, config.timeout);
    create_app(state, MemoryStore::default(), &session)
}

fn open_settings(cart_encoding: CartEncoding) -> OrderSettings {
    OrderSettings {
        cart_encoding,
        require_login: false,
        ..OrderSettings::default()
    }
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

fn session_cookie(response: &Response) -> String {
    let raw = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .expect("session cookie");
    raw.split(';').next().unwrap().to_string()
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Submit the order form and return the notice shown on the menu afterwards.
async fn order_notice(app: &Router, body: &str) -> String {
    let response = app.clone().oneshot(post_form("/order.html", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/viewMenu.html");

    let cookie = session_cookie(&response);
    let menu = app
        .clone()
        .oneshot(get("/viewMenu.html", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(menu.status(), StatusCode::OK);
    body_text(menu).await
}

#[tokio::test]
async fn health_is_served() {
    let response = app(OrderSettings::default())
        .oneshot(get("/health", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert!(body_text(response).await.contains("\"status\":\"ok\""));
}

#[tokio::test]
async fn static_pages_render() {
    let app = app(OrderSettings::default());
    for path in ["/", "/index.html", "/aboutus.html", "/contactus.html"] {
        let response = app.clone().oneshot(get(path, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{path}");
    }
}

#[tokio::test]
async fn unknown_path_is_not_found() {
    let response = app(OrderSettings::default())
        .oneshot(get("/menu.php", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn menu_lists_catalog_prices() {
    let response = app(open_settings(CartEncoding::Json))
        .oneshot(get("/viewMenu.html", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_text(response).await;
    assert!(body.contains("Chi-Momo"));
    assert!(body.contains("Nrs: 160.00"));
    assert!(body.contains("Keema Noodles"));
}

#[tokio::test]
async fn anonymous_menu_redirects_to_login_when_required() {
    let app = app(OrderSettings::default());
    let response = app.clone().oneshot(get("/viewMenu.html", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login?next=%2FviewMenu.html");

    let cookie = session_cookie(&response);
    let login = app
        .oneshot(get("/auth/login?next=%2FviewMenu.html", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(login.status(), StatusCode::OK);
    let body = body_text(login).await;
    assert!(body.contains("Please log in to access this page."));
    assert!(body.contains("viewMenu.html"));
}

#[tokio::test]
async fn anonymous_order_redirects_to_login_when_required() {
    let response = app(OrderSettings::default())
        .oneshot(post_form("/order.html", "items=Pasta%3D1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login?next=%2Forder.html");
}

#[tokio::test]
async fn session_cookie_secure_flag_follows_settings() {
    for secure_cookie in [false, true] {
        let app = app_with_session(
            OrderSettings::default(),
            SessionSettings {
                secret_key: "test-secret".into(),
                secure_cookie,
            },
        );
        let response = app.oneshot(get("/viewMenu.html", None)).await.unwrap();
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .expect("session cookie");
        assert_eq!(cookie.contains("Secure"), secure_cookie, "{cookie}");
    }
}

#[tokio::test]
async fn order_page_get_goes_back_to_menu() {
    let response = app(open_settings(CartEncoding::Json))
        .oneshot(get("/order.html", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/viewMenu.html");
}

#[tokio::test]
async fn menu_selection_is_priced_into_order_form() {
    let response = app(open_settings(CartEncoding::Encoded))
        .oneshot(post_form("/viewMenu.html", "Pasta=2&Tea=1&Burger=0&Momo="))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_text(response).await;
    assert!(body.contains("Nrs: 240.00"));
    assert!(body.contains("Nrs: 30.00"));
    assert!(body.contains("Total: Nrs: 270.00"));
    assert!(body.contains("name=\"items\""));
    assert!(body.contains("Pasta=2,Tea=1"));
    assert!(!body.contains("Burger"));
}

#[tokio::test]
async fn empty_menu_selection_is_rejected() {
    let app = app(open_settings(CartEncoding::Json));
    let response = app
        .clone()
        .oneshot(post_form("/viewMenu.html", "Pasta=0&Tea=-1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/viewMenu.html");

    let cookie = session_cookie(&response);
    let menu = app.oneshot(get("/viewMenu.html", Some(&cookie))).await.unwrap();
    assert!(body_text(menu).await.contains("Please select at least one item!"));
}

#[tokio::test]
async fn oversized_quantity_is_a_validation_error() {
    let app = app(open_settings(CartEncoding::Encoded));
    let notice = order_notice(
        &app,
        "customer-name=Ada&phone-number=9800000000&customer-address=Thamel&items=Pasta%3D1000000",
    )
    .await;
    assert!(notice.contains("Invalid quantity for Pasta."), "{notice}");
    assert!(!notice.contains("Service temporarily unavailable"));
}

#[tokio::test]
async fn login_failure_redirect_survives_control_characters_in_next() {
    let app = app(OrderSettings::default());
    let response = app
        .oneshot(post_form(
            "/auth/login",
            "username=ada&password=pw&next=%2F%0A%2Fevil.example",
        ))
        .await
        .unwrap();
    // The failed login goes back to the form with the marker percent-encoded.
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login?next=%2F%0A%2Fevil.example");
}

#[tokio::test]
async fn unknown_item_fails_before_the_store() {
    let app = app(open_settings(CartEncoding::Encoded));
    let notice = order_notice(
        &app,
        "customer-name=Ada&phone-number=9800000000&customer-address=Thamel&items=Pizza%3D1",
    )
    .await;
    assert!(notice.contains("is not available"), "{notice}");
    assert!(notice.contains("Pizza"));
    assert!(!notice.contains("Service temporarily unavailable"));
}

#[tokio::test]
async fn missing_customer_details_fail_before_the_store() {
    let app = app(open_settings(CartEncoding::Json));
    let notice = order_notice(
        &app,
        "customer-name=Ada&phone-number=&customer-address=Thamel&items=%7B%22Pasta%22%3A1%7D",
    )
    .await;
    assert!(notice.contains("Please fill in all required fields."), "{notice}");
}

#[tokio::test]
async fn unreachable_store_is_reported_as_unavailable() {
    let app = app(open_settings(CartEncoding::Form));
    let notice = order_notice(
        &app,
        "customer-name=Ada&phone-number=9800000000&customer-address=Thamel&Pasta=2&Tea=1",
    )
    .await;
    assert!(
        notice.contains("Service temporarily unavailable. Please try again later."),
        "{notice}"
    );
}

#[tokio::test]
async fn api_menu_lists_items() {
    let response = app(OrderSettings::default())
        .oneshot(get("/api/menu", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value =
        serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["data"]["currency"], "Nrs");
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 12);
    assert_eq!(body["data"]["items"][0]["name"], "Pasta");
    assert_eq!(body["data"]["items"][0]["unit_price"], "120.00");
}

#[tokio::test]
async fn api_order_requires_login() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/orders")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            r#"{"customer_name":"Ada","phone_number":"9800000000","customer_address":"Thamel","items":{"Pasta":1}}"#,
        ))
        .unwrap();
    let response = app(OrderSettings::default()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn api_order_validation_is_a_bad_request() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/orders")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            r#"{"customer_name":"Ada","phone_number":"9800000000","customer_address":"Thamel","items":{"Pizza":1}}"#,
        ))
        .unwrap();
    let response = app(open_settings(CartEncoding::Json))
        .oneshot(request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: serde_json::Value =
        serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["data"]["error"], "Item 'Pizza' is not available.");
}

#[tokio::test]
async fn api_order_lookup_requires_login() {
    let response = app(open_settings(CartEncoding::Json))
        .oneshot(get("/api/orders/1", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
