//! # HTTP End-to-End Tests
//!
//! Full journeys through the gateway router with the real responders on the
//! other side of the in-memory bus: register, login, bearer-guarded CRUD,
//! and the failure mapping when the backends are silent or gone.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use axum::Router;
    use serde_json::{json, Value};
    use tokio::time::sleep;
    use tower::ServiceExt;

    use ng_auth_service::{AuthHandler, InMemoryUserStore};
    use ng_customers_service::{CustomersHandler, InMemoryCustomerStore};
    use ng_gateway::{GatewayConfig, GatewayService};
    use ng_products_service::{InMemoryProductStore, ProductsHandler};
    use shared_auth::TokenService;
    use shared_bus::{responder, BusTransport, InMemoryBus, SubjectHandler};

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    fn test_config() -> GatewayConfig {
        let mut config = GatewayConfig::default();
        config.auth.jwt_secret = "e2e-http-secret".to_string();
        config.rpc.call_timeout = Duration::from_secs(5);
        config.rpc.reconnect_wait = Duration::from_millis(5);
        config
    }

    /// Spawn the three responders on the bus and wait for their
    /// subscriptions to land.
    async fn start_backends(bus: &Arc<InMemoryBus>, tokens: Arc<TokenService>) {
        let handlers: [Arc<dyn SubjectHandler>; 3] = [
            Arc::new(AuthHandler::new(Arc::new(InMemoryUserStore::new()), tokens)),
            Arc::new(ProductsHandler::new(Arc::new(InMemoryProductStore::new()))),
            Arc::new(CustomersHandler::new(Arc::new(InMemoryCustomerStore::new()))),
        ];
        let target = bus.subscriber_count()
            + handlers.iter().map(|h| h.subjects().len()).sum::<usize>();
        for handler in handlers {
            let conn = bus.connect().await.unwrap();
            tokio::spawn(responder::serve(conn, handler));
        }
        while bus.subscriber_count() < target {
            sleep(Duration::from_millis(1)).await;
        }
    }

    /// A router wired to a fresh bus with all three responders running.
    async fn stack() -> (Router, Arc<InMemoryBus>, Arc<TokenService>) {
        let bus = Arc::new(InMemoryBus::new());
        let service =
            GatewayService::new(test_config(), Arc::clone(&bus) as Arc<dyn BusTransport>).unwrap();
        let tokens = service.tokens();
        start_backends(&bus, Arc::clone(&tokens)).await;
        (service.router(), bus, tokens)
    }

    fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        match body {
            Some(payload) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn read(response: Response) -> (StatusCode, Value) {
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        read(app.clone().oneshot(request).await.unwrap()).await
    }

    // =========================================================================
    // E2E TESTS: AUTH JOURNEY
    // =========================================================================

    /// Register, log in, and browse the catalog with the token from login.
    #[tokio::test]
    async fn test_register_login_and_list_products() {
        let (app, _bus, _tokens) = stack().await;

        let (status, body) = send(
            &app,
            request(
                "POST",
                "/auth/register",
                None,
                Some(json!({
                    "username": "maria",
                    "email": "maria@example.com",
                    "password": "correct-horse",
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Created the new user");

        // Login: the raw response carries the session cookie.
        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/auth/login",
                None,
                Some(json!({
                    "email": "maria@example.com",
                    "password": "correct-horse",
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .expect("login sets the session cookie")
            .to_str()
            .unwrap()
            .to_owned();
        let (_, body) = read(response).await;
        let token = body["token"].as_str().expect("token in the body").to_owned();
        assert_eq!(cookie, format!("cookie={token}; Path=/"));

        let (status, body) = send(&app, request("GET", "/products/findAll", Some(&token), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 0);
        assert_eq!(body["page"], 1);
        assert_eq!(body["limit"], 20);
        assert_eq!(body["data"], json!([]));
    }

    /// Registering the same email twice is a conflict with the responder's
    /// message passed through verbatim.
    #[tokio::test]
    async fn test_duplicate_registration_conflicts() {
        let (app, _bus, _tokens) = stack().await;
        let payload = json!({
            "username": "sam",
            "email": "sam@example.com",
            "password": "pw-123456",
        });

        let (status, _) = send(&app, request("POST", "/auth/register", None, Some(payload.clone()))).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, request("POST", "/auth/register", None, Some(payload))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "This user with the current email already exists!");
    }

    /// A wrong password and an unknown email produce the same 401 body.
    #[tokio::test]
    async fn test_failed_logins_share_one_error_message() {
        let (app, _bus, _tokens) = stack().await;

        let (status, _) = send(
            &app,
            request(
                "POST",
                "/auth/register",
                None,
                Some(json!({
                    "username": "sam",
                    "email": "sam@example.com",
                    "password": "pw-123456",
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        for payload in [
            json!({ "email": "sam@example.com", "password": "wrong" }),
            json!({ "email": "nobody@example.com", "password": "wrong" }),
        ] {
            let (status, body) = send(&app, request("POST", "/auth/login", None, Some(payload))).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body["error"], "Invalid user email or password");
        }
    }

    /// The bearer guard turns away missing, malformed, and foreign tokens,
    /// and admits one minted with the gateway's own secret.
    #[tokio::test]
    async fn test_bearer_guard_rejects_bad_tokens() {
        let (app, _bus, tokens) = stack().await;

        let response = app
            .clone()
            .oneshot(request("GET", "/customers/findAll", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );

        let (status, _) = send(&app, request("GET", "/customers/findAll", Some("garbage"), None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let foreign = TokenService::new(b"some-other-secret", Duration::from_secs(600))
            .issue("eve@example.com")
            .unwrap();
        let (status, body) = send(&app, request("GET", "/customers/findAll", Some(&foreign), None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "invalid token signature");

        let own = tokens.issue("ok@example.com").unwrap();
        let (status, _) = send(&app, request("GET", "/customers/findAll", Some(&own), None)).await;
        assert_eq!(status, StatusCode::OK);
    }

    // =========================================================================
    // E2E TESTS: PRODUCTS AND CUSTOMERS
    // =========================================================================

    #[tokio::test]
    async fn test_product_crud_through_the_gateway() {
        let (app, _bus, tokens) = stack().await;
        let token = tokens.issue("crud@example.com").unwrap();

        let (status, created) = send(
            &app,
            request(
                "POST",
                "/products/create",
                Some(&token),
                Some(json!({
                    "product_name": "Chai",
                    "unit_price": 18.0,
                    "units_in_stock": 39,
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["product_id"], 1);
        assert_eq!(created["product_name"], "Chai");

        let (status, fetched) = send(&app, request("GET", "/products/1", Some(&token), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);

        let (status, updated) = send(
            &app,
            request(
                "PATCH",
                "/products/1",
                Some(&token),
                Some(json!({ "unit_price": 19.5 })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["unit_price"], 19.5);
        assert_eq!(updated["units_in_stock"], 39);

        let (status, body) = send(&app, request("GET", "/products/999", Some(&token), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "no product with id 999");
    }

    /// Fill the catalog past two pages and read the last one.
    #[tokio::test]
    async fn test_product_listing_paginates() {
        let (app, _bus, tokens) = stack().await;
        let token = tokens.issue("pager@example.com").unwrap();

        for i in 1..=45 {
            let (status, _) = send(
                &app,
                request(
                    "POST",
                    "/products/create",
                    Some(&token),
                    Some(json!({
                        "product_name": format!("Item {i:02}"),
                        "unit_price": f64::from(i),
                        "units_in_stock": i,
                    })),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, body) = send(
            &app,
            request("GET", "/products/findAll?page=3&limit=20", Some(&token), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 45);
        assert_eq!(body["pages"], 3);
        assert_eq!(body["page"], 3);
        assert_eq!(body["data"].as_array().unwrap().len(), 5);
        assert_eq!(body["data"][0]["product_id"], 41);
    }

    /// Create, patch, delete; the delete returns the removed record and the
    /// id is gone afterwards.
    #[tokio::test]
    async fn test_customer_lifecycle_including_delete() {
        let (app, _bus, tokens) = stack().await;
        let token = tokens.issue("crm@example.com").unwrap();

        let (status, created) = send(
            &app,
            request(
                "POST",
                "/customers/create",
                Some(&token),
                Some(json!({
                    "customer_id": "ALFKI",
                    "contact_name": "Maria Anders",
                    "city": "Berlin",
                    "country": "Germany",
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["customer_id"], "ALFKI");

        let (status, body) = send(
            &app,
            request(
                "PATCH",
                "/customers/update/ALFKI",
                Some(&token),
                Some(json!({ "city": "Potsdam" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["city"], "Potsdam");
        assert_eq!(body["contact_name"], "Maria Anders");

        let (status, removed) = send(
            &app,
            request("DELETE", "/customers/delete/ALFKI", Some(&token), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(removed["customer_id"], "ALFKI");
        assert_eq!(removed["city"], "Potsdam");

        let (status, _) = send(
            &app,
            request("DELETE", "/customers/delete/ALFKI", Some(&token), None),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, request("GET", "/customers/ALFKI", Some(&token), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_duplicate_customer_id_conflicts() {
        let (app, _bus, tokens) = stack().await;
        let token = tokens.issue("dup@example.com").unwrap();
        let payload = json!({ "customer_id": "ALFKI", "contact_name": "Maria Anders" });

        let (status, _) = send(
            &app,
            request("POST", "/customers/create", Some(&token), Some(payload.clone())),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(
            &app,
            request("POST", "/customers/create", Some(&token), Some(payload)),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "a customer with id ALFKI already exists");
    }

    // =========================================================================
    // E2E TESTS: FAILURE MAPPING
    // =========================================================================

    /// No responder on the subject: the request costs the deadline and comes
    /// back as 504.
    #[tokio::test]
    async fn test_a_silent_backend_maps_to_gateway_timeout() {
        let bus = Arc::new(InMemoryBus::new());
        let mut config = test_config();
        config.rpc.call_timeout = Duration::from_millis(50);
        let service =
            GatewayService::new(config, Arc::clone(&bus) as Arc<dyn BusTransport>).unwrap();
        let app = service.router();
        let token = service.tokens().issue("waiting@example.com").unwrap();

        let (status, body) = send(&app, request("GET", "/products/findAll", Some(&token), None)).await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert!(body["error"].as_str().unwrap().contains("timed out"));
    }

    /// With fail-fast on, a dead connection maps to 502 without waiting out
    /// the deadline.
    #[tokio::test]
    async fn test_fail_fast_maps_an_outage_to_bad_gateway() {
        let bus = Arc::new(InMemoryBus::new());
        let mut config = test_config();
        config.rpc.fail_fast = true;
        let service =
            GatewayService::new(config, Arc::clone(&bus) as Arc<dyn BusTransport>).unwrap();
        let tokens = service.tokens();
        start_backends(&bus, Arc::clone(&tokens)).await;
        let app = service.router();
        let token = tokens.issue("ff@example.com").unwrap();

        // Healthy first: this call opens the gateway's bus connection.
        let (status, _) = send(&app, request("GET", "/customers/findAll", Some(&token), None)).await;
        assert_eq!(status, StatusCode::OK);

        bus.sever_all();
        let (status, body) = send(&app, request("GET", "/customers/findAll", Some(&token), None)).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["error"].as_str().unwrap().contains("unavailable"));
    }

    /// After an outage, the next request reconnects and succeeds once the
    /// responders are back.
    #[tokio::test]
    async fn test_gateway_recovers_when_the_backends_come_back() {
        let (app, bus, tokens) = stack().await;
        let token = tokens.issue("ops@example.com").unwrap();

        let (status, _) = send(&app, request("GET", "/customers/findAll", Some(&token), None)).await;
        assert_eq!(status, StatusCode::OK);

        bus.sever_all();
        start_backends(&bus, Arc::clone(&tokens)).await;

        let (status, body) = send(&app, request("GET", "/customers/findAll", Some(&token), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 0);
    }
}
