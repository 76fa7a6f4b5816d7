//! # RPC Flow Tests
//!
//! The gateway's RPC client talking to the real responder handlers over the
//! in-memory bus: correlation under concurrency, timeout bookkeeping, late
//! replies, and reconnection after an outage.
//!
//! Everything here runs below the HTTP layer; the HTTP journeys live in
//! `http_e2e`.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::{json, Value};
    use tokio::time::sleep;

    use ng_auth_service::{AuthHandler, InMemoryUserStore};
    use ng_customers_service::{CustomersHandler, InMemoryCustomerStore};
    use ng_gateway::config::RpcConfig;
    use ng_gateway::{CallError, RpcClient};
    use ng_products_service::{InMemoryProductStore, ProductsHandler};
    use shared_auth::TokenService;
    use shared_bus::{responder, BusTransport, InMemoryBus, SubjectHandler};
    use shared_types::{subjects, AuthReply, ErrorKind, ReplyError};

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    fn rpc_config(timeout: Duration) -> RpcConfig {
        RpcConfig {
            call_timeout: timeout,
            max_reconnects: 2,
            reconnect_wait: Duration::from_millis(5),
            fail_fast: false,
            sweep_interval: Duration::from_secs(30),
        }
    }

    fn client(bus: &Arc<InMemoryBus>, timeout: Duration) -> RpcClient {
        RpcClient::new(Arc::clone(bus) as Arc<dyn BusTransport>, rpc_config(timeout))
    }

    fn token_service() -> Arc<TokenService> {
        Arc::new(TokenService::new(
            b"rpc-flow-secret",
            Duration::from_secs(600),
        ))
    }

    fn auth_handler(tokens: &Arc<TokenService>) -> Arc<dyn SubjectHandler> {
        Arc::new(AuthHandler::new(
            Arc::new(InMemoryUserStore::new()),
            Arc::clone(tokens),
        ))
    }

    fn products_handler(store: InMemoryProductStore) -> Arc<dyn SubjectHandler> {
        Arc::new(ProductsHandler::new(Arc::new(store)))
    }

    fn customers_handler() -> Arc<dyn SubjectHandler> {
        Arc::new(CustomersHandler::new(Arc::new(InMemoryCustomerStore::new())))
    }

    /// Spawn one responder on its own connection and wait until all of its
    /// subjects are subscribed.
    async fn start_responder(bus: &Arc<InMemoryBus>, handler: Arc<dyn SubjectHandler>) {
        let target = bus.subscriber_count() + handler.subjects().len();
        let conn = bus.connect().await.unwrap();
        tokio::spawn(responder::serve(conn, handler));
        while bus.subscriber_count() < target {
            sleep(Duration::from_millis(1)).await;
        }
    }

    /// Echoes its payload after a fixed delay. Stands in for a responder
    /// that answers too late.
    struct SlowEcho {
        delay: Duration,
    }

    #[async_trait]
    impl SubjectHandler for SlowEcho {
        fn subjects(&self) -> &[&str] {
            &["slow.echo"]
        }

        async fn handle(&self, _subject: &str, data: Value) -> Result<Value, ReplyError> {
            sleep(self.delay).await;
            Ok(data)
        }
    }

    // =========================================================================
    // INTEGRATION TESTS: CLIENT AND RESPONDERS
    // =========================================================================

    /// One register/login round through the real auth responder, ending in a
    /// token the verifying side accepts.
    #[tokio::test]
    async fn test_register_then_login_issues_a_verifiable_token() {
        let bus = Arc::new(InMemoryBus::new());
        let tokens = token_service();
        start_responder(&bus, auth_handler(&tokens)).await;
        let client = client(&bus, Duration::from_secs(5));

        let reply: AuthReply = serde_json::from_value(
            client
                .call(
                    subjects::AUTH_REGISTER,
                    json!({
                        "username": "kay",
                        "email": "kay@example.com",
                        "password": "orange-crate-44",
                    }),
                    None,
                )
                .await
                .unwrap(),
        )
        .unwrap();
        assert_eq!(reply, AuthReply::accepted("Created the new user"));

        let reply: AuthReply = serde_json::from_value(
            client
                .call(
                    subjects::AUTH_LOGIN,
                    json!({ "email": "kay@example.com", "password": "orange-crate-44" }),
                    None,
                )
                .await
                .unwrap(),
        )
        .unwrap();
        let AuthReply::Granted { token } = reply else {
            panic!("expected a granted login, got {reply:?}");
        };
        assert_eq!(tokens.verify(&token).unwrap().sub, "kay@example.com");
    }

    /// A responder's error envelope comes back as a rejection with the kind
    /// and message intact.
    #[tokio::test]
    async fn test_find_one_rejection_carries_kind_and_message() {
        let bus = Arc::new(InMemoryBus::new());
        start_responder(&bus, products_handler(InMemoryProductStore::new())).await;
        let client = client(&bus, Duration::from_secs(1));

        let err = client
            .call(subjects::PRODUCTS_FIND_ONE, json!(42), None)
            .await
            .unwrap_err();
        match err {
            CallError::Rejected(reply) => {
                assert_eq!(reply.kind, ErrorKind::NotFound);
                assert_eq!(reply.message, "no product with id 42");
            }
            other => panic!("expected a rejection, got {other:?}"),
        }
    }

    /// Concurrent calls against two different responders each resolve to the
    /// reply for their own request.
    #[tokio::test]
    async fn test_interleaved_calls_resolve_to_their_own_replies() {
        let bus = Arc::new(InMemoryBus::new());
        start_responder(&bus, products_handler(InMemoryProductStore::new())).await;
        start_responder(&bus, customers_handler()).await;
        let client = Arc::new(client(&bus, Duration::from_secs(5)));

        let mut tasks = Vec::new();
        for i in 0..8u32 {
            let client = Arc::clone(&client);
            tasks.push(tokio::spawn(async move {
                if i % 2 == 0 {
                    let reply = client
                        .call(
                            subjects::PRODUCTS_CREATE,
                            json!({
                                "product_name": format!("Gadget {i}"),
                                "unit_price": 2.5,
                                "units_in_stock": 10,
                            }),
                            None,
                        )
                        .await
                        .unwrap();
                    assert_eq!(reply["product_name"], format!("Gadget {i}"));
                } else {
                    let reply = client
                        .call(
                            subjects::CUSTOMERS_CREATE,
                            json!({
                                "customer_id": format!("C{i:03}"),
                                "contact_name": format!("Contact {i}"),
                            }),
                            None,
                        )
                        .await
                        .unwrap();
                    assert_eq!(reply["customer_id"], format!("C{i:03}"));
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(client.pending_count(), 0);
        assert_eq!(client.stats().completed, 8);
    }

    /// A subject nobody answers costs exactly the deadline, and the pending
    /// entry is gone afterwards.
    #[tokio::test]
    async fn test_unanswered_subject_times_out_and_clears_the_pending_call() {
        let bus = Arc::new(InMemoryBus::new());
        let tokens = token_service();
        // Auth is up, products is not; the products subject has no subscriber.
        start_responder(&bus, auth_handler(&tokens)).await;
        let client = client(&bus, Duration::from_millis(50));

        let err = client
            .call(subjects::PRODUCTS_FIND_ALL, json!({}), None)
            .await
            .unwrap_err();
        match err {
            CallError::Timeout { subject, .. } => {
                assert_eq!(subject, subjects::PRODUCTS_FIND_ALL);
            }
            other => panic!("expected a timeout, got {other:?}"),
        }
        assert_eq!(client.pending_count(), 0);
        assert_eq!(client.stats().cancelled, 1);
    }

    /// A reply that lands after the deadline is dropped; the same responder
    /// still serves a patient caller afterwards.
    #[tokio::test]
    async fn test_reply_after_the_deadline_is_dropped() {
        let bus = Arc::new(InMemoryBus::new());
        start_responder(
            &bus,
            Arc::new(SlowEcho {
                delay: Duration::from_millis(100),
            }),
        )
        .await;
        let client = client(&bus, Duration::from_millis(25));

        let err = client.call("slow.echo", json!("first"), None).await.unwrap_err();
        assert!(matches!(err, CallError::Timeout { .. }));

        // Give the late reply time to land; it must not resurrect the call.
        sleep(Duration::from_millis(150)).await;
        assert_eq!(client.stats().completed, 0);
        assert_eq!(client.pending_count(), 0);

        let reply = client
            .call("slow.echo", json!("second"), Some(Duration::from_secs(2)))
            .await
            .unwrap();
        assert_eq!(reply, json!("second"));
    }

    /// Severing every connection mid-life does not strand the client: the
    /// next call reconnects and succeeds once a responder is back.
    #[tokio::test]
    async fn test_client_reconnects_after_the_bus_severs_everything() {
        let bus = Arc::new(InMemoryBus::new());
        start_responder(&bus, products_handler(InMemoryProductStore::seeded())).await;
        let client = client(&bus, Duration::from_secs(2));

        let reply = client
            .call(subjects::PRODUCTS_FIND_ALL, json!({}), None)
            .await
            .unwrap();
        assert_eq!(reply["total"], 8);

        bus.sever_all();
        start_responder(&bus, products_handler(InMemoryProductStore::seeded())).await;

        let reply = client
            .call(subjects::PRODUCTS_FIND_ALL, json!({}), None)
            .await
            .unwrap();
        assert_eq!(reply["total"], 8);
        assert_eq!(client.stats().completed, 2);
    }
}
