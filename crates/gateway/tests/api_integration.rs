//! Integration tests for the gateway, wired to in-process services.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use account::{Account, AccountApi, AccountService, InMemoryAccountRepository};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use catalog::{CatalogApi, CatalogService, InMemoryProductRepository, NewProduct};
use common::{AccountId, OrderId, Pagination, ServiceError};
use gateway::Gateway;
use metrics_exporter_prometheus::PrometheusHandle;
use order::{InMemoryOrderRepository, Order, OrderAggregator, OrderApi, RequestedLine};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            metrics_exporter_prometheus::PrometheusBuilder::new()
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

/// How the stand-in order service behaves for account lookups.
#[derive(Clone, Copy)]
enum OrdersMode {
    Fail,
    Hang,
}

/// Order service stand-in that fails or never answers per-account reads.
struct BrokenOrders {
    mode: OrdersMode,
    calls: AtomicUsize,
}

impl BrokenOrders {
    fn new(mode: OrdersMode) -> Arc<Self> {
        Arc::new(Self {
            mode,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl OrderApi for BrokenOrders {
    async fn create_order(
        &self,
        _account_id: AccountId,
        _lines: Vec<RequestedLine>,
    ) -> Result<Order, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ServiceError::Unavailable("order service down".into()))
    }

    async fn get_order(&self, id: &OrderId) -> Result<Order, ServiceError> {
        Err(ServiceError::not_found("order", id))
    }

    async fn get_orders_for_account(
        &self,
        _account_id: &AccountId,
    ) -> Result<Vec<Order>, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            OrdersMode::Fail => Err(ServiceError::Unavailable("order service down".into())),
            OrdersMode::Hang => {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(Vec::new())
            }
        }
    }

    async fn list_orders(&self, _page: Pagination) -> Result<Vec<Order>, ServiceError> {
        Ok(Vec::new())
    }
}

struct Services {
    accounts: Arc<AccountService<InMemoryAccountRepository>>,
    catalog: Arc<CatalogService<InMemoryProductRepository>>,
}

impl Services {
    fn new() -> Self {
        Self {
            accounts: Arc::new(AccountService::new(InMemoryAccountRepository::new())),
            catalog: Arc::new(CatalogService::new(InMemoryProductRepository::new())),
        }
    }

    fn aggregator(&self) -> Arc<dyn OrderApi> {
        Arc::new(OrderAggregator::new(
            InMemoryOrderRepository::new(),
            self.accounts.clone(),
            self.catalog.clone(),
        ))
    }

    fn app(&self, orders: Arc<dyn OrderApi>, deadline: Duration) -> axum::Router {
        let gateway = Gateway::new(
            self.accounts.clone(),
            self.catalog.clone(),
            orders,
            deadline,
        );
        gateway::create_app(Arc::new(gateway), get_metrics_handle())
    }

    async fn account(&self, name: &str) -> Account {
        self.accounts.create_account(name.into()).await.unwrap()
    }
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

#[tokio::test]
async fn test_account_with_orders_end_to_end() {
    let services = Services::new();
    let app = services.app(services.aggregator(), Duration::from_secs(3));
    let alice = services.account("Alice").await;

    let mut product_ids = Vec::new();
    for (name, price) in [("Widget", "9.99"), ("Gadget", "4.50")] {
        let response = app
            .clone()
            .oneshot(post_json(
                "/products",
                serde_json::json!({ "name": name, "description": "", "price": price }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        product_ids.push(body_json(response).await["id"].as_str().unwrap().to_string());
    }

    let response = app
        .clone()
        .oneshot(post_json(
            "/orders",
            serde_json::json!({
                "account_id": alice.id.as_str(),
                "products": [
                    { "id": product_ids[0], "quantity": 2 },
                    { "id": product_ids[1], "quantity": 1 },
                ],
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["total_price"], "24.48");

    let response = app
        .oneshot(get(&format!("/accounts?id={}", alice.id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json.get("errors").is_none());
    let account = &json["data"][0];
    assert_eq!(account["name"], "Alice");
    let orders = account["orders"].as_array().unwrap();
    assert_eq!(orders.len(), 1);
    let names: Vec<_> = orders[0]["line_items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Widget", "Gadget"]);
}

#[tokio::test]
async fn test_failed_orders_call_becomes_field_error() {
    let services = Services::new();
    let alice = services.account("Alice").await;
    let app = services.app(BrokenOrders::new(OrdersMode::Fail), Duration::from_secs(3));

    let response = app
        .oneshot(get(&format!("/accounts/{}", alice.id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["name"], "Alice");
    assert!(json["data"]["orders"].is_null());
    assert_eq!(json["errors"][0]["path"], "account.orders");
    assert_eq!(json["errors"][0]["kind"], "unavailable");
}

#[tokio::test]
async fn test_every_account_gets_its_own_orders_call_and_error_slot() {
    let services = Services::new();
    for name in ["Alice", "Bob", "Carol"] {
        services.account(name).await;
    }
    let orders = BrokenOrders::new(OrdersMode::Fail);
    let app = services.app(orders.clone(), Duration::from_secs(3));

    let response = app.oneshot(get("/accounts")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 3);
    let paths: Vec<_> = json["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["path"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        paths,
        vec!["accounts[0].orders", "accounts[1].orders", "accounts[2].orders"]
    );
    assert_eq!(orders.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_slow_orders_call_times_out_concurrently() {
    let services = Services::new();
    for name in ["Alice", "Bob"] {
        services.account(name).await;
    }
    let app = services.app(BrokenOrders::new(OrdersMode::Hang), Duration::from_millis(100));

    let started = std::time::Instant::now();
    let response = app.oneshot(get("/accounts?skip=0&take=10")).await.unwrap();
    // both lookups share one deadline window rather than adding up
    assert!(started.elapsed() < Duration::from_secs(2));

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let errors = json["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().all(|e| e["kind"] == "unavailable"));
    assert!(
        errors[0]["message"]
            .as_str()
            .unwrap()
            .contains("deadline exceeded")
    );
}

#[tokio::test]
async fn test_missing_root_account_fails_whole_request() {
    let services = Services::new();
    let app = services.app(services.aggregator(), Duration::from_secs(3));

    let response = app.oneshot(get("/accounts/ghost")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"]["kind"], "not_found");
    assert!(json.get("data").is_none());
}

#[tokio::test]
async fn test_invalid_order_is_rejected_before_any_call() {
    let services = Services::new();
    let alice = services.account("Alice").await;
    let orders = BrokenOrders::new(OrdersMode::Fail);
    let app = services.app(orders.clone(), Duration::from_secs(3));

    for products in [
        serde_json::json!([]),
        serde_json::json!([{ "id": "P1", "quantity": 0 }]),
        serde_json::json!([{ "id": "P1", "quantity": -4 }]),
    ] {
        let response = app
            .clone()
            .oneshot(post_json(
                "/orders",
                serde_json::json!({ "account_id": alice.id.as_str(), "products": products }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
    assert_eq!(orders.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_product_mutation_validation() {
    let services = Services::new();
    let app = services.app(services.aggregator(), Duration::from_secs(3));

    for body in [
        serde_json::json!({ "name": "", "price": "1.00" }),
        serde_json::json!({ "name": "Widget", "price": "-0.01" }),
    ] {
        let response = app.clone().oneshot(post_json("/products", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
    assert_eq!(services.catalog.repository().product_count().await, 0);

    let response = app
        .oneshot(post_json("/accounts", serde_json::json!({ "name": "  " })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_product_queries_pick_one_selector() {
    let services = Services::new();
    let widget = services
        .catalog
        .create_product(NewProduct {
            name: "Blue Widget".into(),
            description: String::new(),
            price: "1.00".parse().unwrap(),
        })
        .await
        .unwrap();
    services
        .catalog
        .create_product(NewProduct {
            name: "Red Gadget".into(),
            description: String::new(),
            price: "2.00".parse().unwrap(),
        })
        .await
        .unwrap();
    let app = services.app(services.aggregator(), Duration::from_secs(3));

    // id wins over query
    let response = app
        .clone()
        .oneshot(get(&format!("/products?id={}&query=gadget", widget.id)))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["name"], "Blue Widget");

    let response = app
        .clone()
        .oneshot(get("/products?query=gadget"))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json[0]["name"], "Red Gadget");

    let response = app
        .clone()
        .oneshot(get(&format!("/products?ids={},unknown", widget.id)))
        .await
        .unwrap();
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 1);

    let response = app.oneshot(get("/products")).await.unwrap();
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let services = Services::new();
    let app = services.app(services.aggregator(), Duration::from_secs(3));

    let response = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_health_check() {
    let services = Services::new();
    let app = services.app(services.aggregator(), Duration::from_secs(3));

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
}
