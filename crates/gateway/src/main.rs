//! Gateway entry point.

use std::sync::Arc;

use common::ServiceConfig;

#[tokio::main]
async fn main() {
    // 1. Configuration and tracing
    let config = ServiceConfig::from_env(8080);
    common::telemetry::init(&config);

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Peer service clients
    let gateway = gateway::remote_gateway(&config);
    tracing::info!(
        account_url = %config.account_url,
        catalog_url = %config.catalog_url,
        order_url = %config.order_url,
        timeout_ms = gateway.deadline().as_millis() as u64,
        "peer services configured"
    );

    // 4. Build the application and serve
    let app = gateway::create_app(Arc::new(gateway), metrics_handle);
    common::http::serve(app, &config.addr())
        .await
        .expect("server error");
}
