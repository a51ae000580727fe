use axum::{routing::{get, post}, Router};
use media_billing_recon::{api, AppConfig, ReconciliationService};
use std::sync::Arc;
use tower::ServiceBuilder;
use tracing::info;
use tracing_subscriber::{fmt::time::ChronoLocal, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志 - 本地时间格式，RUST_LOG 控制级别 (默认 info)
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // 加载配置
    let config = AppConfig::from_env()?;
    info!("Starting server with config: {:?}", config);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Mapping folder: {}", config.storage.mapping_dir);
    info!("Report folder: {}", config.storage.report_dir);

    let service = Arc::new(ReconciliationService::new(config));

    // 构建路由
    let app = Router::new()
        .route("/health", get(api::health_check))
        .route("/api/reconcile", post(api::reconcile))
        .route("/api/vendor-scores", get(api::vendor_scores))
        .with_state(service)
        .layer(ServiceBuilder::new());

    // 启动服务器
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  POST /api/reconcile        - reconcile one extracted invoice");
    info!("  GET  /api/vendor-scores    - vendor scores from saved reports");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
