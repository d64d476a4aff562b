//! keyward API 서버.
//!
//! 설정을 로드하고 문서 저장소에 연결한 뒤 Axum 서버를 시작합니다.

use std::sync::Arc;

use anyhow::Context;
use keyward_core::{
    init_logging, AppConfig, DatabaseBackend, MemoryDocumentStore, PgDocumentStore, SharedStore,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use keyward_api::auth::TokenService;
use keyward_api::metrics::setup_metrics_recorder;
use keyward_api::server::{create_router, shutdown_signal};
use keyward_api::state::AppState;

/// 설정된 백엔드의 문서 저장소를 생성합니다.
async fn connect_store(config: &AppConfig) -> anyhow::Result<SharedStore> {
    match config.database.backend {
        DatabaseBackend::Postgres => {
            let store = PgDocumentStore::connect(&config.database)
                .await
                .context("failed to connect to the document store")?;
            store
                .ensure_schema()
                .await
                .context("failed to prepare document collections")?;
            Ok(Arc::new(store))
        }
        DatabaseBackend::Memory => {
            warn!("Using in-memory document store, data is lost on restart");
            Ok(Arc::new(MemoryDocumentStore::new()))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    let config = AppConfig::load_default().context("failed to load configuration")?;

    init_logging(config.logging.to_log_config())
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;

    info!("Starting keyward API server...");

    // Prometheus 메트릭 레코더 설정
    let metrics_handle = setup_metrics_recorder().context("failed to install metrics recorder")?;
    info!("Prometheus metrics recorder initialized");

    let store = connect_store(&config).await?;
    info!(backend = store.backend_name(), "Document store ready");

    let token_service = TokenService::new(&config.jwt);
    let state = Arc::new(
        AppState::new(store, token_service, config.database.query_timeout())
            .with_default_roles(config.registration.default_roles.clone())
            .with_metrics(metrics_handle),
    );
    info!(version = %state.version, "Application state initialized");

    let app = create_router(state, &config.server).context("invalid route registry")?;

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(%addr, base_path = %config.server.base_path, "API server listening");

    let shutdown_token = CancellationToken::new();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_token.clone()))
        .await
        .context("server error")?;

    info!("Server stopped gracefully");
    Ok(())
}
