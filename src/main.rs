use gst_return_rust::{api, create_pool, ensure_schema, AppConfig, AppState, MemoryStore, PgStore, RecordStore};
use std::sync::Arc;
use tower::ServiceBuilder;
use tracing::{info, warn};
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志 - 使用本地时间格式
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();

    // 加载配置
    let config = AppConfig::load()?;
    info!(
        "Starting server on {}:{} (home state {})",
        config.server.host, config.server.port, config.filing.home_state_code
    );

    // 记录存储: 配置了数据库则用 Postgres, 否则用内存
    let store: Arc<dyn RecordStore> = match &config.database.url {
        Some(url) => {
            let pool = create_pool(url, config.database.max_connections).await?;
            ensure_schema(&pool).await?;
            info!("Database pool created");
            Arc::new(PgStore::new(pool))
        }
        None => {
            warn!("No database configured, records are kept in memory only");
            Arc::new(MemoryStore::new())
        }
    };

    let state = AppState::new(store, &config);
    let app = api::router(state).layer(ServiceBuilder::new());

    // 启动服务器
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  /api/gstr1/{{b2b,b2cs,hsn,documents,nil-rated,summary}}");
    info!("  /api/gstr3b, /api/gstr3b/{{outward,itc,payment}}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
