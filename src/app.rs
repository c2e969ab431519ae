use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::info;

use dispatch_api::auth::AuthConfig;
use dispatch_api::{create_routes, AppState};
use dispatch_core::AppConfig;
use dispatch_engine::{DispatchService, HttpRankingOracle};
use dispatch_infrastructure::DatabaseManager;

/// 主应用程序
pub struct Application {
    config: AppConfig,
    state: AppState,
    db: Arc<DatabaseManager>,
}

impl Application {
    /// 创建新的应用实例：建立数据库连接，装配仓储、排序服务与调度服务
    pub async fn new(config: AppConfig) -> Result<Self> {
        info!("初始化应用程序");

        let db = Arc::new(
            DatabaseManager::new(&config.database.url, config.database.max_connections)
                .await
                .context("创建数据库连接失败")?,
        );
        db.health_check().await.context("数据库健康检查失败")?;

        let request_repo = db.help_request_repository();
        let ranking_repo = db.ranked_list_repository();
        let volunteer_repo = db.volunteer_repository();

        let oracle = Arc::new(
            HttpRankingOracle::new(
                config.oracle.base_url.clone(),
                config.oracle.api_key.clone(),
                config.oracle.model.clone(),
                config.oracle.timeout_seconds,
            )
            .context("创建排序服务客户端失败")?,
        );

        let dispatch_service = Arc::new(DispatchService::new(
            Arc::clone(&request_repo),
            ranking_repo,
            volunteer_repo,
            oracle,
        ));

        let state = AppState {
            dispatch_service,
            request_repo,
            auth_config: Arc::new(AuthConfig {
                enabled: config.auth.enabled,
                jwt_secret: config.auth.jwt_secret.clone(),
                jwt_expiration_hours: 24,
            }),
        };

        Ok(Self { config, state, db })
    }

    /// 运行HTTP服务直到收到关闭信号
    pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        let app = create_routes(self.state.clone());

        let listener = TcpListener::bind(&self.config.server.bind_address)
            .await
            .with_context(|| format!("绑定地址失败: {}", self.config.server.bind_address))?;

        info!("API服务监听于 {}", self.config.server.bind_address);

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await
            .context("HTTP服务异常退出")?;

        self.db.close().await;
        info!("API服务已停止");
        Ok(())
    }
}
