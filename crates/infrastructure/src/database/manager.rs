use std::sync::Arc;

use dispatch_core::{DispatchError, DispatchResult};
use dispatch_domain::repositories::{
    HelpRequestRepository, RankedListRepository, VolunteerRepository,
};
use sqlx::SqlitePool;

use super::sqlite::{
    SqliteHelpRequestRepository, SqliteRankedListRepository, SqliteVolunteerRepository,
};

/// 数据库连接管理器
///
/// 持有连接池并提供仓储工厂方法，进程启动时构建一次。
pub struct DatabaseManager {
    pool: SqlitePool,
}

impl DatabaseManager {
    /// 创建连接池并初始化表结构
    pub async fn new(url: &str, max_connections: u32) -> DispatchResult<Self> {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(DispatchError::Database)?;

        super::run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn health_check(&self) -> DispatchResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(DispatchError::Database)?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub fn help_request_repository(&self) -> Arc<dyn HelpRequestRepository> {
        Arc::new(SqliteHelpRequestRepository::new(self.pool.clone()))
    }

    pub fn ranked_list_repository(&self) -> Arc<dyn RankedListRepository> {
        Arc::new(SqliteRankedListRepository::new(self.pool.clone()))
    }

    pub fn volunteer_repository(&self) -> Arc<dyn VolunteerRepository> {
        Arc::new(SqliteVolunteerRepository::new(self.pool.clone()))
    }
}
