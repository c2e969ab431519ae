use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use tracing::debug;

use dispatch_core::{DispatchError, DispatchResult};
use dispatch_domain::entities::RankedList;
use dispatch_domain::repositories::RankedListRepository;

pub struct SqliteRankedListRepository {
    pool: SqlitePool,
}

impl SqliteRankedListRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RankedListRepository for SqliteRankedListRepository {
    async fn create(&self, list: &RankedList) -> DispatchResult<()> {
        let ranked = serde_json::to_string(&list.ranked)
            .map_err(|e| DispatchError::Serialization(format!("序列化排序结果失败: {e}")))?;

        // 主键约束保证一次写入语义，冲突即拒绝，绝不覆盖
        sqlx::query("INSERT INTO ranked_lists (request_id, ranked, created_at) VALUES ($1, $2, $3)")
            .bind(&list.request_id)
            .bind(ranked)
            .bind(list.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    DispatchError::RankingExists {
                        id: list.request_id.clone(),
                    }
                }
                _ => DispatchError::Database(e),
            })?;

        debug!(
            "写入排序结果成功: {} ({} 个候选人)",
            list.request_id,
            list.len()
        );
        Ok(())
    }

    async fn get_by_request_id(&self, request_id: &str) -> DispatchResult<Option<RankedList>> {
        let row = sqlx::query(
            "SELECT request_id, ranked, created_at FROM ranked_lists WHERE request_id = $1",
        )
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DispatchError::Database)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let ranked_raw: String = row.try_get("ranked")?;
        let ranked = serde_json::from_str(&ranked_raw)
            .map_err(|e| DispatchError::Serialization(format!("解析排序结果失败: {e}")))?;
        let created_at: DateTime<Utc> = row.try_get("created_at")?;

        Ok(Some(RankedList {
            request_id: request_id.to_string(),
            ranked,
            created_at,
        }))
    }
}
