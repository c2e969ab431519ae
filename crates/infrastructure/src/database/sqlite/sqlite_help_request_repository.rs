use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use tracing::{debug, instrument};

use dispatch_core::{DispatchError, DispatchResult};
use dispatch_domain::entities::{GeoPoint, HelpRequest, RankedList};
use dispatch_domain::repositories::{HelpRequestRepository, TransitionGuard};

/// 单次转换在写入冲突下的最大重试次数
///
/// 每次重试都重新读取快照并重新求值守卫，竞争失败方会在重读后
/// 命中前置条件错误而非裸冲突。
const MAX_TRANSITION_ATTEMPTS: usize = 5;

pub struct SqliteHelpRequestRepository {
    pool: SqlitePool,
}

impl SqliteHelpRequestRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_help_request(row: &sqlx::sqlite::SqliteRow) -> DispatchResult<HelpRequest> {
        let location_lat: Option<f64> = row.try_get("location_lat")?;
        let location_lng: Option<f64> = row.try_get("location_lng")?;
        let location = match (location_lat, location_lng) {
            (Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
            _ => None,
        };

        let resume_raw: String = row.try_get("resume")?;
        let resume = serde_json::from_str(&resume_raw)
            .map_err(|e| DispatchError::Serialization(format!("解析resume字段失败: {e}")))?;

        Ok(HelpRequest {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            location,
            resume,
            status: row.try_get("status")?,
            current_volunteer_id: row.try_get("current_volunteer_id")?,
            current_volunteer_index: row.try_get("current_volunteer_index")?,
            last_response: row.try_get("last_response")?,
            last_responder_id: row.try_get("last_responder_id")?,
            last_responded_at: row.try_get("last_responded_at")?,
            version: row.try_get("version")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    async fn load_ranking(&self, request_id: &str) -> DispatchResult<Option<RankedList>> {
        let row = sqlx::query("SELECT request_id, ranked, created_at FROM ranked_lists WHERE request_id = $1")
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

#[async_trait]
impl HelpRequestRepository for SqliteHelpRequestRepository {
    #[instrument(skip(self, request), fields(request_id = %request.id))]
    async fn create(&self, request: &HelpRequest) -> DispatchResult<HelpRequest> {
        let resume = serde_json::to_string(&request.resume)
            .map_err(|e| DispatchError::Serialization(format!("序列化resume字段失败: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO help_requests (id, owner_id, location_lat, location_lng, resume, status,
                                       current_volunteer_id, current_volunteer_index,
                                       last_response, last_responder_id, last_responded_at,
                                       version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(&request.id)
        .bind(&request.owner_id)
        .bind(request.location.map(|l| l.lat))
        .bind(request.location.map(|l| l.lng))
        .bind(resume)
        .bind(request.status)
        .bind(&request.current_volunteer_id)
        .bind(request.current_volunteer_index)
        .bind(&request.last_response)
        .bind(&request.last_responder_id)
        .bind(request.last_responded_at)
        .bind(request.version)
        .bind(request.created_at)
        .bind(request.updated_at)
        .execute(&self.pool)
        .await
        .map_err(DispatchError::Database)?;

        debug!("创建求助请求成功: {}", request.id);
        Ok(request.clone())
    }

    async fn get_by_id(&self, request_id: &str) -> DispatchResult<Option<HelpRequest>> {
        let row = sqlx::query(
            "SELECT id, owner_id, location_lat, location_lng, resume, status,
                    current_volunteer_id, current_volunteer_index,
                    last_response, last_responder_id, last_responded_at,
                    version, created_at, updated_at
             FROM help_requests WHERE id = $1",
        )
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DispatchError::Database)?;

        match row {
            Some(row) => Ok(Some(Self::row_to_help_request(&row)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, guard))]
    async fn transition(
        &self,
        request_id: &str,
        guard: TransitionGuard,
    ) -> DispatchResult<HelpRequest> {
        for _ in 0..MAX_TRANSITION_ATTEMPTS {
            let current = self
                .get_by_id(request_id)
                .await?
                .ok_or_else(|| DispatchError::RequestNotFound {
                    id: request_id.to_string(),
                })?;
            let ranking = self.load_ranking(request_id).await?;

            let expected_version = current.version;
            let mut updated = guard(&current, ranking.as_ref())?;
            updated.version = expected_version + 1;
            updated.updated_at = Utc::now();

            let result = sqlx::query(
                r#"
                UPDATE help_requests
                SET status = $1, current_volunteer_id = $2, current_volunteer_index = $3,
                    last_response = $4, last_responder_id = $5, last_responded_at = $6,
                    version = $7, updated_at = $8
                WHERE id = $9 AND version = $10
                "#,
            )
            .bind(updated.status)
            .bind(&updated.current_volunteer_id)
            .bind(updated.current_volunteer_index)
            .bind(&updated.last_response)
            .bind(&updated.last_responder_id)
            .bind(updated.last_responded_at)
            .bind(updated.version)
            .bind(updated.updated_at)
            .bind(request_id)
            .bind(expected_version)
            .execute(&self.pool)
            .await
            .map_err(DispatchError::Database)?;

            if result.rows_affected() == 1 {
                debug!(
                    "请求 {request_id} 状态转换提交: {} (version {})",
                    updated.status, updated.version
                );
                return Ok(updated);
            }

            // 版本不匹配：其他调用方先提交了，重读快照再次求值
            debug!("请求 {request_id} 写入冲突，重新读取快照");
        }

        Err(DispatchError::DatabaseOperation(format!(
            "请求 {request_id} 持续写入冲突，转换放弃"
        )))
    }
}
