pub mod manager;
pub mod sqlite;

use dispatch_core::{DispatchError, DispatchResult};
use sqlx::SqlitePool;

/// 初始化数据库表结构
pub async fn run_migrations(pool: &SqlitePool) -> DispatchResult<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS help_requests (
            id TEXT PRIMARY KEY,
            owner_id TEXT NOT NULL,
            location_lat REAL,
            location_lng REAL,
            resume TEXT NOT NULL DEFAULT '{}',
            status TEXT NOT NULL DEFAULT 'open',
            current_volunteer_id TEXT,
            current_volunteer_index INTEGER NOT NULL DEFAULT 0,
            last_response TEXT,
            last_responder_id TEXT,
            last_responded_at TEXT,
            version INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(DispatchError::Database)?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS ranked_lists (
            request_id TEXT PRIMARY KEY,
            ranked TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(DispatchError::Database)?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS volunteers (
            id TEXT PRIMARY KEY,
            username TEXT,
            location_lat REAL,
            location_lng REAL,
            skills TEXT,
            experience TEXT,
            languages TEXT,
            notes TEXT,
            is_volunteer INTEGER NOT NULL DEFAULT 0,
            volunteer_status TEXT NOT NULL DEFAULT 'pending'
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(DispatchError::Database)?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_volunteers_eligibility \
         ON volunteers (is_volunteer, volunteer_status)",
    )
    .execute(pool)
    .await
    .map_err(DispatchError::Database)?;

    Ok(())
}
