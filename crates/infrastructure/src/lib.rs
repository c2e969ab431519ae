//! # Dispatch Infrastructure
//!
//! 数据持久化层实现：SQLite仓储与数据库连接管理。
//! 仓储实现遵守 `dispatch-domain` 中定义的接口契约，
//! 状态转换以原子的读取-校验-写入方式执行。

pub mod database;

pub use database::manager::DatabaseManager;
pub use database::sqlite::{
    SqliteHelpRequestRepository, SqliteRankedListRepository, SqliteVolunteerRepository,
};
