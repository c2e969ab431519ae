//! # Dispatch API
//!
//! 志愿者调度系统的REST API服务模块，基于Axum框架构建。
//!
//! ## API 端点
//!
//! ### 调度操作（需要认证）
//! - `POST /api/dispatch/rank` - 发起候选排序（仅请求所有者）
//! - `POST /api/dispatch/decline` - 当前志愿者拒绝，升级到下一位
//! - `POST /api/dispatch/accept` - 当前志愿者接受指派
//!
//! ### 查询
//! - `GET /api/requests/{id}` - 查看求助请求（所有者或当前志愿者）
//! - `GET /health` - 健康检查

pub mod auth;
pub mod error;
pub mod handlers;
pub mod response;
pub mod routes;

pub use routes::{create_routes, AppState};
