//! # Dispatch Engine
//!
//! 志愿者调度核心：候选池构建、排序服务客户端和请求生命周期状态机。
//!
//! 控制流：候选池构建器 -> 排序服务客户端 -> 调度状态机（初始化生命周期），
//! 之后每次拒绝事件经事务守卫重新进入状态机，直到接受或候选耗尽。

pub mod geo;
pub mod oracle;
pub mod pool;
pub mod service;

pub use oracle::HttpRankingOracle;
pub use service::{DispatchService, RankingOutcome};
