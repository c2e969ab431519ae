//! 外部服务端口定义

use async_trait::async_trait;

use crate::entities::{CandidateRecord, RankedCandidate};
use dispatch_core::DispatchResult;

/// 排序服务端口
///
/// 排序服务是黑盒依赖：输入为请求者上下文和候选池，输出为从优到劣的
/// 全序候选列表。核心只负责严格校验输出形状，不干预排序逻辑本身。
#[async_trait]
pub trait RankingOracle: Send + Sync {
    /// 对候选池进行排序，返回非空的有序候选列表
    ///
    /// # 错误
    ///
    /// * `RankingFormat` - 输出为空、非JSON或形状不符
    /// * `OracleUnavailable` - 网络或服务故障
    async fn rank(
        &self,
        context: &serde_json::Value,
        pool: &[CandidateRecord],
    ) -> DispatchResult<Vec<RankedCandidate>>;
}
