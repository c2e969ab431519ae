//! 数据仓储层接口定义
//!
//! 此模块定义了数据持久化层的核心抽象接口：
//! - 求助请求仓储接口 (HelpRequestRepository)，包含事务保护的状态转换操作
//! - 排序结果仓储接口 (RankedListRepository)，一次写入语义
//! - 志愿者目录仓储接口 (VolunteerRepository)
//!
//! ## 设计原则
//!
//! 所有数据库操作都是异步的，返回 `DispatchResult<T>` 统一错误处理，
//! 实现 `Send + Sync` 确保线程安全。接口与具体实现分离，
//! SQLite 实现与测试用内存实现遵守同一份契约。

use async_trait::async_trait;

use crate::entities::{HelpRequest, RankedList, VolunteerRecord};
use dispatch_core::DispatchResult;

/// 状态转换守卫
///
/// 在同一个原子单元内对请求快照求值：读取当前的 `HelpRequest`（以及已存在的
/// `RankedList`），要么返回要写入的新记录，要么返回一个前置条件错误。
/// 返回错误时不产生任何写入。
///
/// 同一请求上的并发转换被线性化：竞争的调用方中恰好有一个基于一致的快照
/// 通过前置条件检查，失败方重新读取到转换后的状态并得到前置条件错误。
pub type TransitionGuard =
    Box<dyn Fn(&HelpRequest, Option<&RankedList>) -> DispatchResult<HelpRequest> + Send + Sync>;

/// 求助请求仓储接口
///
/// 生命周期字段的唯一写入方是 `transition` 操作，其它代码不得直接写这些字段。
#[async_trait]
pub trait HelpRequestRepository: Send + Sync {
    /// 创建新的求助请求
    async fn create(&self, request: &HelpRequest) -> DispatchResult<HelpRequest>;

    /// 根据ID获取求助请求
    async fn get_by_id(&self, request_id: &str) -> DispatchResult<Option<HelpRequest>>;

    /// 事务保护的读取-校验-写入
    ///
    /// 读取请求当前状态（连同已存在的排序结果），将快照交给守卫求值，
    /// 守卫通过时原子地提交新状态。请求不存在时返回 `RequestNotFound`；
    /// 守卫返回的错误原样向上传播，且不写入任何状态。
    async fn transition(
        &self,
        request_id: &str,
        guard: TransitionGuard,
    ) -> DispatchResult<HelpRequest>;
}

/// 排序结果仓储接口
///
/// 每个请求的排序结果恰好写入一次，不存在更新路径。
#[async_trait]
pub trait RankedListRepository: Send + Sync {
    /// 写入排序结果；该请求已有排序结果时返回 `RankingExists`，绝不覆盖
    async fn create(&self, list: &RankedList) -> DispatchResult<()>;

    /// 根据请求ID获取排序结果
    async fn get_by_request_id(&self, request_id: &str) -> DispatchResult<Option<RankedList>>;
}

/// 志愿者目录仓储接口
#[async_trait]
pub trait VolunteerRepository: Send + Sync {
    /// 获取已审核通过的志愿者（is_volunteer 且 volunteer_status = approved）
    async fn get_approved_volunteers(&self) -> DispatchResult<Vec<VolunteerRecord>>;
}
