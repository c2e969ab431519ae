//! 调度状态机
//!
//! 求助请求生命周期：
//! `open -> processing -> awaiting_volunteer -> (assigned | no_volunteers)`，
//! 其中拒绝在 awaiting_volunteer 上自环推进，候选耗尽时退出到 no_volunteers。
//! assigned 与 no_volunteers 为终态，本核心不提供离开终态的转换。
//!
//! 所有状态变更都通过仓储的 transition 操作执行（原子的读取-校验-写入），
//! 前置条件失败以类型化错误上报，绝不自动重试；重放的调用会因前置条件
//! 不再成立而被自然拒绝。

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use dispatch_core::{DispatchError, DispatchResult};
use dispatch_domain::entities::{RankedList, RequestStatus};
use dispatch_domain::ports::RankingOracle;
use dispatch_domain::repositories::{
    HelpRequestRepository, RankedListRepository, VolunteerRepository,
};

use crate::pool::build_candidate_pool;

/// 初始化排序的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingOutcome {
    pub ranked_count: usize,
}

/// 调度服务
///
/// 持有仓储与排序服务端口，进程启动时构建一次，跨调用复用。
pub struct DispatchService {
    request_repo: Arc<dyn HelpRequestRepository>,
    ranking_repo: Arc<dyn RankedListRepository>,
    volunteer_repo: Arc<dyn VolunteerRepository>,
    oracle: Arc<dyn RankingOracle>,
}

impl DispatchService {
    pub fn new(
        request_repo: Arc<dyn HelpRequestRepository>,
        ranking_repo: Arc<dyn RankedListRepository>,
        volunteer_repo: Arc<dyn VolunteerRepository>,
        oracle: Arc<dyn RankingOracle>,
    ) -> Self {
        Self {
            request_repo,
            ranking_repo,
            volunteer_repo,
            oracle,
        }
    }

    /// 初始化排序
    ///
    /// 仅请求所有者可调用，且请求必须处于 open 状态。先原子地将请求
    /// 占用为 processing，再构建候选池：空池直接终结为 no_volunteers；
    /// 否则调用排序服务，一次性写入排序结果，并原子地进入
    /// awaiting_volunteer（指向排名第一的候选人）。
    ///
    /// 排序服务调用或排序结果写入失败时，请求回滚到 open 以便重新发起。
    #[instrument(skip(self))]
    pub async fn initiate_ranking(
        &self,
        caller_id: &str,
        request_id: &str,
    ) -> DispatchResult<RankingOutcome> {
        let caller = caller_id.to_string();
        let claimed = self
            .request_repo
            .transition(
                request_id,
                Box::new(move |request, _| {
                    if request.owner_id != caller {
                        return Err(DispatchError::PermissionDenied(
                            "只有请求所有者可以发起排序".to_string(),
                        ));
                    }
                    if request.status != RequestStatus::Open {
                        return Err(DispatchError::InvalidState(format!(
                            "请求已被处理，当前状态: {}",
                            request.status
                        )));
                    }
                    let mut next = request.clone();
                    next.status = RequestStatus::Processing;
                    Ok(next)
                }),
            )
            .await?;

        info!("请求 {request_id} 已占用，开始构建候选池");

        let volunteers = match self.volunteer_repo.get_approved_volunteers().await {
            Ok(volunteers) => volunteers,
            Err(e) => {
                self.reopen(request_id).await;
                return Err(e);
            }
        };

        let pool = build_candidate_pool(claimed.location.as_ref(), &volunteers);

        if pool.is_empty() {
            self.request_repo
                .transition(
                    request_id,
                    Box::new(|request, _| {
                        if request.status != RequestStatus::Processing {
                            return Err(DispatchError::InvalidState(format!(
                                "请求不在处理中，当前状态: {}",
                                request.status
                            )));
                        }
                        let mut next = request.clone();
                        next.status = RequestStatus::NoVolunteers;
                        next.current_volunteer_id = None;
                        next.current_volunteer_index = 0;
                        Ok(next)
                    }),
                )
                .await?;

            info!("请求 {request_id} 候选池为空，直接终结为 no_volunteers");
            return Ok(RankingOutcome { ranked_count: 0 });
        }

        let ranked = match self.oracle.rank(&claimed.resume, &pool).await {
            Ok(ranked) => ranked,
            Err(e) => {
                self.reopen(request_id).await;
                return Err(e);
            }
        };

        let list = RankedList::new(request_id, ranked);
        if let Err(e) = self.ranking_repo.create(&list).await {
            self.reopen(request_id).await;
            return Err(e);
        }

        let first_volunteer = list.ranked[0].volunteer_id.clone();
        self.request_repo
            .transition(
                request_id,
                Box::new(move |request, _| {
                    if request.status != RequestStatus::Processing {
                        return Err(DispatchError::InvalidState(format!(
                            "请求不在处理中，当前状态: {}",
                            request.status
                        )));
                    }
                    let mut next = request.clone();
                    next.status = RequestStatus::AwaitingVolunteer;
                    next.current_volunteer_id = Some(first_volunteer.clone());
                    next.current_volunteer_index = 0;
                    Ok(next)
                }),
            )
            .await?;

        info!(
            "请求 {request_id} 排序完成，共 {} 个候选人，首位: {}",
            list.len(),
            list.ranked[0].volunteer_id
        );
        Ok(RankingOutcome {
            ranked_count: list.len(),
        })
    }

    /// 当前候选人拒绝，指针推进到下一位
    ///
    /// 仅当前候选人可调用，且请求必须处于 awaiting_volunteer 状态。
    /// 指针每次恰好前进1；越过列表末尾时终结为 no_volunteers
    /// （索引保留越界值用于审计）。
    #[instrument(skip(self))]
    pub async fn decline_current(&self, caller_id: &str, request_id: &str) -> DispatchResult<()> {
        let caller = caller_id.to_string();
        let updated = self
            .request_repo
            .transition(
                request_id,
                Box::new(move |request, ranking| {
                    if request.status != RequestStatus::AwaitingVolunteer {
                        return Err(DispatchError::InvalidState(format!(
                            "请求未在等待志愿者，当前状态: {}",
                            request.status
                        )));
                    }
                    if request.current_volunteer_id.as_deref() != Some(caller.as_str()) {
                        return Err(DispatchError::PermissionDenied(
                            "调用者不是当前被指派的志愿者".to_string(),
                        ));
                    }
                    let ranking = ranking.ok_or_else(|| DispatchError::RankingNotFound {
                        id: request.id.clone(),
                    })?;

                    let next_index = request.current_volunteer_index + 1;
                    let mut next = request.clone();
                    next.last_response = Some("rejected".to_string());
                    next.last_responder_id = Some(caller.clone());
                    next.last_responded_at = Some(Utc::now());

                    match ranking.volunteer_at(next_index) {
                        Some(candidate) => {
                            next.current_volunteer_id = Some(candidate.volunteer_id.clone());
                            next.current_volunteer_index = next_index;
                        }
                        None => {
                            next.status = RequestStatus::NoVolunteers;
                            next.current_volunteer_id = None;
                            next.current_volunteer_index = next_index;
                        }
                    }
                    Ok(next)
                }),
            )
            .await?;

        match &updated.current_volunteer_id {
            Some(volunteer_id) => info!(
                "请求 {request_id} 升级到第 {} 位候选人: {volunteer_id}",
                updated.current_volunteer_index
            ),
            None => info!("请求 {request_id} 候选人已耗尽，终结为 no_volunteers"),
        }
        Ok(())
    }

    /// 当前候选人接受指派，请求进入终态 assigned
    ///
    /// 前置条件与拒绝转换相同；指针保持不变，审计字段记录接受响应。
    #[instrument(skip(self))]
    pub async fn accept_current(&self, caller_id: &str, request_id: &str) -> DispatchResult<()> {
        let caller = caller_id.to_string();
        self.request_repo
            .transition(
                request_id,
                Box::new(move |request, ranking| {
                    if request.status != RequestStatus::AwaitingVolunteer {
                        return Err(DispatchError::InvalidState(format!(
                            "请求未在等待志愿者，当前状态: {}",
                            request.status
                        )));
                    }
                    if request.current_volunteer_id.as_deref() != Some(caller.as_str()) {
                        return Err(DispatchError::PermissionDenied(
                            "调用者不是当前被指派的志愿者".to_string(),
                        ));
                    }
                    if ranking.is_none() {
                        return Err(DispatchError::RankingNotFound {
                            id: request.id.clone(),
                        });
                    }

                    let mut next = request.clone();
                    next.status = RequestStatus::Assigned;
                    next.last_response = Some("accepted".to_string());
                    next.last_responder_id = Some(caller.clone());
                    next.last_responded_at = Some(Utc::now());
                    Ok(next)
                }),
            )
            .await?;

        info!("请求 {request_id} 已由 {caller_id} 接受指派");
        Ok(())
    }

    /// 占用后的补偿回滚：processing -> open
    ///
    /// 仅在排序流程失败时尽力执行，失败只记录日志，不掩盖原始错误。
    async fn reopen(&self, request_id: &str) {
        let result = self
            .request_repo
            .transition(
                request_id,
                Box::new(|request, _| {
                    if request.status != RequestStatus::Processing {
                        return Err(DispatchError::InvalidState(format!(
                            "请求不在处理中，当前状态: {}",
                            request.status
                        )));
                    }
                    let mut next = request.clone();
                    next.status = RequestStatus::Open;
                    Ok(next)
                }),
            )
            .await;

        if let Err(e) = result {
            warn!("请求 {request_id} 回滚到 open 失败: {e}");
        }
    }
}
