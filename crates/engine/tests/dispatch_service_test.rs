use std::sync::Arc;

use dispatch_core::DispatchError;
use dispatch_domain::entities::{RankedList, RequestStatus};
use dispatch_domain::repositories::{HelpRequestRepository, RankedListRepository};
use dispatch_engine::DispatchService;
use dispatch_testing_utils::{
    ranked_list, FailingRankingOracle, HelpRequestBuilder, MockHelpRequestRepository,
    MockRankedListRepository, MockVolunteerRepository, ScriptedRankingOracle, VolunteerBuilder,
};

struct TestHarness {
    service: DispatchService,
    request_repo: MockHelpRequestRepository,
    ranking_repo: MockRankedListRepository,
    volunteer_repo: MockVolunteerRepository,
}

fn setup_with_oracle(oracle: Arc<dyn dispatch_domain::ports::RankingOracle>) -> TestHarness {
    let ranking_repo = MockRankedListRepository::new();
    let request_repo = MockHelpRequestRepository::with_ranking_store(ranking_repo.store());
    let volunteer_repo = MockVolunteerRepository::new();

    let service = DispatchService::new(
        Arc::new(request_repo.clone()),
        Arc::new(ranking_repo.clone()),
        Arc::new(volunteer_repo.clone()),
        oracle,
    );

    TestHarness {
        service,
        request_repo,
        ranking_repo,
        volunteer_repo,
    }
}

fn setup() -> TestHarness {
    setup_with_oracle(Arc::new(ScriptedRankingOracle::new()))
}

#[tokio::test]
async fn test_initiate_ranking_happy_path() {
    let harness = setup();
    harness.request_repo.insert(
        HelpRequestBuilder::new()
            .with_id("req-1")
            .with_owner("owner-1")
            .with_location(31.23, 121.47)
            .build(),
    );
    harness
        .volunteer_repo
        .insert(VolunteerBuilder::new("v1").build());
    harness
        .volunteer_repo
        .insert(VolunteerBuilder::new("v2").with_location(32.0, 120.0).build());

    let outcome = harness
        .service
        .initiate_ranking("owner-1", "req-1")
        .await
        .unwrap();
    assert_eq!(outcome.ranked_count, 2);

    let request = harness
        .request_repo
        .get_by_id("req-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(request.status, RequestStatus::AwaitingVolunteer);
    assert_eq!(request.current_volunteer_index, 0);
    assert_eq!(request.current_volunteer_id.as_deref(), Some("v1"));

    let list = harness
        .ranking_repo
        .get_by_request_id("req-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list.ranked[0].volunteer_id, "v1");
}

#[tokio::test]
async fn test_initiate_ranking_empty_pool_short_circuits() {
    let harness = setup();
    harness.request_repo.insert(
        HelpRequestBuilder::new()
            .with_id("req-1")
            .with_owner("owner-1")
            .build(),
    );
    // 仅有无坐标志愿者，池为空
    harness
        .volunteer_repo
        .insert(VolunteerBuilder::new("v1").without_location().build());

    let outcome = harness
        .service
        .initiate_ranking("owner-1", "req-1")
        .await
        .unwrap();
    assert_eq!(outcome.ranked_count, 0);

    let request = harness
        .request_repo
        .get_by_id("req-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(request.status, RequestStatus::NoVolunteers);
    assert_eq!(request.current_volunteer_index, 0);
    assert!(request.current_volunteer_id.is_none());

    // 排序服务不应被调用
    let ranking = harness
        .ranking_repo
        .get_by_request_id("req-1")
        .await
        .unwrap();
    assert!(ranking.is_none());
}

#[tokio::test]
async fn test_initiate_ranking_rejects_non_owner() {
    let harness = setup();
    harness.request_repo.insert(
        HelpRequestBuilder::new()
            .with_id("req-1")
            .with_owner("owner-1")
            .build(),
    );

    let err = harness
        .service
        .initiate_ranking("intruder", "req-1")
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::PermissionDenied(_)));

    let request = harness
        .request_repo
        .get_by_id("req-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(request.status, RequestStatus::Open);
}

#[tokio::test]
async fn test_initiate_ranking_rejects_already_processed() {
    let harness = setup();
    harness.request_repo.insert(
        HelpRequestBuilder::new()
            .with_id("req-1")
            .with_owner("owner-1")
            .with_status(RequestStatus::NoVolunteers)
            .build(),
    );

    let err = harness
        .service
        .initiate_ranking("owner-1", "req-1")
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::InvalidState(_)));
}

#[tokio::test]
async fn test_initiate_ranking_unknown_request() {
    let harness = setup();
    let err = harness
        .service
        .initiate_ranking("owner-1", "missing")
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::RequestNotFound { .. }));
}

#[tokio::test]
async fn test_oracle_failure_rolls_back_to_open() {
    let harness = setup_with_oracle(Arc::new(FailingRankingOracle::unavailable()));
    harness.request_repo.insert(
        HelpRequestBuilder::new()
            .with_id("req-1")
            .with_owner("owner-1")
            .build(),
    );
    harness
        .volunteer_repo
        .insert(VolunteerBuilder::new("v1").build());

    let err = harness
        .service
        .initiate_ranking("owner-1", "req-1")
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::OracleUnavailable(_)));

    // 回滚后可以重新发起
    let request = harness
        .request_repo
        .get_by_id("req-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(request.status, RequestStatus::Open);
}

#[tokio::test]
async fn test_malformed_oracle_output_rolls_back_to_open() {
    let harness = setup_with_oracle(Arc::new(FailingRankingOracle::malformed()));
    harness.request_repo.insert(
        HelpRequestBuilder::new()
            .with_id("req-1")
            .with_owner("owner-1")
            .build(),
    );
    harness
        .volunteer_repo
        .insert(VolunteerBuilder::new("v1").build());

    let err = harness
        .service
        .initiate_ranking("owner-1", "req-1")
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::RankingFormat(_)));

    let request = harness
        .request_repo
        .get_by_id("req-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(request.status, RequestStatus::Open);
}

#[tokio::test]
async fn test_ranked_list_is_write_once() {
    let harness = setup();
    let list = ranked_list("req-1", &["v1", "v2"]);
    harness.ranking_repo.create(&list).await.unwrap();

    let err = harness.ranking_repo.create(&list).await.unwrap_err();
    assert!(matches!(err, DispatchError::RankingExists { .. }));

    // 原排序结果未被覆盖
    let stored = harness
        .ranking_repo
        .get_by_request_id("req-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.len(), 2);
}

async fn seed_awaiting(harness: &TestHarness, volunteer_ids: &[&str]) {
    harness.request_repo.insert(
        HelpRequestBuilder::new()
            .with_id("req-1")
            .with_owner("owner-1")
            .awaiting(volunteer_ids[0], 0)
            .build(),
    );
    harness
        .ranking_repo
        .create(&ranked_list("req-1", volunteer_ids))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_decline_escalates_through_ranked_list() {
    let harness = setup();
    seed_awaiting(&harness, &["v1", "v2", "v3"]).await;

    harness.service.decline_current("v1", "req-1").await.unwrap();
    let request = harness
        .request_repo
        .get_by_id("req-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(request.current_volunteer_index, 1);
    assert_eq!(request.current_volunteer_id.as_deref(), Some("v2"));
    assert_eq!(request.status, RequestStatus::AwaitingVolunteer);
    assert_eq!(request.last_response.as_deref(), Some("rejected"));
    assert_eq!(request.last_responder_id.as_deref(), Some("v1"));
    assert!(request.last_responded_at.is_some());

    harness.service.decline_current("v2", "req-1").await.unwrap();
    let request = harness
        .request_repo
        .get_by_id("req-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(request.current_volunteer_index, 2);
    assert_eq!(request.current_volunteer_id.as_deref(), Some("v3"));
    assert_eq!(request.status, RequestStatus::AwaitingVolunteer);

    // 最后一位拒绝后候选耗尽
    harness.service.decline_current("v3", "req-1").await.unwrap();
    let request = harness
        .request_repo
        .get_by_id("req-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(request.status, RequestStatus::NoVolunteers);
    assert_eq!(request.current_volunteer_index, 3);
    assert!(request.current_volunteer_id.is_none());
}

#[tokio::test]
async fn test_decline_from_wrong_identity_changes_nothing() {
    let harness = setup();
    seed_awaiting(&harness, &["v1", "v2"]).await;

    let before = harness
        .request_repo
        .get_by_id("req-1")
        .await
        .unwrap()
        .unwrap();

    let err = harness
        .service
        .decline_current("v2", "req-1")
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::PermissionDenied(_)));

    let after = harness
        .request_repo
        .get_by_id("req-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.status, before.status);
    assert_eq!(after.current_volunteer_index, before.current_volunteer_index);
    assert_eq!(after.current_volunteer_id, before.current_volunteer_id);
    assert_eq!(after.last_response, before.last_response);
}

#[tokio::test]
async fn test_decline_in_wrong_status_is_invalid_state() {
    let harness = setup();
    harness.request_repo.insert(
        HelpRequestBuilder::new()
            .with_id("req-1")
            .with_owner("owner-1")
            .with_status(RequestStatus::Assigned)
            .build(),
    );

    let err = harness
        .service
        .decline_current("v1", "req-1")
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::InvalidState(_)));
}

#[tokio::test]
async fn test_replayed_decline_is_rejected() {
    let harness = setup();
    seed_awaiting(&harness, &["v1", "v2"]).await;

    harness.service.decline_current("v1", "req-1").await.unwrap();

    // 重放同一调用：指针已前移，前置条件自然拒绝
    let err = harness
        .service
        .decline_current("v1", "req-1")
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::PermissionDenied(_)));

    let request = harness
        .request_repo
        .get_by_id("req-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(request.current_volunteer_index, 1);
}

#[tokio::test]
async fn test_concurrent_declines_exactly_one_succeeds() {
    let harness = setup();
    seed_awaiting(&harness, &["v1", "v2", "v3"]).await;

    let (first, second) = tokio::join!(
        harness.service.decline_current("v1", "req-1"),
        harness.service.decline_current("v1", "req-1"),
    );

    // 恰好一个成功，另一个观察到转换后的状态并失败
    assert!(first.is_ok() != second.is_ok());
    let err = if first.is_err() {
        first.unwrap_err()
    } else {
        second.unwrap_err()
    };
    assert!(matches!(
        err,
        DispatchError::PermissionDenied(_) | DispatchError::InvalidState(_)
    ));

    // 指针恰好前进一位，没有跳跃
    let request = harness
        .request_repo
        .get_by_id("req-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(request.current_volunteer_index, 1);
    assert_eq!(request.current_volunteer_id.as_deref(), Some("v2"));
}

#[tokio::test]
async fn test_accept_moves_to_assigned() {
    let harness = setup();
    seed_awaiting(&harness, &["v1", "v2"]).await;

    harness.service.accept_current("v1", "req-1").await.unwrap();

    let request = harness
        .request_repo
        .get_by_id("req-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(request.status, RequestStatus::Assigned);
    assert_eq!(request.current_volunteer_id.as_deref(), Some("v1"));
    assert_eq!(request.current_volunteer_index, 0);
    assert_eq!(request.last_response.as_deref(), Some("accepted"));
    assert_eq!(request.last_responder_id.as_deref(), Some("v1"));
}

#[tokio::test]
async fn test_accept_rejects_wrong_identity_and_terminal_states() {
    let harness = setup();
    seed_awaiting(&harness, &["v1", "v2"]).await;

    let err = harness
        .service
        .accept_current("v2", "req-1")
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::PermissionDenied(_)));

    // 接受后为终态，再次拒绝/接受都被拒绝
    harness.service.accept_current("v1", "req-1").await.unwrap();
    let err = harness
        .service
        .decline_current("v1", "req-1")
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::InvalidState(_)));
    let err = harness
        .service
        .accept_current("v1", "req-1")
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::InvalidState(_)));
}

#[tokio::test]
async fn test_decline_without_ranked_list_is_not_found() {
    let harness = setup();
    // awaiting状态但排序结果缺失（异常数据）
    harness.request_repo.insert(
        HelpRequestBuilder::new()
            .with_id("req-1")
            .with_owner("owner-1")
            .awaiting("v1", 0)
            .build(),
    );

    let err = harness
        .service
        .decline_current("v1", "req-1")
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::RankingNotFound { .. }));
}

#[tokio::test]
async fn test_full_lifecycle_rank_then_declines_then_exhaustion() {
    let harness = setup();
    harness.request_repo.insert(
        HelpRequestBuilder::new()
            .with_id("req-1")
            .with_owner("owner-1")
            .with_location(31.0, 121.0)
            .with_resume(serde_json::json!({"need": "medical"}))
            .build(),
    );
    for id in ["v1", "v2", "v3"] {
        harness
            .volunteer_repo
            .insert(VolunteerBuilder::new(id).build());
    }

    let outcome = harness
        .service
        .initiate_ranking("owner-1", "req-1")
        .await
        .unwrap();
    assert_eq!(outcome.ranked_count, 3);

    // 再次发起被拒绝（状态已不是open）
    let err = harness
        .service
        .initiate_ranking("owner-1", "req-1")
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::InvalidState(_)));

    let list: RankedList = harness
        .ranking_repo
        .get_by_request_id("req-1")
        .await
        .unwrap()
        .unwrap();
    let order: Vec<String> = list
        .ranked
        .iter()
        .map(|c| c.volunteer_id.clone())
        .collect();

    // 依次拒绝直至耗尽，指针始终与排序结果保持一致
    for (index, volunteer_id) in order.iter().enumerate() {
        let request = harness
            .request_repo
            .get_by_id("req-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(request.current_volunteer_index as usize, index);
        assert_eq!(request.current_volunteer_id.as_deref(), Some(volunteer_id.as_str()));
        harness
            .service
            .decline_current(volunteer_id, "req-1")
            .await
            .unwrap();
    }

    let request = harness
        .request_repo
        .get_by_id("req-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(request.status, RequestStatus::NoVolunteers);
    assert_eq!(request.current_volunteer_index, 3);
    assert!(request.current_volunteer_id.is_none());
}
