use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use dispatch_domain::repositories::HelpRequestRepository;
use dispatch_engine::DispatchService;

use crate::auth::{auth_middleware, AuthConfig};
use crate::handlers::{
    dispatch::{accept_current, decline_current, initiate_ranking},
    health::health_check,
    requests::get_request,
};

/// API应用状态
#[derive(Clone)]
pub struct AppState {
    pub dispatch_service: Arc<DispatchService>,
    pub request_repo: Arc<dyn HelpRequestRepository>,
    pub auth_config: Arc<AuthConfig>,
}

/// 创建API路由
pub fn create_routes(state: AppState) -> Router {
    let api_routes = Router::new()
        // 调度操作API
        .route("/api/dispatch/rank", post(initiate_ranking))
        .route("/api/dispatch/decline", post(decline_current))
        .route("/api/dispatch/accept", post(accept_current))
        // 请求查询API
        .route("/api/requests/{id}", get(get_request))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        // 健康检查不需要认证
        .route("/health", get(health_check))
        .merge(api_routes)
        .with_state(state)
}
