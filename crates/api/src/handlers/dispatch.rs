use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use dispatch_core::DispatchError;

use crate::{auth::AuthenticatedUser, error::ApiResult, routes::AppState};

/// 调度操作请求体
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchRequest {
    pub request_id: Option<String>,
}

fn require_request_id(body: DispatchRequest) -> Result<String, DispatchError> {
    match body.request_id {
        Some(id) if !id.trim().is_empty() => Ok(id),
        _ => Err(DispatchError::InvalidArgument(
            "requestId is required".to_string(),
        )),
    }
}

/// 发起候选排序
pub async fn initiate_ranking(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<DispatchRequest>,
) -> ApiResult<Json<Value>> {
    let request_id = require_request_id(body)?;
    let outcome = state
        .dispatch_service
        .initiate_ranking(&user.user_id, &request_id)
        .await?;

    Ok(Json(json!({
        "ok": true,
        "rankedCount": outcome.ranked_count,
    })))
}

/// 当前志愿者拒绝指派
pub async fn decline_current(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<DispatchRequest>,
) -> ApiResult<Json<Value>> {
    let request_id = require_request_id(body)?;
    state
        .dispatch_service
        .decline_current(&user.user_id, &request_id)
        .await?;

    Ok(Json(json!({ "ok": true })))
}

/// 当前志愿者接受指派
pub async fn accept_current(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<DispatchRequest>,
) -> ApiResult<Json<Value>> {
    let request_id = require_request_id(body)?;
    state
        .dispatch_service
        .accept_current(&user.user_id, &request_id)
        .await?;

    Ok(Json(json!({ "ok": true })))
}
