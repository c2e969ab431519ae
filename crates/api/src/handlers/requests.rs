use axum::extract::{Path, State};
use serde::Serialize;

use dispatch_core::DispatchError;
use dispatch_domain::entities::HelpRequest;

use crate::{
    auth::AuthenticatedUser,
    error::ApiResult,
    response::{success, ApiResponse},
    routes::AppState,
};

/// 求助请求视图
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HelpRequestView {
    pub id: String,
    pub owner_id: String,
    pub status: String,
    pub current_volunteer_id: Option<String>,
    pub current_volunteer_index: i64,
    pub last_response: Option<String>,
    pub last_responded_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<HelpRequest> for HelpRequestView {
    fn from(request: HelpRequest) -> Self {
        Self {
            id: request.id,
            owner_id: request.owner_id,
            status: request.status.to_string(),
            current_volunteer_id: request.current_volunteer_id,
            current_volunteer_index: request.current_volunteer_index,
            last_response: request.last_response,
            last_responded_at: request.last_responded_at,
        }
    }
}

/// 查看求助请求，仅所有者或当前被指派的志愿者可见
pub async fn get_request(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<HelpRequestView>> {
    let request = state
        .request_repo
        .get_by_id(&id)
        .await?
        .ok_or_else(|| DispatchError::RequestNotFound { id: id.clone() })?;

    let is_owner = request.owner_id == user.user_id;
    let is_current_volunteer = request.current_volunteer_id.as_deref() == Some(&user.user_id);
    if !is_owner && !is_current_volunteer {
        return Err(DispatchError::PermissionDenied(
            "只有请求所有者或当前志愿者可以查看".to_string(),
        )
        .into());
    }

    Ok(success(HelpRequestView::from(request)))
}
