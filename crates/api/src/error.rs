use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use dispatch_core::DispatchError;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("调度错误: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("认证错误: {0}")]
    Authentication(#[from] crate::auth::AuthError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message, error_type) = match &self {
            ApiError::Dispatch(DispatchError::Unauthenticated) => (
                StatusCode::UNAUTHORIZED,
                "缺少调用者身份".to_string(),
                "UNAUTHENTICATED",
            ),
            ApiError::Dispatch(DispatchError::InvalidArgument(msg)) => (
                StatusCode::BAD_REQUEST,
                format!("请求参数错误: {msg}"),
                "INVALID_ARGUMENT",
            ),
            ApiError::Dispatch(DispatchError::RequestNotFound { id }) => (
                StatusCode::NOT_FOUND,
                format!("求助请求 {id} 不存在"),
                "REQUEST_NOT_FOUND",
            ),
            ApiError::Dispatch(DispatchError::RankingNotFound { id }) => (
                StatusCode::NOT_FOUND,
                format!("请求 {id} 的排序结果不存在"),
                "RANKING_NOT_FOUND",
            ),
            ApiError::Dispatch(DispatchError::PermissionDenied(msg)) => (
                StatusCode::FORBIDDEN,
                format!("权限不足: {msg}"),
                "PERMISSION_DENIED",
            ),
            ApiError::Dispatch(DispatchError::InvalidState(msg)) => (
                StatusCode::CONFLICT,
                format!("请求状态不允许该操作: {msg}"),
                "INVALID_STATE",
            ),
            ApiError::Dispatch(DispatchError::RankingExists { id }) => (
                StatusCode::CONFLICT,
                format!("请求 {id} 的排序结果已存在"),
                "RANKING_EXISTS",
            ),
            ApiError::Dispatch(DispatchError::RankingFormat(msg)) => (
                StatusCode::BAD_GATEWAY,
                format!("排序服务输出格式错误: {msg}"),
                "RANKING_FORMAT_ERROR",
            ),
            ApiError::Dispatch(DispatchError::OracleUnavailable(msg)) => (
                StatusCode::BAD_GATEWAY,
                format!("排序服务不可用: {msg}"),
                "ORACLE_UNAVAILABLE",
            ),
            ApiError::Authentication(auth_error) => {
                let status = StatusCode::UNAUTHORIZED;
                (
                    status,
                    format!("认证失败: {auth_error}"),
                    "AUTHENTICATION_ERROR",
                )
            }
            ApiError::Dispatch(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "系统内部错误".to_string(),
                "INTERNAL_ERROR",
            ),
        };

        let body = Json(json!({
            "error": {
                "message": error_message,
                "type": error_type,
                "code": status.as_u16(),
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
