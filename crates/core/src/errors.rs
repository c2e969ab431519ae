use thiserror::Error;

/// 调度器错误类型定义
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("缺少调用者身份")]
    Unauthenticated,

    #[error("无效的请求参数: {0}")]
    InvalidArgument(String),

    #[error("求助请求未找到: {id}")]
    RequestNotFound { id: String },

    #[error("排序结果未找到: {id}")]
    RankingNotFound { id: String },

    #[error("权限不足: {0}")]
    PermissionDenied(String),

    #[error("请求状态不允许该操作: {0}")]
    InvalidState(String),

    #[error("排序结果已存在: {id}")]
    RankingExists { id: String },

    #[error("排序服务输出格式错误: {0}")]
    RankingFormat(String),

    #[error("排序服务不可用: {0}")]
    OracleUnavailable(String),

    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("数据库操作错误: {0}")]
    DatabaseOperation(String),

    #[error("序列化错误: {0}")]
    Serialization(String),

    #[error("配置错误: {0}")]
    Configuration(String),

    #[error("内部错误: {0}")]
    Internal(String),
}

/// 统一的Result类型
pub type DispatchResult<T> = std::result::Result<T, DispatchError>;
