// ==========================================
// 仓库货位台账 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换Repository错误为调用方可区分的错误
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 配置与连接错误
    // ==========================================
    /// 调用方应引导用户到设置页，而不是按普通失败处理
    #[error("数据库未配置，请先在设置中配置连接")]
    ConfigMissing,

    #[error("数据库连接失败: {0}")]
    ConnectionFailure(String),

    // ==========================================
    // 业务错误
    // ==========================================
    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("数据验证失败: {0}")]
    ValidationFailure(String),

    #[error("用户名或密码错误，或账号已停用")]
    InvalidCredentials,

    // ==========================================
    // 数据访问错误
    // ==========================================
    /// 事务已整体回滚，主库状态未改变
    #[error("写入失败，已回滚: {0}")]
    WriteRolledBack(String),

    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("内部错误: {0}")]
    InternalError(String),
}

impl ApiError {
    /// 是否需要引导到连接配置
    pub fn needs_config(&self) -> bool {
        matches!(self, ApiError::ConfigMissing)
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::ConfigMissing => ApiError::ConfigMissing,
            RepositoryError::DatabaseConnectionError(msg) => ApiError::ConnectionFailure(msg),
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::ValidationError(msg) => ApiError::ValidationFailure(msg),
            RepositoryError::FieldValueError { field, message } => {
                ApiError::ValidationFailure(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::DatabaseTransactionError(msg) => ApiError::WriteRolledBack(msg),
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::DatabaseError(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::DatabaseError(format!("外键约束违反: {}", msg))
            }
            RepositoryError::LockError(msg) => ApiError::InternalError(msg),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
