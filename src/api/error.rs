// ==========================================
// 配送机器人装载系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换下层错误为用户友好的错误消息
// ==========================================

use crate::domain::error::DomainError;
use crate::engine::LoadError;
use crate::i18n::{localize_load_error, t_with_args};
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
/// 所有错误信息必须包含显式原因
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 装载拒绝（结构化，展示层本地化）
    // ==========================================
    #[error("装载被拒绝: {0}")]
    LoadRejected(LoadError),

    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("包裹仍装载在机器人上: {code}")]
    PackageInUse { code: String },

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },

    // ==========================================
    // 并发控制错误
    // ==========================================
    #[error("乐观锁冲突: {0}")]
    OptimisticLockFailure(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 面向用户的文案
    ///
    /// 装载拒绝与包裹占用按当前语言本地化，其余错误使用自身描述。
    pub fn user_message(&self) -> String {
        match self {
            ApiError::LoadRejected(err) => localize_load_error(err),
            ApiError::PackageInUse { code } => {
                t_with_args("package.in_use", &[("code", code.as_str())])
            }
            other => other.to_string(),
        }
    }

    /// 装载拒绝的错误类别（非装载错误返回 None）
    pub fn load_kind(&self) -> Option<&'static str> {
        match self {
            ApiError::LoadRejected(err) => Some(err.kind()),
            _ => None,
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// 目的: 将Repository层的技术错误转换为用户友好的业务错误
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            // 并发控制错误
            RepositoryError::OptimisticLockFailure {
                serial_number,
                expected,
                actual,
            } => ApiError::OptimisticLockFailure(format!(
                "机器人{}已被其他请求修改（期望revision={}，实际revision={}）",
                serial_number, expected, actual
            )),

            // 数据库错误
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }

            // 业务规则错误
            RepositoryError::BusinessRuleViolation(msg) => ApiError::BusinessRuleViolation(msg),

            // 数据质量错误
            RepositoryError::FieldValueError { field, message } => {
                ApiError::ValidationError(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::CorruptRecord(err) => ApiError::ValidationError(err.to_string()),

            // 通用错误
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 DomainError 转换（请求字段校验）
// ==========================================
impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidStateTransition { from, to } => ApiError::InvalidStateTransition {
                from: from.to_string(),
                to: to.to_string(),
            },
            other => ApiError::InvalidInput(other.to_string()),
        }
    }
}

// ==========================================
// 从 LoadError 转换
// 校验失败保持结构化；基础设施错误按仓储错误处理
// ==========================================
impl From<LoadError> for ApiError {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::Repository(repo_err) => repo_err.into(),
            rejection => ApiError::LoadRejected(rejection),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
