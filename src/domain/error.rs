// ==========================================
// 配送机器人装载系统 - 领域层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use crate::domain::types::RobotState;
use thiserror::Error;

/// 领域层错误类型（实体构造与状态流转）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    // ===== 字段校验错误 =====
    #[error("字段长度错误 (field={field}): 长度 {actual} 不在 [{min}, {max}] 范围内")]
    LengthOutOfRange {
        field: &'static str,
        actual: usize,
        min: usize,
        max: usize,
    },

    #[error("字段格式错误 (field={field}): {message}")]
    InvalidFormat {
        field: &'static str,
        message: &'static str,
    },

    #[error("数值范围错误 (field={field}): 值 {value} 超出范围 [{min}, {max}]")]
    ValueOutOfRange {
        field: &'static str,
        value: i32,
        min: i32,
        max: i32,
    },

    // ===== 状态流转错误 =====
    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: RobotState, to: RobotState },
}

/// Result 类型别名
pub type DomainResult<T> = Result<T, DomainError>;
