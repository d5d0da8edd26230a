// ==========================================
// 配送机器人装载系统 - 装载错误类型
// ==========================================
// 封闭的错误枚举，携带结构化字段（包裹编码、状态、载重），
// 由展示层负责本地化与格式化（见 i18n 模块）。
// 所有变体均为请求拒绝，不是进程级故障。
// ==========================================

use crate::domain::types::RobotState;
use crate::repository::RepositoryError;
use thiserror::Error;

/// 装载批次错误
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("robot {serial_number} not found")]
    RobotNotFound { serial_number: String },

    #[error("robot can only be loaded while Idle or Loading (robot {serial_number} is {state})")]
    InvalidState {
        serial_number: String,
        state: RobotState,
    },

    #[error("package {code} was requested more than once; the same package cannot be loaded twice")]
    DuplicateRequest { code: String },

    #[error("package {code} is already loaded into robot {serial_number}")]
    AlreadyLoaded { serial_number: String, code: String },

    #[error("{}", package_not_found_message(.code, .available))]
    PackageNotFound {
        code: String,
        /// 用户名下可用的包裹编码；为空表示用户尚无任何包裹
        available: Vec<String>,
    },

    #[error("the robot cannot load the total weight of the selected packages (package {code}: requested {requested}, remaining capacity {capacity})")]
    CapacityExceeded {
        /// 使累计重量越界的包裹
        code: String,
        /// 批次开始时的剩余载重
        capacity: i32,
        /// 截至该包裹的累计重量
        requested: i32,
    },

    #[error("robot {serial_number} was modified concurrently; gave up after {attempts} attempts")]
    ConcurrentModification { serial_number: String, attempts: u32 },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl LoadError {
    /// 错误类别标识（供展示层映射状态码/文案）
    pub fn kind(&self) -> &'static str {
        match self {
            LoadError::RobotNotFound { .. } => "ROBOT_NOT_FOUND",
            LoadError::InvalidState { .. } => "INVALID_STATE",
            LoadError::DuplicateRequest { .. } => "DUPLICATE_REQUEST",
            LoadError::AlreadyLoaded { .. } => "ALREADY_LOADED",
            LoadError::PackageNotFound { .. } => "PACKAGE_NOT_FOUND",
            LoadError::CapacityExceeded { .. } => "CAPACITY_EXCEEDED",
            LoadError::ConcurrentModification { .. } => "CONCURRENT_MODIFICATION",
            LoadError::Repository(_) => "REPOSITORY",
        }
    }

    /// 是否属于请求校验失败（区别于基础设施错误）
    pub fn is_rejection(&self) -> bool {
        !matches!(self, LoadError::Repository(_))
    }
}

fn package_not_found_message(code: &str, available: &[String]) -> String {
    if available.is_empty() {
        "no packages exist for this user; create a package first".to_string()
    } else {
        format!(
            "package {} not found; the available packages are [{}]",
            code,
            available.join(", ")
        )
    }
}

pub type LoadResult<T> = Result<T, LoadError>;
