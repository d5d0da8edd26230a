// ==========================================
// 配送机器人装载系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、载重记账规则
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod capacity;
pub mod error;
pub mod package;
pub mod robot;
pub mod types;

// 重导出核心类型
pub use capacity::{remaining_capacity, RobotCapacity};
pub use error::{DomainError, DomainResult};
pub use package::Package;
pub use robot::{LoadPlan, Robot, RobotRecord};
pub use types::{default_weight_limit, RobotModel, RobotState};
