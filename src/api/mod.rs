// ==========================================
// 配送机器人装载系统 - API 层
// ==========================================
// 职责: 提供按用户隔离的业务接口，转换下层错误
// ==========================================

pub mod error;
pub mod package_api;
pub mod robot_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use package_api::{PackageApi, PackageInfo};
pub use robot_api::{BatteryInfo, RobotApi, RobotDetail, RobotInfo, RobotLoadView};
