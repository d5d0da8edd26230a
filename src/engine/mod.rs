// ==========================================
// 配送机器人装载系统 - 引擎层
// ==========================================
// 职责: 实现装载业务规则,不拼 SQL
// 红线: Engine 不拼 SQL, 所有拒绝必须输出结构化原因
// ==========================================

pub mod error;
pub mod load_batch;
pub mod repositories;

// 重导出核心引擎
pub use error::{LoadError, LoadResult};
pub use load_batch::{LoadBatchProcessor, LoadConfig};
pub use repositories::{LoadRepositories, PackageLookup, RobotStore};
