// ==========================================
// 配送机器人装载系统 - 应用层
// ==========================================
// 职责: 将仓储、引擎与 API 装配到同一数据库
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
