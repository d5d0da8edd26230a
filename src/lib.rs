// ==========================================
// 配送机器人装载系统 - 核心库
// ==========================================
// 职责: 机器人装载状态机与载重分配
// 技术栈: Rust + SQLite
// 红线: 装载批次全部成功或全部拒绝
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "en");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 装载规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组件装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{RobotModel, RobotState};

// 领域实体
pub use domain::{Package, Robot, RobotCapacity};

// 引擎
pub use engine::{LoadBatchProcessor, LoadConfig, LoadError, LoadRepositories};

// API
pub use api::{ApiError, PackageApi, RobotApi};

// ==========================================
// 版本信息
// ==========================================
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "Robot Dispatch";
