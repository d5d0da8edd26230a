// ==========================================
// 配送机器人装载系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{PackageApi, RobotApi};
use crate::config::config_manager::{config_keys, ConfigManager};
use crate::db::{init_schema, open_sqlite_connection};
use crate::engine::{LoadBatchProcessor, LoadRepositories};
use crate::repository::{PackageRepository, RobotRepository};

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 机器人API
    pub robot_api: Arc<RobotApi>,

    /// 包裹API
    pub package_api: Arc<PackageApi>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径（不存在时自动建库建表）
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("无法初始化数据库结构: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let robot_repo = Arc::new(RobotRepository::from_connection(conn.clone()));
        let package_repo = Arc::new(PackageRepository::from_connection(conn.clone()));

        // ==========================================
        // 初始化配置
        // ==========================================
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn)
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );
        let load_config = config_manager
            .load_config()
            .map_err(|e| format!("无法读取装载配置: {}", e))?;
        let locale = config_manager
            .get_locale()
            .map_err(|e| format!("无法读取语言配置: {}", e))?;
        // 仅在显式配置语言时切换全局 locale
        let locale_configured = config_manager
            .get_global_config_value(config_keys::APP_LOCALE)
            .map_err(|e| format!("无法读取语言配置: {}", e))?
            .is_some();
        if locale_configured {
            crate::i18n::set_locale(&locale);
        }

        // ==========================================
        // 初始化Engine与API层
        // ==========================================
        let repos = LoadRepositories::from_sqlite(robot_repo.clone(), package_repo.clone());
        let processor = Arc::new(LoadBatchProcessor::new(repos, load_config));

        let robot_api = Arc::new(RobotApi::new(robot_repo, processor));
        let package_api = Arc::new(PackageApi::new(package_repo));

        tracing::info!(locale = %locale, "AppState初始化完成");

        Ok(Self {
            db_path,
            robot_api,
            package_api,
            config_manager,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先读取环境变量 ROBOT_DISPATCH_DB_PATH；否则使用用户数据目录。
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("ROBOT_DISPATCH_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./robot_dispatch.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("robot-dispatch");
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("robot_dispatch.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_app_state_wires_shared_database() {
        let temp_file = NamedTempFile::new().unwrap();
        let db_path = temp_file.path().to_str().unwrap().to_string();

        let state = AppState::new(db_path.clone()).unwrap();
        assert_eq!(state.db_path, db_path);

        state
            .package_api
            .create_package("alice", "PKG_001", "Parcel-01", 40)
            .unwrap();
        state
            .robot_api
            .create_robot("alice", "RB-0001", "LIGHTWEIGHT", None)
            .unwrap();

        let view = state
            .robot_api
            .load_packages("alice", "RB-0001", &["PKG_001".to_string()])
            .unwrap();
        assert_eq!(view.weight_limit, 60);
        assert_eq!(view.packages, vec!["PKG_001".to_string()]);
    }
}
