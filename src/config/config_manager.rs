// ==========================================
// 配送机器人装载系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::db::open_sqlite_connection;
use crate::engine::LoadConfig;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

/// 默认语言
pub const DEFAULT_LOCALE: &str = "en";

/// 受支持的语言
pub const SUPPORTED_LOCALES: [&str; 2] = ["en", "zh-CN"];

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at)
             VALUES ('global', ?1, ?2, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 获取所有配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn.prepare(
            "SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key"
        )?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
            ))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        let json_value = json!(config_map);
        Ok(serde_json::to_string(&json_value)?)
    }

    // ===== 装载配置 =====

    /// 获取乐观锁冲突重试次数
    ///
    /// # 返回
    /// - u32: 重试次数（默认 3；格式错误时回退默认值）
    pub fn get_conflict_retry_limit(&self) -> Result<u32, Box<dyn Error>> {
        let default = LoadConfig::default().conflict_retry_limit;
        let value =
            self.get_config_or_default(config_keys::LOAD_CONFLICT_RETRY_LIMIT, &default.to_string())?;
        Ok(value.trim().parse::<u32>().unwrap_or_else(|_| {
            tracing::warn!(
                config_key = config_keys::LOAD_CONFLICT_RETRY_LIMIT,
                raw_value = %value,
                "重试次数配置格式错误，使用默认值"
            );
            default
        }))
    }

    /// 组装装载引擎配置
    pub fn load_config(&self) -> Result<LoadConfig, Box<dyn Error>> {
        Ok(LoadConfig {
            conflict_retry_limit: self.get_conflict_retry_limit()?,
        })
    }

    // ===== 展示配置 =====

    /// 获取展示语言（"en" 或 "zh-CN"，未知值回退 "en"）
    pub fn get_locale(&self) -> Result<String, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::APP_LOCALE, DEFAULT_LOCALE)?;
        if SUPPORTED_LOCALES.contains(&value.as_str()) {
            Ok(value)
        } else {
            tracing::warn!(
                config_key = config_keys::APP_LOCALE,
                raw_value = %value,
                "不支持的语言配置，使用默认语言"
            );
            Ok(DEFAULT_LOCALE.to_string())
        }
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 装载
    pub const LOAD_CONFLICT_RETRY_LIMIT: &str = "load.conflict_retry_limit";

    // 展示
    pub const APP_LOCALE: &str = "app.locale";
}
