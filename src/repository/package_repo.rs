// ==========================================
// 配送机器人装载系统 - 包裹数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 约束: 所有查询使用参数化
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::package::Package;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// PackageRepository - 包裹仓储
// ==========================================
/// 包裹仓储
/// 职责: 管理 package 表的 CRUD 操作，以及被机器人引用情况的查询
pub struct PackageRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PackageRepository {
    /// 创建新的 PackageRepository 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新建包裹
    pub fn insert(&self, package: &Package) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO package (code, name, weight, owner_id, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                package.code,
                package.name,
                package.weight,
                package.owner_id,
                chrono::Local::now().naive_local().to_string(),
            ],
        )?;
        Ok(())
    }

    /// 按编码查询（不区分用户）
    pub fn find_by_code(&self, code: &str) -> RepositoryResult<Option<Package>> {
        let conn = self.get_conn()?;
        let package = conn
            .query_row(
                "SELECT code, name, weight, owner_id FROM package WHERE code = ?1",
                params![code],
                map_package_row,
            )
            .optional()?;
        Ok(package)
    }

    /// 按编码 + 所属用户查询
    ///
    /// # 返回
    /// - Ok(Some(Package)): 该用户名下存在此包裹
    /// - Ok(None): 不存在或属于其他用户
    pub fn find_by_code_and_owner(
        &self,
        code: &str,
        owner_id: &str,
    ) -> RepositoryResult<Option<Package>> {
        let conn = self.get_conn()?;
        let package = conn
            .query_row(
                "SELECT code, name, weight, owner_id FROM package WHERE code = ?1 AND owner_id = ?2",
                params![code, owner_id],
                map_package_row,
            )
            .optional()?;
        Ok(package)
    }

    /// 查询用户名下所有包裹（按名称倒序）
    pub fn find_by_owner(&self, owner_id: &str) -> RepositoryResult<Vec<Package>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT code, name, weight, owner_id
            FROM package
            WHERE owner_id = ?1
            ORDER BY name DESC, code ASC
            "#,
        )?;

        let packages = stmt
            .query_map(params![owner_id], map_package_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(packages)
    }

    /// 包裹当前是否被任一机器人装载
    pub fn is_referenced_by_robot(&self, code: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let exists: Option<i32> = conn
            .query_row(
                "SELECT 1 FROM robot_package WHERE package_code = ?1 LIMIT 1",
                params![code],
                |row| row.get(0),
            )
            .optional()?;
        Ok(exists.is_some())
    }

    /// 删除用户名下的包裹
    ///
    /// # 错误
    /// - `NotFound`: 包裹不存在或属于其他用户
    /// - `BusinessRuleViolation`: 包裹仍装载在机器人上
    pub fn delete(&self, code: &str, owner_id: &str) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let owned: Option<i32> = tx
            .query_row(
                "SELECT 1 FROM package WHERE code = ?1 AND owner_id = ?2",
                params![code, owner_id],
                |row| row.get(0),
            )
            .optional()?;
        if owned.is_none() {
            return Err(RepositoryError::NotFound {
                entity: "Package".to_string(),
                id: code.to_string(),
            });
        }

        let referenced: Option<i32> = tx
            .query_row(
                "SELECT 1 FROM robot_package WHERE package_code = ?1 LIMIT 1",
                params![code],
                |row| row.get(0),
            )
            .optional()?;
        if referenced.is_some() {
            return Err(RepositoryError::BusinessRuleViolation(format!(
                "package {} is currently loaded into a robot",
                code
            )));
        }

        tx.execute(
            "DELETE FROM package WHERE code = ?1 AND owner_id = ?2",
            params![code, owner_id],
        )?;
        tx.commit()?;
        Ok(())
    }
}

fn map_package_row(row: &Row<'_>) -> SqliteResult<Package> {
    Ok(Package {
        code: row.get(0)?,
        name: row.get(1)?,
        weight: row.get(2)?,
        owner_id: row.get(3)?,
    })
}
