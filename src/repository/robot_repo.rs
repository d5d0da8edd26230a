// ==========================================
// 配送机器人装载系统 - 机器人数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 并发: robot.revision 乐观锁，保存时校验版本号
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::package::Package;
use crate::domain::robot::{Robot, RobotRecord};
use crate::domain::types::{RobotModel, RobotState};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{
    params, Connection, OptionalExtension, Result as SqliteResult, Row, TransactionBehavior,
};
use std::sync::{Arc, Mutex};

const ROBOT_COLUMNS: &str = r#"
    serial_number, owner_id, robot_model,
    weight_limit, initial_weight_limit, battery,
    state, revision
"#;

// ==========================================
// RobotRow - 原始行（字符串枚举尚未解析）
// ==========================================
struct RobotRow {
    serial_number: String,
    owner_id: String,
    robot_model: String,
    weight_limit: i32,
    initial_weight_limit: i32,
    battery: i32,
    state: String,
    revision: i32,
}

impl RobotRow {
    fn from_row(row: &Row<'_>) -> SqliteResult<Self> {
        Ok(Self {
            serial_number: row.get(0)?,
            owner_id: row.get(1)?,
            robot_model: row.get(2)?,
            weight_limit: row.get(3)?,
            initial_weight_limit: row.get(4)?,
            battery: row.get(5)?,
            state: row.get(6)?,
            revision: row.get(7)?,
        })
    }

    fn into_robot(self, packages: Vec<Package>) -> RepositoryResult<Robot> {
        let model = RobotModel::from_str(&self.robot_model).ok_or_else(|| {
            RepositoryError::FieldValueError {
                field: "robot_model".to_string(),
                message: format!("unknown robot model: {}", self.robot_model),
            }
        })?;
        let state = RobotState::from_str(&self.state).ok_or_else(|| {
            RepositoryError::FieldValueError {
                field: "state".to_string(),
                message: format!("unknown robot state: {}", self.state),
            }
        })?;

        let robot = Robot::from_record(RobotRecord {
            serial_number: self.serial_number,
            owner_id: self.owner_id,
            model,
            weight_limit: self.weight_limit,
            initial_weight_limit: self.initial_weight_limit,
            battery: self.battery,
            state,
            packages,
            revision: self.revision,
        })?;
        Ok(robot)
    }
}

// ==========================================
// RobotRepository - 机器人仓储
// ==========================================
/// 机器人仓储
/// 职责: 管理 robot / robot_package 表
/// 红线: 不含业务逻辑，只负责数据访问
pub struct RobotRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RobotRepository {
    /// 创建新的 RobotRepository 实例
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

    /// 新建机器人（不含包裹）
    pub fn insert(&self, robot: &Robot) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let now = chrono::Local::now().naive_local().to_string();
        conn.execute(
            r#"
            INSERT INTO robot (
                serial_number, owner_id, robot_model,
                weight_limit, initial_weight_limit, battery,
                state, revision, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
            "#,
            params![
                robot.serial_number(),
                robot.owner_id(),
                robot.model().to_db_str(),
                robot.weight_limit(),
                robot.initial_weight_limit(),
                robot.battery(),
                robot.state().to_db_str(),
                robot.revision(),
                now,
            ],
        )?;
        Ok(())
    }

    /// 按序列号查询（含已装载包裹）
    pub fn find_by_serial(&self, serial_number: &str) -> RepositoryResult<Option<Robot>> {
        let conn = self.get_conn()?;
        // 机器人行与装载关系在同一读事务内读取，保证 revision 与包裹集合一致
        let tx = conn.unchecked_transaction()?;
        let sql = format!("SELECT {} FROM robot WHERE serial_number = ?1", ROBOT_COLUMNS);
        let row = tx
            .query_row(&sql, params![serial_number], RobotRow::from_row)
            .optional()?;

        match row {
            Some(row) => {
                let packages = load_packages(&tx, &row.serial_number)?;
                Ok(Some(row.into_robot(packages)?))
            }
            None => Ok(None),
        }
    }

    /// 查询用户名下所有机器人（按序列号升序）
    pub fn find_by_owner(&self, owner_id: &str) -> RepositoryResult<Vec<Robot>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM robot WHERE owner_id = ?1 ORDER BY serial_number ASC",
            ROBOT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![owner_id], RobotRow::from_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        hydrate(&conn, rows)
    }

    /// 查询可装载的机器人（Idle / Loading，不区分用户）
    pub fn find_available(&self) -> RepositoryResult<Vec<Robot>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM robot WHERE state IN (?1, ?2) ORDER BY serial_number ASC",
            ROBOT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(
                params![RobotState::Idle.to_db_str(), RobotState::Loading.to_db_str()],
                RobotRow::from_row,
            )?
            .collect::<SqliteResult<Vec<_>>>()?;

        hydrate(&conn, rows)
    }

    /// 保存机器人（乐观锁）
    ///
    /// 单事务内完成：
    /// 1. 按 revision 更新 weight_limit / battery / state，revision + 1
    /// 2. 追加尚未落库的装载关系
    ///
    /// # 返回
    /// - Ok(i32): 新的 revision
    ///
    /// # 错误
    /// - `OptimisticLockFailure`: revision 不匹配（其他请求已先提交）
    /// - `NotFound`: 机器人不存在
    pub fn save(&self, robot: &Robot) -> RepositoryResult<i32> {
        let mut conn = self.get_conn()?;
        // 立即获取写锁，多连接并发写入时由 busy_timeout 排队
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let now = chrono::Local::now().naive_local().to_string();

        let affected = tx.execute(
            r#"
            UPDATE robot
            SET weight_limit = ?1, battery = ?2, state = ?3,
                revision = revision + 1, updated_at = ?4
            WHERE serial_number = ?5 AND revision = ?6
            "#,
            params![
                robot.weight_limit(),
                robot.battery(),
                robot.state().to_db_str(),
                now,
                robot.serial_number(),
                robot.revision(),
            ],
        )?;

        if affected == 0 {
            // 判断是记录不存在还是revision冲突
            let actual: Option<i32> = tx
                .query_row(
                    "SELECT revision FROM robot WHERE serial_number = ?1",
                    params![robot.serial_number()],
                    |row| row.get(0),
                )
                .optional()?;
            return Err(match actual {
                Some(actual) => RepositoryError::OptimisticLockFailure {
                    serial_number: robot.serial_number().to_string(),
                    expected: robot.revision(),
                    actual,
                },
                None => RepositoryError::NotFound {
                    entity: "Robot".to_string(),
                    id: robot.serial_number().to_string(),
                },
            });
        }

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT OR IGNORE INTO robot_package (serial_number, package_code, seq_no, loaded_at)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )?;
            for (seq_no, package) in robot.packages().iter().enumerate() {
                stmt.execute(params![robot.serial_number(), package.code, seq_no as i64, now])?;
            }
        }

        tx.commit()?;
        Ok(robot.revision() + 1)
    }

    /// 删除用户名下的机器人（装载关系级联删除）
    ///
    /// # 错误
    /// - `NotFound`: 不存在或属于其他用户
    pub fn delete(&self, serial_number: &str, owner_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM robot WHERE serial_number = ?1 AND owner_id = ?2",
            params![serial_number, owner_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Robot".to_string(),
                id: serial_number.to_string(),
            });
        }
        Ok(())
    }
}

/// 查询机器人已装载的包裹（按装载顺序）
fn load_packages(conn: &Connection, serial_number: &str) -> RepositoryResult<Vec<Package>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT p.code, p.name, p.weight, p.owner_id
        FROM robot_package rp
        JOIN package p ON p.code = rp.package_code
        WHERE rp.serial_number = ?1
        ORDER BY rp.seq_no ASC
        "#,
    )?;
    let packages = stmt
        .query_map(params![serial_number], |row| {
            Ok(Package {
                code: row.get(0)?,
                name: row.get(1)?,
                weight: row.get(2)?,
                owner_id: row.get(3)?,
            })
        })?
        .collect::<SqliteResult<Vec<_>>>()?;
    Ok(packages)
}

fn hydrate(conn: &Connection, rows: Vec<RobotRow>) -> RepositoryResult<Vec<Robot>> {
    rows.into_iter()
        .map(|row| {
            let packages = load_packages(conn, &row.serial_number)?;
            row.into_robot(packages)
        })
        .collect()
}
