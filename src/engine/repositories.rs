// ==========================================
// 配送机器人装载系统 - 引擎层协作接口
// ==========================================
// 职责: 定义装载引擎依赖的窄接口（依赖倒置）
// 说明: Engine 层定义 trait，Repository 层的 SQLite 实现在此适配
// ==========================================

use std::sync::Arc;

use crate::domain::package::Package;
use crate::domain::robot::Robot;
use crate::repository::{PackageRepository, RepositoryResult, RobotRepository};

// ==========================================
// Trait: RobotStore - 机器人读取与持久化
// ==========================================
pub trait RobotStore: Send + Sync {
    /// 按序列号查询机器人
    fn find_robot_by_serial(&self, serial_number: &str) -> RepositoryResult<Option<Robot>>;

    /// 持久化机器人（乐观锁）
    ///
    /// # 返回
    /// - Ok(i32): 新的 revision
    /// - Err(OptimisticLockFailure): 期间已有其他写入
    fn persist(&self, robot: &Robot) -> RepositoryResult<i32>;
}

// ==========================================
// Trait: PackageLookup - 包裹查询
// ==========================================
pub trait PackageLookup: Send + Sync {
    /// 查询用户名下全部包裹
    fn find_packages_by_owner(&self, owner_id: &str) -> RepositoryResult<Vec<Package>>;

    /// 按编码 + 所属用户查询包裹
    fn find_package_by_code_and_owner(
        &self,
        code: &str,
        owner_id: &str,
    ) -> RepositoryResult<Option<Package>>;
}

impl RobotStore for RobotRepository {
    fn find_robot_by_serial(&self, serial_number: &str) -> RepositoryResult<Option<Robot>> {
        self.find_by_serial(serial_number)
    }

    fn persist(&self, robot: &Robot) -> RepositoryResult<i32> {
        self.save(robot)
    }
}

impl PackageLookup for PackageRepository {
    fn find_packages_by_owner(&self, owner_id: &str) -> RepositoryResult<Vec<Package>> {
        self.find_by_owner(owner_id)
    }

    fn find_package_by_code_and_owner(
        &self,
        code: &str,
        owner_id: &str,
    ) -> RepositoryResult<Option<Package>> {
        self.find_by_code_and_owner(code, owner_id)
    }
}

/// 装载引擎仓储集合
///
/// 聚合装载引擎所需的协作接口，便于单元测试时替换为内存实现。
#[derive(Clone)]
pub struct LoadRepositories {
    /// 机器人读写
    pub robot_store: Arc<dyn RobotStore>,
    /// 包裹查询
    pub package_lookup: Arc<dyn PackageLookup>,
}

impl LoadRepositories {
    /// 创建新的仓储集合
    pub fn new(robot_store: Arc<dyn RobotStore>, package_lookup: Arc<dyn PackageLookup>) -> Self {
        Self {
            robot_store,
            package_lookup,
        }
    }

    /// 由 SQLite 仓储构建
    pub fn from_sqlite(robot_repo: Arc<RobotRepository>, package_repo: Arc<PackageRepository>) -> Self {
        Self {
            robot_store: robot_repo,
            package_lookup: package_repo,
        }
    }
}
