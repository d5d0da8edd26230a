// ==========================================
// 配送机器人装载系统 - 包裹 API
// ==========================================
// 职责: 包裹创建、查询、删除
// 红线: 仍装载在机器人上的包裹不可删除
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::package::Package;
use crate::repository::package_repo::PackageRepository;

// ==========================================
// PackageApi - 包裹 API
// ==========================================
pub struct PackageApi {
    package_repo: Arc<PackageRepository>,
}

impl PackageApi {
    /// 创建新的PackageApi实例
    pub fn new(package_repo: Arc<PackageRepository>) -> Self {
        Self { package_repo }
    }

    /// 创建包裹
    ///
    /// # 参数
    /// - owner_id: 请求用户
    /// - code: 包裹编码（5..=50，大写字母/数字/下划线）
    /// - name: 包裹名称（5..=255，字母/数字/下划线/连字符）
    /// - weight: 重量（1..=500）
    #[instrument(skip(self))]
    pub fn create_package(
        &self,
        owner_id: &str,
        code: &str,
        name: &str,
        weight: i32,
    ) -> ApiResult<PackageInfo> {
        require_owner(owner_id)?;

        let package = Package::new(code, name, weight, owner_id)?;
        self.package_repo.insert(&package)?;

        tracing::info!(weight, "包裹已创建");
        Ok(PackageInfo::from(&package))
    }

    /// 查询本人的包裹（按名称降序）
    pub fn list_packages(&self, owner_id: &str) -> ApiResult<Vec<PackageInfo>> {
        require_owner(owner_id)?;

        let packages = self.package_repo.find_by_owner(owner_id)?;
        Ok(packages.iter().map(PackageInfo::from).collect())
    }

    /// 查询本人的单个包裹
    pub fn get_package(&self, owner_id: &str, code: &str) -> ApiResult<PackageInfo> {
        require_owner(owner_id)?;
        require_code(code)?;

        self.package_repo
            .find_by_code_and_owner(code, owner_id)?
            .map(|p| PackageInfo::from(&p))
            .ok_or_else(|| ApiError::NotFound(format!("Package(id={})不存在", code)))
    }

    /// 删除本人的包裹
    ///
    /// # 返回
    /// - Err(ApiError::PackageInUse): 包裹仍装载在某个机器人上
    /// - Err(ApiError::NotFound): 包裹不存在或属于其他用户
    #[instrument(skip(self))]
    pub fn delete_package(&self, owner_id: &str, code: &str) -> ApiResult<()> {
        require_owner(owner_id)?;
        require_code(code)?;

        if self
            .package_repo
            .find_by_code_and_owner(code, owner_id)?
            .is_none()
        {
            return Err(ApiError::NotFound(format!("Package(id={})不存在", code)));
        }
        if self.package_repo.is_referenced_by_robot(code)? {
            tracing::warn!("包裹仍装载在机器人上，拒绝删除");
            return Err(ApiError::PackageInUse {
                code: code.to_string(),
            });
        }

        // 仓储层在事务内再次校验引用，覆盖检查与删除之间的并发装载
        match self.package_repo.delete(code, owner_id) {
            Ok(()) => {
                tracing::info!("包裹已删除");
                Ok(())
            }
            Err(crate::repository::RepositoryError::BusinessRuleViolation(_)) => {
                Err(ApiError::PackageInUse {
                    code: code.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn require_owner(owner_id: &str) -> ApiResult<()> {
    if owner_id.trim().is_empty() {
        return Err(ApiError::InvalidInput("用户ID不能为空".to_string()));
    }
    Ok(())
}

fn require_code(code: &str) -> ApiResult<()> {
    if code.trim().is_empty() {
        return Err(ApiError::InvalidInput("包裹编码不能为空".to_string()));
    }
    Ok(())
}

// ==========================================
// DTO 类型定义
// ==========================================

/// 包裹信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInfo {
    pub code: String,
    pub name: String,
    pub weight: i32,
}

impl From<&Package> for PackageInfo {
    fn from(package: &Package) -> Self {
        Self {
            code: package.code.clone(),
            name: package.name.clone(),
            weight: package.weight,
        }
    }
}
