// ==========================================
// 配送机器人装载系统 - 机器人 API
// ==========================================
// 职责: 机器人创建、查询、删除、装载
// 约束: 所有操作按请求用户隔离；他人机器人一律视为不存在
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::api::error::{ApiError, ApiResult};
use crate::api::package_api::PackageInfo;
use crate::domain::capacity::RobotCapacity;
use crate::domain::robot::Robot;
use crate::domain::types::{RobotModel, RobotState};
use crate::engine::LoadBatchProcessor;
use crate::repository::robot_repo::RobotRepository;

// ==========================================
// RobotApi - 机器人 API
// ==========================================

/// 机器人API
///
/// 职责：
/// 1. 机器人创建（按机型推导默认载重）
/// 2. 机器人查询（本人列表、详情、可装载列表）
/// 3. 装载委托给装载引擎
pub struct RobotApi {
    robot_repo: Arc<RobotRepository>,
    processor: Arc<LoadBatchProcessor>,
}

impl RobotApi {
    /// 创建新的RobotApi实例
    pub fn new(robot_repo: Arc<RobotRepository>, processor: Arc<LoadBatchProcessor>) -> Self {
        Self {
            robot_repo,
            processor,
        }
    }

    /// 创建机器人
    ///
    /// # 参数
    /// - owner_id: 请求用户
    /// - serial_number: 序列号
    /// - model: 机型名称（大小写不敏感）或序号 0..=3
    /// - weight_limit: 载重上限（可选，缺省取机型默认值）
    ///
    /// # 返回
    /// - Ok(RobotInfo): 新建的机器人（Idle，电量 100）
    /// - Err(ApiError::InvalidInput): 机型或字段非法
    #[instrument(skip(self))]
    pub fn create_robot(
        &self,
        owner_id: &str,
        serial_number: &str,
        model: &str,
        weight_limit: Option<i32>,
    ) -> ApiResult<RobotInfo> {
        require_owner(owner_id)?;
        let model = parse_model(model)?;

        let robot = Robot::new(serial_number, owner_id, model, weight_limit)?;
        self.robot_repo.insert(&robot)?;

        tracing::info!(
            serial_number = robot.serial_number(),
            model = %model,
            weight_limit = robot.weight_limit(),
            "机器人已创建"
        );
        Ok(RobotInfo::from(&robot))
    }

    /// 查询本人的机器人（按序列号升序）
    pub fn list_robots(&self, owner_id: &str) -> ApiResult<Vec<RobotInfo>> {
        require_owner(owner_id)?;

        let robots = self.robot_repo.find_by_owner(owner_id)?;
        Ok(robots.iter().map(RobotInfo::from).collect())
    }

    /// 查询机器人详情（含已装载包裹明细）
    pub fn get_robot_detail(&self, owner_id: &str, serial_number: &str) -> ApiResult<RobotDetail> {
        let robot = self.fetch_owned(owner_id, serial_number)?;
        Ok(RobotDetail::from(&robot))
    }

    /// 删除本人的机器人
    ///
    /// 已装载关系随机器人一并删除，包裹本身保留。
    #[instrument(skip(self))]
    pub fn delete_robot(&self, owner_id: &str, serial_number: &str) -> ApiResult<()> {
        require_owner(owner_id)?;
        require_serial(serial_number)?;

        self.robot_repo.delete(serial_number, owner_id)?;
        tracing::info!("机器人已删除");
        Ok(())
    }

    /// 查询可装载的机器人（Idle / Loading，不区分用户）
    pub fn list_available_robots(&self) -> ApiResult<Vec<RobotInfo>> {
        let robots = self.robot_repo.find_available()?;
        Ok(robots.iter().map(RobotInfo::from).collect())
    }

    /// 查询机器人当前装载的包裹
    pub fn check_packages(
        &self,
        owner_id: &str,
        serial_number: &str,
    ) -> ApiResult<Vec<PackageInfo>> {
        let robot = self.fetch_owned(owner_id, serial_number)?;
        Ok(robot.packages().iter().map(PackageInfo::from).collect())
    }

    /// 查询机器人电量
    pub fn check_battery(&self, owner_id: &str, serial_number: &str) -> ApiResult<BatteryInfo> {
        let robot = self.fetch_owned(owner_id, serial_number)?;
        Ok(BatteryInfo {
            serial_number: robot.serial_number().to_string(),
            battery: robot.battery(),
        })
    }

    /// 装载一批包裹
    ///
    /// # 参数
    /// - owner_id: 请求用户
    /// - serial_number: 机器人序列号
    /// - codes: 包裹编码（按请求顺序处理）
    ///
    /// # 返回
    /// - Ok(RobotLoadView): 更新后的状态、剩余载重与全部已装载包裹编码
    /// - Err(ApiError::LoadRejected): 批次被整体拒绝（结构化原因）
    pub fn load_packages(
        &self,
        owner_id: &str,
        serial_number: &str,
        codes: &[String],
    ) -> ApiResult<RobotLoadView> {
        require_owner(owner_id)?;
        require_serial(serial_number)?;

        let robot = self
            .processor
            .attempt_load(serial_number, codes, owner_id)?;
        Ok(RobotLoadView::from(&robot))
    }

    fn fetch_owned(&self, owner_id: &str, serial_number: &str) -> ApiResult<Robot> {
        require_owner(owner_id)?;
        require_serial(serial_number)?;

        self.robot_repo
            .find_by_serial(serial_number)?
            .filter(|robot| robot.is_owned_by(owner_id))
            .ok_or_else(|| ApiError::NotFound(format!("Robot(id={})不存在", serial_number)))
    }
}

fn require_owner(owner_id: &str) -> ApiResult<()> {
    if owner_id.trim().is_empty() {
        return Err(ApiError::InvalidInput("用户ID不能为空".to_string()));
    }
    Ok(())
}

fn require_serial(serial_number: &str) -> ApiResult<()> {
    if serial_number.trim().is_empty() {
        return Err(ApiError::InvalidInput("机器人序列号不能为空".to_string()));
    }
    Ok(())
}

/// 解析机型：名称或 0..=3 的序号
fn parse_model(raw: &str) -> ApiResult<RobotModel> {
    if let Some(model) = RobotModel::from_str(raw) {
        return Ok(model);
    }
    raw.trim()
        .parse::<usize>()
        .ok()
        .and_then(|idx| RobotModel::ALL.get(idx).copied())
        .ok_or_else(|| {
            let acceptable: Vec<&str> = RobotModel::ALL.iter().map(|m| m.to_db_str()).collect();
            ApiError::InvalidInput(format!(
                "无效机型 '{}'。Acceptable values are {}",
                raw,
                acceptable.join(", ")
            ))
        })
}

// ==========================================
// DTO 类型定义
// ==========================================

/// 机器人信息（列表视图）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobotInfo {
    pub serial_number: String,
    pub model: RobotModel,
    pub weight_limit: i32,
    pub battery: i32,
    pub state: RobotState,
    pub loaded_weight: i32,
    pub utilization_ratio: f64,
}

impl From<&Robot> for RobotInfo {
    fn from(robot: &Robot) -> Self {
        Self {
            serial_number: robot.serial_number().to_string(),
            model: robot.model(),
            weight_limit: robot.remaining_capacity(),
            battery: robot.battery(),
            state: robot.state(),
            loaded_weight: robot.loaded_weight(),
            utilization_ratio: robot.utilization_ratio(),
        }
    }
}

/// 机器人详情
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobotDetail {
    pub serial_number: String,
    pub model: RobotModel,
    pub weight_limit: i32,
    pub initial_weight_limit: i32,
    pub battery: i32,
    pub state: RobotState,
    pub packages: Vec<PackageInfo>,
}

impl From<&Robot> for RobotDetail {
    fn from(robot: &Robot) -> Self {
        Self {
            serial_number: robot.serial_number().to_string(),
            model: robot.model(),
            weight_limit: robot.weight_limit(),
            initial_weight_limit: robot.initial_weight_limit(),
            battery: robot.battery(),
            state: robot.state(),
            packages: robot.packages().iter().map(PackageInfo::from).collect(),
        }
    }
}

/// 装载结果视图
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobotLoadView {
    pub serial_number: String,
    pub state: RobotState,
    pub weight_limit: i32,
    pub packages: Vec<String>,
}

impl From<&Robot> for RobotLoadView {
    fn from(robot: &Robot) -> Self {
        Self {
            serial_number: robot.serial_number().to_string(),
            state: robot.state(),
            weight_limit: robot.weight_limit(),
            packages: robot.package_codes(),
        }
    }
}

/// 电量信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatteryInfo {
    pub serial_number: String,
    pub battery: i32,
}
