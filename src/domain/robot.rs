// ==========================================
// 配送机器人装载系统 - 机器人领域模型
// ==========================================
// 聚合根: Robot（状态 + 剩余载重 + 已装载包裹）
// 红线: packages 与 weight_limit 只能经由 apply_load 修改
// 红线: 0 <= weight_limit <= 机型封顶值
// ==========================================

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::package::Package;
use crate::domain::types::{default_weight_limit, RobotModel, RobotState, MIN_WEIGHT_LIMIT};
use serde::Serialize;

pub const SERIAL_MIN_LEN: usize = 5;
pub const SERIAL_MAX_LEN: usize = 100;
pub const DEFAULT_BATTERY: i32 = 100;

// ==========================================
// RobotRecord - 持久化快照
// ==========================================
// 对齐: robot 表 + robot_package 关联表
// 用途: 仓储层读出后经 Robot::from_record 还原聚合（带不变量校验）
#[derive(Debug, Clone)]
pub struct RobotRecord {
    pub serial_number: String,
    pub owner_id: String,
    pub model: RobotModel,
    pub weight_limit: i32,
    pub initial_weight_limit: i32,
    pub battery: i32,
    pub state: RobotState,
    pub packages: Vec<Package>,
    pub revision: i32,
}

// ==========================================
// LoadPlan - 已通过校验的装载批次
// ==========================================
// 只能由装载引擎构造，保证 remaining = weight_limit - sum(weights) >= 0
#[derive(Debug, Clone)]
pub struct LoadPlan {
    pub(crate) packages: Vec<Package>,
    pub(crate) remaining: i32,
}

impl LoadPlan {
    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    pub fn remaining(&self) -> i32 {
        self.remaining
    }

    pub fn total_weight(&self) -> i32 {
        self.packages.iter().map(|p| p.weight).sum()
    }
}

// ==========================================
// Robot - 配送机器人
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Robot {
    serial_number: String,
    owner_id: String,
    model: RobotModel,
    weight_limit: i32,
    initial_weight_limit: i32,
    battery: i32,
    state: RobotState,
    packages: Vec<Package>,
    #[serde(skip)]
    revision: i32,
}

impl Robot {
    /// 创建新机器人
    ///
    /// # 参数
    /// - `serial_number`: 序列号（5..=100 字符，创建后不可变）
    /// - `owner_id`: 所属用户
    /// - `model`: 机型
    /// - `weight_limit`: 载重上限；None 时按机型默认值
    ///
    /// # 返回
    /// 状态为 Idle、电量 100、无包裹的机器人
    pub fn new(
        serial_number: impl Into<String>,
        owner_id: impl Into<String>,
        model: RobotModel,
        weight_limit: Option<i32>,
    ) -> DomainResult<Self> {
        let serial_number = serial_number.into();
        validate_serial_number(&serial_number)?;

        let weight_limit = weight_limit.unwrap_or_else(|| default_weight_limit(model));
        if !(MIN_WEIGHT_LIMIT..=model.max_weight_limit()).contains(&weight_limit) {
            return Err(DomainError::ValueOutOfRange {
                field: "weight_limit",
                value: weight_limit,
                min: MIN_WEIGHT_LIMIT,
                max: model.max_weight_limit(),
            });
        }

        Ok(Self {
            serial_number,
            owner_id: owner_id.into(),
            model,
            weight_limit,
            initial_weight_limit: weight_limit,
            battery: DEFAULT_BATTERY,
            state: RobotState::Idle,
            packages: Vec::new(),
            revision: 0,
        })
    }

    /// 从持久化快照还原
    pub fn from_record(record: RobotRecord) -> DomainResult<Self> {
        validate_serial_number(&record.serial_number)?;

        let cap = record.model.max_weight_limit();
        if !(0..=cap).contains(&record.weight_limit) {
            return Err(DomainError::ValueOutOfRange {
                field: "weight_limit",
                value: record.weight_limit,
                min: 0,
                max: cap,
            });
        }
        if !(MIN_WEIGHT_LIMIT..=cap).contains(&record.initial_weight_limit) {
            return Err(DomainError::ValueOutOfRange {
                field: "initial_weight_limit",
                value: record.initial_weight_limit,
                min: MIN_WEIGHT_LIMIT,
                max: cap,
            });
        }
        if !(0..=100).contains(&record.battery) {
            return Err(DomainError::ValueOutOfRange {
                field: "battery",
                value: record.battery,
                min: 0,
                max: 100,
            });
        }

        Ok(Self {
            serial_number: record.serial_number,
            owner_id: record.owner_id,
            model: record.model,
            weight_limit: record.weight_limit,
            initial_weight_limit: record.initial_weight_limit,
            battery: record.battery,
            state: record.state,
            packages: record.packages,
            revision: record.revision,
        })
    }

    // ===== 只读访问 =====

    pub fn serial_number(&self) -> &str {
        &self.serial_number
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub fn model(&self) -> RobotModel {
        self.model
    }

    /// 剩余载重（随装载递减）
    pub fn weight_limit(&self) -> i32 {
        self.weight_limit
    }

    /// 创建时的载重上限
    pub fn initial_weight_limit(&self) -> i32 {
        self.initial_weight_limit
    }

    pub fn battery(&self) -> i32 {
        self.battery
    }

    pub fn state(&self) -> RobotState {
        self.state
    }

    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    pub fn package_codes(&self) -> Vec<String> {
        self.packages.iter().map(|p| p.code.clone()).collect()
    }

    pub fn has_package(&self, code: &str) -> bool {
        self.packages.iter().any(|p| p.code == code)
    }

    pub fn is_owned_by(&self, owner_id: &str) -> bool {
        self.owner_id == owner_id
    }

    /// 乐观锁版本号
    pub fn revision(&self) -> i32 {
        self.revision
    }

    // ==========================================
    // 写路径
    // ==========================================

    /// 应用已校验的装载批次
    ///
    /// 包裹追加到 packages，weight_limit 一次性置为 plan.remaining。
    pub(crate) fn apply_load(&mut self, plan: LoadPlan) {
        debug_assert!(plan.remaining >= 0);
        debug_assert_eq!(plan.remaining, self.weight_limit - plan.total_weight());

        self.packages.extend(plan.packages);
        self.weight_limit = plan.remaining;
    }

    /// 持久化成功后记录新版本号
    pub(crate) fn mark_persisted(&mut self, revision: i32) {
        self.revision = revision;
    }

    /// 状态流转（仅允许生命周期中的下一步）
    ///
    /// 由配送/移动子系统驱动，不影响载重与包裹。
    pub fn transition_to(&mut self, next: RobotState) -> DomainResult<()> {
        if self.state.next() != next {
            return Err(DomainError::InvalidStateTransition {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }
}

/// 校验序列号
pub fn validate_serial_number(serial_number: &str) -> DomainResult<()> {
    let len = serial_number.chars().count();
    if !(SERIAL_MIN_LEN..=SERIAL_MAX_LEN).contains(&len) {
        return Err(DomainError::LengthOutOfRange {
            field: "serial_number",
            actual: len,
            min: SERIAL_MIN_LEN,
            max: SERIAL_MAX_LEN,
        });
    }
    Ok(())
}
