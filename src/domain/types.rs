// ==========================================
// 配送机器人装载系统 - 领域类型定义
// ==========================================
// 机型 (RobotModel) 与生命周期状态 (RobotState)
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// 载重上限的全局取值范围（含端点）
pub const MIN_WEIGHT_LIMIT: i32 = 1;
pub const MAX_WEIGHT_LIMIT: i32 = 500;

// ==========================================
// 机型 (Robot Model)
// ==========================================
// 红线: 机型创建后不可变更
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RobotModel {
    Lightweight,   // 轻量级
    Middleweight,  // 中量级
    Cruiserweight, // 次重量级
    Heavyweight,   // 重量级
}

impl RobotModel {
    /// 全部机型（按载重递增）
    pub const ALL: [RobotModel; 4] = [
        RobotModel::Lightweight,
        RobotModel::Middleweight,
        RobotModel::Cruiserweight,
        RobotModel::Heavyweight,
    ];

    /// 机型默认载重上限（同时也是该机型的载重封顶值）
    ///
    /// | 机型 | 上限 |
    /// |------|------|
    /// | Lightweight | 100 |
    /// | Middleweight | 250 |
    /// | Cruiserweight | 350 |
    /// | Heavyweight | 500 |
    pub fn max_weight_limit(&self) -> i32 {
        match self {
            RobotModel::Lightweight => 100,
            RobotModel::Middleweight => 250,
            RobotModel::Cruiserweight => 350,
            RobotModel::Heavyweight => 500,
        }
    }

    /// 从字符串解析机型（大小写不敏感）
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "LIGHTWEIGHT" => Some(RobotModel::Lightweight),
            "MIDDLEWEIGHT" => Some(RobotModel::Middleweight),
            "CRUISERWEIGHT" => Some(RobotModel::Cruiserweight),
            "HEAVYWEIGHT" => Some(RobotModel::Heavyweight),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            RobotModel::Lightweight => "LIGHTWEIGHT",
            RobotModel::Middleweight => "MIDDLEWEIGHT",
            RobotModel::Cruiserweight => "CRUISERWEIGHT",
            RobotModel::Heavyweight => "HEAVYWEIGHT",
        }
    }
}

impl fmt::Display for RobotModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

/// 按机型查默认载重上限
pub fn default_weight_limit(model: RobotModel) -> i32 {
    model.max_weight_limit()
}

// ==========================================
// 机器人状态 (Robot State)
// ==========================================
// 生命周期: Idle → Loading → Loaded → Delivering → Delivered → Returning → Idle
// 红线: 只有 Idle / Loading 可以装载
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RobotState {
    Idle,       // 空闲
    Loading,    // 装载中
    Loaded,     // 已装载
    Delivering, // 配送中
    Delivered,  // 已送达
    Returning,  // 返程中
}

impl RobotState {
    /// 是否允许装载
    pub fn is_loadable(&self) -> bool {
        matches!(self, RobotState::Idle | RobotState::Loading)
    }

    /// 生命周期中的下一个状态
    pub fn next(&self) -> RobotState {
        match self {
            RobotState::Idle => RobotState::Loading,
            RobotState::Loading => RobotState::Loaded,
            RobotState::Loaded => RobotState::Delivering,
            RobotState::Delivering => RobotState::Delivered,
            RobotState::Delivered => RobotState::Returning,
            RobotState::Returning => RobotState::Idle,
        }
    }

    /// 从字符串解析状态
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "IDLE" => Some(RobotState::Idle),
            "LOADING" => Some(RobotState::Loading),
            "LOADED" => Some(RobotState::Loaded),
            "DELIVERING" => Some(RobotState::Delivering),
            "DELIVERED" => Some(RobotState::Delivered),
            "RETURNING" => Some(RobotState::Returning),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            RobotState::Idle => "IDLE",
            RobotState::Loading => "LOADING",
            RobotState::Loaded => "LOADED",
            RobotState::Delivering => "DELIVERING",
            RobotState::Delivered => "DELIVERED",
            RobotState::Returning => "RETURNING",
        }
    }
}

impl Default for RobotState {
    fn default() -> Self {
        RobotState::Idle
    }
}

impl fmt::Display for RobotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}
