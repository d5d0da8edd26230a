// ==========================================
// 配送机器人装载系统 - 包裹领域模型
// ==========================================
// 包裹独立于机器人创建，通过装载关系被机器人引用（非拥有）
// 红线: 被任一机器人引用的包裹不可删除（由仓储层保证）
// ==========================================

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::types::{MAX_WEIGHT_LIMIT, MIN_WEIGHT_LIMIT};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

pub const CODE_MIN_LEN: usize = 5;
pub const CODE_MAX_LEN: usize = 50;
pub const NAME_MIN_LEN: usize = 5;
pub const NAME_MAX_LEN: usize = 255;

static CODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9_]+$").expect("valid package code pattern"));

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("valid package name pattern"));

// ==========================================
// Package - 包裹
// ==========================================
// 对齐: package 表
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub code: String,     // 包裹编码（主键）
    pub name: String,     // 包裹名称
    pub weight: i32,      // 重量 1..=500
    pub owner_id: String, // 所属用户
}

impl Package {
    /// 创建并校验包裹
    ///
    /// # 校验规则
    /// - code: 5..=50 字符，仅大写字母、数字、下划线
    /// - name: 5..=255 字符，仅字母数字、下划线、连字符
    /// - weight: 1..=500
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        weight: i32,
        owner_id: impl Into<String>,
    ) -> DomainResult<Self> {
        let code = code.into();
        let name = name.into();

        validate_code(&code)?;
        validate_name(&name)?;
        validate_weight(weight)?;

        Ok(Self {
            code,
            name,
            weight,
            owner_id: owner_id.into(),
        })
    }

    /// 是否属于指定用户
    pub fn is_owned_by(&self, owner_id: &str) -> bool {
        self.owner_id == owner_id
    }
}

/// 校验包裹编码
pub fn validate_code(code: &str) -> DomainResult<()> {
    let len = code.chars().count();
    if !(CODE_MIN_LEN..=CODE_MAX_LEN).contains(&len) {
        return Err(DomainError::LengthOutOfRange {
            field: "code",
            actual: len,
            min: CODE_MIN_LEN,
            max: CODE_MAX_LEN,
        });
    }
    if !CODE_PATTERN.is_match(code) {
        return Err(DomainError::InvalidFormat {
            field: "code",
            message: "only uppercase letters, digits and underscore",
        });
    }
    Ok(())
}

/// 校验包裹名称
pub fn validate_name(name: &str) -> DomainResult<()> {
    let len = name.chars().count();
    if !(NAME_MIN_LEN..=NAME_MAX_LEN).contains(&len) {
        return Err(DomainError::LengthOutOfRange {
            field: "name",
            actual: len,
            min: NAME_MIN_LEN,
            max: NAME_MAX_LEN,
        });
    }
    if !NAME_PATTERN.is_match(name) {
        return Err(DomainError::InvalidFormat {
            field: "name",
            message: "only alphanumeric characters, underscore and hyphen",
        });
    }
    Ok(())
}

fn validate_weight(weight: i32) -> DomainResult<()> {
    if !(MIN_WEIGHT_LIMIT..=MAX_WEIGHT_LIMIT).contains(&weight) {
        return Err(DomainError::ValueOutOfRange {
            field: "weight",
            value: weight,
            min: MIN_WEIGHT_LIMIT,
            max: MAX_WEIGHT_LIMIT,
        });
    }
    Ok(())
}
