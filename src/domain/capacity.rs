// ==========================================
// 配送机器人装载系统 - 载重记账
// ==========================================
// 剩余载重直接以 Robot.weight_limit 字段记账，不由包裹求和推导；
// 唯一写路径为装载引擎，保证与已装载包裹集合同步。
// ==========================================

use crate::domain::robot::Robot;

// ==========================================
// Trait: RobotCapacity
// ==========================================
// 用途: 装载引擎与 API 层的载重查询接口
pub trait RobotCapacity {
    /// 剩余可装载重量
    fn remaining_capacity(&self) -> i32;

    /// 当前已装载包裹的总重量
    fn loaded_weight(&self) -> i32;

    /// 能否再装入指定重量
    fn can_fit(&self, weight: i32) -> bool;

    /// 载重使用率 (0.0 - 1.0)，相对于创建时的载重上限
    fn utilization_ratio(&self) -> f64;
}

impl RobotCapacity for Robot {
    fn remaining_capacity(&self) -> i32 {
        self.weight_limit()
    }

    fn loaded_weight(&self) -> i32 {
        self.packages().iter().map(|p| p.weight).sum()
    }

    fn can_fit(&self, weight: i32) -> bool {
        weight <= self.weight_limit()
    }

    fn utilization_ratio(&self) -> f64 {
        if self.initial_weight_limit() <= 0 {
            return 0.0;
        }
        f64::from(self.initial_weight_limit() - self.weight_limit())
            / f64::from(self.initial_weight_limit())
    }
}

/// 剩余载重（纯函数形式）
pub fn remaining_capacity(robot: &Robot) -> i32 {
    robot.remaining_capacity()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::package::Package;
    use crate::domain::robot::LoadPlan;
    use crate::domain::types::RobotModel;

    #[test]
    fn test_capacity_tracks_loaded_weight() {
        let mut robot = Robot::new("RB-1001", "u", RobotModel::Middleweight, None).unwrap();
        assert_eq!(remaining_capacity(&robot), 250);
        assert_eq!(robot.loaded_weight(), 0);
        assert_eq!(robot.utilization_ratio(), 0.0);

        let pkg = Package::new("PKG_01", "Parcel-1", 50, "u").unwrap();
        robot.apply_load(LoadPlan {
            packages: vec![pkg],
            remaining: 200,
        });

        assert_eq!(robot.remaining_capacity(), 200);
        assert_eq!(robot.loaded_weight(), 50);
        assert_eq!(robot.loaded_weight() + robot.remaining_capacity(), robot.initial_weight_limit());
        assert!((robot.utilization_ratio() - 0.2).abs() < 1e-9);
        assert!(robot.can_fit(200));
        assert!(!robot.can_fit(201));
    }
}
