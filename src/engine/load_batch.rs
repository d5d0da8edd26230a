// ==========================================
// 配送机器人装载系统 - 装载批次引擎
// ==========================================
// 职责: 以批次为单位校验并原子提交包裹装载
// 红线: 全部成功或全部拒绝，任何错误路径都不落库
// 红线: 只校验状态，不推进状态（Idle/Loading 门控）
// ==========================================
// 校验顺序:
// 1) 机器人存在且属于请求用户
// 2) 状态为 Idle / Loading
// 3) 批次内无重复编码（先于任何包裹查询）
// 4) 每个编码均未装载在该机器人上（先于任何包裹查询）
// 5) 按请求顺序解析包裹并累计重量；首个无法解析或越界的包裹即终止
// ==========================================

use std::collections::HashSet;

use tracing::{debug, info, instrument, warn};

use crate::domain::robot::{LoadPlan, Robot};
use crate::engine::error::{LoadError, LoadResult};
use crate::engine::repositories::LoadRepositories;
use crate::repository::RepositoryError;

// ==========================================
// LoadConfig - 装载配置
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadConfig {
    /// 乐观锁冲突后的最大重试次数（重新读取并重新校验）
    pub conflict_retry_limit: u32,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            conflict_retry_limit: 3,
        }
    }
}

// ==========================================
// LoadBatchProcessor - 装载批次处理器
// ==========================================
pub struct LoadBatchProcessor {
    repos: LoadRepositories,
    config: LoadConfig,
}

impl LoadBatchProcessor {
    /// 构造函数
    pub fn new(repos: LoadRepositories, config: LoadConfig) -> Self {
        Self { repos, config }
    }

    /// 使用默认配置构造
    pub fn with_default_config(repos: LoadRepositories) -> Self {
        Self::new(repos, LoadConfig::default())
    }

    pub fn config(&self) -> &LoadConfig {
        &self.config
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 尝试将一批包裹装载到机器人
    ///
    /// # 参数
    /// - `serial_number`: 机器人序列号
    /// - `codes`: 包裹编码（按请求顺序）
    /// - `owner_id`: 请求用户
    ///
    /// # 返回
    /// - Ok(Robot): 更新后的机器人（剩余载重已扣减，包裹已追加）
    /// - Err(LoadError): 批次被整体拒绝，机器人保持不变
    ///
    /// # 并发
    /// 提交时校验 revision；若期间有其他批次先提交，重新读取机器人并完整重新校验，
    /// 最多重试 `conflict_retry_limit` 次。校验失败本身从不重试。
    #[instrument(skip(self, codes), fields(batch_size = codes.len()))]
    pub fn attempt_load(
        &self,
        serial_number: &str,
        codes: &[String],
        owner_id: &str,
    ) -> LoadResult<Robot> {
        let max_attempts = self.config.conflict_retry_limit.saturating_add(1);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            let mut robot = self.fetch_owned_robot(serial_number, owner_id)?;
            let plan = self.validate_batch(&robot, codes, owner_id).map_err(|e| {
                warn!(kind = e.kind(), error = %e, "装载批次被拒绝");
                e
            })?;

            if plan.packages().is_empty() {
                debug!("空批次，机器人保持不变");
                return Ok(robot);
            }

            let loaded_weight = plan.total_weight();
            robot.apply_load(plan);

            match self.repos.robot_store.persist(&robot) {
                Ok(revision) => {
                    robot.mark_persisted(revision);
                    info!(
                        loaded_weight,
                        remaining = robot.weight_limit(),
                        revision,
                        "装载批次已提交"
                    );
                    return Ok(robot);
                }
                Err(RepositoryError::OptimisticLockFailure {
                    expected, actual, ..
                }) => {
                    if attempt >= max_attempts {
                        warn!(attempt, "乐观锁冲突，重试次数已耗尽");
                        return Err(LoadError::ConcurrentModification {
                            serial_number: serial_number.to_string(),
                            attempts: attempt,
                        });
                    }
                    warn!(attempt, expected, actual, "乐观锁冲突，重新读取后重试");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// 校验批次并生成装载计划（不修改机器人，不落库）
    ///
    /// # 返回
    /// - Ok(LoadPlan): 按请求顺序解析出的包裹与最终剩余载重
    /// - Err(LoadError): 首个违反的规则
    pub fn validate_batch(
        &self,
        robot: &Robot,
        codes: &[String],
        owner_id: &str,
    ) -> LoadResult<LoadPlan> {
        // 1. 状态门控
        if !robot.state().is_loadable() {
            return Err(LoadError::InvalidState {
                serial_number: robot.serial_number().to_string(),
                state: robot.state(),
            });
        }

        // 2. 批次内重复（集合大小与列表大小不一致）
        let mut seen: HashSet<&str> = HashSet::with_capacity(codes.len());
        for code in codes {
            if !seen.insert(code.as_str()) {
                return Err(LoadError::DuplicateRequest { code: code.clone() });
            }
        }

        // 3. 已装载
        if let Some(code) = codes.iter().find(|code| robot.has_package(code)) {
            return Err(LoadError::AlreadyLoaded {
                serial_number: robot.serial_number().to_string(),
                code: code.clone(),
            });
        }

        // 4. 按请求顺序解析并累计
        let capacity = robot.weight_limit();
        let mut remaining = capacity;
        let mut packages = Vec::with_capacity(codes.len());

        for code in codes {
            let package = match self
                .repos
                .package_lookup
                .find_package_by_code_and_owner(code, owner_id)?
            {
                Some(package) => package,
                None => {
                    let available = self
                        .repos
                        .package_lookup
                        .find_packages_by_owner(owner_id)?
                        .into_iter()
                        .map(|p| p.code)
                        .collect();
                    return Err(LoadError::PackageNotFound {
                        code: code.clone(),
                        available,
                    });
                }
            };

            remaining -= package.weight;
            debug!(code = %code, weight = package.weight, remaining, "累计包裹重量");

            if remaining < 0 {
                return Err(LoadError::CapacityExceeded {
                    code: code.clone(),
                    capacity,
                    requested: capacity - remaining,
                });
            }

            packages.push(package);
        }

        Ok(LoadPlan {
            packages,
            remaining,
        })
    }

    /// 读取机器人并校验归属（他人的机器人视为不存在）
    fn fetch_owned_robot(&self, serial_number: &str, owner_id: &str) -> LoadResult<Robot> {
        match self.repos.robot_store.find_robot_by_serial(serial_number)? {
            Some(robot) if robot.is_owned_by(owner_id) => Ok(robot),
            _ => Err(LoadError::RobotNotFound {
                serial_number: serial_number.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::capacity::RobotCapacity;
    use crate::domain::package::Package;
    use crate::domain::types::{RobotModel, RobotState};
    use crate::engine::repositories::{PackageLookup, RobotStore};
    use crate::repository::RepositoryResult;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    // ==========================================
    // 内存实现
    // ==========================================

    #[derive(Default)]
    struct MemoryRobotStore {
        robots: Mutex<HashMap<String, Robot>>,
        persist_calls: AtomicUsize,
        /// 前 N 次 persist 人为制造版本冲突
        forced_conflicts: AtomicUsize,
    }

    impl MemoryRobotStore {
        fn with_robot(robot: Robot) -> Self {
            let store = Self::default();
            store
                .robots
                .lock()
                .unwrap()
                .insert(robot.serial_number().to_string(), robot);
            store
        }

        fn get(&self, serial_number: &str) -> Robot {
            self.robots.lock().unwrap().get(serial_number).cloned().unwrap()
        }
    }

    impl RobotStore for MemoryRobotStore {
        fn find_robot_by_serial(&self, serial_number: &str) -> RepositoryResult<Option<Robot>> {
            Ok(self.robots.lock().unwrap().get(serial_number).cloned())
        }

        fn persist(&self, robot: &Robot) -> RepositoryResult<i32> {
            self.persist_calls.fetch_add(1, Ordering::SeqCst);
            if self
                .forced_conflicts
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(RepositoryError::OptimisticLockFailure {
                    serial_number: robot.serial_number().to_string(),
                    expected: robot.revision(),
                    actual: robot.revision() + 1,
                });
            }

            let mut robots = self.robots.lock().unwrap();
            let current = robots.get(robot.serial_number()).unwrap();
            if current.revision() != robot.revision() {
                return Err(RepositoryError::OptimisticLockFailure {
                    serial_number: robot.serial_number().to_string(),
                    expected: robot.revision(),
                    actual: current.revision(),
                });
            }
            let revision = robot.revision() + 1;
            let mut stored = robot.clone();
            stored.mark_persisted(revision);
            robots.insert(robot.serial_number().to_string(), stored);
            Ok(revision)
        }
    }

    #[derive(Default)]
    struct MemoryPackageLookup {
        packages: Vec<Package>,
        lookups: AtomicUsize,
    }

    impl PackageLookup for MemoryPackageLookup {
        fn find_packages_by_owner(&self, owner_id: &str) -> RepositoryResult<Vec<Package>> {
            Ok(self
                .packages
                .iter()
                .filter(|p| p.is_owned_by(owner_id))
                .cloned()
                .collect())
        }

        fn find_package_by_code_and_owner(
            &self,
            code: &str,
            owner_id: &str,
        ) -> RepositoryResult<Option<Package>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .packages
                .iter()
                .find(|p| p.code == code && p.is_owned_by(owner_id))
                .cloned())
        }
    }

    const OWNER: &str = "alice";

    fn heavyweight(serial: &str) -> Robot {
        Robot::new(serial, OWNER, RobotModel::Heavyweight, None).unwrap()
    }

    fn pkg(code: &str, weight: i32) -> Package {
        Package::new(code, format!("name_{}", code), weight, OWNER).unwrap()
    }

    fn setup(
        robot: Robot,
        packages: Vec<Package>,
    ) -> (LoadBatchProcessor, Arc<MemoryRobotStore>, Arc<MemoryPackageLookup>) {
        let store = Arc::new(MemoryRobotStore::with_robot(robot));
        let lookup = Arc::new(MemoryPackageLookup {
            packages,
            ..Default::default()
        });
        let processor = LoadBatchProcessor::with_default_config(LoadRepositories::new(
            store.clone(),
            lookup.clone(),
        ));
        (processor, store, lookup)
    }

    fn codes(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    // ==========================================
    // 测试用例
    // ==========================================

    #[test]
    fn test_single_package_fits() {
        let (processor, store, _) =
            setup(heavyweight("RB-0001"), vec![pkg("A12345", 400), pkg("B12345", 200)]);

        let robot = processor
            .attempt_load("RB-0001", &codes(&["A12345"]), OWNER)
            .unwrap();

        assert_eq!(robot.weight_limit(), 100);
        assert_eq!(robot.package_codes(), vec!["A12345".to_string()]);
        assert_eq!(robot.revision(), 1);
        assert_eq!(store.get("RB-0001"), robot);
    }

    #[test]
    fn test_combined_weight_overflow_rejects_whole_batch() {
        let (processor, store, _) =
            setup(heavyweight("RB-0001"), vec![pkg("A12345", 400), pkg("B12345", 200)]);

        let err = processor
            .attempt_load("RB-0001", &codes(&["A12345", "B12345"]), OWNER)
            .unwrap_err();

        match err {
            LoadError::CapacityExceeded {
                code,
                capacity,
                requested,
            } => {
                assert_eq!(code, "B12345");
                assert_eq!(capacity, 500);
                assert_eq!(requested, 600);
            }
            other => panic!("Expected CapacityExceeded, got {other:?}"),
        }

        let robot = store.get("RB-0001");
        assert_eq!(robot.weight_limit(), 500);
        assert!(robot.packages().is_empty());
        assert_eq!(store.persist_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_multi_package_batch_decrements_by_sum() {
        let (processor, _, _) = setup(
            heavyweight("RB-0001"),
            vec![pkg("A12345", 120), pkg("B12345", 80), pkg("C12345", 300)],
        );

        let robot = processor
            .attempt_load("RB-0001", &codes(&["A12345", "B12345", "C12345"]), OWNER)
            .unwrap();

        assert_eq!(robot.weight_limit(), 0);
        assert_eq!(robot.loaded_weight(), 500);
        assert_eq!(robot.package_codes(), codes(&["A12345", "B12345", "C12345"]));
    }

    #[test]
    fn test_non_loadable_states_are_rejected() {
        for target in [
            RobotState::Loaded,
            RobotState::Delivering,
            RobotState::Delivered,
            RobotState::Returning,
        ] {
            let mut robot = heavyweight("RB-0001");
            while robot.state() != target {
                let next = robot.state().next();
                robot.transition_to(next).unwrap();
            }

            let (processor, store, lookup) = setup(robot, vec![pkg("A12345", 1)]);
            let err = processor
                .attempt_load("RB-0001", &codes(&["A12345"]), OWNER)
                .unwrap_err();

            assert!(
                matches!(err, LoadError::InvalidState { state, .. } if state == target),
                "state {target} should be rejected"
            );
            assert_eq!(lookup.lookups.load(Ordering::SeqCst), 0);
            assert_eq!(store.get("RB-0001").weight_limit(), 500);
        }
    }

    #[test]
    fn test_loading_state_is_loadable() {
        let mut robot = heavyweight("RB-0001");
        robot.transition_to(RobotState::Loading).unwrap();
        let (processor, _, _) = setup(robot, vec![pkg("A12345", 10)]);

        let robot = processor
            .attempt_load("RB-0001", &codes(&["A12345"]), OWNER)
            .unwrap();
        assert_eq!(robot.weight_limit(), 490);
    }

    #[test]
    fn test_duplicate_rejected_before_lookup() {
        let (processor, store, lookup) = setup(heavyweight("RB-0001"), vec![pkg("A12345", 10)]);

        let err = processor
            .attempt_load("RB-0001", &codes(&["A12345", "A12345"]), OWNER)
            .unwrap_err();

        assert!(matches!(err, LoadError::DuplicateRequest { ref code } if code == "A12345"));
        assert_eq!(lookup.lookups.load(Ordering::SeqCst), 0);
        assert!(store.get("RB-0001").packages().is_empty());
    }

    #[test]
    fn test_already_loaded_package_rejected() {
        let (processor, store, _) =
            setup(heavyweight("RB-0001"), vec![pkg("A12345", 10), pkg("B12345", 10)]);

        processor
            .attempt_load("RB-0001", &codes(&["A12345"]), OWNER)
            .unwrap();

        let err = processor
            .attempt_load("RB-0001", &codes(&["B12345", "A12345"]), OWNER)
            .unwrap_err();

        assert!(matches!(err, LoadError::AlreadyLoaded { ref code, .. } if code == "A12345"));
        let robot = store.get("RB-0001");
        assert_eq!(robot.weight_limit(), 490);
        assert_eq!(robot.package_codes(), codes(&["A12345"]));
    }

    #[test]
    fn test_unknown_code_lists_available_packages() {
        let (processor, _, _) = setup(heavyweight("RB-0001"), vec![pkg("A12345", 10)]);

        let err = processor
            .attempt_load("RB-0001", &codes(&["ZZZZZ"]), OWNER)
            .unwrap_err();

        match err {
            LoadError::PackageNotFound { code, available } => {
                assert_eq!(code, "ZZZZZ");
                assert_eq!(available, codes(&["A12345"]));
            }
            other => panic!("Expected PackageNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_owner_without_packages_gets_empty_available() {
        let (processor, _, _) = setup(heavyweight("RB-0001"), Vec::new());

        let err = processor
            .attempt_load("RB-0001", &codes(&["A12345"]), OWNER)
            .unwrap_err();

        assert!(matches!(err, LoadError::PackageNotFound { ref available, .. } if available.is_empty()));
        assert!(err.to_string().contains("no packages exist for this user"));
    }

    #[test]
    fn test_other_users_package_is_not_loadable() {
        let foreign = Package::new("F12345", "foreign", 10, "bob").unwrap();
        let (processor, _, _) = setup(heavyweight("RB-0001"), vec![foreign]);

        let err = processor
            .attempt_load("RB-0001", &codes(&["F12345"]), OWNER)
            .unwrap_err();
        assert!(matches!(err, LoadError::PackageNotFound { .. }));
    }

    #[test]
    fn test_other_users_robot_is_not_found() {
        let (processor, _, _) = setup(heavyweight("RB-0001"), vec![pkg("A12345", 10)]);

        let err = processor
            .attempt_load("RB-0001", &codes(&["A12345"]), "bob")
            .unwrap_err();
        assert!(matches!(err, LoadError::RobotNotFound { .. }));
    }

    #[test]
    fn test_order_sensitive_accumulation() {
        // 首个越界的包裹即终止，其后的包裹不再解析
        let robot = Robot::new("RB-0001", OWNER, RobotModel::Middleweight, None).unwrap();
        let (processor, _, lookup) = setup(
            robot,
            vec![pkg("A12345", 200), pkg("B12345", 100), pkg("C12345", 10)],
        );

        let err = processor
            .attempt_load("RB-0001", &codes(&["A12345", "B12345", "C12345"]), OWNER)
            .unwrap_err();

        assert!(matches!(err, LoadError::CapacityExceeded { ref code, .. } if code == "B12345"));
        assert_eq!(lookup.lookups.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_empty_batch_is_noop() {
        let (processor, store, _) = setup(heavyweight("RB-0001"), vec![pkg("A12345", 10)]);

        let robot = processor.attempt_load("RB-0001", &[], OWNER).unwrap();

        assert_eq!(robot.weight_limit(), 500);
        assert_eq!(store.persist_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_load_does_not_advance_state() {
        let (processor, _, _) = setup(heavyweight("RB-0001"), vec![pkg("A12345", 10)]);

        let robot = processor
            .attempt_load("RB-0001", &codes(&["A12345"]), OWNER)
            .unwrap();

        // 装载只做门控，状态推进由外部触发
        assert_eq!(robot.state(), RobotState::Idle);
    }

    #[test]
    fn test_revision_conflict_is_retried() {
        let (processor, store, _) = setup(heavyweight("RB-0001"), vec![pkg("A12345", 10)]);
        store.forced_conflicts.store(2, Ordering::SeqCst);

        let robot = processor
            .attempt_load("RB-0001", &codes(&["A12345"]), OWNER)
            .unwrap();

        assert_eq!(robot.weight_limit(), 490);
        assert_eq!(store.persist_calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_revision_conflict_retries_exhausted() {
        let (processor, store, _) = setup(heavyweight("RB-0001"), vec![pkg("A12345", 10)]);
        store.forced_conflicts.store(10, Ordering::SeqCst);

        let err = processor
            .attempt_load("RB-0001", &codes(&["A12345"]), OWNER)
            .unwrap_err();

        assert!(matches!(err, LoadError::ConcurrentModification { attempts: 4, .. }));
        assert_eq!(store.get("RB-0001").weight_limit(), 500);
    }
}
