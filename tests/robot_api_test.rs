// ==========================================
// RobotApi 集成测试
// ==========================================
// 职责: 验证机器人 API 的用户隔离、查询与装载委托
// ==========================================


#[cfg(test)]
mod robot_api_test {
    use robot_dispatch::api::ApiError;
    use robot_dispatch::app::AppState;
    use robot_dispatch::domain::types::{RobotModel, RobotState};
    use robot_dispatch::engine::LoadError;
    use tempfile::NamedTempFile;

    use crate::test_helpers::{codes, create_test_db, LoadTestEnv};

    fn setup() -> (NamedTempFile, String, AppState) {
        let (temp_file, db_path) = create_test_db().unwrap();
        let state = AppState::new(db_path.clone()).unwrap();
        (temp_file, db_path, state)
    }

    // ==========================================
    // 创建
    // ==========================================

    #[test]
    fn test_create_robot_with_model_defaults() {
        let (_temp_file, _db_path, state) = setup();

        let info = state
            .robot_api
            .create_robot("alice", "RB-0001", "Cruiserweight", None)
            .unwrap();
        assert_eq!(info.model, RobotModel::Cruiserweight);
        assert_eq!(info.weight_limit, 350);
        assert_eq!(info.battery, 100);
        assert_eq!(info.state, RobotState::Idle);

        let info = state
            .robot_api
            .create_robot("alice", "RB-0002", "1", Some(120))
            .unwrap();
        assert_eq!(info.model, RobotModel::Middleweight);
        assert_eq!(info.weight_limit, 120);
    }

    #[test]
    fn test_create_robot_rejects_invalid_input() {
        let (_temp_file, _db_path, state) = setup();

        let err = state
            .robot_api
            .create_robot("alice", "RB-0001", "Featherweight", None)
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(ref msg) if msg.contains("Acceptable values are")));

        // 载重超过机型封顶
        let err = state
            .robot_api
            .create_robot("alice", "RB-0001", "LIGHTWEIGHT", Some(101))
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));

        // 序列号过短
        let err = state
            .robot_api
            .create_robot("alice", "RB1", "LIGHTWEIGHT", None)
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));

        let err = state
            .robot_api
            .create_robot("  ", "RB-0001", "LIGHTWEIGHT", None)
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }

    #[test]
    fn test_create_robot_rejects_duplicate_serial() {
        let (_temp_file, _db_path, state) = setup();
        state
            .robot_api
            .create_robot("alice", "RB-0001", "LIGHTWEIGHT", None)
            .unwrap();

        let err = state
            .robot_api
            .create_robot("bob", "RB-0001", "HEAVYWEIGHT", None)
            .unwrap_err();
        assert!(matches!(err, ApiError::BusinessRuleViolation(_)));
    }

    // ==========================================
    // 查询与删除
    // ==========================================

    #[test]
    fn test_list_robots_is_owner_scoped_and_ordered() {
        let (_temp_file, _db_path, state) = setup();
        state.robot_api.create_robot("alice", "RB-0003", "0", None).unwrap();
        state.robot_api.create_robot("alice", "RB-0001", "0", None).unwrap();
        state.robot_api.create_robot("bob", "RB-0002", "0", None).unwrap();

        let serials: Vec<String> = state
            .robot_api
            .list_robots("alice")
            .unwrap()
            .into_iter()
            .map(|r| r.serial_number)
            .collect();
        assert_eq!(serials, codes(&["RB-0001", "RB-0003"]));
    }

    #[test]
    fn test_detail_and_delete_of_other_owner_are_not_found() {
        let (_temp_file, _db_path, state) = setup();
        state.robot_api.create_robot("alice", "RB-0001", "0", None).unwrap();

        assert!(matches!(
            state.robot_api.get_robot_detail("bob", "RB-0001").unwrap_err(),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            state.robot_api.delete_robot("bob", "RB-0001").unwrap_err(),
            ApiError::NotFound(_)
        ));

        state.robot_api.delete_robot("alice", "RB-0001").unwrap();
        assert!(state.robot_api.list_robots("alice").unwrap().is_empty());
    }

    #[test]
    fn test_list_available_robots_spans_owners() {
        let (_temp_file, db_path, state) = setup();
        state.robot_api.create_robot("alice", "RB-0001", "0", None).unwrap();
        state.robot_api.create_robot("bob", "RB-0002", "0", None).unwrap();
        state.robot_api.create_robot("bob", "RB-0003", "0", None).unwrap();

        let env = LoadTestEnv::open(&db_path);
        env.advance_robot_to("RB-0002", RobotState::Loading);
        env.advance_robot_to("RB-0003", RobotState::Delivered);

        let serials: Vec<String> = state
            .robot_api
            .list_available_robots()
            .unwrap()
            .into_iter()
            .map(|r| r.serial_number)
            .collect();
        assert_eq!(serials, codes(&["RB-0001", "RB-0002"]));
    }

    // ==========================================
    // 装载
    // ==========================================

    #[test]
    fn test_load_packages_then_check() {
        let (_temp_file, _db_path, state) = setup();
        state.robot_api.create_robot("alice", "RB-0001", "3", None).unwrap();
        state.package_api.create_package("alice", "A12345", "parcel-a", 400).unwrap();

        let view = state
            .robot_api
            .load_packages("alice", "RB-0001", &codes(&["A12345"]))
            .unwrap();
        assert_eq!(view.weight_limit, 100);
        assert_eq!(view.state, RobotState::Idle);
        assert_eq!(view.packages, codes(&["A12345"]));

        let packages = state.robot_api.check_packages("alice", "RB-0001").unwrap();
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].weight, 400);

        let battery = state.robot_api.check_battery("alice", "RB-0001").unwrap();
        assert_eq!(battery.battery, 100);

        let detail = state.robot_api.get_robot_detail("alice", "RB-0001").unwrap();
        assert_eq!(detail.initial_weight_limit, 500);
        assert_eq!(detail.weight_limit, 100);
        assert_eq!(detail.packages, packages);

        let info = &state.robot_api.list_robots("alice").unwrap()[0];
        assert_eq!(info.loaded_weight, 400);
        assert!((info.utilization_ratio - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_load_rejection_is_structured_and_localized() {
        let (_temp_file, _db_path, state) = setup();
        state.robot_api.create_robot("alice", "RB-0001", "3", None).unwrap();

        let err = state
            .robot_api
            .load_packages("alice", "RB-0001", &codes(&["A12345"]))
            .unwrap_err();
        assert_eq!(err.load_kind(), Some("PACKAGE_NOT_FOUND"));
        assert!(matches!(
            err,
            ApiError::LoadRejected(LoadError::PackageNotFound { ref available, .. }) if available.is_empty()
        ));
        assert_eq!(err.user_message(), "You have to create a package first.");
    }

    #[test]
    fn test_load_into_other_owner_robot_is_rejected() {
        let (_temp_file, _db_path, state) = setup();
        state.robot_api.create_robot("alice", "RB-0001", "3", None).unwrap();
        state.package_api.create_package("bob", "B12345", "parcel-b", 10).unwrap();

        let err = state
            .robot_api
            .load_packages("bob", "RB-0001", &codes(&["B12345"]))
            .unwrap_err();
        assert_eq!(err.load_kind(), Some("ROBOT_NOT_FOUND"));
    }
}
