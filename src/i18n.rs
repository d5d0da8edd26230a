// ==========================================
// 国际化 (i18n) 模块
// ==========================================
// 使用 rust-i18n 库
// 支持英文（默认）和中文
// ==========================================
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// ==========================================

use crate::engine::LoadError;

/// 获取当前语言
pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// 设置语言
///
/// # 参数
/// - locale: 语言代码（"en" 或 "zh-CN"）
pub fn set_locale(locale: &str) {
    rust_i18n::set_locale(locale);
}

/// 翻译消息（无参数）
///
/// # 示例
/// ```no_run
/// use robot_dispatch::i18n::t;
/// let msg = t("common.success");
/// ```
pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// 翻译消息（带参数）
///
/// # 示例
/// ```no_run
/// use robot_dispatch::i18n::t_with_args;
/// let msg = t_with_args("load.already_loaded", &[("code", "A12345")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    let mut result = rust_i18n::t!(key).to_string();
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        result = result.replace(&placeholder, v);
    }
    result
}

/// 将装载错误本地化为面向用户的文案（使用当前语言）
pub fn localize_load_error(err: &LoadError) -> String {
    match err {
        LoadError::RobotNotFound { serial_number } => t_with_args(
            "load.robot_not_found",
            &[("serial_number", serial_number.as_str())],
        ),
        LoadError::InvalidState {
            serial_number,
            state,
        } => t_with_args(
            "load.invalid_state",
            &[
                ("serial_number", serial_number.as_str()),
                ("state", state.to_db_str()),
            ],
        ),
        LoadError::DuplicateRequest { code } => {
            t_with_args("load.duplicate_request", &[("code", code.as_str())])
        }
        LoadError::AlreadyLoaded { code, .. } => {
            t_with_args("load.already_loaded", &[("code", code.as_str())])
        }
        LoadError::PackageNotFound { available, .. } if available.is_empty() => {
            t("load.no_packages")
        }
        LoadError::PackageNotFound { code, available } => {
            let available = available.join(", ");
            t_with_args(
                "load.package_not_found",
                &[("code", code.as_str()), ("available", available.as_str())],
            )
        }
        LoadError::CapacityExceeded {
            capacity,
            requested,
            ..
        } => {
            let requested = requested.to_string();
            let capacity = capacity.to_string();
            t_with_args(
                "load.capacity_exceeded",
                &[("requested", requested.as_str()), ("capacity", capacity.as_str())],
            )
        }
        LoadError::ConcurrentModification { serial_number, .. } => t_with_args(
            "load.concurrent_modification",
            &[("serial_number", serial_number.as_str())],
        ),
        LoadError::Repository(_) => t("load.internal"),
    }
}
