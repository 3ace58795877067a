// crates/rf_runtime/src/error.rs

//! 配置层错误类型

use rf_foundation::RfError;
use thiserror::Error;

/// 配置错误
///
/// 每个错误指明越界字段，便于调用方直接定位输入问题。
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 参数越界或缺失
    #[error("配置无效 '{field}': {reason}")]
    Invalid {
        /// 出错字段
        field: &'static str,
        /// 原因
        reason: String,
    },
}

impl ConfigError {
    /// 便捷构造
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

impl From<ConfigError> for RfError {
    fn from(err: ConfigError) -> Self {
        RfError::invalid_input(format!("{err}"))
    }
}
