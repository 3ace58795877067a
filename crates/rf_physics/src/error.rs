// crates/rf_physics/src/error.rs

//! 求解器错误类型

use rf_foundation::RfError;
use thiserror::Error;

/// 求解器结果类型
pub type SolverResult<T> = Result<T, SolverError>;

/// 求解器错误枚举
///
/// 数值钳制（ρ ≥ 0、γ ∈ [0,1]）是局部修正而非错误；
/// 只有非有限值才中止当前调用。
#[derive(Error, Debug)]
pub enum SolverError {
    /// 状态场出现非有限值
    #[error("数值不稳定: 单元 {cell} 的 {field} = {value}")]
    NonFinite {
        /// 场名称 (rho/u/v/p/gamma)
        field: &'static str,
        /// 单元索引
        cell: usize,
        /// 非有限值
        value: f64,
    },

    /// 状态向量长度与网格不匹配
    #[error("状态长度不匹配: 期望 {expected}, 实际 {actual}")]
    StateSizeMismatch {
        /// 期望长度（单元数）
        expected: usize,
        /// 实际长度
        actual: usize,
    },

    /// 物性参数越界
    #[error("物性参数越界: 单元 {cell} 的 {field} = {value}")]
    InvalidProperty {
        /// 参数名称
        field: &'static str,
        /// 单元索引
        cell: usize,
        /// 越界值
        value: f64,
    },
}

impl From<SolverError> for RfError {
    fn from(err: SolverError) -> Self {
        match err {
            SolverError::NonFinite { .. } => RfError::internal(format!("{err}")),
            SolverError::StateSizeMismatch { expected, actual } => {
                RfError::size_mismatch("cell_state", expected, actual)
            }
            SolverError::InvalidProperty { .. } => RfError::invalid_input(format!("{err}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_finite_display() {
        let err = SolverError::NonFinite {
            field: "rho",
            cell: 42,
            value: f64::NAN,
        };
        assert!(err.to_string().contains("数值不稳定"));
        assert!(err.to_string().contains("42"));
    }

    #[test]
    fn test_conversion() {
        let err = SolverError::StateSizeMismatch {
            expected: 10,
            actual: 5,
        };
        let base: RfError = err.into();
        assert!(matches!(base, RfError::SizeMismatch { .. }));
    }
}
