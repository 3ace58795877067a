// crates/rf_physics/src/eos.rs

//! 状态方程
//!
//! 归一化压力 Δp 与密度 ρ 由压缩性控制量 γ_EoS 选择的两支之一关联：
//!
//! - **弱可压缩** (γ_EoS 接近理想气体值，默认 1.4)：
//!   Δp = κ·ρ^γ，κ = p_ref / ρ_ref^γ
//! - **准不可压缩** (γ_EoS ≥ 100)：二次拟合 Δp = a₁ρ² + a₂ρ + a₃，
//!   系数由三个插值条件解出：两个 (ρ, Δp) 对加参考密度处的零导数条件。
//!
//! 两支共用同一调用形状，逐单元逐步在热路径上求值时无分支语义差异。

use serde::{Deserialize, Serialize};

/// 状态方程
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum EquationOfState {
    /// 弱可压缩幂律
    WeaklyCompressible {
        /// κ = p_ref / ρ_ref^γ
        kappa: f64,
        /// 多方指数
        gamma: f64,
    },
    /// 准不可压缩二次拟合
    ///
    /// 抛物线经过 (ρ_low, ε) 与 (ρ_ref, Δp_max)，顶点在 ρ_ref。
    QuasiIncompressible {
        /// 二次项系数（负值）
        a1: f64,
        /// 一次项系数
        a2: f64,
        /// 常数项
        a3: f64,
        /// 参考密度（抛物线顶点）
        rho_ref: f64,
        /// 顶点处的最大归一化压力
        dp_max: f64,
    },
}

impl EquationOfState {
    /// 由 EoS 参数构造
    ///
    /// `dp_max` 为注入侧归一化压力 p_a − p_init + ε，`dp_eps` 为归一化
    /// 偏移 ε。γ_EoS 达到 `quasi_threshold` 时切换到准不可压缩支。
    pub fn from_params(
        p_ref: f64,
        rho_ref: f64,
        gamma_eos: f64,
        dp_max: f64,
        dp_eps: f64,
        quasi_threshold: f64,
    ) -> Self {
        if gamma_eos >= quasi_threshold {
            // 密度变化幅度由 γ_EoS 控制: ρ_low = ρ_ref·(1 − 1/γ_EoS)
            let rho_low = rho_ref * (1.0 - 1.0 / gamma_eos);
            let a1 = (dp_eps - dp_max) / ((rho_low - rho_ref) * (rho_low - rho_ref));
            let a2 = -2.0 * a1 * rho_ref;
            let a3 = dp_max + a1 * rho_ref * rho_ref;
            Self::QuasiIncompressible {
                a1,
                a2,
                a3,
                rho_ref,
                dp_max,
            }
        } else {
            Self::WeaklyCompressible {
                kappa: p_ref / rho_ref.powf(gamma_eos),
                gamma: gamma_eos,
            }
        }
    }

    /// 是否为准不可压缩支
    #[inline]
    pub fn is_quasi_incompressible(&self) -> bool {
        matches!(self, Self::QuasiIncompressible { .. })
    }

    /// 由密度求归一化压力
    #[inline]
    pub fn pressure(&self, rho: f64) -> f64 {
        match *self {
            Self::WeaklyCompressible { kappa, gamma } => kappa * rho.max(0.0).powf(gamma),
            Self::QuasiIncompressible {
                a1,
                a2,
                a3,
                rho_ref,
                dp_max,
            } => {
                // 顶点右侧截断，保持单调
                if rho >= rho_ref {
                    dp_max
                } else {
                    (a1 * rho * rho + a2 * rho + a3).max(0.0)
                }
            }
        }
    }

    /// 由归一化压力求密度（初始化与钉值用）
    #[inline]
    pub fn density(&self, dp: f64) -> f64 {
        match *self {
            Self::WeaklyCompressible { kappa, gamma } => (dp.max(0.0) / kappa).powf(1.0 / gamma),
            Self::QuasiIncompressible {
                a1, rho_ref, dp_max, ..
            } => {
                let dp = dp.clamp(0.0, dp_max);
                rho_ref - ((dp - dp_max) / a1).sqrt()
            }
        }
    }
}
