// crates/rf_physics/src/state.rs

//! 单元状态管理
//!
//! 采用 SoA (Structure of Arrays) 布局以优化缓存性能：
//! ```text
//! rho:   [ρ_0,  ρ_1,  ...]
//! u, v:  局部系面内速度分量
//! p:     归一化工作压力 Δp = p − p_init + ε
//! gamma: 填充率 ∈ [0, 1]
//! ```
//!
//! 状态在时间 0 创建（或从快照恢复），仅由时间循环修改，
//! 双缓冲在步末交换。

use rf_foundation::float::{first_non_finite, safe_div};
use serde::{Deserialize, Serialize};

use crate::error::{SolverError, SolverResult};

/// 单个单元的固定状态（压力边界钉值用）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinnedState {
    /// 密度
    pub rho: f64,
    /// 归一化压力
    pub p: f64,
    /// 填充率
    pub gamma: f64,
}

/// 树脂填充状态
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResinState {
    /// 密度 [kg/m³]
    pub rho: Vec<f64>,
    /// 局部系 x 速度 [m/s]
    pub u: Vec<f64>,
    /// 局部系 y 速度 [m/s]
    pub v: Vec<f64>,
    /// 归一化压力 Δp [Pa]
    pub p: Vec<f64>,
    /// 填充率
    pub gamma: Vec<f64>,
}

impl ResinState {
    /// 创建均匀初始状态
    pub fn uniform(n_cells: usize, rho: f64, p: f64, gamma: f64) -> Self {
        Self {
            rho: vec![rho; n_cells],
            u: vec![0.0; n_cells],
            v: vec![0.0; n_cells],
            p: vec![p; n_cells],
            gamma: vec![gamma; n_cells],
        }
    }

    /// 单元数
    #[inline]
    pub fn n_cells(&self) -> usize {
        self.rho.len()
    }

    /// 钉住一个单元
    #[inline]
    pub fn pin(&mut self, cell: usize, pinned: PinnedState) {
        self.rho[cell] = pinned.rho;
        self.u[cell] = 0.0;
        self.v[cell] = 0.0;
        self.p[cell] = pinned.p;
        self.gamma[cell] = pinned.gamma;
    }

    /// 按长度校验
    pub fn check_size(&self, n_cells: usize) -> SolverResult<()> {
        if self.n_cells() != n_cells {
            return Err(SolverError::StateSizeMismatch {
                expected: n_cells,
                actual: self.n_cells(),
            });
        }
        Ok(())
    }

    /// 有限性校验
    ///
    /// 返回首个非有限值对应的错误。
    pub fn check_finite(&self) -> SolverResult<()> {
        for (field, values) in [
            ("rho", &self.rho),
            ("u", &self.u),
            ("v", &self.v),
            ("p", &self.p),
            ("gamma", &self.gamma),
        ] {
            if let Some(cell) = first_non_finite(values) {
                return Err(SolverError::NonFinite {
                    field,
                    cell,
                    value: values[cell],
                });
            }
        }
        Ok(())
    }

    /// 范围不变量校验（测试用）
    ///
    /// γ ∈ [0,1]、ρ ≥ 0、Δp ≥ 0。
    pub fn check_invariants(&self) -> Result<(), String> {
        for (cell, &g) in self.gamma.iter().enumerate() {
            if !(0.0..=1.0).contains(&g) {
                return Err(format!("单元 {cell} 填充率越界: {g}"));
            }
        }
        for (cell, &r) in self.rho.iter().enumerate() {
            if r < 0.0 {
                return Err(format!("单元 {cell} 密度为负: {r}"));
            }
        }
        for (cell, &p) in self.p.iter().enumerate() {
            if p < 0.0 {
                return Err(format!("单元 {cell} 归一化压力为负: {p}"));
            }
        }
        Ok(())
    }

    /// 体积加权平均填充率
    pub fn fill_ratio(&self, volumes: &[f64]) -> f64 {
        let total: f64 = volumes.iter().sum();
        let filled: f64 = self
            .gamma
            .iter()
            .zip(volumes)
            .map(|(g, vol)| g * vol)
            .sum();
        safe_div(filled, total)
    }
}
