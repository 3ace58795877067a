// crates/rf_physics/src/timestep.rs

//! 时间步长控制
//!
//! 显式格式的稳定性由两级控制保证：
//!
//! 1. **初始步长**：Δt₀ = β₁·√Ā / v_max，Ā 为最小面内单元面积，
//!    v_max 为网格上特征达西速度 K·Δp/(μ·A) 的最大值。
//! 2. **自适应松弛**：前 n_pics 步保持初始步长，之后按
//!    Δt ← (1−w)·Δt + w·β₂·min(√A/|u|) 松弛更新，
//!    并以 t_max/(4·n_pics) 为硬上限。
//!
//! 准不可压缩状态方程声速更高，β₂ 取更保守的值。

use crate::properties::CellProperties;
use crate::state::ResinState;
use crate::types::NumericalParams;

/// 自适应时间步长控制器
#[derive(Debug, Clone)]
pub struct TimeStepController {
    /// 当前步长 [s]
    dt: f64,
    /// 自适应系数 β₂
    beta2: f64,
    /// 松弛权重 w
    relax: f64,
    /// 硬上限 t_max / (4·n_pics)
    dt_cap: f64,
    /// 自适应启动前的步数（= n_pics）
    startup_steps: usize,
    /// 已完成步数
    step_count: usize,
    /// 近静止单元的速度平方阈值
    speed_sq_eps: f64,
}

impl TimeStepController {
    /// 创建控制器并计算初始步长
    ///
    /// `quasi_incompressible` 为真时 β₂ 取保守值。
    pub fn new(
        params: &NumericalParams,
        props: &CellProperties,
        cell_area: &[f64],
        dp_max: f64,
        t_max: f64,
        n_pics: usize,
        quasi_incompressible: bool,
    ) -> Self {
        let dt0 = Self::initial_dt(params, props, cell_area, dp_max);
        let dt_cap = t_max / (4.0 * n_pics as f64);
        if dt0 > dt_cap {
            log::debug!("初始步长 {dt0:.4e}s 超过上限，截断为 {dt_cap:.4e}s");
        }

        Self {
            dt: dt0.min(dt_cap),
            beta2: if quasi_incompressible {
                params.beta2_quasi
            } else {
                params.beta2
            },
            relax: params.dt_relax,
            dt_cap,
            startup_steps: n_pics,
            step_count: 0,
            speed_sq_eps: params.speed_sq_eps,
        }
    }

    /// 初始步长 Δt₀ = β₁·√Ā / v_max
    fn initial_dt(
        params: &NumericalParams,
        props: &CellProperties,
        cell_area: &[f64],
        dp_max: f64,
    ) -> f64 {
        let min_area = cell_area.iter().copied().fold(f64::INFINITY, f64::min);

        // 逐单元特征达西速度，以注入侧压差驱动
        let v_max = cell_area
            .iter()
            .enumerate()
            .map(|(i, &area)| props.k1[i] * dp_max / (props.viscosity[i] * area))
            .fold(0.0_f64, f64::max);

        params.beta1 * min_area.sqrt() / v_max
    }

    /// 当前步长
    #[inline]
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// 已完成步数
    #[inline]
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    /// 步进并自适应更新步长
    ///
    /// 返回下一步使用的步长。
    pub fn advance(&mut self, state: &ResinState, cell_area: &[f64]) -> f64 {
        self.step_count += 1;

        if self.step_count > self.startup_steps {
            let mut candidate = f64::INFINITY;
            for cell in 0..state.n_cells() {
                let speed_sq = state.u[cell] * state.u[cell] + state.v[cell] * state.v[cell];
                if speed_sq > self.speed_sq_eps {
                    candidate = candidate.min(cell_area[cell].sqrt() / speed_sq.sqrt());
                }
            }
            if candidate.is_finite() {
                self.dt = (1.0 - self.relax) * self.dt + self.relax * self.beta2 * candidate;
            }
        }

        self.dt = self.dt.min(self.dt_cap);
        self.dt
    }
}
