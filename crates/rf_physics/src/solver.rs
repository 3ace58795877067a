// crates/rf_physics/src/solver.rs

//! 树脂填充求解器
//!
//! 基于有限面积法的显式时间推进：
//!
//! 1. 最小二乘压力梯度（上一步压力场）
//! 2. 一阶迎风通量累加
//! 3. 内部与壁面单元的守恒律更新（达西动量汇隐式处理）
//! 4. ρ ≥ 0、γ ∈ [0,1] 钳制，状态方程求压力
//! 5. 压力边界单元钉回固定状态
//!
//! 梯度、通量、更新三个逐单元扫描只读上一步状态、只写本单元输出，
//! 单元数超过阈值时数据并行。快照阶段是屏障：所有单元更新完成后
//! 才允许读取状态。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use glam::DVec2;
use rayon::prelude::*;
use rf_mesh::FrozenMesh;

use crate::eos::EquationOfState;
use crate::error::{SolverError, SolverResult};
use crate::flux::{self, FluxWorkspace};
use crate::gradient::LeastSquaresGradient;
use crate::properties::CellProperties;
use crate::state::{PinnedState, ResinState};
use crate::types::NumericalParams;

// ============================================================
// 求解器统计
// ============================================================

/// 求解器步进统计
#[derive(Debug, Clone, Default)]
pub struct SolverStats {
    /// 当前时间步长 [s]
    pub dt: f64,
    /// 已完成步数
    pub step: usize,
    /// 最大面内速度 [m/s]
    pub max_speed: f64,
    /// 体积加权填充率
    pub fill_ratio: f64,
}

impl SolverStats {
    /// 生成诊断摘要
    pub fn summary(&self) -> String {
        format!(
            "step={}, dt={:.4e}s, max_speed={:.3e}m/s, fill={:.1}%",
            self.step,
            self.dt,
            self.max_speed,
            self.fill_ratio * 100.0
        )
    }
}

// ============================================================
// 主求解器
// ============================================================

/// 树脂填充求解器
#[derive(Debug)]
pub struct FillSolver {
    /// 网格
    mesh: Arc<FrozenMesh>,
    /// 逐单元物性
    props: CellProperties,
    /// 状态方程
    eos: EquationOfState,
    /// 数值参数
    params: NumericalParams,
    /// 逐邻居记录的厚度加权面面积
    record_area: Vec<f64>,
    /// 单元体积 = 面积 × 厚度
    volume: Vec<f64>,
    /// 注入口单元
    inlet_cells: Vec<u32>,
    /// 出口单元
    outlet_cells: Vec<u32>,
    /// 注入口钉值
    inlet_pin: PinnedState,
    /// 出口（兼初始）钉值
    outlet_pin: PinnedState,
    /// 梯度算子
    gradient: LeastSquaresGradient,
    /// 梯度缓冲
    grad_buf: Vec<DVec2>,
    /// 通量工作区
    workspace: FluxWorkspace,
    /// 双缓冲后备状态
    scratch: ResinState,
    /// 统计信息
    stats: SolverStats,
}

impl FillSolver {
    /// 创建求解器
    ///
    /// `dp_inlet` 为注入侧归一化压力 p_a − p_init + ε。
    pub fn new(
        mesh: Arc<FrozenMesh>,
        props: CellProperties,
        eos: EquationOfState,
        params: NumericalParams,
        dp_inlet: f64,
    ) -> SolverResult<Self> {
        let n = mesh.n_cells();
        if props.n_cells() != n {
            return Err(SolverError::StateSizeMismatch {
                expected: n,
                actual: props.n_cells(),
            });
        }
        validate_cell_properties(&props)?;

        // 面面积 = 边长 × 两侧厚度均值；体积 = 面积 × 厚度
        let mut record_area = vec![0.0; mesh.neighbors.nnz()];
        for cell in 0..n {
            for slot in mesh.neighbor_range(cell) {
                let nbr = mesh.neighbors.indices[slot] as usize;
                let t_avg = 0.5 * (props.thickness[cell] + props.thickness[nbr]);
                record_area[slot] = mesh.nbr_edge_length[slot] * t_avg;
            }
        }
        let volume: Vec<f64> = (0..n)
            .map(|cell| mesh.cell_area[cell] * props.thickness[cell])
            .collect();

        let eps = params.pressure_eps;
        let inlet_pin = PinnedState {
            rho: eos.density(dp_inlet),
            p: dp_inlet,
            gamma: 1.0,
        };
        let outlet_pin = PinnedState {
            rho: eos.density(eps),
            p: eps,
            gamma: 0.0,
        };

        let inlet_cells = props.inlet_cells();
        let outlet_cells = props.outlet_cells();
        let gradient = LeastSquaresGradient::from_params(&params);

        Ok(Self {
            mesh,
            props,
            eos,
            params,
            record_area,
            volume,
            inlet_cells,
            outlet_cells,
            inlet_pin,
            outlet_pin,
            gradient,
            grad_buf: Vec::new(),
            workspace: FluxWorkspace::new(n),
            scratch: ResinState::uniform(n, 0.0, 0.0, 0.0),
            stats: SolverStats::default(),
        })
    }

    /// 构造时间 0 的初始状态
    ///
    /// 全场取出口钉值（未填充），注入口单元钉为注入状态。
    pub fn initial_state(&self) -> ResinState {
        let mut state = ResinState::uniform(
            self.mesh.n_cells(),
            self.outlet_pin.rho,
            self.outlet_pin.p,
            self.outlet_pin.gamma,
        );
        self.pin_boundaries(&mut state);
        state
    }

    /// 钉住压力边界单元
    pub fn pin_boundaries(&self, state: &mut ResinState) {
        for &cell in &self.inlet_cells {
            state.pin(cell as usize, self.inlet_pin);
        }
        for &cell in &self.outlet_cells {
            state.pin(cell as usize, self.outlet_pin);
        }
    }

    /// 执行一个时间步
    pub fn step(&mut self, state: &mut ResinState, dt: f64) -> SolverResult<()> {
        let n = self.mesh.n_cells();
        state.check_size(n)?;

        // 1. 压力梯度
        self.gradient.compute(&self.mesh, &state.p, &mut self.grad_buf);

        // 2. 通量累加
        flux::accumulate(
            &self.mesh,
            &self.props,
            &self.record_area,
            state,
            &self.grad_buf,
            &mut self.workspace,
            self.params.parallel_threshold,
        );

        // 3. 守恒律更新（写入后备缓冲）
        self.update_cells(state, dt);

        // 4. 交换缓冲，钉回边界
        std::mem::swap(state, &mut self.scratch);
        self.pin_boundaries(state);

        // 5. 有限性检查
        state.check_finite()?;

        // 6. 统计
        self.stats.step += 1;
        self.stats.dt = dt;
        self.stats.max_speed = self.compute_max_speed(state);
        self.stats.fill_ratio = state.fill_ratio(&self.volume);

        Ok(())
    }

    /// 单元守恒律更新
    fn update_cells(&mut self, state: &ResinState, dt: f64) {
        let n = self.mesh.n_cells();

        for cell in 0..n {
            if !self.props.class[cell].is_updated() {
                // 压力边界：保留旧值，交换后由 pin_boundaries 重写
                self.scratch.rho[cell] = state.rho[cell];
                self.scratch.u[cell] = state.u[cell];
                self.scratch.v[cell] = state.v[cell];
                self.scratch.p[cell] = state.p[cell];
                self.scratch.gamma[cell] = state.gamma[cell];
                continue;
            }

            let vol = self.volume[cell];
            let dt_v = dt / vol;
            let grad = self.grad_buf[cell];

            let rho_old = state.rho[cell];
            let rho_new = (rho_old - dt_v * self.workspace.mass[cell]).max(0.0);

            // 达西动量汇隐式处理，分母中出现 Δt·μ/K
            let mu = self.props.viscosity[cell];
            let denom_u = rho_new + dt * mu / self.props.k1[cell];
            let denom_v = rho_new + dt * mu / self.props.k2[cell];
            let u_new =
                (rho_old * state.u[cell] - dt_v * self.workspace.mom_u[cell] - dt * grad.x)
                    / denom_u;
            let v_new =
                (rho_old * state.v[cell] - dt_v * self.workspace.mom_v[cell] - dt * grad.y)
                    / denom_v;

            // 填充率：输运项减去非守恒修正 γⁿ·ΣF_V
            let phi = self.props.porosity[cell];
            let gamma_old = state.gamma[cell];
            let gamma_new = ((phi * gamma_old
                - dt_v * (self.workspace.vol_gamma[cell] - gamma_old * self.workspace.vol[cell]))
                / phi)
                .clamp(0.0, 1.0);

            self.scratch.rho[cell] = rho_new;
            self.scratch.u[cell] = u_new;
            self.scratch.v[cell] = v_new;
            self.scratch.gamma[cell] = gamma_new;
            self.scratch.p[cell] = self.eos.pressure(rho_new);
        }
    }

    /// 最大面内速度（并行时用原子位技巧收集最大值）
    fn compute_max_speed(&self, state: &ResinState) -> f64 {
        let n = state.n_cells();
        if n >= self.params.parallel_threshold {
            let max_bits = AtomicU64::new(0u64);
            (0..n).into_par_iter().for_each(|cell| {
                let speed =
                    (state.u[cell] * state.u[cell] + state.v[cell] * state.v[cell]).sqrt();
                max_bits.fetch_max(speed.to_bits(), Ordering::Relaxed);
            });
            f64::from_bits(max_bits.load(Ordering::Relaxed))
        } else {
            (0..n)
                .map(|cell| {
                    (state.u[cell] * state.u[cell] + state.v[cell] * state.v[cell]).sqrt()
                })
                .fold(0.0_f64, f64::max)
        }
    }

    // =========================================================================
    // 访问器
    // =========================================================================

    /// 获取网格
    pub fn mesh(&self) -> &FrozenMesh {
        &self.mesh
    }

    /// 获取物性
    pub fn props(&self) -> &CellProperties {
        &self.props
    }

    /// 获取状态方程
    pub fn eos(&self) -> &EquationOfState {
        &self.eos
    }

    /// 获取单元体积
    pub fn volumes(&self) -> &[f64] {
        &self.volume
    }

    /// 获取统计信息
    pub fn stats(&self) -> &SolverStats {
        &self.stats
    }
}

/// 逐单元物性范围检查
///
/// 厚度、渗透率、粘度为正，孔隙率在 (0, 1] 内。
fn validate_cell_properties(props: &CellProperties) -> SolverResult<()> {
    for cell in 0..props.n_cells() {
        for (field, value) in [
            ("thickness", props.thickness[cell]),
            ("k1", props.k1[cell]),
            ("k2", props.k2[cell]),
            ("viscosity", props.viscosity[cell]),
        ] {
            if !(value > 0.0) {
                return Err(SolverError::InvalidProperty { field, cell, value });
            }
        }
        let phi = props.porosity[cell];
        if !(phi > 0.0 && phi <= 1.0) {
            return Err(SolverError::InvalidProperty {
                field: "porosity",
                cell,
                value: phi,
            });
        }
    }
    Ok(())
}
