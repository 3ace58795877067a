// crates/rf_physics/src/flux.rs

//! 一阶迎风数值通量
//!
//! 在展平界面上计算质量/动量/填充率通量。邻居速度先经预计算的
//! 2×2 旋转矩阵转入本单元局部系，再与本单元速度做算术平均：
//!
//! - 质量通量 F_ρ = (n·(ρ̄ū))·A_fc，ρ̄ 为界面平均密度
//! - 动量通量按 F_ρ 符号迎风
//! - 体积通量 F_V = (n·ū)·A_fc，γ 的输运项与裸通量都累加
//!   （裸通量进入 γ 更新的非守恒修正项）
//!
//! 压力边界面的面积按本单元厚度缩放；注入口的过面速度由达西定律
//! 给出并截断为仅入流，出口由内部状态外推。
//!
//! 逐单元累加只读上一步状态、只写本单元输出，可跨单元数据并行。

use glam::DVec2;
use rayon::prelude::*;
use rf_mesh::FrozenMesh;

use crate::properties::CellProperties;
use crate::state::ResinState;
use crate::types::CellClass;

/// 单元的通量累加结果
#[derive(Debug, Clone, Copy, Default)]
pub struct CellFluxes {
    /// Σ F_ρ
    pub mass: f64,
    /// Σ F_u
    pub mom_u: f64,
    /// Σ F_v
    pub mom_v: f64,
    /// Σ γ_up·F_V（输运项）
    pub vol_gamma: f64,
    /// Σ F_V（裸体积通量）
    pub vol: f64,
}

impl CellFluxes {
    /// 零通量
    pub const ZERO: Self = Self {
        mass: 0.0,
        mom_u: 0.0,
        mom_v: 0.0,
        vol_gamma: 0.0,
        vol: 0.0,
    };

    /// 累加一个面的贡献
    ///
    /// `vel_nbr` 与 `gamma_nbr` 为逆风侧备选（邻居一侧），
    /// 迎风选择分别按质量通量与体积通量的符号进行。
    #[inline]
    fn add_face(
        &mut self,
        vn: f64,
        afc: f64,
        rho_bar: f64,
        vel_own: DVec2,
        vel_nbr: DVec2,
        gamma_own: f64,
        gamma_nbr: f64,
    ) {
        let f_mass = rho_bar * vn * afc;
        let vel_up = if f_mass >= 0.0 { vel_own } else { vel_nbr };
        let f_vol = vn * afc;
        let gamma_up = if f_vol >= 0.0 { gamma_own } else { gamma_nbr };

        self.mass += f_mass;
        self.mom_u += f_mass * vel_up.x;
        self.mom_v += f_mass * vel_up.y;
        self.vol_gamma += gamma_up * f_vol;
        self.vol += f_vol;
    }
}

/// 通量累加工作区
///
/// 存储中间计算结果，避免重复分配。
#[derive(Debug, Default)]
pub struct FluxWorkspace {
    /// 质量通量和
    pub mass: Vec<f64>,
    /// x 动量通量和
    pub mom_u: Vec<f64>,
    /// y 动量通量和
    pub mom_v: Vec<f64>,
    /// γ 输运通量和
    pub vol_gamma: Vec<f64>,
    /// 裸体积通量和
    pub vol: Vec<f64>,
}

impl FluxWorkspace {
    /// 创建工作区
    pub fn new(n_cells: usize) -> Self {
        Self {
            mass: vec![0.0; n_cells],
            mom_u: vec![0.0; n_cells],
            mom_v: vec![0.0; n_cells],
            vol_gamma: vec![0.0; n_cells],
            vol: vec![0.0; n_cells],
        }
    }

    /// 调整大小并清零
    pub fn reset(&mut self, n_cells: usize) {
        for buf in [
            &mut self.mass,
            &mut self.mom_u,
            &mut self.mom_v,
            &mut self.vol_gamma,
            &mut self.vol,
        ] {
            buf.clear();
            buf.resize(n_cells, 0.0);
        }
    }

    #[inline]
    fn store(&mut self, cell: usize, fluxes: CellFluxes) {
        self.mass[cell] = fluxes.mass;
        self.mom_u[cell] = fluxes.mom_u;
        self.mom_v[cell] = fluxes.mom_v;
        self.vol_gamma[cell] = fluxes.vol_gamma;
        self.vol[cell] = fluxes.vol;
    }
}

/// 计算单个单元的全部面通量
///
/// `record_area` 为与邻居记录对齐的厚度加权面面积
/// （边长 × 两侧厚度均值）。
pub fn cell_fluxes(
    mesh: &FrozenMesh,
    props: &CellProperties,
    record_area: &[f64],
    state: &ResinState,
    grad: &[DVec2],
    cell: usize,
) -> CellFluxes {
    let vel_own = DVec2::new(state.u[cell], state.v[cell]);
    let rho_own = state.rho[cell];
    let gamma_own = state.gamma[cell];
    let t_own = props.thickness[cell];

    let mut out = CellFluxes::ZERO;

    for slot in mesh.neighbor_range(cell) {
        let nbr = mesh.neighbors.indices[slot] as usize;
        let normal = mesh.nbr_normal[slot];
        let vel_nbr = mesh.nbr_rotation[slot] * DVec2::new(state.u[nbr], state.v[nbr]);
        let rho_bar = 0.5 * (rho_own + state.rho[nbr]);
        let gamma_nbr = state.gamma[nbr];

        match props.class[nbr] {
            CellClass::PressureInlet => {
                // 达西定律给出过面速度，截断为仅入流（注入口不倒吸）
                let g = grad[cell];
                let darcy = -DVec2::new(props.k1[cell] * g.x, props.k2[cell] * g.y)
                    / props.viscosity[cell];
                let vn = normal.dot(darcy).min(0.0);
                let afc = mesh.nbr_edge_length[slot] * t_own;
                out.add_face(vn, afc, rho_bar, vel_own, vel_nbr, gamma_own, gamma_nbr);
            }
            CellClass::PressureOutlet => {
                // 出流由内部状态决定
                let vn = normal.dot(vel_own);
                let afc = mesh.nbr_edge_length[slot] * t_own;
                out.add_face(vn, afc, rho_bar, vel_own, vel_nbr, gamma_own, gamma_nbr);
            }
            CellClass::Interior | CellClass::Wall => {
                let u_bar = 0.5 * (vel_own + vel_nbr);
                let vn = normal.dot(u_bar);
                out.add_face(
                    vn,
                    record_area[slot],
                    rho_bar,
                    vel_own,
                    vel_nbr,
                    gamma_own,
                    gamma_nbr,
                );
            }
        }
    }

    out
}

/// 累加全场通量到工作区
///
/// 压力边界单元被钉死不更新，直接置零跳过。
pub fn accumulate(
    mesh: &FrozenMesh,
    props: &CellProperties,
    record_area: &[f64],
    state: &ResinState,
    grad: &[DVec2],
    workspace: &mut FluxWorkspace,
    parallel_threshold: usize,
) {
    let n = mesh.n_cells();
    workspace.reset(n);

    if n >= parallel_threshold {
        let results: Vec<CellFluxes> = (0..n)
            .into_par_iter()
            .map(|cell| {
                if props.class[cell].is_updated() {
                    cell_fluxes(mesh, props, record_area, state, grad, cell)
                } else {
                    CellFluxes::ZERO
                }
            })
            .collect();
        for (cell, fluxes) in results.into_iter().enumerate() {
            workspace.store(cell, fluxes);
        }
    } else {
        for cell in 0..n {
            if props.class[cell].is_updated() {
                let fluxes = cell_fluxes(mesh, props, record_area, state, grad, cell);
                workspace.store(cell, fluxes);
            }
        }
    }
}
