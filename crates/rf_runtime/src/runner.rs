// crates/rf_runtime/src/runner.rs

//! 模拟入口门面
//!
//! 单一入口：装配网格 → 赋物性 → 构建几何 → 时间推进，
//! 可选地先把种子点解析为注入口补丁，在预定时刻写出快照，
//! 或从既有快照恢复续算。
//!
//! 全局相位：init → running → snapshotting → running → … → terminated。
//! 所有错误对本次调用都是致命的，立即从门面上抛；快照写出失败
//! 同样终止运行。

use std::sync::Arc;

use rf_foundation::{RfError, RfResult};
use rf_io::{ShellDeckLoader, Snapshot};
use rf_mesh::{assemble, build_frozen, resolve_inlet_seeds, MeshSource};
use rf_physics::{
    assign_properties, EquationOfState, FillSolver, PatchKind, ResinState, TimeStepController,
};

use crate::config::{InletSeedMode, SimulationConfig};
use crate::error::ConfigError;

/// 模拟运行报告
#[derive(Debug, Clone)]
pub struct SimulationReport {
    /// 总步数
    pub n_steps: usize,
    /// 写出的快照数
    pub n_snapshots: u64,
    /// 终止时刻 [s]
    pub final_time: f64,
    /// 终止填充率
    pub final_fill: f64,
}

/// 运行模拟（从配置中的网格文件加载）
pub fn run(config: &SimulationConfig) -> RfResult<SimulationReport> {
    config.validate().map_err(RfError::from)?;
    let source = ShellDeckLoader::load(&config.mesh_path)?;
    run_with_source(config, &source)
}

/// 运行模拟（网格数据已在内存中）
pub fn run_with_source(
    config: &SimulationConfig,
    source: &MeshSource,
) -> RfResult<SimulationReport> {
    config.validate().map_err(RfError::from)?;

    // C1: 装配
    let mut topo = assemble(source)?;
    let mut kinds = config.patches.clone();

    // C7: 种子点 → 注入口补丁
    if config.seed_mode != InletSeedMode::None {
        if config.seed_mode == InletSeedMode::ReplaceInlets {
            for kind in &mut kinds {
                if matches!(kind, PatchKind::Inlet) {
                    *kind = PatchKind::Ignored;
                }
            }
        }
        let cells = resolve_inlet_seeds(&topo.cell_center, &config.inlet_seeds, config.seed_radius)?;
        log::info!("种子解析得到 {} 个注入口单元", cells.len());
        topo.patch_cells.push(cells);
        kinds.push(PatchKind::Inlet);
    }

    // C3: 物性与分类（主方向先于几何确定）
    let props = assign_properties(&topo, &kinds, &config.default_preform);
    if props.inlet_cells().is_empty() {
        return Err(ConfigError::invalid("patches", "注入口不含任何单元").into());
    }

    // C2: 局部坐标系与展平几何
    let mesh = Arc::new(build_frozen(topo, &props.direction)?);

    // C6: 求解器
    let eps = config.numerics.pressure_eps;
    let dp_inlet = config.dp_inlet();
    let eos = EquationOfState::from_params(
        config.eos.p_ref,
        config.eos.rho_ref,
        config.eos.gamma,
        dp_inlet,
        eps,
        config.numerics.quasi_gamma_threshold,
    );
    let n_pics = config.coerced_n_pics();
    let mut solver = FillSolver::new(
        mesh.clone(),
        props,
        eos,
        config.numerics.clone(),
        dp_inlet,
    )
    .map_err(RfError::from)?;

    let mut state = solver.initial_state();
    let mut time = 0.0_f64;
    let mut n_out = 0_u64;

    // 重启：恢复 ρ/u/v/γ，压力经状态方程重算保持耦合一致
    if let Some(path) = &config.restart_from {
        let snap = Snapshot::load(path)?;
        restore_state(&solver, &snap, &mut state)?;
        time = snap.time;
        n_out = snap.n_out;
        log::info!("从快照恢复: t = {:.4}s, n_out = {}", time, n_out);
    }

    let mut controller = TimeStepController::new(
        &config.numerics,
        solver.props(),
        &mesh.cell_area,
        dp_inlet,
        config.t_max,
        n_pics,
        solver.eos().is_quasi_incompressible(),
    );

    let interval = config.t_max / n_pics as f64;
    let p_offset = config.p_offset();
    let mut n_steps = 0_usize;

    log::info!(
        "模拟开始: {} 单元, t_max = {}s, n_pics = {}, Δt₀ = {:.4e}s",
        mesh.n_cells(),
        config.t_max,
        n_pics,
        controller.dt()
    );

    while time <= config.t_max {
        let dt = controller.dt();
        solver.step(&mut state, dt).map_err(RfError::from)?;
        time += dt;
        n_steps += 1;
        controller.advance(&state, &mesh.cell_area);

        // 到达预定时刻或即将越过终止时间则写快照
        let next_out_time = interval * (n_out + 1) as f64;
        if time >= next_out_time || time + controller.dt() > config.t_max {
            n_out += 1;
            let snap = Snapshot::from_solution(
                time,
                n_out,
                &state,
                &solver.props().class,
                &mesh,
                p_offset,
            );
            snap.write_pair(&config.output_dir, &config.output_prefix)?;
            log::info!("快照 {}: {}", n_out, solver.stats().summary());
        }
    }

    let final_fill = state.fill_ratio(solver.volumes());
    log::info!(
        "模拟结束: t = {:.4}s, 步数 {}, 填充率 {:.1}%",
        time,
        n_steps,
        final_fill * 100.0
    );

    Ok(SimulationReport {
        n_steps,
        n_snapshots: n_out,
        final_time: time,
        final_fill,
    })
}

/// 从快照恢复状态
///
/// 快照不记录自适应步长，恢复后步长按初始规则重新计算。
fn restore_state(solver: &FillSolver, snap: &Snapshot, state: &mut ResinState) -> RfResult<()> {
    let n = solver.mesh().n_cells();
    RfError::check_size("snapshot_cells", n, snap.n_cells())?;

    state.rho.copy_from_slice(&snap.rho);
    state.u.copy_from_slice(&snap.u);
    state.v.copy_from_slice(&snap.v);
    state.gamma.copy_from_slice(&snap.gamma);
    for cell in 0..n {
        state.p[cell] = solver.eos().pressure(state.rho[cell]);
    }
    solver.pin_boundaries(state);
    Ok(())
}
