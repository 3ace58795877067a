// crates/rf_runtime/tests/pipeline.rs

//! 入口门面集成测试
//!
//! 覆盖完整管线（装配 → 物性 → 几何 → 时间推进 → 快照）、
//! 遗留格式文件加载、种子注入口、缺失文件错误与重启续算。

use std::path::PathBuf;

use glam::DVec3;
use rf_foundation::RfError;
use rf_io::{Snapshot, RESULTS_FILE};
use rf_mesh::MeshSource;
use rf_physics::PatchKind;
use rf_runtime::{run, run_with_source, InletSeedMode, SimulationConfig};

/// n x n 方板（间距 0.1m），左列注入口集合、右列出口集合
fn grid_source(n: usize) -> MeshSource {
    let mut src = MeshSource::new();
    let npr = n + 1;
    for j in 0..=n {
        for i in 0..=n {
            let id = (j * npr + i + 1) as u64;
            src.push_node(id, DVec3::new(i as f64 * 0.1, j as f64 * 0.1, 0.0));
        }
    }
    let mut left = Vec::new();
    let mut right = Vec::new();
    let mut tri_id = 0u64;
    for j in 0..n {
        for i in 0..n {
            let a = (j * npr + i + 1) as u64;
            let b = a + 1;
            let c = a + npr as u64;
            let d = c + 1;
            tri_id += 1;
            src.push_triangle(tri_id, [a, b, c]);
            if i == 0 {
                left.push(tri_id);
            }
            tri_id += 1;
            src.push_triangle(tri_id, [b, d, c]);
            if i == n - 1 {
                right.push(tri_id);
            }
        }
    }
    src.push_set("inlet", left);
    src.push_set("outlet", right);
    src
}

/// 圆环板：n_rad 层径向、n_ang 个角向分段，角向闭合。
/// j = 0 扇区为注入口集合，对径扇区为出口集合。
fn annulus_source(n_rad: usize, n_ang: usize, r0: f64, r1: f64) -> MeshSource {
    let mut src = MeshSource::new();
    for i in 0..=n_rad {
        let r = r0 + (r1 - r0) * i as f64 / n_rad as f64;
        for j in 0..n_ang {
            let th = std::f64::consts::TAU * j as f64 / n_ang as f64;
            let id = (i * n_ang + j + 1) as u64;
            src.push_node(id, DVec3::new(r * th.cos(), r * th.sin(), 0.0));
        }
    }
    let node = |i: usize, j: usize| (i * n_ang + (j % n_ang) + 1) as u64;

    let mut inlet = Vec::new();
    let mut outlet = Vec::new();
    let mut tri_id = 0u64;
    for i in 0..n_rad {
        for j in 0..n_ang {
            let a = node(i, j);
            let b = node(i, j + 1);
            let c = node(i + 1, j);
            let d = node(i + 1, j + 1);
            for nodes in [[a, b, c], [b, d, c]] {
                tri_id += 1;
                src.push_triangle(tri_id, nodes);
                if j == 0 {
                    inlet.push(tri_id);
                } else if j == n_ang / 2 {
                    outlet.push(tri_id);
                }
            }
        }
    }
    src.push_set("inlet", inlet);
    src.push_set("outlet", outlet);
    src
}

fn temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("rf_pipeline_{tag}_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// 由快照数据重建单元中心
fn snapshot_cell_centers(snap: &Snapshot) -> Vec<[f64; 2]> {
    snap.cell_nodes
        .iter()
        .map(|nodes| {
            let mut x = 0.0;
            let mut y = 0.0;
            for &n in nodes {
                x += snap.node_positions[n as usize][0];
                y += snap.node_positions[n as usize][1];
            }
            [x / 3.0, y / 3.0]
        })
        .collect()
}

fn base_config(out_dir: PathBuf) -> SimulationConfig {
    SimulationConfig {
        t_max: 8.0,
        n_pics: 4,
        patches: vec![PatchKind::Inlet, PatchKind::Outlet],
        output_dir: out_dir,
        ..SimulationConfig::default()
    }
}

#[test]
fn pipeline_smoke() {
    let dir = temp_dir("smoke");
    let config = base_config(dir.clone());
    let source = grid_source(6);

    let report = run_with_source(&config, &source).unwrap();

    assert!(report.n_steps > 0);
    assert!(report.n_snapshots >= 1);
    assert!(report.final_time > config.t_max);
    assert!(report.final_fill > 0.0, "没有任何填充发生");

    // 规范结果文件存在且可回读
    let results = dir.join(RESULTS_FILE);
    assert!(results.exists());
    let snap = Snapshot::load(&results).unwrap();
    assert_eq!(snap.n_cells(), 72);
    assert_eq!(snap.n_out, report.n_snapshots);

    // γ̂ 编码：注入口 −1，出口 −2，其余等于 γ
    assert!(snap.gamma_hat.iter().any(|&g| g == -1.0));
    assert!(snap.gamma_hat.iter().any(|&g| g == -2.0));
    for (g_hat, g) in snap.gamma_hat.iter().zip(&snap.gamma) {
        if *g_hat >= 0.0 {
            assert_eq!(g_hat, g);
        }
    }

    // 绝对压力有界：注入口处为 p_a，内部不显著超过注入压力
    let inlet_p = snap
        .p
        .iter()
        .zip(&snap.gamma_hat)
        .filter(|(_, g)| **g == -1.0)
        .map(|(p, _)| *p)
        .next()
        .unwrap();
    assert!((inlet_p - config.p_inject).abs() < 1e-6);
    let p_max = snap.p.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    assert!(p_max <= config.p_inject * 1.05);

    // 编号快照与规范快照并存
    let numbered = dir.join(Snapshot::numbered_name("fill", snap.n_out));
    assert!(numbered.exists());

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn pipeline_from_deck_file() {
    let dir = temp_dir("deck");
    let mesh_path = dir.join("plate.bdf");

    // 2x2 方板的自由域格式文件
    let mut deck = String::from("$ unit plate\n");
    let src = grid_source(2);
    for node in &src.nodes {
        deck.push_str(&format!(
            "GRID,{},,{},{},{}\n",
            node.ext_id, node.position.x, node.position.y, node.position.z
        ));
    }
    for tri in &src.triangles {
        deck.push_str(&format!(
            "CTRIA3,{},1,{},{},{}\n",
            tri.ext_id, tri.nodes[0], tri.nodes[1], tri.nodes[2]
        ));
    }
    for (k, set) in src.sets.iter().enumerate() {
        let ids: Vec<String> = set.triangle_ids.iter().map(|id| id.to_string()).collect();
        deck.push_str(&format!("SET {} = {}\n", k + 1, ids.join(", ")));
    }
    std::fs::write(&mesh_path, deck).unwrap();

    let config = SimulationConfig {
        mesh_path,
        ..base_config(dir.clone())
    };
    let report = run(&config).unwrap();
    assert!(report.final_fill > 0.0);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn missing_mesh_file_is_fatal() {
    let dir = temp_dir("missing");
    let config = SimulationConfig {
        mesh_path: PathBuf::from("/nonexistent/plate.bdf"),
        ..base_config(dir.clone())
    };
    let err = run(&config).unwrap_err();
    assert!(matches!(err, RfError::FileNotFound { .. }));
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn seed_resolved_inlet() {
    let dir = temp_dir("seeds");
    // 不带补丁注入口，仅种子点；出口补丁保留
    let config = SimulationConfig {
        patches: vec![PatchKind::Ignored, PatchKind::Outlet],
        seed_mode: InletSeedMode::AddInlets,
        inlet_seeds: vec![DVec3::new(0.05, 0.3, 0.0)],
        seed_radius: 0.08,
        ..base_config(dir.clone())
    };
    let report = run_with_source(&config, &grid_source(6)).unwrap();
    assert!(report.final_fill > 0.0, "种子注入口未驱动填充");
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn replace_mode_overrides_patch_inlets() {
    let dir = temp_dir("replace");
    let config = SimulationConfig {
        patches: vec![PatchKind::Inlet, PatchKind::Outlet],
        seed_mode: InletSeedMode::ReplaceInlets,
        inlet_seeds: vec![DVec3::new(0.55, 0.3, 0.0)],
        seed_radius: 0.08,
        t_max: 2.0,
        ..base_config(dir.clone())
    };
    let report = run_with_source(&config, &grid_source(6)).unwrap();
    assert!(report.n_snapshots >= 1);

    // 原注入口补丁（左列）被替换：左下角单元不再是注入口编码
    let snap = Snapshot::load(&dir.join(RESULTS_FILE)).unwrap();
    let n_inlets = snap.gamma_hat.iter().filter(|&&g| g == -1.0).count();
    assert!(n_inlets > 0 && n_inlets < 12, "替换后注入口应只剩种子单元");

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn disabling_outlet_only_perturbs_its_vicinity() {
    // 圆环件注满后停用出口补丁续算一小段时间：
    // 压力场仅在原出口附近（约两个单元宽）发生变化
    let source = annulus_source(2, 24, 0.2, 0.3);
    // 快渗透率缩短注满时间
    let preform = rf_physics::PreformProperties {
        k1: 3e-8,
        ..rf_physics::PreformProperties::default()
    };

    let dir_a = temp_dir("annulus_fill");
    let config_a = SimulationConfig {
        t_max: 30.0,
        default_preform: preform,
        ..base_config(dir_a.clone())
    };
    run_with_source(&config_a, &source).unwrap();
    let snap_a = Snapshot::load(&dir_a.join(RESULTS_FILE)).unwrap();

    // 前置条件：注满（压力边界单元以外 γ ≈ 1）
    for (cell, (&g_hat, &g)) in snap_a.gamma_hat.iter().zip(&snap_a.gamma).enumerate() {
        if g_hat >= 0.0 {
            assert!(g >= 0.9, "单元 {cell} 在停用出口前未注满: γ = {g}");
        }
    }

    // 续算：出口补丁改为忽略，其余不变
    let dir_b = temp_dir("annulus_no_outlet");
    let config_b = SimulationConfig {
        t_max: snap_a.time + 0.2,
        patches: vec![PatchKind::Inlet, PatchKind::Ignored],
        default_preform: preform,
        restart_from: Some(dir_a.join(RESULTS_FILE)),
        ..base_config(dir_b.clone())
    };
    let report_b = run_with_source(&config_b, &source).unwrap();
    assert!(report_b.n_steps > 0);
    assert!(report_b.final_time > snap_a.time);
    let snap_b = Snapshot::load(&dir_b.join(RESULTS_FILE)).unwrap();

    // 原出口单元与到它们的距离
    let centers = snapshot_cell_centers(&snap_a);
    let former_outlets: Vec<usize> = snap_a
        .gamma_hat
        .iter()
        .enumerate()
        .filter(|(_, g)| **g == -2.0)
        .map(|(cell, _)| cell)
        .collect();
    assert!(!former_outlets.is_empty());
    let dist_to_outlet = |cell: usize| -> f64 {
        former_outlets
            .iter()
            .map(|&o| {
                let dx = centers[cell][0] - centers[o][0];
                let dy = centers[cell][1] - centers[o][1];
                (dx * dx + dy * dy).sqrt()
            })
            .fold(f64::INFINITY, f64::min)
    };

    // 外圈单元宽约 0.08，两个单元宽取 0.17
    let near_radius = 0.17;
    let dp_range = config_a.p_inject - config_a.p_initial;

    let mut max_far = 0.0_f64;
    let mut max_near = 0.0_f64;
    for cell in 0..snap_a.n_cells() {
        let change = (snap_b.p[cell] - snap_a.p[cell]).abs();
        if dist_to_outlet(cell) > near_radius {
            max_far = max_far.max(change);
        } else {
            max_near = max_near.max(change);
        }
    }

    // 远场基本不变，原出口附近显著变化
    assert!(
        max_far < 0.03 * dp_range,
        "远离原出口的压力变化过大: {max_far:.1} Pa"
    );
    assert!(
        max_near > 500.0,
        "原出口附近压力未响应: {max_near:.1} Pa"
    );

    // 失去钉值后原出口单元开始被填充
    for &cell in &former_outlets {
        assert!(
            snap_b.gamma[cell] > 0.02,
            "原出口单元 {cell} 未开始填充: γ = {}",
            snap_b.gamma[cell]
        );
    }

    std::fs::remove_dir_all(&dir_a).ok();
    std::fs::remove_dir_all(&dir_b).ok();
}

#[test]
fn restart_is_deterministic() {
    let dir_a = temp_dir("restart_a");
    let config_a = SimulationConfig {
        t_max: 4.0,
        ..base_config(dir_a.clone())
    };
    let source = grid_source(6);
    run_with_source(&config_a, &source).unwrap();
    let checkpoint = dir_a.join(RESULTS_FILE);

    // 从同一快照续算两次，结果必须逐位一致
    let mut finals = Vec::new();
    for tag in ["restart_b1", "restart_b2"] {
        let dir_b = temp_dir(tag);
        let config_b = SimulationConfig {
            t_max: 8.0,
            restart_from: Some(checkpoint.clone()),
            ..base_config(dir_b.clone())
        };
        let report = run_with_source(&config_b, &source).unwrap();
        assert!(report.final_time > 4.0);
        finals.push(Snapshot::load(&dir_b.join(RESULTS_FILE)).unwrap());
        std::fs::remove_dir_all(&dir_b).ok();
    }

    let (a, b) = (&finals[0], &finals[1]);
    assert_eq!(a.time, b.time);
    assert_eq!(a.rho, b.rho);
    assert_eq!(a.u, b.u);
    assert_eq!(a.p, b.p);
    assert_eq!(a.gamma, b.gamma);

    // 续算推进了填充
    let start = Snapshot::load(&checkpoint).unwrap();
    let fill =
        |s: &Snapshot| s.gamma.iter().sum::<f64>() / s.n_cells() as f64;
    assert!(fill(a) >= fill(&start) - 1e-12);

    std::fs::remove_dir_all(&dir_a).ok();
}
