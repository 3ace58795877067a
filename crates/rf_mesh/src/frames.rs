// crates/rf_mesh/src/frames.rs

//! 局部坐标系与展平几何
//!
//! 有限面积格式在非平面壳上成立的关键在于两件事：
//!
//! 1. **单元局部正交系**：每个三角形按规范节点顺序构造 Gram-Schmidt
//!    正交基，再绕法向旋转 θ 使给定主方向与第一轴对齐。第一轴即第一
//!    主渗透率方向。
//! 2. **邻居展平**：把邻居三角形绕共享边旋入本单元平面，使 2-D 梯度
//!    与通量算子在面上保持一致。对每条邻居记录预计算展平后的面法向、
//!    中心连线向量以及把邻居系速度旋入本单元系的 2×2 矩阵 T。
//!
//! 全部量在装配后一次性预计算，求解阶段只读。

use glam::{DMat2, DVec2, DVec3};

use crate::assembler::ShellTopology;
use crate::error::{MeshError, MeshResult};
use crate::frozen::{CellFrame, FrozenMesh};

/// 共线判定阈值（相对两边长度乘积）
const ZERO_AREA_EPS: f64 = 1e-14;

/// 构造单个单元的局部坐标系
///
/// 基向量：b1 沿规范第一条边，b2 由第三点 Gram-Schmidt 正交化，
/// b3 = b1 × b2。随后绕 b3 旋转 θ 使 `direction` 在面内的投影与
/// 第一轴对齐；`direction` 无需与曲面相切。
fn cell_frame(
    p1: DVec3,
    p2: DVec3,
    p3: DVec3,
    direction: DVec3,
) -> Option<(CellFrame, f64)> {
    let e1 = p2 - p1;
    let e2 = p3 - p1;
    let cross = e1.cross(e2);
    let cross_len = cross.length();
    if cross_len <= ZERO_AREA_EPS * e1.length() * e2.length() {
        return None;
    }
    let area = 0.5 * cross_len;

    let b1 = e1 / e1.length();
    let proj = e2 - e2.dot(b1) * b1;
    let b2 = proj / proj.length();
    let b3 = b1.cross(b2);

    // 主方向投影到基面，θ 为其在 (b1, b2) 中的方位角
    let dx = direction.dot(b1);
    let dy = direction.dot(b2);
    let theta = if dx * dx + dy * dy < 1e-24 {
        // 主方向垂直于单元平面，保持未旋转基
        0.0
    } else {
        dy.atan2(dx)
    };

    let (sin_t, cos_t) = theta.sin_cos();
    let t1 = cos_t * b1 + sin_t * b2;
    let t2 = -sin_t * b1 + cos_t * b2;

    Some((
        CellFrame {
            t1,
            t2,
            normal: b3,
            theta,
        },
        area,
    ))
}

/// 把全局点表示为单元平面坐标
#[inline]
fn to_plane(frame: &CellFrame, center: DVec3, point: DVec3) -> DVec2 {
    let r = point - center;
    DVec2::new(r.dot(frame.t1), r.dot(frame.t2))
}

/// 展平辅助量：共享边在本单元系中的描述
struct EdgeFlattener {
    /// 边起点（3D）
    anchor3: DVec3,
    /// 边方向（3D 单位向量）
    dir3: DVec3,
    /// 边起点（本单元平面坐标）
    anchor2: DVec2,
    /// 边方向（平面单位向量）
    dir2: DVec2,
    /// 指离本单元中心的面内垂直单位向量
    perp: DVec2,
}

impl EdgeFlattener {
    /// 由共享边两端点构造；本单元中心位于平面原点
    fn new(frame: &CellFrame, center: DVec3, edge_a: DVec3, edge_b: DVec3) -> Self {
        let dir3 = (edge_b - edge_a) / (edge_b - edge_a).length();
        let anchor2 = to_plane(frame, center, edge_a);
        let b2 = to_plane(frame, center, edge_b);
        let dir2 = (b2 - anchor2) / (b2 - anchor2).length();

        // 原点（单元中心）在边直线上的垂足；中心严格位于三角形内部，
        // 垂足向量非零，其方向即朝外的面法向
        let t0 = (-anchor2).dot(dir2);
        let foot = anchor2 + t0 * dir2;
        let perp = foot / foot.length();

        Self {
            anchor3: edge_a,
            dir3,
            anchor2,
            dir2,
            perp,
        }
    }

    /// 把任意 3D 点绕共享边旋入本单元平面
    ///
    /// 点到边直线的距离保持不变，落在背离本单元的一侧。
    fn flatten(&self, point: DVec3) -> DVec2 {
        let u = (point - self.anchor3).dot(self.dir3);
        let q3 = self.anchor3 + u * self.dir3;
        let dist = (point - q3).length();
        self.anchor2 + u * self.dir2 + dist * self.perp
    }
}

/// 由拓扑与逐单元主方向构建冻结网格
///
/// `directions[i]` 是第 i 个单元的第一主渗透率方向（全局系，
/// 无需与曲面相切）。共线三角形返回 [`MeshError::ZeroAreaTriangle`]。
pub fn build_frozen(topo: ShellTopology, directions: &[DVec3]) -> MeshResult<FrozenMesh> {
    debug_assert_eq!(directions.len(), topo.n_cells);

    let n_cells = topo.n_cells;
    let mut cell_frame = Vec::with_capacity(n_cells);
    let mut cell_area = Vec::with_capacity(n_cells);
    let mut cell_planar = Vec::with_capacity(n_cells);

    for cell in 0..n_cells {
        let [i1, i2, i3] = topo.cell_nodes[cell];
        let p1 = topo.node_positions[i1 as usize];
        let p2 = topo.node_positions[i2 as usize];
        let p3 = topo.node_positions[i3 as usize];

        let (frame, area) = cell_frame_checked(p1, p2, p3, directions[cell], cell)?;
        let center = topo.cell_center[cell];
        cell_planar.push([
            to_plane(&frame, center, p1),
            to_plane(&frame, center, p2),
            to_plane(&frame, center, p3),
        ]);
        cell_frame.push(frame);
        cell_area.push(area);
    }

    // 逐邻居记录的展平几何
    let nnz = topo.neighbors.nnz();
    let mut nbr_normal = Vec::with_capacity(nnz);
    let mut nbr_edge_length = Vec::with_capacity(nnz);
    let mut nbr_delta = Vec::with_capacity(nnz);
    let mut nbr_rotation = Vec::with_capacity(nnz);

    for cell in 0..n_cells {
        let frame = &cell_frame[cell];
        let center = topo.cell_center[cell];

        for slot in topo.neighbors.row_range(cell) {
            let nbr = topo.neighbors.indices[slot] as usize;
            let [ea, eb] = topo.neighbor_edges[slot];
            let edge_a = topo.node_positions[ea as usize];
            let edge_b = topo.node_positions[eb as usize];

            let flat = EdgeFlattener::new(frame, center, edge_a, edge_b);

            nbr_normal.push(flat.perp);
            nbr_edge_length.push((edge_b - edge_a).length());
            nbr_delta.push(flat.flatten(topo.cell_center[nbr]));

            // 邻居的"虚拟局部系"：对展平后的规范节点重复坐标系构造，
            // 再施加邻居自身的 θ，即得速度旋转矩阵 T 的两列
            let [j1, j2, j3] = topo.cell_nodes[nbr];
            let q1 = flat.flatten(topo.node_positions[j1 as usize]);
            let q2 = flat.flatten(topo.node_positions[j2 as usize]);
            let q3 = flat.flatten(topo.node_positions[j3 as usize]);

            let f1 = (q2 - q1) / (q2 - q1).length();
            let w = q3 - q1;
            let w_perp = w - w.dot(f1) * f1;
            let f2 = w_perp / w_perp.length();

            let (sin_t, cos_t) = cell_frame[nbr].theta.sin_cos();
            let g1 = cos_t * f1 + sin_t * f2;
            let g2 = -sin_t * f1 + cos_t * f2;
            nbr_rotation.push(DMat2::from_cols(g1, g2));
        }
    }

    Ok(FrozenMesh {
        n_nodes: topo.n_nodes,
        n_cells,
        node_positions: topo.node_positions,
        node_ext_ids: topo.node_ext_ids,
        cell_ext_ids: topo.cell_ext_ids,
        cell_nodes: topo.cell_nodes,
        cell_center: topo.cell_center,
        cell_area,
        cell_frame,
        cell_planar,
        boundary_edge_count: topo.boundary_edge_count,
        neighbors: topo.neighbors,
        nbr_normal,
        nbr_edge_length,
        nbr_delta,
        nbr_rotation,
        patch_cells: topo.patch_cells,
    })
}

fn cell_frame_checked(
    p1: DVec3,
    p2: DVec3,
    p3: DVec3,
    direction: DVec3,
    cell: usize,
) -> MeshResult<(CellFrame, f64)> {
    cell_frame(p1, p2, p3, direction).ok_or(MeshError::ZeroAreaTriangle { cell })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::assemble;
    use crate::source::MeshSource;

    fn flat_square() -> ShellTopology {
        let mut src = MeshSource::new();
        src.push_node(1, DVec3::new(0.0, 0.0, 0.0));
        src.push_node(2, DVec3::new(1.0, 0.0, 0.0));
        src.push_node(3, DVec3::new(0.0, 1.0, 0.0));
        src.push_node(4, DVec3::new(1.0, 1.0, 0.0));
        src.push_triangle(10, [1, 2, 3]);
        src.push_triangle(20, [2, 4, 3]);
        assemble(&src).unwrap()
    }

    /// 共享边折成 90° 的两个三角形
    fn folded_pair() -> ShellTopology {
        let mut src = MeshSource::new();
        src.push_node(1, DVec3::new(0.0, 0.0, 0.0));
        src.push_node(2, DVec3::new(0.0, 1.0, 0.0));
        src.push_node(3, DVec3::new(-1.0, 0.5, 0.0));
        src.push_node(4, DVec3::new(0.0, 0.5, 1.0));
        src.push_triangle(10, [1, 2, 3]);
        src.push_triangle(20, [1, 2, 4]);
        assemble(&src).unwrap()
    }

    fn x_directions(n: usize) -> Vec<DVec3> {
        vec![DVec3::X; n]
    }

    #[test]
    fn test_frame_orthonormality() {
        let topo = flat_square();
        let mesh = build_frozen(topo, &x_directions(2)).unwrap();

        for frame in &mesh.cell_frame {
            assert!((frame.t1.length() - 1.0).abs() < 1e-12);
            assert!((frame.t2.length() - 1.0).abs() < 1e-12);
            assert!((frame.normal.length() - 1.0).abs() < 1e-12);
            assert!(frame.t1.dot(frame.t2).abs() < 1e-10, "基向量不正交");
            assert!(frame.t1.dot(frame.normal).abs() < 1e-10);
        }
    }

    #[test]
    fn test_frame_aligned_with_direction() {
        let topo = flat_square();
        let mesh = build_frozen(topo, &x_directions(2)).unwrap();

        // 平面网格且主方向在面内：两个单元的第一轴都应为 +x
        for frame in &mesh.cell_frame {
            assert!((frame.t1 - DVec3::X).length() < 1e-12, "t1 = {:?}", frame.t1);
        }
    }

    #[test]
    fn test_area_and_planar_coords() {
        let topo = flat_square();
        let mesh = build_frozen(topo, &x_directions(2)).unwrap();

        assert!((mesh.cell_area[0] - 0.5).abs() < 1e-12);
        assert!((mesh.cell_area[1] - 0.5).abs() < 1e-12);

        // 平面顶点坐标重建的面积与 3D 面积一致
        for cell in 0..2 {
            let [a, b, c] = mesh.cell_planar[cell];
            let area2d = 0.5 * ((b - a).perp_dot(c - a)).abs();
            assert!((area2d - mesh.cell_area[cell]).abs() < 1e-12);
        }
    }

    #[test]
    fn test_flat_neighbor_delta() {
        let topo = flat_square();
        let centers = topo.cell_center.clone();
        let mesh = build_frozen(topo, &x_directions(2)).unwrap();

        // 平面网格：展平中心连线长度 = 真实中心距
        let true_dist = (centers[1] - centers[0]).length();
        let slot = mesh.neighbors.row_range(0).start;
        assert!((mesh.nbr_delta[slot].length() - true_dist).abs() < 1e-12);
        // 法向单位长且背离本单元
        assert!((mesh.nbr_normal[slot].length() - 1.0).abs() < 1e-12);
        assert!(mesh.nbr_normal[slot].dot(mesh.nbr_delta[slot]) > 0.0);
    }

    #[test]
    fn test_rotation_maps_global_velocity() {
        // 平面网格中，同一全局速度在两个单元系中的分量应由 T 互相映射
        let topo = flat_square();
        let mesh = build_frozen(topo, &x_directions(2)).unwrap();

        let v_global = DVec3::new(0.3, -0.7, 0.0);
        let comp = |cell: usize| {
            let f = &mesh.cell_frame[cell];
            DVec2::new(v_global.dot(f.t1), v_global.dot(f.t2))
        };

        let slot = mesh.neighbors.row_range(0).start;
        let mapped = mesh.nbr_rotation[slot] * comp(1);
        assert!((mapped - comp(0)).length() < 1e-12, "T 映射错误: {:?}", mapped);
    }

    #[test]
    fn test_rotation_is_orthogonal() {
        let topo = folded_pair();
        let mesh = build_frozen(topo, &x_directions(2)).unwrap();

        for t in &mesh.nbr_rotation {
            let prod = *t * t.transpose();
            assert!((prod.x_axis - DVec2::X).length() < 1e-10);
            assert!((prod.y_axis - DVec2::Y).length() < 1e-10);
        }
    }

    #[test]
    fn test_folded_delta_preserves_distances() {
        let topo = folded_pair();
        let centers = topo.cell_center.clone();
        let nodes = topo.node_positions.clone();
        let mesh = build_frozen(topo, &x_directions(2)).unwrap();

        // 展平保持单元中心到共享边的距离
        let slot = mesh.neighbors.row_range(0).start;
        let [ea, eb] = [0usize, 1usize];
        let edge_a = nodes[ea];
        let edge_dir = (nodes[eb] - edge_a).normalize();

        let dist_to_edge = |p: DVec3| {
            let u = (p - edge_a).dot(edge_dir);
            (p - (edge_a + u * edge_dir)).length()
        };

        let l1 = dist_to_edge(centers[0]);
        let l2 = dist_to_edge(centers[1]);
        let delta = mesh.nbr_delta[slot];
        // 展平后的中心连线长度 = 沿垂线方向 l1 + l2（两中心垂足相同时）
        // 本构型两垂足横向错开为零
        assert!((delta.length() - (l1 + l2)).abs() < 1e-10, "delta = {:?}", delta);
    }

    #[test]
    fn test_zero_area_triangle() {
        let mut src = MeshSource::new();
        src.push_node(1, DVec3::new(0.0, 0.0, 0.0));
        src.push_node(2, DVec3::new(1.0, 0.0, 0.0));
        src.push_node(3, DVec3::new(2.0, 0.0, 0.0));
        src.push_triangle(10, [1, 2, 3]);
        let topo = assemble(&src).unwrap();
        let err = build_frozen(topo, &x_directions(1)).unwrap_err();
        assert!(matches!(err, MeshError::ZeroAreaTriangle { cell: 0 }));
    }

    #[test]
    fn test_direction_normal_to_surface() {
        // 主方向垂直曲面时 θ 取 0，基保持未旋转
        let topo = flat_square();
        let mesh = build_frozen(topo, &[DVec3::Z, DVec3::Z]).unwrap();
        assert_eq!(mesh.cell_frame[0].theta, 0.0);
    }
}
