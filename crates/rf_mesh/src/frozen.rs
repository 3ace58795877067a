// crates/rf_mesh/src/frozen.rs

//! 冻结壳网格
//!
//! 装配与几何预计算的最终产物，SoA 布局，运行期只读。
//! 求解器通过 CSR 行范围访问与 `neighbors.indices` 对齐的
//! 逐记录几何数组（法向、边长、中心连线、旋转矩阵）。

use glam::{DMat2, DVec2, DVec3};

use crate::topology::CsrConnectivity;

/// 单元局部坐标系
///
/// 三个正交全局单位向量加旋转角。第一轴即第一主渗透率方向。
#[derive(Debug, Clone, Copy)]
pub struct CellFrame {
    /// 第一基向量（主方向）
    pub t1: DVec3,
    /// 第二基向量
    pub t2: DVec3,
    /// 单元法向
    pub normal: DVec3,
    /// 绕法向的对齐旋转角 [rad]
    pub theta: f64,
}

/// 冻结壳网格
#[derive(Debug, Clone)]
pub struct FrozenMesh {
    /// 节点数
    pub n_nodes: usize,
    /// 单元数
    pub n_cells: usize,
    /// 节点全局坐标
    pub node_positions: Vec<DVec3>,
    /// 节点外部编号
    pub node_ext_ids: Vec<u64>,
    /// 单元外部编号
    pub cell_ext_ids: Vec<u64>,
    /// 单元节点三元组（规范升序）
    pub cell_nodes: Vec<[u32; 3]>,
    /// 单元几何中心
    pub cell_center: Vec<DVec3>,
    /// 单元面内面积
    pub cell_area: Vec<f64>,
    /// 单元局部坐标系
    pub cell_frame: Vec<CellFrame>,
    /// 单元顶点平面坐标（相对单元中心）
    pub cell_planar: Vec<[DVec2; 3]>,
    /// 每单元边界边数
    pub boundary_edge_count: Vec<u8>,
    /// 单元-邻居 CSR 连接
    pub neighbors: CsrConnectivity<u32>,
    /// 逐记录：面法向（本单元平面坐标，朝外单位向量）
    pub nbr_normal: Vec<DVec2>,
    /// 逐记录：共享边长度
    pub nbr_edge_length: Vec<f64>,
    /// 逐记录：展平后中心连线（本单元中心 -> 邻居中心）
    pub nbr_delta: Vec<DVec2>,
    /// 逐记录：邻居系速度 -> 本单元系速度的旋转
    pub nbr_rotation: Vec<DMat2>,
    /// 按输入集合解析的补丁单元列表
    pub patch_cells: Vec<Vec<u32>>,
}

impl FrozenMesh {
    /// 单元数
    #[inline]
    pub fn n_cells(&self) -> usize {
        self.n_cells
    }

    /// 单元的邻居记录下标范围
    #[inline]
    pub fn neighbor_range(&self, cell: usize) -> std::ops::Range<usize> {
        self.neighbors.row_range(cell)
    }

    /// 单元的邻居索引切片
    #[inline]
    pub fn neighbors_of(&self, cell: usize) -> &[u32] {
        self.neighbors.row(cell)
    }

    /// 单元是否含边界边（壁面候选）
    #[inline]
    pub fn is_boundary_cell(&self, cell: usize) -> bool {
        self.boundary_edge_count[cell] > 0
    }

    /// 最小单元面积
    pub fn min_cell_area(&self) -> f64 {
        self.cell_area
            .iter()
            .copied()
            .fold(f64::INFINITY, f64::min)
    }

    /// 一致性校验（测试与装配后自检用）
    ///
    /// 检查坐标系正交归一、邻居对称性、面积为正。
    pub fn validate(&self) -> Result<(), String> {
        for (cell, frame) in self.cell_frame.iter().enumerate() {
            for (name, v) in [("t1", frame.t1), ("t2", frame.t2), ("normal", frame.normal)] {
                if (v.length() - 1.0).abs() > 1e-10 {
                    return Err(format!("单元 {cell} 基向量 {name} 非单位长"));
                }
            }
            if frame.t1.dot(frame.t2).abs() > 1e-10 {
                return Err(format!("单元 {cell} 基向量不正交"));
            }
        }
        for (cell, &area) in self.cell_area.iter().enumerate() {
            if !(area > 0.0) {
                return Err(format!("单元 {cell} 面积非正: {area}"));
            }
        }
        for j in 0..self.n_cells {
            for &k in self.neighbors.row(j) {
                if !self.neighbors.row(k as usize).contains(&(j as u32)) {
                    return Err(format!("邻居关系不对称: {j} -> {k}"));
                }
                if k as usize == j {
                    return Err(format!("单元 {j} 把自己列为邻居"));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::assemble;
    use crate::frames::build_frozen;
    use crate::source::MeshSource;

    fn square_mesh() -> FrozenMesh {
        let mut src = MeshSource::new();
        src.push_node(1, DVec3::new(0.0, 0.0, 0.0));
        src.push_node(2, DVec3::new(1.0, 0.0, 0.0));
        src.push_node(3, DVec3::new(0.0, 1.0, 0.0));
        src.push_node(4, DVec3::new(1.0, 1.0, 0.0));
        src.push_triangle(10, [1, 2, 3]);
        src.push_triangle(20, [2, 4, 3]);
        let topo = assemble(&src).unwrap();
        build_frozen(topo, &[DVec3::X, DVec3::X]).unwrap()
    }

    #[test]
    fn test_validate_square() {
        let mesh = square_mesh();
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_min_cell_area() {
        let mesh = square_mesh();
        assert!((mesh.min_cell_area() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_neighbor_accessors() {
        let mesh = square_mesh();
        assert_eq!(mesh.neighbors_of(0), &[1]);
        assert_eq!(mesh.neighbor_range(0).len(), 1);
        assert!(mesh.is_boundary_cell(0));
    }
}
