// crates/rf_mesh/src/assembler.rs

//! 壳网格装配器
//!
//! 从节点/三角形/集合输入构建单元邻接拓扑：
//! - 外部编号解析为稠密 0 基索引
//! - 节点三元组按外部编号升序规范化
//! - 半边按 (min, max) 键分组，识别邻居与壁面边
//! - 补丁外部编号解析为单元索引，保持输入顺序
//!
//! 退化情况（重复三角形、非流形边、邻居数超限）立即报错。

use std::collections::HashMap;

use glam::DVec3;

use crate::error::{MeshError, MeshResult};
use crate::source::MeshSource;
use crate::topology::CsrConnectivity;

/// 单元邻居数上限
///
/// 网格卫生阈值：超过此数的邻居几乎总是输入数据损坏的征兆。
pub const MAX_CELL_NEIGHBORS: usize = 10;

/// 装配后的壳拓扑
///
/// 纯连接性产物，不含局部坐标系几何（见 [`crate::frames`]）。
#[derive(Debug, Clone)]
pub struct ShellTopology {
    /// 节点数
    pub n_nodes: usize,
    /// 单元数
    pub n_cells: usize,
    /// 节点全局坐标（稠密索引）
    pub node_positions: Vec<DVec3>,
    /// 节点外部编号
    pub node_ext_ids: Vec<u64>,
    /// 单元外部编号
    pub cell_ext_ids: Vec<u64>,
    /// 单元节点三元组，按外部编号升序规范化
    pub cell_nodes: Vec<[u32; 3]>,
    /// 单元几何中心
    pub cell_center: Vec<DVec3>,
    /// 单元-邻居 CSR 连接
    pub neighbors: CsrConnectivity<u32>,
    /// 每条邻居记录的共享边（稠密节点索引，min 在前）
    ///
    /// 与 `neighbors.indices` 平坦对齐。
    pub neighbor_edges: Vec<[u32; 2]>,
    /// 每单元的边界边数，非零即壁面单元
    pub boundary_edge_count: Vec<u8>,
    /// 按输入集合解析的补丁单元列表（保持集合内顺序）
    pub patch_cells: Vec<Vec<u32>>,
}

impl ShellTopology {
    /// 单元是否含边界边（壁面候选）
    #[inline]
    pub fn is_boundary_cell(&self, cell: usize) -> bool {
        self.boundary_edge_count[cell] > 0
    }
}

/// 装配壳拓扑
///
/// 契约见模块文档；孤立节点被静默保留。
pub fn assemble(source: &MeshSource) -> MeshResult<ShellTopology> {
    if source.triangles.is_empty() {
        return Err(MeshError::EmptyMesh {
            context: "输入不含三角形",
        });
    }

    // 节点外部编号 -> 稠密索引
    let mut node_index: HashMap<u64, u32> = HashMap::with_capacity(source.nodes.len());
    let mut node_positions = Vec::with_capacity(source.nodes.len());
    let mut node_ext_ids = Vec::with_capacity(source.nodes.len());
    for node in &source.nodes {
        if node_index.insert(node.ext_id, node_positions.len() as u32).is_some() {
            return Err(MeshError::DuplicateNodeId { id: node.ext_id });
        }
        node_positions.push(node.position);
        node_ext_ids.push(node.ext_id);
    }

    let n_cells = source.triangles.len();
    let mut cell_nodes = Vec::with_capacity(n_cells);
    let mut cell_ext_ids = Vec::with_capacity(n_cells);
    let mut cell_center = Vec::with_capacity(n_cells);
    let mut tri_index: HashMap<u64, u32> = HashMap::with_capacity(n_cells);
    let mut seen_triples: HashMap<[u32; 3], u64> = HashMap::with_capacity(n_cells);

    for (dense, tri) in source.triangles.iter().enumerate() {
        // 按外部编号升序规范化，再映射为稠密索引
        let mut ext = tri.nodes;
        ext.sort_unstable();

        let mut dense_nodes = [0u32; 3];
        for (k, &ext_id) in ext.iter().enumerate() {
            dense_nodes[k] = *node_index.get(&ext_id).ok_or(MeshError::MissingNode {
                triangle: tri.ext_id,
                node: ext_id,
            })?;
        }

        if seen_triples.insert(dense_nodes, tri.ext_id).is_some() {
            return Err(MeshError::DuplicateTriangle {
                triangle: tri.ext_id,
            });
        }
        tri_index.insert(tri.ext_id, dense as u32);

        let center = (node_positions[dense_nodes[0] as usize]
            + node_positions[dense_nodes[1] as usize]
            + node_positions[dense_nodes[2] as usize])
            / 3.0;

        cell_nodes.push(dense_nodes);
        cell_ext_ids.push(tri.ext_id);
        cell_center.push(center);
    }

    // 半边分组: (min, max) -> 贡献单元
    let mut edge_cells: HashMap<(u32, u32), Vec<u32>> = HashMap::with_capacity(n_cells * 3 / 2);
    for (cell, nodes) in cell_nodes.iter().enumerate() {
        for &(a, b) in &[(nodes[0], nodes[1]), (nodes[1], nodes[2]), (nodes[0], nodes[2])] {
            let key = (a.min(b), a.max(b));
            edge_cells.entry(key).or_default().push(cell as u32);
        }
    }

    let mut neighbor_lists: Vec<Vec<(u32, [u32; 2])>> = vec![Vec::new(); n_cells];
    let mut boundary_edge_count = vec![0u8; n_cells];

    for (&(n1, n2), cells) in &edge_cells {
        match cells.as_slice() {
            [c] => boundary_edge_count[*c as usize] += 1,
            [c1, c2] => {
                neighbor_lists[*c1 as usize].push((*c2, [n1, n2]));
                neighbor_lists[*c2 as usize].push((*c1, [n1, n2]));
            }
            many => {
                return Err(MeshError::NonManifoldEdge {
                    n1,
                    n2,
                    count: many.len(),
                })
            }
        }
    }

    // 邻居按单元索引排序，保证装配结果与哈希迭代顺序无关
    for list in &mut neighbor_lists {
        list.sort_unstable_by_key(|(nbr, _)| *nbr);
    }

    for (cell, list) in neighbor_lists.iter().enumerate() {
        if list.len() > MAX_CELL_NEIGHBORS {
            return Err(MeshError::TooManyNeighbors {
                cell,
                count: list.len(),
                limit: MAX_CELL_NEIGHBORS,
            });
        }
    }

    // 构建 CSR 及对齐的共享边数组
    let mut offsets = Vec::with_capacity(n_cells + 1);
    let mut indices = Vec::new();
    let mut neighbor_edges = Vec::new();
    offsets.push(0u32);
    for list in &neighbor_lists {
        for &(nbr, edge) in list {
            indices.push(nbr);
            neighbor_edges.push(edge);
        }
        offsets.push(indices.len() as u32);
    }

    // 补丁解析
    let mut patch_cells = Vec::with_capacity(source.sets.len());
    for (patch, set) in source.sets.iter().enumerate() {
        let mut cells = Vec::with_capacity(set.triangle_ids.len());
        for &tri_id in &set.triangle_ids {
            let dense = tri_index.get(&tri_id).ok_or(MeshError::UnknownPatchTriangle {
                patch,
                triangle: tri_id,
            })?;
            cells.push(*dense);
        }
        patch_cells.push(cells);
    }

    Ok(ShellTopology {
        n_nodes: node_positions.len(),
        n_cells,
        node_positions,
        node_ext_ids,
        cell_ext_ids,
        cell_nodes,
        cell_center,
        neighbors: CsrConnectivity::new(offsets, indices),
        neighbor_edges,
        boundary_edge_count,
        patch_cells,
    })
}
