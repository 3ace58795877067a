// crates/rf_mesh/src/seeds.rs

//! 注入口种子点解析
//!
//! 把一组 3D 种子点按近邻半径扩展为单元集合：
//! 每个种子收集中心落在半径内的全部单元；若为空，半径乘 1.1
//! 重试，命中后取首个找到的单元。所有种子的结果并入一个
//! 注入口补丁（去重，保持发现顺序）。
//!
//! 空间查询基于 R-tree。

use std::collections::HashSet;

use glam::DVec3;
use rstar::{PointDistance, RTree, RTreeObject, AABB};

use crate::error::{MeshError, MeshResult};

/// 半径增长因子
const RADIUS_GROWTH: f64 = 1.1;

/// 半径增长次数上限，防止病态输入导致死循环
const MAX_GROWTH_STEPS: usize = 512;

/// R-tree 条目：单元中心加单元索引
#[derive(Debug, Clone)]
struct CellEntry {
    center: [f64; 3],
    cell: u32,
}

impl RTreeObject for CellEntry {
    type Envelope = AABB<[f64; 3]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.center)
    }
}

impl PointDistance for CellEntry {
    fn distance_2(&self, point: &[f64; 3]) -> f64 {
        let dx = self.center[0] - point[0];
        let dy = self.center[1] - point[1];
        let dz = self.center[2] - point[2];
        dx * dx + dy * dy + dz * dz
    }
}

/// 单元中心空间索引
pub struct CellLocator {
    tree: RTree<CellEntry>,
}

impl CellLocator {
    /// 由单元中心构建索引
    pub fn new(cell_centers: &[DVec3]) -> Self {
        let entries = cell_centers
            .iter()
            .enumerate()
            .map(|(cell, c)| CellEntry {
                center: [c.x, c.y, c.z],
                cell: cell as u32,
            })
            .collect();
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// 中心落在半径内的全部单元（按距离升序）
    pub fn cells_within(&self, point: DVec3, radius: f64) -> Vec<u32> {
        let p = [point.x, point.y, point.z];
        let mut hits: Vec<(f64, u32)> = self
            .tree
            .locate_within_distance(p, radius * radius)
            .map(|e| (e.distance_2(&p), e.cell))
            .collect();
        hits.sort_by(|a, b| a.0.total_cmp(&b.0));
        hits.into_iter().map(|(_, cell)| cell).collect()
    }
}

/// 把种子点集解析为注入口单元集合
///
/// 返回的单元顺序为发现顺序，已去重。网格为空时报错。
pub fn resolve_inlet_seeds(
    cell_centers: &[DVec3],
    seeds: &[DVec3],
    radius: f64,
) -> MeshResult<Vec<u32>> {
    if cell_centers.is_empty() {
        return Err(MeshError::EmptyMesh {
            context: "种子解析需要非空网格",
        });
    }

    let locator = CellLocator::new(cell_centers);
    let mut result = Vec::new();
    let mut seen = HashSet::new();

    for (i, &seed) in seeds.iter().enumerate() {
        let hits = locator.cells_within(seed, radius);
        let cells = if hits.is_empty() {
            grow_until_hit(&locator, seed, radius, i)?
        } else {
            hits
        };
        for cell in cells {
            if seen.insert(cell) {
                result.push(cell);
            }
        }
    }

    Ok(result)
}

/// 半径按 1.1 倍增长直到命中，取首个找到的单元
fn grow_until_hit(
    locator: &CellLocator,
    seed: DVec3,
    radius: f64,
    seed_index: usize,
) -> MeshResult<Vec<u32>> {
    let mut r = radius;
    for _ in 0..MAX_GROWTH_STEPS {
        r *= RADIUS_GROWTH;
        let hits = locator.cells_within(seed, r);
        if let Some(&first) = hits.first() {
            log::debug!(
                "种子 {} 初始半径无命中，增长到 {:.4e} 后选中单元 {}",
                seed_index,
                r,
                first
            );
            return Ok(vec![first]);
        }
    }
    Err(MeshError::EmptyMesh {
        context: "种子半径增长后仍无单元命中",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_centers() -> Vec<DVec3> {
        // 3x3 个中心点，间距 1
        let mut centers = Vec::new();
        for j in 0..3 {
            for i in 0..3 {
                centers.push(DVec3::new(i as f64, j as f64, 0.0));
            }
        }
        centers
    }

    #[test]
    fn test_cells_within_radius() {
        let centers = grid_centers();
        let locator = CellLocator::new(&centers);
        let hits = locator.cells_within(DVec3::new(1.0, 1.0, 0.0), 1.05);
        // 中心点自身 + 上下左右
        assert_eq!(hits.len(), 5);
        // 距离升序，首个为中心本身
        assert_eq!(hits[0], 4);
    }

    #[test]
    fn test_resolve_direct_hit() {
        let centers = grid_centers();
        let cells = resolve_inlet_seeds(&centers, &[DVec3::new(0.0, 0.0, 0.0)], 0.5).unwrap();
        assert_eq!(cells, vec![0]);
    }

    #[test]
    fn test_radius_growth_for_far_seed() {
        // 一个种子远离所有中心：半径反复乘 1.1 后取最近单元
        let centers = grid_centers();
        let seeds = vec![
            DVec3::new(1.0, 1.0, 0.0),
            DVec3::new(10.0, 10.0, 0.0),
            DVec3::new(0.0, 2.0, 0.0),
        ];
        let cells = resolve_inlet_seeds(&centers, &seeds, 0.5).unwrap();

        // 每个种子至少贡献一个单元，补丁非空
        assert!(!cells.is_empty());
        assert!(cells.contains(&4)); // 种子 1
        assert!(cells.contains(&8)); // 远种子选中最近角单元
        assert!(cells.contains(&6)); // 种子 3
    }

    #[test]
    fn test_dedup_preserves_order() {
        let centers = grid_centers();
        let seeds = vec![DVec3::new(0.0, 0.0, 0.0), DVec3::new(0.1, 0.0, 0.0)];
        let cells = resolve_inlet_seeds(&centers, &seeds, 0.5).unwrap();
        assert_eq!(cells, vec![0]);
    }

    #[test]
    fn test_empty_mesh_error() {
        let err = resolve_inlet_seeds(&[], &[DVec3::ZERO], 1.0).unwrap_err();
        assert!(matches!(err, MeshError::EmptyMesh { .. }));
    }
}
