// crates/rf_physics/src/properties.rs

//! 单元物性赋值
//!
//! 把补丁成员关系映射为逐单元物性与分类：
//! - `preform_override` 补丁的单元使用补丁物性，其余用默认物性
//! - 注入口/出口补丁设置单元分类；声明顺序靠后的补丁胜出
//! - 其余单元保留装配器给出的分类（内部或壁面）
//!
//! 赋值是纯函数：重复执行产出相同数组。

use glam::DVec3;
use rf_mesh::ShellTopology;
use serde::{Deserialize, Serialize};

use crate::types::{CellClass, PreformProperties};

/// 补丁类型
///
/// 集合本身来自网格输入；类型标签由配置按声明顺序赋予。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PatchKind {
    /// 忽略该集合
    Ignored,
    /// 压力注入口
    Inlet,
    /// 压力出口
    Outlet,
    /// 物性覆盖（如跑道效应的高渗透带）
    PreformOverride(PreformProperties),
}

/// 逐单元物性数组（SoA）
#[derive(Debug, Clone, PartialEq)]
pub struct CellProperties {
    /// 厚度 [m]
    pub thickness: Vec<f64>,
    /// 孔隙率
    pub porosity: Vec<f64>,
    /// 第一主渗透率 [m²]
    pub k1: Vec<f64>,
    /// 第二主渗透率 [m²]
    pub k2: Vec<f64>,
    /// 动力粘度 [Pa·s]
    pub viscosity: Vec<f64>,
    /// 第一主方向（全局系）
    pub direction: Vec<DVec3>,
    /// 单元分类
    pub class: Vec<CellClass>,
}

impl CellProperties {
    /// 单元数
    #[inline]
    pub fn n_cells(&self) -> usize {
        self.class.len()
    }

    /// 注入口单元列表
    pub fn inlet_cells(&self) -> Vec<u32> {
        self.cells_of_class(CellClass::PressureInlet)
    }

    /// 出口单元列表
    pub fn outlet_cells(&self) -> Vec<u32> {
        self.cells_of_class(CellClass::PressureOutlet)
    }

    fn cells_of_class(&self, class: CellClass) -> Vec<u32> {
        self.class
            .iter()
            .enumerate()
            .filter(|(_, c)| **c == class)
            .map(|(i, _)| i as u32)
            .collect()
    }
}

/// 按补丁成员关系赋物性与分类
///
/// `kinds[k]` 对应 `topo.patch_cells[k]`；多余的集合视为 Ignored。
/// 同一单元被多个定类补丁覆盖时，后声明者胜出。
pub fn assign_properties(
    topo: &ShellTopology,
    kinds: &[PatchKind],
    default: &PreformProperties,
) -> CellProperties {
    let n = topo.n_cells;

    let mut props = CellProperties {
        thickness: vec![default.thickness; n],
        porosity: vec![default.porosity; n],
        k1: vec![default.k1; n],
        k2: vec![default.k2(); n],
        viscosity: vec![default.viscosity; n],
        direction: vec![default.direction; n],
        class: (0..n)
            .map(|cell| {
                if topo.is_boundary_cell(cell) {
                    CellClass::Wall
                } else {
                    CellClass::Interior
                }
            })
            .collect(),
    };

    for (kind, cells) in kinds.iter().zip(&topo.patch_cells) {
        match kind {
            PatchKind::Ignored => {}
            PatchKind::Inlet => {
                for &cell in cells {
                    props.class[cell as usize] = CellClass::PressureInlet;
                }
            }
            PatchKind::Outlet => {
                for &cell in cells {
                    props.class[cell as usize] = CellClass::PressureOutlet;
                }
            }
            PatchKind::PreformOverride(over) => {
                for &cell in cells {
                    let i = cell as usize;
                    props.thickness[i] = over.thickness;
                    props.porosity[i] = over.porosity;
                    props.k1[i] = over.k1;
                    props.k2[i] = over.k2();
                    props.viscosity[i] = over.viscosity;
                    props.direction[i] = over.direction;
                }
            }
        }
    }

    props
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;
    use rf_mesh::{assemble, MeshSource};

    /// 2x1 的四三角形条带；每个单元都含边界边，分类靠补丁区分
    fn strip_topology() -> ShellTopology {
        let mut src = MeshSource::new();
        src.push_node(1, DVec3::new(0.0, 0.0, 0.0));
        src.push_node(2, DVec3::new(1.0, 0.0, 0.0));
        src.push_node(3, DVec3::new(2.0, 0.0, 0.0));
        src.push_node(4, DVec3::new(0.0, 1.0, 0.0));
        src.push_node(5, DVec3::new(1.0, 1.0, 0.0));
        src.push_node(6, DVec3::new(2.0, 1.0, 0.0));
        src.push_triangle(10, [1, 2, 4]);
        src.push_triangle(20, [2, 5, 4]);
        src.push_triangle(30, [2, 3, 5]);
        src.push_triangle(40, [3, 6, 5]);
        src.push_set("left", vec![10]);
        src.push_set("right", vec![40]);
        src.push_set("band", vec![20, 30]);
        assemble(&src).unwrap()
    }

    #[test]
    fn test_default_assignment() {
        let topo = strip_topology();
        let default = PreformProperties::default();
        let props = assign_properties(&topo, &[], &default);

        assert_eq!(props.n_cells(), 4);
        assert!(props.thickness.iter().all(|&t| t == default.thickness));
        // 条带所有单元都有边界边
        assert!(props.class.iter().all(|&c| c == CellClass::Wall));
    }

    #[test]
    fn test_inlet_outlet_classes() {
        let topo = strip_topology();
        let kinds = vec![PatchKind::Inlet, PatchKind::Outlet];
        let props = assign_properties(&topo, &kinds, &PreformProperties::default());

        assert_eq!(props.class[0], CellClass::PressureInlet);
        assert_eq!(props.class[3], CellClass::PressureOutlet);
        assert_eq!(props.inlet_cells(), vec![0]);
        assert_eq!(props.outlet_cells(), vec![3]);
    }

    #[test]
    fn test_override_patch() {
        let topo = strip_topology();
        let over = PreformProperties {
            k1: 9e-9,
            alpha: 0.5,
            porosity: 0.5,
            ..PreformProperties::default()
        };
        let kinds = vec![
            PatchKind::Ignored,
            PatchKind::Ignored,
            PatchKind::PreformOverride(over),
        ];
        let props = assign_properties(&topo, &kinds, &PreformProperties::default());

        assert_eq!(props.k1[1], 9e-9);
        assert_eq!(props.k2[1], 4.5e-9);
        assert_eq!(props.porosity[2], 0.5);
        // 覆盖补丁不改变分类
        assert_eq!(props.class[1], CellClass::Wall);
        // 未覆盖单元保持默认
        assert_eq!(props.k1[0], 3e-10);
    }

    #[test]
    fn test_later_patch_wins() {
        let mut src = MeshSource::new();
        src.push_node(1, DVec3::new(0.0, 0.0, 0.0));
        src.push_node(2, DVec3::new(1.0, 0.0, 0.0));
        src.push_node(3, DVec3::new(0.0, 1.0, 0.0));
        src.push_triangle(10, [1, 2, 3]);
        src.push_set("a", vec![10]);
        src.push_set("b", vec![10]);
        let topo = assemble(&src).unwrap();

        let kinds = vec![PatchKind::Inlet, PatchKind::Outlet];
        let props = assign_properties(&topo, &kinds, &PreformProperties::default());
        assert_eq!(props.class[0], CellClass::PressureOutlet);
    }

    #[test]
    fn test_assignment_idempotent() {
        let topo = strip_topology();
        let kinds = vec![
            PatchKind::Inlet,
            PatchKind::Outlet,
            PatchKind::PreformOverride(PreformProperties {
                k1: 1e-9,
                ..PreformProperties::default()
            }),
        ];
        let default = PreformProperties::default();
        let first = assign_properties(&topo, &kinds, &default);
        let second = assign_properties(&topo, &kinds, &default);
        assert_eq!(first, second);
    }
}
