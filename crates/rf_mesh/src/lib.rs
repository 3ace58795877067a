// crates/rf_mesh/src/lib.rs

//! ResinFlow 网格模块
//!
//! 三角壳网格的装配、局部坐标系与展平几何预计算。
//!
//! # 核心类型
//!
//! - [`MeshSource`]: 带外部编号的原始输入
//! - [`ShellTopology`]: 装配后的邻接拓扑
//! - [`FrozenMesh`]: 只读的 SoA 布局网格，用于计算
//!
//! # 模块结构
//!
//! - [`source`]: 输入数据模型
//! - [`assembler`]: 半边分组与邻接装配
//! - [`frames`]: 局部坐标系与展平几何
//! - [`frozen`]: 冻结网格
//! - [`topology`]: CSR 连接性存储
//! - [`seeds`]: 注入口种子点解析
//!
//! # 示例
//!
//! ```
//! use glam::DVec3;
//! use rf_mesh::{assembler, frames, MeshSource};
//!
//! let mut src = MeshSource::new();
//! src.push_node(1, DVec3::new(0.0, 0.0, 0.0));
//! src.push_node(2, DVec3::new(1.0, 0.0, 0.0));
//! src.push_node(3, DVec3::new(0.0, 1.0, 0.0));
//! src.push_triangle(1, [1, 2, 3]);
//!
//! let topo = assembler::assemble(&src).unwrap();
//! let mesh = frames::build_frozen(topo, &[DVec3::X]).unwrap();
//! assert_eq!(mesh.n_cells(), 1);
//! ```

pub mod assembler;
pub mod error;
pub mod frames;
pub mod frozen;
pub mod seeds;
pub mod source;
pub mod topology;

pub use assembler::{assemble, ShellTopology, MAX_CELL_NEIGHBORS};
pub use error::{MeshError, MeshResult};
pub use frames::build_frozen;
pub use frozen::{CellFrame, FrozenMesh};
pub use seeds::{resolve_inlet_seeds, CellLocator};
pub use source::{MeshSource, SourceNode, SourceTriangle, TriangleSet};
pub use topology::CsrConnectivity;
