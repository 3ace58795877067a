// crates/rf_physics/src/lib.rs

//! ResinFlow 物理模块
//!
//! 薄预制体树脂注入的可压缩达西流求解器。
//!
//! # 核心类型
//!
//! - [`FillSolver`]: 显式有限面积时间推进
//! - [`ResinState`]: SoA 布局单元状态 (ρ, u, v, Δp, γ)
//! - [`EquationOfState`]: 弱可压缩 / 准不可压缩两支
//! - [`CellProperties`]: 逐单元达西介质物性
//!
//! # 模块结构
//!
//! - [`types`]: 单元分类、物性组、数值参数
//! - [`properties`]: 补丁到物性/分类的映射
//! - [`state`]: 状态管理
//! - [`eos`]: 状态方程
//! - [`gradient`]: 最小二乘压力梯度
//! - [`flux`]: 一阶迎风通量
//! - [`timestep`]: 自适应时间步控制
//! - [`solver`]: 时间循环

pub mod eos;
pub mod error;
pub mod flux;
pub mod gradient;
pub mod properties;
pub mod solver;
pub mod state;
pub mod timestep;
pub mod types;

pub use eos::EquationOfState;
pub use error::{SolverError, SolverResult};
pub use gradient::LeastSquaresGradient;
pub use properties::{assign_properties, CellProperties, PatchKind};
pub use solver::{FillSolver, SolverStats};
pub use state::{PinnedState, ResinState};
pub use timestep::TimeStepController;
pub use types::{CellClass, NumericalParams, PreformProperties};
