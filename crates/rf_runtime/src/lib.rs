// crates/rf_runtime/src/lib.rs

//! ResinFlow 运行时模块
//!
//! 带校验的配置记录与单一模拟入口。
//!
//! # 示例
//!
//! ```no_run
//! use rf_runtime::{run, SimulationConfig};
//! use rf_physics::PatchKind;
//!
//! let config = SimulationConfig {
//!     mesh_path: "part.bdf".into(),
//!     patches: vec![PatchKind::Inlet, PatchKind::Outlet],
//!     ..SimulationConfig::default()
//! };
//! let report = run(&config).unwrap();
//! println!("填充率 {:.1}%", report.final_fill * 100.0);
//! ```

pub mod config;
pub mod error;
pub mod runner;

pub use config::{EosParams, InletSeedMode, SimulationConfig};
pub use error::ConfigError;
pub use runner::{run, run_with_source, SimulationReport};
