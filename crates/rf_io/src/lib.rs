// crates/rf_io/src/lib.rs

//! ResinFlow IO 模块
//!
//! 结果快照的写出/恢复与遗留网格格式读取。
//!
//! # 模块结构
//!
//! - [`snapshot`]: 二进制结果快照（编号文件 + 规范结果文件）
//! - [`nastran`]: GRID/CTRIA3/SET 定列宽壳网格读取
//! - [`error`]: IO 错误类型

pub mod error;
pub mod nastran;
pub mod snapshot;

pub use error::{IoError, IoResult};
pub use nastran::ShellDeckLoader;
pub use snapshot::{Snapshot, RESULTS_FILE};
