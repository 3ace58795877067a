// crates/rf_io/src/error.rs

//! IO 错误类型定义
//!
//! 提供 IO 模块的统一错误枚举，支持通过 thiserror 自动转换底层错误。
//! 所有错误最终可转换为 RfError 以实现跨层错误传递。

use std::path::PathBuf;

use rf_foundation::RfError;
use thiserror::Error;

/// IO 模块结果类型别名
pub type IoResult<T> = Result<T, IoError>;

/// IO 错误枚举
#[derive(Error, Debug)]
pub enum IoError {
    /// 文件不存在（网格或重启快照缺失）
    #[error("文件不存在: {path}")]
    NotFound {
        /// 请求的路径
        path: PathBuf,
    },

    /// 快照格式错误
    #[error("快照格式错误: {path}, {reason}")]
    SnapshotFormat {
        /// 快照路径
        path: PathBuf,
        /// 原因描述
        reason: String,
    },

    /// 快照版本不兼容
    #[error("快照版本不兼容: 文件版本 {file}, 当前版本 {current}")]
    SnapshotVersion {
        /// 文件中的版本
        file: u32,
        /// 当前支持的版本
        current: u32,
    },

    /// 校验和错误
    #[error("快照校验和错误: 期望 {expected:08x}, 实际 {found:08x}")]
    ChecksumMismatch {
        /// 文件记录的 CRC
        expected: u32,
        /// 重新计算的 CRC
        found: u32,
    },

    /// 网格文件解析错误
    #[error("网格解析错误: {file}:{line} - {message}")]
    ParseError {
        /// 文件路径
        file: String,
        /// 行号（1 基）
        line: usize,
        /// 错误描述
        message: String,
    },

    /// 底层 IO 错误
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),
}

impl From<IoError> for RfError {
    fn from(err: IoError) -> Self {
        match err {
            IoError::NotFound { path } => RfError::file_not_found(path),
            IoError::Io(e) => RfError::io_with_source("IO 操作失败", e),
            other => RfError::io(format!("{other}")),
        }
    }
}
