// crates/rf_mesh/src/error.rs

//! 网格处理错误类型
//!
//! 包含壳网格装配与几何构建阶段的退化检测错误。
//! 所有错误可转换为 `rf_foundation::RfError` 向上传播。

use rf_foundation::RfError;
use thiserror::Error;

/// 网格模块结果类型
pub type MeshResult<T> = Result<T, MeshError>;

/// 网格错误枚举
///
/// 装配阶段的每种退化情况对应一个变体，便于调用方定位问题单元。
#[derive(Error, Debug)]
pub enum MeshError {
    /// 三角形引用了不存在的节点
    #[error("三角形 {triangle} 引用了不存在的节点 {node}")]
    MissingNode {
        /// 三角形外部编号
        triangle: u64,
        /// 缺失的节点外部编号
        node: u64,
    },

    /// 节点外部编号重复
    #[error("节点外部编号重复: {id}")]
    DuplicateNodeId {
        /// 重复的节点编号
        id: u64,
    },

    /// 规范化节点三元组重复（同一三角形出现两次）
    #[error("重复三角形: 外部编号 {triangle}")]
    DuplicateTriangle {
        /// 三角形外部编号
        triangle: u64,
    },

    /// 一条边被三个及以上单元共享（非流形）
    #[error("非流形边: 节点 ({n1}, {n2}) 被 {count} 个单元共享")]
    NonManifoldEdge {
        /// 边的较小节点索引
        n1: u32,
        /// 边的较大节点索引
        n2: u32,
        /// 共享该边的单元数
        count: usize,
    },

    /// 单元邻居数超过上限
    #[error("单元 {cell} 邻居数 {count} 超过上限 {limit}")]
    TooManyNeighbors {
        /// 单元索引
        cell: usize,
        /// 实际邻居数
        count: usize,
        /// 允许上限
        limit: usize,
    },

    /// 共线节点导致三角形面积为零
    #[error("单元 {cell} 面积为零（节点共线）")]
    ZeroAreaTriangle {
        /// 单元索引
        cell: usize,
    },

    /// 补丁引用了不存在的三角形
    #[error("补丁 {patch} 引用了不存在的三角形 {triangle}")]
    UnknownPatchTriangle {
        /// 补丁序号
        patch: usize,
        /// 三角形外部编号
        triangle: u64,
    },

    /// 网格为空
    #[error("网格为空: {context}")]
    EmptyMesh {
        /// 出错场景描述
        context: &'static str,
    },
}

impl From<MeshError> for RfError {
    fn from(err: MeshError) -> Self {
        RfError::invalid_input(format!("网格退化: {err}"))
    }
}
