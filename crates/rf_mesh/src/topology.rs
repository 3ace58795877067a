// crates/rf_mesh/src/topology.rs

//! 网格拓扑数据结构
//!
//! 提供 CSR (Compressed Sparse Row) 格式的邻接存储。
//!
//! # 设计说明
//!
//! 邻居关系用平坦数组加逐单元偏移存储，取代定长哨兵矩阵：
//! - `offsets[i]` 和 `offsets[i+1]` 之间的元素是第 i 个单元的邻居
//! - 内存紧凑，缓存友好，O(1) 邻居迭代
//! - 适合只读迭代，不适合动态修改
//!
//! # 示例
//!
//! ```
//! use rf_mesh::topology::CsrConnectivity;
//!
//! // 3 个单元，邻居数不等
//! // Cell 0: [1]
//! // Cell 1: [0, 2]
//! // Cell 2: [1]
//! let offsets = vec![0, 1, 3, 4];
//! let indices = vec![1u32, 0, 2, 1];
//! let csr = CsrConnectivity::new(offsets, indices);
//!
//! assert_eq!(csr.row(1), &[0, 2]);
//! assert_eq!(csr.n_rows(), 3);
//! ```

use serde::{Deserialize, Serialize};

/// CSR (Compressed Sparse Row) 格式连接性
///
/// 通用的 CSR 存储结构，本项目用于：
/// - 单元-邻居连接（与逐记录几何数组对齐）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsrConnectivity<I: Copy> {
    /// 行偏移数组，长度 = n_rows + 1
    /// offsets[i]..offsets[i+1] 是第 i 行的索引范围
    pub offsets: Vec<u32>,
    /// 列索引数组，长度 = nnz
    pub indices: Vec<I>,
}

impl<I: Copy> Default for CsrConnectivity<I> {
    fn default() -> Self {
        Self {
            offsets: vec![0],
            indices: Vec::new(),
        }
    }
}

impl<I: Copy> CsrConnectivity<I> {
    /// 创建新的 CSR 连接性
    pub fn new(offsets: Vec<u32>, indices: Vec<I>) -> Self {
        debug_assert!(!offsets.is_empty(), "offsets must have at least one element");
        debug_assert_eq!(
            offsets.last().copied().unwrap_or(0) as usize,
            indices.len(),
            "last offset must equal indices length"
        );
        Self { offsets, indices }
    }

    /// 从行列表构建 CSR
    pub fn from_rows(rows: &[Vec<I>]) -> Self {
        let mut offsets = Vec::with_capacity(rows.len() + 1);
        let mut indices = Vec::new();

        offsets.push(0);
        for row in rows {
            indices.extend_from_slice(row);
            offsets.push(indices.len() as u32);
        }

        Self { offsets, indices }
    }

    /// 获取第 row 行的切片
    #[inline]
    pub fn row(&self, row: usize) -> &[I] {
        let start = self.offsets[row] as usize;
        let end = self.offsets[row + 1] as usize;
        &self.indices[start..end]
    }

    /// 第 row 行对应的平坦下标范围
    ///
    /// 用于访问与 `indices` 对齐的逐记录数组。
    #[inline]
    pub fn row_range(&self, row: usize) -> std::ops::Range<usize> {
        self.offsets[row] as usize..self.offsets[row + 1] as usize
    }

    /// 获取行数
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// 获取记录总数
    #[inline]
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// 第 row 行的元素个数
    #[inline]
    pub fn row_len(&self, row: usize) -> usize {
        (self.offsets[row + 1] - self.offsets[row]) as usize
    }

    /// 迭代所有行
    pub fn iter_rows(&self) -> impl Iterator<Item = &[I]> {
        (0..self.n_rows()).map(move |i| self.row(i))
    }
}
