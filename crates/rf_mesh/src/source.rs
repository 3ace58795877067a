// crates/rf_mesh/src/source.rs

//! 网格输入数据模型
//!
//! [`MeshSource`] 是装配器的输入：带外部编号的节点与三角形列表，
//! 外加若干按外部编号引用三角形的集合（补丁候选）。
//! 解析器（见 `rf_io`）或程序化构造均产出此结构。

use glam::DVec3;

/// 输入节点
#[derive(Debug, Clone, Copy)]
pub struct SourceNode {
    /// 外部编号（文件中的原始编号）
    pub ext_id: u64,
    /// 全局坐标
    pub position: DVec3,
}

/// 输入三角形
#[derive(Debug, Clone, Copy)]
pub struct SourceTriangle {
    /// 外部编号
    pub ext_id: u64,
    /// 三个节点的外部编号（任意顺序）
    pub nodes: [u64; 3],
}

/// 三角形集合（补丁候选）
///
/// 集合本身不带类型语义，补丁类型由运行时配置按声明顺序赋予。
#[derive(Debug, Clone, Default)]
pub struct TriangleSet {
    /// 集合名称（可为空）
    pub name: String,
    /// 成员三角形外部编号，保持输入顺序
    pub triangle_ids: Vec<u64>,
}

/// 装配器输入
#[derive(Debug, Clone, Default)]
pub struct MeshSource {
    /// 节点列表
    pub nodes: Vec<SourceNode>,
    /// 三角形列表
    pub triangles: Vec<SourceTriangle>,
    /// 三角形集合列表
    pub sets: Vec<TriangleSet>,
}

impl MeshSource {
    /// 创建空输入
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加节点
    pub fn push_node(&mut self, ext_id: u64, position: DVec3) {
        self.nodes.push(SourceNode { ext_id, position });
    }

    /// 添加三角形
    pub fn push_triangle(&mut self, ext_id: u64, nodes: [u64; 3]) {
        self.triangles.push(SourceTriangle { ext_id, nodes });
    }

    /// 添加集合
    pub fn push_set(&mut self, name: impl Into<String>, triangle_ids: Vec<u64>) {
        self.sets.push(TriangleSet {
            name: name.into(),
            triangle_ids,
        });
    }

    /// 节点数量
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// 三角形数量
    pub fn n_triangles(&self) -> usize {
        self.triangles.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_builder() {
        let mut src = MeshSource::new();
        src.push_node(101, DVec3::new(0.0, 0.0, 0.0));
        src.push_node(102, DVec3::new(1.0, 0.0, 0.0));
        src.push_node(103, DVec3::new(0.0, 1.0, 0.0));
        src.push_triangle(1, [103, 101, 102]);
        src.push_set("inlet", vec![1]);

        assert_eq!(src.n_nodes(), 3);
        assert_eq!(src.n_triangles(), 1);
        assert_eq!(src.sets.len(), 1);
        assert_eq!(src.sets[0].triangle_ids, vec![1]);
    }
}
