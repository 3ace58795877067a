// crates/rf_physics/src/gradient.rs

//! 最小二乘压力梯度
//!
//! 对单元 P 的 M 个邻居，以展平后的中心连线向量为行构造 M×2 矩阵 A，
//! 右端为压力差 p_k − p_P，求解 2×2 法方程：
//!
//! ```text
//! [a11 a12] [∂p/∂x]   [b1]
//! [a12 a22] [∂p/∂y] = [b2]
//! ```
//!
//! 闭式 2×2 求逆；M < 2 或法方程奇异时返回零梯度。

use glam::DVec2;
use rayon::prelude::*;
use rf_mesh::FrozenMesh;

use crate::types::NumericalParams;

/// 最小二乘梯度计算器
#[derive(Debug, Clone)]
pub struct LeastSquaresGradient {
    /// 行列式奇异判定阈值
    det_min: f64,
    /// 并行化阈值（单元数）
    parallel_threshold: usize,
}

impl LeastSquaresGradient {
    /// 从数值参数创建
    pub fn from_params(params: &NumericalParams) -> Self {
        Self {
            det_min: params.det_min,
            parallel_threshold: params.parallel_threshold,
        }
    }

    /// 求解 2x2 对称正定系统，奇异时返回 None
    #[inline]
    fn solve_2x2(a11: f64, a12: f64, a22: f64, b1: f64, b2: f64, det_min: f64) -> Option<DVec2> {
        let det = a11 * a22 - a12 * a12;
        if det.abs() < det_min {
            return None;
        }
        let inv = 1.0 / det;
        let gx = (a22 * b1 - a12 * b2) * inv;
        let gy = (a11 * b2 - a12 * b1) * inv;
        if gx.is_finite() && gy.is_finite() {
            Some(DVec2::new(gx, gy))
        } else {
            None
        }
    }

    /// 计算单个单元的梯度
    fn cell_gradient(&self, mesh: &FrozenMesh, pressure: &[f64], cell: usize) -> DVec2 {
        let range = mesh.neighbor_range(cell);
        if range.len() < 2 {
            return DVec2::ZERO;
        }

        let p_c = pressure[cell];
        let mut a11 = 0.0;
        let mut a12 = 0.0;
        let mut a22 = 0.0;
        let mut b1 = 0.0;
        let mut b2 = 0.0;

        for slot in range {
            let nbr = mesh.neighbors.indices[slot] as usize;
            let d = mesh.nbr_delta[slot];
            let dp = pressure[nbr] - p_c;

            a11 += d.x * d.x;
            a12 += d.x * d.y;
            a22 += d.y * d.y;
            b1 += d.x * dp;
            b2 += d.y * dp;
        }

        Self::solve_2x2(a11, a12, a22, b1, b2, self.det_min).unwrap_or(DVec2::ZERO)
    }

    /// 计算全场梯度
    ///
    /// 输出写入 `output`（长度须等于单元数），单元数超过阈值时并行。
    pub fn compute(&self, mesh: &FrozenMesh, pressure: &[f64], output: &mut Vec<DVec2>) {
        let n = mesh.n_cells();
        output.resize(n, DVec2::ZERO);

        if n >= self.parallel_threshold {
            output
                .par_iter_mut()
                .enumerate()
                .for_each(|(cell, g)| *g = self.cell_gradient(mesh, pressure, cell));
        } else {
            for (cell, g) in output.iter_mut().enumerate() {
                *g = self.cell_gradient(mesh, pressure, cell);
            }
        }
    }
}
