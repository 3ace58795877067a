// crates/rf_physics/src/types.rs

//! 物理计算核心类型定义
//!
//! 本模块提供求解器所需的类型系统，包括：
//! - **单元分类**：[`CellClass`] 带标签变体，取代魔法整数编码
//! - **预制体物性**：[`PreformProperties`] 厚度/孔隙率/渗透率组
//! - **数值参数**：[`NumericalParams`] 全 f64 配置结构

use glam::DVec3;
use serde::{Deserialize, Serialize};

// ============================================================
// 单元分类
// ============================================================

/// 单元分类
///
/// 装载时确定，运行期不变。压力边界单元的状态在每步末被钉回固定值。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum CellClass {
    /// 内部单元
    #[default]
    Interior = 0,
    /// 壁面单元（含至少一条边界边）
    Wall = 1,
    /// 压力注入口
    PressureInlet = 2,
    /// 压力出口
    PressureOutlet = 3,
}

impl CellClass {
    /// 是否参与守恒律更新
    ///
    /// 压力边界单元被钉死，不更新。
    #[inline]
    pub fn is_updated(&self) -> bool {
        matches!(self, Self::Interior | Self::Wall)
    }

    /// 是否为压力边界
    #[inline]
    pub fn is_pressure_boundary(&self) -> bool {
        matches!(self, Self::PressureInlet | Self::PressureOutlet)
    }
}

impl std::fmt::Display for CellClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Interior => "interior",
            Self::Wall => "wall",
            Self::PressureInlet => "pressure_inlet",
            Self::PressureOutlet => "pressure_outlet",
        };
        write!(f, "{}", name)
    }
}

// ============================================================
// 预制体物性
// ============================================================

/// 预制体物性组
///
/// 单个补丁或默认区域的全部达西介质参数。
/// 第二主渗透率以比值 α 给出：K₂ = α·K₁。
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PreformProperties {
    /// 厚度 [m]
    pub thickness: f64,
    /// 孔隙率 (0, 1]
    pub porosity: f64,
    /// 第一主渗透率 K₁ [m²]
    pub k1: f64,
    /// 渗透率比 α（K₂ = α·K₁）
    pub alpha: f64,
    /// 第一主方向（全局系，无需与曲面相切）
    pub direction: DVec3,
    /// 树脂动力粘度 [Pa·s]
    pub viscosity: f64,
}

impl PreformProperties {
    /// 第二主渗透率
    #[inline]
    pub fn k2(&self) -> f64 {
        self.alpha * self.k1
    }

    /// 校验物性范围
    ///
    /// 返回首个越界字段名。
    pub fn validate(&self) -> Result<(), &'static str> {
        if !(self.thickness > 0.0) {
            return Err("thickness");
        }
        if !(self.porosity > 0.0 && self.porosity <= 1.0) {
            return Err("porosity");
        }
        if !(self.k1 > 0.0) {
            return Err("k1");
        }
        if !(self.alpha > 0.0) {
            return Err("alpha");
        }
        if !(self.viscosity > 0.0) {
            return Err("viscosity");
        }
        if self.direction.length_squared() < 1e-24 {
            return Err("direction");
        }
        Ok(())
    }
}

impl Default for PreformProperties {
    /// 典型玻璃纤维预制体
    fn default() -> Self {
        Self {
            thickness: 3e-3,
            porosity: 0.7,
            k1: 3e-10,
            alpha: 1.0,
            direction: DVec3::X,
            viscosity: 0.06,
        }
    }
}

// ============================================================
// 数值参数
// ============================================================

/// 数值参数配置
///
/// 控制时间步、梯度与并行策略的各种阈值。全部 f64，无泛型。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericalParams {
    /// 压力归一化偏移 ε [Pa]
    ///
    /// 工作变量为 Δp = p − p_init + ε，保证初始工作压力为正。
    pub pressure_eps: f64,
    /// 初始时间步系数 β₁
    pub beta1: f64,
    /// 自适应时间步系数 β₂（弱可压缩）
    pub beta2: f64,
    /// 自适应时间步系数 β₂（准不可压缩）
    pub beta2_quasi: f64,
    /// 时间步松弛权重 w
    pub dt_relax: f64,
    /// 准不可压缩状态方程切换阈值（γ_EoS ≥ 此值）
    pub quasi_gamma_threshold: f64,
    /// 最小二乘法方程行列式阈值
    pub det_min: f64,
    /// 速度平方零阈值（自适应 dt 中忽略近静止单元）
    pub speed_sq_eps: f64,
    /// 并行化阈值（单元数）
    pub parallel_threshold: usize,
}

impl Default for NumericalParams {
    fn default() -> Self {
        Self {
            pressure_eps: 100.0,
            beta1: 1.0,
            beta2: 0.1,
            beta2_quasi: 0.01,
            dt_relax: 0.5,
            quasi_gamma_threshold: 100.0,
            det_min: 1e-12,
            speed_sq_eps: 1e-24,
            parallel_threshold: 2000,
        }
    }
}
