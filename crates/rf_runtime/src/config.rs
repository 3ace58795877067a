// crates/rf_runtime/src/config.rs

//! 模拟配置
//!
//! 带校验的配置记录，取代散乱的长参数表：补丁类型用枚举变体表达，
//! 覆盖物性作为变体负载随补丁携带。全部字段 f64/整型，可序列化。

use std::path::PathBuf;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use rf_physics::{NumericalParams, PatchKind, PreformProperties};

use crate::error::ConfigError;

/// n_pics 下限
const N_PICS_MIN: usize = 4;

/// n_pics 上限
const N_PICS_MAX: usize = 100;

/// 状态方程参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EosParams {
    /// 参考压力 [Pa]
    pub p_ref: f64,
    /// 参考密度 [kg/m³]
    pub rho_ref: f64,
    /// 压缩性控制量 γ_EoS（≥ 100 切换准不可压缩）
    pub gamma: f64,
}

impl Default for EosParams {
    fn default() -> Self {
        Self {
            p_ref: 1e5,
            rho_ref: 1.2,
            gamma: 1.4,
        }
    }
}

/// 注入口种子模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum InletSeedMode {
    /// 不使用种子点
    #[default]
    None,
    /// 种子点替换补丁定义的注入口
    ReplaceInlets,
    /// 种子点与补丁注入口并存
    AddInlets,
}

/// 模拟配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// 网格文件路径
    pub mesh_path: PathBuf,
    /// 模拟终止时间 [s]
    pub t_max: f64,
    /// 状态方程参数
    pub eos: EosParams,
    /// 注入压力 p_a [Pa]
    pub p_inject: f64,
    /// 初始压力 p_init [Pa]
    pub p_initial: f64,
    /// 默认预制体物性
    pub default_preform: PreformProperties,
    /// 补丁类型标签，按网格集合声明顺序对应
    pub patches: Vec<PatchKind>,
    /// 注入口种子模式
    pub seed_mode: InletSeedMode,
    /// 注入口种子点
    pub inlet_seeds: Vec<DVec3>,
    /// 种子搜索半径 [m]
    pub seed_radius: f64,
    /// 快照数量（被强制到 [4, 100] 并向上取整为 4 的倍数）
    pub n_pics: usize,
    /// 重启快照路径
    pub restart_from: Option<PathBuf>,
    /// 输出目录
    pub output_dir: PathBuf,
    /// 输出文件前缀
    pub output_prefix: String,
    /// 数值参数
    pub numerics: NumericalParams,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            mesh_path: PathBuf::new(),
            t_max: 200.0,
            eos: EosParams::default(),
            p_inject: 1.35e5,
            p_initial: 1e5,
            default_preform: PreformProperties::default(),
            patches: Vec::new(),
            seed_mode: InletSeedMode::None,
            inlet_seeds: Vec::new(),
            seed_radius: 0.02,
            n_pics: 16,
            restart_from: None,
            output_dir: PathBuf::from("out"),
            output_prefix: "fill".into(),
            numerics: NumericalParams::default(),
        }
    }
}

impl SimulationConfig {
    /// 校验配置
    ///
    /// 返回首个越界字段对应的 [`ConfigError`]。
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.t_max > 0.0) {
            return Err(ConfigError::invalid("t_max", "必须为正"));
        }
        if !(self.eos.p_ref > 0.0) {
            return Err(ConfigError::invalid("eos.p_ref", "必须为正"));
        }
        if !(self.eos.rho_ref > 0.0) {
            return Err(ConfigError::invalid("eos.rho_ref", "必须为正"));
        }
        if !(self.eos.gamma > 1.0) {
            return Err(ConfigError::invalid("eos.gamma", "必须大于 1"));
        }
        if !(self.p_initial >= 0.0) {
            return Err(ConfigError::invalid("p_initial", "必须非负"));
        }
        if !(self.p_inject > self.p_initial) {
            return Err(ConfigError::invalid("p_inject", "必须大于初始压力"));
        }

        if let Err(field) = self.default_preform.validate() {
            return Err(ConfigError::invalid(
                "default_preform",
                format!("字段 {field} 越界"),
            ));
        }
        for (i, patch) in self.patches.iter().enumerate() {
            if let PatchKind::PreformOverride(props) = patch {
                if let Err(field) = props.validate() {
                    return Err(ConfigError::invalid(
                        "patches",
                        format!("补丁 {i} 字段 {field} 越界"),
                    ));
                }
            }
        }

        if self.seed_mode != InletSeedMode::None {
            if self.inlet_seeds.is_empty() {
                return Err(ConfigError::invalid("inlet_seeds", "种子模式下不能为空"));
            }
            if !(self.seed_radius > 0.0) {
                return Err(ConfigError::invalid("seed_radius", "必须为正"));
            }
        }

        let has_patch_inlet = self
            .patches
            .iter()
            .any(|p| matches!(p, PatchKind::Inlet));
        let seeds_active = self.seed_mode != InletSeedMode::None;
        if !has_patch_inlet && !seeds_active {
            return Err(ConfigError::invalid("patches", "未定义注入口"));
        }
        // 替换模式丢弃补丁注入口，种子必须能补上
        if self.seed_mode == InletSeedMode::ReplaceInlets && self.inlet_seeds.is_empty() {
            return Err(ConfigError::invalid("inlet_seeds", "替换模式需要种子点"));
        }

        Ok(())
    }

    /// 强制后的快照数量
    ///
    /// 先夹入 [4, 100]，再向上取整为 4 的倍数。
    pub fn coerced_n_pics(&self) -> usize {
        let clamped = self.n_pics.clamp(N_PICS_MIN, N_PICS_MAX);
        clamped.div_ceil(4) * 4
    }

    /// 注入侧归一化压力 Δp_a = p_a − p_init + ε
    pub fn dp_inlet(&self) -> f64 {
        self.p_inject - self.p_initial + self.numerics.pressure_eps
    }

    /// 归一化压力还原为绝对压力的偏移
    pub fn p_offset(&self) -> f64 {
        self.p_initial - self.numerics.pressure_eps
    }
}
