// crates/rf_io/src/snapshot.rs

//! 结果快照
//!
//! 在预定时刻落盘的求解结果：标量 `t`、`n_out`、`N`，
//! 逐单元数组 ρ/u/v/p/γ/γ̂，以及节点坐标与单元节点编号。
//! 每次输出写两个文件：编号文件与规范的最新结果文件。
//!
//! # 文件格式 (v1)
//!
//! ```text
//! [魔数: 4 bytes] "RFSN"
//! [版本: u32]
//! [时间: f64]
//! [输出序号: u64]
//! [单元数: u64]
//! [节点数: u64]
//! [rho: N × f64]
//! [u: N × f64]
//! [v: N × f64]
//! [p: N × f64]        绝对压力
//! [gamma: N × f64]
//! [gamma_hat: N × f64]
//! [节点坐标: n_nodes × 3 × f64]
//! [单元节点: N × 3 × u32]
//! [CRC32: u32]
//! ```
//!
//! γ̂ 是仅供下游可视化的派生量：注入口编码为 −1，出口编码为 −2，
//! 其余取 γ。该编码只存在于写出端，求解器状态不含它。
//!
//! 写入通过临时文件加原子重命名完成，失败立即上抛。

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use rf_mesh::FrozenMesh;
use rf_physics::{CellClass, ResinState};
use serde::{Deserialize, Serialize};

use crate::error::{IoError, IoResult};

/// 快照文件格式版本
const SNAPSHOT_VERSION: u32 = 1;

/// 快照魔数
const SNAPSHOT_MAGIC: &[u8; 4] = b"RFSN";

/// 规范最新结果文件名
pub const RESULTS_FILE: &str = "results.rfs";

/// 注入口的 γ̂ 编码
const GAMMA_HAT_INLET: f64 = -1.0;

/// 出口的 γ̂ 编码
const GAMMA_HAT_OUTLET: f64 = -2.0;

// ============================================================
// 快照数据
// ============================================================

/// 结果快照
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// 模拟时间 [s]
    pub time: f64,
    /// 输出序号
    pub n_out: u64,
    /// 密度
    pub rho: Vec<f64>,
    /// 局部系 x 速度
    pub u: Vec<f64>,
    /// 局部系 y 速度
    pub v: Vec<f64>,
    /// 绝对压力 [Pa]
    pub p: Vec<f64>,
    /// 填充率
    pub gamma: Vec<f64>,
    /// 可视化编码填充率（注入口 −1，出口 −2）
    pub gamma_hat: Vec<f64>,
    /// 节点坐标 (x, y, z)
    pub node_positions: Vec<[f64; 3]>,
    /// 单元节点编号三元组
    pub cell_nodes: Vec<[u32; 3]>,
}

impl Snapshot {
    /// 从求解结果构造快照
    ///
    /// `p_offset` 把归一化工作压力还原为绝对压力：p_abs = Δp + p_offset。
    pub fn from_solution(
        time: f64,
        n_out: u64,
        state: &ResinState,
        classes: &[CellClass],
        mesh: &FrozenMesh,
        p_offset: f64,
    ) -> Self {
        let gamma_hat = classes
            .iter()
            .zip(&state.gamma)
            .map(|(class, &g)| match class {
                CellClass::PressureInlet => GAMMA_HAT_INLET,
                CellClass::PressureOutlet => GAMMA_HAT_OUTLET,
                _ => g,
            })
            .collect();

        Self {
            time,
            n_out,
            rho: state.rho.clone(),
            u: state.u.clone(),
            v: state.v.clone(),
            p: state.p.iter().map(|dp| dp + p_offset).collect(),
            gamma: state.gamma.clone(),
            gamma_hat,
            node_positions: mesh
                .node_positions
                .iter()
                .map(|p| [p.x, p.y, p.z])
                .collect(),
            cell_nodes: mesh.cell_nodes.clone(),
        }
    }

    /// 单元数
    pub fn n_cells(&self) -> usize {
        self.rho.len()
    }

    /// 编号文件名，如 `fill_0003.rfs`
    pub fn numbered_name(prefix: &str, n_out: u64) -> String {
        format!("{prefix}_{n_out:04}.rfs")
    }

    /// 写出编号文件与规范结果文件
    ///
    /// 返回两个写出的路径。
    pub fn write_pair(&self, dir: &Path, prefix: &str) -> IoResult<(PathBuf, PathBuf)> {
        let numbered = dir.join(Self::numbered_name(prefix, self.n_out));
        let canonical = dir.join(RESULTS_FILE);
        self.save(&numbered)?;
        self.save(&canonical)?;
        log::debug!("快照写出: {} (t = {:.4}s)", numbered.display(), self.time);
        Ok((numbered, canonical))
    }

    /// 保存到文件（二进制格式）
    pub fn save(&self, path: &Path) -> IoResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // 临时文件写入，成功后原子重命名
        let temp_path = path.with_extension("rfs.tmp");
        {
            let file = File::create(&temp_path)?;
            let mut writer = BufWriter::new(file);

            let mut data = Vec::new();
            data.extend_from_slice(SNAPSHOT_MAGIC);
            data.extend_from_slice(&SNAPSHOT_VERSION.to_le_bytes());
            data.extend_from_slice(&self.time.to_le_bytes());
            data.extend_from_slice(&self.n_out.to_le_bytes());
            data.extend_from_slice(&(self.n_cells() as u64).to_le_bytes());
            data.extend_from_slice(&(self.node_positions.len() as u64).to_le_bytes());

            for field in [&self.rho, &self.u, &self.v, &self.p, &self.gamma, &self.gamma_hat] {
                for &value in field {
                    data.extend_from_slice(&value.to_le_bytes());
                }
            }
            for pos in &self.node_positions {
                for &coord in pos {
                    data.extend_from_slice(&coord.to_le_bytes());
                }
            }
            for nodes in &self.cell_nodes {
                for &id in nodes {
                    data.extend_from_slice(&id.to_le_bytes());
                }
            }

            writer.write_all(&data)?;
            writer.write_all(&compute_crc32(&data).to_le_bytes())?;
            writer.flush()?;
        }

        std::fs::rename(&temp_path, path)?;
        Ok(())
    }

    /// 从文件加载
    pub fn load(path: &Path) -> IoResult<Self> {
        if !path.exists() {
            return Err(IoError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let mut all_data = Vec::new();
        reader.read_to_end(&mut all_data)?;

        if all_data.len() < 44 {
            return Err(IoError::SnapshotFormat {
                path: path.to_path_buf(),
                reason: "文件太小".into(),
            });
        }

        // 分离并验证 CRC
        let crc_offset = all_data.len() - 4;
        let data = &all_data[..crc_offset];
        let stored_crc = u32::from_le_bytes(all_data[crc_offset..].try_into().unwrap());
        let computed_crc = compute_crc32(data);
        if stored_crc != computed_crc {
            return Err(IoError::ChecksumMismatch {
                expected: stored_crc,
                found: computed_crc,
            });
        }

        let mut cursor = Cursor::new(path, data);
        let magic = cursor.take(4)?;
        if magic != SNAPSHOT_MAGIC {
            return Err(cursor.format_error("无效的快照魔数"));
        }
        let version = cursor.read_u32()?;
        if version > SNAPSHOT_VERSION {
            return Err(IoError::SnapshotVersion {
                file: version,
                current: SNAPSHOT_VERSION,
            });
        }

        let time = cursor.read_f64()?;
        let n_out = cursor.read_u64()?;
        let n_cells = cursor.read_u64()? as usize;
        let n_nodes = cursor.read_u64()? as usize;

        let rho = cursor.read_f64_vec(n_cells)?;
        let u = cursor.read_f64_vec(n_cells)?;
        let v = cursor.read_f64_vec(n_cells)?;
        let p = cursor.read_f64_vec(n_cells)?;
        let gamma = cursor.read_f64_vec(n_cells)?;
        let gamma_hat = cursor.read_f64_vec(n_cells)?;

        let mut node_positions = Vec::with_capacity(n_nodes);
        for _ in 0..n_nodes {
            node_positions.push([cursor.read_f64()?, cursor.read_f64()?, cursor.read_f64()?]);
        }
        let mut cell_nodes = Vec::with_capacity(n_cells);
        for _ in 0..n_cells {
            cell_nodes.push([cursor.read_u32()?, cursor.read_u32()?, cursor.read_u32()?]);
        }

        Ok(Self {
            time,
            n_out,
            rho,
            u,
            v,
            p,
            gamma,
            gamma_hat,
            node_positions,
            cell_nodes,
        })
    }
}

// ============================================================
// 二进制读取游标
// ============================================================

struct Cursor<'a> {
    path: &'a Path,
    data: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    fn new(path: &'a Path, data: &'a [u8]) -> Self {
        Self {
            path,
            data,
            offset: 0,
        }
    }

    fn format_error(&self, reason: &str) -> IoError {
        IoError::SnapshotFormat {
            path: self.path.to_path_buf(),
            reason: reason.into(),
        }
    }

    fn take(&mut self, len: usize) -> IoResult<&'a [u8]> {
        if self.offset + len > self.data.len() {
            return Err(self.format_error("数据意外截断"));
        }
        let slice = &self.data[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    fn read_u32(&mut self) -> IoResult<u32> {
        Ok(u32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    fn read_u64(&mut self) -> IoResult<u64> {
        Ok(u64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    fn read_f64(&mut self) -> IoResult<f64> {
        Ok(f64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    fn read_f64_vec(&mut self, len: usize) -> IoResult<Vec<f64>> {
        let mut out = Vec::with_capacity(len);
        for _ in 0..len {
            out.push(self.read_f64()?);
        }
        Ok(out)
    }
}

// ============================================================
// CRC32（IEEE 多项式，编译期查找表）
// ============================================================

const fn generate_crc32_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut j = 0;
        while j < 8 {
            if crc & 1 != 0 {
                crc = 0xEDB8_8320 ^ (crc >> 1);
            } else {
                crc >>= 1;
            }
            j += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

const CRC32_TABLE: [u32; 256] = generate_crc32_table();

fn compute_crc32(data: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFFu32;
    for &byte in data {
        let index = ((crc ^ byte as u32) & 0xFF) as usize;
        crc = CRC32_TABLE[index] ^ (crc >> 8);
    }
    !crc
}

// ============================================================
// 测试
// ============================================================
