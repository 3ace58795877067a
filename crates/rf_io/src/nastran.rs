// crates/rf_io/src/nastran.rs

//! 遗留定列宽壳网格格式读取
//!
//! 消费以 `GRID`、`CTRIA3`、`SET` 关键字组织的三角壳文件：
//!
//! - `GRID`: 8 字符定列宽节点记录（编号、坐标），也接受逗号分隔自由域
//! - `CTRIA3`: 三角形记录（编号、属性、三个节点编号）
//! - `SET n = id, id, ..., THRU, id`: 三角形集合，行尾逗号表示续行
//!
//! 坐标域支持 Nastran 缩写指数写法（如 `1.25-3` 表示 `1.25e-3`）。
//! `$` 开头的行是注释。输出为 [`MeshSource`]，集合按出现顺序排列。

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use glam::DVec3;
use rf_mesh::MeshSource;

use crate::error::{IoError, IoResult};

/// 定列宽字段宽度
const FIELD_WIDTH: usize = 8;

/// 遗留格式加载器
pub struct ShellDeckLoader;

impl ShellDeckLoader {
    /// 从文件加载
    pub fn load<P: AsRef<Path>>(path: P) -> IoResult<MeshSource> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(IoError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let file = File::open(path)?;
        Self::load_from_reader(BufReader::new(file), &path.display().to_string())
    }

    /// 从 reader 加载
    pub fn load_from_reader<R: BufRead>(reader: R, file: &str) -> IoResult<MeshSource> {
        let mut source = MeshSource::new();
        // 进行中的 SET: (名称, 已收集编号, 上一个编号后是否出现 THRU)
        let mut pending_set: Option<(String, Vec<u64>, bool)> = None;

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line_no = idx + 1;
            let trimmed = line.trim_end();

            if trimmed.is_empty() || trimmed.starts_with('$') {
                continue;
            }

            if let Some(state) = pending_set.take() {
                // 续行以空白开头
                if trimmed.starts_with(char::is_whitespace) {
                    let state = Self::parse_set_items(trimmed, state, file, line_no)?;
                    if trimmed.ends_with(',') {
                        pending_set = Some(state);
                    } else {
                        Self::finish_set(&mut source, state);
                    }
                    continue;
                }
                Self::finish_set(&mut source, state);
            }

            if trimmed.trim_start().starts_with("SET") && trimmed.contains('=') {
                let state = Self::parse_set_header(trimmed, file, line_no)?;
                if trimmed.ends_with(',') {
                    pending_set = Some(state);
                } else {
                    Self::finish_set(&mut source, state);
                }
                continue;
            }

            let keyword = Self::field(trimmed, 0);
            match keyword.trim_end_matches('*') {
                "GRID" => Self::parse_grid(&mut source, trimmed, file, line_no)?,
                "CTRIA3" => Self::parse_ctria3(&mut source, trimmed, file, line_no)?,
                _ => {
                    // 未知关键字静默跳过（遗留格式中常见无关记录）
                }
            }
        }

        if let Some(state) = pending_set.take() {
            Self::finish_set(&mut source, state);
        }

        Ok(source)
    }

    /// 取第 i 个 8 字符定列宽字段；逗号分隔时按自由域切分
    fn field(line: &str, index: usize) -> String {
        if line.contains(',') {
            return line
                .split(',')
                .nth(index)
                .unwrap_or("")
                .trim()
                .to_string();
        }
        let start = index * FIELD_WIDTH;
        if start >= line.len() {
            return String::new();
        }
        let end = (start + FIELD_WIDTH).min(line.len());
        line[start..end].trim().to_string()
    }

    fn parse_grid(
        source: &mut MeshSource,
        line: &str,
        file: &str,
        line_no: usize,
    ) -> IoResult<()> {
        let id = Self::parse_int(&Self::field(line, 1), file, line_no, "GRID 节点编号")?;
        // 字段 2 为坐标系编号，忽略
        let x = Self::parse_real(&Self::field(line, 3), file, line_no, "GRID X")?;
        let y = Self::parse_real(&Self::field(line, 4), file, line_no, "GRID Y")?;
        let z = Self::parse_real(&Self::field(line, 5), file, line_no, "GRID Z")?;
        source.push_node(id, DVec3::new(x, y, z));
        Ok(())
    }

    fn parse_ctria3(
        source: &mut MeshSource,
        line: &str,
        file: &str,
        line_no: usize,
    ) -> IoResult<()> {
        let id = Self::parse_int(&Self::field(line, 1), file, line_no, "CTRIA3 编号")?;
        // 字段 2 为属性编号，忽略
        let g1 = Self::parse_int(&Self::field(line, 3), file, line_no, "CTRIA3 G1")?;
        let g2 = Self::parse_int(&Self::field(line, 4), file, line_no, "CTRIA3 G2")?;
        let g3 = Self::parse_int(&Self::field(line, 5), file, line_no, "CTRIA3 G3")?;
        source.push_triangle(id, [g1, g2, g3]);
        Ok(())
    }

    fn parse_set_header(
        line: &str,
        file: &str,
        line_no: usize,
    ) -> IoResult<(String, Vec<u64>, bool)> {
        let (head, items) = line.split_once('=').ok_or_else(|| IoError::ParseError {
            file: file.into(),
            line: line_no,
            message: "SET 记录缺少 '='".into(),
        })?;
        let set_id = head.trim().trim_start_matches("SET").trim();
        let name = format!("SET {set_id}");
        Self::parse_set_items(items, (name, Vec::new(), false), file, line_no)
    }

    /// 解析集合成员列表，支持 `a THRU b` 区间展开
    fn parse_set_items(
        items: &str,
        state: (String, Vec<u64>, bool),
        file: &str,
        line_no: usize,
    ) -> IoResult<(String, Vec<u64>, bool)> {
        let (name, mut ids, mut thru) = state;
        for token in items.split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            if token.eq_ignore_ascii_case("THRU") {
                thru = true;
                continue;
            }
            let value = Self::parse_int(token, file, line_no, "SET 成员")?;
            if thru {
                let last = *ids.last().ok_or_else(|| IoError::ParseError {
                    file: file.into(),
                    line: line_no,
                    message: "THRU 缺少起点".into(),
                })?;
                for id in (last + 1)..=value {
                    ids.push(id);
                }
                thru = false;
            } else {
                ids.push(value);
            }
        }
        Ok((name, ids, thru))
    }

    fn finish_set(source: &mut MeshSource, state: (String, Vec<u64>, bool)) {
        let (name, ids, _) = state;
        source.push_set(name, ids);
    }

    fn parse_int(text: &str, file: &str, line_no: usize, what: &str) -> IoResult<u64> {
        text.parse::<u64>().map_err(|_| IoError::ParseError {
            file: file.into(),
            line: line_no,
            message: format!("{what} 不是有效整数: '{text}'"),
        })
    }

    /// 解析实数域，接受 Nastran 缩写指数（`1.25-3` → `1.25e-3`）
    fn parse_real(text: &str, file: &str, line_no: usize, what: &str) -> IoResult<f64> {
        if let Ok(value) = text.parse::<f64>() {
            return Ok(value);
        }
        // 在尾部找符号位并补 e
        if text.len() > 1 {
            let body = &text[1..];
            if let Some(pos) = body.rfind(['+', '-']) {
                let (mantissa, exponent) = text.split_at(pos + 1);
                let rebuilt = format!("{mantissa}e{exponent}");
                if let Ok(value) = rebuilt.parse::<f64>() {
                    return Ok(value);
                }
            }
        }
        Err(IoError::ParseError {
            file: file.into(),
            line: line_no,
            message: format!("{what} 不是有效实数: '{text}'"),
        })
    }
}
