//! # CASTEP .castep SCF 解析器
//!
//! 解析 CASTEP 输出文件中的 SCF 循环表（以 `<-- SCF` 结尾的行），
//! 提取每一步的总能量和费米能，并转换为带 SCF 迭代步的 `Simulation`。
//!
//! 几何优化会输出多个 SCF 表，只保留文件中最后一个（最终结构的单点）。
//! 绝缘体计算（固定占据数）不输出费米能列，此时 `fermi_energies` 为空。
//!
//! ## 依赖关系
//! - 被 `commands/scf.rs` 使用
//! - 使用 `models/`, `outputs/`

use crate::error::{Result, SimOutputsError};
use crate::models::{
    FermiLevel, ModelSystem, Quantity, SelfConsistency, SelfConsistencyRef, Simulation, Unit,
};
use crate::outputs::{Outputs, SCFOutputs};

use regex::Regex;
use std::fs;
use std::path::Path;

/// 一个 .castep 文件中的 SCF 历史
#[derive(Debug, Clone, PartialEq)]
pub struct CastepScf {
    /// 结构名称
    pub structure_name: String,

    /// 计算是否完成
    pub is_finished: bool,

    /// 输出能量单位（默认 eV）
    pub energy_unit: Unit,

    /// 每一步的总能量
    pub energies: Vec<f64>,

    /// 每一步的费米能（金属计算）
    pub fermi_energies: Vec<f64>,

    /// 文件中 SCF 表的数量（几何优化步数）
    pub n_scf_blocks: usize,
}

impl CastepScf {
    /// 转换为归档：费米能的每一步成为一个 SCF 迭代步，最后一步作为最终输出
    pub fn to_simulation(&self, parameters: SelfConsistency) -> Simulation {
        let mut outputs = Outputs::new();
        if let Some(&last) = self.fermi_energies.last() {
            outputs.fermi_levels.push(
                FermiLevel::new(Quantity::scalar(last, self.energy_unit.clone()))
                    .with_self_consistency(SelfConsistencyRef(0)),
            );
        }

        let mut scf = SCFOutputs::new(outputs);
        for &ef in &self.fermi_energies {
            let mut step = Outputs::new();
            step.fermi_levels
                .push(FermiLevel::new(Quantity::scalar(ef, self.energy_unit.clone())));
            scf.push_step(step);
        }

        Simulation {
            program_name: Some("CASTEP".to_string()),
            model_system: vec![ModelSystem::new(self.structure_name.clone())],
            self_consistency: vec![parameters],
            outputs: vec![scf],
        }
    }
}

/// 解析 CASTEP .castep 输出文件
pub fn parse_castep_scf(path: &Path, structure_name: &str) -> Result<CastepScf> {
    let content = fs::read_to_string(path).map_err(|e| SimOutputsError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_castep_scf_str(&content, structure_name).map_err(|reason| SimOutputsError::ParseError {
        format: "CASTEP".to_string(),
        path: path.display().to_string(),
        reason,
    })
}

/// 从文本内容解析
pub fn parse_castep_scf_str(
    content: &str,
    structure_name: &str,
) -> std::result::Result<CastepScf, String> {
    // "      3  -8.54569064E+002  4.01427440E+000   1.09576601E+000       0.77  <-- SCF"
    let row_re = Regex::new(r"^\s*(\d+)\s+(.*?)\s*<--\s*SCF\s*$").map_err(|e| e.to_string())?;
    // "output         energy unit                    : eV"
    let unit_re = Regex::new(r"(?i)^\s*output\s+energy unit\s*:\s*(\S+)").map_err(|e| e.to_string())?;

    let mut result = CastepScf {
        structure_name: structure_name.to_string(),
        is_finished: false,
        energy_unit: Unit::ElectronVolt,
        energies: Vec::new(),
        fermi_energies: Vec::new(),
        n_scf_blocks: 0,
    };

    for line in content.lines() {
        if line.contains("Total time") {
            result.is_finished = true;
        }

        if let Some(caps) = unit_re.captures(line) {
            result.energy_unit = Unit::from(&caps[1]);
            continue;
        }

        if !line.contains("<-- SCF") {
            continue;
        }

        // 新的 SCF 表头："SCF loop      Energy   ..."
        if line.trim_start().starts_with("SCF loop") {
            result.n_scf_blocks += 1;
            result.energies.clear();
            result.fermi_energies.clear();
            continue;
        }

        let caps = match row_re.captures(line) {
            Some(c) => c,
            None => continue,
        };
        let numbers: Vec<f64> = match caps[2]
            .split_whitespace()
            .map(|t| t.parse::<f64>())
            .collect::<std::result::Result<Vec<_>, _>>()
        {
            Ok(n) => n,
            Err(_) => continue,
        };

        // 金属：Energy, Fermi energy, Energy gain, Timer
        // 绝缘体：Energy, Energy gain, Timer
        match numbers.as_slice() {
            [energy, fermi, _gain, _timer] => {
                result.energies.push(*energy);
                result.fermi_energies.push(*fermi);
            }
            [energy, _gain, _timer] => {
                result.energies.push(*energy);
            }
            _ => {}
        }
    }

    if result.n_scf_blocks == 0 {
        return Err("no SCF table found".to_string());
    }

    Ok(result)
}
