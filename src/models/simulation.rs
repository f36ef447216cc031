//! # 模拟归档
//!
//! `Simulation` 持有模型体系表、SCF 收敛参数表和全部 `SCFOutputs`。
//! 输出中的引用（`ModelSystemRef`, `SelfConsistencyRef`）都是指向这两张表
//! 的下标，由本模块解析。归档以 JSON 格式读写。
//!
//! ## 依赖关系
//! - 使用 `models/model_system.rs`, `models/numerical_settings.rs`
//! - 使用 `outputs/`
//! - 被 `commands/`, `parsers/castep_out.rs` 使用

use super::model_system::{ModelSystem, ModelSystemRef};
use super::numerical_settings::{SelfConsistency, SelfConsistencyRef};
use crate::error::{Result, SimOutputsError};
use crate::outputs::{PropertyCollection, SCFOutputs};
use crate::utils::diagnostics::Logger;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 归一化时输出所能看到的父节点信息
#[derive(Debug, Clone, Copy)]
pub struct SimulationContext<'a> {
    pub model_systems: &'a [ModelSystem],
    pub self_consistency: &'a [SelfConsistency],
}

impl<'a> SimulationContext<'a> {
    pub fn model_system(&self, reference: ModelSystemRef) -> Option<&'a ModelSystem> {
        self.model_systems.get(reference.0)
    }

    pub fn self_consistency(&self, reference: SelfConsistencyRef) -> Option<&'a SelfConsistency> {
        self.self_consistency.get(reference.0)
    }
}

/// 一次模拟的归档
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Simulation {
    /// 程序名称（如 "CASTEP"）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program_name: Option<String>,

    #[serde(default)]
    pub model_system: Vec<ModelSystem>,

    /// SCF 收敛参数
    #[serde(default)]
    pub self_consistency: Vec<SelfConsistency>,

    #[serde(default)]
    pub outputs: Vec<SCFOutputs>,
}

/// 汇总表中的一行
#[derive(Debug, Clone, PartialEq)]
pub struct ConvergenceRow {
    pub output_index: usize,
    pub model_system: Option<String>,
    pub collection: PropertyCollection,
    pub index: usize,
    pub kind: &'static str,
    pub value: Option<String>,
    pub spin_channel: Option<String>,
    pub n_steps: usize,
    pub is_scf_converged: Option<bool>,
}

impl Simulation {
    pub fn context(&self) -> SimulationContext<'_> {
        SimulationContext {
            model_systems: &self.model_system,
            self_consistency: &self.self_consistency,
        }
    }

    /// 对全部输出执行归一化
    pub fn normalize(&mut self, logger: &mut dyn Logger) {
        let ctx = SimulationContext {
            model_systems: &self.model_system,
            self_consistency: &self.self_consistency,
        };
        for output in &mut self.outputs {
            output.normalize(Some(&ctx), logger);
        }
    }

    /// 每个属性一行的收敛汇总
    pub fn summary(&self) -> Vec<ConvergenceRow> {
        let ctx = self.context();
        let mut rows = Vec::new();

        for (output_index, output) in self.outputs.iter().enumerate() {
            let model_system = output
                .outputs
                .model_system_ref
                .and_then(|r| ctx.model_system(r))
                .map(|m| m.label());

            for collection in PropertyCollection::ALL {
                for (index, property) in collection.get(&output.outputs).into_iter().enumerate() {
                    rows.push(ConvergenceRow {
                        output_index,
                        model_system: model_system.clone(),
                        collection,
                        index,
                        kind: property.kind(),
                        value: property.value().map(|q| q.to_string()),
                        spin_channel: property.spin_channel().map(|s| s.to_string()),
                        n_steps: output.scf_steps.len(),
                        is_scf_converged: property.is_scf_converged(),
                    });
                }
            }
        }
        rows
    }

    /// 从 JSON 文件读取
    pub fn load(path: &Path) -> Result<Simulation> {
        if !path.exists() {
            return Err(SimOutputsError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let content = fs::read_to_string(path).map_err(|e| SimOutputsError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_json(&content).map_err(|e| SimOutputsError::ParseError {
            format: "JSON archive".to_string(),
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    pub fn from_json(content: &str) -> Result<Simulation> {
        let simulation: Simulation = serde_json::from_str(content)?;
        simulation.check_references()?;
        Ok(simulation)
    }

    /// 写入 JSON 文件
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| SimOutputsError::FileWriteError {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// 已显式设置的模型体系引用必须落在表内
    fn check_references(&self) -> Result<()> {
        for (i, output) in self.outputs.iter().enumerate() {
            if let Some(r) = output.outputs.model_system_ref {
                if r.0 >= self.model_system.len() {
                    return Err(SimOutputsError::InvalidArchive(format!(
                        "outputs[{}].model_system_ref points to {} but only {} model system(s) exist",
                        i,
                        r,
                        self.model_system.len()
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::diagnostics::{DiagnosticLog, Level};

    const ARCHIVE: &str = r#"{
        "program_name": "test",
        "model_system": [{"name": "Si bulk", "chemical_formula": "Si2", "is_representative": true}],
        "self_consistency": [{"threshold_change": 0.02, "threshold_change_unit": "eV"}],
        "outputs": [{
            "electronic_band_gaps": [
                {"value": {"magnitude": 0.94, "unit": "eV"}, "self_consistency_ref": 0}
            ],
            "scf_steps": [
                {"electronic_band_gaps": [{"value": {"magnitude": 1.0, "unit": "eV"}}]},
                {"electronic_band_gaps": [{"value": {"magnitude": 0.95, "unit": "eV"}}]},
                {"electronic_band_gaps": [{"value": {"magnitude": 0.94, "unit": "eV"}}]}
            ]
        }]
    }"#;

    #[test]
    fn test_archive_end_to_end() {
        let mut simulation = Simulation::from_json(ARCHIVE).unwrap();
        let mut log = DiagnosticLog::new();
        simulation.normalize(&mut log);

        assert!(log.is_empty());
        let rows = simulation.summary();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].collection, PropertyCollection::ElectronicBandGaps);
        assert_eq!(rows[0].model_system.as_deref(), Some("Si bulk (Si2)"));
        assert_eq!(rows[0].n_steps, 3);
        assert_eq!(rows[0].is_scf_converged, Some(true));
    }

    #[test]
    fn test_two_model_systems_leave_reference_unset() {
        let mut simulation = Simulation::from_json(ARCHIVE).unwrap();
        simulation.model_system.push(ModelSystem::new("slab"));

        let mut log = DiagnosticLog::new();
        simulation.normalize(&mut log);

        assert_eq!(simulation.outputs[0].outputs.model_system_ref, None);
        assert_eq!(log.count(Level::Warning), 0);
    }

    #[test]
    fn test_invalid_reference_rejected() {
        let json = r#"{"model_system": [], "outputs": [{"model_system_ref": 2}]}"#;
        assert!(matches!(
            Simulation::from_json(json),
            Err(SimOutputsError::InvalidArchive(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archive.json");

        let mut simulation = Simulation::from_json(ARCHIVE).unwrap();
        simulation.normalize(&mut DiagnosticLog::new());
        simulation.save(&path).unwrap();

        let loaded = Simulation::load(&path).unwrap();
        assert_eq!(loaded, simulation);
        assert_eq!(
            loaded.outputs[0].outputs.electronic_band_gaps[0].base.is_scf_converged,
            Some(true)
        );
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Simulation::load(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, SimOutputsError::FileNotFound { .. }));
    }
}
