//! # 数值设置：自洽场 (SCF) 收敛参数
//!
//! ## 依赖关系
//! - 被 `models/simulation.rs` 持有
//! - 被 `outputs/scf.rs` 用于收敛判断

use super::quantity::{Quantity, Unit};
use crate::error::{Result, SimOutputsError};
use serde::{Deserialize, Serialize};

/// SCF 收敛参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelfConsistency {
    /// 参数集名称（如 "electronic"）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// 相邻两步之间允许的最大变化量
    pub threshold_change: f64,

    /// `threshold_change` 的单位
    pub threshold_change_unit: Unit,

    /// 最大迭代步数
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_max_iterations: Option<usize>,
}

impl SelfConsistency {
    pub fn new(threshold_change: f64, threshold_change_unit: impl Into<Unit>) -> Self {
        SelfConsistency {
            name: None,
            threshold_change,
            threshold_change_unit: threshold_change_unit.into(),
            n_max_iterations: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// 阈值作为物理量
    pub fn threshold(&self) -> Quantity {
        Quantity::scalar(self.threshold_change, self.threshold_change_unit.clone())
    }

    /// 将阈值换算到另一个单位（保持数值等价）
    pub fn expressed_in(&self, unit: &Unit) -> Result<SelfConsistency> {
        let converted = self.threshold().to(unit)?;
        let threshold_change = converted.magnitude.as_scalar().ok_or_else(|| {
            SimOutputsError::Other("threshold_change must be a scalar".to_string())
        })?;
        Ok(SelfConsistency {
            threshold_change,
            threshold_change_unit: converted.unit,
            ..self.clone()
        })
    }
}

/// 指向 `Simulation::self_consistency` 表中某一项的句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelfConsistencyRef(pub usize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expressed_in_mev() {
        let scf = SelfConsistency::new(0.02, "eV").with_name("electronic");
        let mev = scf.expressed_in(&Unit::MilliElectronVolt).unwrap();

        assert!((mev.threshold_change - 20.0).abs() < 1e-9);
        assert_eq!(mev.threshold_change_unit, Unit::MilliElectronVolt);
        assert_eq!(mev.name.as_deref(), Some("electronic"));
    }

    #[test]
    fn test_deserialize_minimal() {
        let scf: SelfConsistency =
            serde_json::from_str(r#"{"threshold_change":1e-5,"threshold_change_unit":"Ha"}"#)
                .unwrap();
        assert_eq!(scf.threshold_change_unit, Unit::Hartree);
        assert!(scf.n_max_iterations.is_none());
    }
}
