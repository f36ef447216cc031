//! # 模拟输出
//!
//! `Outputs` 保存一次模拟输出的全部属性集合，以及指向所描述
//! 模型体系的引用；`SCFOutputs`（见 `scf.rs`）在此基础上增加 SCF
//! 迭代步并判断每个属性是否收敛。
//!
//! ## 依赖关系
//! - 被 `models/simulation.rs` 持有
//! - 被 `commands/`, `parsers/castep_out.rs` 使用
//! - 子模块: collection, scf

pub mod collection;
pub mod scf;

pub use collection::PropertyCollection;
pub use scf::SCFOutputs;

use crate::models::model_system::ModelSystemRef;
use crate::models::property::{
    AbsorptionSpectrum, ChemicalPotential, CrystalFieldSplitting, ElectronicBandGap,
    ElectronicBandStructure, ElectronicDensityOfStates, ElectronicEigenvalues, FermiLevel,
    FermiSurface, HoppingMatrix, Permittivity, PhysicalProperty, XASSpectrum,
};
use crate::models::simulation::SimulationContext;
use crate::utils::diagnostics::Logger;
use serde::{Deserialize, Serialize};

/// 模拟输出属性
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Outputs {
    /// 所描述的模型体系（未设置时在归一化中解析）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_system_ref: Option<ModelSystemRef>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fermi_levels: Vec<FermiLevel>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chemical_potentials: Vec<ChemicalPotential>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub crystal_field_splittings: Vec<CrystalFieldSplitting>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hopping_matrices: Vec<HoppingMatrix>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub electronic_eigenvalues: Vec<ElectronicEigenvalues>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub electronic_band_gaps: Vec<ElectronicBandGap>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub electronic_dos: Vec<ElectronicDensityOfStates>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fermi_surfaces: Vec<FermiSurface>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub electronic_band_structures: Vec<ElectronicBandStructure>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub permittivities: Vec<Permittivity>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub absorption_spectra: Vec<AbsorptionSpectrum>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub xas_spectra: Vec<XASSpectrum>,
}

impl Outputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// 提取自旋极化的属性
    ///
    /// 返回 `spin_channel` 已设置的成员。空结果表示该集合不是自旋极化的。
    pub fn extract_spin_polarized_properties(
        &self,
        collection: PropertyCollection,
    ) -> Vec<&dyn PhysicalProperty> {
        collection
            .get(self)
            .into_iter()
            .filter(|p| p.spin_channel().is_some())
            .collect()
    }

    /// 父节点中恰有一个模型体系时返回它的引用，否则不做猜测
    pub fn resolve_model_system_reference(
        &self,
        parent: Option<&SimulationContext>,
    ) -> Option<ModelSystemRef> {
        let model_systems = parent?.model_systems;
        if model_systems.len() == 1 {
            Some(ModelSystemRef(0))
        } else {
            None
        }
    }

    /// 归一化：补全模型体系引用（不覆盖已有引用）并对属性自检
    pub fn normalize(&mut self, parent: Option<&SimulationContext>, logger: &mut dyn Logger) {
        if self.model_system_ref.is_none() {
            self.model_system_ref = self.resolve_model_system_reference(parent);
        }

        for collection in PropertyCollection::ALL {
            for property in collection.get_mut(self) {
                property.validate(logger);
            }
        }
    }
}
