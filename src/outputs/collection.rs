//! # 属性集合描述表
//!
//! 静态声明 `Outputs` 中的全部属性集合（名称 + 访问器），
//! 归一化按 `PropertyCollection::ALL` 的顺序遍历。
//! `scf_steps` 不是属性集合，因此不在表中。
//!
//! ## 依赖关系
//! - 被 `outputs/mod.rs`, `outputs/scf.rs` 使用
//! - 被 `commands/spin.rs` 通过名称查找

use super::Outputs;
use crate::error::SimOutputsError;
use crate::models::property::PhysicalProperty;

/// 属性集合
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyCollection {
    FermiLevels,
    ChemicalPotentials,
    CrystalFieldSplittings,
    HoppingMatrices,
    ElectronicEigenvalues,
    ElectronicBandGaps,
    ElectronicDos,
    FermiSurfaces,
    ElectronicBandStructures,
    Permittivities,
    AbsorptionSpectra,
    XasSpectra,
}

impl PropertyCollection {
    /// 声明顺序
    pub const ALL: [PropertyCollection; 12] = [
        PropertyCollection::FermiLevels,
        PropertyCollection::ChemicalPotentials,
        PropertyCollection::CrystalFieldSplittings,
        PropertyCollection::HoppingMatrices,
        PropertyCollection::ElectronicEigenvalues,
        PropertyCollection::ElectronicBandGaps,
        PropertyCollection::ElectronicDos,
        PropertyCollection::FermiSurfaces,
        PropertyCollection::ElectronicBandStructures,
        PropertyCollection::Permittivities,
        PropertyCollection::AbsorptionSpectra,
        PropertyCollection::XasSpectra,
    ];

    /// 稳定的字段名（与 JSON 归档中的键一致）
    pub fn name(&self) -> &'static str {
        match self {
            PropertyCollection::FermiLevels => "fermi_levels",
            PropertyCollection::ChemicalPotentials => "chemical_potentials",
            PropertyCollection::CrystalFieldSplittings => "crystal_field_splittings",
            PropertyCollection::HoppingMatrices => "hopping_matrices",
            PropertyCollection::ElectronicEigenvalues => "electronic_eigenvalues",
            PropertyCollection::ElectronicBandGaps => "electronic_band_gaps",
            PropertyCollection::ElectronicDos => "electronic_dos",
            PropertyCollection::FermiSurfaces => "fermi_surfaces",
            PropertyCollection::ElectronicBandStructures => "electronic_band_structures",
            PropertyCollection::Permittivities => "permittivities",
            PropertyCollection::AbsorptionSpectra => "absorption_spectra",
            PropertyCollection::XasSpectra => "xas_spectra",
        }
    }

    /// 集合中的属性（只读）
    pub fn get<'a>(&self, outputs: &'a Outputs) -> Vec<&'a dyn PhysicalProperty> {
        fn erase<T: PhysicalProperty>(items: &[T]) -> Vec<&dyn PhysicalProperty> {
            items.iter().map(|p| p as &dyn PhysicalProperty).collect()
        }
        match self {
            PropertyCollection::FermiLevels => erase(&outputs.fermi_levels),
            PropertyCollection::ChemicalPotentials => erase(&outputs.chemical_potentials),
            PropertyCollection::CrystalFieldSplittings => erase(&outputs.crystal_field_splittings),
            PropertyCollection::HoppingMatrices => erase(&outputs.hopping_matrices),
            PropertyCollection::ElectronicEigenvalues => erase(&outputs.electronic_eigenvalues),
            PropertyCollection::ElectronicBandGaps => erase(&outputs.electronic_band_gaps),
            PropertyCollection::ElectronicDos => erase(&outputs.electronic_dos),
            PropertyCollection::FermiSurfaces => erase(&outputs.fermi_surfaces),
            PropertyCollection::ElectronicBandStructures => {
                erase(&outputs.electronic_band_structures)
            }
            PropertyCollection::Permittivities => erase(&outputs.permittivities),
            PropertyCollection::AbsorptionSpectra => erase(&outputs.absorption_spectra),
            PropertyCollection::XasSpectra => erase(&outputs.xas_spectra),
        }
    }

    /// 集合中的属性（可变）
    pub fn get_mut<'a>(&self, outputs: &'a mut Outputs) -> Vec<&'a mut dyn PhysicalProperty> {
        fn erase<T: PhysicalProperty>(items: &mut [T]) -> Vec<&mut dyn PhysicalProperty> {
            items
                .iter_mut()
                .map(|p| p as &mut dyn PhysicalProperty)
                .collect()
        }
        match self {
            PropertyCollection::FermiLevels => erase(&mut outputs.fermi_levels),
            PropertyCollection::ChemicalPotentials => erase(&mut outputs.chemical_potentials),
            PropertyCollection::CrystalFieldSplittings => {
                erase(&mut outputs.crystal_field_splittings)
            }
            PropertyCollection::HoppingMatrices => erase(&mut outputs.hopping_matrices),
            PropertyCollection::ElectronicEigenvalues => {
                erase(&mut outputs.electronic_eigenvalues)
            }
            PropertyCollection::ElectronicBandGaps => erase(&mut outputs.electronic_band_gaps),
            PropertyCollection::ElectronicDos => erase(&mut outputs.electronic_dos),
            PropertyCollection::FermiSurfaces => erase(&mut outputs.fermi_surfaces),
            PropertyCollection::ElectronicBandStructures => {
                erase(&mut outputs.electronic_band_structures)
            }
            PropertyCollection::Permittivities => erase(&mut outputs.permittivities),
            PropertyCollection::AbsorptionSpectra => erase(&mut outputs.absorption_spectra),
            PropertyCollection::XasSpectra => erase(&mut outputs.xas_spectra),
        }
    }

    /// 按位置取单个属性
    pub fn at<'a>(&self, outputs: &'a Outputs, index: usize) -> Option<&'a dyn PhysicalProperty> {
        self.get(outputs).get(index).copied()
    }
}

impl std::fmt::Display for PropertyCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for PropertyCollection {
    type Err = SimOutputsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PropertyCollection::ALL
            .iter()
            .copied()
            .find(|c| c.name() == s)
            .ok_or_else(|| SimOutputsError::UnknownCollection(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::property::{ElectronicBandGap, FermiLevel};
    use crate::models::quantity::Quantity;

    #[test]
    fn test_names_are_unique_and_parse_back() {
        let mut names: Vec<&str> = PropertyCollection::ALL.iter().map(|c| c.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), PropertyCollection::ALL.len());

        for c in PropertyCollection::ALL {
            assert_eq!(c.name().parse::<PropertyCollection>().unwrap(), c);
        }
        assert!("scf_steps".parse::<PropertyCollection>().is_err());
    }

    #[test]
    fn test_accessors_follow_fields() {
        let mut outputs = Outputs::default();
        outputs
            .electronic_band_gaps
            .push(ElectronicBandGap::new(Quantity::scalar(1.0, "eV")));
        outputs
            .electronic_band_gaps
            .push(ElectronicBandGap::new(Quantity::scalar(2.0, "eV")));
        outputs
            .fermi_levels
            .push(FermiLevel::new(Quantity::scalar(5.0, "eV")));

        let gaps = PropertyCollection::ElectronicBandGaps;
        assert_eq!(gaps.get(&outputs).len(), 2);
        assert!(PropertyCollection::XasSpectra.get(&outputs).is_empty());
        assert!(gaps.at(&outputs, 2).is_none());

        for p in gaps.get_mut(&mut outputs) {
            p.set_is_scf_converged(false);
        }
        assert_eq!(outputs.electronic_band_gaps[1].base.is_scf_converged, Some(false));
        assert_eq!(outputs.fermi_levels[0].base.is_scf_converged, None);
    }
}
