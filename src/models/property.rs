//! # 物理属性
//!
//! 所有物理属性共享同一组基础字段（`PropertyBase`），并通过
//! `PhysicalProperty` trait 提供统一访问：数值、自旋通道、SCF 参数引用、
//! 收敛标志。具体属性类型由 `physical_property!` 宏声明。
//!
//! ## 依赖关系
//! - 被 `outputs/` 使用
//! - 使用 `models/quantity.rs`, `models/numerical_settings.rs`
//! - 使用 `utils/diagnostics.rs`

use super::numerical_settings::SelfConsistencyRef;
use super::quantity::Quantity;
use crate::utils::diagnostics::Logger;
use serde::{Deserialize, Serialize};

/// 自旋通道
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpinChannel {
    Up,
    Down,
}

impl std::fmt::Display for SpinChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpinChannel::Up => write!(f, "up"),
            SpinChannel::Down => write!(f, "down"),
        }
    }
}

/// 所有物理属性共享的字段
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyBase {
    /// 数值（标量或数组，带单位）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Quantity>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spin_channel: Option<SpinChannel>,

    /// 收敛参数引用
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_consistency_ref: Option<SelfConsistencyRef>,

    /// 三态：未解析 / 收敛 / 未收敛
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_scf_converged: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// 物理属性的统一接口
pub trait PhysicalProperty {
    /// 属性类型名（如 "ElectronicBandGap"）
    fn kind(&self) -> &'static str;

    fn base(&self) -> &PropertyBase;

    fn base_mut(&mut self) -> &mut PropertyBase;

    /// 归一化时的属性自检
    fn validate(&mut self, _logger: &mut dyn Logger) {}

    fn value(&self) -> Option<&Quantity> {
        self.base().value.as_ref()
    }

    fn spin_channel(&self) -> Option<SpinChannel> {
        self.base().spin_channel
    }

    fn self_consistency_ref(&self) -> Option<SelfConsistencyRef> {
        self.base().self_consistency_ref
    }

    fn is_scf_converged(&self) -> Option<bool> {
        self.base().is_scf_converged
    }

    fn set_is_scf_converged(&mut self, converged: bool) {
        self.base_mut().is_scf_converged = Some(converged);
    }
}

impl std::fmt::Debug for dyn PhysicalProperty + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(self.kind())
            .field("base", self.base())
            .finish()
    }
}

/// 声明一个物理属性类型
///
/// 生成结构体（`base` 字段 flatten 序列化 + 可选的特有字段）、
/// 构造函数和 `PhysicalProperty` 实现。
macro_rules! physical_property {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$fmeta:meta])* $field:ident : $ty:ty ),* $(,)?
        }
        $( validate = $validator:path; )?
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        pub struct $name {
            #[serde(flatten)]
            pub base: PropertyBase,
            $(
                $(#[$fmeta])*
                #[serde(default, skip_serializing_if = "Option::is_none")]
                pub $field: Option<$ty>,
            )*
        }

        // 多数属性只从归档中读取，构造函数不一定被用到
        #[allow(dead_code)]
        impl $name {
            pub fn new(value: Quantity) -> Self {
                $name {
                    base: PropertyBase {
                        value: Some(value),
                        ..Default::default()
                    },
                    ..Default::default()
                }
            }

            pub fn with_spin_channel(mut self, spin_channel: SpinChannel) -> Self {
                self.base.spin_channel = Some(spin_channel);
                self
            }

            pub fn with_self_consistency(mut self, reference: SelfConsistencyRef) -> Self {
                self.base.self_consistency_ref = Some(reference);
                self
            }
        }

        impl PhysicalProperty for $name {
            fn kind(&self) -> &'static str {
                stringify!($name)
            }

            fn base(&self) -> &PropertyBase {
                &self.base
            }

            fn base_mut(&mut self) -> &mut PropertyBase {
                &mut self.base
            }

            #[allow(unused_variables)]
            fn validate(&mut self, logger: &mut dyn Logger) {
                $( $validator(self, logger); )?
            }
        }
    };
}

/// 带隙类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BandGapType {
    Direct,
    Indirect,
}

/// 介电常数类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermittivityType {
    Static,
    Dynamic,
}

physical_property! {
    /// 费米能级
    FermiLevel {}
}

physical_property! {
    /// 化学势
    ChemicalPotential {}
}

physical_property! {
    /// 晶体场劈裂
    CrystalFieldSplitting {
        n_orbitals: usize,
    }
}

physical_property! {
    /// 跃迁矩阵（如 Wannier 紧束缚模型）
    HoppingMatrix {
        n_orbitals: usize,
    }
}

physical_property! {
    /// 电子本征值
    ElectronicEigenvalues {
        n_bands: usize,
        occupation: Vec<f64>,
    }
}

physical_property! {
    /// 电子带隙
    ElectronicBandGap {
        gap_type: BandGapType,
        /// 间接带隙的动量转移（倒空间坐标）
        momentum_transfer: Vec<f64>,
    }
    validate = validate_band_gap;
}

physical_property! {
    /// 电子态密度
    ElectronicDensityOfStates {
        /// 能量网格
        energies: Vec<f64>,
    }
}

physical_property! {
    /// 费米面
    FermiSurface {
        n_bands: usize,
    }
}

physical_property! {
    /// 电子能带结构
    ElectronicBandStructure {
        n_bands: usize,
    }
}

physical_property! {
    /// 介电常数
    Permittivity {
        permittivity_type: PermittivityType,
    }
}

physical_property! {
    /// 吸收光谱
    AbsorptionSpectrum {
        axis: String,
    }
}

physical_property! {
    /// X 射线吸收谱
    XASSpectrum {}
}

/// 带隙不能为负：记录错误并清除数值
fn validate_band_gap(gap: &mut ElectronicBandGap, logger: &mut dyn Logger) {
    let negative = gap
        .base
        .value
        .as_ref()
        .and_then(|q| q.magnitude.min_value())
        .map(|v| v < 0.0)
        .unwrap_or(false);

    if negative {
        logger.error("The electronic band gap cannot be negative; the value is dropped.");
        gap.base.value = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::diagnostics::{DiagnosticLog, Level};

    #[test]
    fn test_trait_accessors() {
        let mut gap = ElectronicBandGap::new(Quantity::scalar(1.2, "eV"))
            .with_spin_channel(SpinChannel::Up)
            .with_self_consistency(SelfConsistencyRef(0));

        assert_eq!(gap.kind(), "ElectronicBandGap");
        assert_eq!(gap.spin_channel(), Some(SpinChannel::Up));
        assert_eq!(gap.self_consistency_ref(), Some(SelfConsistencyRef(0)));
        assert_eq!(gap.is_scf_converged(), None);

        gap.set_is_scf_converged(true);
        assert_eq!(gap.is_scf_converged(), Some(true));
    }

    #[test]
    fn test_negative_band_gap_dropped() {
        let mut gap = ElectronicBandGap::new(Quantity::scalar(-0.1, "eV"));
        let mut log = DiagnosticLog::new();
        gap.validate(&mut log);

        assert!(gap.value().is_none());
        assert_eq!(log.count(Level::Error), 1);
    }

    #[test]
    fn test_positive_band_gap_kept() {
        let mut gap = ElectronicBandGap::new(Quantity::array(vec![0.0, 0.4], "eV"));
        let mut log = DiagnosticLog::new();
        gap.validate(&mut log);

        assert!(gap.value().is_some());
        assert!(log.is_empty());
    }

    #[test]
    fn test_flattened_json() {
        let json = r#"{
            "value": {"magnitude": 0.94, "unit": "eV"},
            "spin_channel": "down",
            "self_consistency_ref": 1,
            "gap_type": "indirect"
        }"#;
        let gap: ElectronicBandGap = serde_json::from_str(json).unwrap();

        assert_eq!(gap.gap_type, Some(BandGapType::Indirect));
        assert_eq!(gap.spin_channel(), Some(SpinChannel::Down));
        assert_eq!(gap.self_consistency_ref(), Some(SelfConsistencyRef(1)));
    }
}
