//! # 物理量与单位
//!
//! 带单位的数值（标量或数组）。单位比较是严格相等：`eV` 与 `J`
//! 即使可以换算，也视为不同单位。换算只在显式调用 `Quantity::to` 时发生。
//!
//! ## 依赖关系
//! - 被 `models/property.rs`, `models/numerical_settings.rs` 使用
//! - 被 `outputs/scf.rs` 用于收敛判断

use crate::error::{Result, SimOutputsError};
use serde::{Deserialize, Serialize};

/// 1 eV 对应的焦耳数
const ELECTRON_VOLT_IN_JOULE: f64 = 1.602_176_634e-19;
/// 1 Hartree 对应的焦耳数
const HARTREE_IN_JOULE: f64 = 4.359_744_722_207_1e-18;
/// 1 Rydberg 对应的焦耳数
const RYDBERG_IN_JOULE: f64 = 2.179_872_361_103_5e-18;

/// 物理量纲
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Energy,
    Dimensionless,
    Unknown,
}

/// 单位
///
/// 序列化为单位符号字符串，未识别的符号保存在 `Other` 中。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Unit {
    ElectronVolt,
    MilliElectronVolt,
    Joule,
    Hartree,
    Rydberg,
    Dimensionless,
    Other(String),
}

impl Unit {
    /// 单位符号
    pub fn symbol(&self) -> &str {
        match self {
            Unit::ElectronVolt => "eV",
            Unit::MilliElectronVolt => "meV",
            Unit::Joule => "J",
            Unit::Hartree => "Ha",
            Unit::Rydberg => "Ry",
            Unit::Dimensionless => "dimensionless",
            Unit::Other(s) => s,
        }
    }

    pub fn dimension(&self) -> Dimension {
        match self {
            Unit::ElectronVolt
            | Unit::MilliElectronVolt
            | Unit::Joule
            | Unit::Hartree
            | Unit::Rydberg => Dimension::Energy,
            Unit::Dimensionless => Dimension::Dimensionless,
            Unit::Other(_) => Dimension::Unknown,
        }
    }

    /// 换算到 SI 单位的系数
    pub fn si_factor(&self) -> Option<f64> {
        match self {
            Unit::ElectronVolt => Some(ELECTRON_VOLT_IN_JOULE),
            Unit::MilliElectronVolt => Some(ELECTRON_VOLT_IN_JOULE * 1e-3),
            Unit::Joule => Some(1.0),
            Unit::Hartree => Some(HARTREE_IN_JOULE),
            Unit::Rydberg => Some(RYDBERG_IN_JOULE),
            Unit::Dimensionless => Some(1.0),
            Unit::Other(_) => None,
        }
    }

    /// 本单位到目标单位的换算系数
    pub fn conversion_factor(&self, target: &Unit) -> Result<f64> {
        if self == target {
            return Ok(1.0);
        }
        let incompatible = || SimOutputsError::IncompatibleUnits {
            from: self.to_string(),
            to: target.to_string(),
        };
        if self.dimension() != target.dimension() || self.dimension() == Dimension::Unknown {
            return Err(incompatible());
        }
        match (self.si_factor(), target.si_factor()) {
            (Some(a), Some(b)) => Ok(a / b),
            _ => Err(incompatible()),
        }
    }
}

impl From<String> for Unit {
    fn from(s: String) -> Self {
        match s.trim() {
            "eV" | "electron_volt" => Unit::ElectronVolt,
            "meV" | "millielectron_volt" => Unit::MilliElectronVolt,
            "J" | "joule" => Unit::Joule,
            "Ha" | "hartree" => Unit::Hartree,
            "Ry" | "rydberg" => Unit::Rydberg,
            "" | "dimensionless" => Unit::Dimensionless,
            other => Unit::Other(other.to_string()),
        }
    }
}

impl From<&str> for Unit {
    fn from(s: &str) -> Self {
        Unit::from(s.to_string())
    }
}

impl From<Unit> for String {
    fn from(u: Unit) -> Self {
        u.symbol().to_string()
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// 数值部分：标量或数组
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Magnitude {
    Scalar(f64),
    Array(Vec<f64>),
}

impl Magnitude {
    /// 两个数值之间的最大逐元素绝对差
    ///
    /// 形状不一致、数组为空或任一差值为 NaN 时返回 `None`。
    pub fn max_abs_diff(&self, other: &Magnitude) -> Option<f64> {
        let finite = |d: f64| if d.is_nan() { None } else { Some(d) };
        match (self, other) {
            (Magnitude::Scalar(a), Magnitude::Scalar(b)) => finite((a - b).abs()),
            (Magnitude::Array(a), Magnitude::Array(b)) if !a.is_empty() && a.len() == b.len() => a
                .iter()
                .zip(b.iter())
                .try_fold(0.0f64, |acc, (x, y)| finite((x - y).abs()).map(|d| acc.max(d))),
            _ => None,
        }
    }

    pub fn scaled(&self, factor: f64) -> Magnitude {
        match self {
            Magnitude::Scalar(v) => Magnitude::Scalar(v * factor),
            Magnitude::Array(v) => Magnitude::Array(v.iter().map(|x| x * factor).collect()),
        }
    }

    /// 标量值（数组返回 `None`）
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Magnitude::Scalar(v) => Some(*v),
            Magnitude::Array(_) => None,
        }
    }

    /// 所有元素中的最小值，空数组返回 `None`
    pub fn min_value(&self) -> Option<f64> {
        match self {
            Magnitude::Scalar(v) => Some(*v),
            Magnitude::Array(v) => v.iter().copied().reduce(f64::min),
        }
    }
}

impl std::fmt::Display for Magnitude {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Magnitude::Scalar(v) => write!(f, "{:.6}", v),
            Magnitude::Array(v) => write!(f, "[{} values]", v.len()),
        }
    }
}

/// 带单位的物理量
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    pub magnitude: Magnitude,
    pub unit: Unit,
}

impl Quantity {
    pub fn scalar(value: f64, unit: impl Into<Unit>) -> Self {
        Quantity {
            magnitude: Magnitude::Scalar(value),
            unit: unit.into(),
        }
    }

    #[cfg(test)]
    pub fn array(values: Vec<f64>, unit: impl Into<Unit>) -> Self {
        Quantity {
            magnitude: Magnitude::Array(values),
            unit: unit.into(),
        }
    }

    /// 换算到目标单位
    pub fn to(&self, unit: &Unit) -> Result<Quantity> {
        let factor = self.unit.conversion_factor(unit)?;
        Ok(Quantity {
            magnitude: self.magnitude.scaled(factor),
            unit: unit.clone(),
        })
    }
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.magnitude, self.unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_from_symbol() {
        assert_eq!(Unit::from("eV"), Unit::ElectronVolt);
        assert_eq!(Unit::from("joule"), Unit::Joule);
        assert_eq!(Unit::from("1/m"), Unit::Other("1/m".to_string()));
        assert_eq!(Unit::from(""), Unit::Dimensionless);
    }

    #[test]
    fn test_unit_equality_is_strict() {
        assert_ne!(Unit::ElectronVolt, Unit::Joule);
        assert_eq!(Unit::from("eV"), Unit::from("electron_volt"));
    }

    #[test]
    fn test_quantity_to_joule() {
        let q = Quantity::scalar(1.0, "eV");
        let j = q.to(&Unit::Joule).unwrap();
        let v = j.magnitude.as_scalar().unwrap();

        assert!((v - 1.602176634e-19).abs() < 1e-30);
        assert_eq!(j.unit, Unit::Joule);
    }

    #[test]
    fn test_quantity_to_mev() {
        let q = Quantity::array(vec![0.5, 1.0], "eV");
        let mev = q.to(&Unit::MilliElectronVolt).unwrap();

        match mev.magnitude {
            Magnitude::Array(v) => {
                assert!((v[0] - 500.0).abs() < 1e-9);
                assert!((v[1] - 1000.0).abs() < 1e-9);
            }
            _ => panic!("expected array"),
        }
    }

    #[test]
    fn test_incompatible_units() {
        let q = Quantity::scalar(1.0, "eV");
        assert!(q.to(&Unit::Dimensionless).is_err());
        assert!(q.to(&Unit::Other("m".to_string())).is_err());
    }

    #[test]
    fn test_max_abs_diff() {
        let a = Magnitude::Scalar(0.95);
        let b = Magnitude::Scalar(0.94);
        assert!((a.max_abs_diff(&b).unwrap() - 0.01).abs() < 1e-12);

        let a = Magnitude::Array(vec![1.0, 2.0, 3.0]);
        let b = Magnitude::Array(vec![1.0, 2.5, 2.9]);
        assert!((a.max_abs_diff(&b).unwrap() - 0.5).abs() < 1e-12);

        let c = Magnitude::Array(vec![1.0]);
        assert!(a.max_abs_diff(&c).is_none());
        assert!(Magnitude::Scalar(1.0).max_abs_diff(&c).is_none());

        let empty = Magnitude::Array(Vec::new());
        assert!(empty.max_abs_diff(&empty).is_none());

        let nan = Magnitude::Array(vec![1.0, f64::NAN, 3.0]);
        assert!(a.max_abs_diff(&nan).is_none());
        assert!(Magnitude::Scalar(f64::NAN)
            .max_abs_diff(&Magnitude::Scalar(1.0))
            .is_none());
    }

    #[test]
    fn test_quantity_json_shape() {
        let q = Quantity::scalar(0.94, "eV");
        let json = serde_json::to_string(&q).unwrap();
        assert_eq!(json, r#"{"magnitude":0.94,"unit":"eV"}"#);

        let back: Quantity = serde_json::from_str(r#"{"magnitude":[1.0,2.0],"unit":"J"}"#).unwrap();
        assert_eq!(back, Quantity::array(vec![1.0, 2.0], "J"));
    }
}
