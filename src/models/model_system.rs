//! # 模型体系
//!
//! 输出属性所描述的结构模型。几何分析不在本 crate 范围内，
//! 这里只保留识别信息。
//!
//! ## 依赖关系
//! - 被 `models/simulation.rs` 持有
//! - 被 `outputs/mod.rs` 通过 `ModelSystemRef` 引用

use serde::{Deserialize, Serialize};

/// 模型体系
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelSystem {
    /// 名称
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// 层级树中的分支标签（如 "unit cell"）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_label: Option<String>,

    /// 化学式
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chemical_formula: Option<String>,

    /// 是否为代表性体系
    #[serde(default)]
    pub is_representative: bool,
}

impl ModelSystem {
    pub fn new(name: impl Into<String>) -> Self {
        ModelSystem {
            name: Some(name.into()),
            is_representative: true,
            ..Default::default()
        }
    }

    /// 用于表格显示的标签
    pub fn label(&self) -> String {
        match (&self.name, &self.chemical_formula) {
            (Some(n), Some(f)) => format!("{} ({})", n, f),
            (Some(n), None) => n.clone(),
            (None, Some(f)) => f.clone(),
            (None, None) => "<unnamed>".to_string(),
        }
    }
}

/// 指向 `Simulation::model_system` 表中某一项的句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelSystemRef(pub usize);

impl std::fmt::Display for ModelSystemRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "model_system/{}", self.0)
    }
}
