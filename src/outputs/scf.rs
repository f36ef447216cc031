//! # SCF 输出与收敛判断
//!
//! `SCFOutputs` 在 `Outputs` 的基础上保存按时间顺序排列的 SCF 迭代步
//! （`scf_steps`，每一步本身是一个完整的 `Outputs`）。归一化时，对每个
//! 属性集合中的每个属性，取最后两步中同一位置的属性值，与收敛参数中的
//! `threshold_change` 比较，写入 `is_scf_converged`。
//!
//! 判断失败（步数不足、缺少参数、索引越界、单位不一致）一律得到
//! "未收敛"，并通过 `Logger` 报告；不会中断整个归一化过程。
//!
//! 注意：不同迭代步之间的属性按集合内位置匹配，要求上游在每一步中
//! 保持同类属性（如不同自旋通道）的顺序一致。
//!
//! ## 依赖关系
//! - 使用 `outputs/mod.rs`, `outputs/collection.rs`
//! - 使用 `models/numerical_settings.rs`, `models/quantity.rs`
//! - 被 `models/simulation.rs`, `parsers/castep_out.rs` 使用

use super::{Outputs, PropertyCollection};
use crate::models::numerical_settings::SelfConsistency;
use crate::models::property::PhysicalProperty;
use crate::models::quantity::Magnitude;
use crate::models::simulation::SimulationContext;
use crate::utils::diagnostics::Logger;
use serde::{Deserialize, Serialize};

/// 带 SCF 迭代历史的模拟输出
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SCFOutputs {
    /// 最终输出属性
    #[serde(flatten)]
    pub outputs: Outputs,

    /// SCF 迭代步（按时间顺序）
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scf_steps: Vec<Outputs>,
}

impl SCFOutputs {
    pub fn new(outputs: Outputs) -> Self {
        SCFOutputs {
            outputs,
            scf_steps: Vec::new(),
        }
    }

    /// 追加一个迭代步
    pub fn push_step(&mut self, step: Outputs) {
        self.scf_steps.push(step);
    }

    /// 取最后两步中同一位置属性的数值
    ///
    /// `scf_last_steps` 必须恰好包含两步。任何一步缺少该属性、缺少数值，
    /// 或数值单位与 `threshold_change_unit` 不一致时，返回空列表。
    pub fn get_last_scf_values(
        &self,
        scf_last_steps: &[Outputs],
        collection: PropertyCollection,
        index: usize,
        parameters: &SelfConsistency,
        logger: &mut dyn Logger,
    ) -> Vec<Magnitude> {
        if scf_last_steps.len() != 2 {
            logger.warning(
                "`scf_last_steps` needs to be of length 2, pointing to the last 2 SCF steps performed in the simulation.",
            );
            return Vec::new();
        }

        let mut values = Vec::with_capacity(2);
        for step in scf_last_steps {
            let value = match collection.at(step, index).and_then(|p| p.value()) {
                Some(v) => v,
                None => return Vec::new(),
            };
            if value.unit != parameters.threshold_change_unit {
                logger.error(&format!(
                    "The units of the `scf_step.{}.value` ({}) do not coincide with the units of the `self_consistency_ref.threshold_change_unit` ({}).",
                    collection, value.unit, parameters.threshold_change_unit
                ));
                return Vec::new();
            }
            values.push(value.magnitude.clone());
        }
        values
    }

    /// 判断一个属性在 SCF 过程后是否收敛
    pub fn resolve_is_scf_converged(
        &self,
        collection: PropertyCollection,
        index: usize,
        property: &dyn PhysicalProperty,
        parameters: Option<&SelfConsistency>,
        logger: &mut dyn Logger,
    ) -> bool {
        if self.scf_steps.len() < 2 {
            logger.warning("The SCF normalization needs at least two SCF steps.");
            return false;
        }
        let scf_last_steps = &self.scf_steps[self.scf_steps.len() - 2..];

        // 未配置收敛参数是合法状态（如非 SCF 属性），不报告
        let parameters = match parameters {
            Some(p) => p,
            None => return false,
        };

        let values =
            self.get_last_scf_values(scf_last_steps, collection, index, parameters, logger);
        let diff = match values.as_slice() {
            [a, b] => a.max_abs_diff(b),
            _ => None,
        };
        let diff = match diff {
            Some(d) => d,
            None => {
                logger.warning(&format!(
                    "The SCF normalization could not resolve the SCF values for the property `{}` ({} #{}).",
                    collection,
                    property.kind(),
                    index
                ));
                return false;
            }
        };

        if diff <= parameters.threshold_change {
            true
        } else {
            logger.info(&format!(
                "The SCF process for the property `{}` did not converge.",
                collection
            ));
            false
        }
    }

    /// 归一化：先执行 `Outputs` 的归一化，再为每个属性写入收敛标志
    pub fn normalize(&mut self, parent: Option<&SimulationContext>, logger: &mut dyn Logger) {
        for step in &mut self.scf_steps {
            step.normalize(None, logger);
        }
        self.outputs.normalize(parent, logger);

        // 步数不足时 resolve_is_scf_converged 只报告一次，不再查找参数
        let has_history = self.scf_steps.len() >= 2;

        for collection in PropertyCollection::ALL {
            let resolved: Vec<bool> = collection
                .get(&self.outputs)
                .into_iter()
                .enumerate()
                .map(|(index, property)| {
                    let reference = property.self_consistency_ref().filter(|_| has_history);
                    let parameters = reference.and_then(|r| {
                        let found = parent.and_then(|ctx| ctx.self_consistency(r));
                        if found.is_none() {
                            logger.warning(&format!(
                                "The `self_consistency_ref` of `{}` #{} does not point to a known SelfConsistency section.",
                                collection, index
                            ));
                        }
                        found
                    });
                    self.resolve_is_scf_converged(collection, index, property, parameters, logger)
                })
                .collect();

            for (property, converged) in collection
                .get_mut(&mut self.outputs)
                .into_iter()
                .zip(resolved)
            {
                property.set_is_scf_converged(converged);
            }
        }
    }

    /// 全部属性的收敛标志（集合、位置、标志）
    pub fn convergence_flags(&self) -> Vec<(PropertyCollection, usize, Option<bool>)> {
        PropertyCollection::ALL
            .iter()
            .flat_map(|&c| {
                c.get(&self.outputs)
                    .into_iter()
                    .enumerate()
                    .map(move |(i, p)| (c, i, p.is_scf_converged()))
            })
            .collect()
    }

    /// 某个属性在各迭代步中的标量值轨迹（用于绘图）
    pub fn scalar_trace(&self, collection: PropertyCollection, index: usize) -> Vec<f64> {
        self.scf_steps
            .iter()
            .filter_map(|step| collection.at(step, index))
            .filter_map(|p| p.value())
            .filter_map(|q| q.magnitude.as_scalar())
            .collect()
    }
}
