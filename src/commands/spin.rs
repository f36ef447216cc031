//! # spin 命令实现
//!
//! 列出某个属性集合中设置了 `spin_channel` 的属性。
//! 结果为空说明该集合不是自旋极化的。
//!
//! ## 依赖关系
//! - 使用 `cli/spin.rs` 定义的参数
//! - 使用 `models/simulation.rs`, `outputs/`
//! - 使用 `utils/output.rs`

use crate::cli::spin::SpinArgs;
use crate::error::{Result, SimOutputsError};
use crate::models::Simulation;
use crate::outputs::PropertyCollection;
use crate::utils::output;

use tabled::{Table, Tabled};

#[derive(Debug, Clone, Tabled)]
struct SpinRow {
    #[tabled(rename = "Output")]
    output: usize,
    #[tabled(rename = "Property")]
    property: String,
    #[tabled(rename = "Spin")]
    spin: String,
    #[tabled(rename = "Value")]
    value: String,
}

/// 执行 spin 命令
pub fn execute(args: SpinArgs) -> Result<()> {
    let collection: PropertyCollection = args.collection.parse()?;
    output::print_header(&format!("Spin-polarized {}", collection));

    let simulation = Simulation::load(&args.archive)?;

    if let Some(i) = args.output_index {
        if i >= simulation.outputs.len() {
            return Err(SimOutputsError::InvalidArgument(format!(
                "Output index {} out of range ({} output section(s))",
                i,
                simulation.outputs.len()
            )));
        }
    }

    let mut rows = Vec::new();
    for (i, scf) in simulation.outputs.iter().enumerate() {
        if args.output_index.map(|sel| sel != i).unwrap_or(false) {
            continue;
        }
        for property in scf.outputs.extract_spin_polarized_properties(collection) {
            rows.push(SpinRow {
                output: i,
                property: property.kind().to_string(),
                spin: property
                    .spin_channel()
                    .map(|s| s.to_string())
                    .unwrap_or_default(),
                value: property
                    .value()
                    .map(|q| q.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            });
        }
    }

    if rows.is_empty() {
        output::print_info(&format!("'{}' is not spin-polarized.", collection));
        return Ok(());
    }

    println!("{}", Table::new(&rows));
    output::print_done(&format!("Found {} spin-resolved propert(ies)", rows.len()));
    Ok(())
}
