//! # normalize 命令实现
//!
//! 读取 JSON 模拟归档，执行归一化（模型体系引用解析 + SCF 收敛判断），
//! 以表格形式输出每个属性的收敛结论。
//!
//! ## 依赖关系
//! - 使用 `cli/normalize.rs` 定义的参数
//! - 使用 `models/simulation.rs`
//! - 使用 `utils/output.rs`, `utils/diagnostics.rs`

use crate::cli::normalize::NormalizeArgs;
use crate::error::{Result, SimOutputsError};
use crate::models::simulation::ConvergenceRow;
use crate::models::Simulation;
use crate::utils::diagnostics::{ConsoleLogger, DiagnosticLog, Level};
use crate::utils::{output, progress};

use tabled::{Table, Tabled};

/// 汇总表行
#[derive(Debug, Clone, Tabled)]
struct SummaryRow {
    #[tabled(rename = "Output")]
    output: usize,
    #[tabled(rename = "Model system")]
    model_system: String,
    #[tabled(rename = "Property")]
    property: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Spin")]
    spin: String,
    #[tabled(rename = "SCF steps")]
    n_steps: usize,
    #[tabled(rename = "SCF")]
    converged: String,
}

impl From<&ConvergenceRow> for SummaryRow {
    fn from(row: &ConvergenceRow) -> Self {
        SummaryRow {
            output: row.output_index,
            model_system: row.model_system.clone().unwrap_or_else(|| "-".to_string()),
            property: format!("{}[{}]", row.collection, row.index),
            value: row.value.clone().unwrap_or_else(|| "-".to_string()),
            spin: row.spin_channel.clone().unwrap_or_else(|| "-".to_string()),
            n_steps: row.n_steps,
            converged: output::format_convergence(row.is_scf_converged),
        }
    }
}

/// 执行 normalize 命令
pub fn execute(args: NormalizeArgs) -> Result<()> {
    output::print_header("Normalizing Simulation Archive");

    let spinner = progress::create_spinner(&format!("Loading '{}'", args.archive.display()));
    let loaded = Simulation::load(&args.archive);
    spinner.finish_and_clear();
    let mut simulation = loaded?;

    output::print_info(&format!(
        "Loaded {} output section(s) and {} model system(s)",
        simulation.outputs.len(),
        simulation.model_system.len()
    ));

    let mut log = DiagnosticLog::new();
    simulation.normalize(&mut log);

    if !log.is_empty() {
        output::print_separator();
        log.replay(&mut ConsoleLogger { quiet: args.quiet });
        output::print_separator();
    }

    let rows = simulation.summary();
    if rows.is_empty() {
        output::print_warning("No physical properties found in the archive.");
    } else {
        let table_rows: Vec<SummaryRow> = rows.iter().map(SummaryRow::from).collect();
        println!("{}", Table::new(&table_rows));
    }

    let n_converged = rows
        .iter()
        .filter(|r| r.is_scf_converged == Some(true))
        .count();
    output::print_done(&format!(
        "{}/{} properties converged ({} warning(s), {} error(s))",
        n_converged,
        rows.len(),
        log.count(Level::Warning),
        log.count(Level::Error)
    ));

    if let Some(ref path) = args.output {
        simulation.save(path)?;
        output::print_success(&format!("Normalized archive saved to '{}'", path.display()));
    }

    if args.strict && n_converged < rows.len() {
        return Err(SimOutputsError::Other(format!(
            "{} propert(ies) did not reach SCF convergence",
            rows.len() - n_converged
        )));
    }

    Ok(())
}
