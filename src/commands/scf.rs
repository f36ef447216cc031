//! # scf 命令实现
//!
//! 批量检查 CASTEP 金属计算中费米能的 SCF 收敛情况。
//!
//! ## 功能
//! - 扫描 .castep 文件（单文件或目录）
//! - 解析最后一个 SCF 表，构建带迭代步的模拟归档并归一化
//! - 生成终端表格和 CSV 输出
//! - 可选绘制费米能收敛曲线（单文件）
//! - 可选保存归一化后的 JSON 归档
//!
//! ## 依赖关系
//! - 使用 `cli/scf.rs` 定义的参数
//! - 使用 `parsers/castep_out.rs`, `batch/`
//! - 使用 `utils/output.rs`, `utils/diagnostics.rs`

use crate::batch::{BatchRunner, FileCollector, ProcessResult};
use crate::cli::scf::ScfArgs;
use crate::error::{Result, SimOutputsError};
use crate::models::quantity::Dimension;
use crate::models::{SelfConsistency, Simulation, Unit};
use crate::outputs::PropertyCollection;
use crate::parsers::parse_castep_scf;
use crate::utils::diagnostics::{ConsoleLogger, DiagnosticLog, Level};
use crate::utils::output;

use std::fs;
use std::path::{Component, Path, PathBuf};
use tabled::{Table, Tabled};

/// 单个计算的收敛检查结果
#[derive(Debug)]
struct ScfRecord {
    structure: String,
    path: PathBuf,
    is_finished: bool,
    energy_unit: Unit,
    trace: Vec<f64>,
    threshold: SelfConsistency,
    converged: Option<bool>,
    diagnostics: DiagnosticLog,
    simulation: Simulation,
}

impl ScfRecord {
    /// 最后两步的费米能变化
    fn last_change(&self) -> Option<f64> {
        match self.trace.as_slice() {
            [.., a, b] => Some((a - b).abs()),
            _ => None,
        }
    }
}

/// 结果表行
#[derive(Debug, Clone, Tabled)]
struct ResultRow {
    #[tabled(rename = "Structure")]
    structure: String,
    #[tabled(rename = "Steps")]
    n_steps: usize,
    #[tabled(rename = "E_F")]
    fermi: String,
    #[tabled(rename = "|ΔE_F|")]
    change: String,
    #[tabled(rename = "Threshold")]
    threshold: String,
    #[tabled(rename = "Finished")]
    finished: String,
    #[tabled(rename = "SCF")]
    converged: String,
}

/// 执行 scf 命令
pub fn execute(args: ScfArgs) -> Result<()> {
    output::print_header("Checking SCF Convergence of the Fermi Level");

    let unit = Unit::from(args.unit.as_str());
    if unit.dimension() != Dimension::Energy {
        return Err(SimOutputsError::InvalidArgument(format!(
            "Threshold unit '{}' is not an energy unit",
            args.unit
        )));
    }
    if !args.threshold.is_finite() || args.threshold < 0.0 {
        return Err(SimOutputsError::InvalidArgument(format!(
            "Threshold must be a non-negative number, got {}",
            args.threshold
        )));
    }
    let parameters = SelfConsistency::new(args.threshold, unit).with_name("fermi_level");

    if !args.input.exists() {
        return Err(SimOutputsError::FileNotFound {
            path: args.input.display().to_string(),
        });
    }

    let collector = FileCollector::new(args.input.clone())
        .with_pattern(&args.pattern)?
        .recursive(args.recursive);
    let single = collector.is_single_file();
    let files = collector.collect();

    if files.is_empty() {
        return Err(SimOutputsError::NoFilesFound {
            pattern: args.pattern.clone(),
        });
    }

    output::print_info(&format!(
        "Found {} file(s); threshold {} {}",
        files.len(),
        parameters.threshold_change,
        parameters.threshold_change_unit
    ));

    let runner = BatchRunner::new(args.jobs);
    let result = runner.run(files, |path| process_file(path, &parameters))?;

    for (path, reason) in &result.skipped {
        output::print_warning(&format!("Skipped {}: {}", path, reason));
    }
    for (path, err) in &result.failures {
        output::print_error(&format!("{}: {}", path, err));
    }

    if result.items.is_empty() {
        output::print_warning("No CASTEP SCF histories with a Fermi energy column were found.");
        return Ok(());
    }

    // 单文件时直接显示诊断，批量时只显示错误
    for record in &result.items {
        if single {
            record.diagnostics.replay(&mut ConsoleLogger::default());
        } else if record.diagnostics.count(Level::Error) > 0 {
            output::print_error(&format!(
                "{}: {} error(s) during normalization",
                record.structure,
                record.diagnostics.count(Level::Error)
            ));
        }
    }

    let table_rows: Vec<ResultRow> = result
        .items
        .iter()
        .map(|r| ResultRow {
            structure: r.structure.clone(),
            n_steps: r.trace.len(),
            fermi: r
                .trace
                .last()
                .map(|v| format!("{:.6} {}", v, r.energy_unit))
                .unwrap_or_else(|| "-".to_string()),
            change: r
                .last_change()
                .map(|d| format!("{:.3e}", d))
                .unwrap_or_else(|| "-".to_string()),
            threshold: format!(
                "{:.3e} {}",
                r.threshold.threshold_change, r.threshold.threshold_change_unit
            ),
            finished: if r.is_finished { "yes" } else { "no" }.to_string(),
            converged: output::format_convergence(r.converged),
        })
        .collect();
    println!("{}", Table::new(&table_rows));

    save_results_csv(&result.items, &args.output_csv)?;
    output::print_success(&format!(
        "Convergence summary saved to '{}'",
        args.output_csv.display()
    ));

    if let Some(ref dir) = args.archive_dir {
        save_archives(&result.items, dir, &args.input)?;
        output::print_success(&format!("Normalized archives saved to '{}'", dir.display()));
    }

    if let Some(ref plot_path) = args.plot {
        if single {
            if let Some(record) = result.items.first() {
                generate_plot(record, plot_path)?;
                output::print_success(&format!(
                    "Fermi level trace saved to '{}'",
                    plot_path.display()
                ));
            }
        } else {
            output::print_warning("--plot is only available for a single input file. Ignoring.");
        }
    }

    let n_converged = result
        .items
        .iter()
        .filter(|r| r.converged == Some(true))
        .count();
    output::print_done(&format!(
        "{}/{} calculation(s) converged ({} file(s): {} skipped, {} failed)",
        n_converged,
        result.items.len(),
        result.total(),
        result.skipped.len(),
        result.failures.len()
    ));

    Ok(())
}

/// 处理单个 .castep 文件
fn process_file(path: &Path, parameters: &SelfConsistency) -> ProcessResult<ScfRecord> {
    let structure = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("structure")
        .to_string();

    let parsed = match parse_castep_scf(path, &structure) {
        Ok(p) => p,
        Err(e) => return ProcessResult::Failed(path.display().to_string(), e.to_string()),
    };

    if parsed.fermi_energies.is_empty() {
        return ProcessResult::Skipped(
            path.display().to_string(),
            "no Fermi energy column in the SCF table (fixed occupancies?)".to_string(),
        );
    }

    // 阈值换算到输出文件的能量单位；无法换算时保持原样，由归一化报告单位不一致
    let threshold = parameters
        .expressed_in(&parsed.energy_unit)
        .unwrap_or_else(|_| parameters.clone());

    let mut simulation = parsed.to_simulation(threshold.clone());
    let mut diagnostics = DiagnosticLog::new();
    simulation.normalize(&mut diagnostics);

    let (trace, converged) = match simulation.outputs.first() {
        Some(scf) => (
            scf.scalar_trace(PropertyCollection::FermiLevels, 0),
            scf.convergence_flags()
                .into_iter()
                .find(|(c, i, _)| *c == PropertyCollection::FermiLevels && *i == 0)
                .and_then(|(_, _, flag)| flag),
        ),
        None => (Vec::new(), None),
    };

    ProcessResult::Success(ScfRecord {
        structure,
        path: path.to_path_buf(),
        is_finished: parsed.is_finished,
        energy_unit: parsed.energy_unit.clone(),
        trace,
        threshold,
        converged,
        diagnostics,
        simulation,
    })
}

/// 保存结果到 CSV
fn save_results_csv(records: &[ScfRecord], output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;

    wtr.write_record([
        "structure",
        "path",
        "n_steps",
        "fermi_level",
        "fermi_change",
        "threshold",
        "unit",
        "is_finished",
        "is_scf_converged",
    ])?;

    for r in records {
        wtr.write_record(&[
            r.structure.clone(),
            r.path.display().to_string(),
            r.trace.len().to_string(),
            r.trace
                .last()
                .map(|v| format!("{:.10}", v))
                .unwrap_or_default(),
            r.last_change()
                .map(|d| format!("{:.6e}", d))
                .unwrap_or_default(),
            format!("{:.6e}", r.threshold.threshold_change),
            r.threshold.threshold_change_unit.to_string(),
            r.is_finished.to_string(),
            r.converged.map(|c| c.to_string()).unwrap_or_default(),
        ])?;
    }

    wtr.flush().map_err(|e| SimOutputsError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

/// 归档文件名：取相对输入目录的路径，目录层级用 `__` 连接
fn archive_name(path: &Path, root: &Path) -> String {
    let relative = path
        .strip_prefix(root)
        .ok()
        .filter(|p| !p.as_os_str().is_empty())
        .or_else(|| path.file_name().map(Path::new))
        .unwrap_or(path);
    let name = relative
        .with_extension("")
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("__");
    format!("{}.archive.json", name)
}

/// 保存归一化后的归档
fn save_archives(records: &[ScfRecord], dir: &Path, root: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| SimOutputsError::FileWriteError {
        path: dir.display().to_string(),
        source: e,
    })?;
    for r in records {
        r.simulation
            .save(&dir.join(archive_name(&r.path, root)))?;
    }
    Ok(())
}

/// 绘制费米能收敛曲线
fn generate_plot(record: &ScfRecord, output_path: &Path) -> Result<()> {
    use plotters::prelude::*;

    let plot_data: Vec<(f64, f64)> = record
        .trace
        .iter()
        .enumerate()
        .map(|(i, ef)| ((i + 1) as f64, *ef))
        .collect();

    if plot_data.is_empty() {
        return Err(SimOutputsError::Other("No data to plot".to_string()));
    }

    let y_min = plot_data
        .iter()
        .map(|(_, y)| *y)
        .fold(f64::INFINITY, f64::min);
    let y_max = plot_data
        .iter()
        .map(|(_, y)| *y)
        .fold(f64::NEG_INFINITY, f64::max);
    let y_margin = ((y_max - y_min).abs() * 0.1).max(record.threshold.threshold_change);
    let y_margin = if y_margin > 0.0 { y_margin } else { 1e-3 };

    let root = BitMapBackend::new(output_path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| SimOutputsError::Other(e.to_string()))?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("SCF Fermi Level: {}", record.structure),
            ("sans-serif", 24),
        )
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(80)
        .build_cartesian_2d(
            0.5..(plot_data.len() as f64 + 0.5),
            (y_min - y_margin)..(y_max + y_margin),
        )
        .map_err(|e| SimOutputsError::Other(e.to_string()))?;

    chart
        .configure_mesh()
        .x_desc("SCF step")
        .y_desc(format!("Fermi level ({})", record.energy_unit))
        .draw()
        .map_err(|e| SimOutputsError::Other(e.to_string()))?;

    // 连线
    chart
        .draw_series(LineSeries::new(plot_data.iter().copied(), BLUE.stroke_width(2)))
        .map_err(|e| SimOutputsError::Other(e.to_string()))?;

    // 数据点
    chart
        .draw_series(
            plot_data
                .iter()
                .map(|(x, y)| Circle::new((*x, *y), 4, BLUE.filled())),
        )
        .map_err(|e| SimOutputsError::Other(e.to_string()))?
        .label("E_F per SCF step")
        .legend(|(x, y)| Circle::new((x + 10, y), 4, BLUE.filled()));

    // 标记参与收敛判断的最后两步
    let color = if record.converged == Some(true) { GREEN } else { RED };
    chart
        .draw_series(
            plot_data
                .iter()
                .rev()
                .take(2)
                .map(|(x, y)| Circle::new((*x, *y), 7, color.filled())),
        )
        .map_err(|e| SimOutputsError::Other(e.to_string()))?
        .label("Compared steps")
        .legend(move |(x, y)| Circle::new((x + 10, y), 5, color.filled()));

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(|e| SimOutputsError::Other(e.to_string()))?;

    root.present()
        .map_err(|e| SimOutputsError::Other(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CASTEP: &str = "\
SCF loop      Energy           Fermi           Energy gain       Timer   <-- SCF
      1  -8.54569064E+002  4.01427440E+000   1.09576601E+000       0.77  <-- SCF
      2  -8.54622311E+002  4.10000000E+000   6.65587500E-003       0.98  <-- SCF
      3  -8.54622400E+002  4.10000200E+000   1.11250000E-005       1.20  <-- SCF
Total time          =             12.34 s
";

    #[test]
    fn test_process_file_converts_threshold_unit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Al.castep");
        fs::write(&path, CASTEP).unwrap();

        // 0.01 meV = 1e-5 eV > |4.100002 - 4.1|
        let parameters = SelfConsistency::new(0.01, Unit::MilliElectronVolt);
        let record = match process_file(&path, &parameters) {
            ProcessResult::Success(r) => r,
            other => panic!("unexpected result: {:?}", other),
        };

        assert_eq!(record.structure, "Al");
        assert_eq!(record.threshold.threshold_change_unit, Unit::ElectronVolt);
        assert_eq!(record.converged, Some(true));
        assert!(record.diagnostics.is_empty());
        assert!(record.last_change().unwrap() < 1e-5);
    }

    #[test]
    fn test_process_file_skips_insulator() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Si.castep");
        fs::write(
            &path,
            "SCF loop      Energy      Energy gain       Timer   <-- SCF\n      1  -2.1E+002   1.0E-001   0.47  <-- SCF\n",
        )
        .unwrap();

        let parameters = SelfConsistency::new(1e-5, "eV");
        assert!(matches!(
            process_file(&path, &parameters),
            ProcessResult::Skipped(_, _)
        ));
    }

    #[test]
    fn test_save_results_csv() {
        let dir = tempfile::tempdir().unwrap();
        let castep = dir.path().join("Al.castep");
        fs::write(&castep, CASTEP).unwrap();

        let parameters = SelfConsistency::new(1e-8, "eV");
        let record = match process_file(&castep, &parameters) {
            ProcessResult::Success(r) => r,
            other => panic!("unexpected result: {:?}", other),
        };
        assert_eq!(record.converged, Some(false));

        let csv_path = dir.path().join("summary.csv");
        save_results_csv(&[record], &csv_path).unwrap();

        let content = fs::read_to_string(&csv_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("structure,path,n_steps"));
        assert!(lines[1].starts_with("Al,"));
        assert!(lines[1].ends_with(",true,false"));
    }

    #[test]
    fn test_archive_name_keeps_subdirectories() {
        let root = Path::new("/data/runs");
        assert_eq!(
            archive_name(Path::new("/data/runs/Al.castep"), root),
            "Al.archive.json"
        );
        assert_eq!(
            archive_name(Path::new("/data/runs/fcc/Al.castep"), root),
            "fcc__Al.archive.json"
        );

        let single = Path::new("/data/runs/Al.castep");
        assert_eq!(archive_name(single, single), "Al.archive.json");
    }

    #[test]
    fn test_save_archives_same_stem_in_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("runs");
        let parameters = SelfConsistency::new(1e-5, "eV");

        let mut records = Vec::new();
        for sub in ["fcc", "bcc"] {
            fs::create_dir_all(root.join(sub)).unwrap();
            let path = root.join(sub).join("Al.castep");
            fs::write(&path, CASTEP).unwrap();
            match process_file(&path, &parameters) {
                ProcessResult::Success(r) => records.push(r),
                other => panic!("unexpected result: {:?}", other),
            }
        }

        let out = dir.path().join("archives");
        save_archives(&records, &out, &root).unwrap();

        assert!(out.join("fcc__Al.archive.json").exists());
        assert!(out.join("bcc__Al.archive.json").exists());
        assert_eq!(fs::read_dir(&out).unwrap().count(), 2);
    }
}
