//! # scf 子命令 CLI 定义
//!
//! 收敛阈值可通过环境变量配置：
//! - `SIMOUTPUTS_SCF_THRESHOLD`
//! - `SIMOUTPUTS_SCF_UNIT`
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/scf.rs`

use clap::Args;
use std::path::PathBuf;

/// scf 子命令参数
#[derive(Args, Debug)]
pub struct ScfArgs {
    /// Input: a .castep file or a directory containing .castep files
    pub input: PathBuf,

    /// Maximum allowed change of the Fermi level between the last two SCF steps
    #[arg(short, long, env = "SIMOUTPUTS_SCF_THRESHOLD", default_value_t = 1e-5)]
    pub threshold: f64,

    /// Unit of the threshold (eV, meV, Ha, Ry, J)
    #[arg(short, long, env = "SIMOUTPUTS_SCF_UNIT", default_value = "eV")]
    pub unit: String,

    /// Glob pattern for input files (comma separated)
    #[arg(long, default_value = "*.castep")]
    pub pattern: String,

    /// Recurse into subdirectories
    #[arg(long, default_value_t = false)]
    pub recursive: bool,

    /// Number of parallel jobs (0 = auto)
    #[arg(short, long, default_value_t = 0)]
    pub jobs: usize,

    /// Filename for the convergence summary CSV
    #[arg(long, default_value = "scf_convergence.csv")]
    pub output_csv: PathBuf,

    /// Plot the Fermi level trace (single file input only, PNG format)
    #[arg(long)]
    pub plot: Option<PathBuf>,

    /// Save the normalized archives as JSON into this directory
    #[arg(long)]
    pub archive_dir: Option<PathBuf>,
}
