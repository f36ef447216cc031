//! # normalize 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/normalize.rs`

use clap::Args;
use std::path::PathBuf;

/// normalize 子命令参数
#[derive(Args, Debug)]
pub struct NormalizeArgs {
    /// Path to the JSON simulation archive
    pub archive: PathBuf,

    /// Write the normalized archive to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Hide informational diagnostics
    #[arg(short, long, default_value_t = false)]
    pub quiet: bool,

    /// Exit with an error if any property is not converged
    #[arg(long, default_value_t = false)]
    pub strict: bool,
}
