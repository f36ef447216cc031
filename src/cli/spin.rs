//! # spin 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/spin.rs`

use clap::Args;
use std::path::PathBuf;

/// spin 子命令参数
#[derive(Args, Debug)]
pub struct SpinArgs {
    /// Path to the JSON simulation archive
    pub archive: PathBuf,

    /// Property collection name (e.g. electronic_band_gaps, fermi_levels)
    #[arg(short, long)]
    pub collection: String,

    /// Only inspect the outputs section with this index
    #[arg(long)]
    pub output_index: Option<usize>,
}
