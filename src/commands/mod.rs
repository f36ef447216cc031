//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `parsers/`, `models/`, `outputs/`, `utils/`
//! - 子模块: normalize, spin, scf

pub mod normalize;
pub mod scf;
pub mod spin;

use crate::cli::Commands;
use crate::error::Result;

/// 执行命令
pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Normalize(args) => normalize::execute(args),
        Commands::Spin(args) => spin::execute(args),
        Commands::Scf(args) => scf::execute(args),
    }
}
