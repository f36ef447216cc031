//! # simoutputs - 模拟输出归一化工具
//!
//! 电子结构模拟输出（带隙、态密度、费米能级等）的数据模型，
//! 以及基于最后两个 SCF 迭代步的收敛判断。
//!
//! ## 子命令
//! - `normalize` - 归一化 JSON 模拟归档并汇总收敛结果
//! - `spin`      - 列出自旋极化属性
//! - `scf`       - 批量检查 CASTEP 费米能 SCF 收敛
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── parsers/   (CASTEP SCF 解析)
//!   │     ├── batch/     (批量并行处理)
//!   │     ├── outputs/   (Outputs / SCFOutputs 与收敛判断)
//!   │     └── models/    (数据模型)
//!   ├── utils/      (输出样式、进度条、诊断信息)
//!   └── error.rs    (错误处理)
//! ```

mod batch;
mod cli;
mod commands;
mod error;
mod models;
mod outputs;
mod parsers;
mod utils;

use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
