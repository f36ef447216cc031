//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `normalize`: 归一化 JSON 归档并汇总收敛结果
//! - `spin`: 列出某个属性集合中的自旋极化属性
//! - `scf`: 批量检查 CASTEP 计算的费米能 SCF 收敛
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: normalize, spin, scf

pub mod normalize;
pub mod scf;
pub mod spin;

use clap::{Parser, Subcommand};

/// simoutputs - 模拟输出归一化与 SCF 收敛检查
#[derive(Parser)]
#[command(name = "simoutputs")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(about = "Simulation output schema with SCF convergence normalization", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Normalize a JSON simulation archive and report SCF convergence
    Normalize(normalize::NormalizeArgs),

    /// List the spin-polarized properties of a property collection
    Spin(spin::SpinArgs),

    /// Check SCF convergence of the Fermi level in CASTEP outputs
    Scf(scf::ScfArgs),
}
