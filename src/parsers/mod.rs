//! # 解析器模块
//!
//! 将 DFT 程序的输出转换为带 SCF 迭代步的模拟归档。
//!
//! ## 依赖关系
//! - 被 `commands/scf.rs` 使用
//! - 使用 `models/`, `outputs/`
//! - 子模块: castep_out

pub mod castep_out;

pub use castep_out::parse_castep_scf;
