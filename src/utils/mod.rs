//! # 工具函数模块
//!
//! 提供美化输出、进度条、诊断信息通道等工具。
//!
//! ## 依赖关系
//! - 被 `commands/`, `outputs/` 模块使用
//! - 子模块: output, progress, diagnostics

pub mod diagnostics;
pub mod output;
pub mod progress;
