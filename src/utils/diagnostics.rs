//! # 诊断信息通道
//!
//! 归一化过程中的分级诊断输出（info / warning / error）。
//! 归一化从不向调用方抛出错误，所有异常情况都写入 `Logger`。
//!
//! ## 依赖关系
//! - 被 `outputs/`, `models/`, `commands/` 使用
//! - `ConsoleLogger` 使用 `utils/output.rs`

use crate::utils::output;

/// 诊断级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Level::Info => write!(f, "info"),
            Level::Warning => write!(f, "warning"),
            Level::Error => write!(f, "error"),
        }
    }
}

/// 单条诊断
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
}

/// 分级诊断接收端
pub trait Logger {
    fn log(&mut self, level: Level, message: &str);

    fn info(&mut self, message: &str) {
        self.log(Level::Info, message);
    }

    fn warning(&mut self, message: &str) {
        self.log(Level::Warning, message);
    }

    fn error(&mut self, message: &str) {
        self.log(Level::Error, message);
    }
}

/// 内存收集型诊断日志
#[derive(Debug, Default, Clone)]
pub struct DiagnosticLog {
    entries: Vec<Diagnostic>,
}

impl DiagnosticLog {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// 指定级别的诊断数量
    pub fn count(&self, level: Level) -> usize {
        self.entries.iter().filter(|d| d.level == level).count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 按原始顺序输出到终端
    pub fn replay(&self, sink: &mut dyn Logger) {
        for d in &self.entries {
            sink.log(d.level, &d.message);
        }
    }
}

impl Logger for DiagnosticLog {
    fn log(&mut self, level: Level, message: &str) {
        self.entries.push(Diagnostic {
            level,
            message: message.to_string(),
        });
    }
}

/// 终端诊断输出
#[derive(Debug, Default)]
pub struct ConsoleLogger {
    /// 是否隐藏 info 级别
    pub quiet: bool,
}

impl Logger for ConsoleLogger {
    fn log(&mut self, level: Level, message: &str) {
        match level {
            Level::Info if self.quiet => {}
            Level::Info => output::print_info(message),
            Level::Warning => output::print_warning(message),
            Level::Error => output::print_error(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_log_counts() {
        let mut log = DiagnosticLog::new();
        log.info("a");
        log.warning("b");
        log.warning("c");
        log.error("d");

        assert_eq!(log.count(Level::Info), 1);
        assert_eq!(log.count(Level::Warning), 2);
        assert_eq!(log.count(Level::Error), 1);
        assert_eq!(log.entries()[1].message, "b");
    }

    #[test]
    fn test_replay_preserves_order() {
        let mut source = DiagnosticLog::new();
        source.error("first");
        source.info("second");

        let mut target = DiagnosticLog::new();
        source.replay(&mut target);

        assert_eq!(target.entries(), source.entries());
    }
}
