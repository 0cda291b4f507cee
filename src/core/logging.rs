use crate::core::types::SimTime;
use log::{debug, error, info, trace, warn};

/// Severity of a component-scoped log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Verbose,
    Debug,
    Info,
    Warning,
    Error,
    Fatal,
}

/// Format a line the way every component-scoped message is written
pub fn component_line(time: SimTime, component: &str, message: &str) -> String {
    format!("[{}][{}] {}", time, component, message)
}

/// Forward a component-scoped message to the `log` facade.
///
/// `Verbose` maps to `trace!`, `Fatal` maps to `error!` with a `FATAL:` prefix.
pub fn log_component(level: LogLevel, time: SimTime, component: &str, message: &str) {
    let line = component_line(time, component, message);
    match level {
        LogLevel::Verbose => trace!("{}", line),
        LogLevel::Debug => debug!("{}", line),
        LogLevel::Info => info!("{}", line),
        LogLevel::Warning => warn!("{}", line),
        LogLevel::Error => error!("{}", line),
        LogLevel::Fatal => error!("FATAL: {}", line),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_line_format() {
        assert_eq!(component_line(12, "Queue0", "arrival"), "[12][Queue0] arrival");
    }

    #[test]
    fn test_levels_are_ordered() {
        assert!(LogLevel::Verbose < LogLevel::Info);
        assert!(LogLevel::Error < LogLevel::Fatal);
    }
}
