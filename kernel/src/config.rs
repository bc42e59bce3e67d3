//! Kernel monitor configuration constants
//!
//! Centralized configuration for monitor behavior and debug toggles. Other
//! modules import these values from `kmon_kernel::config` to keep
//! configuration in a single place.

/// When `true`, `monitor::enter` runs the interactive console. When `false`
/// the call returns immediately, so it is safe to leave in trap handlers.
pub const ENABLE_KERNEL_MONITOR: bool = true;

/// Prompt printed before every input line.
pub const MONITOR_PROMPT: &str = "K> ";

/// Capacity of the argument vector. One slot is reserved, so a line may carry
/// at most `MAX_ARGS - 1` tokens.
pub const MAX_ARGS: usize = 16;

/// Maximum accepted input line length (one VGA text line).
pub const MAX_LINE: usize = 80;

/// Number of stack words printed as call arguments for every frame.
pub const BACKTRACE_ARG_WORDS: usize = 5;

// ============================================================================
// Logging Configuration
// ============================================================================

use crate::logging::{LogLevel, OutputTarget};

/// Default log level for modules without specific configuration
pub const DEFAULT_LOG_LEVEL: LogLevel = LogLevel::Info;

/// Per-module log level overrides
///
/// Format: ("module::path", LogLevel::Level), paths without the crate prefix.
pub const MODULE_LOG_LEVELS: &[(&str, LogLevel)] = &[
    // ("monitor", LogLevel::Debug),
    // ("stack", LogLevel::Trace),
];

/// Output target for ERROR level logs
pub const LOG_OUTPUT_ERROR: OutputTarget = OutputTarget::Both;

/// Output target for WARN level logs
pub const LOG_OUTPUT_WARN: OutputTarget = OutputTarget::Both;

/// Output target for INFO level logs
pub const LOG_OUTPUT_INFO: OutputTarget = OutputTarget::QemuDebug;

/// Output target for DEBUG level logs
pub const LOG_OUTPUT_DEBUG: OutputTarget = OutputTarget::QemuDebug;

/// Output target for TRACE level logs
pub const LOG_OUTPUT_TRACE: OutputTarget = OutputTarget::QemuDebug;
