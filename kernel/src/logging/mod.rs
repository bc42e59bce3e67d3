//! Unified logging subsystem
//!
//! - **Log Levels**: ERROR, WARN, INFO, DEBUG, TRACE
//! - **Per-Module Filtering**: different levels for different modules
//! - **Output Targets**: QEMU debug port, COM1, both, or none, per level
//! - **Allocation-Free**: formatting happens in stack buffers, so the macros
//!   are usable from trap handlers and the panic path
//!
//! ## Usage
//!
//! ```ignore
//! use kmon_kernel::{log_debug, log_info};
//!
//! log_info!("monitor entered");
//! log_debug!("lookup {:#x} -> {:?}", va, frame);
//! ```
//!
//! ## Output Format
//!
//! - **INFO/WARN/ERROR**: `[LEVEL module] message`
//! - **DEBUG/TRACE**: `[LEVEL module::function@file:line] message`
//!
//! Every output target starts out as `None`; nothing reaches an I/O port
//! until [`init`] loads the targets from `config.rs`.

mod filter;
mod output;

#[macro_use]
pub mod macros;

pub use filter::{get_module_level, set_default_level, set_module_level};
pub use output::{get_output_target, set_output_target, OutputTarget};

use core::fmt::{self, Write};
use core::sync::atomic::{AtomicBool, Ordering};

/// Log levels (ordered from most to least severe)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    /// Critical errors that may cause system failure
    Error = 0,
    /// Warning conditions that should be investigated
    Warn = 1,
    /// Informational messages about normal operation
    Info = 2,
    /// Debugging information for development
    Debug = 3,
    /// Detailed trace information for deep debugging
    Trace = 4,
}

impl LogLevel {
    /// Fixed-width label used in the log prefix
    pub const fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN ",
            LogLevel::Info => "INFO ",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }

    pub(crate) const fn from_u8(val: u8) -> Self {
        match val {
            0 => LogLevel::Error,
            1 => LogLevel::Warn,
            2 => LogLevel::Info,
            3 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static LOGGING_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initialize the logging subsystem
///
/// Loads default levels and output targets from config. Idempotent.
pub fn init() {
    if LOGGING_INITIALIZED.swap(true, Ordering::SeqCst) {
        return;
    }
    filter::init_default_filters();
    output::init_default_targets();
}

/// Entry point used by the logging macros.
#[doc(hidden)]
pub fn log_impl(
    level: LogLevel,
    module: &str,
    file: &str,
    line: u32,
    function: Option<&str>,
    args: fmt::Arguments,
) {
    let module = short_module(module);
    if !filter::should_log(module, level) {
        return;
    }

    let target = output::get_output_target(level);
    if target == OutputTarget::None {
        return;
    }

    let mut buf = [0u8; 512];
    let mut writer = StackWriter::new(&mut buf);
    // A full buffer only truncates the entry.
    let _ = format_log_entry(&mut writer, level, module, file, line, function, args);
    output::write_bytes(target, writer.as_bytes());
}

/// Strip the crate name: "kmon_kernel::monitor" -> "monitor".
fn short_module(module: &str) -> &str {
    match module.find("::") {
        Some(idx) => &module[idx + 2..],
        None => "kernel",
    }
}

/// Format one entry; DEBUG and TRACE carry function, file and line.
fn format_log_entry(
    w: &mut StackWriter<'_>,
    level: LogLevel,
    module: &str,
    file: &str,
    line: u32,
    function: Option<&str>,
    args: fmt::Arguments,
) -> fmt::Result {
    write!(w, "[{} {}", level, module)?;
    if level >= LogLevel::Debug {
        if let Some(func) = function {
            write!(w, "::{}", func)?;
        }
        let filename = file.rsplit('/').next().unwrap_or(file);
        write!(w, "@{}:{}", filename, line)?;
    }
    w.write_str("] ")?;
    w.write_fmt(args)?;
    w.write_str("\n")
}

/// Fixed-capacity `fmt::Write` sink over a caller-provided buffer.
///
/// Output past the end of the buffer is dropped and reported as
/// `fmt::Error`, which callers treat as truncation.
pub struct StackWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> StackWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.pos]
    }
}

impl fmt::Write for StackWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let bytes = s.as_bytes();
        let remaining = self.buf.len() - self.pos;
        let n = bytes.len().min(remaining);
        self.buf[self.pos..self.pos + n].copy_from_slice(&bytes[..n]);
        self.pos += n;
        if n < bytes.len() {
            Err(fmt::Error)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;

    fn render(level: LogLevel, function: Option<&str>, msg: fmt::Arguments) -> String {
        let mut buf = [0u8; 256];
        let mut w = StackWriter::new(&mut buf);
        format_log_entry(
            &mut w,
            level,
            "monitor",
            "kernel/src/monitor/mod.rs",
            42,
            function,
            msg,
        )
        .unwrap();
        String::from_utf8(w.as_bytes().to_vec()).unwrap()
    }

    #[test]
    fn info_entries_carry_only_module() {
        let line = render(LogLevel::Info, Some("dispatch"), format_args!("ran {}", "help"));
        assert_eq!(line, "[INFO  monitor] ran help\n");
    }

    #[test]
    fn debug_entries_carry_location() {
        let line = render(LogLevel::Debug, Some("dispatch"), format_args!("x={}", 3));
        assert_eq!(line, "[DEBUG monitor::dispatch@mod.rs:42] x=3\n");
    }

    #[test]
    fn stack_writer_truncates() {
        let mut buf = [0u8; 4];
        let mut w = StackWriter::new(&mut buf);
        assert!(w.write_str("abcdef").is_err());
        assert_eq!(w.as_bytes(), b"abcd");
    }

    #[test]
    fn module_prefix_is_stripped() {
        assert_eq!(short_module("kmon_kernel::monitor::commands"), "monitor::commands");
        assert_eq!(short_module("kmon_kernel"), "kernel");
    }
}
