//! Log output target management
//!
//! Each level is routed to one of:
//! - QEMU debug port (0xE9)
//! - Serial port (COM1)
//! - Both
//! - None (discard)

use super::LogLevel;
use core::sync::atomic::{AtomicU8, Ordering};

/// Output target for log messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputTarget {
    /// Discard the message
    None = 0,
    /// QEMU debug port (0xE9) only
    QemuDebug = 1,
    /// Serial port (COM1) only
    Serial = 2,
    /// Both QEMU debug and serial
    Both = 3,
}

impl OutputTarget {
    const fn from_u8(val: u8) -> Self {
        match val {
            1 => OutputTarget::QemuDebug,
            2 => OutputTarget::Serial,
            3 => OutputTarget::Both,
            _ => OutputTarget::None,
        }
    }
}

/// Output target per level, indexed by `LogLevel as usize`.
/// Silent until `init_default_targets` runs.
static OUTPUT_TARGETS: [AtomicU8; 5] = [
    AtomicU8::new(OutputTarget::None as u8),
    AtomicU8::new(OutputTarget::None as u8),
    AtomicU8::new(OutputTarget::None as u8),
    AtomicU8::new(OutputTarget::None as u8),
    AtomicU8::new(OutputTarget::None as u8),
];

pub(super) fn init_default_targets() {
    use crate::config;

    set_output_target(LogLevel::Error, config::LOG_OUTPUT_ERROR);
    set_output_target(LogLevel::Warn, config::LOG_OUTPUT_WARN);
    set_output_target(LogLevel::Info, config::LOG_OUTPUT_INFO);
    set_output_target(LogLevel::Debug, config::LOG_OUTPUT_DEBUG);
    set_output_target(LogLevel::Trace, config::LOG_OUTPUT_TRACE);
}

pub fn get_output_target(level: LogLevel) -> OutputTarget {
    OutputTarget::from_u8(OUTPUT_TARGETS[level as usize].load(Ordering::Relaxed))
}

pub fn set_output_target(level: LogLevel, target: OutputTarget) {
    OUTPUT_TARGETS[level as usize].store(target as u8, Ordering::Relaxed);
}

/// Write bytes to the specified target(s). Allocation-free.
pub(super) fn write_bytes(target: OutputTarget, bytes: &[u8]) {
    match target {
        OutputTarget::None => {}
        OutputTarget::QemuDebug => write_qemu_debug(bytes),
        OutputTarget::Serial => write_serial(bytes),
        OutputTarget::Both => {
            write_qemu_debug(bytes);
            write_serial(bytes);
        }
    }
}

#[cfg(target_arch = "x86_64")]
fn write_qemu_debug(bytes: &[u8]) {
    kmon_shared::qemu_print_bytes!(bytes);
}

#[cfg(not(target_arch = "x86_64"))]
fn write_qemu_debug(_bytes: &[u8]) {}

fn write_serial(bytes: &[u8]) {
    // Before serial::init the line is simply lost.
    let _ = crate::serial::write_bytes_direct(bytes);
}
