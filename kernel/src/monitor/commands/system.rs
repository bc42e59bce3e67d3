//! System information commands
//!
//! - `help`: list the registered commands
//! - `kerninfo`: kernel image symbols and footprint

use crate::monitor::Monitor;
use x86_64::structures::idt::InterruptStackFrame;

/// Print one `name - description` line per command, in table order.
pub(super) fn mon_help(
    mon: &mut Monitor<'_>,
    _argv: &[&str],
    _tf: Option<&InterruptStackFrame>,
) -> i32 {
    for command in mon.commands() {
        writeln!(mon, "{} - {}", command.name, command.description);
    }
    0
}

/// Print the link-time symbols of the kernel image.
///
/// ```text
/// Special kernel symbols:
///   _start                          000000000010000c (phys)
///   entry  ffffffff8010000c (virt)  000000000010000c (phys)
///   ...
/// Kernel executable memory footprint: 79KB
/// ```
pub(super) fn mon_kerninfo(
    mon: &mut Monitor<'_>,
    _argv: &[&str],
    _tf: Option<&InterruptStackFrame>,
) -> i32 {
    let layout = mon.kernel().layout;

    mon.writeln("Special kernel symbols:");
    writeln!(mon, "  _start{:26}{:016x} (phys)", "", layout.start);
    for (name, va) in [
        ("entry", layout.entry),
        ("etext", layout.etext),
        ("edata", layout.edata),
        ("end", layout.end),
    ] {
        writeln!(
            mon,
            "  {:<6} {:016x} (virt)  {:016x} (phys)",
            name,
            va,
            layout.to_phys(va)
        );
    }
    writeln!(
        mon,
        "Kernel executable memory footprint: {}KB",
        layout.footprint_kib()
    );
    0
}
