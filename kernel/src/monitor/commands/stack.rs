//! Stack inspection commands

use crate::monitor::Monitor;
use crate::stack::{read_frame_pointer, FrameWalker};
use crate::{log_trace, log_warn};
use x86_64::structures::idt::InterruptStackFrame;

/// Walk the frame-pointer chain, innermost frame first.
///
/// Each frame prints as
///
/// ```text
/// rbp ffffffff80117f58 rip ffffffff80100a4f args 0000000000000001 ...
///   kernel/src/lib.rs:28: kernel_main+79
/// ```
///
/// The second line only appears when the return address resolves to a
/// symbol. A frame pointer that leaves readable stack memory ends the walk
/// with a `corrupt frame chain` line.
pub(super) fn mon_backtrace(
    mon: &mut Monitor<'_>,
    _argv: &[&str],
    _tf: Option<&InterruptStackFrame>,
) -> i32 {
    let stack = mon.kernel().stack;
    let symbols = mon.kernel().symbols;
    // RBP must be read in this body, not behind a call such as
    // `unwrap_or_else`: only this handler's frame stays live for the walk.
    let start = match stack.frame_pointer() {
        Some(fp) => fp,
        None => read_frame_pointer(),
    };

    for frame in FrameWalker::from_frame(stack, start) {
        let frame = match frame {
            Ok(frame) => frame,
            Err(corrupt) => {
                log_warn!("backtrace stopped: {}", corrupt);
                writeln!(mon, "{}", corrupt);
                break;
            }
        };
        log_trace!(
            "frame {:#x} -> caller {:#x}",
            frame.frame_pointer,
            frame.caller_frame_pointer
        );

        write!(
            mon,
            "rbp {:016x} rip {:016x} args",
            frame.frame_pointer, frame.return_address
        );
        for arg in frame.args {
            write!(mon, " {:016x}", arg);
        }
        mon.writeln("");

        if let Some(info) = symbols.resolve(frame.return_address) {
            writeln!(
                mon,
                "  {}:{}: {}+{}",
                info.file,
                info.line,
                info.name(),
                info.offset_of(frame.return_address)
            );
        }
    }
    0
}
