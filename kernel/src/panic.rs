//! Kernel panic handler
//!
//! Opt-in through the `panic-handler` feature and only built for bare-metal
//! targets. A kernel that embeds the monitor and has its own handler leaves
//! the feature off.
//! Reporting goes through the logging macros, which format into stack
//! buffers, so a panic raised while the heap is broken still gets reported.

#[cfg(all(feature = "panic-handler", target_os = "none"))]
#[panic_handler]
fn panic_handler(info: &core::panic::PanicInfo) -> ! {
    use crate::log_error;

    log_error!("KERNEL PANIC: {}", info.message());
    if let Some(location) = info.location() {
        log_error!("  at {}:{}", location.file(), location.line());
    }

    kmon_shared::qemu_exit_error!();

    loop {
        x86_64::instructions::hlt();
    }
}
