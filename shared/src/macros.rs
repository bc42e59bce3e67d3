//! Macros for QEMU debug output and exit
//!
//! These macros keep the raw `out` sequences in one place so callers can
//! print to QEMU's debug port (0xE9) and exit via isa-debug-exit (0xF4).
//! They only make sense inside a guest; never invoke them from host tests.

#[macro_export]
/// Print raw bytes to QEMU debug port (0xE9)
///
/// # Assembly Details
/// - `out dx, al`: Output byte in AL register to I/O port in DX register
macro_rules! qemu_print_bytes {
    ($bytes:expr) => {{
        let bytes: &[u8] = ($bytes);
        for &b in bytes {
            unsafe {
                core::arch::asm!(
                    "out dx, al",
                    in("dx") $crate::constants::io_ports::QEMU_DEBUG,
                    in("al") b,
                    options(nomem, nostack, preserves_flags)
                );
            }
        }
    }};
}

#[macro_export]
/// Exit QEMU with a specific exit code
///
/// QEMU reports `(code << 1) | 1` to the host.
macro_rules! qemu_exit {
    ($code:expr) => {{
        let code: u8 = $code;
        unsafe {
            core::arch::asm!(
                "out dx, al",
                in("dx") $crate::constants::io_ports::QEMU_EXIT,
                in("al") code,
                options(nomem, nostack, preserves_flags)
            );
        }
    }};
}

#[macro_export]
/// Exit QEMU signalling failure
macro_rules! qemu_exit_error {
    () => {
        $crate::qemu_exit!($crate::constants::exit_codes::QEMU_ERROR)
    };
}
