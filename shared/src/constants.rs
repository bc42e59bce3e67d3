//! Constants and magic numbers shared across the monitor crates
//!
//! I/O port addresses and the virtual memory layout live here so the kernel
//! crate and any embedding loader agree on them.

/// I/O Port Addresses
pub mod io_ports {
    /// QEMU debug output port - writes directly to QEMU's debug console
    pub const QEMU_DEBUG: u16 = 0xe9;

    /// QEMU auto-exit port - causes QEMU to exit with specified exit code
    pub const QEMU_EXIT: u16 = 0xf4;

    /// COM1 data register (base of the UART register block)
    pub const COM1: u16 = 0x3f8;
}

/// Virtual memory layout
pub mod memory {
    /// Size of a base page (4 KiB)
    pub const PAGE_SIZE: u64 = 4096;

    /// Virtual base of the higher-half kernel image; `virt - KERNEL_VIRTUAL_BASE`
    /// yields the load-relative physical address.
    pub const KERNEL_VIRTUAL_BASE: u64 = 0xFFFF_FFFF_8000_0000;

    /// Start of the direct physical memory window
    pub const PHYS_OFFSET: u64 = 0xFFFF_8000_0000_0000;

    /// Lowest canonical higher-half address; kernel stacks live above it
    pub const HIGHER_HALF_START: u64 = 0xFFFF_8000_0000_0000;
}

/// Exit Codes
pub mod exit_codes {
    /// QEMU exit code for error
    pub const QEMU_ERROR: u8 = 1;
}
