//! Kernel debug monitor
//!
//! An interactive console that a kernel drops into from a trap or a panic
//! path to inspect itself: stack backtraces with symbol resolution, page
//! mappings with permissions, and the layout of the kernel image.
//!
//! The crate is `no_std` + `alloc`. Everything the monitor inspects is reached
//! through traits ([`stack::StackMemory`], [`symbols::SymbolResolver`],
//! [`memory::PageResolver`], [`console::Console`]), so the command logic runs
//! unchanged in host unit tests against synthetic stacks and page tables.
//!
//! ```ignore
//! kmon_kernel::logging::init();
//! kmon_kernel::symbols::register(KERNEL_SYMBOL_TABLE);
//! unsafe { kmon_kernel::monitor::enter_active(KERNEL_LAYOUT, Some(frame)) };
//! ```

#![cfg_attr(not(test), no_std)]

extern crate alloc;

#[macro_use]
pub mod logging;

pub mod console;
pub mod memory;
pub mod monitor;
pub mod panic;
pub mod serial;
pub mod stack;
pub mod symbols;

// Config must come after logging since it references logging types
pub mod config;

pub use monitor::{enter, Command, KernelView, Monitor, MONITOR_EXIT};
