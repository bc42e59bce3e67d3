//! Monitor command implementations
//!
//! Handlers are plain functions registered in [`COMMANDS`], grouped by
//! category:
//! - `system`: `help`, `kerninfo`
//! - `stack`: `backtrace`
//! - `memory`: `showmappings`

mod memory;
mod stack;
mod system;

use super::Command;

/// The command table, in `help` order.
pub static COMMANDS: [Command; 4] = [
    Command {
        name: "help",
        description: "Display this list of commands",
        handler: system::mon_help,
    },
    Command {
        name: "kerninfo",
        description: "Display information about the kernel",
        handler: system::mon_kerninfo,
    },
    Command {
        name: "backtrace",
        description: "Display backtrace",
        handler: stack::mon_backtrace,
    },
    Command {
        name: "showmappings",
        description: "Display mappings between physical address and virtual address",
        handler: memory::mon_showmappings,
    },
];
