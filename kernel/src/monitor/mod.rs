//! # Kernel Monitor - Interactive Debugging Console
//!
//! A small command interpreter that runs inside a trap context. It prints a
//! banner, then reads lines at the `K> ` prompt and dispatches each one to a
//! command from a fixed table until a command returns [`MONITOR_EXIT`].
//!
//! ## Commands
//!
//! - `help`: list commands
//! - `kerninfo`: kernel image symbols and memory footprint
//! - `backtrace`: walk the frame-pointer chain and resolve return addresses
//! - `showmappings BEGIN [END]`: page translations and permissions
//!
//! ## Collaborators
//!
//! The monitor owns no hardware. Everything it inspects is reached through
//! [`KernelView`]: a [`StackMemory`] to unwind, a [`SymbolResolver`] for
//! return addresses, a [`PageResolver`] for page tables and the
//! [`KernelLayout`] of the image. Output and input go through a [`Console`].
//!
//! ## Module Organization
//!
//! - `commands/`: the command table and handlers, grouped by category
//! - `parsing`: tokenizer and address parsing

mod commands;
pub mod parsing;

pub use commands::COMMANDS;

use crate::config;
use crate::console::{Console, SerialConsole};
use crate::memory::{self, KernelLayout, PageResolver};
use crate::stack::{ActiveStack, StackMemory};
use crate::symbols::{KernelSymbols, SymbolResolver};
use crate::{log_debug, log_info, log_warn};
use core::fmt::{self, Write as _};
use parsing::TokenizeError;
use x86_64::structures::idt::InterruptStackFrame;
use x86_64::VirtAddr;

/// Handler return value that ends the monitor loop.
pub const MONITOR_EXIT: i32 = -1;

/// Command handler.
///
/// Receives every token of the line, including the command name, and the
/// interrupted context when the monitor was entered from a trap.
pub type CommandFn = fn(&mut Monitor<'_>, &[&str], Option<&InterruptStackFrame>) -> i32;

/// One entry of the command table.
pub struct Command {
    pub name: &'static str,
    pub description: &'static str,
    pub handler: CommandFn,
}

/// Why a line was not dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorError<'l> {
    /// No command has this name
    UnknownCommand(&'l str),
    /// The line could not be split into an argument vector
    Tokenize(TokenizeError),
}

impl fmt::Display for MonitorError<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorError::UnknownCommand(name) => write!(f, "Unknown command '{}'", name),
            MonitorError::Tokenize(err) => fmt::Display::fmt(err, f),
        }
    }
}

impl From<TokenizeError> for MonitorError<'_> {
    fn from(err: TokenizeError) -> Self {
        MonitorError::Tokenize(err)
    }
}

/// Kernel state the commands inspect.
pub struct KernelView<'a> {
    pub stack: &'a dyn StackMemory,
    pub symbols: &'a dyn SymbolResolver,
    pub pages: &'a dyn PageResolver,
    pub layout: KernelLayout,
}

/// One monitor session
pub struct Monitor<'a> {
    commands: &'a [Command],
    console: &'a mut dyn Console,
    kernel: KernelView<'a>,
}

impl<'a> Monitor<'a> {
    /// Monitor with the standard command table.
    pub fn new(console: &'a mut dyn Console, kernel: KernelView<'a>) -> Self {
        Self::with_commands(&COMMANDS, console, kernel)
    }

    /// Monitor with a caller-supplied command table.
    pub fn with_commands(
        commands: &'a [Command],
        console: &'a mut dyn Console,
        kernel: KernelView<'a>,
    ) -> Self {
        Self {
            commands,
            console,
            kernel,
        }
    }

    pub fn commands(&self) -> &'a [Command] {
        self.commands
    }

    pub fn kernel(&self) -> &KernelView<'a> {
        &self.kernel
    }

    /// Print formatted output. Console write errors are dropped; there is
    /// nowhere else to report them.
    pub fn write_fmt(&mut self, args: fmt::Arguments<'_>) {
        let _ = self.console.write_fmt(args);
    }

    /// Write a string to the console
    pub fn write(&mut self, s: &str) {
        let _ = self.console.write_str(s);
    }

    /// Write a string followed by newline
    pub fn writeln(&mut self, s: &str) {
        self.write(s);
        self.write("\n");
    }

    /// Run the read-dispatch loop until a command returns [`MONITOR_EXIT`].
    pub fn run(&mut self, tf: Option<&InterruptStackFrame>) {
        log_info!("monitor entered (trap context: {})", tf.is_some());
        self.writeln("Welcome to the kernel monitor!");
        self.writeln("Type 'help' for a list of commands.");

        loop {
            let Some(line) = self.console.read_line(config::MONITOR_PROMPT) else {
                continue;
            };
            if self.run_command(&line, tf) == MONITOR_EXIT {
                break;
            }
        }
        log_info!("monitor exited");
    }

    /// Tokenize and dispatch one line.
    ///
    /// Returns the handler's value, or 0 when nothing was dispatched. Errors
    /// are printed, never propagated.
    pub fn run_command(&mut self, line: &str, tf: Option<&InterruptStackFrame>) -> i32 {
        match self.dispatch(line, tf) {
            Ok(code) => code,
            Err(err) => {
                log_warn!("rejected command line: {}", err);
                writeln!(self, "{}", err);
                0
            }
        }
    }

    fn dispatch<'l>(
        &mut self,
        line: &'l str,
        tf: Option<&InterruptStackFrame>,
    ) -> Result<i32, MonitorError<'l>> {
        let argv = parsing::tokenize(line)?;
        let Some(&name) = argv.first() else {
            return Ok(0);
        };
        let commands = self.commands;
        let command = commands
            .iter()
            .find(|c| c.name == name)
            .ok_or(MonitorError::UnknownCommand(name))?;

        log_debug!("dispatch '{}' with {} args", name, argv.len());
        Ok((command.handler)(self, &argv, tf))
    }
}

/// Enter the monitor on COM1 with the given kernel view.
///
/// Returns immediately when `ENABLE_KERNEL_MONITOR` is off, so it is safe to
/// call unconditionally from trap handlers.
pub fn enter(kernel: KernelView<'_>, tf: Option<&InterruptStackFrame>) {
    if !config::ENABLE_KERNEL_MONITOR {
        return;
    }
    let mut console = SerialConsole::new();
    Monitor::new(&mut console, kernel).run(tf);
}

/// Enter the monitor on the running kernel: live stack, registered symbol
/// table and the page tables in CR3.
///
/// # Safety
/// All physical memory must be mapped at `PHYS_OFFSET`, and nothing may
/// modify the active page tables while the monitor runs.
pub unsafe fn enter_active(layout: KernelLayout, tf: Option<&InterruptStackFrame>) {
    let pages = memory::active_page_table(VirtAddr::new(memory::PHYS_OFFSET));
    let stack = ActiveStack::kernel(&pages);
    enter(
        KernelView {
            stack: &stack,
            symbols: &KernelSymbols,
            pages: &pages,
            layout,
        },
        tf,
    );
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::console::tests::ScriptedConsole;
    use crate::memory::tests::FakePages;
    use crate::memory::KERNEL_VIRTUAL_BASE;
    use crate::stack::tests::SyntheticStack;
    use crate::symbols::NoSymbols;
    use alloc::string::String;

    pub(crate) fn layout() -> KernelLayout {
        KernelLayout {
            start: 0x10_000c,
            entry: KERNEL_VIRTUAL_BASE + 0x10_000c,
            etext: KERNEL_VIRTUAL_BASE + 0x10_1ab9,
            edata: KERNEL_VIRTUAL_BASE + 0x11_3300,
            end: KERNEL_VIRTUAL_BASE + 0x11_3960,
            virtual_base: KERNEL_VIRTUAL_BASE,
        }
    }

    fn quit(mon: &mut Monitor<'_>, _argv: &[&str], _tf: Option<&InterruptStackFrame>) -> i32 {
        mon.writeln("bye");
        MONITOR_EXIT
    }

    fn echo(mon: &mut Monitor<'_>, argv: &[&str], _tf: Option<&InterruptStackFrame>) -> i32 {
        writeln!(mon, "{}", argv.join(","));
        -2
    }

    static TEST_COMMANDS: [Command; 2] = [
        Command {
            name: "echo",
            description: "Print the arguments",
            handler: echo,
        },
        Command {
            name: "quit",
            description: "Leave the monitor",
            handler: quit,
        },
    ];

    /// Run `f` against a monitor over an empty kernel view.
    fn with_monitor<R>(
        console: &mut ScriptedConsole,
        commands: &[Command],
        f: impl FnOnce(&mut Monitor<'_>) -> R,
    ) -> R {
        let stack = SyntheticStack::new(&[]);
        let memory = stack.memory();
        let pages = FakePages::default();
        let kernel = KernelView {
            stack: &memory,
            symbols: &NoSymbols,
            pages: &pages,
            layout: layout(),
        };
        let mut monitor = Monitor::with_commands(commands, console, kernel);
        f(&mut monitor)
    }

    fn run_script(lines: &[Option<&str>]) -> ScriptedConsole {
        let mut console = ScriptedConsole::with_gaps(lines);
        with_monitor(&mut console, &TEST_COMMANDS, |m| m.run(None));
        console
    }

    #[test]
    fn dispatch_passes_every_token() {
        let console = run_script(&[Some("  echo a   b\tc "), Some("quit")]);
        assert!(console.output.contains("echo,a,b,c\n"));
    }

    #[test]
    fn loop_stops_only_on_exit_value() {
        // echo returns -2, which keeps the loop going.
        let console = run_script(&[Some("echo"), Some("echo"), Some("quit")]);
        assert_eq!(console.prompts, 3);
        assert!(console.output.ends_with("bye\n"));
    }

    #[test]
    fn banner_then_prompt() {
        let console = run_script(&[Some("quit")]);
        assert!(console.output.starts_with(
            "Welcome to the kernel monitor!\nType 'help' for a list of commands.\nK> "
        ));
    }

    #[test]
    fn cancelled_and_blank_lines_prompt_again() {
        let console = run_script(&[None, Some(""), Some("   "), Some("quit")]);
        assert_eq!(console.prompts, 4);
        assert_eq!(console.output.matches("K> ").count(), 4);
    }

    #[test]
    fn unknown_command_is_reported_and_loop_continues() {
        let console = run_script(&[Some("frobnicate now"), Some("quit")]);
        assert!(console.output.contains("Unknown command 'frobnicate'\n"));
        assert_eq!(console.prompts, 2);
    }

    #[test]
    fn names_match_exactly() {
        let mut console = ScriptedConsole::new(&[]);
        let code = with_monitor(&mut console, &TEST_COMMANDS, |m| m.run_command("QUIT", None));
        assert_eq!(code, 0);
        assert!(console.output.contains("Unknown command 'QUIT'"));
    }

    #[test]
    fn too_many_arguments_discards_the_line() {
        let mut line = String::from("quit");
        for _ in 0..config::MAX_ARGS {
            line.push_str(" x");
        }
        let mut console = ScriptedConsole::new(&[]);
        let code = with_monitor(&mut console, &TEST_COMMANDS, |m| m.run_command(&line, None));
        assert_eq!(code, 0);
        assert_eq!(console.output, "Too many arguments (max 16)\n");
    }

    #[test]
    fn empty_line_returns_zero_silently() {
        let mut console = ScriptedConsole::new(&[]);
        let code = with_monitor(&mut console, &TEST_COMMANDS, |m| m.run_command(" \t\n", None));
        assert_eq!(code, 0);
        assert!(console.output.is_empty());
    }
}
