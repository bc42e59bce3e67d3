//! Operator console
//!
//! The monitor talks to the operator through [`Console`]: formatted output
//! via `core::fmt::Write` and blocking line input. [`SerialConsole`] is the
//! COM1 implementation; [`LineEditor`] does the echo and editing for it and
//! for any other byte-at-a-time device.

use crate::config::MAX_LINE;
use crate::serial;
use alloc::string::String;
use core::fmt::{self, Write as _};

/// Terminal the monitor reads commands from and prints to.
pub trait Console: fmt::Write {
    /// Print `prompt`, then block until the operator finishes a line.
    ///
    /// `None` means no line was produced (cancelled or device unavailable);
    /// the caller prompts again.
    fn read_line(&mut self, prompt: &str) -> Option<String>;
}

/// Result of feeding one byte to a [`LineEditor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    /// Line still being typed
    Pending,
    /// Enter pressed; the finished line (may be empty)
    Line(String),
    /// Ctrl+C or Ctrl+L dropped the line
    Cancelled,
}

/// Minimal line discipline over a raw byte stream.
///
/// - Printable ASCII: buffered and echoed, up to `MAX_LINE` bytes
/// - Enter (CR or LF): completes the line
/// - Backspace/DEL: removes the last byte
/// - Ctrl+C: cancels the line
/// - Ctrl+L: clears the screen and cancels the line
///
/// Other control bytes are ignored.
#[derive(Debug, Default)]
pub struct LineEditor {
    buffer: String,
}

impl LineEditor {
    pub fn new() -> Self {
        Self {
            buffer: String::with_capacity(MAX_LINE),
        }
    }

    /// Process `byte`, echoing to `echo`.
    pub fn feed<W: fmt::Write + ?Sized>(&mut self, byte: u8, echo: &mut W) -> Edit {
        match byte {
            b'\r' | b'\n' => {
                let _ = echo.write_str("\n");
                Edit::Line(core::mem::replace(
                    &mut self.buffer,
                    String::with_capacity(MAX_LINE),
                ))
            }
            0x08 | 0x7F => {
                if self.buffer.pop().is_some() {
                    let _ = echo.write_str("\x08 \x08");
                }
                Edit::Pending
            }
            0x03 => {
                self.buffer.clear();
                let _ = echo.write_str("^C\n");
                Edit::Cancelled
            }
            0x0C => {
                self.buffer.clear();
                let _ = echo.write_str("\x1B[2J\x1B[H");
                Edit::Cancelled
            }
            0x20..=0x7E => {
                if self.buffer.len() < MAX_LINE {
                    self.buffer.push(byte as char);
                    let _ = echo.write_char(byte as char);
                }
                Edit::Pending
            }
            _ => Edit::Pending,
        }
    }

    /// Bytes typed so far
    pub fn pending(&self) -> &str {
        &self.buffer
    }
}

/// Writes to COM1, dropping output while the port is not initialised.
struct SerialOut;

impl fmt::Write for SerialOut {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        serial::write_bytes_direct(s.as_bytes()).map_err(|_| fmt::Error)
    }
}

/// Console on the COM1 UART.
pub struct SerialConsole {
    editor: LineEditor,
}

impl SerialConsole {
    /// Programs COM1 if that has not happened yet.
    pub fn new() -> Self {
        serial::init();
        Self {
            editor: LineEditor::new(),
        }
    }
}

impl Default for SerialConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Write for SerialConsole {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        SerialOut.write_str(s)
    }
}

impl Console for SerialConsole {
    fn read_line(&mut self, prompt: &str) -> Option<String> {
        let _ = SerialOut.write_str(prompt);
        loop {
            let byte = serial::read_byte().ok()?;
            match self.editor.feed(byte, &mut SerialOut) {
                Edit::Pending => continue,
                Edit::Line(line) => return Some(line),
                Edit::Cancelled => return None,
            }
        }
    }
}
