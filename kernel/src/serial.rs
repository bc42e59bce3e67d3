//! COM1 serial port shared by the monitor console and the log backend.
//!
//! The UART is programmed once by [`init`]; until then every write fails
//! with an error and reads are unavailable. `uart_16550` only does the
//! programming: reads and writes poll the line status register directly so
//! the lock is never held while waiting on the operator.

use kmon_shared::constants::io_ports;
use spin::Mutex;
use uart_16550::SerialPort;
use x86_64::instructions::port::Port;

/// Line status register offset and its "data ready" and "transmit holding
/// register empty" bits
const LINE_STATUS: u16 = 5;
const DATA_READY: u8 = 0x01;
const THR_EMPTY: u8 = 0x20;

const NOT_INITIALISED: &str = "COM1 not initialised";

static COM1: Mutex<Option<SerialPort>> = Mutex::new(None);

/// Program COM1 (115200 8N1, FIFOs on). Safe to call more than once.
pub fn init() {
    let mut guard = COM1.lock();
    if guard.is_none() {
        // SAFETY: 0x3F8 is the architectural COM1 base; nothing else in the
        // kernel drives these ports directly.
        let mut port = unsafe { SerialPort::new(io_ports::COM1) };
        port.init();
        *guard = Some(port);
    }
}

/// Run `f` with exclusive access to the initialised port.
fn with_port<R>(f: impl FnOnce(&mut SerialPort) -> R) -> Result<R, &'static str> {
    let mut guard = COM1.lock();
    match guard.as_mut() {
        Some(port) => Ok(f(port)),
        None => Err(NOT_INITIALISED),
    }
}

/// Write raw bytes, translating `\n` to `\r\n` for terminals.
///
/// Bytes go straight to the data register; `SerialPort::send` would expand
/// backspace into its own erase sequence and double the line editor's.
pub fn write_bytes_direct(bytes: &[u8]) -> Result<(), &'static str> {
    with_port(|_| {
        for &b in bytes {
            if b == b'\n' {
                write_raw(b'\r');
            }
            write_raw(b);
        }
    })
}

fn write_raw(byte: u8) {
    let mut status: Port<u8> = Port::new(io_ports::COM1 + LINE_STATUS);
    let mut data: Port<u8> = Port::new(io_ports::COM1);
    // SAFETY: callers hold the COM1 lock, so the UART is programmed and
    // no one else is touching its registers.
    unsafe {
        while status.read() & THR_EMPTY == 0 {
            core::hint::spin_loop();
        }
        data.write(byte);
    }
}

/// Block until one byte arrives.
///
/// COM1 is locked for one status check at a time, so log output from other
/// contexts still gets through while the monitor waits for input.
pub fn read_byte() -> Result<u8, &'static str> {
    poll_port(&COM1, |_| try_read_raw())
}

fn try_read_raw() -> Option<u8> {
    let mut status: Port<u8> = Port::new(io_ports::COM1 + LINE_STATUS);
    let mut data: Port<u8> = Port::new(io_ports::COM1);
    // SAFETY: called under the COM1 lock on a programmed UART.
    unsafe { (status.read() & DATA_READY != 0).then(|| data.read()) }
}

/// Retry `attempt` until it yields, taking `lock` afresh for every try.
fn poll_port<P, R>(
    lock: &Mutex<Option<P>>,
    mut attempt: impl FnMut(&mut P) -> Option<R>,
) -> Result<R, &'static str> {
    loop {
        if let Some(value) = attempt(lock.lock().as_mut().ok_or(NOT_INITIALISED)?) {
            return Ok(value);
        }
        core::hint::spin_loop();
    }
}
