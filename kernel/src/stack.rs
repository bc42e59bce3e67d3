//! Frame-pointer stack unwinding
//!
//! With frame pointers enabled every x86-64 frame starts with the caller's
//! saved RBP, followed by the return address and the caller's outgoing stack
//! words:
//!
//! ```text
//! [RBP + 0]   saved RBP of the caller   (0 in the outermost frame)
//! [RBP + 8]   return address
//! [RBP + 16]  stack words the caller left above the call, shown as "args"
//! ```
//!
//! The walker only touches memory through [`StackMemory`], so a frame chain
//! that leaves valid memory is reported instead of faulting. It has no depth
//! limit: a chain that loops back on itself is followed forever. Frame
//! pointer unwinding cannot tell a cycle from a deep stack cheaply, and
//! callers that need a bound can `take(n)` on the iterator.

use crate::config::BACKTRACE_ARG_WORDS;
use crate::memory::PageResolver;
use core::fmt;
use core::ops::Range;
use kmon_shared::constants::memory::HIGHER_HALF_START;

/// Size of one stack slot
pub const WORD_SIZE: u64 = 8;

/// Read access to the stack being unwound.
pub trait StackMemory {
    /// Fixed innermost frame to report, or `None` to start at the caller's
    /// live frame.
    ///
    /// Walkers read the live RBP inline with [`read_frame_pointer`]; read
    /// behind a method call it would name a frame that has already returned.
    fn frame_pointer(&self) -> Option<u64> {
        None
    }

    /// The word at `addr`, or `None` when `addr` is not valid stack memory.
    fn read_word(&self, addr: u64) -> Option<u64>;
}

/// One decoded frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackFrame {
    pub frame_pointer: u64,
    pub return_address: u64,
    /// Words above the return address. Calls with fewer arguments leave
    /// whatever the stack held there.
    pub args: [u64; BACKTRACE_ARG_WORDS],
    /// Saved frame pointer of the caller
    pub caller_frame_pointer: u64,
}

/// A frame whose words could not be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorruptFrame {
    /// Frame pointer value that led outside readable memory
    pub frame_pointer: u64,
}

impl fmt::Display for CorruptFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "corrupt frame chain at {:016x}", self.frame_pointer)
    }
}

/// Iterator over frames, innermost first.
///
/// Yields `Err` once if the chain leaves readable memory, then stops.
pub struct FrameWalker<'m, M: StackMemory + ?Sized> {
    memory: &'m M,
    cursor: u64,
    broken: bool,
}

impl<'m, M: StackMemory + ?Sized> FrameWalker<'m, M> {
    /// Walk from `frame_pointer`, usually the caller's own RBP.
    pub fn from_frame(memory: &'m M, frame_pointer: u64) -> Self {
        Self {
            memory,
            cursor: frame_pointer,
            broken: false,
        }
    }

    fn word(&self, fp: u64, slot: u64) -> Result<u64, CorruptFrame> {
        slot.checked_mul(WORD_SIZE)
            .and_then(|offset| fp.checked_add(offset))
            .and_then(|addr| self.memory.read_word(addr))
            .ok_or(CorruptFrame { frame_pointer: fp })
    }

    fn decode(&self, fp: u64) -> Result<StackFrame, CorruptFrame> {
        let caller_frame_pointer = self.word(fp, 0)?;
        let return_address = self.word(fp, 1)?;
        let mut args = [0u64; BACKTRACE_ARG_WORDS];
        for (slot, arg) in (2u64..).zip(args.iter_mut()) {
            *arg = self.word(fp, slot)?;
        }
        Ok(StackFrame {
            frame_pointer: fp,
            return_address,
            args,
            caller_frame_pointer,
        })
    }
}

impl<M: StackMemory + ?Sized> Iterator for FrameWalker<'_, M> {
    type Item = Result<StackFrame, CorruptFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.broken || self.cursor == 0 {
            return None;
        }
        match self.decode(self.cursor) {
            Ok(frame) => {
                self.cursor = frame.caller_frame_pointer;
                Some(Ok(frame))
            }
            Err(err) => {
                self.broken = true;
                Some(Err(err))
            }
        }
    }
}

/// Read the RBP of the calling function.
///
/// Must stay inlined into the function whose frame is wanted.
#[cfg(target_arch = "x86_64")]
#[inline(always)]
pub fn read_frame_pointer() -> u64 {
    let rbp: u64;
    // SAFETY: copies a register, touches no memory.
    unsafe {
        core::arch::asm!(
            "mov {}, rbp",
            out(reg) rbp,
            options(nomem, nostack, preserves_flags)
        );
    }
    rbp
}

#[cfg(not(target_arch = "x86_64"))]
#[inline(always)]
pub fn read_frame_pointer() -> u64 {
    0
}

/// The live stack, read with volatile loads inside a known-valid window.
///
/// Reads outside `bounds`, not 8-byte aligned, or on a page the attached
/// [`PageResolver`] does not map are refused, which turns a wild frame
/// pointer into a reported [`CorruptFrame`] instead of a fault. Without a
/// resolver the window itself must only cover mapped memory.
pub struct ActiveStack<'p> {
    bounds: Range<u64>,
    start: Option<u64>,
    pages: Option<&'p dyn PageResolver>,
}

impl<'p> ActiveStack<'p> {
    pub const fn new(bounds: Range<u64>) -> Self {
        Self {
            bounds,
            start: None,
            pages: None,
        }
    }

    /// Kernel stacks live in the higher half; every read is checked
    /// against `pages` first.
    pub fn kernel(pages: &'p dyn PageResolver) -> Self {
        Self::new(HIGHER_HALF_START..u64::MAX).mapped_by(pages)
    }

    /// Only read words on pages `pages` maps.
    pub fn mapped_by(mut self, pages: &'p dyn PageResolver) -> Self {
        self.pages = Some(pages);
        self
    }

    /// Start unwinding at `frame_pointer` instead of the live RBP.
    pub fn starting_at(mut self, frame_pointer: u64) -> Self {
        self.start = Some(frame_pointer);
        self
    }

    fn readable(&self, addr: u64) -> bool {
        let in_window = addr % WORD_SIZE == 0
            && addr >= self.bounds.start
            && addr
                .checked_add(WORD_SIZE)
                .is_some_and(|end| end <= self.bounds.end);
        // An aligned word never straddles a page.
        in_window && self.pages.map_or(true, |pages| pages.lookup(addr).is_some())
    }
}

impl StackMemory for ActiveStack<'_> {
    fn frame_pointer(&self) -> Option<u64> {
        self.start
    }

    fn read_word(&self, addr: u64) -> Option<u64> {
        if !self.readable(addr) {
            return None;
        }
        // SAFETY: aligned, inside the window and on a page the owner vouched
        // for.
        Some(unsafe { core::ptr::read_volatile(addr as *const u64) })
    }
}
