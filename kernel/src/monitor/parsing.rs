//! Parsing utilities for the monitor
//!
//! Command lines are split into borrowed tokens; addresses are hexadecimal.

use crate::config::MAX_ARGS;
use core::fmt;

/// Characters separating tokens
pub const WHITESPACE: &[char] = &['\t', '\r', '\n', ' '];

/// Tokens of one command line. One slot of `MAX_ARGS` stays reserved.
pub type ArgVec<'l> = heapless::Vec<&'l str, { MAX_ARGS - 1 }>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenizeError {
    /// The line has more tokens than the argument vector holds
    TooManyArguments,
}

impl fmt::Display for TokenizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenizeError::TooManyArguments => write!(f, "Too many arguments (max {})", MAX_ARGS),
        }
    }
}

/// Split `line` on runs of whitespace.
///
/// Tokens borrow from `line`; empty tokens never appear.
pub fn tokenize(line: &str) -> Result<ArgVec<'_>, TokenizeError> {
    let mut argv = ArgVec::new();
    for token in line.split(WHITESPACE).filter(|t| !t.is_empty()) {
        argv.push(token).map_err(|_| TokenizeError::TooManyArguments)?;
    }
    Ok(argv)
}

/// Parse a hexadecimal address, with or without a `0x`/`0X` prefix.
///
/// The whole token must be hex digits; `"12g"` and `""` are rejected.
pub fn parse_hex_address(s: &str) -> Option<u64> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    // Signs are rejected, unlike strtol; from_str_radix alone takes '+'.
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u64::from_str_radix(digits, 16).ok()
}
