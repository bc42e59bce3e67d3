#![no_std]

//! Kernel Monitor Shared Library
//!
//! Constants and low-level output macros used by the monitor kernel crate
//! and by anything embedding it (boot stubs, test kernels).

pub mod constants;
pub mod macros;
