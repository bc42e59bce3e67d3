//! Per-module log level filtering
//!
//! Module names are hashed (FNV-1a) into a fixed open-addressed table of
//! atomics, so lookups never allocate and levels can change at runtime.

use super::LogLevel;
use core::sync::atomic::{AtomicU32, AtomicU8, Ordering};

/// Number of module filter slots
const FILTER_SLOTS: usize = 32;

struct FilterEntry {
    /// Module name hash (0 = empty slot)
    hash: AtomicU32,
    level: AtomicU8,
}

static MODULE_FILTERS: [FilterEntry; FILTER_SLOTS] = {
    #[allow(clippy::declare_interior_mutable_const)]
    const EMPTY: FilterEntry = FilterEntry {
        hash: AtomicU32::new(0),
        level: AtomicU8::new(LogLevel::Info as u8),
    };
    [EMPTY; FILTER_SLOTS]
};

static DEFAULT_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);

/// Open-addressing lookup for `hash`; returns the matching slot or the first empty one.
fn find_slot(hash: u32) -> Option<&'static FilterEntry> {
    let start = hash as usize % FILTER_SLOTS;
    (0..FILTER_SLOTS)
        .map(|i| &MODULE_FILTERS[(start + i) % FILTER_SLOTS])
        .find(|entry| {
            let stored = entry.hash.load(Ordering::Relaxed);
            stored == hash || stored == 0
        })
}

/// Whether a message at `level` from `module` passes the filter
pub(super) fn should_log(module: &str, level: LogLevel) -> bool {
    level <= get_module_level(module)
}

/// Current level for `module`, or the default when it has no override
pub fn get_module_level(module: &str) -> LogLevel {
    let hash = hash_module_name(module);
    match find_slot(hash) {
        Some(entry) if entry.hash.load(Ordering::Relaxed) == hash => {
            LogLevel::from_u8(entry.level.load(Ordering::Relaxed))
        }
        _ => LogLevel::from_u8(DEFAULT_LEVEL.load(Ordering::Relaxed)),
    }
}

/// Override the level for one module (path without the crate prefix)
///
/// When every slot is taken the override is dropped and the module keeps
/// the default level.
pub fn set_module_level(module: &str, level: LogLevel) {
    let hash = hash_module_name(module);
    if let Some(entry) = find_slot(hash) {
        entry.level.store(level as u8, Ordering::Relaxed);
        entry.hash.store(hash, Ordering::Relaxed);
    }
}

/// Level used for modules without an override
pub fn set_default_level(level: LogLevel) {
    DEFAULT_LEVEL.store(level as u8, Ordering::Relaxed);
}

pub(super) fn init_default_filters() {
    use crate::config;

    set_default_level(config::DEFAULT_LOG_LEVEL);
    for &(module, level) in config::MODULE_LOG_LEVELS {
        set_module_level(module, level);
    }
}

/// FNV-1a, never 0 (reserved for empty slots)
fn hash_module_name(s: &str) -> u32 {
    const FNV_PRIME: u32 = 16777619;
    const FNV_OFFSET: u32 = 2166136261;

    let hash = s
        .bytes()
        .fold(FNV_OFFSET, |h, b| (h ^ b as u32).wrapping_mul(FNV_PRIME));
    hash.max(1)
}
