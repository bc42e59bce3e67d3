//! Instruction address to source symbol resolution
//!
//! A [`SymbolTable`] is built from two sorted tables emitted at link time:
//! one record per function (address range, name, source file) and one record
//! per source line (first instruction address of the line). Function names
//! follow the stabs convention and may carry a `:type` suffix; the reported
//! name length stops before it.

use spin::Once;

/// Debug information for one instruction address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolInfo<'a> {
    /// Source file containing the address
    pub file: &'a str,
    /// Source line, 0 when no line record covers the address
    pub line: u32,
    /// Raw function name, possibly followed by a stabs type suffix
    pub fn_name: &'a str,
    /// Number of bytes of `fn_name` that form the name proper
    pub fn_name_len: usize,
    /// Address of the first instruction of the function
    pub fn_addr: u64,
}

impl<'a> SymbolInfo<'a> {
    /// Function name cut to `fn_name_len` bytes.
    pub fn name(&self) -> &'a str {
        self.fn_name.get(..self.fn_name_len).unwrap_or(self.fn_name)
    }

    /// Byte distance from the function start to `addr`.
    pub fn offset_of(&self, addr: u64) -> u64 {
        addr.wrapping_sub(self.fn_addr)
    }
}

/// Maps instruction addresses to [`SymbolInfo`]. Misses are not errors.
pub trait SymbolResolver {
    fn resolve(&self, addr: u64) -> Option<SymbolInfo<'_>>;
}

/// One function of the kernel image, `start..end`.
#[derive(Debug, Clone, Copy)]
pub struct FunctionSymbol {
    pub start: u64,
    pub end: u64,
    pub name: &'static str,
    pub file: &'static str,
}

/// First instruction address of a source line.
#[derive(Debug, Clone, Copy)]
pub struct LineRecord {
    pub addr: u64,
    pub line: u32,
}

/// Sorted function and line tables.
#[derive(Debug, Clone, Copy)]
pub struct SymbolTable {
    functions: &'static [FunctionSymbol],
    lines: &'static [LineRecord],
}

impl SymbolTable {
    /// Both slices must be sorted by address; functions must not overlap.
    pub const fn new(functions: &'static [FunctionSymbol], lines: &'static [LineRecord]) -> Self {
        Self { functions, lines }
    }

    pub const fn empty() -> Self {
        Self::new(&[], &[])
    }

    fn function_at(&self, addr: u64) -> Option<&FunctionSymbol> {
        let idx = self.functions.partition_point(|f| f.start <= addr);
        let candidate = self.functions.get(idx.checked_sub(1)?)?;
        (addr < candidate.end).then_some(candidate)
    }

    /// Line of the last record at or below `addr` inside `func`.
    fn line_at(&self, func: &FunctionSymbol, addr: u64) -> u32 {
        let idx = self.lines.partition_point(|l| l.addr <= addr);
        idx.checked_sub(1)
            .map(|i| self.lines[i])
            .filter(|record| record.addr >= func.start)
            .map_or(0, |record| record.line)
    }
}

impl SymbolResolver for SymbolTable {
    fn resolve(&self, addr: u64) -> Option<SymbolInfo<'_>> {
        let func = self.function_at(addr)?;
        Some(SymbolInfo {
            file: func.file,
            line: self.line_at(func, addr),
            fn_name: func.name,
            fn_name_len: func.name.find(':').unwrap_or(func.name.len()),
            fn_addr: func.start,
        })
    }
}

/// Resolver that never finds anything.
pub struct NoSymbols;

impl SymbolResolver for NoSymbols {
    fn resolve(&self, _addr: u64) -> Option<SymbolInfo<'_>> {
        None
    }
}

static KERNEL_SYMBOLS: Once<SymbolTable> = Once::new();

/// Install the kernel's symbol table. Only the first call has an effect.
pub fn register(table: SymbolTable) {
    KERNEL_SYMBOLS.call_once(|| table);
}

/// Resolver backed by the table passed to [`register`].
pub struct KernelSymbols;

impl SymbolResolver for KernelSymbols {
    fn resolve(&self, addr: u64) -> Option<SymbolInfo<'_>> {
        KERNEL_SYMBOLS.get()?.resolve(addr)
    }
}
