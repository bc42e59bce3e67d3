//! Memory mapping commands
//!
//! This module implements `showmappings`, which prints the physical frame
//! and access permissions behind each virtual page of a range.

use crate::log_debug;
use crate::memory::{round_down, PAGE_SIZE};
use crate::monitor::parsing::parse_hex_address;
use crate::monitor::Monitor;
use core::fmt;
use x86_64::structures::idt::InterruptStackFrame;
use x86_64::structures::paging::PageTableFlags;

/// Permission bits shown per page, in column order.
const PERMISSION_BITS: [(PageTableFlags, char); 3] = [
    (PageTableFlags::PRESENT, 'P'),
    (PageTableFlags::USER_ACCESSIBLE, 'U'),
    (PageTableFlags::WRITABLE, 'W'),
];

/// Page-aligned run of virtual pages.
///
/// Kept as a page count rather than an end address so a range reaching the
/// top of the address space does not overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressRange {
    pub begin: u64,
    pub pages: u64,
}

impl AddressRange {
    /// The page containing `addr`.
    pub const fn single(addr: u64) -> Self {
        Self {
            begin: round_down(addr, PAGE_SIZE),
            pages: 1,
        }
    }

    /// From the page containing `begin` up to `end` rounded up to a page.
    /// Empty when `end` does not lie above the first page's start.
    pub const fn between(begin: u64, end: u64) -> Self {
        let begin = round_down(begin, PAGE_SIZE);
        let pages = if end > begin {
            (end - begin).div_ceil(PAGE_SIZE)
        } else {
            0
        };
        Self { begin, pages }
    }

    /// Start address of every page in the range.
    pub fn iter(&self) -> impl Iterator<Item = u64> {
        let begin = self.begin;
        (0..self.pages).map(move |i| begin + i * PAGE_SIZE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeError {
    /// Wrong number of arguments
    Usage,
    /// An argument is not entirely hexadecimal
    WrongAddress,
}

impl fmt::Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeError::Usage => write!(f, "Usage: showmappings BEGIN [END]"),
            RangeError::WrongAddress => write!(f, "Wrong address!"),
        }
    }
}

/// Parse `BEGIN [END]` (the tokens after the command name).
pub fn parse_range(args: &[&str]) -> Result<AddressRange, RangeError> {
    let parse = |s: &str| parse_hex_address(s).ok_or(RangeError::WrongAddress);
    match *args {
        [begin] => Ok(AddressRange::single(parse(begin)?)),
        [begin, end] => Ok(AddressRange::between(parse(begin)?, parse(end)?)),
        _ => Err(RangeError::Usage),
    }
}

/// `P/U/W` with `X` in place of every flag the entry lacks.
pub struct Permissions(pub PageTableFlags);

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (flag, letter)) in PERMISSION_BITS.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            let shown = if self.0.contains(*flag) { *letter } else { 'X' };
            write!(f, "{}", shown)?;
        }
        Ok(())
    }
}

/// Show virtual to physical mappings for a page range.
///
/// # Examples
/// ```text
/// showmappings f0000000          # one page
/// showmappings 0xf0000000 f0004000
/// ```
///
/// Output:
/// ```text
/// Virtual	Physical	Permission
/// 00000000f0000000	0000000000000000	P/X/W
/// 00000000f0001000	NULL	NULL
/// ```
pub(super) fn mon_showmappings(
    mon: &mut Monitor<'_>,
    argv: &[&str],
    _tf: Option<&InterruptStackFrame>,
) -> i32 {
    let range = match parse_range(argv.get(1..).unwrap_or_default()) {
        Ok(range) => range,
        Err(err) => {
            writeln!(mon, "{}", err);
            return 0;
        }
    };
    log_debug!("showmappings {:#x} + {} pages", range.begin, range.pages);

    let pages = mon.kernel().pages;
    mon.writeln("Virtual\tPhysical\tPermission");
    for va in range.iter() {
        match pages.lookup(va) {
            Some(hit) => writeln!(
                mon,
                "{:016x}\t{:016x}\t{}",
                va,
                hit.phys_addr().as_u64(),
                Permissions(hit.flags())
            ),
            None => writeln!(mon, "{:016x}\tNULL\tNULL", va),
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::tests::ScriptedConsole;
    use crate::memory::tests::FakePages;
    use crate::memory::PageResolver;
    use crate::monitor::tests::layout;
    use crate::monitor::KernelView;
    use crate::stack::ActiveStack;
    use crate::symbols::NoSymbols;
    use alloc::format;
    use alloc::string::String;
    use alloc::vec::Vec;

    const P: PageTableFlags = PageTableFlags::PRESENT;
    const U: PageTableFlags = PageTableFlags::USER_ACCESSIBLE;
    const W: PageTableFlags = PageTableFlags::WRITABLE;

    fn run(pages: &dyn PageResolver, line: &str) -> String {
        let mut console = ScriptedConsole::new(&[]);
        let stack = ActiveStack::new(0..0);
        let code = Monitor::new(
            &mut console,
            KernelView {
                stack: &stack,
                symbols: &NoSymbols,
                pages,
                layout: layout(),
            },
        )
        .run_command(line, None);
        assert_eq!(code, 0);
        console.output
    }

    fn rows(out: &str) -> Vec<&str> {
        out.lines().skip(1).collect()
    }

    fn sample_pages() -> FakePages {
        let mut pages = FakePages::default();
        pages.map(0x1000, 0x7000, P | W);
        pages.map(0x2000, 0x9000, P | U | W);
        pages
    }

    #[test]
    fn single_address_is_one_page() {
        let out = run(&sample_pages(), "showmappings 1000");
        assert_eq!(
            out,
            "Virtual\tPhysical\tPermission\n\
             0000000000001000\t0000000000007000\tP/X/W\n"
        );
    }

    #[test]
    fn unaligned_begin_rounds_down() {
        let pages = sample_pages();
        assert_eq!(
            run(&pages, "showmappings 1001"),
            run(&pages, "showmappings 1000")
        );
        assert_eq!(
            run(&pages, "showmappings 0x1fff"),
            run(&pages, "showmappings 1000")
        );
    }

    #[test]
    fn two_addresses_cover_the_rounded_up_range() {
        let pages = sample_pages();
        let out = run(&pages, "showmappings 1000 3000");
        assert_eq!(
            rows(&out),
            [
                "0000000000001000\t0000000000007000\tP/X/W",
                "0000000000002000\t0000000000009000\tP/U/W",
            ]
        );
        assert_eq!(rows(&run(&pages, "showmappings 1000 2001")).len(), 2);
    }

    #[test]
    fn permissions_are_rendered_per_row() {
        let mut pages = FakePages::default();
        pages.map(0x1000, 0x7000, P);
        pages.map(0x2000, 0x8000, P | U | W);
        let out = run(&pages, "showmappings 1000 3000");
        assert!(rows(&out)[0].ends_with("\tP/X/X"));
        assert!(rows(&out)[1].ends_with("\tP/U/W"));
    }

    #[test]
    fn unmapped_pages_print_null() {
        let out = run(&sample_pages(), "showmappings 0 2000");
        assert_eq!(rows(&out)[0], "0000000000000000\tNULL\tNULL");
        assert!(rows(&out)[1].starts_with("0000000000001000\t0000000000007000"));
    }

    #[test]
    fn end_below_begin_prints_only_the_header() {
        let out = run(&sample_pages(), "showmappings 3000 1000");
        assert_eq!(out, "Virtual\tPhysical\tPermission\n");
    }

    #[test]
    fn wrong_argument_count_prints_usage() {
        for line in ["showmappings", "showmappings 1 2 3"] {
            assert_eq!(
                run(&sample_pages(), line),
                "Usage: showmappings BEGIN [END]\n"
            );
        }
    }

    #[test]
    fn malformed_address_prints_no_table() {
        for line in ["showmappings zz", "showmappings 1000 12g", "showmappings 0x"] {
            assert_eq!(run(&sample_pages(), line), "Wrong address!\n");
        }
    }

    #[test]
    fn range_reaches_the_last_page() {
        let out = run(&FakePages::default(), "showmappings fffffffffffff000 ffffffffffffffff");
        assert_eq!(rows(&out), ["fffffffffffff000\tNULL\tNULL"]);

        let range = AddressRange::between(0xffff_ffff_ffff_0000, u64::MAX);
        assert_eq!(range.pages, 16);
        assert_eq!(range.iter().last(), Some(0xffff_ffff_ffff_f000));
    }

    #[test]
    fn range_arithmetic() {
        assert_eq!(AddressRange::single(0x1fff), AddressRange { begin: 0x1000, pages: 1 });
        assert_eq!(AddressRange::between(0x1000, 0x3000).pages, 2);
        assert_eq!(AddressRange::between(0x1800, 0x1801).pages, 1);
        assert_eq!(AddressRange::between(0x1800, 0x1000).pages, 0);
        assert_eq!(AddressRange::between(0x1000, 0x1000).pages, 0);
    }

    #[test]
    fn permission_string_for_each_flag() {
        assert_eq!(format!("{}", Permissions(P | W)), "P/X/W");
        assert_eq!(format!("{}", Permissions(P | U)), "P/U/X");
        assert_eq!(format!("{}", Permissions(PageTableFlags::empty())), "X/X/X");
        // Bits outside the list do not show.
        assert_eq!(
            format!("{}", Permissions(P | PageTableFlags::NO_EXECUTE)),
            "P/X/X"
        );
    }
}
