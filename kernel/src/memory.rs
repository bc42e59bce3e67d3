//! Memory layout and page-table inspection
//!
//! The monitor never walks page tables by hand. It asks a [`PageResolver`]
//! for the leaf translation of one virtual page; the kernel's resolver is the
//! `x86_64` crate's [`OffsetPageTable`], reached through the direct physical
//! memory window at `PHYS_OFFSET`.

use x86_64::registers::control::Cr3;
use x86_64::structures::paging::mapper::TranslateResult;
use x86_64::structures::paging::page_table::PageTableEntry;
use x86_64::structures::paging::{
    OffsetPageTable, PageTable, PageTableFlags, PhysFrame, Size4KiB, Translate,
};
use x86_64::{PhysAddr, VirtAddr};

pub use kmon_shared::constants::memory::{KERNEL_VIRTUAL_BASE, PAGE_SIZE, PHYS_OFFSET};

/// Round `addr` down to a multiple of `align` (a power of two).
pub const fn round_down(addr: u64, align: u64) -> u64 {
    addr & !(align - 1)
}

/// Round `addr` up to a multiple of `align` (a power of two).
///
/// Returns `None` when the result does not fit in 64 bits.
pub const fn round_up(addr: u64, align: u64) -> Option<u64> {
    match addr.checked_add(align - 1) {
        Some(v) => Some(round_down(v, align)),
        None => None,
    }
}

/// Leaf translation of one virtual page.
#[derive(Debug, Clone)]
pub struct PageLookup {
    /// 4 KiB physical frame backing the page (inside a huge frame if the
    /// mapping uses one)
    pub frame: PhysFrame<Size4KiB>,
    /// Copy of the leaf entry; its flags carry the access permissions
    pub entry: PageTableEntry,
}

impl PageLookup {
    pub fn new(frame: PhysFrame<Size4KiB>, flags: PageTableFlags) -> Self {
        let mut entry = PageTableEntry::new();
        entry.set_addr(frame.start_address(), flags);
        Self { frame, entry }
    }

    pub fn phys_addr(&self) -> PhysAddr {
        self.frame.start_address()
    }

    pub fn flags(&self) -> PageTableFlags {
        self.entry.flags()
    }
}

/// Resolves a virtual page of the inspected address space.
pub trait PageResolver {
    /// Leaf translation for the page containing `va`, or `None` when no page
    /// backs it (including non-canonical addresses).
    fn lookup(&self, va: u64) -> Option<PageLookup>;
}

impl PageResolver for OffsetPageTable<'_> {
    fn lookup(&self, va: u64) -> Option<PageLookup> {
        let addr = VirtAddr::try_new(va).ok()?;
        match self.translate(addr) {
            TranslateResult::Mapped {
                frame,
                offset,
                flags,
            } => {
                let page_start = frame.start_address() + round_down(offset, PAGE_SIZE);
                Some(PageLookup::new(
                    PhysFrame::containing_address(page_start),
                    flags,
                ))
            }
            _ => None,
        }
    }
}

/// Build a resolver over the page tables that are live in CR3.
///
/// # Safety
/// All of physical memory must be mapped at `phys_offset`, and the returned
/// table must not outlive that mapping or coexist with a mutable user of the
/// same tables.
pub unsafe fn active_page_table(phys_offset: VirtAddr) -> OffsetPageTable<'static> {
    let (level_4_frame, _) = Cr3::read();
    let virt = phys_offset + level_4_frame.start_address().as_u64();
    let level_4_table = &mut *virt.as_mut_ptr::<PageTable>();
    OffsetPageTable::new(level_4_table, phys_offset)
}

/// Addresses of the kernel image as reported by `kerninfo`.
///
/// `start` is the physical load address of the boot entry; every other field
/// is a higher-half virtual address that maps to `virt - virtual_base`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelLayout {
    pub start: u64,
    pub entry: u64,
    pub etext: u64,
    pub edata: u64,
    pub end: u64,
    pub virtual_base: u64,
}

impl KernelLayout {
    pub const fn to_phys(&self, va: u64) -> u64 {
        va.wrapping_sub(self.virtual_base)
    }

    /// Size of the loaded image (`entry..end`) in KiB, rounded up.
    pub fn footprint_kib(&self) -> u64 {
        let size = self.end.saturating_sub(self.entry);
        round_up(size, 1024).map_or(size / 1024 + 1, |bytes| bytes / 1024)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use alloc::boxed::Box;
    use alloc::collections::BTreeMap;

    /// In-memory resolver keyed by page address.
    #[derive(Default)]
    pub(crate) struct FakePages {
        pub pages: BTreeMap<u64, (u64, PageTableFlags)>,
    }

    impl FakePages {
        pub fn map(&mut self, va: u64, pa: u64, flags: PageTableFlags) {
            self.pages.insert(va, (pa, flags));
        }
    }

    impl PageResolver for FakePages {
        fn lookup(&self, va: u64) -> Option<PageLookup> {
            let &(pa, flags) = self.pages.get(&round_down(va, PAGE_SIZE))?;
            Some(PageLookup::new(
                PhysFrame::containing_address(PhysAddr::new(pa)),
                flags,
            ))
        }
    }

    #[test]
    fn rounding_is_exact_on_aligned_input() {
        assert_eq!(round_down(0x1000, PAGE_SIZE), 0x1000);
        assert_eq!(round_down(0x1fff, PAGE_SIZE), 0x1000);
        assert_eq!(round_up(0x1000, PAGE_SIZE), Some(0x1000));
        assert_eq!(round_up(0x1001, PAGE_SIZE), Some(0x2000));
        assert_eq!(round_up(0, PAGE_SIZE), Some(0));
        assert_eq!(round_up(u64::MAX, PAGE_SIZE), None);
    }

    #[test]
    fn footprint_rounds_up_to_kib() {
        let layout = KernelLayout {
            start: 0x10_0000,
            entry: KERNEL_VIRTUAL_BASE + 0x10_0000,
            etext: KERNEL_VIRTUAL_BASE + 0x10_4000,
            edata: KERNEL_VIRTUAL_BASE + 0x11_0000,
            end: KERNEL_VIRTUAL_BASE + 0x11_0001,
            virtual_base: KERNEL_VIRTUAL_BASE,
        };
        assert_eq!(layout.footprint_kib(), 65);
        assert_eq!(layout.to_phys(layout.etext), 0x10_4000);
    }

    fn table_addr(table: &PageTable) -> PhysAddr {
        PhysAddr::new(table as *const PageTable as u64)
    }

    /// Real four-level tables in host memory, walked with a zero offset.
    #[test]
    fn offset_page_table_resolves_leaf_entries() {
        let mut l4 = Box::new(PageTable::new());
        let mut l3 = Box::new(PageTable::new());
        let mut l2 = Box::new(PageTable::new());
        let mut l1 = Box::new(PageTable::new());
        let table = PageTableFlags::PRESENT | PageTableFlags::WRITABLE;

        let va = VirtAddr::new(0x40_1000);
        let (l3_pa, l2_pa, l1_pa) = (table_addr(&l3), table_addr(&l2), table_addr(&l1));
        l4[va.p4_index()].set_addr(l3_pa, table);
        l3[va.p3_index()].set_addr(l2_pa, table);
        l2[va.p2_index()].set_addr(l1_pa, table);
        l1[va.p1_index()].set_addr(
            PhysAddr::new(0x7000),
            PageTableFlags::PRESENT | PageTableFlags::WRITABLE,
        );
        let next = VirtAddr::new(0x40_2000);
        l1[next.p1_index()].set_addr(
            PhysAddr::new(0x9000),
            PageTableFlags::PRESENT | PageTableFlags::USER_ACCESSIBLE,
        );

        let resolver = unsafe { OffsetPageTable::new(&mut l4, VirtAddr::new(0)) };

        let hit = resolver.lookup(0x40_1abc).expect("mapped page");
        assert_eq!(hit.phys_addr(), PhysAddr::new(0x7000));
        assert!(hit.flags().contains(PageTableFlags::WRITABLE));
        assert!(!hit.flags().contains(PageTableFlags::USER_ACCESSIBLE));

        let user = resolver.lookup(0x40_2000).expect("mapped page");
        assert_eq!(user.phys_addr(), PhysAddr::new(0x9000));
        assert!(user.flags().contains(PageTableFlags::USER_ACCESSIBLE));

        assert!(resolver.lookup(0x40_3000).is_none());
        assert!(resolver.lookup(0x8000_0000).is_none());
        assert!(resolver.lookup(0x0000_8000_0000_0000).is_none());
    }

    #[test]
    fn huge_pages_resolve_to_the_inner_4k_frame() {
        let mut l4 = Box::new(PageTable::new());
        let mut l3 = Box::new(PageTable::new());
        let mut l2 = Box::new(PageTable::new());
        let table = PageTableFlags::PRESENT | PageTableFlags::WRITABLE;

        let va = VirtAddr::new(0x20_0000);
        let (l3_pa, l2_pa) = (table_addr(&l3), table_addr(&l2));
        l4[va.p4_index()].set_addr(l3_pa, table);
        l3[va.p3_index()].set_addr(l2_pa, table);
        l2[va.p2_index()].set_addr(
            PhysAddr::new(0x4000_0000),
            PageTableFlags::PRESENT | PageTableFlags::HUGE_PAGE,
        );

        let resolver = unsafe { OffsetPageTable::new(&mut l4, VirtAddr::new(0)) };
        let hit = resolver.lookup(0x20_3000).expect("inside huge page");
        assert_eq!(hit.phys_addr(), PhysAddr::new(0x4000_3000));
        assert!(!hit.flags().contains(PageTableFlags::WRITABLE));
    }
}
