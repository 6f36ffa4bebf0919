//! Paging manager (C2).
//!
//! One page directory plus three page tables per pid (table slot 0 is the
//! low 4 MiB kernel identity region, slot 1 is reserved for vidmap, slot 2
//! is spare), ported from `paging.c`'s `page_data_t`/`map_4mb_page`/
//! `map_4kb_page`/`load_pages`. Kept as a flat per-pid array rather than
//! the teacher's higher-half 4-level tables (`mm/`'s `VirtualAddress`/
//! frame allocator design is long-mode only); see DESIGN.md.

use core::arch::asm;

use crate::config::{
    HEAP_VIRTUAL_BASE, MAX_PROCESSES, PROGRAM_IMAGE_PHYSICAL_BASE, PROGRAM_IMAGE_SIZE,
    PROGRAM_IMAGE_VIRTUAL, STORAGE_BYTES,
};

pub const FOUR_KB: usize = 4 * 1024;
pub const FOUR_MB: usize = 4 * 1024 * 1024;
pub const ENTRIES_PER_TABLE: usize = 1024;
pub const NUM_PAGE_TABLES: usize = 3;
pub const KERNEL_TABLE_SLOT: usize = 0;
pub const VIDMAP_TABLE_SLOT: usize = 1;

#[derive(Clone, Copy)]
pub enum Privilege {
    Kernel = 0,
    User = 3,
}

#[derive(Clone, Copy, Default)]
#[repr(transparent)]
struct PageDirEntry(u32);

#[derive(Clone, Copy, Default)]
#[repr(transparent)]
struct PageTableEntry(u32);

/// 4 KiB-page-table-present directory entry: present, r/w, user, 4 KiB.
const PDE_4KB_KERNEL_FLAGS: u32 = 0x01F;
const PDE_4MB_KERNEL_FLAGS: u32 = 0x09B;
const PDE_4MB_USER_FLAGS: u32 = 0x09F;
const PTE_FLAGS: u32 = 0x01F;

#[repr(C, align(4096))]
struct PageData {
    pd: [PageDirEntry; ENTRIES_PER_TABLE],
    pt: [[PageTableEntry; ENTRIES_PER_TABLE]; NUM_PAGE_TABLES],
}

impl PageData {
    const fn empty() -> Self {
        PageData {
            pd: [PageDirEntry(0); ENTRIES_PER_TABLE],
            pt: [[PageTableEntry(0); ENTRIES_PER_TABLE]; NUM_PAGE_TABLES],
        }
    }
}

static mut PAGE_TABLES: [PageData; MAX_PROCESSES] =
    [const { PageData::empty() }; MAX_PROCESSES];

fn table(pid: usize) -> &'static mut PageData {
    // SAFETY: each pid owns a disjoint slot; callers only ever mutate the
    // slot for the pid currently being set up or switched to, under the
    // kernel's single-threaded mutation discipline (§5).
    unsafe { &mut (*core::ptr::addr_of_mut!(PAGE_TABLES))[pid] }
}

/// Map a 4 MiB page (`virtual_addr / 4 MiB` selects the directory entry).
pub fn map_4mb(physical: usize, virtual_addr: usize, pid: usize, privilege: Privilege) {
    let index = virtual_addr / FOUR_MB;
    let flags = match privilege {
        Privilege::Kernel => PDE_4MB_KERNEL_FLAGS,
        Privilege::User => PDE_4MB_USER_FLAGS,
    };
    table(pid).pd[index] = PageDirEntry((physical as u32) | flags);
}

/// Map a 4 KiB page within page-table slot `table_slot` (§4.2:
/// "sets the page-directory entry at `virtual / 4 MiB` to point at
/// page-table-slot `table_slot`... and the PTE at
/// `(virtual mod 4 MiB) / 4 KiB` to (physical, flags)").
pub fn map_4kb(
    physical: usize,
    virtual_addr: usize,
    pid: usize,
    _privilege: Privilege,
    table_slot: usize,
) {
    let pd_index = virtual_addr / FOUR_MB;
    let pt_index = (virtual_addr % FOUR_MB) / FOUR_KB;

    let t = table(pid);
    let pt_addr = core::ptr::addr_of!(t.pt[table_slot]) as u32;
    t.pd[pd_index] = PageDirEntry(pt_addr | PDE_4KB_KERNEL_FLAGS);
    t.pt[table_slot][pt_index] = PageTableEntry((physical as u32) | PTE_FLAGS);
}

/// Clear every directory entry pointing at `table_slot` and every entry
/// within it, so the slot can be remapped to somewhere else (used when a
/// pid slot is reused by a new `execute`).
pub fn clear_page_table(pid: usize, table_slot: usize) {
    let t = table(pid);
    let pt_phys = core::ptr::addr_of!(t.pt[table_slot]) as u32;
    for i in 0..ENTRIES_PER_TABLE {
        if (t.pd[i].0 & !0xFFF) == (pt_phys & !0xFFF) {
            t.pd[i] = PageDirEntry(0);
        }
        t.pt[table_slot][i] = PageTableEntry(0);
    }
}

/// Load pid's page directory into CR3, flushing the TLB.
///
/// # Safety
/// The pid's directory must already describe a coherent address space
/// (kernel identity regions + this pid's program image, per `init`).
pub unsafe fn load(pid: usize) {
    let pd_addr = core::ptr::addr_of!(table(pid).pd) as u32;
    asm!("mov cr3, {0}", in(reg) pd_addr, options(nostack, preserves_flags));
}

/// Build every pid's address space per §4.2 and load pid 0 (the kernel).
///
/// # Safety
/// Must run once, early in boot, before the heap or any user program is
/// touched. Must run before [`enable`].
pub unsafe fn init() {
    enable_pse_and_wp();

    let storage_pages = STORAGE_BYTES.div_ceil(FOUR_MB);

    for pid in 0..MAX_PROCESSES {
        for j in 1..ENTRIES_PER_TABLE {
            let addr = j * FOUR_KB;
            map_4kb(addr, addr, pid, Privilege::Kernel, KERNEL_TABLE_SLOT);
        }

        map_4mb(FOUR_MB, FOUR_MB, pid, Privilege::Kernel);

        for page_num in 0..storage_pages {
            let addr = HEAP_VIRTUAL_BASE + page_num * FOUR_MB;
            map_4mb(addr, addr, pid, Privilege::Kernel);
        }
    }

    for pid in 1..MAX_PROCESSES {
        let program_phys = PROGRAM_IMAGE_PHYSICAL_BASE + (pid - 1) * PROGRAM_IMAGE_SIZE;
        map_4mb(program_phys, program_phys, 0, Privilege::Kernel);
        map_4mb(program_phys, program_phys, pid, Privilege::Kernel);
        map_4mb(program_phys, PROGRAM_IMAGE_VIRTUAL, pid, Privilege::User);
    }

    load(0);
}

unsafe fn enable_pse_and_wp() {
    asm!(
        "mov eax, cr0",
        "or eax, 0x10000",
        "mov cr0, eax",
        "mov eax, cr4",
        "or eax, 0x90",
        "mov cr4, eax",
        out("eax") _,
        options(nostack, preserves_flags)
    );
}

/// Turn on paging (CR0.PG). Separate from `init` so the kernel can finish
/// identity-mapping everything before the MMU is actually consulted.
///
/// # Safety
/// [`init`] must have already run and pid 0's directory must be loaded.
pub unsafe fn enable() {
    asm!(
        "mov eax, cr0",
        "or eax, 0x80000000",
        "mov cr0, eax",
        out("eax") _,
        options(nostack, preserves_flags)
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_kb_mapping_computes_expected_indices() {
        let virtual_addr = FOUR_MB + 3 * FOUR_KB;
        assert_eq!(virtual_addr / FOUR_MB, 1);
        assert_eq!((virtual_addr % FOUR_MB) / FOUR_KB, 3);
    }
}
