//! 32-bit protected-mode GDT and TSS.
//!
//! The teacher builds its segment/task tables from the `x86_64` crate's
//! `GlobalDescriptorTable`/`TaskStateSegment` types, which encode 64-bit
//! descriptor formats. Those formats don't exist in protected mode: a
//! 32-bit flat GDT uses 8-byte code/data descriptors and a 104-byte TSS, so
//! the table and its entries are hand-packed here instead, the same flat
//! kernel/user split the teacher's GDT expresses (null, kernel code,
//! kernel data, user code, user data) plus a TSS descriptor for ring
//! transitions.

use core::arch::asm;
use core::mem::size_of;

use spin::Mutex;

pub const KERNEL_CODE_SELECTOR: u16 = 0x08;
pub const KERNEL_DATA_SELECTOR: u16 = 0x10;
pub const USER_CODE_SELECTOR: u16 = 0x18 | 3;
pub const USER_DATA_SELECTOR: u16 = 0x20 | 3;
pub const TSS_SELECTOR: u16 = 0x28;

const NUM_GDT_ENTRIES: usize = 6;

#[derive(Clone, Copy)]
#[repr(C, packed)]
struct GdtEntry {
    limit_low: u16,
    base_low: u16,
    base_mid: u8,
    access: u8,
    limit_high_flags: u8,
    base_high: u8,
}

impl GdtEntry {
    const fn null() -> Self {
        GdtEntry {
            limit_low: 0,
            base_low: 0,
            base_mid: 0,
            access: 0,
            limit_high_flags: 0,
            base_high: 0,
        }
    }

    const fn new(base: u32, limit: u32, access: u8, flags: u8) -> Self {
        GdtEntry {
            limit_low: (limit & 0xffff) as u16,
            base_low: (base & 0xffff) as u16,
            base_mid: ((base >> 16) & 0xff) as u8,
            access,
            limit_high_flags: (((limit >> 16) & 0x0f) as u8) | (flags << 4),
            base_high: ((base >> 24) & 0xff) as u8,
        }
    }
}

#[repr(C, packed)]
struct GdtPointer {
    limit: u16,
    base: u32,
}

/// Flat protected-mode Task State Segment. The kernel only ever fills in
/// `esp0`/`ss0`; every other field stays zero because this kernel performs
/// software task switches (§9) rather than hardware task gates.
#[derive(Clone, Copy)]
#[repr(C, packed)]
pub struct Tss {
    prev_task_link: u16,
    reserved0: u16,
    pub esp0: u32,
    pub ss0: u16,
    reserved1: u16,
    esp1: u32,
    ss1: u16,
    reserved2: u16,
    esp2: u32,
    ss2: u16,
    reserved3: u16,
    cr3: u32,
    eip: u32,
    eflags: u32,
    eax: u32,
    ecx: u32,
    edx: u32,
    ebx: u32,
    esp: u32,
    ebp: u32,
    esi: u32,
    edi: u32,
    es: u16,
    reserved4: u16,
    cs: u16,
    reserved5: u16,
    ss: u16,
    reserved6: u16,
    ds: u16,
    reserved7: u16,
    fs: u16,
    reserved8: u16,
    gs: u16,
    reserved9: u16,
    ldt_selector: u16,
    reserved10: u16,
    trap: u16,
    iomap_base: u16,
}

impl Tss {
    const fn new() -> Self {
        Tss {
            prev_task_link: 0,
            reserved0: 0,
            esp0: 0,
            ss0: 0,
            reserved1: 0,
            esp1: 0,
            ss1: 0,
            reserved2: 0,
            esp2: 0,
            ss2: 0,
            reserved3: 0,
            cr3: 0,
            eip: 0,
            eflags: 0,
            eax: 0,
            ecx: 0,
            edx: 0,
            ebx: 0,
            esp: 0,
            ebp: 0,
            esi: 0,
            edi: 0,
            es: 0,
            reserved4: 0,
            cs: 0,
            reserved5: 0,
            ss: 0,
            reserved6: 0,
            ds: 0,
            reserved7: 0,
            fs: 0,
            reserved8: 0,
            gs: 0,
            reserved9: 0,
            ldt_selector: 0,
            reserved10: 0,
            trap: 0,
            iomap_base: size_of::<Tss>() as u16,
        }
    }
}

static TSS: Mutex<Tss> = Mutex::new(Tss::new());
static mut GDT: [GdtEntry; NUM_GDT_ENTRIES] = [GdtEntry::null(); NUM_GDT_ENTRIES];

const ACCESS_KERNEL_CODE: u8 = 0x9a;
const ACCESS_KERNEL_DATA: u8 = 0x92;
const ACCESS_USER_CODE: u8 = 0xfa;
const ACCESS_USER_DATA: u8 = 0xf2;
const ACCESS_TSS: u8 = 0x89;
const FLAGS_32BIT_PAGE_GRANULAR: u8 = 0b1100;
const FLAGS_BYTE_GRANULAR: u8 = 0b0000;

/// Build the GDT, load it with `lgdt`, load the TSS with `ltr`, and reload
/// every segment register to the new flat selectors.
///
/// # Safety
/// Must run once, early in boot, before any user-mode transition and
/// before segment registers are trusted to hold meaningful selectors.
pub unsafe fn init() {
    {
        let tss = TSS.lock();
        let tss_base = &*tss as *const Tss as u32;
        let tss_limit = (size_of::<Tss>() - 1) as u32;

        GDT[0] = GdtEntry::null();
        GDT[1] = GdtEntry::new(0, 0xfffff, ACCESS_KERNEL_CODE, FLAGS_32BIT_PAGE_GRANULAR);
        GDT[2] = GdtEntry::new(0, 0xfffff, ACCESS_KERNEL_DATA, FLAGS_32BIT_PAGE_GRANULAR);
        GDT[3] = GdtEntry::new(0, 0xfffff, ACCESS_USER_CODE, FLAGS_32BIT_PAGE_GRANULAR);
        GDT[4] = GdtEntry::new(0, 0xfffff, ACCESS_USER_DATA, FLAGS_32BIT_PAGE_GRANULAR);
        GDT[5] = GdtEntry::new(tss_base, tss_limit, ACCESS_TSS, FLAGS_BYTE_GRANULAR);
    }

    let gdt_ptr = GdtPointer {
        limit: (size_of::<[GdtEntry; NUM_GDT_ENTRIES]>() - 1) as u16,
        base: core::ptr::addr_of!(GDT) as u32,
    };

    asm!(
        "lgdt [{0}]",
        in(reg) &gdt_ptr,
        options(readonly, nostack, preserves_flags)
    );

    reload_segments();

    let tr = TSS_SELECTOR;
    asm!("ltr {0:x}", in(reg) tr, options(nostack, preserves_flags));
}

unsafe fn reload_segments() {
    asm!(
        "push {code_sel}",
        "lea {tmp}, [1f]",
        "push {tmp}",
        "retf",
        "1:",
        "mov ax, {data_sel:x}",
        "mov ds, ax",
        "mov es, ax",
        "mov fs, ax",
        "mov gs, ax",
        "mov ss, ax",
        code_sel = in(reg) KERNEL_CODE_SELECTOR as u32,
        data_sel = in(reg) KERNEL_DATA_SELECTOR,
        tmp = out(reg) _,
        out("ax") _,
        options(nostack)
    );
}

/// Record the kernel-mode stack top a ring-3 task should resume on after
/// the next interrupt/syscall into ring 0 (§4.9 ISR discipline).
pub fn set_kernel_stack(esp0: u32) {
    TSS.lock().esp0 = esp0;
}

pub fn kernel_stack() -> u32 {
    TSS.lock().esp0
}
