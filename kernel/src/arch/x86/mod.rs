//! 32-bit protected-mode x86 architecture backend.

pub mod context;
pub mod gdt;
pub mod idt;
pub mod interrupts;
pub mod multiboot;
pub mod ports;
pub mod serial;
pub mod vga;

/// Bring up segmentation and the interrupt table. Must run before any
/// other subsystem touches interrupts, the TSS, or user-mode selectors.
///
/// # Safety
/// Must be called exactly once, very early in `kernel_main`, with
/// interrupts still disabled.
pub unsafe fn init() {
    gdt::init();
    idt::init();
}

pub fn halt() -> ! {
    loop {
        interrupts::disable();
        unsafe {
            core::arch::asm!("hlt", options(nomem, nostack));
        }
    }
}
