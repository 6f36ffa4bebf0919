//! 8259 PIC remapping (external interface, §6). Register-level programming
//! only; which vectors get unmasked and what happens on each IRQ lives in
//! `crate::arch::x86::idt`.

use pic8259::ChainedPics;
use spin::Mutex;

use crate::arch::x86::idt::PIT_VECTOR;

const PIC_1_OFFSET: u8 = PIT_VECTOR;
const PIC_2_OFFSET: u8 = PIC_1_OFFSET + 8;

pub static PICS: Mutex<ChainedPics> =
    Mutex::new(unsafe { ChainedPics::new(PIC_1_OFFSET, PIC_2_OFFSET) });

/// # Safety
/// Must run once, early in boot, with interrupts disabled.
pub unsafe fn init() {
    PICS.lock().initialize();
}
