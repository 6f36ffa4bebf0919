//! 32-bit protected-mode Interrupt Descriptor Table (C9).
//!
//! The teacher builds its IDT from `x86_64::structures::idt`, whose gate
//! descriptors and `InterruptStackFrame` layout are 64-bit only. There is
//! no 32-bit equivalent crate in this corpus, so the table is hand-packed
//! here; handlers still use the compiler's `extern "x86-interrupt"` ABI
//! (supported on i686 as well as x86_64) so the prologue/epilogue that
//! saves caller-save registers and pops the hardware-pushed frame on
//! `iretd` is generated by rustc rather than hand-written asm, matching
//! how the teacher's handler bodies read.
//!
//! Gate layout follows §4.9 exactly: slots 0-31 are CPU exceptions, 0x20/
//! 0x21/0x25/0x26/0x28/0x2C are hardware ISRs at DPL 0, and 0x80 is the
//! syscall gate at DPL 3.

use core::mem::size_of;

use crate::drivers::pic::PICS;
use crate::{println, serial_println};

pub const PIT_VECTOR: u8 = 0x20;
pub const KEYBOARD_VECTOR: u8 = 0x21;
pub const SB16_VECTOR: u8 = 0x25;
pub const FLOPPY_VECTOR: u8 = 0x26;
pub const RTC_VECTOR: u8 = 0x28;
pub const MOUSE_VECTOR: u8 = 0x2c;
pub const SYSCALL_VECTOR: u8 = 0x80;

const NUM_IDT_ENTRIES: usize = 256;

#[repr(C)]
pub struct InterruptStackFrame {
    pub eip: u32,
    pub cs: u32,
    pub eflags: u32,
}

#[derive(Clone, Copy)]
#[repr(C, packed)]
struct IdtEntry {
    offset_low: u16,
    selector: u16,
    zero: u8,
    type_attr: u8,
    offset_high: u16,
}

impl IdtEntry {
    const fn missing() -> Self {
        IdtEntry {
            offset_low: 0,
            selector: 0,
            zero: 0,
            type_attr: 0,
            offset_high: 0,
        }
    }

    fn new(handler: u32, dpl: u8, present_gate_type: u8) -> Self {
        IdtEntry {
            offset_low: (handler & 0xffff) as u16,
            selector: super::gdt::KERNEL_CODE_SELECTOR,
            zero: 0,
            type_attr: present_gate_type | (dpl << 5),
            offset_high: ((handler >> 16) & 0xffff) as u16,
        }
    }
}

#[repr(C, packed)]
struct IdtPointer {
    limit: u16,
    base: u32,
}

const GATE_32BIT_INTERRUPT: u8 = 0b1000_1110;

static mut IDT: [IdtEntry; NUM_IDT_ENTRIES] = [IdtEntry::missing(); NUM_IDT_ENTRIES];

macro_rules! set_gate {
    ($idt:expr, $vector:expr, $handler:expr, $dpl:expr) => {
        $idt[$vector as usize] = IdtEntry::new($handler as u32, $dpl, GATE_32BIT_INTERRUPT);
    };
}

/// # Safety
/// Must run once, early in boot, after [`super::gdt::init`] (gate
/// descriptors reference the kernel code selector) and before interrupts
/// are enabled.
pub unsafe fn init() {
    set_gate!(IDT, 0, divide_error, 0);
    set_gate!(IDT, 3, breakpoint, 0);
    set_gate!(IDT, 6, invalid_opcode, 0);
    set_gate!(IDT, 8, double_fault, 0);
    set_gate!(IDT, 13, general_protection_fault, 0);
    set_gate!(IDT, 14, page_fault, 0);

    set_gate!(IDT, PIT_VECTOR, pit_interrupt, 0);
    set_gate!(IDT, KEYBOARD_VECTOR, keyboard_interrupt, 0);
    set_gate!(IDT, SB16_VECTOR, sb16_interrupt, 0);
    set_gate!(IDT, FLOPPY_VECTOR, floppy_interrupt, 0);
    set_gate!(IDT, RTC_VECTOR, rtc_interrupt, 0);
    set_gate!(IDT, MOUSE_VECTOR, mouse_interrupt, 0);

    set_gate!(IDT, SYSCALL_VECTOR, syscall_interrupt, 3);

    let ptr = IdtPointer {
        limit: (size_of::<[IdtEntry; NUM_IDT_ENTRIES]>() - 1) as u16,
        base: core::ptr::addr_of!(IDT) as u32,
    };

    core::arch::asm!("lidt [{0}]", in(reg) &ptr, options(readonly, nostack, preserves_flags));
}

/// Every slots-0-31 exception handler prints a message and calls `halt(-1)`
/// on the faulting task (§7 kind 3: "the exception handler prints a
/// one-line reason and invokes `halt(-1)`, which transparently returns -1
/// from the parent's `execute`"). None of these are recoverable in this
/// design, so control never returns to the faulting instruction.
macro_rules! exception_handler {
    ($name:ident, $msg:literal) => {
        extern "x86-interrupt" fn $name(frame: InterruptStackFrame) {
            serial_println!("EXCEPTION: {} @ eip={:#x}", $msg, { frame.eip });
            println!("EXCEPTION: {}", $msg);
            crate::syscall::halt_with(-1);
        }
    };
}

exception_handler!(divide_error, "DIVIDE ERROR");
exception_handler!(breakpoint, "BREAKPOINT");
exception_handler!(invalid_opcode, "INVALID OPCODE");

/// A double fault means the kernel itself (not a user task) is in an
/// unrecoverable state — there is no well-defined "parent" to return -1
/// to, so this is the one exception that still halts the whole CPU.
extern "x86-interrupt" fn double_fault(frame: InterruptStackFrame, _error_code: u32) -> ! {
    serial_println!("EXCEPTION: DOUBLE FAULT @ eip={:#x}", { frame.eip });
    println!("EXCEPTION: DOUBLE FAULT");
    crate::arch::halt();
}

extern "x86-interrupt" fn general_protection_fault(frame: InterruptStackFrame, error_code: u32) {
    serial_println!(
        "EXCEPTION: GENERAL PROTECTION FAULT code={:#x} eip={:#x}",
        error_code,
        { frame.eip }
    );
    println!("EXCEPTION: GENERAL PROTECTION FAULT");
    crate::syscall::halt_with(-1);
}

extern "x86-interrupt" fn page_fault(frame: InterruptStackFrame, error_code: u32) {
    let faulting_address: u32;
    unsafe {
        core::arch::asm!("mov {0}, cr2", out(reg) faulting_address, options(nomem, nostack, preserves_flags));
    }
    serial_println!(
        "EXCEPTION: PAGE FAULT addr={:#x} code={:#x} eip={:#x}",
        faulting_address,
        error_code,
        { frame.eip }
    );
    println!("EXCEPTION: PAGE FAULT");
    crate::syscall::halt_with(-1);
}

extern "x86-interrupt" fn pit_interrupt(_frame: InterruptStackFrame) {
    crate::drivers::pit::tick();
    // EOI must be sent before `on_timer_tick()`: a real context switch
    // transfers control into another task's continuation and never
    // returns here, so anything after this call would only run on ticks
    // that don't switch tasks, leaving IRQ0 un-acked at the PIC and
    // masking all further timer interrupts (pit.c:84 vs 87).
    PICS.lock().notify_end_of_interrupt(PIT_VECTOR);
    crate::sched::scheduler::on_timer_tick();
}

extern "x86-interrupt" fn keyboard_interrupt(_frame: InterruptStackFrame) {
    crate::terminal::keyboard::on_scancode();
    PICS.lock().notify_end_of_interrupt(KEYBOARD_VECTOR);
}

extern "x86-interrupt" fn rtc_interrupt(_frame: InterruptStackFrame) {
    crate::drivers::rtc::on_tick();
    PICS.lock().notify_end_of_interrupt(RTC_VECTOR);
}

extern "x86-interrupt" fn mouse_interrupt(_frame: InterruptStackFrame) {
    crate::drivers::mouse::on_byte();
    PICS.lock().notify_end_of_interrupt(MOUSE_VECTOR);
}

extern "x86-interrupt" fn floppy_interrupt(_frame: InterruptStackFrame) {
    PICS.lock().notify_end_of_interrupt(FLOPPY_VECTOR);
}

extern "x86-interrupt" fn sb16_interrupt(_frame: InterruptStackFrame) {
    PICS.lock().notify_end_of_interrupt(SB16_VECTOR);
}

/// `int 0x80` entry. The actual argument marshalling (eax = call number,
/// ebx/ecx/edx = args) happens in [`super::context`] via a naked trampoline
/// that preserves the full register file before calling into
/// [`crate::syscall::dispatch`]; this handler exists only so the gate has
/// a DPL-3 descriptor to point at.
extern "x86-interrupt" fn syscall_interrupt(_frame: InterruptStackFrame) {
    crate::arch::x86::context::handle_syscall_interrupt();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idt_entry_size_matches_hardware_layout() {
        assert_eq!(size_of::<IdtEntry>(), 8);
    }
}
