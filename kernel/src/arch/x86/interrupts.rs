//! CPU interrupt-flag control.
//!
//! Replaces `x86_64::instructions::interrupts` for the 32-bit target: the
//! same `cli`/`sti`/`pushfd`+`popfd` sequences apply unchanged in protected
//! mode, so this is a direct reimplementation rather than a new technique.

use core::arch::asm;

/// # Safety
/// Disables maskable interrupts on this CPU. Safe to call at any time;
/// pairs with [`enable`].
#[inline]
pub fn disable() {
    unsafe {
        asm!("cli", options(nomem, nostack));
    }
}

/// # Safety
/// Enables maskable interrupts on this CPU.
#[inline]
pub fn enable() {
    unsafe {
        asm!("sti", options(nomem, nostack));
    }
}

/// Read EFLAGS.IF without side effects.
#[inline]
pub fn are_enabled() -> bool {
    let flags: u32;
    unsafe {
        asm!("pushfd", "pop {0}", out(reg) flags, options(nomem, preserves_flags));
    }
    flags & (1 << 9) != 0
}

/// Run `f` with interrupts disabled, restoring the prior IF state
/// afterward instead of unconditionally re-enabling it. Mirrors the
/// teacher's `without_interrupts` helper, which the VGA and serial writers
/// wrap every print call in to avoid a keyboard or timer ISR deadlocking on
/// the same spinlock.
pub fn without_interrupts<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    let was_enabled = are_enabled();
    if was_enabled {
        disable();
    }
    let result = f();
    if was_enabled {
        enable();
    }
    result
}
