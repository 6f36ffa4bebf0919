//! Power-off stub (§11, `shutdown.c`). The original writes `0x2000` to port
//! `0xb004`, the QEMU-specific "isa-debug-exit"-style shutdown port; that
//! exact sequence is preserved here since it costs nothing to keep and is
//! what actually powers off under QEMU.

use crate::arch::x86::ports::Port;

const QEMU_SHUTDOWN_PORT: u16 = 0xb004;
const QEMU_SHUTDOWN_VALUE: u16 = 0x2000;

/// # Safety
/// Only meaningful as the last action the kernel ever takes; does not
/// return under QEMU, may be a no-op on real hardware without ACPI.
pub unsafe fn off() -> ! {
    let mut port: Port<u16> = Port::new(QEMU_SHUTDOWN_PORT);
    port.write(QEMU_SHUTDOWN_VALUE);
    crate::arch::halt();
}
