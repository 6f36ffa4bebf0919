//! `#[no_std]` test harness: serial output plus the QEMU isa-debug-exit
//! device in place of a process exit code, since there is no host OS here
//! to report one to.
//!
//! The teacher leans on the `x86_64` crate's `Port<u32>` for the exit
//! write; this kernel has its own 32-bit-only [`crate::arch::x86::ports`]
//! instead (see DESIGN.md), so [`exit_qemu`] uses that.

use core::panic::PanicInfo;

use crate::arch::x86::ports::Port;
use crate::error::KernelError;
use crate::{serial_print, serial_println};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum QemuExitCode {
    Success = 0x10,
    Failed = 0x11,
}

/// Every `#[test_case]` item is a zero-argument closure returning
/// `Result<(), KernelError>`, so a failing assertion inside kernel code can
/// report which subsystem's error it was rather than just panicking.
pub trait Testable {
    fn run(&self) -> Result<(), KernelError>;
}

impl<T> Testable for T
where
    T: Fn() -> Result<(), KernelError>,
{
    fn run(&self) -> Result<(), KernelError> {
        serial_print!("{}...\t", core::any::type_name::<T>());
        match self() {
            Ok(()) => {
                serial_println!("[ok]");
                Ok(())
            }
            Err(e) => {
                serial_println!("[failed]: {}", e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
pub fn test_runner(tests: &[&dyn Testable]) -> ! {
    serial_println!("Running {} tests", tests.len());
    let mut passed = 0;
    let mut failed = 0;

    for test in tests {
        match test.run() {
            Ok(()) => passed += 1,
            Err(_) => failed += 1,
        }
    }

    serial_println!("\nTest Results: {} passed, {} failed", passed, failed);
    if failed == 0 {
        exit_qemu(QemuExitCode::Success);
    } else {
        exit_qemu(QemuExitCode::Failed);
    }
}

pub fn test_panic_handler(info: &PanicInfo) -> ! {
    serial_println!("[failed]\n");
    serial_println!("Error: {}\n", info);
    exit_qemu(QemuExitCode::Failed);
}

const QEMU_EXIT_PORT: u16 = 0xf4;

/// # Safety (in effect, not in signature)
/// Only meaningful under the `isa-debug-exit` device QEMU is invoked with
/// for this kernel's test runs; on real hardware the port write is inert.
pub fn exit_qemu(exit_code: QemuExitCode) -> ! {
    unsafe {
        let mut port: Port<u32> = Port::new(QEMU_EXIT_PORT);
        port.write(exit_code as u32);
    }
    loop {
        core::hint::spin_loop();
    }
}
