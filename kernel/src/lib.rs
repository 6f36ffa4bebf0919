//! protOS kernel library.
//!
//! Exposes every subsystem as a `pub mod` so `src/main.rs` (the bare-metal
//! binary) and the bare-metal `tests/*.rs` integration harnesses link
//! against the same code, and so `cargo test --lib` can run the host-target
//! unit tests that are sprinkled through each module's own `#[cfg(test)]
//! mod tests`.
//!
//! Unlike the teacher, this kernel never allocates (every fixed-capacity
//! pool in [`config`] is a plain array, no `Vec`/`Box` anywhere), so there
//! is no global allocator here and no `alloc` crate dependency; see
//! DESIGN.md for that decision.

#![no_std]
#![cfg_attr(all(test, target_os = "none"), no_main)]
#![feature(custom_test_frameworks)]
#![feature(abi_x86_interrupt)]
#![cfg_attr(target_os = "none", test_runner(crate::test_runner))]
#![cfg_attr(target_os = "none", reexport_test_harness_main = "test_main")]

#[cfg(not(target_os = "none"))]
extern crate std;

#[macro_use]
pub mod print;

pub mod arch;
pub mod config;
pub mod drivers;
pub mod error;
pub mod fs;
pub mod log_service;
pub mod mm;
pub mod process;
pub mod sched;
pub mod syscall;
pub mod terminal;

mod test_framework;

pub use test_framework::{exit_qemu, test_panic_handler, QemuExitCode, Testable};
#[cfg(test)]
pub use test_framework::test_runner;

#[cfg(all(test, target_os = "none"))]
#[no_mangle]
pub extern "C" fn _start() -> ! {
    test_main();
    loop {
        core::hint::spin_loop();
    }
}

#[cfg(all(test, target_os = "none"))]
#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    test_framework::test_panic_handler(info)
}
