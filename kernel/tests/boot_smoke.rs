//! Smoke test: every boot-sequence subsystem initializes without faulting
//! and leaves the invariants `main.rs`'s `rust_entry` relies on in place.

#![no_std]
#![no_main]

use core::panic::PanicInfo;

use protos_kernel::config::TIMER_HZ;
use protos_kernel::{arch, drivers, exit_qemu, fs, mm, serial_println, terminal, test_panic_handler, QemuExitCode};

#[no_mangle]
pub extern "C" fn _start() -> ! {
    serial_println!("boot_smoke: starting");

    unsafe {
        arch::x86::init();
        mm::init();
        drivers::pic::init();
        drivers::pit::init(TIMER_HZ);
        terminal::manager::init();
        arch::x86::interrupts::enable();
    }

    test_terminal_starts_on_zero();
    test_fs_image_base_is_settable();
    test_pit_is_ticking();

    serial_println!("boot_smoke: all tests passed");
    exit_qemu(QemuExitCode::Success)
}

#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    test_panic_handler(info)
}

fn test_terminal_starts_on_zero() {
    assert_eq!(terminal::manager::current_terminal_index(), 0);
    serial_println!("test_terminal_starts_on_zero passed");
}

fn test_fs_image_base_is_settable() {
    let image = drivers::fdc::load_filesystem_image();
    unsafe {
        fs::image::set_image_base(image.as_ptr() as usize);
    }
    serial_println!("test_fs_image_base_is_settable passed");
}

fn test_pit_is_ticking() {
    let before = drivers::pit::ticks();
    // A handful of `hlt`s gives the PIT ISR a chance to fire at least once
    // at TIMER_HZ.
    for _ in 0..1_000_000 {
        core::hint::spin_loop();
    }
    let after = drivers::pit::ticks();
    assert!(after >= before);
    serial_println!("test_pit_is_ticking passed");
}
