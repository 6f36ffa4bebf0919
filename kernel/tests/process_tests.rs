//! Process table / system-call dispatcher invariants (§3, §4.5, §8),
//! exercised against the boot sequence's real PCB and filesystem-image
//! state rather than bare in-memory fixtures, since both live at fixed
//! physical addresses that only make sense after `mm::init`.

#![no_std]
#![no_main]

use core::panic::PanicInfo;

use protos_kernel::config::TIMER_HZ;
use protos_kernel::fs;
use protos_kernel::process::pcb::{pcb_at, Pcb};
use protos_kernel::sched::runqueue;
use protos_kernel::{
    arch, drivers, exit_qemu, mm, process, serial_println, syscall, terminal, test_panic_handler,
    QemuExitCode,
};

#[no_mangle]
pub extern "C" fn _start() -> ! {
    serial_println!("process_tests: starting");

    unsafe {
        arch::x86::init();
        mm::init();
        drivers::pic::init();
        drivers::pit::init(TIMER_HZ);
        terminal::manager::init();
        arch::x86::interrupts::enable();
    }

    let image = drivers::fdc::load_filesystem_image();
    unsafe {
        fs::image::set_image_base(image.as_ptr() as usize);
    }

    unsafe {
        *pcb_at(0) = Pcb::empty();
        pcb_at(0).pid = 0;
        pcb_at(0).in_use = true;
        fs::init_standard_fds(&mut pcb_at(0).open_files);
    }

    test_setup_process_for_missing_program_fails_cleanly();
    test_fd_table_isolation_rejects_unopened_descriptor();
    test_closing_stdin_or_stdout_is_rejected_by_dispatcher();
    test_unknown_syscall_number_returns_error();
    test_getargs_with_no_argument_string_fails();

    serial_println!("process_tests: all tests passed");
    exit_qemu(QemuExitCode::Success)
}

#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    test_panic_handler(info)
}

/// §7 kind 2 / §8 "every live process has exactly one task node": a
/// command naming a program absent from the filesystem image must fail
/// without enqueueing a task or otherwise mutating scheduler state.
fn test_setup_process_for_missing_program_fails_cleanly() {
    let before = runqueue::count();
    let result = process::table::setup_process("this-program-does-not-exist");
    assert!(result.is_err());
    assert_eq!(runqueue::count(), before);
    serial_println!("test_setup_process_for_missing_program_fails_cleanly passed");
}

/// §8 "FD table isolation": a descriptor slot that is not `in_use` must
/// reject read and write through the syscall dispatcher.
fn test_fd_table_isolation_rejects_unopened_descriptor() {
    let mut buf = [0u8; 16];
    let ptr = buf.as_mut_ptr() as u32;

    // fd 3 was left `CLOSED` by `Pcb::empty`; only 0/1 were wired up above.
    let read_result = syscall::dispatch(3, 3, ptr, buf.len() as u32);
    assert_eq!(read_result, -1);
    let write_result = syscall::dispatch(4, 3, ptr, buf.len() as u32);
    assert_eq!(write_result, -1);

    serial_println!("test_fd_table_isolation_rejects_unopened_descriptor passed");
}

/// §4.6 "Closing slots 0 or 1 is an error", matched via the syscall
/// dispatcher's call #6 (close).
fn test_closing_stdin_or_stdout_is_rejected_by_dispatcher() {
    assert_eq!(syscall::dispatch(6, 0, 0, 0), -1);
    assert_eq!(syscall::dispatch(6, 1, 0, 0), -1);
    serial_println!("test_closing_stdin_or_stdout_is_rejected_by_dispatcher passed");
}

/// §7 kind 1: an undefined call number returns -1 without touching state.
fn test_unknown_syscall_number_returns_error() {
    assert_eq!(syscall::dispatch(200, 0, 0, 0), -1);
    serial_println!("test_unknown_syscall_number_returns_error passed");
}

/// §4.5 call #7: `getargs` on a process with an empty argument string
/// fails (this harness's pid-0 stand-in PCB was built by hand with no
/// `execute`-supplied argument string).
fn test_getargs_with_no_argument_string_fails() {
    let mut buf = [0u8; 8];
    let ptr = buf.as_mut_ptr() as u32;
    assert_eq!(syscall::dispatch(7, ptr, buf.len() as u32, 0), -1);
    serial_println!("test_getargs_with_no_argument_string_fails passed");
}
