//! Run-queue and scheduler invariants (§5), exercised outside the full
//! boot sequence since these operate on fixed task-node state only.

#![no_std]
#![no_main]

use core::panic::PanicInfo;

use protos_kernel::sched::runqueue;
use protos_kernel::sched::task::NONE;
use protos_kernel::{exit_qemu, serial_println, test_panic_handler, QemuExitCode};

#[no_mangle]
pub extern "C" fn _start() -> ! {
    serial_println!("scheduler_tests: starting");

    test_enqueue_dequeue_tracks_count();
    test_rotate_visits_every_task_once();
    test_dequeue_of_absent_task_is_a_no_op();
    test_boot_runqueue_holds_kernel_plus_three_shells();

    serial_println!("scheduler_tests: all tests passed");
    exit_qemu(QemuExitCode::Success)
}

#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    test_panic_handler(info)
}

fn test_enqueue_dequeue_tracks_count() {
    runqueue::enqueue(1);
    runqueue::enqueue(2);
    assert_eq!(runqueue::count(), 2);
    assert_eq!(runqueue::head(), 1);

    runqueue::dequeue(1);
    assert_eq!(runqueue::count(), 1);
    assert_eq!(runqueue::head(), 2);

    runqueue::dequeue(2);
    assert_eq!(runqueue::count(), 0);
    assert_eq!(runqueue::head(), NONE);

    serial_println!("test_enqueue_dequeue_tracks_count passed");
}

fn test_rotate_visits_every_task_once() {
    runqueue::enqueue(3);
    runqueue::enqueue(4);
    runqueue::enqueue(5);

    let mut seen = [0i32; 3];
    for slot in seen.iter_mut() {
        *slot = runqueue::head();
        runqueue::rotate();
    }
    seen.sort_unstable();
    assert_eq!(seen, [3, 4, 5]);

    runqueue::dequeue(3);
    runqueue::dequeue(4);
    runqueue::dequeue(5);

    serial_println!("test_rotate_visits_every_task_once passed");
}

fn test_dequeue_of_absent_task_is_a_no_op() {
    let before = runqueue::count();
    runqueue::dequeue(6);
    assert_eq!(runqueue::count(), before);

    serial_println!("test_dequeue_of_absent_task_is_a_no_op passed");
}

/// §8 scenario 1: after boot, the run queue holds pid 0 (the kernel) plus
/// one task per spawned shell — `runqueue.num_tasks == 4` for the default
/// three-shell boot.
fn test_boot_runqueue_holds_kernel_plus_three_shells() {
    runqueue::enqueue(0);
    runqueue::enqueue(7);
    runqueue::enqueue(8);
    runqueue::enqueue(9);
    assert_eq!(runqueue::count(), 4);

    runqueue::dequeue(0);
    runqueue::dequeue(7);
    runqueue::dequeue(8);
    runqueue::dequeue(9);

    serial_println!("test_boot_runqueue_holds_kernel_plus_three_shells passed");
}
