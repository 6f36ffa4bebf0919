//! Kernel entry point and boot sequence (§1/§6).
//!
//! GRUB (or any multiboot v1 loader) jumps to `_start` with `eax` holding
//! the multiboot magic and `ebx` the info-block physical address, no stack
//! set up yet. The trampoline below parks both in a small `.bss` stack and
//! hands them to [`rust_entry`] as ordinary arguments, the same division
//! of labor the teacher's `build.rs`/bootloader-crate split gives it for
//! 64-bit, just spelled out by hand here since there is no 32-bit
//! multiboot crate in this corpus (see [`protos_kernel::arch::x86::multiboot`]).

#![no_std]
#![no_main]
#![feature(abi_x86_interrupt)]

use core::arch::global_asm;
use core::panic::PanicInfo;

use protos_kernel::arch::x86::multiboot::{self, MultibootInfo};
use protos_kernel::config::{NUM_BOOT_SHELLS, SHELL_PROGRAM_NAME, TIMER_HZ};
use protos_kernel::sched::task::TaskStatus;
use protos_kernel::{arch, drivers, fs, mm, println, process, sched, terminal};

global_asm!(
    r#"
.section .bss
.align 16
boot_stack_bottom:
.skip 65536
boot_stack_top:

.section .text
.global _start
_start:
    mov esp, boot_stack_top
    mov ebp, esp
    push ebx
    push eax
    call rust_entry
2:
    hlt
    jmp 2b
"#
);

#[no_mangle]
extern "C" fn rust_entry(magic: u32, info: *const MultibootInfo) -> ! {
    if !multiboot::check_magic(magic) {
        println!("boot: bad multiboot magic {:#x}, halting", magic);
        arch::halt();
    }
    let _modules = unsafe { multiboot::modules(info) };

    println!("protOS booting...");

    unsafe {
        arch::x86::init();
        mm::init();
        drivers::pic::init();
        drivers::pit::init(TIMER_HZ);
        terminal::manager::init();
    }

    // Pid 0 gets its own run-queue entry (§3/§8 scenario 1: "runqueue.
    // num_tasks == 4 (kernel + 3 shells)"), pinned `Idle` so `schedule()`
    // never picks it as a candidate — it is bookkeeping only, never
    // scheduled to user code (§3 invariant).
    sched::runqueue::enqueue(0);
    sched::scheduler::set_status(0, TaskStatus::Idle);

    let image = drivers::fdc::load_filesystem_image();
    unsafe {
        fs::image::set_image_base(image.as_ptr() as usize);
    }

    for _ in 0..NUM_BOOT_SHELLS {
        if let Err(e) = process::table::setup_process(SHELL_PROGRAM_NAME) {
            println!("boot: failed to spawn shell: {}", e);
        }
    }

    println!("protOS ready.");

    unsafe {
        arch::x86::interrupts::enable();
    }

    // Pid 0 (the kernel) never does real work again after boot; it just
    // idles here between timer ticks while `schedule()` round-robins the
    // run queue of spawned shells.
    loop {
        unsafe {
            core::arch::asm!("hlt", options(nomem, nostack));
        }
    }
}

#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    println!("[KERNEL PANIC] {}", info);
    arch::halt();
}
