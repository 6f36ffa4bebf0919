//! System-call dispatcher (C5), ported from `syscall.c`'s numbered
//! `syscall_dispatch` jump table. Entry is `int 0x80`; argument
//! marshalling (call number in eax, up to three args in ebx/ecx/edx) is
//! handled by [`crate::arch::x86::context::handle_syscall_interrupt`],
//! which hands the four raw values to [`dispatch`] and writes its `i32`
//! result back into eax.
//!
//! Every handler below runs with the caller's page directory already
//! loaded (the syscall gate doesn't switch address spaces), so user
//! pointers are dereferenced directly rather than copied through a
//! separate mapping — the same assumption `syscall.c`'s handlers make.

use crate::config::{MAX_FILES, MAX_PROGRAM_NAME, PROGRAM_IMAGE_SIZE, PROGRAM_IMAGE_VIRTUAL};
use crate::drivers::power;
use crate::drivers::sb16::{self, SoundCard};
use crate::error::{to_syscall_result, KernelError};
use crate::fs::{self, image};
use crate::mm::paging::{self, Privilege, VIDMAP_TABLE_SLOT};
use crate::process::pcb::pcb_at;
use crate::process::table;
use crate::sched::runqueue;
use crate::sched::scheduler;
use crate::sched::task::TaskStatus;
use crate::terminal::manager;
use crate::{arch, println};

const CALL_HALT: u32 = 1;
const CALL_EXECUTE: u32 = 2;
const CALL_READ: u32 = 3;
const CALL_WRITE: u32 = 4;
const CALL_OPEN: u32 = 5;
const CALL_CLOSE: u32 = 6;
const CALL_GETARGS: u32 = 7;
const CALL_VIDMAP: u32 = 8;
const CALL_SET_HANDLER: u32 = 9;
const CALL_SIGRETURN: u32 = 10;
const CALL_SHUTDOWN: u32 = 11;
const CALL_SOUNDCTRL: u32 = 12;

/// Widest user filename or command line this dispatcher will copy in one
/// shot: a program name plus a separating space plus its argument string.
const COMMAND_BUF_CAPACITY: usize = MAX_PROGRAM_NAME + 1 + crate::config::MAX_ARGS;

/// Entry point called from the `int 0x80` trampoline. `call_num` not
/// matching any of the twelve defined calls is §7 kind 1 ("unknown
/// system-call number"): returns -1 without touching any state.
pub fn dispatch(call_num: u32, a1: u32, a2: u32, a3: u32) -> i32 {
    match call_num {
        CALL_HALT => sys_halt(a1 as u8),
        CALL_EXECUTE => sys_execute(a1),
        CALL_READ => sys_read(a1, a2, a3),
        CALL_WRITE => sys_write(a1, a2, a3),
        CALL_OPEN => sys_open(a1),
        CALL_CLOSE => sys_close(a1),
        CALL_GETARGS => sys_getargs(a1, a2),
        CALL_VIDMAP => sys_vidmap(a1),
        CALL_SET_HANDLER => sys_set_handler(),
        CALL_SIGRETURN => sys_sigreturn(),
        CALL_SHUTDOWN => sys_shutdown(),
        CALL_SOUNDCTRL => sys_soundctrl(a1, a2),
        _ => to_syscall_result(Err(KernelError::UnknownSyscall)),
    }
}

/// Copies a user NUL-terminated string of at most `N-1` bytes (plus the
/// implicit terminator) into a kernel-owned buffer. Stops early at the
/// first NUL or at capacity, matching the original's `strncpy`-style
/// bounded reads of user command lines and filenames. Returns `None` for a
/// null pointer.
fn copy_user_cstr<const N: usize>(ptr: u32) -> Option<([u8; N], usize)> {
    if ptr == 0 {
        return None;
    }
    let mut buf = [0u8; N];
    let mut len = 0usize;
    unsafe {
        let src = ptr as *const u8;
        while len < N {
            let byte = core::ptr::read(src.add(len));
            if byte == 0 {
                break;
            }
            buf[len] = byte;
            len += 1;
        }
    }
    Some((buf, len))
}

/// # Safety
/// `ptr`/`len` must describe memory mapped in the currently loaded page
/// directory (the calling process's own address space), which holds for
/// every syscall argument since the gate never switches CR3.
unsafe fn user_slice_mut<'a>(ptr: u32, len: u32) -> &'a mut [u8] {
    core::slice::from_raw_parts_mut(ptr as *mut u8, len as usize)
}

/// Halt the calling process with `status` (§4.5 call #1, §9 "coroutine
/// control flow"). Closes every open descriptor in ascending order, frees
/// the task and run-queue entry, and either resumes the parent's saved
/// `execute` continuation with `status` as its return value, or — for a
/// top-level shell, whose "parent" is the kernel and thus has no saved
/// continuation to resume — respawns a fresh shell in the same terminal
/// and parks this task forever.
///
/// A parent counts as having a resumable continuation only if it is still
/// `in_use`: a chain of top-level shells (each one replacing the last)
/// must keep falling through to the respawn path rather than trying to
/// resume into an already-dead PCB slot.
pub fn sys_halt(status: u8) -> ! {
    halt_with(status as i32)
}

/// Full `i32` halt entry point used directly by exception handlers (§7
/// kind 3), which need to signal `-1` rather than a `0..=255` status byte.
pub fn halt_with(status: i32) -> ! {
    let pid = scheduler::current_pid();
    let proc = unsafe { pcb_at(pid) };

    for fd in 0..MAX_FILES {
        if proc.open_files[fd].in_use() {
            proc.open_files[fd].close();
        }
    }

    runqueue::dequeue(pid);
    proc.in_use = false;

    let parent = proc.parent_pid;
    let terminal_index = proc.terminal_index;
    let parent_live = parent > 0 && unsafe { pcb_at(parent) }.in_use;

    if !parent_live {
        if let Some(index) = terminal_index {
            let _ = table::respawn_in_terminal(crate::config::SHELL_PROGRAM_NAME, index);
        }
        loop {
            arch::x86::interrupts::enable();
            unsafe {
                core::arch::asm!("hlt", options(nomem, nostack));
            }
        }
    }

    unsafe {
        paging::load(parent as usize);
        crate::arch::x86::gdt::set_kernel_stack(
            crate::process::pcb::calc_kstack_address(parent) as u32,
        );
    }
    scheduler::force_current_pid(parent);
    scheduler::set_status(parent, TaskStatus::Active);

    let parent_pcb = unsafe { pcb_at(parent) };
    unsafe { crate::arch::x86::context::resume_parent(&parent_pcb.continuation, status) }
}

/// Spawn and run `command` to completion, synchronously returning the
/// child's halt status (§4.5 call #2). Blocks the caller (marked `Idle`
/// so the scheduler skips it) by transferring control directly into the
/// child's entry point; control returns here only once the child (or a
/// descendant) calls `halt`.
fn sys_execute(command_ptr: u32) -> i32 {
    let (buf, len) = match copy_user_cstr::<COMMAND_BUF_CAPACITY>(command_ptr) {
        Some(v) => v,
        None => return to_syscall_result(Err(KernelError::ProgramNotFound)),
    };
    let command = core::str::from_utf8(&buf[..len]).unwrap_or("");

    let parent = scheduler::current_pid();
    scheduler::set_status(parent, TaskStatus::Idle);

    let pid = match table::setup_process(command) {
        Ok(pid) => pid,
        Err(err) => {
            scheduler::set_status(parent, TaskStatus::Active);
            return to_syscall_result(Err(err));
        }
    };

    let child = unsafe { pcb_at(pid) };
    child.has_run = true;
    let entry = child.entry_point;
    let user_esp = child.user_stack as u32;

    unsafe {
        paging::load(pid as usize);
        crate::arch::x86::gdt::set_kernel_stack(
            crate::process::pcb::calc_kstack_address(pid) as u32,
        );
    }
    scheduler::force_current_pid(pid);

    let parent_pcb = unsafe { pcb_at(parent) };
    unsafe {
        crate::arch::x86::context::save_and_enter_usermode(
            &mut parent_pcb.continuation,
            entry,
            user_esp,
        )
    }
}

fn current_proc() -> &'static mut crate::process::pcb::Pcb {
    unsafe { pcb_at(scheduler::current_pid()) }
}

/// §4.5 call #3. Invalid/out-of-range fds and fds not open for reading
/// both collapse to -1 through `FileDescriptor::read`.
fn sys_read(fd: u32, buf_ptr: u32, nbytes: u32) -> i32 {
    let fd = fd as usize;
    if fd >= MAX_FILES {
        return to_syscall_result(Err(KernelError::InvalidFd));
    }
    let buf = unsafe { user_slice_mut(buf_ptr, nbytes) };
    current_proc().open_files[fd].read(buf)
}

/// §4.5 call #4.
fn sys_write(fd: u32, buf_ptr: u32, nbytes: u32) -> i32 {
    let fd = fd as usize;
    if fd >= MAX_FILES {
        return to_syscall_result(Err(KernelError::InvalidFd));
    }
    let buf = unsafe { user_slice_mut(buf_ptr, nbytes) };
    let r = current_proc().open_files[fd].write(buf);
    if r < 0 {
        r
    } else {
        0
    }
}

/// §4.5 call #5. Filenames are capped at the filesystem image's own
/// [`image::NAME_MAX`]; `/dev/stdin`/`/dev/stdout` both fit comfortably.
fn sys_open(name_ptr: u32) -> i32 {
    let (buf, len) = match copy_user_cstr::<{ image::NAME_MAX }>(name_ptr) {
        Some(v) => v,
        None => return to_syscall_result(Err(KernelError::NameNotFound)),
    };
    let name = core::str::from_utf8(&buf[..len]).unwrap_or("");
    to_syscall_result(fs::open(&mut current_proc().open_files, name).map(|fd| fd as i32))
}

/// §4.5 call #6. Closing stdin/stdout (fds 0/1) is always an error, as is
/// closing a slot that is not currently open.
fn sys_close(fd: u32) -> i32 {
    let fd = fd as usize;
    if fd < 2 || fd >= MAX_FILES {
        return to_syscall_result(Err(KernelError::InvalidFd));
    }
    let proc = current_proc();
    if !proc.open_files[fd].in_use() {
        return to_syscall_result(Err(KernelError::InvalidFd));
    }
    proc.open_files[fd].close()
}

/// §4.5 call #7. Copies the calling process's argument string into the
/// user buffer, null-padded, capped at `nbytes`.
fn sys_getargs(buf_ptr: u32, nbytes: u32) -> i32 {
    let proc = current_proc();
    if proc.args_len == 0 {
        return to_syscall_result(Err(KernelError::NoArguments));
    }
    let buf = unsafe { user_slice_mut(buf_ptr, nbytes) };
    let n = proc.args_len.min(buf.len());
    buf[..n].copy_from_slice(&proc.args[..n]);
    for slot in buf.iter_mut().skip(n) {
        *slot = 0;
    }
    0
}

/// §4.5 call #8. `out_ptr` must lie within the calling process's own
/// program image page; on success, maps real video memory at user virtual
/// [`crate::config::VIDMAP_VIRTUAL`] and records the flag so terminal
/// focus switches re-route the mapping (§4.7).
fn sys_vidmap(out_ptr: u32) -> i32 {
    let lo = PROGRAM_IMAGE_VIRTUAL as u32;
    let hi = (PROGRAM_IMAGE_VIRTUAL + PROGRAM_IMAGE_SIZE) as u32;
    if out_ptr < lo || out_ptr >= hi {
        return to_syscall_result(Err(KernelError::InvalidPointer));
    }

    let pid = scheduler::current_pid();
    let vidmap_virtual = crate::config::VIDMAP_VIRTUAL;
    paging::map_4kb(
        crate::arch::x86::vga::VGA_PHYSICAL_ADDRESS,
        vidmap_virtual,
        pid as usize,
        Privilege::User,
        VIDMAP_TABLE_SLOT,
    );

    let proc = unsafe { pcb_at(pid) };
    proc.vidmap_flag = true;
    if let Some(terminal_index) = proc.terminal_index {
        manager::set_vidmap_active(terminal_index, true);
    }

    unsafe {
        core::ptr::write(out_ptr as *mut u32, vidmap_virtual as u32);
    }
    0
}

/// §4.5 call #9. Intentionally unimplemented (§7 kind 5).
fn sys_set_handler() -> i32 {
    to_syscall_result(Err(KernelError::Unimplemented))
}

/// §4.5 call #10. Intentionally unimplemented (§7 kind 5).
fn sys_sigreturn() -> i32 {
    to_syscall_result(Err(KernelError::Unimplemented))
}

/// §4.5 call #11. Never returns.
fn sys_shutdown() -> i32 {
    println!("system halted, press any key to power off QEMU...");
    unsafe { power::off() }
}

/// §4.5 call #12. `function` selects play(0)/pause(1)/resume(2)/stop(3);
/// any other value is an unknown-function error.
fn sys_soundctrl(function: u32, filename_ptr: u32) -> i32 {
    let result = match function {
        0 => {
            let (buf, len) = match copy_user_cstr::<{ image::NAME_MAX }>(filename_ptr) {
                Some(v) => v,
                None => return -1,
            };
            let name = core::str::from_utf8(&buf[..len]).unwrap_or("");
            sb16::SOUND_CARD.play(name)
        }
        1 => sb16::SOUND_CARD.pause(),
        2 => sb16::SOUND_CARD.resume(),
        3 => sb16::SOUND_CARD.stop(),
        _ => return -1,
    };
    match result {
        Ok(()) => 0,
        Err(()) => -1,
    }
}
