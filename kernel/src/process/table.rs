//! Process creation (`setup_process` in `task.c`): pid allocation, command
//! parsing, address-space setup, loading, and run-queue admission.

use crate::config::{MAX_ARGS, MAX_PROCESSES, MAX_PROGRAM_NAME};
use crate::error::KernelError;
use crate::fs;
use crate::mm::paging;
use crate::process::loader;
use crate::process::pcb::{self, calc_kstack_address, calc_program_start, calc_ustack_address};
use crate::sched::{runqueue, scheduler};
use crate::terminal::manager;

/// Split `command` into a program name (first word, capped at
/// [`MAX_PROGRAM_NAME`] bytes) and an argument string (the remainder, with
/// exactly one separating space skipped, capped at [`MAX_ARGS`] bytes),
/// matching `parse_args`.
fn split_command(command: &str) -> (&str, &str) {
    let command = command.trim_start();
    match command.find(' ') {
        Some(pos) => {
            let name = &command[..pos.min(MAX_PROGRAM_NAME)];
            let rest = &command[pos + 1..];
            let args = &rest[..rest.len().min(MAX_ARGS)];
            (name, args)
        }
        None => (&command[..command.len().min(MAX_PROGRAM_NAME)], ""),
    }
}

/// Allocate the next pid (`task.c`'s "scan run queue for max present pid,
/// add one" — pid 0 is the kernel and is never in the run queue, so the
/// first spawned process is always pid 1).
fn allocate_pid() -> Result<i32, KernelError> {
    let next = runqueue::max_live_pid().max(0) + 1;
    if next as usize >= MAX_PROCESSES {
        return Err(KernelError::NoProcessSlot);
    }
    Ok(next)
}

/// Create a new process from a raw command line, matching `setup_process`:
/// parse the command, pick a pid, build its address space, load the
/// executable, wire up stdin/stdout and a terminal, and admit it to the
/// run queue as active. The new process's parent is the caller; its
/// terminal is the caller's own, or a freshly reserved one if the caller
/// (pid 0, the kernel) has none. Returns the new pid.
pub fn setup_process(command: &str) -> Result<i32, KernelError> {
    let parent = scheduler::current_pid();
    let terminal_index = unsafe { pcb::pcb_at(parent).terminal_index };
    let terminal_index = match terminal_index {
        Some(index) => index,
        None => manager::reserve_free_terminal().ok_or(KernelError::NoTerminalSlot)?,
    };
    setup_process_in(command, parent, terminal_index)
}

/// Spawn `command` as a fresh top-level shell pinned to `terminal_index`
/// with the kernel (pid 0) as its recorded parent. Used by `sys_halt` when
/// a top-level shell exits, so every terminal always has a live shell, and
/// by the boot sequence for the initial shells.
pub fn respawn_in_terminal(command: &str, terminal_index: usize) -> Result<i32, KernelError> {
    setup_process_in(command, 0, terminal_index)
}

fn setup_process_in(command: &str, parent: i32, terminal_index: usize) -> Result<i32, KernelError> {
    let (name, args) = split_command(command);
    if name.is_empty() {
        return Err(KernelError::ProgramNotFound);
    }

    let pid = allocate_pid()?;

    let entry = unsafe {
        paging::load(pid as usize);
        let result = loader::load_program(pid, name);
        paging::load(parent as usize);
        result?
    };

    let proc = unsafe { pcb::pcb_at(pid) };
    *proc = pcb::Pcb::empty();
    proc.pid = pid;
    proc.in_use = true;
    proc.parent_pid = parent;
    proc.user_stack = calc_ustack_address(pid);
    proc.kernel_stack = calc_kstack_address(pid);
    proc.page_start = calc_program_start(pid);
    proc.program_len = name.len().min(MAX_PROGRAM_NAME);
    proc.program[..proc.program_len].copy_from_slice(&name.as_bytes()[..proc.program_len]);
    proc.args_len = args.len().min(MAX_ARGS);
    proc.args[..proc.args_len].copy_from_slice(&args.as_bytes()[..proc.args_len]);
    proc.level = if parent == 0 {
        1
    } else {
        unsafe { pcb::pcb_at(parent).level + 1 }
    };
    proc.terminal_index = Some(terminal_index);
    proc.entry_point = entry;
    proc.has_run = false;

    fs::init_standard_fds(&mut proc.open_files);
    manager::set_owner(terminal_index, pid);
    runqueue::enqueue(pid);

    Ok(pid)
}
