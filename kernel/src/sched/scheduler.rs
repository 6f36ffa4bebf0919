//! Round-robin scheduler (C4), ported from `task.c`'s `schedule`/
//! `task_switch`. Driven by the PIT ISR (preemptive) and by blocking reads
//! (voluntary yield) per §5's three suspension points.

use super::runqueue;
use super::task::{task_at, TaskStatus};
use crate::arch::x86::context;
use crate::arch::x86::gdt;
use crate::mm::paging;
use crate::process::pcb::{self, calc_kstack_address};

static mut CURRENT_PID: i32 = 0;

pub fn current_pid() -> i32 {
    unsafe { core::ptr::addr_of!(CURRENT_PID).read() }
}

fn set_current_pid(pid: i32) {
    unsafe {
        core::ptr::addr_of_mut!(CURRENT_PID).write(pid);
    }
}

/// Force `CURRENT_PID` to `pid` outside of a `task_switch` rotation. Used by
/// `sys_halt`'s parent-resume path, which restores the caller's address
/// space and kernel stack by hand rather than going through `schedule()`.
pub fn force_current_pid(pid: i32) {
    set_current_pid(pid);
}

pub fn set_status(pid: i32, status: TaskStatus) {
    crate::arch::x86::interrupts::without_interrupts(|| unsafe {
        task_at(pid).status = status;
    });
}

/// Called from the PIT ISR trampoline on every tick.
pub fn on_timer_tick() {
    schedule();
}

/// Rotate the run queue to the next *active* task and switch to it if it
/// differs from the currently running one. Matches `schedule()`'s five
/// numbered steps exactly: pop-push-check up to `count()` times, bail if
/// nothing active or the candidate is the caller itself.
pub fn schedule() {
    crate::arch::x86::interrupts::without_interrupts(|| unsafe {
        let from = current_pid();
        let attempts = runqueue::count();
        if attempts == 0 {
            return;
        }
        let mut candidate = runqueue::rotate();
        let mut tries = 1;
        while candidate != super::task::NONE
            && task_at(candidate).status != TaskStatus::Active
            && tries < attempts
        {
            candidate = runqueue::rotate();
            tries += 1;
        }
        if candidate == super::task::NONE || task_at(candidate).status != TaskStatus::Active {
            return;
        }
        if candidate == from {
            return;
        }
        task_switch(from, candidate);
    });
}

/// Save `from`'s state, switch `to` in as the current process, and resume
/// it — either entering user mode for the first time or resuming a
/// previously-saved kernel-stack continuation, matching `task_switch`'s
/// "has it run before" branch.
///
/// # Safety
/// Must run with interrupts disabled; `from` and `to` must both name live
/// PCB slots with a task node in the run queue.
unsafe fn task_switch(from: i32, to: i32) {
    let from_pcb = pcb::pcb_at(from);
    let from_ctx_ptr = &mut from_pcb.sched_context as *mut context::SavedContext;

    paging::load(to as usize);
    gdt::set_kernel_stack(calc_kstack_address(to) as u32);
    set_current_pid(to);

    let to_pcb = pcb::pcb_at(to);
    if !to_pcb.has_run {
        to_pcb.has_run = true;
        let entry = to_pcb.entry_point;
        let user_esp = to_pcb.user_stack as u32;
        context::save_and_enter_usermode(&mut *from_ctx_ptr, entry, user_esp);
    } else {
        let to_ctx = to_pcb.sched_context;
        context::switch_task_context(&mut *from_ctx_ptr, &to_ctx, 0);
    }
}
