//! Process Control Block (C3).
//!
//! Field layout and addressing scheme ported from `task.c`'s `process_t`:
//! every pid's PCB lives at a fixed physical address derived purely from
//! the pid (`calc_pcb_address`), sitting at the top of that pid's 8 KiB
//! kernel stack region below the 8 MiB mark, so it's reachable from the
//! kernel stack pointer by masking off the low 13 bits. §9 asks that the
//! return-linkage mechanism become an explicit continuation rather than a
//! raw resume address; see [`crate::arch::x86::context::SavedContext`].

use crate::arch::x86::context::SavedContext;
use crate::config::{MAX_FILES, MAX_PROGRAM_NAME, PROGRAM_IMAGE_PHYSICAL_BASE, PROGRAM_IMAGE_SIZE};
use crate::fs::descriptor::FileDescriptor;

const PCB_REGION_TOP: usize = 8 * 1024 * 1024;
const KERNEL_STACK_SIZE: usize = 0x2000;

/// Saved general-purpose register frame, captured across `execute`/`halt`
/// the same shape `registers_t` used (`save_regs`/`restore_regs`).
#[derive(Clone, Copy, Default)]
#[repr(C)]
pub struct RegisterFrame {
    pub eax: u32,
    pub ebx: u32,
    pub ecx: u32,
    pub edx: u32,
    pub esi: u32,
    pub edi: u32,
    pub ebp: u32,
    pub esp: u32,
}

#[derive(Clone, Copy)]
pub struct Pcb {
    pub pid: i32,
    pub in_use: bool,
    pub parent_pid: i32,
    pub user_stack: usize,
    pub kernel_stack: usize,
    pub page_start: usize,
    pub open_files: [FileDescriptor; MAX_FILES],
    pub program: [u8; MAX_PROGRAM_NAME + 1],
    pub program_len: usize,
    pub args: [u8; crate::config::MAX_ARGS],
    pub args_len: usize,
    pub registers: RegisterFrame,
    pub continuation: SavedContext,
    pub level: i32,
    pub terminal_index: Option<usize>,
    pub vidmap_flag: bool,
    pub task_index: Option<usize>,
    /// Separate from `continuation`, which is reserved for the execute/halt
    /// parent linkage: this one carries the scheduler's kernel-stack resume
    /// point across `task_switch` rotations.
    pub sched_context: SavedContext,
    /// Virtual entry address cached from the loader, consumed by
    /// `task_switch`'s first-run branch.
    pub entry_point: u32,
    /// Whether this task has ever been switched into. `task_switch` uses
    /// this to decide between entering user mode for the first time and
    /// resuming a previously-saved `sched_context`.
    pub has_run: bool,
}

impl Pcb {
    pub const fn empty() -> Self {
        Pcb {
            pid: -1,
            in_use: false,
            parent_pid: -1,
            user_stack: 0,
            kernel_stack: 0,
            page_start: 0,
            open_files: [FileDescriptor::CLOSED; MAX_FILES],
            program: [0; MAX_PROGRAM_NAME + 1],
            program_len: 0,
            args: [0; crate::config::MAX_ARGS],
            args_len: 0,
            registers: RegisterFrame {
                eax: 0,
                ebx: 0,
                ecx: 0,
                edx: 0,
                esi: 0,
                edi: 0,
                ebp: 0,
                esp: 0,
            },
            continuation: SavedContext::empty(),
            level: 0,
            terminal_index: None,
            vidmap_flag: false,
            task_index: None,
            sched_context: SavedContext::empty(),
            entry_point: 0,
            has_run: false,
        }
    }

    pub fn program_name(&self) -> &str {
        core::str::from_utf8(&self.program[..self.program_len]).unwrap_or("")
    }

    pub fn args_str(&self) -> &str {
        core::str::from_utf8(&self.args[..self.args_len]).unwrap_or("")
    }
}

/// Physical address of pid's PCB: `8 MiB - 0x2000 * (pid + 1)`. pid 0's PCB
/// sits directly below 8 MiB - 0x2000.
pub fn calc_pcb_address(pid: i32) -> usize {
    PCB_REGION_TOP - KERNEL_STACK_SIZE * (pid as usize + 1)
}

/// Top of pid's 8 KiB kernel stack: `8 MiB - 0x2000 * pid`.
pub fn calc_kstack_address(pid: i32) -> usize {
    PCB_REGION_TOP - KERNEL_STACK_SIZE * pid as usize
}

/// User stack top for every process: the top of the 4 MiB program image
/// slot at virtual 128 MiB (the image itself is below it).
pub fn calc_ustack_address(_pid: i32) -> usize {
    crate::config::PROGRAM_IMAGE_VIRTUAL + crate::config::PROGRAM_IMAGE_SIZE
}

/// Physical address the pid's program image is loaded at (§3 invariant:
/// `0x848000 + 4 MiB * (pid - 1)`).
pub fn calc_program_start(pid: i32) -> usize {
    PROGRAM_IMAGE_PHYSICAL_BASE + PROGRAM_IMAGE_SIZE * (pid as usize - 1)
}

/// Dereference the PCB physical address for `pid` as a `'static mut`
/// reference. Valid once `crate::mm::paging::init` has identity-mapped the
/// low 8 MiB (§4.2 step 1/2).
///
/// # Safety
/// `pid` must be in `0..MAX_PROCESSES`; the caller must not alias this
/// reference (the kernel's single-mutator discipline, §5, is relied on).
pub unsafe fn pcb_at(pid: i32) -> &'static mut Pcb {
    &mut *(calc_pcb_address(pid) as *mut Pcb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pcb_addresses_are_distinct_and_descending() {
        let a = calc_pcb_address(0);
        let b = calc_pcb_address(1);
        let c = calc_pcb_address(2);
        assert!(a > b);
        assert!(b > c);
    }

    #[test]
    fn program_start_matches_invariant_for_pid_one() {
        assert_eq!(calc_program_start(1), PROGRAM_IMAGE_PHYSICAL_BASE);
        assert_eq!(calc_program_start(2), PROGRAM_IMAGE_PHYSICAL_BASE + PROGRAM_IMAGE_SIZE);
    }
}
