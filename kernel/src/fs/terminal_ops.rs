//! Terminal vtable (`terminal_funcs` in `syscall.c`), backing `/dev/stdin`
//! and `/dev/stdout`. Blocks in `read` per §5's first suspension point:
//! the calling task marks itself `Idle` (so `schedule()` skips it on every
//! other task's rotation) and is woken back to `Active` by
//! `keyboard::handle_enter` once a line completes for its terminal.

use crate::fs::descriptor::{FileDescriptor, FileOps};
use crate::process::pcb::pcb_at;
use crate::sched::scheduler;
use crate::sched::task::TaskStatus;
use crate::terminal::keyboard;

fn owning_terminal() -> Option<usize> {
    let pid = scheduler::current_pid();
    unsafe { pcb_at(pid).terminal_index }
}

pub struct TerminalOps;

pub static TERMINAL_OPS: TerminalOps = TerminalOps;

impl FileOps for TerminalOps {
    fn read(&self, _desc: &mut FileDescriptor, buf: &mut [u8]) -> i32 {
        let Some(index) = owning_terminal() else {
            return -1;
        };
        let pid = scheduler::current_pid();
        loop {
            if let Some(n) = keyboard::try_read_line(index, buf) {
                scheduler::set_status(pid, TaskStatus::Active);
                return n;
            }
            scheduler::set_status(pid, TaskStatus::Idle);
            scheduler::schedule();
        }
    }

    fn write(&self, _desc: &mut FileDescriptor, buf: &[u8]) -> i32 {
        let Some(index) = owning_terminal() else {
            return -1;
        };
        for &byte in buf {
            keyboard::write_byte(index, byte);
        }
        buf.len() as i32
    }
}
