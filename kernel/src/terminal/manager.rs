//! Terminal focus management (C7 "focus switching"), ported from
//! `keyboard.c`'s `switch_terminals` and `task.c`'s `activate_task`.

use core::ptr;
use core::sync::atomic::{AtomicUsize, Ordering};

use crate::arch::x86::vga::{vga_buffer, VGA_PHYSICAL_ADDRESS};
use crate::config::NUM_TERMINALS;
use crate::terminal::{live_page_base, screen, terminal_at, SCREEN_BYTES};

static CURRENT_TERMINAL: AtomicUsize = AtomicUsize::new(0);

pub fn current_terminal_index() -> usize {
    CURRENT_TERMINAL.load(Ordering::Relaxed)
}

/// # Safety
/// Caller must run this with interrupts disabled once, during boot, before
/// any terminal is focused.
pub unsafe fn init() {
    for i in 0..NUM_TERMINALS {
        terminal_at(i).index = i;
    }
    CURRENT_TERMINAL.store(0, Ordering::Relaxed);
    refresh_status_bar();
}

/// Find the first terminal with no owning process, matching
/// `setup_process`'s "reserve a free one if the parent has none".
pub fn reserve_free_terminal() -> Option<usize> {
    crate::arch::x86::interrupts::without_interrupts(|| {
        for i in 0..NUM_TERMINALS {
            let term = unsafe { terminal_at(i) };
            if term.owner_pid < 0 {
                return Some(i);
            }
        }
        None
    })
}

/// Record which pid owns terminal `index`, mirroring `activate_task`'s
/// `process_in_terminal[idx] = process` side effect, and refresh the status
/// bar's per-terminal label.
pub fn set_owner(index: usize, pid: i32) {
    crate::arch::x86::interrupts::without_interrupts(|| unsafe {
        terminal_at(index).owner_pid = pid;
    });
    refresh_status_bar();
}

/// Record whether `index`'s owning process has an active `vidmap` mapping,
/// set by the `vidmap` syscall handler. Does not itself touch the page
/// table: the mapping only needs to point at live hardware memory while
/// `index` is the focused terminal, which `switch_terminals` enforces via
/// `reroute_vidmap` on every focus change.
pub fn set_vidmap_active(index: usize, active: bool) {
    crate::arch::x86::interrupts::without_interrupts(|| unsafe {
        terminal_at(index).vidmap_active = active;
    });
    if active && index == current_terminal_index() {
        let pid = unsafe { terminal_at(index) }.owner_pid;
        reroute_vidmap(pid, true);
    }
}

fn copy_screen(src: usize, dst: usize) {
    unsafe {
        ptr::copy_nonoverlapping(src as *const u8, dst as *mut u8, SCREEN_BYTES);
    }
}

/// Switch the focused terminal to `target`, copying hardware text memory
/// into the outgoing terminal's backing page and the incoming terminal's
/// backing page into hardware text memory, matching `switch_terminals`'
/// atomic (interrupts-disabled) copy dance. No-op if `target` is already
/// focused or out of range.
pub fn switch_terminals(target: usize) {
    if target >= NUM_TERMINALS {
        return;
    }
    crate::arch::x86::interrupts::without_interrupts(|| {
        let current = current_terminal_index();
        if current == target {
            return;
        }
        screen::set_cursor_visible(false);

        let outgoing = unsafe { terminal_at(current) };
        outgoing.saved_cursor = {
            let (x, y) = screen::cursor();
            crate::terminal::Coord { x, y }
        };
        copy_screen(VGA_PHYSICAL_ADDRESS, live_page_base(current));
        if outgoing.vidmap_active {
            reroute_vidmap(outgoing.owner_pid, false);
        }

        CURRENT_TERMINAL.store(target, Ordering::Relaxed);

        let incoming = unsafe { terminal_at(target) };
        copy_screen(live_page_base(target), VGA_PHYSICAL_ADDRESS);
        screen::set_cursor(incoming.saved_cursor.x, incoming.saved_cursor.y);
        if incoming.vidmap_active {
            reroute_vidmap(incoming.owner_pid, true);
        }

        refresh_status_bar();
        screen::set_cursor_visible(true);
    });
}

/// Re-routes a backgrounded/foregrounded process's vidmap page between its
/// backing store and live hardware memory, matching §4.7's vidmap
/// focus-switch rule. A narrow hook since the actual page-table edit lives
/// in `crate::mm::paging`; `to_hardware=false` means the process is losing
/// focus, `true` means it is gaining it.
fn reroute_vidmap(owner_pid: i32, to_hardware: bool) {
    if owner_pid < 0 {
        return;
    }
    use crate::config::VIDMAP_VIRTUAL;
    use crate::mm::paging::{self, Privilege, VIDMAP_TABLE_SLOT};

    let terminal_index = unsafe { crate::process::pcb::pcb_at(owner_pid) }
        .terminal_index
        .unwrap_or(current_terminal_index());
    let physical = if to_hardware {
        VGA_PHYSICAL_ADDRESS
    } else {
        live_page_base(terminal_index)
    };
    paging::map_4kb(
        physical,
        VIDMAP_VIRTUAL,
        owner_pid as usize,
        Privilege::User,
        VIDMAP_TABLE_SLOT,
    );
}

const LABEL_CAPACITY: usize = 8;

fn refresh_status_bar() {
    let mut owned = [[0u8; LABEL_CAPACITY]; NUM_TERMINALS];
    let mut lengths = [0usize; NUM_TERMINALS];
    for i in 0..NUM_TERMINALS {
        let term = unsafe { terminal_at(i) };
        if term.owner_pid >= 0 {
            let pcb = unsafe { crate::process::pcb::pcb_at(term.owner_pid) };
            let name = pcb.program_name();
            let n = name.len().min(LABEL_CAPACITY);
            owned[i][..n].copy_from_slice(&name.as_bytes()[..n]);
            lengths[i] = n;
        }
    }
    let mut labels: [&str; NUM_TERMINALS] = ["idle"; NUM_TERMINALS];
    for i in 0..NUM_TERMINALS {
        if lengths[i] > 0 {
            labels[i] = core::str::from_utf8(&owned[i][..lengths[i]]).unwrap_or("idle");
        }
    }
    screen::write_status_bar(&labels);
    let _ = vga_buffer();
}
