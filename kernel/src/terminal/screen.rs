//! Screen driver (C8): cursor, attributes, scrolling, and the status bar,
//! ported from `lib.c`'s `putc`/`update_cursor`/`scroll` family and
//! `status.c`'s segmented status bar. Operates directly on the hardware
//! VGA surface; besides `crate::terminal::manager`'s focus-switch copies,
//! this module itself moves bytes between the surface and a terminal's
//! backing pages to maintain scrollback (`scroll`/`capture_live_snapshot`/
//! `show_backing_page`).

use spin::Mutex;

use crate::arch::x86::vga::{vga_buffer, ColorCode, VGA_PHYSICAL_ADDRESS};
use crate::config::{MAX_SCROLLBACK, NUM_ROWS, SCREEN_COLS};
use crate::terminal::{manager, page_base, SCREEN_BYTES};

pub const DEFAULT_ATTRIB: u8 = 0x07;
const CURSOR_ATTRIB: u8 = 0xf0;
const STATUS_ROW: usize = NUM_ROWS;
const MAX_ATTRIB_OBSERVERS: usize = 4;

struct ScreenState {
    x: usize,
    y: usize,
    attribute: u8,
    cursor_shown: bool,
}

static STATE: Mutex<ScreenState> = Mutex::new(ScreenState {
    x: 0,
    y: 0,
    attribute: DEFAULT_ATTRIB,
    cursor_shown: false,
});

type AttribObserver = fn(x: usize, y: usize);

static mut OBSERVERS: [Option<AttribObserver>; MAX_ATTRIB_OBSERVERS] = [None; MAX_ATTRIB_OBSERVERS];

/// Register a callback invoked whenever a cell's attribute changes, the
/// mechanism the mouse driver uses to know which cell it's currently
/// "hiding" so it can restore it (`mouse.c`'s `add_attrib_observer`).
///
/// # Safety
/// Must run during single-threaded boot setup, before interrupts enable.
pub unsafe fn add_attrib_observer(observer: AttribObserver) -> Result<(), ()> {
    for slot in OBSERVERS.iter_mut() {
        if slot.is_none() {
            *slot = Some(observer);
            return Ok(());
        }
    }
    Err(())
}

fn notify_observers(x: usize, y: usize) {
    unsafe {
        for observer in core::ptr::addr_of!(OBSERVERS).as_ref().unwrap().iter().flatten() {
            observer(x, y);
        }
    }
}

fn write_cell(x: usize, y: usize, ch: u8, attrib: u8) {
    unsafe {
        let buffer = vga_buffer();
        buffer.chars[y][x].ascii_character = ch;
        buffer.chars[y][x].color_code = ColorCode(attrib);
    }
    notify_observers(x, y);
}

fn read_cell(x: usize, y: usize) -> (u8, u8) {
    unsafe {
        let buffer = vga_buffer();
        (buffer.chars[y][x].ascii_character, buffer.chars[y][x].color_code.0)
    }
}

pub fn get_char_attrib(x: usize, y: usize) -> u8 {
    read_cell(x, y).1
}

pub fn set_char_attrib(x: usize, y: usize, attrib: u8) {
    let (ch, _) = read_cell(x, y);
    write_cell(x, y, ch, attrib);
}

pub fn cursor() -> (usize, usize) {
    let state = STATE.lock();
    (state.x, state.y)
}

pub fn set_cursor(x: usize, y: usize) {
    let mut state = STATE.lock();
    state.x = x.min(SCREEN_COLS - 1);
    state.y = y.min(NUM_ROWS - 1);
}

/// Write one character at the current cursor with the current attribute,
/// advancing the cursor and scrolling at the bottom row, matching `putc`.
pub fn putc(ch: u8) {
    let (x, y, attrib) = {
        let state = STATE.lock();
        (state.x, state.y, state.attribute)
    };
    match ch {
        b'\n' => {
            advance_line(y);
        }
        _ => {
            write_cell(x, y, ch, attrib);
            let mut next_x = x + 1;
            let mut next_y = y;
            if next_x >= SCREEN_COLS {
                next_x = 0;
                next_y += 1;
            }
            if next_y >= NUM_ROWS {
                scroll();
                next_y = NUM_ROWS - 1;
            }
            let mut state = STATE.lock();
            state.x = next_x;
            state.y = next_y;
        }
    }
}

fn advance_line(current_y: usize) {
    let mut next_y = current_y + 1;
    if next_y >= NUM_ROWS {
        scroll();
        next_y = NUM_ROWS - 1;
    }
    let mut state = STATE.lock();
    state.x = 0;
    state.y = next_y;
}

/// Scroll the 0..NUM_ROWS content region up by one line, clearing the
/// bottom row with the current attribute. The status bar (row `NUM_ROWS`)
/// is untouched.
///
/// Before touching the hardware surface, the screen about to be scrolled
/// away (including the row this scroll evicts) is pushed into the focused
/// terminal's scrollback (§3 "Scrollback"): its backing pages shift down
/// by one screen and the current screen becomes the new offset-1 page.
pub fn scroll() {
    let attrib = STATE.lock().attribute;
    push_scrollback_snapshot(manager::current_terminal_index());
    unsafe {
        let buffer = vga_buffer();
        for row in 1..NUM_ROWS {
            for col in 0..SCREEN_COLS {
                buffer.chars[row - 1][col] = buffer.chars[row][col];
            }
        }
        for col in 0..SCREEN_COLS {
            buffer.chars[NUM_ROWS - 1][col].ascii_character = b' ';
            buffer.chars[NUM_ROWS - 1][col].color_code = ColorCode(attrib);
        }
    }
}

/// Shifts `index`'s scrollback pages (offsets `2..=MAX_SCROLLBACK`) down by
/// one screen, discarding the oldest, then captures the current hardware
/// screen — the one this scroll is about to evict — into the freed offset
/// 1 slot.
fn push_scrollback_snapshot(index: usize) {
    for level in (2..=MAX_SCROLLBACK).rev() {
        unsafe {
            core::ptr::copy_nonoverlapping(
                page_base(index, level - 1) as *const u8,
                page_base(index, level) as *mut u8,
                SCREEN_BYTES,
            );
        }
    }
    unsafe {
        core::ptr::copy_nonoverlapping(
            VGA_PHYSICAL_ADDRESS as *const u8,
            page_base(index, 1) as *mut u8,
            SCREEN_BYTES,
        );
    }
}

/// Stashes the true live screen into `index`'s offset-0 backing page so it
/// can be restored verbatim once scrollback returns to offset 0, matching
/// `terminal::manager::switch_terminals`' own hardware-to-backing-page
/// copy discipline.
pub fn capture_live_snapshot(index: usize) {
    unsafe {
        core::ptr::copy_nonoverlapping(
            VGA_PHYSICAL_ADDRESS as *const u8,
            page_base(index, 0) as *mut u8,
            SCREEN_BYTES,
        );
    }
}

/// Blits `index`'s backing page at `offset` onto the hardware VGA surface,
/// matching §4.7's scrollback display (offset 0 is the stashed live screen
/// from [`capture_live_snapshot`]).
pub fn show_backing_page(index: usize, offset: usize) {
    unsafe {
        core::ptr::copy_nonoverlapping(
            page_base(index, offset) as *const u8,
            VGA_PHYSICAL_ADDRESS as *mut u8,
            SCREEN_BYTES,
        );
    }
}

/// Toggle the hardware cursor's rendering (an inverted attribute at the
/// cursor cell), matching `update_cursor`'s 2 Hz blink driven by the RTC.
pub fn set_cursor_visible(visible: bool) {
    let (x, y, was_visible, base_attrib) = {
        let mut state = STATE.lock();
        let prev = state.cursor_shown;
        state.cursor_shown = visible;
        (state.x, state.y, prev, state.attribute)
    };
    if visible == was_visible {
        return;
    }
    if visible {
        write_cell(x, y, read_cell(x, y).0, CURSOR_ATTRIB);
    } else {
        write_cell(x, y, read_cell(x, y).0, base_attrib);
    }
}

const STATUS_SEGMENT_WIDTH: usize = 10;
const STATUS_INACTIVE_ATTRIB: u8 = 0x70;

/// Write the "Start" button plus up to `NUM_COLS / STATUS_SEGMENT_WIDTH`
/// terminal-label segments, separated by `|`, matching `write_status_bar`'s
/// layout (simplified to fixed-width segments rather than the original's
/// variable-length packed layout).
pub fn write_status_bar(labels: &[&str]) {
    let mut col = 0usize;
    write_cell(col, STATUS_ROW, b'|', STATUS_INACTIVE_ATTRIB);
    col += 1;
    for label in labels {
        if col >= SCREEN_COLS {
            break;
        }
        for &byte in label.as_bytes().iter().take(STATUS_SEGMENT_WIDTH.min(SCREEN_COLS - col)) {
            write_cell(col, STATUS_ROW, byte, STATUS_INACTIVE_ATTRIB);
            col += 1;
        }
        if col < SCREEN_COLS {
            write_cell(col, STATUS_ROW, b'|', STATUS_INACTIVE_ATTRIB);
            col += 1;
        }
    }
    while col < SCREEN_COLS {
        write_cell(col, STATUS_ROW, b' ', STATUS_INACTIVE_ATTRIB);
        col += 1;
    }
}

/// Applies a mouse-driver delta to a notional cursor cell and restores the
/// attribute underneath the old position, matching `move_mouse`'s
/// save-old/clamp-new/restore-attribute dance at a coarse, cell-granular
/// level (the original scales by sub-cell pixel factors `X_SCALE`/`Y_SCALE`,
/// which this text-only surface has no use for).
pub fn move_cursor(dx: i32, dy: i32) {
    let (x, y) = cursor();
    let new_x = (x as i32 + dx).clamp(0, SCREEN_COLS as i32 - 1) as usize;
    let new_y = (y as i32 - dy).clamp(0, NUM_ROWS as i32 - 1) as usize;
    set_cursor(new_x, new_y);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_cursor_clamps_to_screen_bounds() {
        set_cursor(1000, 1000);
        assert_eq!(cursor(), (SCREEN_COLS - 1, NUM_ROWS - 1));
    }
}
