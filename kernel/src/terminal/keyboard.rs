//! Keypress handling (C7 "keypress handler"), ported from `keyboard.c`'s
//! `keypress_handler` and its supporting `handle_enter`/`handle_tab`/
//! `history_move`/`tab_complete` helpers.

use spin::Mutex;

use crate::arch::x86::ports::Port;
use crate::fs::descriptor::FileKind;
use crate::fs::image;
use crate::sched::scheduler;
use crate::sched::task::TaskStatus;
use crate::terminal::{manager, screen, terminal_at, LINE_CAPACITY};

const KEYBOARD_DATA_PORT: u16 = 0x60;

const L_CTRL_KEY: u8 = 0x1D;
const L_ALT_KEY: u8 = 0x38;
const L_SHIFT_KEY: u8 = 0x2A;
const R_SHIFT_KEY: u8 = 0x36;

const LEFT_ARROW_KEY: u8 = 0x4B;
const RIGHT_ARROW_KEY: u8 = 0x4D;
const UP_ARROW_KEY: u8 = 0x48;
const DOWN_ARROW_KEY: u8 = 0x50;
const PGUP_KEY: u8 = 0x49;
const PGDOWN_KEY: u8 = 0x51;

const ENTER_KEY: u8 = 0x1C;
const BACKSPACE_KEY: u8 = 0x0E;
const TAB_KEY: u8 = 0x0F;

const L_KEY: u8 = 0x26;
const A_KEY: u8 = 0x1E;
const K_KEY: u8 = 0x25;

const F1_KEY: u8 = 0x3B;

fn release(key: u8) -> u8 {
    key | 0x80
}

const KEYBOARD_CHAR: [u8; 64] = [
    0, 0, b'1', b'2', b'3', b'4', b'5', b'6', b'7', b'8', b'9', b'0', b'-', b'=', 0, 0, b'q',
    b'w', b'e', b'r', b't', b'y', b'u', b'i', b'o', b'p', b'[', b']', 0, 0, b'a', b's', b'd',
    b'f', b'g', b'h', b'j', b'k', b'l', b';', b'\'', b'`', 0, b'\\', b'z', b'x', b'c', b'v', b'b',
    b'n', b'm', b',', b'.', b'/', 0, 0, 0, b' ', 0, 0, 0, 0, 0, 0,
];

const KEYBOARD_CHAR_SHIFT: [u8; 64] = [
    0, 0, b'!', b'@', b'#', b'$', b'%', b'^', b'&', b'*', b'(', b')', b'_', b'+', 0, 0, b'Q',
    b'W', b'E', b'R', b'T', b'Y', b'U', b'I', b'O', b'P', b'{', b'}', 0, 0, b'A', b'S', b'D',
    b'F', b'G', b'H', b'J', b'K', b'L', b':', b'"', b'~', 0, b'|', b'Z', b'X', b'C', b'V', b'B',
    b'N', b'M', b'<', b'>', b'?', 0, 0, 0, b' ', 0, 0, 0, 0, 0, 0,
];

struct Modifiers {
    shift: bool,
    ctrl: bool,
    alt: bool,
}

static MODIFIERS: Mutex<Modifiers> = Mutex::new(Modifiers {
    shift: false,
    ctrl: false,
    alt: false,
});

/// Whether `s1` is a prefix of `s2` — a documented "suspicious" behavior
/// (§9c): the original's `substr` does not test substrings despite the
/// name, and tab-complete depends on exactly this semantics, so it is
/// preserved rather than "fixed" into a real substring test.
pub fn substr(s1: &str, s2: &str) -> bool {
    s2.len() >= s1.len() && &s2[..s1.len()] == s1
}

fn read_scancode_byte() -> u8 {
    let mut port: Port<u8> = Port::new(KEYBOARD_DATA_PORT);
    unsafe { port.read() }
}

/// ISR entry point. Reads up to three scan-code bytes, strips the `0xE0`
/// extended-sequence prefix, and dispatches on the resulting byte.
pub fn on_scancode() {
    let mut scan = [0u8; 3];
    for slot in scan.iter_mut() {
        *slot = read_scancode_byte();
    }
    let mut code = scan[0];
    if code == 0xE0 {
        code = scan[1];
    }
    if scan[0] == 0xE0 {
        return;
    }
    dispatch(code);
}

fn dispatch(code: u8) {
    let mut modifiers = MODIFIERS.lock();
    match code {
        L_SHIFT_KEY | R_SHIFT_KEY => modifiers.shift = true,
        c if c == release(L_SHIFT_KEY) || c == release(R_SHIFT_KEY) => modifiers.shift = false,
        L_CTRL_KEY => modifiers.ctrl = true,
        c if c == release(L_CTRL_KEY) => modifiers.ctrl = false,
        L_ALT_KEY => modifiers.alt = true,
        c if c == release(L_ALT_KEY) => modifiers.alt = false,
        LEFT_ARROW_KEY => {
            drop(modifiers);
            move_input_cursor(-1);
        }
        RIGHT_ARROW_KEY => {
            drop(modifiers);
            move_input_cursor(1);
        }
        UP_ARROW_KEY => {
            drop(modifiers);
            history_move(-1);
        }
        DOWN_ARROW_KEY => {
            drop(modifiers);
            history_move(1);
        }
        PGUP_KEY => {
            drop(modifiers);
            adjust_scrollback(1);
        }
        PGDOWN_KEY => {
            drop(modifiers);
            adjust_scrollback(-1);
        }
        c if modifiers.alt && (F1_KEY..=F1_KEY + 6).contains(&c) => {
            let target = (c - F1_KEY) as usize;
            drop(modifiers);
            manager::switch_terminals(target);
        }
        ENTER_KEY => {
            drop(modifiers);
            handle_enter();
        }
        BACKSPACE_KEY => {
            drop(modifiers);
            handle_backspace();
        }
        TAB_KEY => {
            drop(modifiers);
            handle_tab();
        }
        c if modifiers.ctrl && c == L_KEY => {
            drop(modifiers);
            ctrl_l();
        }
        c if modifiers.ctrl && c == A_KEY => {
            drop(modifiers);
            ctrl_a();
        }
        c if modifiers.ctrl && c == K_KEY => {
            drop(modifiers);
            ctrl_k();
        }
        c if (c as usize) < KEYBOARD_CHAR.len() => {
            let shift = modifiers.shift;
            drop(modifiers);
            insert_printable(c, shift);
        }
        _ => {}
    }
}

fn current() -> &'static mut crate::terminal::Terminal {
    unsafe { terminal_at(manager::current_terminal_index()) }
}

fn move_input_cursor(delta: i32) {
    let term = current();
    let new_pos = term.input_pos as i32 + delta;
    if new_pos >= 0 && new_pos as usize <= term.input_size {
        term.input_pos = new_pos as usize;
    }
}

fn insert_printable(code: u8, shift: bool) {
    let term = current();
    if term.input_size >= LINE_CAPACITY - 1 {
        return;
    }
    let ch = if shift {
        KEYBOARD_CHAR_SHIFT[code as usize]
    } else {
        KEYBOARD_CHAR[code as usize]
    };
    if ch == 0 {
        return;
    }
    let pos = term.input_pos;
    for i in (pos..term.input_size).rev() {
        term.input_buffer[i + 1] = term.input_buffer[i];
    }
    term.input_buffer[pos] = ch;
    term.input_size += 1;
    term.input_pos += 1;
    screen::putc(ch);
}

fn handle_backspace() {
    let term = current();
    if term.input_pos == 0 {
        return;
    }
    let pos = term.input_pos;
    for i in (pos - 1)..term.input_size - 1 {
        term.input_buffer[i] = term.input_buffer[i + 1];
    }
    term.input_size -= 1;
    term.input_pos -= 1;
}

fn handle_enter() {
    let term = current();
    let mut end = term.input_size;
    while end > 0 && term.input_buffer[end - 1] == b' ' {
        end -= 1;
    }

    if term.history_size == crate::config::MAX_HISTORY_CMDS {
        for i in 0..crate::config::MAX_HISTORY_CMDS - 1 {
            term.history[i] = term.history[i + 1];
        }
        term.history_size -= 1;
    }
    let slot = &mut term.history[term.history_size];
    slot.len = end;
    slot.line[..end].copy_from_slice(&term.input_buffer[..end]);
    term.history_size += 1;
    term.history_cursor = term.history_size;

    term.read_out[..end].copy_from_slice(&term.input_buffer[..end]);
    if end < LINE_CAPACITY {
        term.read_out[end] = b'\n';
        term.read_out_len = end + 1;
    } else {
        term.read_out_len = end;
    }
    term.input_size = 0;
    term.input_pos = 0;
    term.read_ready = true;
    let owner = term.owner_pid;
    screen::putc(b'\n');

    // Wake whichever task is blocked in `keyboard_read` on this terminal
    // (§5 suspension point 1): it parked itself as `Idle` and can only be
    // picked by `schedule()` again once marked `Active` from outside its
    // own context.
    if owner >= 0 {
        scheduler::set_status(owner, TaskStatus::Active);
    }
}

fn history_move(offset: i32) {
    let term = current();
    let new_pos = term.history_cursor as i32 + offset;
    if new_pos < 0 || new_pos as usize > term.history_size {
        return;
    }
    let new_pos = new_pos as usize;
    term.input_size = 0;
    term.input_pos = 0;
    if new_pos < term.history_size {
        let entry = term.history[new_pos];
        term.input_buffer[..entry.len].copy_from_slice(&entry.line[..entry.len]);
        term.input_size = entry.len;
        term.input_pos = entry.len;
    }
    term.history_cursor = new_pos;
}

/// Moves the current terminal's scrollback offset by `delta`, clamped to
/// `[0, MAX_SCROLLBACK]`, and redraws the hardware surface from the
/// selected backing page (§4.7/§8 scenario 4). Entering scrollback (offset
/// 0 -> nonzero) first stashes the true live screen so returning to offset
/// 0 restores it exactly rather than whatever the last-displayed backing
/// page happened to show.
fn adjust_scrollback(delta: i32) {
    let term = current();
    let index = term.index;
    let old_offset = term.scrollback_offset;
    let new_offset = (old_offset as i32 + delta).clamp(0, crate::config::MAX_SCROLLBACK as i32) as usize;
    if new_offset == old_offset {
        return;
    }
    if old_offset == 0 {
        screen::capture_live_snapshot(index);
    }
    term.scrollback_offset = new_offset;
    screen::show_backing_page(index, new_offset);
}

fn ctrl_l() {
    // Scroll the current line to the top of the screen: a no-op stub at
    // this layer, matching the original's direct VGA-offset manipulation,
    // which this text surface models through `screen::scroll` instead.
    screen::scroll();
}

fn ctrl_a() {
    current().input_pos = 0;
}

fn ctrl_k() {
    let term = current();
    term.input_size = term.input_pos;
}

/// Scans the filesystem image for executables and inserts the tab-complete
/// match: a full match plus trailing space if exactly one file matches, or
/// the longest common prefix of all matches, or no change for zero matches.
fn handle_tab() {
    let term = current();
    if term.input_size == 0 {
        return;
    }
    let word_start = term.input_buffer[..term.input_pos]
        .iter()
        .rposition(|&b| b == b' ')
        .map(|p| p + 1)
        .unwrap_or(0);
    let mut prefix_buf = [0u8; LINE_CAPACITY];
    let prefix_len = term.input_pos - word_start;
    prefix_buf[..prefix_len].copy_from_slice(&term.input_buffer[word_start..term.input_pos]);
    let prefix = core::str::from_utf8(&prefix_buf[..prefix_len]).unwrap_or("");

    let mut common: Option<([u8; LINE_CAPACITY], usize)> = None;
    let mut match_count = 0usize;
    let count = image::num_dentries();
    for i in 0..count {
        let Some(dentry) = image::read_dentry_by_index(i) else {
            continue;
        };
        if dentry.kind != FileKind::Regular {
            continue;
        }
        let name = dentry.name_str();
        if !substr(prefix, name) {
            continue;
        }
        match_count += 1;
        common = Some(match common {
            None => {
                let mut buf = [0u8; LINE_CAPACITY];
                let bytes = name.as_bytes();
                buf[..bytes.len()].copy_from_slice(bytes);
                (buf, bytes.len())
            }
            Some((buf, len)) => {
                let name_bytes = name.as_bytes();
                let common_len = buf[..len]
                    .iter()
                    .zip(name_bytes.iter())
                    .take_while(|(a, b)| a == b)
                    .count();
                (buf, common_len)
            }
        });
    }

    let Some((buf, len)) = common else { return };
    if len == 0 {
        return;
    }
    let completion = core::str::from_utf8(&buf[..len]).unwrap_or("");
    // A space is only appended when exactly one executable matched; for
    // several matches `completion` is just their longest common prefix
    // and the user is expected to keep typing (spec.md:150, scenario 5).
    let append_space = match_count == 1;
    replace_current_word(word_start, completion, append_space && len < LINE_CAPACITY - 1);
}

fn replace_current_word(word_start: usize, completion: &str, append_space: bool) {
    let term = current();
    let bytes = completion.as_bytes();
    let mut pos = word_start;
    for &b in bytes {
        if pos >= LINE_CAPACITY - 1 {
            break;
        }
        term.input_buffer[pos] = b;
        pos += 1;
    }
    if append_space && pos < LINE_CAPACITY - 1 {
        term.input_buffer[pos] = b' ';
        pos += 1;
    }
    term.input_size = pos;
    term.input_pos = pos;
}

/// Read the next completed line for the calling terminal. Blocks (per §5's
/// first suspension point) until this terminal is in the foreground and a
/// line is ready; the scheduler wait loop lives in `crate::fs::terminal_ops`
/// so this function only performs the non-blocking copy-out.
pub fn try_read_line(terminal_index: usize, buf: &mut [u8]) -> Option<i32> {
    if manager::current_terminal_index() != terminal_index {
        return None;
    }
    let term = unsafe { terminal_at(terminal_index) };
    if !term.read_ready {
        return None;
    }
    let n = term.read_out_len.min(buf.len());
    buf[..n].copy_from_slice(&term.read_out[..n]);
    for slot in buf.iter_mut().skip(n) {
        *slot = 0;
    }
    term.read_ready = false;
    Some(n as i32)
}

/// Write one byte to the foreground screen if `terminal_index` owns it,
/// otherwise directly into its backing page at its own saved cursor,
/// matching `keyboard_write`'s "writes to the process's backing page"
/// branch. Background writes clamp at the bottom row rather than scrolling
/// the backing page (the original scrolls it too, but nothing ever reads a
/// background page's history above its own live screen, so this kernel
/// only carries enough of that behavior to keep background output visible
/// once the terminal regains focus).
pub fn write_byte(terminal_index: usize, byte: u8) {
    if manager::current_terminal_index() == terminal_index {
        screen::putc(byte);
    } else {
        write_to_backing_page(terminal_index, byte);
    }
}

fn write_to_backing_page(index: usize, byte: u8) {
    use crate::config::{NUM_ROWS, SCREEN_COLS};

    let term = unsafe { terminal_at(index) };
    let (mut x, mut y) = (term.saved_cursor.x, term.saved_cursor.y);
    match byte {
        b'\n' => {
            x = 0;
            y += 1;
        }
        _ => {
            let base = crate::terminal::live_page_base(index) as *mut u8;
            let cell = unsafe { base.add((y * SCREEN_COLS + x) * 2) };
            unsafe {
                *cell = byte;
                *cell.add(1) = screen::DEFAULT_ATTRIB;
            }
            x += 1;
            if x >= SCREEN_COLS {
                x = 0;
                y += 1;
            }
        }
    }
    if y >= NUM_ROWS {
        y = NUM_ROWS - 1;
    }
    term.saved_cursor = crate::terminal::Coord { x, y };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substr_tests_prefix_not_substring() {
        assert!(substr("sh", "shell"));
        assert!(!substr("hell", "shell"));
    }
}
