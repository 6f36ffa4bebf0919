//! Raw VGA text-mode surface at physical `0xb8000`.
//!
//! This is the hardware substrate only: a single 80x25 character/attribute
//! grid written with `write_volatile`. It backs early boot diagnostics and
//! the panic handler, both of which run before [`crate::terminal`] has
//! claimed the screen. Once terminals are live, each one keeps its own
//! off-screen backing page (§7) and blits the focused terminal onto this
//! same buffer; see `crate::terminal::screen`.

use core::{fmt, ptr::write_volatile};

use lazy_static::lazy_static;
use spin::Mutex;

#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Color {
    Black = 0,
    Blue = 1,
    Green = 2,
    Cyan = 3,
    Red = 4,
    Magenta = 5,
    Brown = 6,
    LightGray = 7,
    DarkGray = 8,
    LightBlue = 9,
    LightGreen = 10,
    LightCyan = 11,
    LightRed = 12,
    Pink = 13,
    Yellow = 14,
    White = 15,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct ColorCode(pub u8);

impl ColorCode {
    pub fn new(foreground: Color, background: Color) -> ColorCode {
        ColorCode(((background as u8) << 4) | (foreground as u8))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct ScreenChar {
    pub ascii_character: u8,
    pub color_code: ColorCode,
}

pub const BUFFER_HEIGHT: usize = 25;
pub const BUFFER_WIDTH: usize = 80;
pub const VGA_PHYSICAL_ADDRESS: usize = 0xb8000;

#[repr(transparent)]
pub struct Buffer {
    pub chars: [[ScreenChar; BUFFER_WIDTH]; BUFFER_HEIGHT],
}

/// # Safety
/// `0xb8000` is the well-known physical address of the VGA text buffer,
/// identity-mapped for the lifetime of the kernel.
pub unsafe fn vga_buffer() -> &'static mut Buffer {
    &mut *(VGA_PHYSICAL_ADDRESS as *mut Buffer)
}

pub struct Writer {
    column_position: usize,
    row_position: usize,
    color_code: ColorCode,
    buffer: &'static mut Buffer,
}

impl Writer {
    pub fn write_byte(&mut self, byte: u8) {
        match byte {
            b'\n' => self.new_line(),
            byte => {
                if self.column_position >= BUFFER_WIDTH {
                    self.new_line();
                }

                let row = self.row_position;
                let col = self.column_position;
                let color_code = self.color_code;

                // SAFETY: row < BUFFER_HEIGHT is an invariant of new_line(),
                // col < BUFFER_WIDTH was just checked above.
                unsafe {
                    write_volatile(
                        &mut self.buffer.chars[row][col],
                        ScreenChar {
                            ascii_character: byte,
                            color_code,
                        },
                    );
                }
                self.column_position += 1;
            }
        }
    }

    fn new_line(&mut self) {
        if self.row_position + 1 < BUFFER_HEIGHT {
            self.row_position += 1;
        } else {
            for row in 1..BUFFER_HEIGHT {
                for col in 0..BUFFER_WIDTH {
                    // SAFETY: row in 1..BUFFER_HEIGHT, col in 0..BUFFER_WIDTH.
                    let character = unsafe { core::ptr::read_volatile(&self.buffer.chars[row][col]) };
                    unsafe {
                        write_volatile(&mut self.buffer.chars[row - 1][col], character);
                    }
                }
            }
            self.clear_row(BUFFER_HEIGHT - 1);
        }
        self.column_position = 0;
    }

    fn clear_row(&mut self, row: usize) {
        let blank = ScreenChar {
            ascii_character: b' ',
            color_code: self.color_code,
        };
        for col in 0..BUFFER_WIDTH {
            // SAFETY: row passed in is always < BUFFER_HEIGHT by caller.
            unsafe {
                write_volatile(&mut self.buffer.chars[row][col], blank);
            }
        }
    }

    pub fn write_string(&mut self, s: &str) {
        for byte in s.bytes() {
            match byte {
                0x20..=0x7e | b'\n' => self.write_byte(byte),
                _ => self.write_byte(0xfe),
            }
        }
    }
}

impl fmt::Write for Writer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write_string(s);
        Ok(())
    }
}

lazy_static! {
    pub static ref WRITER: Mutex<Writer> = Mutex::new(Writer {
        column_position: 0,
        row_position: 0,
        color_code: ColorCode::new(Color::White, Color::Black),
        // SAFETY: see vga_buffer(); this is the sole owner of the static
        // mapping, enforced by the enclosing Mutex.
        buffer: unsafe { vga_buffer() },
    });
}

#[doc(hidden)]
pub fn _print(args: fmt::Arguments) {
    use core::fmt::Write;

    use super::interrupts;

    interrupts::without_interrupts(|| {
        WRITER.lock().write_fmt(args).expect("VGA write_fmt failed");
    });
}
