//! PS/2 mouse packet decode (§11), ported from `mouse.c`'s packet-flags
//! bit layout. `decode_packet` is a pure function so the sign-extension and
//! button-bit extraction are host-testable without touching port I/O; the
//! ISR shim below owns the 3-byte packet assembly and screen-cursor update.

use spin::Mutex;

const LEFT_BUTTON: u8 = 1 << 0;
const RIGHT_BUTTON: u8 = 1 << 1;
const MIDDLE_BUTTON: u8 = 1 << 2;
const X_SIGN: u8 = 1 << 4;
const Y_SIGN: u8 = 1 << 5;
const X_OVERFLOW: u8 = 1 << 6;
const Y_OVERFLOW: u8 = 1 << 7;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MouseEvent {
    pub dx: i32,
    pub dy: i32,
    pub left: bool,
    pub right: bool,
    pub middle: bool,
}

/// Decode a 3-byte PS/2 mouse packet. Returns `None` if either axis
/// overflowed (the original silently drops these packets).
pub fn decode_packet(flags: u8, x_byte: u8, y_byte: u8) -> Option<MouseEvent> {
    if flags & X_OVERFLOW != 0 || flags & Y_OVERFLOW != 0 {
        return None;
    }
    let mut dx = x_byte as i32;
    if flags & X_SIGN != 0 {
        dx |= !0xffu32 as i32;
    }
    let mut dy = y_byte as i32;
    if flags & Y_SIGN != 0 {
        dy |= !0xffu32 as i32;
    }
    Some(MouseEvent {
        dx,
        dy,
        left: flags & LEFT_BUTTON != 0,
        right: flags & RIGHT_BUTTON != 0,
        middle: flags & MIDDLE_BUTTON != 0,
    })
}

struct PacketAssembly {
    bytes: [u8; 3],
    filled: usize,
}

static ASSEMBLY: Mutex<PacketAssembly> = Mutex::new(PacketAssembly {
    bytes: [0; 3],
    filled: 0,
});

/// Called from the mouse ISR trampoline with one freshly-read data-port
/// byte. Assembles a 3-byte packet and, once complete, decodes and applies
/// it to the screen cursor.
pub fn on_byte() {
    let mut assembly = ASSEMBLY.lock();
    let byte = read_data_byte();
    assembly.bytes[assembly.filled] = byte;
    assembly.filled += 1;
    if assembly.filled == 3 {
        let [flags, x, y] = assembly.bytes;
        assembly.filled = 0;
        drop(assembly);
        if let Some(event) = decode_packet(flags, x, y) {
            crate::terminal::screen::move_cursor(event.dx, event.dy);
        }
    }
}

/// # Safety / stub
/// The real driver reads from PS/2 data port `0x60` after confirming
/// `0x64`'s output-buffer-full bit; register-level PS/2 decoding is a
/// non-goal per §1, so this stands in with a fixed no-movement byte.
fn read_data_byte() -> u8 {
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_deltas_decode_unsigned() {
        let event = decode_packet(LEFT_BUTTON, 4, 8).unwrap();
        assert_eq!(event.dx, 4);
        assert_eq!(event.dy, 8);
        assert!(event.left);
        assert!(!event.right);
    }

    #[test]
    fn negative_deltas_sign_extend() {
        let event = decode_packet(X_SIGN | Y_SIGN, 0xfe, 0xf0).unwrap();
        assert_eq!(event.dx, -2);
        assert_eq!(event.dy, -16);
    }

    #[test]
    fn overflow_packets_are_dropped() {
        assert!(decode_packet(X_OVERFLOW, 1, 1).is_none());
        assert!(decode_packet(Y_OVERFLOW, 1, 1).is_none());
    }
}
