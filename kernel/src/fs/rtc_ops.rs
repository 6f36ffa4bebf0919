//! RTC vtable (`rtc_funcs` in `syscall.c`). A descriptor's virtual
//! frequency is carried in `desc.pos` (there is no other per-descriptor
//! storage available), matching the original's `file->pos` reuse for the
//! same purpose.

use crate::drivers::rtc;
use crate::fs::descriptor::{FileDescriptor, FileOps};
use crate::sched::scheduler;

const DEFAULT_HZ: u32 = 2;

pub struct RtcOps;

pub static RTC_OPS: RtcOps = RtcOps;

impl FileOps for RtcOps {
    fn open(&self) -> i32 {
        rtc::open();
        0
    }

    /// Blocks until one virtual period of this descriptor's frequency has
    /// elapsed, counted in units of the chip's actual (effective) rate,
    /// matching `rtc_read`'s "wait for the next interrupt at my rate" when
    /// the hardware is programmed faster than what this caller asked for.
    /// Per §5's second suspension point, the wait yields to the scheduler
    /// every iteration rather than spinning alone on the CPU: nothing
    /// external wakes this task early (the condition is elapsed time, not
    /// an event), so it stays `Active` and keeps taking its turn in the
    /// rotation until the tick count catches up.
    fn read(&self, desc: &mut FileDescriptor, _buf: &mut [u8]) -> i32 {
        let want_hz = if desc.pos == 0 { DEFAULT_HZ } else { desc.pos };
        let effective_hz = rtc::effective_hz().max(want_hz);
        let period = (effective_hz / want_hz).max(1) as u64;
        let start = rtc::ticks();
        while rtc::ticks() - start < period {
            scheduler::schedule();
        }
        0
    }

    /// Expects a 4-byte little-endian frequency and moves this descriptor
    /// from its old rate to the new one, matching `rtc_write`.
    fn write(&self, desc: &mut FileDescriptor, buf: &[u8]) -> i32 {
        if buf.len() < 4 {
            return -1;
        }
        let new_hz = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
        let old_hz = if desc.pos == 0 { DEFAULT_HZ } else { desc.pos };
        match rtc::change_rate(old_hz, new_hz) {
            Ok(()) => {
                desc.pos = new_hz;
                4
            }
            Err(()) => -1,
        }
    }

    fn close(&self, desc: &mut FileDescriptor) -> i32 {
        let hz = if desc.pos == 0 { DEFAULT_HZ } else { desc.pos };
        rtc::close(hz);
        0
    }
}
