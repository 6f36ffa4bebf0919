//! Structured kernel log service.
//!
//! A fixed-size, heap-free circular buffer of log entries, the way the
//! teacher's `log_service` module avoids pulling the `log` crate (and its
//! allocator-backed formatting target) into a kernel that has no allocator
//! until [`crate::mm::heap`] is initialized. Boot-sequence and subsystem-init
//! messages are recorded here in addition to being printed, so a later
//! `/proc`-style dump (or a debugger) can recover the last N events even if
//! the screen has scrolled them away.

use spin::Mutex;

const LOG_BUFFER_CAPACITY: usize = 256;
const LOG_MESSAGE_MAX_LEN: usize = 96;
const LOG_SUBSYSTEM_MAX_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

#[derive(Clone, Copy)]
pub struct LogEntry {
    pub level: LogLevel,
    subsystem: [u8; LOG_SUBSYSTEM_MAX_LEN],
    subsystem_len: u8,
    message: [u8; LOG_MESSAGE_MAX_LEN],
    message_len: u8,
}

impl LogEntry {
    const EMPTY: LogEntry = LogEntry {
        level: LogLevel::Info,
        subsystem: [0; LOG_SUBSYSTEM_MAX_LEN],
        subsystem_len: 0,
        message: [0; LOG_MESSAGE_MAX_LEN],
        message_len: 0,
    };

    pub fn subsystem(&self) -> &str {
        core::str::from_utf8(&self.subsystem[..self.subsystem_len as usize]).unwrap_or("")
    }

    pub fn message(&self) -> &str {
        core::str::from_utf8(&self.message[..self.message_len as usize]).unwrap_or("")
    }
}

struct LogBuffer {
    entries: [LogEntry; LOG_BUFFER_CAPACITY],
    next: usize,
    count: usize,
}

static LOG: Mutex<LogBuffer> = Mutex::new(LogBuffer {
    entries: [LogEntry::EMPTY; LOG_BUFFER_CAPACITY],
    next: 0,
    count: 0,
});

fn copy_truncated(dst: &mut [u8], src: &str) -> u8 {
    let n = src.len().min(dst.len());
    dst[..n].copy_from_slice(&src.as_bytes()[..n]);
    n as u8
}

/// Record a log entry. Never allocates; safe to call from interrupt context
/// with interrupts already disabled (matches the run-queue/ISR discipline in
/// §5).
pub fn klog(level: LogLevel, subsystem: &str, message: &str) {
    let mut buf = LOG.lock();
    let idx = buf.next;
    let mut entry = LogEntry::EMPTY;
    entry.level = level;
    entry.subsystem_len = copy_truncated(&mut entry.subsystem, subsystem);
    entry.message_len = copy_truncated(&mut entry.message, message);
    buf.entries[idx] = entry;
    buf.next = (buf.next + 1) % LOG_BUFFER_CAPACITY;
    buf.count = (buf.count + 1).min(LOG_BUFFER_CAPACITY);
}

/// Number of currently valid entries in the ring (<= LOG_BUFFER_CAPACITY).
pub fn log_count() -> usize {
    LOG.lock().count
}

/// Copy the most recent entry into `out`, if any exist.
pub fn last_entry(out: &mut LogEntry) -> bool {
    let buf = LOG.lock();
    if buf.count == 0 {
        return false;
    }
    let idx = (buf.next + LOG_BUFFER_CAPACITY - 1) % LOG_BUFFER_CAPACITY;
    *out = buf.entries[idx];
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_after_capacity() {
        for i in 0..(LOG_BUFFER_CAPACITY + 3) {
            klog(LogLevel::Info, "test", "entry");
            let _ = i;
        }
        assert_eq!(log_count(), LOG_BUFFER_CAPACITY);
    }
}
