//! File-descriptor table & VFS shim (C6), ported from `syscall.c`'s
//! `sys_open`/`sys_close` and the four `file_ops_t` vtables.

pub mod descriptor;
pub mod directory_ops;
pub mod image;
pub mod regular_ops;
pub mod rtc_ops;
pub mod terminal_ops;

use crate::error::KernelError;
use descriptor::{FdFlags, FileDescriptor, FileKind, FileOps};
use directory_ops::DIRECTORY_OPS;
use regular_ops::REGULAR_FILE_OPS;
use rtc_ops::RTC_OPS;
use terminal_ops::TERMINAL_OPS;

const STDIN_FD: usize = 0;
const STDOUT_FD: usize = 1;
const RTC_DEFAULT_HZ: u32 = 2;

/// Resolves `name` to a `(vtable, kind, inode)` triple per §4.6's VFS
/// dispatch: `/dev/stdin` and `/dev/stdout` are terminal-backed without
/// touching the image; everything else is looked up by dentry type.
fn resolve(name: &str) -> Result<(&'static dyn FileOps, FileKind, Option<usize>), KernelError> {
    match name {
        "/dev/stdin" => Ok((&TERMINAL_OPS, FileKind::Terminal, None)),
        "/dev/stdout" => Ok((&TERMINAL_OPS, FileKind::Terminal, None)),
        "/dev/rtc" => Ok((&RTC_OPS, FileKind::Rtc, None)),
        _ => {
            let dentry = image::read_dentry_by_name(name).ok_or(KernelError::NameNotFound)?;
            let ops: &'static dyn FileOps = match dentry.kind {
                FileKind::Directory => &DIRECTORY_OPS,
                FileKind::Regular => &REGULAR_FILE_OPS,
                FileKind::Rtc => &RTC_OPS,
                FileKind::Terminal => &TERMINAL_OPS,
            };
            Ok((ops, dentry.kind, Some(dentry.inode)))
        }
    }
}

/// Opens `name`, matching `syscall_open`'s slot assignment: `/dev/stdin`/
/// `/dev/stdout` always land on the fixed stdin/stdout slots (hard-assigned
/// the way `syscall_open` writes `open_files[STDIN_FD]`/`open_files
/// [STDOUT_FD]` directly), so callers get fd 0/1 back per §4.5's syscall
/// table; everything else scans for the first free slot starting at 2.
/// `/dev/stdin` is read-only, `/dev/stdout` is write-only, `/dev/rtc` opens
/// read+write, and regular files/directories open read-only, matching the
/// original's `can_write = 0` for `DENTRY_FILE`/`DENTRY_DIRECTORY` (access
/// control is additionally enforced by each vtable's `read`/`write`, which
/// simply fail where it doesn't apply).
pub fn open(files: &mut [FileDescriptor], name: &str) -> Result<usize, KernelError> {
    let (ops, kind, inode) = resolve(name)?;
    let slot = match name {
        "/dev/stdin" => STDIN_FD,
        "/dev/stdout" => STDOUT_FD,
        _ => files
            .iter()
            .position(|d| !d.in_use())
            .ok_or(KernelError::FileTableFull)?,
    };

    let mut flags = FdFlags::IN_USE;
    match name {
        "/dev/stdin" => flags |= FdFlags::CAN_READ,
        "/dev/stdout" => flags |= FdFlags::CAN_WRITE,
        _ if kind == FileKind::Rtc => flags |= FdFlags::CAN_READ | FdFlags::CAN_WRITE,
        _ => flags |= FdFlags::CAN_READ,
    }

    files[slot] = FileDescriptor {
        ops: Some(ops),
        inode,
        pos: if kind == FileKind::Rtc { RTC_DEFAULT_HZ } else { 0 },
        flags,
        kind,
    };
    ops.open();
    Ok(slot)
}

/// Initialize pid 0's (or any freshly spawned process's) `/dev/stdin`
/// (fd 0) and `/dev/stdout` (fd 1) slots directly, matching `execute`'s
/// hand-wiring of the first two descriptors ahead of any `open` syscall.
pub fn init_standard_fds(files: &mut [FileDescriptor]) {
    files[STDIN_FD] = FileDescriptor {
        ops: Some(&TERMINAL_OPS),
        inode: None,
        pos: 0,
        flags: FdFlags::IN_USE | FdFlags::CAN_READ,
        kind: FileKind::Terminal,
    };
    files[STDOUT_FD] = FileDescriptor {
        ops: Some(&TERMINAL_OPS),
        inode: None,
        pos: 0,
        flags: FdFlags::IN_USE | FdFlags::CAN_WRITE,
        kind: FileKind::Terminal,
    };
}
