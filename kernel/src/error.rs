//! Internal kernel error type.
//!
//! This is the kernel-internal counterpart to the signed-`i32` system-call
//! ABI in [`crate::syscall`]. Subsystems below the syscall boundary return
//! `Result<T, KernelError>`; the dispatcher collapses any `Err` into `-1`
//! per §7 of the design (there is no in-band error channel other than the
//! syscall return value).

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelError {
    /// No pid slot available (process table exhausted).
    NoProcessSlot,
    /// The command line named a program that does not resolve to a regular
    /// file in the filesystem image.
    ProgramNotFound,
    /// The program's ELF header failed validation (§6 ELF program contract).
    MalformedExecutable,
    /// A file descriptor argument was out of range or not in use.
    InvalidFd,
    /// The requested fd is not open for the requested direction.
    PermissionDenied,
    /// The process's open-file table has no free slot.
    FileTableFull,
    /// A filename did not resolve through the VFS dispatch in §4.6.
    NameNotFound,
    /// No terminal slot was free to hand to a newly spawned top-level shell.
    NoTerminalSlot,
    /// A user-supplied pointer fell outside the range the syscall allows.
    InvalidPointer,
    /// `getargs` was called on a process that was started with no argument
    /// string.
    NoArguments,
    /// The kernel heap could not satisfy an allocation (region pool or
    /// backing storage exhausted).
    OutOfMemory,
    /// The call number does not correspond to any system call.
    UnknownSyscall,
    /// The system call exists but is intentionally unimplemented (§7 kind 5).
    Unimplemented,
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            KernelError::NoProcessSlot => "no process slot available",
            KernelError::ProgramNotFound => "program not found",
            KernelError::MalformedExecutable => "malformed executable",
            KernelError::InvalidFd => "invalid file descriptor",
            KernelError::PermissionDenied => "file descriptor not open for that operation",
            KernelError::FileTableFull => "file descriptor table full",
            KernelError::NameNotFound => "name not found",
            KernelError::NoTerminalSlot => "no terminal available",
            KernelError::InvalidPointer => "pointer outside permitted range",
            KernelError::NoArguments => "process has no argument string",
            KernelError::OutOfMemory => "kernel heap exhausted",
            KernelError::UnknownSyscall => "unknown system call",
            KernelError::Unimplemented => "system call not implemented",
        };
        f.write_str(msg)
    }
}

/// Collapse a kernel-internal result into the syscall ABI's signed return
/// value convention (§7): success values are non-negative, any error is -1.
pub fn to_syscall_result(result: Result<i32, KernelError>) -> i32 {
    result.unwrap_or(-1)
}
