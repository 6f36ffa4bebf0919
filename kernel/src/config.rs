//! Compile-time tunables for the fixed-capacity pools the kernel relies on.
//!
//! Every constant here bounds a worst case documented in the data model:
//! going over one of these is a legal failure condition (resource
//! exhaustion), not undefined behavior.

/// Number of process-control-block slots (pid 0 is the kernel, 1..MAX are
/// user processes).
pub const MAX_PROCESSES: usize = 100;

/// Open-file-table slots per process. Slot 0 is stdin, slot 1 is stdout.
pub const MAX_FILES: usize = 8;

/// Logical terminals multiplexed over the single VGA surface.
pub const NUM_TERMINALS: usize = 10;

/// Scrollback screens kept per terminal, in addition to the live page.
pub const MAX_SCROLLBACK: usize = 5;

/// Command-history ring capacity per terminal.
pub const MAX_HISTORY_CMDS: usize = 16;

/// Heap region-record pool size (bounds fragmentation, see `mm::heap`).
pub const MAX_REGIONS: usize = 500;

/// Size of the kernel heap's backing storage span.
pub const STORAGE_BYTES: usize = 24 * 1024 * 1024;

/// Virtual address the heap's backing storage is identity-mapped at.
pub const HEAP_VIRTUAL_BASE: usize = 192 * 1024 * 1024;

/// Program image slot size and the user virtual address it is mapped at.
pub const PROGRAM_IMAGE_SIZE: usize = 4 * 1024 * 1024;
pub const PROGRAM_IMAGE_VIRTUAL: usize = 128 * 1024 * 1024;

/// Physical base of the first per-pid 4 MiB program image slot (pid 1).
pub const PROGRAM_IMAGE_PHYSICAL_BASE: usize = 0x848000;

/// User virtual address vidmap maps real video memory to.
pub const VIDMAP_VIRTUAL: usize = 256 * 1024 * 1024;

/// Maximum length of an executable name, including the terminator.
pub const MAX_PROGRAM_NAME: usize = 32;

/// Maximum length of the argument string passed to a process.
pub const MAX_ARGS: usize = 100;

/// VGA text surface geometry. Row NUM_ROWS is the status bar; rows
/// 0..NUM_ROWS are terminal content.
pub const SCREEN_COLS: usize = 80;
pub const NUM_ROWS: usize = 24;

/// Timer ticks per second driving scheduler preemption.
pub const TIMER_HZ: u32 = 100;

/// Number of shells `main` spawns at boot, one per terminal 0..N so the
/// multiplexer starts with a usable session on every visible terminal.
pub const NUM_BOOT_SHELLS: usize = 3;

/// Name of the program `main` and `sys_halt`'s top-level-shell respawn path
/// both load; must exist in the filesystem image as a regular executable.
pub const SHELL_PROGRAM_NAME: &str = "shell";
