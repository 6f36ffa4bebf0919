//! Per-process file-descriptor slots and the `FileOps` vtable (C6).
//!
//! Ported from `syscall.c`'s `file_info_t` and its four `file_ops_t`
//! vtables (`terminal_funcs`, `fs_funcs`, `dir_funcs`, `rtc_funcs`). A
//! `FileOps` trait object stands in for the C struct of function pointers;
//! `&'static dyn FileOps` is cheap to copy into a descriptor and carries no
//! per-instance state, matching the original's shared, stateless vtables.
//!
//! The data model's "packed flags" (`in_use`, `can_read`, `can_write`) are
//! a [`bitflags`] set rather than three separate `bool`s, matching the
//! original's single `flags` byte per descriptor.

use bitflags::bitflags;

bitflags! {
    #[derive(Clone, Copy, Default)]
    pub struct FdFlags: u8 {
        const IN_USE = 0b001;
        const CAN_READ = 0b010;
        const CAN_WRITE = 0b100;
    }
}

/// Which vtable a descriptor is bound to. Kept distinct from the dentry's
/// on-disk type tag (`DENTRY_RTC`/`DENTRY_DIRECTORY`/`DENTRY_FILE`) because
/// `/dev/stdin` and `/dev/stdout` are terminal-backed without ever touching
/// the filesystem image.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Rtc,
    Terminal,
    Regular,
    Directory,
}

/// The operations a descriptor's vtable provides, one object per `FileKind`.
/// `open` takes no descriptor (it runs before the slot is fully populated,
/// matching `*_open`'s C signature); `read`/`write`/`close` act on the
/// descriptor that owns this vtable pointer.
pub trait FileOps: Sync {
    fn open(&self) -> i32 {
        0
    }
    fn read(&self, desc: &mut FileDescriptor, buf: &mut [u8]) -> i32;
    fn write(&self, desc: &mut FileDescriptor, buf: &[u8]) -> i32;
    fn close(&self, desc: &mut FileDescriptor) -> i32 {
        0
    }
}

#[derive(Clone, Copy)]
pub struct FileDescriptor {
    pub ops: Option<&'static dyn FileOps>,
    pub inode: Option<usize>,
    pub pos: u32,
    pub flags: FdFlags,
    pub kind: FileKind,
}

impl FileDescriptor {
    pub const CLOSED: FileDescriptor = FileDescriptor {
        ops: None,
        inode: None,
        pos: 0,
        flags: FdFlags::empty(),
        kind: FileKind::Regular,
    };

    pub fn in_use(&self) -> bool {
        self.flags.contains(FdFlags::IN_USE)
    }

    pub fn can_read(&self) -> bool {
        self.flags.contains(FdFlags::CAN_READ)
    }

    pub fn can_write(&self) -> bool {
        self.flags.contains(FdFlags::CAN_WRITE)
    }

    pub fn read(&mut self, buf: &mut [u8]) -> i32 {
        if !self.in_use() || !self.can_read() {
            return -1;
        }
        match self.ops {
            Some(ops) => ops.read(self, buf),
            None => -1,
        }
    }

    pub fn write(&mut self, buf: &[u8]) -> i32 {
        if !self.in_use() || !self.can_write() {
            return -1;
        }
        match self.ops {
            Some(ops) => ops.write(self, buf),
            None => -1,
        }
    }

    pub fn close(&mut self) -> i32 {
        if !self.in_use() {
            return -1;
        }
        let result = match self.ops {
            Some(ops) => ops.close(self),
            None => 0,
        };
        *self = FileDescriptor::CLOSED;
        result
    }
}
