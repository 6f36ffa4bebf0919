//! Regular-file vtable (`fs_funcs` in `syscall.c`/`fs.c`).

use crate::fs::descriptor::{FileDescriptor, FileOps};
use crate::fs::image;

pub struct RegularFileOps;

pub static REGULAR_FILE_OPS: RegularFileOps = RegularFileOps;

impl FileOps for RegularFileOps {
    fn read(&self, desc: &mut FileDescriptor, buf: &mut [u8]) -> i32 {
        let inode = match desc.inode {
            Some(inode) => inode,
            None => return -1,
        };
        let bytes_read = image::read_data(inode, desc.pos, buf);
        if bytes_read > 0 {
            desc.pos += bytes_read as u32;
        }
        bytes_read
    }

    /// The image is read-only; every write fails, matching `fs_write`'s
    /// unconditional `-1` (there is no "fix" here, it's the contract).
    fn write(&self, _desc: &mut FileDescriptor, _buf: &[u8]) -> i32 {
        -1
    }
}
