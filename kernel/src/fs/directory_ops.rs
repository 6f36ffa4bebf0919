//! Directory vtable (`dir_funcs` in `syscall.c`). `desc.pos` doubles as the
//! dentry index being iterated, exactly as `directory_read` uses
//! `file->pos` in the original.

use crate::fs::descriptor::{FileDescriptor, FileOps};
use crate::fs::image;

pub struct DirectoryOps;

pub static DIRECTORY_OPS: DirectoryOps = DirectoryOps;

impl FileOps for DirectoryOps {
    fn read(&self, desc: &mut FileDescriptor, buf: &mut [u8]) -> i32 {
        let dentry = match image::read_dentry_by_index(desc.pos as usize) {
            Some(d) => d,
            None => {
                desc.pos += 1;
                return 0;
            }
        };
        let name = dentry.name_str().as_bytes();
        let n = name.len().min(buf.len());
        buf[..n].copy_from_slice(&name[..n]);
        for slot in buf.iter_mut().skip(n) {
            *slot = 0;
        }
        desc.pos += 1;
        n as i32
    }

    /// Directories are read-only, matching the original (no `write_func`
    /// is even wired up for `dir_funcs`).
    fn write(&self, _desc: &mut FileDescriptor, _buf: &[u8]) -> i32 {
        -1
    }
}
