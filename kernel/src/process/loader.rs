//! Executable loader (§6 "ELF program contract"), ported from `task.c`'s
//! `load_program` (validates a 40-byte header, reads the entry address from
//! bytes 24-27, copies the whole file into the process's image page).

use crate::error::KernelError;
use crate::fs::descriptor::FileKind;
use crate::fs::image;
use crate::process::pcb::calc_program_start;

const MAGIC: [u8; 4] = [0x7F, b'E', b'L', b'F'];
const MIN_HEADER_LEN: usize = 40;
const ENTRY_OFFSET: usize = 24;
const COPY_CHUNK: usize = 4096;

/// Resolve `name` in the filesystem image, validate it as a loadable
/// executable, and copy its full contents into `pid`'s physical program
/// image slot. Returns the entry virtual address read from the header.
///
/// # Safety
/// The caller must have already loaded `pid`'s page directory (or
/// otherwise ensured `calc_program_start(pid)` is a valid, writable
/// physical address the kernel can write through directly).
pub unsafe fn load_program(pid: i32, name: &str) -> Result<u32, KernelError> {
    let dentry = image::read_dentry_by_name(name).ok_or(KernelError::ProgramNotFound)?;
    if dentry.kind != FileKind::Regular {
        return Err(KernelError::ProgramNotFound);
    }

    let length = image::inode_length(dentry.inode) as usize;
    if length < MIN_HEADER_LEN {
        return Err(KernelError::MalformedExecutable);
    }

    let mut header = [0u8; MIN_HEADER_LEN];
    let read = image::read_data(dentry.inode, 0, &mut header);
    if read < MIN_HEADER_LEN as i32 {
        return Err(KernelError::MalformedExecutable);
    }
    if header[0..4] != MAGIC {
        return Err(KernelError::MalformedExecutable);
    }
    let entry = u32::from_le_bytes([
        header[ENTRY_OFFSET],
        header[ENTRY_OFFSET + 1],
        header[ENTRY_OFFSET + 2],
        header[ENTRY_OFFSET + 3],
    ]);

    let dest_base = calc_program_start(pid) as *mut u8;
    let mut offset = 0u32;
    let mut chunk = [0u8; COPY_CHUNK];
    while (offset as usize) < length {
        let n = image::read_data(dentry.inode, offset, &mut chunk);
        if n <= 0 {
            break;
        }
        let n = n as usize;
        core::ptr::copy_nonoverlapping(chunk.as_ptr(), dest_base.add(offset as usize), n);
        offset += n as u32;
    }

    Ok(entry)
}
