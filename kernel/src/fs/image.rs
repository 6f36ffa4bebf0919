//! In-RAM filesystem image (C6 external interface), ported from `fs.c`'s
//! boot-block/dentry/inode/data-block layout.
//!
//! The image is a single flat blob (the multiboot module the floppy driver
//! loads, see `crate::drivers::fdc`): a boot block holding a master entry
//! and up to 63 dentries, followed by one `Inode` per file, followed by
//! 4 KiB data blocks. Everything is read through a base pointer set once
//! at boot by [`set_image_base`] — there is no allocation here, matching
//! the read-only, in-place nature of the original image.

use crate::fs::descriptor::FileKind;

pub const NAME_MAX: usize = 32;
const BLOCK_SIZE: usize = 4096;
const MAX_DATA_BLOCKS_PER_INODE: usize = 1023;

const DENTRY_RTC: u32 = 0;
const DENTRY_DIRECTORY: u32 = 1;
const DENTRY_FILE: u32 = 2;

#[repr(C)]
struct MasterEntry {
    num_dentries: u32,
    num_inodes: u32,
    num_data_blocks: u32,
    _reserved: [u8; 52],
}

#[repr(C)]
struct RawDentry {
    name: [u8; NAME_MAX],
    kind: u32,
    inode: u32,
    _reserved: [u8; 24],
}

#[repr(C)]
struct Inode {
    length: u32,
    data_blocks: [u32; MAX_DATA_BLOCKS_PER_INODE],
}

pub struct Dentry {
    pub name: [u8; NAME_MAX],
    pub name_len: usize,
    pub kind: FileKind,
    pub inode: usize,
}

impl Dentry {
    pub fn name_str(&self) -> &str {
        core::str::from_utf8(&self.name[..self.name_len]).unwrap_or("")
    }
}

static mut IMAGE_BASE: usize = 0;

/// Record where the filesystem image was loaded.
///
/// # Safety
/// Must run once, before any `read_dentry_*`/`read_data` call, with `base`
/// pointing at a valid boot block (the floppy driver's job, see
/// `crate::drivers::fdc::load_filesystem_image`).
pub unsafe fn set_image_base(base: usize) {
    IMAGE_BASE = base;
}

fn base() -> usize {
    // SAFETY: set once at boot before any reader runs (§5 single-mutator).
    unsafe { core::ptr::addr_of!(IMAGE_BASE).read() }
}

fn master_entry() -> &'static MasterEntry {
    unsafe { &*(base() as *const MasterEntry) }
}

fn raw_dentries() -> &'static [RawDentry] {
    let count = master_entry().num_dentries as usize;
    let ptr = (base() + core::mem::size_of::<MasterEntry>()) as *const RawDentry;
    unsafe { core::slice::from_raw_parts(ptr, count) }
}

fn inode_at(index: usize) -> &'static Inode {
    // Boot block occupies one 4 KiB block regardless of how many dentries
    // it actually holds, matching `fs.c`'s `sizeof(bootblock_t)` offset.
    let inodes_base = base() + BLOCK_SIZE;
    let ptr = (inodes_base + index * core::mem::size_of::<Inode>()) as *const Inode;
    unsafe { &*ptr }
}

fn data_block(index: usize) -> &'static [u8; BLOCK_SIZE] {
    let num_inodes = master_entry().num_inodes as usize;
    let data_base = base() + BLOCK_SIZE + num_inodes * core::mem::size_of::<Inode>();
    let ptr = (data_base + index * BLOCK_SIZE) as *const [u8; BLOCK_SIZE];
    unsafe { &*ptr }
}

fn file_kind(raw: u32) -> FileKind {
    match raw {
        DENTRY_RTC => FileKind::Rtc,
        DENTRY_DIRECTORY => FileKind::Directory,
        _ => FileKind::Regular,
    }
}

fn dentry_from_raw(raw: &RawDentry) -> Dentry {
    let name_len = raw.name.iter().position(|&b| b == 0).unwrap_or(NAME_MAX);
    Dentry {
        name: raw.name,
        name_len,
        kind: file_kind(raw.kind),
        inode: raw.inode as usize,
    }
}

pub fn read_dentry_by_index(index: usize) -> Option<Dentry> {
    raw_dentries().get(index).map(dentry_from_raw)
}

pub fn read_dentry_by_name(name: &str) -> Option<Dentry> {
    if name.is_empty() || name.len() > NAME_MAX {
        return None;
    }
    raw_dentries()
        .iter()
        .map(dentry_from_raw)
        .find(|d| d.name_str() == name)
}

pub fn num_dentries() -> usize {
    master_entry().num_dentries as usize
}

/// Copy up to `buf.len()` bytes of `inode`'s file content starting at
/// `offset`. Returns the number of bytes actually copied, or `-1` if a
/// data-block index in the inode is out of range for the image (a
/// corrupt-filesystem condition, matching `read_data`'s `-1` path).
pub fn read_data(inode: usize, offset: u32, buf: &mut [u8]) -> i32 {
    let inode_ref = inode_at(inode);
    let file_length = inode_ref.length;
    if file_length / BLOCK_SIZE as u32 > MAX_DATA_BLOCKS_PER_INODE as u32 {
        return -1;
    }
    if offset > file_length {
        return 0;
    }
    let mut remaining = (buf.len() as u32).min(file_length - offset) as usize;
    let mut offset = offset as usize;
    let mut written = 0usize;
    let num_blocks = num_data_blocks();

    while remaining > 0 {
        let cur_block = offset / BLOCK_SIZE;
        let block_index = inode_ref.data_blocks[cur_block] as usize;
        if block_index >= num_blocks {
            return -1;
        }
        let block = data_block(block_index);
        let in_block_offset = offset % BLOCK_SIZE;
        let bytes_left_in_block = BLOCK_SIZE - in_block_offset;
        let n = remaining.min(bytes_left_in_block);
        buf[written..written + n].copy_from_slice(&block[in_block_offset..in_block_offset + n]);
        remaining -= n;
        written += n;
        offset += n;
    }
    written as i32
}

pub fn num_data_blocks() -> usize {
    master_entry().num_data_blocks as usize
}

pub fn inode_length(inode: usize) -> u32 {
    inode_at(inode).length
}
