//! Floppy/DMA filesystem image load (§11), out of scope per §1's explicit
//! non-goals beyond this one seam: `load_filesystem_image` stands in for
//! `fdc.c`'s cylinder-at-a-time DMA read, returning a statically linked
//! image instead. A real driver can replace this function's body without
//! `crate::fs` noticing, since callers only ever see the returned slice.

/// The image bytes baked into the kernel binary at build time. Replace this
/// file to change the bundled filesystem; nothing else in the kernel reads
/// it directly except [`load_filesystem_image`].
static FILESYSTEM_IMAGE: &[u8] = include_bytes!("../../assets/fsimg.bin");

/// Returns the filesystem image's bytes as they would have been read off
/// the floppy. Real hardware initialization (`fdc_init`, motor control,
/// DMA buffer setup, cylinder seeks) is not modeled.
pub fn load_filesystem_image() -> &'static [u8] {
    FILESYSTEM_IMAGE
}
