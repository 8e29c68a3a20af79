use std::{
    io::{self, ErrorKind},
    ops::Range,
};

use crate::fs::BLOCK_SIZE;

/// API a storage device provides to the filesystem
///
/// Every transfer moves exactly one [BLOCK_SIZE] block.
pub trait BlockDevice {
    /// total number of blocks on this device
    fn block_count(&self) -> usize;

    /// read block `index` into `buf`
    fn read_block(&self, index: usize, buf: &mut [u8]) -> io::Result<()>;

    /// write `buf` back to block `index`
    fn write_block(&mut self, index: usize, buf: &[u8]) -> io::Result<()>;

    /// flush everything written so far, called once at unmount
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// byte range of block `index`, after checking the request is a whole in-range block
pub(crate) fn block_range(
    index: usize,
    buf_len: usize,
    block_count: usize,
) -> io::Result<Range<usize>> {
    if index >= block_count {
        return Err(io::Error::new(
            ErrorKind::InvalidInput,
            format!("block {index} is out of range, device has {block_count} blocks"),
        ));
    }
    if buf_len != BLOCK_SIZE {
        return Err(io::Error::new(
            ErrorKind::InvalidInput,
            format!("buffer of {buf_len} bytes is not a whole block"),
        ));
    }
    let start = index * BLOCK_SIZE;
    Ok(start..start + BLOCK_SIZE)
}
