use std::io;

use super::{block_dev::block_range, BlockDevice};
use crate::fs::BLOCK_SIZE;

/// a zero-filled disk that only lives in memory
#[derive(Debug, Clone, Default)]
pub struct MemDisk {
    data: Vec<u8>,
}

impl MemDisk {
    pub fn new(block_count: usize) -> Self {
        Self {
            data: vec![0u8; block_count * BLOCK_SIZE],
        }
    }

    /// raw content of block `index`
    pub fn block(&self, index: usize) -> Option<&[u8]> {
        self.data.chunks_exact(BLOCK_SIZE).nth(index)
    }
}

impl BlockDevice for MemDisk {
    fn block_count(&self) -> usize {
        self.data.len() / BLOCK_SIZE
    }

    fn read_block(&self, index: usize, buf: &mut [u8]) -> io::Result<()> {
        let range = block_range(index, buf.len(), self.block_count())?;
        buf.copy_from_slice(&self.data[range]);
        Ok(())
    }

    fn write_block(&mut self, index: usize, buf: &[u8]) -> io::Result<()> {
        let range = block_range(index, buf.len(), self.block_count())?;
        self.data[range].copy_from_slice(buf);
        Ok(())
    }
}
