//! a disk image file used as a block device
use std::{
    fs::{File, OpenOptions},
    io::{self, ErrorKind},
    path::Path,
};

use log::debug;
use memmap2::MmapMut;

use super::{block_dev::block_range, BlockDevice};
use crate::fs::BLOCK_SIZE;

/// an image file mapped into memory, one block after another
#[derive(Debug)]
pub struct ImageFile {
    mmap: MmapMut,
}

impl ImageFile {
    /// open an existing image file for read and write
    /// # Params
    /// - `image_path`: the path of the image file,\
    /// its size must be a positive multiple of [BLOCK_SIZE]
    pub fn open<P>(image_path: P) -> io::Result<Self>
    where
        P: AsRef<Path>,
    {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(image_path.as_ref())?;
        Self::map(file)
    }

    /// create a new zero-filled image file of `block_count` blocks,
    /// fails if the file already exists
    pub fn create<P>(image_path: P, block_count: usize) -> io::Result<Self>
    where
        P: AsRef<Path>,
    {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(image_path.as_ref())?;
        // all the content is set to zero by `set_len`
        file.set_len((block_count * BLOCK_SIZE) as u64)?;
        Self::map(file)
    }

    fn map(file: File) -> io::Result<Self> {
        let len = file.metadata()?.len();
        if len == 0 || len % BLOCK_SIZE as u64 != 0 {
            return Err(io::Error::new(
                ErrorKind::InvalidData,
                format!("image size {len} is not a positive multiple of {BLOCK_SIZE}"),
            ));
        }
        // Safety
        // The mapping is only accessed through this struct, and the image file
        // is not expected to be modified by other processes while mounted.
        let mmap = unsafe { MmapMut::map_mut(&file)? };
        debug!("mapped image file with {} blocks", len / BLOCK_SIZE as u64);
        Ok(Self { mmap })
    }
}

impl BlockDevice for ImageFile {
    fn block_count(&self) -> usize {
        self.mmap.len() / BLOCK_SIZE
    }

    fn read_block(&self, index: usize, buf: &mut [u8]) -> io::Result<()> {
        let range = block_range(index, buf.len(), self.block_count())?;
        buf.copy_from_slice(&self.mmap[range]);
        Ok(())
    }

    fn write_block(&mut self, index: usize, buf: &[u8]) -> io::Result<()> {
        let range = block_range(index, buf.len(), self.block_count())?;
        self.mmap[range].copy_from_slice(buf);
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.mmap.flush()
    }
}
