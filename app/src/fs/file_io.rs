//! read and write data through open files
use log::{debug, warn};

use crate::device::BlockDevice;

use super::{
    error::{FsError, Result},
    DirEntry, FileSystem, Volume, BLOCK_SIZE, FAT_EOC,
};

impl<D: BlockDevice> FileSystem<D> {
    /// write `data` at the current offset of `fd`, growing the file as needed
    /// # Return
    /// the number of bytes written, less than `data.len()` (maybe 0)
    /// when the volume runs out of free data blocks
    pub fn write(&mut self, fd: usize, data: &[u8]) -> Result<usize> {
        let volume = self.volume_mut()?;
        let (handle, entry) = volume.handle_entry(fd)?;
        debug!(
            "write() called with fd: {fd}, file: {:?}, offset: {}, count: {}",
            entry.name(),
            handle.offset,
            data.len()
        );
        if data.is_empty() {
            return Ok(0);
        }

        let mut written = 0;
        let outcome = volume.write_chain(handle.entry, handle.offset, data, &mut written);

        // whatever reached the device is kept, even when the device failed midway
        let end = handle.offset + written;
        let entry = volume.entry_mut(handle.entry)?;
        if end > entry.size as usize {
            entry.size = end as u32;
        }
        volume.open_files.get_mut(fd)?.offset = end;
        outcome.map(|()| written)
    }

    /// read up to `buf.len()` bytes from the current offset of `fd`
    /// # Return
    /// the number of bytes read, 0 at the end of the file
    pub fn read(&mut self, fd: usize, buf: &mut [u8]) -> Result<usize> {
        let volume = self.volume_mut()?;
        let (handle, entry) = volume.handle_entry(fd)?;
        debug!(
            "read() called with fd: {fd}, file: {:?}, offset: {}, count: {}",
            entry.name(),
            handle.offset,
            buf.len()
        );
        let size = entry.size as usize;
        if handle.offset >= size {
            return Ok(0);
        }
        let should_read = buf.len().min(size - handle.offset);

        let mut total_read = 0;
        let outcome = volume.read_chain(
            &entry,
            handle.offset,
            &mut buf[..should_read],
            &mut total_read,
        );
        volume.open_files.get_mut(fd)?.offset += total_read;
        outcome.map(|()| total_read)
    }
}

/// data block operations
impl<D: BlockDevice> Volume<D> {
    /// find the `index`-th block of the file in directory slot `entry_index`,
    /// allocating it when the chain ends right before it
    /// # Return
    /// `None` if a block was needed but the volume is full
    fn find_data_block(&mut self, entry_index: usize, index: usize) -> Result<Option<u16>> {
        let first = self.entry(entry_index)?.first_block;
        let mut block = if first == FAT_EOC {
            let Some(block) = self.fat.allocate() else {
                return Ok(None);
            };
            self.entry_mut(entry_index)?.first_block = block;
            block
        } else {
            self.fat.check(first)?
        };
        for _ in 0..index {
            block = match self.fat.next(block)? {
                Some(next) => next,
                None => match self.extend_chain(block) {
                    Some(next) => next,
                    None => return Ok(None),
                },
            };
        }
        Ok(Some(block))
    }

    /// allocate a block and append it after the chain end `tail`
    fn extend_chain(&mut self, tail: u16) -> Option<u16> {
        let block = self.fat.allocate()?;
        self.fat.link(tail, block);
        Some(block)
    }

    /// copy `data` into the chain of directory slot `entry_index`, starting at byte `start`;
    /// `written` counts the bytes that reached the device
    fn write_chain(
        &mut self,
        entry_index: usize,
        start: usize,
        data: &[u8],
        written: &mut usize,
    ) -> Result<()> {
        let Some(mut block) = self.find_data_block(entry_index, start / BLOCK_SIZE)? else {
            warn!("no free data block left, nothing written");
            return Ok(());
        };
        let mut scratch = vec![0u8; BLOCK_SIZE];
        loop {
            let offset_in_block = (start + *written) % BLOCK_SIZE;
            let len = (BLOCK_SIZE - offset_in_block).min(data.len() - *written);
            let chunk = &data[*written..*written + len];
            let target = self.data_block(block);

            if len == BLOCK_SIZE {
                self.device.write_block(target, chunk)?;
            } else {
                // partial block: read, modify, write
                self.device.read_block(target, &mut scratch)?;
                scratch[offset_in_block..offset_in_block + len].copy_from_slice(chunk);
                self.device.write_block(target, &scratch)?;
            }
            *written += len;
            if *written == data.len() {
                return Ok(());
            }

            block = match self.fat.next(block)? {
                Some(next) => next,
                None => match self.extend_chain(block) {
                    Some(next) => next,
                    None => {
                        warn!(
                            "no free data block left, wrote {} of {} bytes",
                            *written,
                            data.len()
                        );
                        return Ok(());
                    }
                },
            };
        }
    }

    /// fill `buf` from the chain of `entry`, starting at byte `start`;
    /// `total_read` counts the bytes copied
    fn read_chain(
        &self,
        entry: &DirEntry,
        start: usize,
        buf: &mut [u8],
        total_read: &mut usize,
    ) -> Result<()> {
        if buf.is_empty() {
            return Ok(());
        }
        let first = self.fat.walk(entry.first_block, start / BLOCK_SIZE);
        let Some(mut block) = stop_at_corruption(entry, first)? else {
            warn!(
                "chain of {:?} ends before offset {start} of its {} bytes",
                entry.name(),
                entry.size
            );
            return Ok(());
        };
        let mut scratch = vec![0u8; BLOCK_SIZE];
        // only the first block is read from the middle
        let mut offset_in_block = start % BLOCK_SIZE;
        loop {
            let len = (BLOCK_SIZE - offset_in_block).min(buf.len() - *total_read);
            self.device.read_block(self.data_block(block), &mut scratch)?;
            buf[*total_read..*total_read + len]
                .copy_from_slice(&scratch[offset_in_block..offset_in_block + len]);
            *total_read += len;
            offset_in_block = 0;
            if *total_read == buf.len() {
                return Ok(());
            }

            match stop_at_corruption(entry, self.fat.next(block))? {
                Some(next) => block = next,
                None => {
                    warn!(
                        "chain of {:?} ends after {} of its {} bytes",
                        entry.name(),
                        start + *total_read,
                        entry.size
                    );
                    return Ok(());
                }
            }
        }
    }
}

/// a broken link ends the chain for readers
fn stop_at_corruption(entry: &DirEntry, link: Result<Option<u16>>) -> Result<Option<u16>> {
    match link {
        Err(FsError::Corrupted(reason)) => {
            warn!("stop reading {:?}: {reason}", entry.name());
            Ok(None)
        }
        link => link,
    }
}
