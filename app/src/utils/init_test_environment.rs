use std::io;

use crate::{
    device::{BlockDevice, MemDisk},
    fs::FileSystem,
    mkfs::format,
    utils::fs_size_calculator::total_block_count,
};

/// an in-memory disk formatted with `data_blocks` data blocks
pub fn formatted_disk(data_blocks: usize) -> MemDisk {
    let mut disk = MemDisk::new(total_block_count(data_blocks));
    format(&mut disk, data_blocks).expect("Failed to format test disk");
    disk
}

/// a filesystem with a freshly formatted in-memory disk mounted
pub fn mounted_fs(data_blocks: usize) -> FileSystem<MemDisk> {
    let mut fs = FileSystem::new();
    fs.mount(formatted_disk(data_blocks))
        .expect("Failed to mount test disk");
    fs
}

/// an in-memory disk whose writes start failing once `writes_left` runs out
pub struct FlakyDisk {
    pub disk: MemDisk,
    pub writes_left: usize,
}

impl BlockDevice for FlakyDisk {
    fn block_count(&self) -> usize {
        self.disk.block_count()
    }

    fn read_block(&self, index: usize, buf: &mut [u8]) -> io::Result<()> {
        self.disk.read_block(index, buf)
    }

    fn write_block(&mut self, index: usize, buf: &[u8]) -> io::Result<()> {
        if self.writes_left == 0 {
            return Err(io::Error::new(io::ErrorKind::Other, "injected write failure"));
        }
        self.writes_left -= 1;
        self.disk.write_block(index, buf)
    }
}

/// a mounted filesystem whose device accepts `writes_left` more block writes
pub fn flaky_fs(data_blocks: usize, writes_left: usize) -> FileSystem<FlakyDisk> {
    let mut fs = FileSystem::new();
    fs.mount(FlakyDisk {
        disk: formatted_disk(data_blocks),
        writes_left,
    })
    .expect("Failed to mount test disk");
    fs
}
