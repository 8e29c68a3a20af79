//! the reports a mounted volume can produce
use std::fmt::{self, Display, Formatter};

/// volume geometry and usage, printed by `info`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeInfo {
    pub total_blocks: u16,
    pub fat_blocks: u8,
    pub root_index: u16,
    pub data_index: u16,
    pub data_count: u16,
    pub free_data_blocks: usize,
    pub free_entries: usize,
    pub entry_capacity: usize,
}

impl Display for VolumeInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "FS Info:")?;
        writeln!(f, "total_blk_count={}", self.total_blocks)?;
        writeln!(f, "fat_blk_count={}", self.fat_blocks)?;
        writeln!(f, "rdir_blk={}", self.root_index)?;
        writeln!(f, "data_blk={}", self.data_index)?;
        writeln!(f, "data_blk_count={}", self.data_count)?;
        writeln!(f, "fat_free_ratio={}/{}", self.free_data_blocks, self.data_count)?;
        writeln!(f, "rdir_free_ratio={}/{}", self.free_entries, self.entry_capacity)
    }
}

/// one line of the file listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileListing {
    pub name: String,
    pub size: u32,
    pub first_block: u16,
}

impl Display for FileListing {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "file: {}, size: {}, data_blk: {}",
            self.name, self.size, self.first_block
        )
    }
}
