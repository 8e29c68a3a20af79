use serde::{Deserialize, Serialize};

use crate::utils::{fs_size_calculator, traits::BlockCodec};

use super::{
    error::{FsError, Result},
    FS_SIGNATURE,
};

/// The superblock of this filesystem, stored in block 0.
///
/// Layout of a volume:
/// - superblock
/// - allocation table, `fat_blocks` blocks starting at block 1
/// - root directory, one block at `root_index`
/// - data region, `data_count` blocks starting at `data_index`
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SuperBlock {
    /// magic bytes, must be [FS_SIGNATURE]
    pub signature: [u8; 8],
    /// total blocks of the device, superblock included
    pub total_blocks: u16,
    /// root directory block index
    pub root_index: u16,
    /// data region start index
    pub data_index: u16,
    /// number of data blocks
    pub data_count: u16,
    /// number of allocation table blocks
    pub fat_blocks: u8,
}

impl SuperBlock {
    /// geometry of a fresh volume holding `data_count` data blocks
    pub fn new(data_count: u16) -> Self {
        let fat_blocks = fs_size_calculator::fat_block_count(data_count as usize);
        let total_blocks = fs_size_calculator::total_block_count(data_count as usize);
        Self {
            signature: FS_SIGNATURE,
            total_blocks: total_blocks as u16,
            root_index: fat_blocks as u16 + 1,
            data_index: fat_blocks as u16 + 2,
            data_count,
            fat_blocks: fat_blocks as u8,
        }
    }

    /// check this superblock describes a volume on a device of `device_blocks` blocks
    pub fn validate(&self, device_blocks: usize) -> Result<()> {
        if self.signature != FS_SIGNATURE {
            return Err(FsError::InvalidVolume(format!(
                "bad signature {:?}",
                String::from_utf8_lossy(&self.signature)
            )));
        }
        if self.total_blocks as usize != device_blocks {
            return Err(FsError::InvalidVolume(format!(
                "superblock claims {} blocks but the device has {device_blocks}",
                self.total_blocks
            )));
        }
        let fat_blocks = self.fat_blocks as usize;
        if fat_blocks == 0 || self.root_index as usize != fat_blocks + 1 {
            return Err(FsError::InvalidVolume(format!(
                "root directory at block {} does not follow {fat_blocks} allocation table blocks",
                self.root_index
            )));
        }
        if self.data_index != self.root_index + 1
            || self.data_index as usize + self.data_count as usize > device_blocks
        {
            return Err(FsError::InvalidVolume(format!(
                "data region {}+{} does not fit after the root directory",
                self.data_index, self.data_count
            )));
        }
        if !fs_size_calculator::fat_can_address(fat_blocks, self.data_count as usize) {
            return Err(FsError::InvalidVolume(format!(
                "{fat_blocks} allocation table blocks can't address {} data blocks",
                self.data_count
            )));
        }
        Ok(())
    }
}

impl BlockCodec for SuperBlock {}
