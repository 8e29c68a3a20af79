//! This module contains functions to calculate the size of different fs components

use crate::fs::{BLOCK_SIZE, FAT_EOC};

/// allocation table slots stored in one block
pub const FAT_SLOTS_PER_BLOCK: usize = BLOCK_SIZE / std::mem::size_of::<u16>();

/// calculate how many blocks the allocation table needs
/// # Arguments
/// - `data_blocks`: the number of data blocks
/// # Example
/// ```
/// use blockfat::utils::fs_size_calculator::fat_block_count;
/// assert_eq!(fat_block_count(1), 1);
/// assert_eq!(fat_block_count(2048), 1);
/// assert_eq!(fat_block_count(2049), 2);
/// assert_eq!(fat_block_count(8192), 4);
/// ```
pub const fn fat_block_count(data_blocks: usize) -> usize {
    data_blocks.div_ceil(FAT_SLOTS_PER_BLOCK)
}

/// calculate the total block count of a volume:
/// superblock + allocation table + root directory + data region
/// # Example
/// ```
/// use blockfat::utils::fs_size_calculator::total_block_count;
/// assert_eq!(total_block_count(100), 1 + 1 + 1 + 100);
/// assert_eq!(total_block_count(8192), 1 + 4 + 1 + 8192);
/// ```
pub const fn total_block_count(data_blocks: usize) -> usize {
    1 + fat_block_count(data_blocks) + 1 + data_blocks
}

/// calculate the size in bytes of an image holding `data_blocks` data blocks
/// # Example
/// ```
/// use blockfat::utils::fs_size_calculator::image_size;
/// assert_eq!(image_size(1), 4 * 4096);
/// ```
pub const fn image_size(data_blocks: usize) -> u64 {
    (total_block_count(data_blocks) * BLOCK_SIZE) as u64
}

/// whether the allocation table region of `fat_blocks` blocks
/// can address `data_blocks` slots without reaching the end-of-chain value
pub const fn fat_can_address(fat_blocks: usize, data_blocks: usize) -> bool {
    fat_blocks * FAT_SLOTS_PER_BLOCK >= data_blocks && data_blocks < FAT_EOC as usize
}
