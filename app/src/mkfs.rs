//! create our filesystem
use anyhow::{anyhow, Context};
use byte_unit::Byte;
use log::info;
use std::path::Path;

use crate::{
    device::{BlockDevice, ImageFile},
    fs::{
        AllocationTable, Directory, FsError, Result, SuperBlock, BLOCK_SIZE, MAX_DATA_BLOCKS,
    },
    utils::{fs_size_calculator, traits::BlockCodec},
};

/// write an empty volume with `data_blocks` data blocks onto `device`
/// # Params
/// - `device`: must have exactly as many blocks as the volume needs,
/// see [fs_size_calculator::total_block_count]
/// - `data_blocks`: between 1 and [MAX_DATA_BLOCKS]
///
/// # Return
/// the superblock of the new volume
pub fn format<D>(device: &mut D, data_blocks: usize) -> Result<SuperBlock>
where
    D: BlockDevice,
{
    if !(1..=MAX_DATA_BLOCKS).contains(&data_blocks) {
        return Err(FsError::InvalidArgument(format!(
            "data block count must be between 1 and {MAX_DATA_BLOCKS}, got {data_blocks}"
        )));
    }
    let superblock = SuperBlock::new(data_blocks as u16);
    if device.block_count() != superblock.total_blocks as usize {
        return Err(FsError::InvalidArgument(format!(
            "{data_blocks} data blocks need a device of {} blocks, this one has {}",
            superblock.total_blocks,
            device.block_count()
        )));
    }

    let mut block = vec![0u8; BLOCK_SIZE];
    superblock.encode_into(&mut block)?;
    device.write_block(0, &block)?;

    let fat = AllocationTable::new(superblock.fat_blocks as usize, data_blocks);
    for (i, chunk) in fat.to_bytes().chunks_exact(BLOCK_SIZE).enumerate() {
        device.write_block(1 + i, chunk)?;
    }

    device.write_block(
        superblock.root_index as usize,
        &Directory::default().to_block()?,
    )?;
    Ok(superblock)
}

/// create a new image file holding an empty volume
/// # Params
/// - `image_file_path`: the path of the image file, must not exist yet
/// - `data_blocks`: the number of data blocks
///
/// # Return
/// an [anyhow::Result] type to indicate whether the operation is successful
pub fn mkfs<P>(image_file_path: P, data_blocks: usize) -> anyhow::Result<()>
where
    P: AsRef<Path>,
{
    let path = image_file_path.as_ref();
    if !(1..=MAX_DATA_BLOCKS).contains(&data_blocks) {
        return Err(anyhow!(
            "data block count must be between 1 and {MAX_DATA_BLOCKS} ({} of data at most)",
            Byte::from_bytes((MAX_DATA_BLOCKS * BLOCK_SIZE) as u128).get_appropriate_unit(true)
        ));
    }
    let total_blocks = fs_size_calculator::total_block_count(data_blocks);
    let mut image = ImageFile::create(path, total_blocks)
        .with_context(|| format!("failed to create image file {}", path.display()))?;
    format(&mut image, data_blocks)?;
    image.close()?;
    info!(
        "created {} ({}) with {data_blocks} data blocks",
        path.display(),
        Byte::from_bytes(fs_size_calculator::image_size(data_blocks) as u128)
            .get_appropriate_unit(true)
    );
    Ok(())
}
