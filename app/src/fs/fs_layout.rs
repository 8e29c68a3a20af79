//! what does our filesystem look like in the memory

use log::{debug, info};

use crate::{device::BlockDevice, utils::traits::BlockCodec};

use super::{
    error::{FsError, Result},
    AllocationTable, DirEntry, Directory, FileListing, OpenFile, OpenFileTable, SuperBlock,
    VolumeInfo, BLOCK_SIZE, FILE_MAX_COUNT,
};

/// a mounted volume: the device plus every piece of metadata loaded from it
#[derive(Debug)]
pub struct Volume<D> {
    pub(crate) device: D,
    pub(crate) superblock: SuperBlock,
    pub(crate) fat: AllocationTable,
    pub(crate) directory: Directory,
    pub(crate) open_files: OpenFileTable,
}

impl<D: BlockDevice> Volume<D> {
    /// read and validate the superblock, then load the allocation table and the root directory
    fn load(device: D) -> Result<Self> {
        let mut block = vec![0u8; BLOCK_SIZE];
        device.read_block(0, &mut block)?;
        let (superblock, _) = SuperBlock::decode_from(&block)?;
        superblock.validate(device.block_count())?;

        let mut raw_fat = vec![0u8; superblock.fat_blocks as usize * BLOCK_SIZE];
        for (i, chunk) in raw_fat.chunks_exact_mut(BLOCK_SIZE).enumerate() {
            device.read_block(1 + i, chunk)?;
        }
        let fat = AllocationTable::from_bytes(&raw_fat, superblock.data_count as usize);

        device.read_block(superblock.root_index as usize, &mut block)?;
        let directory = Directory::from_block(&block)?;

        Ok(Self {
            device,
            superblock,
            fat,
            directory,
            open_files: OpenFileTable::default(),
        })
    }

    /// write the allocation table, then the root directory, back to the device
    fn flush(&mut self) -> Result<()> {
        let raw_fat = self.fat.to_bytes();
        for (i, chunk) in raw_fat.chunks_exact(BLOCK_SIZE).enumerate() {
            self.device.write_block(1 + i, chunk)?;
        }
        let block = self.directory.to_block()?;
        self.device
            .write_block(self.superblock.root_index as usize, &block)?;
        Ok(())
    }

    /// device block index of data block `slot`
    #[inline]
    pub(crate) fn data_block(&self, slot: u16) -> usize {
        self.superblock.data_index as usize + slot as usize
    }

    /// the handle `fd` and a copy of the directory entry it is bound to
    pub(crate) fn handle_entry(&self, fd: usize) -> Result<(OpenFile, DirEntry)> {
        let handle = *self.open_files.get(fd)?;
        let entry = *self.entry(handle.entry)?;
        Ok((handle, entry))
    }

    pub(crate) fn entry(&self, index: usize) -> Result<&DirEntry> {
        self.directory
            .entry(index)
            .ok_or_else(|| FsError::NotFound(format!("directory slot {index}")))
    }

    pub(crate) fn entry_mut(&mut self, index: usize) -> Result<&mut DirEntry> {
        self.directory
            .entry_mut(index)
            .ok_or_else(|| FsError::NotFound(format!("directory slot {index}")))
    }

    fn find(&self, name: &str) -> Result<usize> {
        self.directory
            .find(name)
            .ok_or_else(|| FsError::NotFound(format!("file {name:?}")))
    }
}

/// The filesystem API. It holds at most one mounted [Volume];
/// every operation except [FileSystem::mount] needs one.
#[derive(Debug)]
pub struct FileSystem<D> {
    volume: Option<Volume<D>>,
}

impl<D> Default for FileSystem<D> {
    fn default() -> Self {
        Self { volume: None }
    }
}

/// mount and unmount
impl<D: BlockDevice> FileSystem<D> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_mounted(&self) -> bool {
        self.volume.is_some()
    }

    /// mount the volume stored on `device`
    ///
    /// Fails without touching the current state if a volume is already mounted.
    /// On any other failure the device is dropped and nothing stays mounted.
    pub fn mount(&mut self, device: D) -> Result<()> {
        if self.is_mounted() {
            return Err(FsError::AlreadyMounted);
        }
        let volume = Volume::load(device)?;
        info!(
            "mounted volume: {} blocks, {} data blocks, {} files",
            volume.superblock.total_blocks,
            volume.superblock.data_count,
            volume.directory.iter().count()
        );
        self.volume = Some(volume);
        Ok(())
    }

    /// flush the metadata, close the device and hand it back
    ///
    /// Fails if any file is still open. If the device fails while flushing,
    /// the volume stays mounted.
    pub fn unmount(&mut self) -> Result<D> {
        let volume = self.volume_mut()?;
        let open = volume.open_files.in_use();
        if open > 0 {
            return Err(FsError::ResourceBusy(format!("{open} files are still open")));
        }
        volume.flush()?;
        volume.device.close()?;
        let volume = self.volume.take().ok_or(FsError::NotMounted)?;
        info!("unmounted volume");
        Ok(volume.device)
    }

    pub(crate) fn volume(&self) -> Result<&Volume<D>> {
        self.volume.as_ref().ok_or(FsError::NotMounted)
    }

    pub(crate) fn volume_mut(&mut self) -> Result<&mut Volume<D>> {
        self.volume.as_mut().ok_or(FsError::NotMounted)
    }
}

/// reports
impl<D: BlockDevice> FileSystem<D> {
    /// volume geometry and free space
    pub fn info(&self) -> Result<VolumeInfo> {
        let volume = self.volume()?;
        let superblock = &volume.superblock;
        Ok(VolumeInfo {
            total_blocks: superblock.total_blocks,
            fat_blocks: superblock.fat_blocks,
            root_index: superblock.root_index,
            data_index: superblock.data_index,
            data_count: superblock.data_count,
            free_data_blocks: volume.fat.free_count(),
            free_entries: volume.directory.free_count(),
            entry_capacity: FILE_MAX_COUNT,
        })
    }

    /// every file in directory order
    pub fn list(&self) -> Result<Vec<FileListing>> {
        let volume = self.volume()?;
        Ok(volume
            .directory
            .iter()
            .map(|(_, entry)| FileListing {
                name: entry.name().into_owned(),
                size: entry.size,
                first_block: entry.first_block,
            })
            .collect())
    }
}

/// root directory operations
impl<D: BlockDevice> FileSystem<D> {
    /// create an empty file called `name`
    pub fn create(&mut self, name: &str) -> Result<()> {
        info!("create() called with name: {name:?}");
        let volume = self.volume_mut()?;
        let index = volume.directory.insert(name)?;
        debug!("file {name:?} stored in directory slot {index}");
        Ok(())
    }

    /// delete the file called `name` and release its blocks
    /// # Return
    /// the number of data blocks released
    pub fn delete(&mut self, name: &str) -> Result<usize> {
        info!("delete() called with name: {name:?}");
        let volume = self.volume_mut()?;
        let index = volume.find(name)?;
        if volume.open_files.references(index) {
            return Err(FsError::ResourceBusy(format!("file {name:?} is open")));
        }
        let entry = volume
            .directory
            .remove(index)
            .ok_or_else(|| FsError::NotFound(format!("file {name:?}")))?;
        let released = volume.fat.release_chain(entry.first_block);
        debug!("released {released} blocks of {name:?}");
        Ok(released)
    }
}

/// open file operations
impl<D: BlockDevice> FileSystem<D> {
    /// open the file called `name`, returning a file descriptor positioned at offset 0
    pub fn open(&mut self, name: &str) -> Result<usize> {
        info!("open() called with name: {name:?}");
        let volume = self.volume_mut()?;
        let index = volume.find(name)?;
        volume.open_files.open(index)
    }

    pub fn close(&mut self, fd: usize) -> Result<()> {
        info!("close() called with fd: {fd}");
        self.volume_mut()?.open_files.close(fd).map(|_| ())
    }

    /// current size of the file behind `fd`
    pub fn stat(&self, fd: usize) -> Result<usize> {
        let (_, entry) = self.volume()?.handle_entry(fd)?;
        Ok(entry.size as usize)
    }

    /// current offset of `fd`
    pub fn tell(&self, fd: usize) -> Result<usize> {
        Ok(self.volume()?.open_files.get(fd)?.offset)
    }

    /// move `fd` to `offset`, which can't be past the end of the file
    pub fn seek(&mut self, fd: usize, offset: usize) -> Result<()> {
        debug!("seek() called with fd: {fd}, offset: {offset}");
        let volume = self.volume_mut()?;
        let (_, entry) = volume.handle_entry(fd)?;
        if offset > entry.size as usize {
            return Err(FsError::InvalidArgument(format!(
                "offset {offset} is past the end of {:?} ({} bytes)",
                entry.name(),
                entry.size
            )));
        }
        volume.open_files.get_mut(fd)?.offset = offset;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        device::MemDisk,
        mkfs::format,
        utils::init_test_environment::{flaky_fs, formatted_disk, mounted_fs},
        FAT_EOC, OPEN_MAX_COUNT,
    };

    #[test]
    fn test_mount_fresh_volume() {
        let fs = mounted_fs(100);
        let info = fs.info().unwrap();
        assert_eq!(info.total_blocks, 103);
        assert_eq!(info.fat_blocks, 1);
        assert_eq!(info.root_index, 2);
        assert_eq!(info.data_index, 3);
        assert_eq!(info.data_count, 100);
        // data block 0 is reserved
        assert_eq!(info.free_data_blocks, 99);
        assert_eq!(info.free_entries, FILE_MAX_COUNT);
        assert!(fs.list().unwrap().is_empty());
    }

    #[test]
    fn test_double_mount_keeps_state() {
        let mut fs = mounted_fs(10);
        fs.create("kept").unwrap();
        let fd = fs.open("kept").unwrap();

        assert!(matches!(
            fs.mount(formatted_disk(20)),
            Err(FsError::AlreadyMounted)
        ));
        assert_eq!(fs.info().unwrap().data_count, 10);
        assert_eq!(fs.stat(fd).unwrap(), 0);
        assert_eq!(fs.list().unwrap().len(), 1);
    }

    #[test]
    fn test_mount_rejects_invalid_devices() {
        let mut fs = FileSystem::new();
        // never formatted
        assert!(matches!(
            fs.mount(MemDisk::new(10)),
            Err(FsError::InvalidVolume(_))
        ));
        assert!(!fs.is_mounted());

        // superblock disagrees with the device size
        let mut disk = MemDisk::new(20);
        let mut block = vec![0u8; BLOCK_SIZE];
        SuperBlock::new(10).encode_into(&mut block).unwrap();
        disk.write_block(0, &block).unwrap();
        assert!(matches!(fs.mount(disk), Err(FsError::InvalidVolume(_))));
        assert!(!fs.is_mounted());

        // still usable afterwards
        fs.mount(formatted_disk(10)).unwrap();
        assert!(fs.is_mounted());
    }

    #[test]
    fn test_operations_need_a_mounted_volume() {
        let mut fs = FileSystem::<MemDisk>::new();
        assert!(matches!(fs.unmount(), Err(FsError::NotMounted)));
        assert!(matches!(fs.info(), Err(FsError::NotMounted)));
        assert!(matches!(fs.list(), Err(FsError::NotMounted)));
        assert!(matches!(fs.create("a"), Err(FsError::NotMounted)));
        assert!(matches!(fs.delete("a"), Err(FsError::NotMounted)));
        assert!(matches!(fs.open("a"), Err(FsError::NotMounted)));
        assert!(matches!(fs.close(0), Err(FsError::NotMounted)));
        assert!(matches!(fs.stat(0), Err(FsError::NotMounted)));
        assert!(matches!(fs.seek(0, 0), Err(FsError::NotMounted)));
        assert!(matches!(fs.read(0, &mut [0u8; 4]), Err(FsError::NotMounted)));
        assert!(matches!(fs.write(0, b"data"), Err(FsError::NotMounted)));
    }

    #[test]
    fn test_unmount_with_open_file_fails() {
        let mut fs = mounted_fs(10);
        fs.create("a").unwrap();
        let fd = fs.open("a").unwrap();
        assert!(matches!(fs.unmount(), Err(FsError::ResourceBusy(_))));
        assert!(fs.is_mounted());
        fs.close(fd).unwrap();
        fs.unmount().unwrap();
        assert!(!fs.is_mounted());
    }

    #[test]
    fn test_failed_flush_keeps_volume_mounted() {
        let mut fs = flaky_fs(10, 0);
        fs.create("a").unwrap();
        assert!(matches!(fs.unmount(), Err(FsError::Device(_))));
        assert!(fs.is_mounted());
        assert_eq!(fs.list().unwrap().len(), 1);

        // retry once the device recovers
        fs.volume_mut().unwrap().device.writes_left = usize::MAX;
        let disk = fs.unmount().unwrap();
        assert!(!fs.is_mounted());
        let mut fs = FileSystem::new();
        fs.mount(disk.disk).unwrap();
        assert_eq!(fs.list().unwrap()[0].name, "a");
    }

    #[test]
    fn test_metadata_survives_remount() {
        let mut fs = mounted_fs(10);
        fs.create("a").unwrap();
        fs.create("b").unwrap();
        let fd = fs.open("b").unwrap();
        assert_eq!(fs.write(fd, &[9u8; 5000]).unwrap(), 5000);
        fs.close(fd).unwrap();
        fs.delete("a").unwrap();
        let listing = fs.list().unwrap();
        let info = fs.info().unwrap();

        let disk = fs.unmount().unwrap();
        let mut fs = FileSystem::new();
        fs.mount(disk).unwrap();
        assert_eq!(fs.list().unwrap(), listing);
        assert_eq!(fs.info().unwrap(), info);

        let fd = fs.open("b").unwrap();
        let mut buf = vec![0u8; 6000];
        assert_eq!(fs.read(fd, &mut buf).unwrap(), 5000);
        assert!(buf[..5000].iter().all(|b| *b == 9));
    }

    #[test]
    fn test_create_open_stat() {
        let mut fs = mounted_fs(10);
        for name in ["a.txt", "x", "0123456789abcde"] {
            fs.create(name).unwrap();
            let fd = fs.open(name).unwrap();
            assert_eq!(fs.stat(fd).unwrap(), 0);
            assert_eq!(fs.tell(fd).unwrap(), 0);
        }
        let listing = fs.list().unwrap();
        assert_eq!(listing.len(), 3);
        assert_eq!(listing[0].name, "a.txt");
        assert_eq!(listing[0].first_block, FAT_EOC);
    }

    #[test]
    fn test_directory_full() {
        let mut fs = mounted_fs(10);
        for i in 0..FILE_MAX_COUNT {
            fs.create(&format!("f{i}")).unwrap();
        }
        let listing = fs.list().unwrap();
        assert!(matches!(
            fs.create("f128"),
            Err(FsError::CapacityExceeded(_))
        ));
        assert_eq!(fs.list().unwrap(), listing);
        assert_eq!(fs.info().unwrap().free_entries, 0);
    }

    #[test]
    fn test_delete() {
        let mut fs = mounted_fs(10);
        assert!(matches!(fs.delete("ghost"), Err(FsError::NotFound(_))));

        fs.create("a").unwrap();
        let free_before = fs.info().unwrap().free_data_blocks;
        let fd = fs.open("a").unwrap();
        assert_eq!(fs.write(fd, &[1u8; 3 * BLOCK_SIZE]).unwrap(), 3 * BLOCK_SIZE);
        assert_eq!(fs.info().unwrap().free_data_blocks, free_before - 3);

        assert!(matches!(fs.delete("a"), Err(FsError::ResourceBusy(_))));
        fs.close(fd).unwrap();
        assert_eq!(fs.delete("a").unwrap(), 3);
        assert_eq!(fs.info().unwrap().free_data_blocks, free_before);
        assert!(fs.list().unwrap().is_empty());
        assert!(matches!(fs.open("a"), Err(FsError::NotFound(_))));
    }

    #[test]
    fn test_delete_blocked_by_any_handle() {
        let mut fs = mounted_fs(10);
        fs.create("a").unwrap();
        let first = fs.open("a").unwrap();
        let second = fs.open("a").unwrap();
        fs.close(first).unwrap();
        assert!(matches!(fs.delete("a"), Err(FsError::ResourceBusy(_))));
        fs.close(second).unwrap();
        assert_eq!(fs.delete("a").unwrap(), 0);
    }

    #[test]
    fn test_handle_errors() {
        let mut fs = mounted_fs(10);
        assert!(matches!(fs.open("missing"), Err(FsError::NotFound(_))));
        assert!(matches!(fs.close(0), Err(FsError::InvalidArgument(_))));
        assert!(matches!(
            fs.stat(OPEN_MAX_COUNT),
            Err(FsError::InvalidArgument(_))
        ));

        fs.create("a").unwrap();
        for _ in 0..OPEN_MAX_COUNT {
            fs.open("a").unwrap();
        }
        assert!(matches!(fs.open("a"), Err(FsError::CapacityExceeded(_))));
    }

    #[test]
    fn test_seek() {
        let mut fs = mounted_fs(10);
        fs.create("a").unwrap();
        let fd = fs.open("a").unwrap();
        assert_eq!(fs.write(fd, b"hello world").unwrap(), 11);

        fs.seek(fd, 6).unwrap();
        assert_eq!(fs.tell(fd).unwrap(), 6);
        let mut buf = [0u8; 5];
        assert_eq!(fs.read(fd, &mut buf).unwrap(), 5);
        assert_eq!(&buf, b"world");

        // the end of the file is a valid position, past it is not
        fs.seek(fd, 11).unwrap();
        assert!(matches!(fs.seek(fd, 12), Err(FsError::InvalidArgument(_))));
        assert_eq!(fs.tell(fd).unwrap(), 11);
        assert!(matches!(fs.seek(7, 0), Err(FsError::InvalidArgument(_))));
    }

    #[test]
    fn test_format_then_mount() {
        let mut disk = MemDisk::new(1 + 1 + 1 + 50);
        format(&mut disk, 50).unwrap();
        let mut fs = FileSystem::new();
        fs.mount(disk).unwrap();
        assert_eq!(fs.info().unwrap().data_count, 50);
    }
}
