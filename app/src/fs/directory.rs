use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use crate::utils::traits::BlockCodec;

use super::{
    error::{FsError, Result},
    BLOCK_SIZE, DIR_ENTRY_SIZE, FAT_EOC, FILENAME_LEN, FILE_MAX_COUNT,
};

/// one 32-byte record of the root directory, an empty name marks a free slot
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirEntry {
    /// NUL terminated, bytes after the terminator are ignored
    filename: [u8; FILENAME_LEN],
    /// file size in bytes
    pub size: u32,
    /// first data block, [FAT_EOC] if the file has no block
    pub first_block: u16,
    padding: [u8; 10],
}

impl DirEntry {
    /// `name` must have passed [validate_name]
    pub(crate) fn new(name: &str) -> Self {
        let mut filename = [0u8; FILENAME_LEN];
        filename[..name.len()].copy_from_slice(name.as_bytes());
        Self {
            filename,
            size: 0,
            first_block: FAT_EOC,
            padding: [0u8; 10],
        }
    }

    pub fn is_free(&self) -> bool {
        self.filename[0] == 0
    }

    pub fn name_bytes(&self) -> &[u8] {
        let len = self
            .filename
            .iter()
            .position(|b| *b == 0)
            .unwrap_or(FILENAME_LEN);
        &self.filename[..len]
    }

    pub fn name(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.name_bytes())
    }

    fn has_name(&self, name: &str) -> bool {
        !self.is_free() && self.name_bytes() == name.as_bytes()
    }
}

impl BlockCodec for DirEntry {}

/// check `name` can be stored in a [DirEntry]
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(FsError::InvalidArgument("filename is empty".into()));
    }
    if name.len() >= FILENAME_LEN {
        return Err(FsError::InvalidArgument(format!(
            "filename {name:?} is longer than {} bytes",
            FILENAME_LEN - 1
        )));
    }
    if name.contains('\0') {
        return Err(FsError::InvalidArgument(format!(
            "filename {name:?} contains a NUL byte"
        )));
    }
    Ok(())
}

/// the flat root directory, always [FILE_MAX_COUNT] slots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directory {
    entries: Vec<DirEntry>,
}

impl Default for Directory {
    fn default() -> Self {
        Self {
            entries: vec![DirEntry::default(); FILE_MAX_COUNT],
        }
    }
}

/// for serialize and deserialize
impl Directory {
    pub fn from_block(block: &[u8]) -> Result<Self> {
        let entries = block
            .chunks_exact(DIR_ENTRY_SIZE)
            .take(FILE_MAX_COUNT)
            .map(|record| DirEntry::decode_from(record).map(|(entry, _)| entry))
            .collect::<Result<Vec<_>>>()?;
        if entries.len() != FILE_MAX_COUNT {
            return Err(FsError::InvalidVolume(format!(
                "root directory block holds {} entries instead of {FILE_MAX_COUNT}",
                entries.len()
            )));
        }
        Ok(Self { entries })
    }

    pub fn to_block(&self) -> Result<Vec<u8>> {
        let mut block = vec![0u8; BLOCK_SIZE];
        for (entry, record) in self
            .entries
            .iter()
            .zip(block.chunks_exact_mut(DIR_ENTRY_SIZE))
        {
            entry.encode_into(record)?;
        }
        Ok(block)
    }
}

impl Directory {
    pub fn entry(&self, index: usize) -> Option<&DirEntry> {
        self.entries.get(index)
    }

    pub fn entry_mut(&mut self, index: usize) -> Option<&mut DirEntry> {
        self.entries.get_mut(index)
    }

    /// slot index of the file called `name`
    pub fn find(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.has_name(name))
    }

    /// claim the first free slot for a new empty file
    pub fn insert(&mut self, name: &str) -> Result<usize> {
        validate_name(name)?;
        if self.find(name).is_some() {
            return Err(FsError::InvalidArgument(format!(
                "file {name:?} already exists"
            )));
        }
        let index = self
            .entries
            .iter()
            .position(DirEntry::is_free)
            .ok_or_else(|| {
                FsError::CapacityExceeded(format!(
                    "root directory already holds {FILE_MAX_COUNT} files"
                ))
            })?;
        self.entries[index] = DirEntry::new(name);
        Ok(index)
    }

    /// turn slot `index` back into a free slot, returning what it held
    pub fn remove(&mut self, index: usize) -> Option<DirEntry> {
        self.entries.get_mut(index).map(std::mem::take)
    }

    /// calculate the number of free slots
    pub fn free_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_free()).count()
    }

    /// active entries in slot order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &DirEntry)> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| !entry.is_free())
    }
}
