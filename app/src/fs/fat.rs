//! the File Allocation Table: one slot per data block, forming per-file chains
use byteorder::{ByteOrder, LittleEndian};
use log::warn;

use crate::utils::fs_size_calculator::FAT_SLOTS_PER_BLOCK;

use super::{
    error::{FsError, Result},
    FAT_EOC,
};

/// slot value of a free data block
pub const FAT_FREE: u16 = 0;
/// slot 0 is reserved by the formatter: a link value of 0 would read as "free"
const FIRST_ALLOCATABLE: usize = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationTable {
    /// every slot of the on-disk region, only `..data_count` are in use
    slots: Vec<u16>,
    data_count: usize,
}

/// for serialize and deserialize
impl AllocationTable {
    /// a fresh table of `fat_blocks` blocks with every data block free
    pub fn new(fat_blocks: usize, data_count: usize) -> Self {
        let mut slots = vec![FAT_FREE; fat_blocks * FAT_SLOTS_PER_BLOCK];
        if let Some(reserved) = slots.first_mut() {
            *reserved = FAT_EOC;
        }
        Self { slots, data_count }
    }

    /// load the table from the raw bytes of its blocks
    pub fn from_bytes(raw: &[u8], data_count: usize) -> Self {
        let mut slots = vec![FAT_FREE; raw.len() / 2];
        LittleEndian::read_u16_into(&raw[..slots.len() * 2], &mut slots);
        Self { slots, data_count }
    }

    /// the raw bytes of every table block, ready to be written back
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut raw = vec![0u8; self.slots.len() * 2];
        LittleEndian::write_u16_into(&self.slots, &mut raw);
        raw
    }
}

/// for data block allocation and chain traversal
impl AllocationTable {
    /// raw value of slot `index`
    #[cfg(test)]
    fn get(&self, index: u16) -> Option<u16> {
        self.slots[..self.data_count].get(index as usize).copied()
    }

    /// calculate the number of data blocks `allocate` can still hand out
    pub fn free_count(&self) -> usize {
        self.slots[..self.data_count]
            .iter()
            .skip(FIRST_ALLOCATABLE)
            .filter(|slot| **slot == FAT_FREE)
            .count()
    }

    /// make sure `index` can be part of a chain
    pub fn check(&self, index: u16) -> Result<u16> {
        let i = index as usize;
        if i < FIRST_ALLOCATABLE || i >= self.data_count {
            return Err(FsError::Corrupted(format!(
                "block {index} is outside the data region of {} blocks",
                self.data_count
            )));
        }
        Ok(index)
    }

    /// the block after `index` in its chain, `None` at the end of the chain
    pub fn next(&self, index: u16) -> Result<Option<u16>> {
        let value = self.slots[self.check(index)? as usize];
        match value {
            FAT_EOC => Ok(None),
            FAT_FREE => Err(FsError::Corrupted(format!(
                "block {index} is linked into a chain but marked free"
            ))),
            next if next == index => Err(FsError::Corrupted(format!(
                "block {index} links to itself"
            ))),
            next => {
                if self.slots[self.check(next)? as usize] == FAT_FREE {
                    return Err(FsError::Corrupted(format!(
                        "block {index} links to free block {next}"
                    )));
                }
                Ok(Some(next))
            }
        }
    }

    /// follow the chain starting at `first` for `hops` links
    /// # Return
    /// the block reached, or `None` if the chain is shorter than that
    pub fn walk(&self, first: u16, hops: usize) -> Result<Option<u16>> {
        if first == FAT_EOC {
            return Ok(None);
        }
        // no chain can be longer than the data region
        if hops >= self.data_count {
            return Err(FsError::Corrupted(format!(
                "walking {hops} links in a data region of {} blocks",
                self.data_count
            )));
        }
        let mut current = self.check(first)?;
        for _ in 0..hops {
            match self.next(current)? {
                Some(next) => current = next,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    /// allocate the lowest free data block as a new chain end
    pub fn allocate(&mut self) -> Option<u16> {
        let index = (FIRST_ALLOCATABLE..self.data_count).find(|i| self.slots[*i] == FAT_FREE)?;
        self.slots[index] = FAT_EOC;
        Some(index as u16)
    }

    /// append `block` after the chain end `tail`
    pub fn link(&mut self, tail: u16, block: u16) {
        self.slots[tail as usize] = block;
    }

    /// release every block of the chain starting at `first`
    /// # Return
    /// the number of released blocks
    pub fn release_chain(&mut self, first: u16) -> usize {
        let mut released = 0;
        let mut current = first;
        while current != FAT_EOC {
            let i = current as usize;
            if i < FIRST_ALLOCATABLE || i >= self.data_count || self.slots[i] == FAT_FREE {
                // out of range, or already released through a loop in the chain
                warn!("chain starting at block {first} is broken at block {current}");
                break;
            }
            current = self.slots[i];
            self.slots[i] = FAT_FREE;
            released += 1;
        }
        released
    }
}
