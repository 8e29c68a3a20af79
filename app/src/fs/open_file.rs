use super::{
    error::{FsError, Result},
    OPEN_MAX_COUNT,
};

/// a live session on a file: which directory slot, and where we are in it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenFile {
    /// slot index in the root directory
    pub entry: usize,
    /// current byte offset
    pub offset: usize,
}

/// fixed-capacity table of open files, the handle id is the slot index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenFileTable {
    handles: Vec<Option<OpenFile>>,
}

impl Default for OpenFileTable {
    fn default() -> Self {
        Self {
            handles: vec![None; OPEN_MAX_COUNT],
        }
    }
}

impl OpenFileTable {
    /// bind a new handle to directory slot `entry`, at offset 0
    pub fn open(&mut self, entry: usize) -> Result<usize> {
        let fd = self
            .handles
            .iter()
            .position(Option::is_none)
            .ok_or_else(|| {
                FsError::CapacityExceeded(format!("already {OPEN_MAX_COUNT} files open"))
            })?;
        self.handles[fd] = Some(OpenFile { entry, offset: 0 });
        Ok(fd)
    }

    pub fn close(&mut self, fd: usize) -> Result<OpenFile> {
        self.slot_mut(fd)?
            .take()
            .ok_or_else(|| not_open(fd))
    }

    pub fn get(&self, fd: usize) -> Result<&OpenFile> {
        self.handles
            .get(fd)
            .and_then(Option::as_ref)
            .ok_or_else(|| not_open(fd))
    }

    pub fn get_mut(&mut self, fd: usize) -> Result<&mut OpenFile> {
        self.slot_mut(fd)?.as_mut().ok_or_else(|| not_open(fd))
    }

    /// calculate the number of handles in use
    pub fn in_use(&self) -> usize {
        self.handles.iter().flatten().count()
    }

    /// whether any handle is bound to directory slot `entry`
    pub fn references(&self, entry: usize) -> bool {
        self.handles
            .iter()
            .flatten()
            .any(|handle| handle.entry == entry)
    }

    fn slot_mut(&mut self, fd: usize) -> Result<&mut Option<OpenFile>> {
        self.handles.get_mut(fd).ok_or_else(|| not_open(fd))
    }
}

fn not_open(fd: usize) -> FsError {
    FsError::InvalidArgument(format!("file descriptor {fd} is not open"))
}
