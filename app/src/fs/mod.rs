//! our FAT-style filesystem
pub mod directory;
pub mod error;
pub mod fat;
mod file_io;
pub mod fs_layout;
pub mod open_file;
pub mod report;
pub mod superblock;
pub use directory::*;
pub use error::*;
pub use fat::*;
pub use fs_layout::*;
pub use open_file::*;
pub use report::*;
pub use superblock::*;

/// bytes per block, shared by the device and the filesystem
pub const BLOCK_SIZE: usize = 4096;
pub const FS_SIGNATURE: [u8; 8] = *b"ECS150FS";
/// end-of-chain marker in the allocation table,
/// also stored as the first block of an empty file
pub const FAT_EOC: u16 = 0xFFFF;
/// filename field width, including the NUL terminator
pub const FILENAME_LEN: usize = 16;
/// directory capacity, the whole directory fits in one block
pub const FILE_MAX_COUNT: usize = 128;
pub const OPEN_MAX_COUNT: usize = 32;
/// the largest data region the formatter creates
pub const MAX_DATA_BLOCKS: usize = 8192;
const DIR_ENTRY_SIZE: usize = BLOCK_SIZE / FILE_MAX_COUNT;
