//! block devices the filesystem can be mounted on
mod block_dev;
mod image_file;
mod mem_disk;
pub use block_dev::*;
pub use image_file::*;
pub use mem_disk::*;
