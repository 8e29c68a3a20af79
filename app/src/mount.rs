//! mount an image file and run operations against it
use anyhow::Context;
use std::path::Path;

use crate::{
    device::ImageFile,
    fs::{FileSystem, FsError, Result},
};

impl FileSystem<ImageFile> {
    /// open the image file at `image_path` and mount it
    pub fn mount_image<P>(&mut self, image_path: P) -> Result<()>
    where
        P: AsRef<Path>,
    {
        if self.is_mounted() {
            return Err(FsError::AlreadyMounted);
        }
        self.mount(ImageFile::open(image_path)?)
    }
}

/// mount the image at `image_path`, run `op` on it, then unmount it
///
/// The volume is unmounted even if `op` fails, so that `op` must close
/// every file it opens.
pub fn with_image<P, T, F>(image_path: P, op: F) -> anyhow::Result<T>
where
    P: AsRef<Path>,
    F: FnOnce(&mut FileSystem<ImageFile>) -> anyhow::Result<T>,
{
    let image_path = image_path.as_ref();
    let mut fs = FileSystem::new();
    fs.mount_image(image_path)
        .with_context(|| format!("failed to mount {}", image_path.display()))?;
    let outcome = op(&mut fs);
    let unmounted = fs
        .unmount()
        .with_context(|| format!("failed to unmount {}", image_path.display()));
    let value = outcome?;
    unmounted?;
    Ok(value)
}
