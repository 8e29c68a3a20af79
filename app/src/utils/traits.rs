use bincode::config;
use serde::{de::DeserializeOwned, Serialize};

use crate::fs::Result;

/// Trait for fixed-width records that live at the front of a block
/// # Note
/// Records are encoded with bincode's legacy configuration:
/// little endian, fixed-width integers and no length prefix for arrays,
/// which gives exactly the packed on-disk layout.
pub trait BlockCodec: Serialize + DeserializeOwned {
    /// encode into the front of `buf`, bytes after the record are left untouched
    /// # Returns
    /// The number of bytes written if successful
    fn encode_into(&self, buf: &mut [u8]) -> Result<usize> {
        let config = config::legacy();
        Ok(bincode::serde::encode_into_slice(self, buf, config)?)
    }

    /// decode from the front of `buf`
    /// # Returns
    /// A tuple containing the decoded record and the number of bytes read
    fn decode_from(buf: &[u8]) -> Result<(Self, usize)> {
        let config = config::legacy();
        Ok(bincode::serde::decode_from_slice(buf, config)?)
    }
}
