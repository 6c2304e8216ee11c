use crate::utils::error::Result;
use std::path::Path;

/// Byte-level access to period exports.
pub trait Storage {
    fn read_file(&self, path: &Path) -> Result<Vec<u8>>;
}
