// Adapters layer: concrete file access and table encoding.

pub mod storage;
pub mod table_io;
