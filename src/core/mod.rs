pub mod concat;
pub mod readmission;

pub use crate::domain::model::{ReadmissionReport, VisitColumns};
pub use crate::domain::ports::Storage;
pub use crate::domain::table::Table;
pub use crate::utils::error::Result;
