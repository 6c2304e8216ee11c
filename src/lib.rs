pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::WranglerConfig;

pub use crate::adapters::storage::LocalStorage;
pub use crate::core::{
    concat::PeriodicConcatenator,
    readmission::{ReadmissionDetector, ReadmissionParams},
};
pub use crate::domain::model::{EmergencyMode, ReadmissionPair, ReadmissionReport, VisitColumns};
pub use crate::domain::table::Table;
pub use crate::utils::error::{Result, WranglerError};
