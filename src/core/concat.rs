use crate::adapters::table_io;
use crate::domain::ports::Storage;
use crate::domain::table::Table;
use crate::utils::error::{Result, WranglerError};
use std::path::{Path, PathBuf};

/// Loads the same export from a run of period folders and stacks the rows.
///
/// A period `202401` with folder `data` and file name `visits.csv` is read
/// from `data/202401/visits.csv`.
pub struct PeriodicConcatenator<S: Storage> {
    storage: S,
    folder: PathBuf,
    file_name: String,
}

impl<S: Storage> PeriodicConcatenator<S> {
    pub fn new(storage: S, folder: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            storage,
            folder: folder.into(),
            file_name: file_name.into(),
        }
    }

    pub fn period_path(&self, period: &str) -> PathBuf {
        self.folder.join(period).join(&self.file_name)
    }

    /// Read one period's table, projected to `features` when given.
    pub fn load_period(&self, period: &str, features: Option<&[String]>) -> Result<Table> {
        let path = self.period_path(period);
        let data = self.storage.read_file(&path)?;
        let table = table_io::parse_table(&data, &path)?;

        match features {
            Some(columns) if !columns.is_empty() => project(&table, columns, &path),
            _ => Ok(table),
        }
    }

    /// Concatenate every period in order. Stops at the first failing period.
    pub fn concat<P: AsRef<str>>(&self, periods: &[P], features: Option<&[String]>) -> Result<Table> {
        let mut combined = Table::empty();
        let mut count = 0usize;

        for period in periods {
            let period = period.as_ref();
            tracing::info!("Now reading {} {}...", period, self.file_name);

            let table = self.load_period(period, features)?;
            tracing::info!(
                "There are {} entries in {} {}",
                table.len(),
                period,
                self.file_name
            );

            count += table.len();
            combined.append(table);
        }

        tracing::info!(
            "Finished reading and concatenating files. There are {} entries included!",
            count
        );
        Ok(combined)
    }
}

fn project(table: &Table, columns: &[String], path: &Path) -> Result<Table> {
    if let Some(missing) = columns.iter().find(|c| !table.has_column(c)) {
        return Err(WranglerError::missing_column(
            missing.as_str(),
            path.display().to_string(),
        ));
    }
    table.select(columns)
}
