use crate::utils::error::{Result, WranglerError};
use serde::{Deserialize, Serialize};

/// An in-memory sheet: named columns over rows of raw cell text.
///
/// Empty cells are the missing-value marker. Every row has exactly
/// `headers.len()` cells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a table from headers and rows, rejecting rows of the wrong width.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let mut table = Self::new(headers);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn push_row(&mut self, row: Vec<String>) -> Result<()> {
        if row.len() != self.headers.len() {
            return Err(WranglerError::ProcessingError {
                message: format!(
                    "row {} has {} cells but the table has {} columns",
                    self.rows.len(),
                    row.len(),
                    self.headers.len()
                ),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| WranglerError::missing_column(name, "table"))
    }

    pub fn column(&self, name: &str) -> Result<Vec<&str>> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|row| row[idx].as_str()).collect())
    }

    /// Project to `columns`, in the requested order.
    pub fn select<S: AsRef<str>>(&self, columns: &[S]) -> Result<Table> {
        let indices = columns
            .iter()
            .map(|c| self.column_index(c.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        Ok(Table {
            headers: columns.iter().map(|c| c.as_ref().to_string()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
                .collect(),
        })
    }

    /// Append `other` below `self`.
    ///
    /// Columns are aligned by name. Columns only present on one side are
    /// added in first-seen order and filled with empty cells elsewhere.
    pub fn append(&mut self, other: Table) {
        if self.headers.is_empty() && self.rows.is_empty() {
            *self = other;
            return;
        }

        if self.headers == other.headers {
            self.rows.extend(other.rows);
            return;
        }

        for header in &other.headers {
            if !self.has_column(header) {
                self.headers.push(header.clone());
                for row in &mut self.rows {
                    row.push(String::new());
                }
            }
        }

        let mapping: Vec<usize> = self
            .headers
            .iter()
            .map(|h| other.headers.iter().position(|o| o == h).unwrap_or(usize::MAX))
            .collect();

        for row in other.rows {
            let aligned = mapping
                .iter()
                .map(|&i| row.get(i).cloned().unwrap_or_default())
                .collect();
            self.rows.push(aligned);
        }
    }
}
