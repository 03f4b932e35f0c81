//! Frame Module
//!
//! A minimal column-oriented table used as the cached payload.

mod value;

pub use value::Value;

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

// == Column ==
/// A named, ordered sequence of cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

// == Data Frame ==
/// Ordered collection of equally long columns.
///
/// Column order and row order are both significant: two frames are equal
/// only when names, order and every cell match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFrame")]
pub struct DataFrame {
    columns: Vec<Column>,
}

/// Decoded form before shape checks.
#[derive(Deserialize)]
struct RawFrame {
    columns: Vec<Column>,
}

impl TryFrom<RawFrame> for DataFrame {
    type Error = CacheError;

    fn try_from(raw: RawFrame) -> Result<Self> {
        let frame = Self {
            columns: raw.columns,
        };
        frame.validate_shape()?;
        Ok(frame)
    }
}

impl DataFrame {
    // == Constructors ==
    /// Creates an empty frame with no columns.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a frame from column names and row-major data.
    ///
    /// Every row must have exactly one cell per column.
    pub fn from_rows<N, R>(names: &[N], rows: R) -> Result<Self>
    where
        N: AsRef<str>,
        R: IntoIterator<Item = Vec<Value>>,
    {
        let mut columns: Vec<Column> = names
            .iter()
            .map(|name| Column {
                name: name.as_ref().to_string(),
                values: Vec::new(),
            })
            .collect();

        for (index, row) in rows.into_iter().enumerate() {
            if row.len() != columns.len() {
                return Err(CacheError::InvalidFrame(format!(
                    "Row {} has {} cells, expected {}",
                    index,
                    row.len(),
                    columns.len()
                )));
            }
            for (column, cell) in columns.iter_mut().zip(row) {
                column.values.push(cell);
            }
        }

        let frame = Self { columns };
        frame.validate_shape()?;
        Ok(frame)
    }

    /// Appends a column, checking its length against the existing ones.
    pub fn with_column(mut self, name: impl Into<String>, values: Vec<Value>) -> Result<Self> {
        let name = name.into();
        if self.column(&name).is_some() {
            return Err(CacheError::InvalidFrame(format!(
                "Duplicate column '{}'",
                name
            )));
        }
        if !self.columns.is_empty() && values.len() != self.num_rows() {
            return Err(CacheError::InvalidFrame(format!(
                "Column '{}' has {} rows, expected {}",
                name,
                values.len(),
                self.num_rows()
            )));
        }
        self.columns.push(Column { name, values });
        Ok(self)
    }

    // == Accessors ==
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    /// Returns the cells of row `index` in column order.
    pub fn row(&self, index: usize) -> Option<Vec<&Value>> {
        if index >= self.num_rows() {
            return None;
        }
        Some(self.columns.iter().map(|c| &c.values[index]).collect())
    }

    /// Stacks `times` copies of this frame vertically.
    pub fn repeat(&self, times: usize) -> Self {
        let columns = self
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                values: c
                    .values
                    .iter()
                    .cloned()
                    .cycle()
                    .take(c.values.len() * times)
                    .collect(),
            })
            .collect();
        Self { columns }
    }

    // == Encoding ==
    /// Serializes the frame to its canonical JSON bytes.
    ///
    /// The encoding is deterministic, so it doubles as the fingerprint input.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.ensure_canonical()?;
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes bytes produced by [`DataFrame::to_bytes`].
    ///
    /// Ragged or duplicate-named payloads fail with a serialization error.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    fn ensure_canonical(&self) -> Result<()> {
        self.columns
            .iter()
            .flat_map(|c| c.values.iter())
            .try_for_each(Value::ensure_canonical)
    }

    fn validate_shape(&self) -> Result<()> {
        let rows = self.num_rows();
        for (i, column) in self.columns.iter().enumerate() {
            if column.values.len() != rows {
                return Err(CacheError::InvalidFrame(format!(
                    "Column '{}' has {} rows, expected {}",
                    column.name,
                    column.values.len(),
                    rows
                )));
            }
            if self.columns[..i].iter().any(|c| c.name == column.name) {
                return Err(CacheError::InvalidFrame(format!(
                    "Duplicate column '{}'",
                    column.name
                )));
            }
        }
        Ok(())
    }
}
