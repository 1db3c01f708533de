use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use ndarray::{Array1, Array2, ArrayView1, Axis};

use crate::error::{LoadError, Result};

// ---------------------------------------------------------------------------
// Split – top-level partition of the store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Split {
    #[default]
    Train,
    Test,
}

impl Split {
    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Test => "test",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Split {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "train" => Ok(Split::Train),
            "test" => Ok(Split::Test),
            other => Err(LoadError::UnknownSplit(other.to_string())),
        }
    }
}

impl<'de> serde::Deserialize<'de> for Split {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Column – one named array stored under split/entity
// ---------------------------------------------------------------------------

/// Cell storage for a column.
///
/// Numeric columns are `rows × width`; `width > 1` when each stored cell is
/// itself a vector (some descriptor columns carry multi-dimensional cells).
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric(Array2<f64>),
    /// Identifier columns such as `receptor` or `drugID`.
    Text(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn numeric(name: impl Into<String>, values: Array2<f64>) -> Self {
        Column {
            name: name.into(),
            data: ColumnData::Numeric(values),
        }
    }

    /// Scalar column: one value per row.
    pub fn scalars(name: impl Into<String>, values: Vec<f64>) -> Self {
        Column::numeric(name, Array1::from(values).insert_axis(Axis(1)))
    }

    pub fn text(name: impl Into<String>, values: Vec<String>) -> Self {
        Column {
            name: name.into(),
            data: ColumnData::Text(values),
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        match &self.data {
            ColumnData::Numeric(a) => a.nrows(),
            ColumnData::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of components per cell (1 for text and scalar columns).
    pub fn width(&self) -> usize {
        match &self.data {
            ColumnData::Numeric(a) => a.ncols(),
            ColumnData::Text(_) => 1,
        }
    }

    pub fn as_numeric(&self) -> Option<&Array2<f64>> {
        match &self.data {
            ColumnData::Numeric(a) => Some(a),
            ColumnData::Text(_) => None,
        }
    }

    /// First component of every cell, or `None` for text columns and
    /// zero-width numeric columns.
    pub fn first_components(&self) -> Option<ArrayView1<'_, f64>> {
        let values = self.as_numeric()?;
        if values.ncols() == 0 {
            return None;
        }
        Some(values.index_axis(Axis(1), 0))
    }
}

// ---------------------------------------------------------------------------
// ColumnStore – read access to split/entity/column
// ---------------------------------------------------------------------------

/// Read-only access to a hierarchical feature store keyed by
/// `split/entity/column`.
pub trait ColumnStore {
    /// Entity (protein) names present under a split, in store order.
    fn entity_names(&self, split: Split) -> Result<Vec<String>>;

    /// Column names available for one entity.
    fn column_names(&self, split: Split, entity: &str) -> Result<Vec<String>>;

    /// Read a full column.
    fn read_column(&self, split: Split, entity: &str, column: &str) -> Result<Column>;
}

// ---------------------------------------------------------------------------
// MemoryStore – fully materialised store
// ---------------------------------------------------------------------------

/// Columns of one entity, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct EntityRecord {
    pub columns: Vec<Column>,
}

impl EntityRecord {
    pub fn get(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Insert or replace a column.
    pub fn put(&mut self, column: Column) {
        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(slot) => *slot = column,
            None => self.columns.push(column),
        }
    }
}

/// In-memory store used by the JSON and Parquet loaders and by tests.
/// Entity order follows first insertion.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    splits: BTreeMap<Split, Vec<(String, EntityRecord)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column to `split/entity`, creating the entity on first use.
    pub fn insert(&mut self, split: Split, entity: &str, column: Column) -> &mut Self {
        self.entity_mut(split, entity).put(column);
        self
    }

    pub fn entity_mut(&mut self, split: Split, entity: &str) -> &mut EntityRecord {
        let entities = self.splits.entry(split).or_default();
        let pos = match entities.iter().position(|(name, _)| name == entity) {
            Some(pos) => pos,
            None => {
                entities.push((entity.to_string(), EntityRecord::default()));
                entities.len() - 1
            }
        };
        &mut entities[pos].1
    }

    fn entity(&self, split: Split, entity: &str) -> Result<&EntityRecord> {
        let entities = self
            .splits
            .get(&split)
            .ok_or_else(|| LoadError::MissingSplit(split.to_string()))?;
        entities
            .iter()
            .find(|(name, _)| name == entity)
            .map(|(_, rec)| rec)
            .ok_or_else(|| LoadError::MissingEntity {
                split: split.to_string(),
                entity: entity.to_string(),
            })
    }
}

impl ColumnStore for MemoryStore {
    fn entity_names(&self, split: Split) -> Result<Vec<String>> {
        let entities = self
            .splits
            .get(&split)
            .ok_or_else(|| LoadError::MissingSplit(split.to_string()))?;
        Ok(entities.iter().map(|(name, _)| name.clone()).collect())
    }

    fn column_names(&self, split: Split, entity: &str) -> Result<Vec<String>> {
        Ok(self
            .entity(split, entity)?
            .columns
            .iter()
            .map(|c| c.name.clone())
            .collect())
    }

    fn read_column(&self, split: Split, entity: &str, column: &str) -> Result<Column> {
        self.entity(split, entity)?
            .get(column)
            .cloned()
            .ok_or_else(|| LoadError::MissingColumn {
                split: split.to_string(),
                entity: entity.to_string(),
                column: column.to_string(),
            })
    }
}
