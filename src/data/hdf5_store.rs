//! HDF5 feature store.
//!
//! Layout:
//! - /{split}/: `train` or `test`
//!   - /{entity}/: one group per protein
//!     - /{column}: (N_rows,) or (N_rows, width) numeric dataset, or (N_rows,) strings

use std::path::Path;

use hdf5::types::{FixedAscii, FixedUnicode, TypeDescriptor, VarLenAscii, VarLenUnicode};
use hdf5::{File as H5File, Group};
use ndarray::Array2;

use super::model::{Column, ColumnStore, Split};
use crate::error::{LoadError, Result};

/// Widest fixed-length string cell read as text, in bytes.
pub const MAX_FIXED_STRING: usize = 255;

/// Store backed by an open HDF5 file.
///
/// The handle is opened once and shared by every read; dropping the store
/// closes the file.
pub struct Hdf5Store {
    file: H5File,
}

impl Hdf5Store {
    pub fn open(path: &Path) -> Result<Self> {
        let file = H5File::open(path)
            .map_err(|e| LoadError::Format(format!("opening {}: {e}", path.display())))?;
        Ok(Hdf5Store { file })
    }

    fn split_group(&self, split: Split) -> Result<Group> {
        if !self.file.link_exists(split.as_str()) {
            return Err(LoadError::MissingSplit(split.to_string()));
        }
        self.file.group(split.as_str()).map_err(h5_err)
    }

    fn entity_group(&self, split: Split, entity: &str) -> Result<Group> {
        let group = self.split_group(split)?;
        if !group.link_exists(entity) {
            return Err(LoadError::MissingEntity {
                split: split.to_string(),
                entity: entity.to_string(),
            });
        }
        group.group(entity).map_err(h5_err)
    }
}

impl ColumnStore for Hdf5Store {
    fn entity_names(&self, split: Split) -> Result<Vec<String>> {
        self.split_group(split)?.member_names().map_err(h5_err)
    }

    fn column_names(&self, split: Split, entity: &str) -> Result<Vec<String>> {
        self.entity_group(split, entity)?.member_names().map_err(h5_err)
    }

    fn read_column(&self, split: Split, entity: &str, column: &str) -> Result<Column> {
        let group = self.entity_group(split, entity)?;
        if !group.link_exists(column) {
            return Err(LoadError::MissingColumn {
                split: split.to_string(),
                entity: entity.to_string(),
                column: column.to_string(),
            });
        }
        let dataset = group.dataset(column).map_err(h5_err)?;
        let shape = dataset.shape();
        let descriptor = dataset
            .dtype()
            .and_then(|t| t.to_descriptor())
            .map_err(h5_err)?;

        match descriptor {
            TypeDescriptor::VarLenUnicode => {
                let raw: Vec<VarLenUnicode> = dataset.read_raw().map_err(h5_err)?;
                Ok(Column::text(column, raw.iter().map(|s| s.as_str().to_string()).collect()))
            }
            TypeDescriptor::VarLenAscii => {
                let raw: Vec<VarLenAscii> = dataset.read_raw().map_err(h5_err)?;
                Ok(Column::text(column, raw.iter().map(|s| s.as_str().to_string()).collect()))
            }
            TypeDescriptor::FixedAscii(size) => {
                check_fixed_width(entity, column, size)?;
                let raw: Vec<FixedAscii<MAX_FIXED_STRING>> = dataset.read_raw().map_err(h5_err)?;
                Ok(Column::text(column, raw.iter().map(|s| trim_nul(s.as_str())).collect()))
            }
            TypeDescriptor::FixedUnicode(size) => {
                check_fixed_width(entity, column, size)?;
                let raw: Vec<FixedUnicode<MAX_FIXED_STRING>> =
                    dataset.read_raw().map_err(h5_err)?;
                Ok(Column::text(column, raw.iter().map(|s| trim_nul(s.as_str())).collect()))
            }
            _ => {
                let rows = shape.first().copied().unwrap_or(1);
                let width = shape.iter().skip(1).product::<usize>().max(1);
                let raw: Vec<f64> = dataset.read_raw().map_err(h5_err)?;
                let values = Array2::from_shape_vec((rows, width), raw)
                    .map_err(|e| LoadError::Format(format!("{entity}/{column}: {e}")))?;
                Ok(Column::numeric(column, values))
            }
        }
    }
}

fn check_fixed_width(entity: &str, column: &str, size: usize) -> Result<()> {
    if size > MAX_FIXED_STRING {
        return Err(LoadError::Format(format!(
            "{entity}/{column}: fixed strings of {size} bytes exceed {MAX_FIXED_STRING}"
        )));
    }
    Ok(())
}

fn trim_nul(s: &str) -> String {
    s.trim_end_matches('\0').to_string()
}

fn h5_err(e: hdf5::Error) -> LoadError {
    LoadError::Format(e.to_string())
}
