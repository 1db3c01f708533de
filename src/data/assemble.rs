use ndarray::{Array2, Axis};

use super::features::FeatureSchema;
use super::model::{Column, ColumnStore, Split};
use crate::error::{LoadError, Result};

/// Build the feature matrix and label block for one entity.
///
/// Column `j` of the matrix holds the first component of feature `j` at each
/// sampled row; multi-dimensional cells are truncated to that component.
/// The label block keeps the full cell width of `label`, which the caller
/// has already read for row selection. Both outputs have `sample.len()` rows
/// in sample order.
pub fn assemble(
    store: &dyn ColumnStore,
    split: Split,
    entity: &str,
    sample: &[usize],
    schema: &FeatureSchema,
    label: &Column,
) -> Result<(Array2<f64>, Array2<f64>)> {
    let mut matrix = Array2::<f64>::zeros((sample.len(), schema.len()));

    for (j, name) in schema.names().iter().enumerate() {
        let column = store.read_column(split, entity, name)?;
        let values = column
            .first_components()
            .ok_or_else(|| non_numeric(entity, &column))?;
        check_bounds(entity, &column, sample)?;

        for (i, &row) in sample.iter().enumerate() {
            matrix[[i, j]] = values[row];
        }
    }

    let labels = label.as_numeric().ok_or_else(|| non_numeric(entity, label))?;
    check_bounds(entity, label, sample)?;
    let labels = labels.select(Axis(0), sample);

    Ok((matrix, labels))
}

/// First component of every label cell, used to evaluate the mode filter.
pub fn label_values(entity: &str, label: &Column) -> Result<Vec<f64>> {
    let values = label
        .first_components()
        .ok_or_else(|| non_numeric(entity, label))?;
    Ok(values.to_vec())
}

fn check_bounds(entity: &str, column: &Column, sample: &[usize]) -> Result<()> {
    let len = column.len();
    match sample.iter().find(|&&i| i >= len) {
        Some(&index) => Err(LoadError::IndexOutOfRange {
            entity: entity.to_string(),
            column: column.name.clone(),
            index,
            len,
        }),
        None => Ok(()),
    }
}

fn non_numeric(entity: &str, column: &Column) -> LoadError {
    LoadError::NonNumericColumn {
        entity: entity.to_string(),
        column: column.name.clone(),
    }
}
