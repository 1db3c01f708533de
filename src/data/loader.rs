use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type};
use ndarray::Array2;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Column, ColumnStore, MemoryStore, Split};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Open a feature store.  Dispatch by extension.
///
/// Supported formats:
/// * `.json`          – `{ split: { entity: { column: [cells...] } } }`
/// * `.parquet`       – flat table with `split` and `entity` key columns
/// * `.h5` / `.hdf5`  – `split/entity/column` datasets (`hdf5` feature)
///
/// JSON and Parquet stores are read fully into memory; HDF5 stores keep one
/// file handle open and read columns on demand.
pub fn open_store(path: &Path) -> Result<Box<dyn ColumnStore>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let store: Box<dyn ColumnStore> = match ext.as_str() {
        "parquet" | "pq" => Box::new(load_parquet(path)?),
        "json" => Box::new(load_json(path)?),
        "h5" | "hdf5" => open_hdf5(path)?,
        other => bail!("Unsupported file extension: .{other}"),
    };
    log::info!("opened feature store {}", path.display());
    Ok(store)
}

#[cfg(feature = "hdf5")]
fn open_hdf5(path: &Path) -> Result<Box<dyn ColumnStore>> {
    Ok(Box::new(super::hdf5_store::Hdf5Store::open(path)?))
}

#[cfg(not(feature = "hdf5"))]
fn open_hdf5(path: &Path) -> Result<Box<dyn ColumnStore>> {
    bail!(
        "{}: HDF5 support not compiled in (rebuild with --features hdf5)",
        path.display()
    )
}

// ---------------------------------------------------------------------------
// Column accumulation shared by the loaders
// ---------------------------------------------------------------------------

/// Cells of one column collected row by row.
#[derive(Debug)]
enum CellBuffer {
    Numeric { width: Option<usize>, values: Vec<f64> },
    Text(Vec<String>),
}

impl CellBuffer {
    fn numeric() -> Self {
        CellBuffer::Numeric { width: None, values: Vec::new() }
    }

    fn push_numeric(&mut self, cell: &[f64]) -> Result<()> {
        match self {
            CellBuffer::Numeric { width, values } => {
                match *width {
                    None => *width = Some(cell.len()),
                    Some(w) if w != cell.len() => {
                        bail!("cell has {} components, expected {w}", cell.len())
                    }
                    Some(_) => {}
                }
                values.extend_from_slice(cell);
                Ok(())
            }
            CellBuffer::Text(_) => bail!("numeric cell in a text column"),
        }
    }

    fn push_text(&mut self, s: String) -> Result<()> {
        match self {
            CellBuffer::Text(v) => {
                v.push(s);
                Ok(())
            }
            CellBuffer::Numeric { .. } => bail!("text cell in a numeric column"),
        }
    }

    fn finish(self, name: &str) -> Result<Column> {
        match self {
            CellBuffer::Numeric { width, values } => {
                let width = width.unwrap_or(1);
                let rows = if width == 0 { 0 } else { values.len() / width };
                let arr = Array2::from_shape_vec((rows, width), values)
                    .with_context(|| format!("column '{name}' has ragged cells"))?;
                Ok(Column::numeric(name, arr))
            }
            CellBuffer::Text(v) => Ok(Column::text(name, v)),
        }
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON layout (one object per split, entity and column):
///
/// ```json
/// {
///   "train": {
///     "lck": {
///       "label":    [0, 1, 1],
///       "vina":     [-7.1, -8.4, -6.9],
///       "pocket":   [[0.1, 0.2], [0.3, 0.4], [0.5, 0.6]],
///       "receptor": ["lck", "lck", "lck"]
///     }
///   }
/// }
/// ```
///
/// `null` cells become NaN.
fn load_json(path: &Path) -> Result<MemoryStore> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let splits = root
        .as_object()
        .context("Expected top-level JSON object keyed by split")?;

    let mut store = MemoryStore::new();

    for (split_name, entities) in splits {
        let split: Split = split_name.parse()?;
        let entities = entities
            .as_object()
            .with_context(|| format!("'{split_name}' is not an object of entities"))?;

        for (entity, columns) in entities {
            let columns = columns
                .as_object()
                .with_context(|| format!("{split_name}/{entity} is not an object of columns"))?;

            for (col_name, cells) in columns {
                let cells = cells
                    .as_array()
                    .with_context(|| format!("{split_name}/{entity}/{col_name} is not an array"))?;
                let column = json_column(col_name, cells)
                    .with_context(|| format!("{split_name}/{entity}/{col_name}"))?;
                store.insert(split, entity, column);
            }
        }
    }

    Ok(store)
}

fn json_column(name: &str, cells: &[JsonValue]) -> Result<Column> {
    let is_text = cells.first().map_or(false, JsonValue::is_string);
    let mut buf = if is_text {
        CellBuffer::Text(Vec::with_capacity(cells.len()))
    } else {
        CellBuffer::numeric()
    };

    for (row, cell) in cells.iter().enumerate() {
        let pushed = match cell {
            JsonValue::String(s) => buf.push_text(s.clone()),
            JsonValue::Array(items) => {
                let values = items
                    .iter()
                    .map(json_scalar)
                    .collect::<Option<Vec<f64>>>()
                    .with_context(|| format!("row {row}: non-numeric component"))?;
                buf.push_numeric(&values)
            }
            other => {
                let v = json_scalar(other).with_context(|| format!("row {row}: not a number"))?;
                buf.push_numeric(&[v])
            }
        };
        pushed.with_context(|| format!("row {row}"))?;
    }

    buf.finish(name)
}

fn json_scalar(val: &JsonValue) -> Option<f64> {
    match val {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        JsonValue::Null => Some(f64::NAN),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file holding every split and entity in one table.
///
/// Expected schema:
/// - `split`, `entity`: Utf8 key columns
/// - numeric scalar columns (ints, floats, bools) – one value per row
/// - `List<Float64>` / `List<Float32>` columns – multi-dimensional cells
/// - Utf8 columns – identifiers such as `receptor`, `drugID`
///
/// Rows are grouped by (split, entity) keeping file order.
fn load_parquet(path: &Path) -> Result<MemoryStore> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut order: Vec<(Split, String)> = Vec::new();
    let mut groups: HashMap<(Split, String), Vec<(String, CellBuffer)>> = HashMap::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let split_idx = schema
            .index_of("split")
            .map_err(|_| anyhow::anyhow!("Parquet file missing 'split' column"))?;
        let entity_idx = schema
            .index_of("entity")
            .map_err(|_| anyhow::anyhow!("Parquet file missing 'entity' column"))?;
        let split_col = string_values(batch.column(split_idx)).context("'split' column")?;
        let entity_col = string_values(batch.column(entity_idx)).context("'entity' column")?;

        let data_cols: Vec<(String, ColumnReader)> = schema
            .fields()
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != split_idx && *i != entity_idx)
            .map(|(i, f)| {
                let reader = ColumnReader::new(batch.column(i))
                    .with_context(|| format!("column '{}'", f.name()))?;
                Ok((f.name().clone(), reader))
            })
            .collect::<Result<_>>()?;

        for row in 0..batch.num_rows() {
            let split: Split = split_col[row].parse()?;
            let key = (split, entity_col[row].clone());

            let columns = groups.entry(key.clone()).or_insert_with(|| {
                order.push(key.clone());
                data_cols
                    .iter()
                    .map(|(name, reader)| (name.clone(), reader.empty_buffer()))
                    .collect()
            });

            for (name, reader) in &data_cols {
                let Some((_, buf)) = columns.iter_mut().find(|(n, _)| n == name) else {
                    bail!("{}/{}: column '{name}' appeared mid-file", key.0, key.1);
                };
                reader
                    .push_row(row, buf)
                    .with_context(|| format!("{}/{} row {row}, column '{name}'", key.0, key.1))?;
            }
        }
    }

    let mut store = MemoryStore::new();
    for key in order {
        let Some(columns) = groups.remove(&key) else {
            continue;
        };
        let (split, entity) = key;
        for (name, buf) in columns {
            store.insert(split, &entity, buf.finish(&name)?);
        }
    }
    Ok(store)
}

// -- Parquet / Arrow helpers --

/// Per-column decoding strategy chosen from the Arrow data type.
enum ColumnReader {
    /// Scalars already cast to Float64.
    Scalar(ArrayRef),
    List(ArrayRef),
    Text(Vec<String>),
}

impl ColumnReader {
    fn new(col: &ArrayRef) -> Result<Self> {
        match col.data_type() {
            DataType::List(_) | DataType::LargeList(_) => Ok(ColumnReader::List(col.clone())),
            DataType::Utf8 | DataType::LargeUtf8 => Ok(ColumnReader::Text(string_values(col)?)),
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float16
            | DataType::Float32
            | DataType::Float64
            | DataType::Boolean => Ok(ColumnReader::Scalar(
                cast(col, &DataType::Float64).context("casting to Float64")?,
            )),
            other => bail!("unsupported column type {other:?}"),
        }
    }

    fn empty_buffer(&self) -> CellBuffer {
        match self {
            ColumnReader::Text(_) => CellBuffer::Text(Vec::new()),
            _ => CellBuffer::numeric(),
        }
    }

    fn push_row(&self, row: usize, buf: &mut CellBuffer) -> Result<()> {
        match self {
            ColumnReader::Scalar(arr) => {
                let v = if arr.is_null(row) {
                    f64::NAN
                } else {
                    arr.as_primitive::<Float64Type>().value(row)
                };
                buf.push_numeric(&[v])
            }
            ColumnReader::List(arr) => buf.push_numeric(&extract_f64_list(arr, row)?),
            ColumnReader::Text(values) => buf.push_text(values[row].clone()),
        }
    }
}

/// Extract a `Vec<f64>` from a List or LargeList column at the given row.
fn extract_f64_list(col: &ArrayRef, row: usize) -> Result<Vec<f64>> {
    if col.is_null(row) {
        bail!("null value in list column");
    }

    let values_array = match col.data_type() {
        DataType::List(_) => col.as_list::<i32>().value(row),
        DataType::LargeList(_) => col.as_list::<i64>().value(row),
        other => bail!("Expected List or LargeList column, got {other:?}"),
    };

    let values = cast(&values_array, &DataType::Float64).with_context(|| {
        format!(
            "List inner type is {:?}, expected a numeric type",
            values_array.data_type()
        )
    })?;
    Ok(values
        .as_primitive::<Float64Type>()
        .iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}

/// Decode a Utf8 / LargeUtf8 column; nulls become empty strings.
fn string_values(col: &ArrayRef) -> Result<Vec<String>> {
    let to_owned = |v: Option<&str>| v.unwrap_or_default().to_string();
    match col.data_type() {
        DataType::Utf8 => Ok(col.as_string::<i32>().iter().map(to_owned).collect()),
        DataType::LargeUtf8 => Ok(col.as_string::<i64>().iter().map(to_owned).collect()),
        other => bail!("Expected Utf8 column, got {other:?}"),
    }
}
