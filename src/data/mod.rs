/// Data layer: store access, row selection and matrix assembly.
///
/// Architecture:
/// ```text
///  .json / .parquet / .h5
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  open file → ColumnStore (split/entity/column)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  select   │  label column + mode filter → sorted row sample
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ assemble  │  FeatureSchema + sample → (features, labels) block
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  entities in order → stacked matrix / labels
///   └───────────┘
/// ```

pub mod aggregate;
pub mod assemble;
pub mod features;
#[cfg(feature = "hdf5")]
pub mod hdf5_store;
pub mod loader;
pub mod model;
pub mod select;
