//! Protein–ligand binding feature loading.
//!
//! Reads per-protein feature columns from a `split/entity/column` store,
//! draws mode-filtered random row samples, assembles dense feature matrices
//! and prepares them for training (imputation, scaling, class balancing and
//! one-hot labels).

pub mod data;
pub mod dataset;
pub mod error;
pub mod preprocess;

pub use data::aggregate::{load_all, LoadRequest};
pub use data::features::{filter_features, parse_features, FeatureSchema};
pub use data::loader::open_store;
pub use data::model::{Column, ColumnStore, MemoryStore, Split};
pub use data::select::select_rows;
pub use dataset::{DatasetConfig, KinaseDataset};
pub use error::LoadError;
pub use preprocess::Oversample;
