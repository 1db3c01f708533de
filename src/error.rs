use thiserror::Error;

/// Errors raised while selecting, assembling or preprocessing feature data.
#[derive(Error, Debug)]
pub enum LoadError {
    /// A requested feature or label column does not exist for the entity.
    #[error("column '{column}' not found for {split}/{entity}")]
    MissingColumn {
        split: String,
        entity: String,
        column: String,
    },

    /// An entity's columns disagree with a schema derived from an earlier entity.
    #[error(
        "schema mismatch for entity '{entity}': missing {missing:?}, unexpected {unexpected:?}"
    )]
    SchemaMismatch {
        entity: String,
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    /// A sampled row index exceeds the stored row count.
    #[error("row {index} out of range for {entity}/{column} ({len} rows)")]
    IndexOutOfRange {
        entity: String,
        column: String,
        index: usize,
        len: usize,
    },

    #[error("unsupported oversampling method: '{0}' (expected none, smote or random)")]
    UnsupportedOversampleMethod(String),

    #[error("unknown split '{0}' (expected train or test)")]
    UnknownSplit(String),

    /// The store has no partition for the split.
    #[error("split '{0}' not present in store")]
    MissingSplit(String),

    #[error("entity '{entity}' not present under split '{split}'")]
    MissingEntity { split: String, entity: String },

    /// Text columns (receptor/ligand identifiers) cannot be read as numbers.
    #[error("column '{column}' of entity '{entity}' is not numeric")]
    NonNumericColumn { entity: String, column: String },

    #[error("invalid feature schema: {0}")]
    InvalidSchema(String),

    /// Oversampling and class counting need exactly one label column.
    #[error("expected a single label column, got {0}")]
    InvalidLabelShape(usize),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Backend-specific read failure (HDF5, malformed cells, ...).
    #[error("storage error: {0}")]
    Format(String),
}

pub type Result<T> = std::result::Result<T, LoadError>;
