use std::path::{Path, PathBuf};

use anyhow::Context;
use ndarray::{Array2, ArrayView1, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

use crate::data::aggregate::{load_all, LoadRequest, DEFAULT_LABEL};
use crate::data::features::{parse_features, FeatureSchema};
use crate::data::loader::open_store;
use crate::data::model::{ColumnStore, Split};
use crate::error::Result;
use crate::preprocess::{
    random_oversample, smote, MeanImputer, OneHotEncoder, Oversample, StandardScaler,
    DEFAULT_K_NEIGHBORS,
};

// ---------------------------------------------------------------------------
// DatasetConfig
// ---------------------------------------------------------------------------

/// Everything needed to build a [`KinaseDataset`] from a store.
///
/// Deserialisable from JSON; absent fields take their defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatasetConfig {
    pub split: Split,
    pub label: String,
    /// Proteins to load, in order. `None` loads all of them.
    pub entities: Option<Vec<String>>,
    pub sample_size: Option<usize>,
    pub mode: Option<f64>,
    /// Newline-delimited feature names; the schema is derived when absent.
    pub feature_path: Option<PathBuf>,
    /// Names removed from the feature list.
    pub null_path: Option<PathBuf>,
    pub oversample: Oversample,
    /// Seed for row sampling and oversampling.
    pub seed: Option<u64>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            split: Split::Train,
            label: DEFAULT_LABEL.to_string(),
            entities: None,
            sample_size: None,
            mode: None,
            feature_path: None,
            null_path: None,
            oversample: Oversample::None,
            seed: None,
        }
    }
}

impl DatasetConfig {
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Explicit feature schema from `feature_path` / `null_path`, if configured.
    pub fn feature_schema(&self) -> anyhow::Result<Option<FeatureSchema>> {
        let Some(feature_path) = &self.feature_path else {
            if self.null_path.is_some() {
                log::warn!("null feature list given without a feature list, ignoring it");
            }
            return Ok(None);
        };
        let names = parse_features(feature_path, self.null_path.as_deref())?;
        Ok(Some(FeatureSchema::new(names)?))
    }

    pub fn request(&self, features: Option<FeatureSchema>) -> LoadRequest {
        LoadRequest {
            entities: self.entities.clone(),
            split: self.split,
            label: self.label.clone(),
            features,
            sample_size: self.sample_size,
            mode: self.mode,
        }
    }

    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

// ---------------------------------------------------------------------------
// KinaseDataset
// ---------------------------------------------------------------------------

/// Scaled feature rows paired with one-hot encoded labels.
#[derive(Debug, Clone)]
pub struct KinaseDataset {
    features: Array2<f64>,
    labels: Array2<f64>,
    imputer: MeanImputer,
    scaler: StandardScaler,
    encoder: OneHotEncoder,
}

impl KinaseDataset {
    /// Open the store at `path` once and build the dataset from it.
    pub fn open(path: &Path, config: &DatasetConfig) -> anyhow::Result<Self> {
        let schema = config.feature_schema()?;
        let store = open_store(path)?;
        let mut rng = config.rng();
        let request = config.request(schema);
        let dataset = Self::from_store(store.as_ref(), &request, config.oversample, &mut rng)
            .with_context(|| format!("loading {}", path.display()))?;
        Ok(dataset)
    }

    /// Load, impute, scale, balance and encode.
    pub fn from_store<R: Rng + ?Sized>(
        store: &dyn ColumnStore,
        request: &LoadRequest,
        oversample: Oversample,
        rng: &mut R,
    ) -> Result<Self> {
        let (x, y) = load_all(store, request, rng)?;

        let (imputer, x) = MeanImputer::fit_transform(&x);
        let dropped = imputer.dropped();
        if !dropped.is_empty() {
            log::warn!("dropping {} feature columns with no values: {dropped:?}", dropped.len());
        }
        let scaler = StandardScaler::fit(&x);
        let x = scaler.transform(&x);

        let (x, y) = match oversample {
            Oversample::None => (x, y),
            Oversample::Smote => smote(&x, &y, DEFAULT_K_NEIGHBORS, rng)?,
            Oversample::Random => random_oversample(&x, &y, rng)?,
        };

        let (encoder, labels) = OneHotEncoder::fit_transform(&y);
        log::info!(
            "dataset ready: {} rows, {} features, {} label columns ({oversample} oversampling)",
            x.nrows(),
            x.ncols(),
            labels.ncols()
        );

        Ok(KinaseDataset {
            features: x,
            labels,
            imputer,
            scaler,
            encoder,
        })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.features.nrows()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.features.nrows() == 0
    }

    /// Feature row and encoded label row at `index`.
    pub fn get(&self, index: usize) -> Option<(ArrayView1<'_, f64>, ArrayView1<'_, f64>)> {
        if index >= self.len() {
            return None;
        }
        Some((self.features.row(index), self.labels.row(index)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (ArrayView1<'_, f64>, ArrayView1<'_, f64>)> + '_ {
        self.features.rows().into_iter().zip(self.labels.rows())
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    /// Width of the encoded label rows.
    pub fn n_classes(&self) -> usize {
        self.labels.ncols()
    }

    pub fn features(&self) -> &Array2<f64> {
        &self.features
    }

    pub fn labels(&self) -> &Array2<f64> {
        &self.labels
    }

    pub fn imputer(&self) -> &MeanImputer {
        &self.imputer
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn encoder(&self) -> &OneHotEncoder {
        &self.encoder
    }

    /// Rows per encoded label column.
    pub fn class_counts(&self) -> Vec<usize> {
        self.labels
            .sum_axis(Axis(0))
            .iter()
            .map(|&v| v as usize)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Column, MemoryStore};

    fn store() -> MemoryStore {
        let mut store = MemoryStore::new();
        for (name, rows) in [("lck", 40), ("src", 24)] {
            // 1 in 4 rows active
            let label: Vec<f64> = (0..rows).map(|i| if i % 4 == 0 { 1.0 } else { 0.0 }).collect();
            let vina: Vec<f64> = (0..rows).map(|i| -5.0 - (i % 7) as f64).collect();
            let mut sasa: Vec<f64> = (0..rows).map(|i| 100.0 + i as f64).collect();
            sasa[3] = f64::NAN;
            store
                .insert(Split::Train, name, Column::text("drugID", vec!["d".into(); rows]))
                .insert(Split::Train, name, Column::scalars("label", label))
                .insert(Split::Train, name, Column::scalars("vina", vina))
                .insert(Split::Train, name, Column::scalars("sasa", sasa));
        }
        store
    }

    fn build(
        store: &MemoryStore,
        request: &LoadRequest,
        oversample: Oversample,
        seed: u64,
    ) -> KinaseDataset {
        KinaseDataset::from_store(store, request, oversample, &mut StdRng::seed_from_u64(seed))
            .unwrap()
    }

    #[test]
    fn without_oversampling_rows_match_store() {
        let ds = build(&store(), &LoadRequest::default(), Oversample::None, 1);

        assert_eq!(ds.len(), 64);
        assert_eq!(ds.n_features(), 2);
        assert_eq!(ds.n_classes(), 2);
        assert_eq!(ds.class_counts(), vec![48, 16]);
        assert!(ds.features().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn feature_without_values_is_dropped() {
        let mut store = store();
        for (name, rows) in [("lck", 40), ("src", 24)] {
            store.insert(Split::Train, name, Column::scalars("rotatable", vec![f64::NAN; rows]));
        }
        let ds = build(&store, &LoadRequest::default(), Oversample::None, 1);

        assert_eq!(ds.n_features(), 2);
        assert_eq!(ds.imputer().dropped(), vec![2]);
        assert!(ds.features().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn oversampling_balances_classes() {
        let request = LoadRequest::default();
        for method in [Oversample::Smote, Oversample::Random] {
            let ds = build(&store(), &request, method, 2);
            assert_eq!(ds.len(), 96, "{method}");
            assert_eq!(ds.class_counts(), vec![48, 48], "{method}");
        }
    }

    #[test]
    fn get_returns_aligned_rows() {
        let request = LoadRequest {
            entities: Some(vec!["src".into()]),
            sample_size: Some(10),
            ..Default::default()
        };
        let ds = build(&store(), &request, Oversample::None, 3);

        assert_eq!(ds.len(), 10);
        let (x, y) = ds.get(9).unwrap();
        assert_eq!(x.len(), 2);
        assert_eq!(y.sum(), 1.0);
        assert!(ds.get(10).is_none());
        assert_eq!(ds.iter().count(), 10);
    }

    #[test]
    fn same_seed_builds_same_dataset() {
        let request = LoadRequest {
            sample_size: Some(12),
            ..Default::default()
        };
        let a = build(&store(), &request, Oversample::Smote, 9);
        let b = build(&store(), &request, Oversample::Smote, 9);
        assert_eq!(a.features(), b.features());
        assert_eq!(a.labels(), b.labels());
    }

    #[test]
    fn config_defaults_and_rejects_unknown_method() {
        let config: DatasetConfig =
            serde_json::from_str(r#"{"sample_size": 5, "seed": 1}"#).unwrap();
        assert_eq!(config.label, "label");
        assert_eq!(config.split, Split::Train);
        assert_eq!(config.oversample, Oversample::None);

        let bad: std::result::Result<DatasetConfig, _> =
            serde_json::from_str(r#"{"oversample": "tomek"}"#);
        assert!(bad.is_err());
    }
}
