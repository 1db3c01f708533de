use ndarray::{concatenate, Array2, ArrayView2, Axis};
use rand::Rng;

use super::assemble::{assemble, label_values};
use super::features::FeatureSchema;
use super::model::{ColumnStore, Split};
use super::select::{effective_sample_size, eligible_rows, select_rows};
use crate::error::{LoadError, Result};

pub const DEFAULT_LABEL: &str = "label";

/// Which rows and columns to pull out of a store.
#[derive(Debug, Clone)]
pub struct LoadRequest {
    /// Entities in output order; `None` loads every entity under the split.
    pub entities: Option<Vec<String>>,
    pub split: Split,
    pub label: String,
    /// Explicit schema; `None` derives one from the first entity.
    pub features: Option<FeatureSchema>,
    /// Per-entity upper bound on sampled rows.
    pub sample_size: Option<usize>,
    /// Keep only rows whose label equals this value.
    pub mode: Option<f64>,
}

impl Default for LoadRequest {
    fn default() -> Self {
        Self {
            entities: None,
            split: Split::Train,
            label: DEFAULT_LABEL.to_string(),
            features: None,
            sample_size: None,
            mode: None,
        }
    }
}

/// Sample, assemble and stack every requested entity.
///
/// Blocks are appended in entity order; rows inside a block keep ascending
/// store order. An empty entity list yields a zero-row matrix.
pub fn load_all<R: Rng + ?Sized>(
    store: &dyn ColumnStore,
    request: &LoadRequest,
    rng: &mut R,
) -> Result<(Array2<f64>, Array2<f64>)> {
    let entities = match &request.entities {
        Some(list) => list.clone(),
        None => store.entity_names(request.split)?,
    };
    log::info!("loading {} proteins from {}", entities.len(), request.split);

    // Explicit schemas are trusted as given; derived ones are re-checked per entity.
    let derived = request.features.is_none();
    let mut schema = request.features.clone();

    let mut x_blocks: Vec<Array2<f64>> = Vec::with_capacity(entities.len());
    let mut y_blocks: Vec<Array2<f64>> = Vec::with_capacity(entities.len());

    for entity in &entities {
        let entity_schema = match schema.take() {
            Some(s) => {
                if derived {
                    check_schema(store, request, entity, &s)?;
                }
                s
            }
            None => {
                let columns = store.column_names(request.split, entity)?;
                let s = FeatureSchema::derive(&columns, &request.label);
                log::debug!("derived {} feature columns from '{entity}'", s.len());
                s
            }
        };

        let label_column = store.read_column(request.split, entity, &request.label)?;
        let labels = label_values(entity, &label_column)?;
        let eligible = eligible_rows(&labels, request.mode).len();
        if let Some(n) = request.sample_size {
            if n > eligible {
                log::warn!(
                    "'{entity}': requested {n} rows but only {eligible} eligible, taking all"
                );
            }
        }

        let sample = select_rows(&labels, request.mode, request.sample_size, rng);
        debug_assert_eq!(sample.len(), effective_sample_size(request.sample_size, eligible));
        log::debug!("'{entity}': {} eligible, {} sampled", eligible, sample.len());

        let (x, y) = assemble(
            store,
            request.split,
            entity,
            &sample,
            &entity_schema,
            &label_column,
        )?;
        x_blocks.push(x);
        y_blocks.push(y);
        schema = Some(entity_schema);
    }

    let n_features = schema.as_ref().map_or(0, FeatureSchema::len);
    let x = stack(&x_blocks, n_features)?;
    let label_width = y_blocks.first().map_or(1, |y| y.ncols());
    let y = stack(&y_blocks, label_width)?;
    Ok((x, y))
}

fn check_schema(
    store: &dyn ColumnStore,
    request: &LoadRequest,
    entity: &str,
    schema: &FeatureSchema,
) -> Result<()> {
    let columns = store.column_names(request.split, entity)?;
    match schema.diff(&columns, &request.label) {
        None => Ok(()),
        Some((missing, unexpected)) => Err(LoadError::SchemaMismatch {
            entity: entity.to_string(),
            missing,
            unexpected,
        }),
    }
}

/// Vertically concatenate blocks; no blocks gives a `0 × width` matrix.
fn stack(blocks: &[Array2<f64>], width: usize) -> Result<Array2<f64>> {
    if blocks.is_empty() {
        return Ok(Array2::zeros((0, width)));
    }
    let views: Vec<ArrayView2<f64>> = blocks.iter().map(|b| b.view()).collect();
    concatenate(Axis(0), &views).map_err(|e| LoadError::Format(format!("stacking blocks: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use crate::data::model::{Column, MemoryStore};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    /// Entity whose `vina` column encodes (entity_id * 1000 + row).
    fn add_entity(store: &mut MemoryStore, name: &str, id: usize, rows: usize) {
        let label = (0..rows).map(|i| (i % 2) as f64).collect();
        let vina = (0..rows).map(|i| (id * 1000 + i) as f64).collect();
        store
            .insert(Split::Train, name, Column::text("receptor", vec![name.to_string(); rows]))
            .insert(Split::Train, name, Column::scalars("label", label))
            .insert(Split::Train, name, Column::scalars("vina", vina))
            .insert(Split::Train, name, Column::scalars("hbond", vec![id as f64; rows]));
    }

    fn kinase_store() -> MemoryStore {
        let mut store = MemoryStore::new();
        add_entity(&mut store, "lck", 1, 20);
        add_entity(&mut store, "src", 2, 8);
        add_entity(&mut store, "abl1", 3, 12);
        store
    }

    #[test]
    fn concatenates_in_requested_order() {
        let store = kinase_store();
        let request = LoadRequest {
            entities: Some(names(&["abl1", "lck"])),
            features: Some(FeatureSchema::new(names(&["hbond", "vina"])).unwrap()),
            sample_size: Some(5),
            ..Default::default()
        };
        let (x, y) = load_all(&store, &request, &mut StdRng::seed_from_u64(11)).unwrap();

        assert_eq!(x.dim(), (10, 2));
        assert_eq!(y.dim(), (10, 1));
        assert!(x.column(0).iter().take(5).all(|&v| v == 3.0));
        assert!(x.column(0).iter().skip(5).all(|&v| v == 1.0));
        // ascending within each block
        let vina = x.column(1).to_vec();
        assert!(vina[..5].windows(2).all(|w| w[0] < w[1]));
        assert!(vina[5..].windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn discovers_entities_and_derives_schema() {
        let store = kinase_store();
        let request = LoadRequest::default();
        let (x, y) = load_all(&store, &request, &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(x.dim(), (40, 2));
        assert_eq!(y.nrows(), 40);
        // derived order follows the first entity's columns
        assert_eq!(x[[0, 0]], 1000.0);
        assert_eq!(x[[0, 1]], 1.0);
    }

    #[test]
    fn row_count_is_sum_of_clipped_samples() {
        let store = kinase_store();
        let request = LoadRequest {
            sample_size: Some(5),
            mode: Some(1.0),
            ..Default::default()
        };
        let (x, y) = load_all(&store, &request, &mut StdRng::seed_from_u64(5)).unwrap();
        // lck 10 eligible → 5, src 4 eligible → 4, abl1 6 eligible → 5
        assert_eq!(x.nrows(), 14);
        assert!(y.iter().all(|&v| v == 1.0));
    }

    #[test]
    fn empty_entity_list_is_not_an_error() {
        let store = kinase_store();
        let request = LoadRequest {
            entities: Some(vec![]),
            ..Default::default()
        };
        let (x, y) = load_all(&store, &request, &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(x.nrows(), 0);
        assert_eq!(y.nrows(), 0);
    }

    #[test]
    fn zero_eligible_entity_contributes_no_rows() {
        let store = kinase_store();
        let request = LoadRequest {
            entities: Some(names(&["src", "lck"])),
            mode: Some(7.0),
            ..Default::default()
        };
        let (x, y) = load_all(&store, &request, &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(x.dim(), (0, 2));
        assert_eq!(y.nrows(), 0);
    }

    #[test]
    fn derived_schema_mismatch_fails() {
        let mut store = kinase_store();
        store.insert(Split::Train, "src", Column::scalars("sasa", vec![0.5; 8]));

        let request = LoadRequest::default();
        let err = load_all(&store, &request, &mut StdRng::seed_from_u64(0)).unwrap_err();
        match err {
            LoadError::SchemaMismatch { entity, missing, unexpected } => {
                assert_eq!(entity, "src");
                assert!(missing.is_empty());
                assert_eq!(unexpected, names(&["sasa"]));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn explicit_schema_tolerates_extra_columns() {
        let mut store = kinase_store();
        store.insert(Split::Train, "src", Column::scalars("sasa", vec![0.5; 8]));
        let request = LoadRequest {
            features: Some(FeatureSchema::new(names(&["vina"])).unwrap()),
            ..Default::default()
        };
        let (x, _) = load_all(&store, &request, &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(x.dim(), (40, 1));
    }

    #[test]
    fn unknown_entity_propagates() {
        let store = kinase_store();
        let request = LoadRequest {
            entities: Some(names(&["lck", "egfr"])),
            ..Default::default()
        };
        assert!(matches!(
            load_all(&store, &request, &mut StdRng::seed_from_u64(0)),
            Err(LoadError::MissingEntity { .. })
        ));
    }

    /// Records every column read so tests can count store round trips.
    struct CountingStore {
        inner: MemoryStore,
        reads: RefCell<Vec<(String, String)>>,
    }

    impl ColumnStore for CountingStore {
        fn entity_names(&self, split: Split) -> Result<Vec<String>> {
            self.inner.entity_names(split)
        }

        fn column_names(&self, split: Split, entity: &str) -> Result<Vec<String>> {
            self.inner.column_names(split, entity)
        }

        fn read_column(&self, split: Split, entity: &str, column: &str) -> Result<Column> {
            self.reads
                .borrow_mut()
                .push((entity.to_string(), column.to_string()));
            self.inner.read_column(split, entity, column)
        }
    }

    #[test]
    fn each_column_is_read_once_per_entity() {
        let store = CountingStore {
            inner: kinase_store(),
            reads: RefCell::new(Vec::new()),
        };
        let request = LoadRequest {
            sample_size: Some(4),
            mode: Some(1.0),
            ..Default::default()
        };
        load_all(&store, &request, &mut StdRng::seed_from_u64(1)).unwrap();

        let reads = store.reads.borrow();
        for entity in ["lck", "src", "abl1"] {
            for column in ["label", "vina", "hbond"] {
                let n = reads.iter().filter(|(e, c)| e == entity && c == column).count();
                assert_eq!(n, 1, "{entity}/{column}");
            }
        }
        assert_eq!(reads.len(), 9);
    }

    #[test]
    fn missing_label_column_is_an_error() {
        let store = kinase_store();
        let request = LoadRequest {
            label: "affinity".into(),
            ..Default::default()
        };
        let err = load_all(&store, &request, &mut StdRng::seed_from_u64(0)).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn { column, .. } if column == "affinity"));
    }
}
