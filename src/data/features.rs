use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};

use crate::error::LoadError;

/// Identifier columns stored alongside features that never enter the matrix.
pub const METADATA_COLUMNS: [&str; 3] = ["receptor", "drugID", "label"];

// ---------------------------------------------------------------------------
// Feature list filtering
// ---------------------------------------------------------------------------

/// Remove every excluded name from `features`, keeping the original order.
///
/// Excluded names that do not occur in `features` are ignored, so applying
/// the same exclusion twice is a no-op.
pub fn filter_features(features: &[String], excluded: Option<&[String]>) -> Vec<String> {
    let Some(excluded) = excluded else {
        return features.to_vec();
    };
    let excluded: BTreeSet<&str> = excluded.iter().map(String::as_str).collect();
    features
        .iter()
        .filter(|name| !excluded.contains(name.as_str()))
        .cloned()
        .collect()
}

/// Read a feature list and, optionally, a list of null columns to drop.
///
/// Both files hold one column name per line.
pub fn parse_features(feature_path: &Path, null_path: Option<&Path>) -> Result<Vec<String>> {
    let features = read_name_list(feature_path)
        .with_context(|| format!("reading feature list {}", feature_path.display()))?;

    let excluded = match null_path {
        Some(p) => Some(
            read_name_list(p).with_context(|| format!("reading null list {}", p.display()))?,
        ),
        None => None,
    };

    let filtered = filter_features(&features, excluded.as_deref());
    log::debug!(
        "feature list: {} names, {} after null filtering",
        features.len(),
        filtered.len()
    );
    Ok(filtered)
}

/// One name per line, taken verbatim apart from surrounding whitespace.
fn read_name_list(path: &Path) -> Result<Vec<String>> {
    let reader = BufReader::new(File::open(path)?);

    let mut names = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("line {}", line_no + 1))?;
        let name = line.trim();
        if !name.is_empty() {
            names.push(name.to_string());
        }
    }
    Ok(names)
}

// ---------------------------------------------------------------------------
// FeatureSchema – validated canonical column order
// ---------------------------------------------------------------------------

/// Ordered, duplicate-free list of feature column names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    names: Vec<String>,
}

impl FeatureSchema {
    pub fn new(names: Vec<String>) -> Result<Self, LoadError> {
        let mut seen = BTreeSet::new();
        for name in &names {
            if name.trim().is_empty() {
                return Err(LoadError::InvalidSchema("empty feature name".into()));
            }
            if !seen.insert(name.as_str()) {
                return Err(LoadError::InvalidSchema(format!(
                    "duplicate feature name '{name}'"
                )));
            }
        }
        Ok(FeatureSchema { names })
    }

    /// Schema implied by an entity's stored columns: everything except the
    /// label and [`METADATA_COLUMNS`], in store order.
    pub fn derive(columns: &[String], label: &str) -> Self {
        let names = columns
            .iter()
            .filter(|c| c.as_str() != label && !METADATA_COLUMNS.contains(&c.as_str()))
            .cloned()
            .collect();
        FeatureSchema { names }
    }

    /// Compare against another entity's columns.
    ///
    /// Returns the schema names the columns lack and the extra feature
    /// columns they carry, or `None` when they agree.
    pub fn diff(&self, columns: &[String], label: &str) -> Option<(Vec<String>, Vec<String>)> {
        let other = FeatureSchema::derive(columns, label);
        let ours: BTreeSet<&String> = self.names.iter().collect();
        let theirs: BTreeSet<&String> = other.names.iter().collect();
        if ours == theirs {
            return None;
        }
        let missing = ours.difference(&theirs).map(|s| s.to_string()).collect();
        let unexpected = theirs.difference(&ours).map(|s| s.to_string()).collect();
        Some((missing, unexpected))
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn filter_preserves_order_and_drops_excluded() {
        let list = names(&["vina", "pocket_volume", "hbond", "rotatable", "hbond"]);
        let out = filter_features(&list, Some(&names(&["hbond", "not_there"])));
        assert_eq!(out, names(&["vina", "pocket_volume", "rotatable"]));
    }

    #[test]
    fn filter_without_exclusions_is_identity() {
        let list = names(&["b", "a", "c"]);
        assert_eq!(filter_features(&list, None), list);
    }

    #[test]
    fn filter_is_idempotent() {
        let list = names(&["a", "b", "c", "d", "b"]);
        let excl = names(&["b", "z"]);
        let once = filter_features(&list, Some(&excl));
        assert_eq!(filter_features(&once, Some(&excl)), once);
    }

    #[test]
    fn parse_features_applies_null_list() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let feature_path = dir.path().join("binding_features_list.txt");
        let null_path = dir.path().join("null_column_list.txt");
        write!(std::fs::File::create(&feature_path)?, "vina\nhbond\n\npocket_volume\r\nsasa")?;
        write!(std::fs::File::create(&null_path)?, "hbond\nunknown\n")?;

        let features = parse_features(&feature_path, Some(&null_path))?;
        assert_eq!(features, names(&["vina", "pocket_volume", "sasa"]));

        let all = parse_features(&feature_path, None)?;
        assert_eq!(all.len(), 4);
        Ok(())
    }

    #[test]
    fn names_are_whole_lines() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let feature_path = dir.path().join("features.txt");
        std::fs::write(&feature_path, "pocket,volume\n\"hbond\" count\nvina\n")?;

        let features = parse_features(&feature_path, None)?;
        assert_eq!(features, names(&["pocket,volume", "\"hbond\" count", "vina"]));
        Ok(())
    }

    #[test]
    fn schema_rejects_duplicates_and_blanks() {
        assert!(FeatureSchema::new(names(&["a", "b"])).is_ok());
        assert!(matches!(
            FeatureSchema::new(names(&["a", "a"])),
            Err(LoadError::InvalidSchema(_))
        ));
        assert!(FeatureSchema::new(names(&["a", " "])).is_err());
    }

    #[test]
    fn derive_skips_label_and_metadata() {
        let cols = names(&["receptor", "drugID", "vina", "mode", "hbond", "label"]);
        let schema = FeatureSchema::derive(&cols, "mode");
        assert_eq!(schema.names(), &names(&["vina", "hbond"])[..]);
    }

    #[test]
    fn diff_reports_both_directions() {
        let schema = FeatureSchema::derive(&names(&["label", "a", "b"]), "label");
        assert!(schema.diff(&names(&["b", "a", "label", "receptor"]), "label").is_none());

        let (missing, unexpected) = schema.diff(&names(&["label", "a", "c"]), "label").unwrap();
        assert_eq!(missing, names(&["b"]));
        assert_eq!(unexpected, names(&["c"]));
    }
}
