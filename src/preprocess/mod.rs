/// Transforms applied to an assembled matrix before it is handed to a model.
///
/// Order used by [`crate::dataset::KinaseDataset`]:
/// impute → scale → oversample → one-hot encode labels.

pub mod encode;
pub mod impute;
pub mod oversample;
pub mod scale;

use std::fmt;
use std::str::FromStr;

use crate::error::LoadError;

pub use encode::OneHotEncoder;
pub use impute::MeanImputer;
pub use oversample::{class_counts, random_oversample, smote, DEFAULT_K_NEIGHBORS};
pub use scale::StandardScaler;

/// Class balancing strategy, resolved when the configuration is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Oversample {
    #[default]
    None,
    /// Synthetic minority rows interpolated between nearest neighbours.
    Smote,
    /// Minority rows duplicated at random.
    Random,
}

impl FromStr for Oversample {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Oversample::None),
            "smote" => Ok(Oversample::Smote),
            "random" => Ok(Oversample::Random),
            _ => Err(LoadError::UnsupportedOversampleMethod(s.to_string())),
        }
    }
}

impl fmt::Display for Oversample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Oversample::None => "none",
            Oversample::Smote => "smote",
            Oversample::Random => "random",
        })
    }
}

impl<'de> serde::Deserialize<'de> for Oversample {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_methods_parse() {
        assert_eq!("smote".parse::<Oversample>().unwrap(), Oversample::Smote);
        assert_eq!("Random".parse::<Oversample>().unwrap(), Oversample::Random);
        assert_eq!("none".parse::<Oversample>().unwrap(), Oversample::None);
    }

    #[test]
    fn unknown_method_fails_construction() {
        let err = "adasyn".parse::<Oversample>().unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedOversampleMethod(m) if m == "adasyn"));
    }

    #[test]
    fn unknown_method_fails_deserialization() {
        let parsed: Result<Oversample, _> = serde_json::from_str("\"borderline\"");
        assert!(parsed.is_err());
        let parsed: Oversample = serde_json::from_str("\"smote\"").unwrap();
        assert_eq!(parsed, Oversample::Smote);
    }
}
