use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use kinase_data::{DatasetConfig, KinaseDataset, Oversample, Split};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Feature store (.json, .parquet or .h5)
    #[arg(short, long)]
    data: PathBuf,

    /// JSON dataset config; flags below override its fields
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Partition to load: train or test
    #[arg(short, long)]
    split: Option<Split>,

    /// Label column name
    #[arg(short, long)]
    label: Option<String>,

    /// Protein to load (repeatable). All proteins when omitted
    #[arg(short, long = "protein")]
    proteins: Vec<String>,

    /// Maximum rows sampled per protein
    #[arg(short = 'n', long)]
    sample_size: Option<usize>,

    /// Keep only rows whose label equals this value
    #[arg(short, long)]
    mode: Option<f64>,

    /// Feature list file, one name per line
    #[arg(short, long)]
    features: Option<PathBuf>,

    /// Feature names to drop, one per line
    #[arg(long)]
    null_features: Option<PathBuf>,

    /// Class balancing: none, smote or random
    #[arg(short, long)]
    oversample: Option<Oversample>,

    /// Seed for sampling and oversampling
    #[arg(long)]
    seed: Option<u64>,
}

impl Args {
    fn into_config(self) -> Result<(PathBuf, DatasetConfig)> {
        let mut config = match &self.config {
            Some(path) => DatasetConfig::from_json_file(path)?,
            None => DatasetConfig::default(),
        };

        if let Some(split) = self.split {
            config.split = split;
        }
        if let Some(label) = self.label {
            config.label = label;
        }
        if !self.proteins.is_empty() {
            config.entities = Some(self.proteins);
        }
        if self.sample_size.is_some() {
            config.sample_size = self.sample_size;
        }
        if self.mode.is_some() {
            config.mode = self.mode;
        }
        if self.features.is_some() {
            config.feature_path = self.features;
        }
        if self.null_features.is_some() {
            config.null_path = self.null_features;
        }
        if let Some(method) = self.oversample {
            config.oversample = method;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }

        Ok((self.data, config))
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let (data_path, config) = Args::parse().into_config()?;
    log::debug!("config: {config:?}");

    let dataset = KinaseDataset::open(&data_path, &config)?;

    println!(
        "{} rows x {} features from {} ({} split)",
        dataset.len(),
        dataset.n_features(),
        data_path.display(),
        config.split
    );
    let categories = dataset.encoder().categories.iter().flatten();
    for (class, count) in categories.zip(dataset.class_counts()) {
        println!("  class {class}: {count} rows");
    }

    Ok(())
}
