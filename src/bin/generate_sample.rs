use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Float64Builder, Int64Array, ListBuilder, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use clap::Parser;
use parquet::arrow::ArrowWriter;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde_json::{json, Map, Value as JsonValue};

const PROTEINS: [&str; 4] = ["lck", "src", "abl1", "egfr"];
const POCKET_WIDTH: usize = 3;
const ACTIVE_RATE: f64 = 0.2;

#[derive(Parser, Debug)]
#[command(about = "Write a synthetic kinase binding feature store")]
struct Args {
    /// Output directory
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// Training rows per protein (test gets a third of this)
    #[arg(short, long, default_value_t = 120)]
    rows: usize,
}

/// All rows generated for one (split, protein) pair.
#[derive(Default)]
struct Block {
    label: Vec<i64>,
    vina: Vec<f64>,
    hbond: Vec<f64>,
    sasa: Vec<f64>,
    rotatable: Vec<f64>,
    pocket: Vec<[f64; POCKET_WIDTH]>,
    drug_id: Vec<String>,
}

fn generate_block(
    rows: usize,
    protein_shift: f64,
    first_drug: usize,
    rng: &mut StdRng,
) -> Result<Block> {
    let noise = Normal::new(0.0, 1.0).context("building normal distribution")?;
    let mut block = Block::default();

    for r in 0..rows {
        let active = rng.gen_bool(ACTIVE_RATE);
        let a = if active { 1.0 } else { 0.0 };

        block.label.push(active as i64);
        block.vina.push(-6.5 - 1.8 * a + protein_shift + 0.9 * noise.sample(rng));
        block.hbond.push((2.5 + 1.5 * a + noise.sample(rng)).round().max(0.0));
        // a few missing surface areas
        let sasa = if rng.gen_bool(0.03) {
            f64::NAN
        } else {
            420.0 + 60.0 * noise.sample(rng)
        };
        block.sasa.push(sasa);
        block.rotatable.push(f64::NAN);
        block.pocket.push([
            650.0 + 80.0 * a + 40.0 * noise.sample(rng),
            11.0 + noise.sample(rng),
            0.35 + 0.05 * noise.sample(rng),
        ]);
        block.drug_id.push(format!("CHEMBL{:06}", first_drug + r));
    }
    Ok(block)
}

fn json_number(v: f64) -> JsonValue {
    if v.is_nan() {
        JsonValue::Null
    } else {
        json!(v)
    }
}

fn json_numbers(values: &[f64]) -> JsonValue {
    JsonValue::Array(values.iter().map(|&x| json_number(x)).collect())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let mut rng = StdRng::seed_from_u64(args.seed);

    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;

    // Flat columns for Parquet
    let mut all_split: Vec<&str> = Vec::new();
    let mut all_entity: Vec<&str> = Vec::new();
    let mut all_receptor: Vec<&str> = Vec::new();
    let mut all_label: Vec<i64> = Vec::new();
    let mut all_vina: Vec<f64> = Vec::new();
    let mut all_hbond: Vec<f64> = Vec::new();
    let mut all_sasa: Vec<f64> = Vec::new();
    let mut all_rotatable: Vec<f64> = Vec::new();
    let mut all_drug: Vec<String> = Vec::new();
    let mut pocket_builder = ListBuilder::new(Float64Builder::new());

    let mut json_root = Map::new();
    let mut drug_counter = 0;

    for (split, rows) in [("train", args.rows), ("test", (args.rows / 3).max(1))] {
        let mut json_split = Map::new();

        for (p, &protein) in PROTEINS.iter().enumerate() {
            let block = generate_block(rows, 0.3 * p as f64, drug_counter, &mut rng)?;
            drug_counter += rows;

            for cell in &block.pocket {
                pocket_builder.values().append_slice(cell);
                pocket_builder.append(true);
            }
            all_split.extend(std::iter::repeat(split).take(rows));
            all_entity.extend(std::iter::repeat(protein).take(rows));
            all_receptor.extend(std::iter::repeat(protein).take(rows));
            all_label.extend(&block.label);
            all_vina.extend(&block.vina);
            all_hbond.extend(&block.hbond);
            all_sasa.extend(&block.sasa);
            all_rotatable.extend(&block.rotatable);
            all_drug.extend(block.drug_id.iter().cloned());

            json_split.insert(
                protein.to_string(),
                json!({
                    "label": block.label,
                    "receptor": vec![protein; rows],
                    "drugID": block.drug_id,
                    "vina": json_numbers(&block.vina),
                    "hbond": json_numbers(&block.hbond),
                    "sasa": json_numbers(&block.sasa),
                    "rotatable": json_numbers(&block.rotatable),
                    "pocket": block.pocket.iter().map(|c| json_numbers(c)).collect::<Vec<_>>(),
                }),
            );
        }
        json_root.insert(split.to_string(), JsonValue::Object(json_split));
    }

    // ---- Parquet ----
    let schema = Arc::new(Schema::new(vec![
        Field::new("split", DataType::Utf8, false),
        Field::new("entity", DataType::Utf8, false),
        Field::new("receptor", DataType::Utf8, false),
        Field::new("drugID", DataType::Utf8, false),
        Field::new("label", DataType::Int64, false),
        Field::new("vina", DataType::Float64, false),
        Field::new("hbond", DataType::Float64, false),
        Field::new("sasa", DataType::Float64, false),
        Field::new("rotatable", DataType::Float64, false),
        Field::new(
            "pocket",
            DataType::List(Arc::new(Field::new("item", DataType::Float64, true))),
            false,
        ),
    ]));
    let total_rows = all_label.len();

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(all_split)),
            Arc::new(StringArray::from(all_entity)),
            Arc::new(StringArray::from(all_receptor)),
            Arc::new(StringArray::from(all_drug)),
            Arc::new(Int64Array::from(all_label)),
            Arc::new(Float64Array::from(all_vina)),
            Arc::new(Float64Array::from(all_hbond)),
            Arc::new(Float64Array::from(all_sasa)),
            Arc::new(Float64Array::from(all_rotatable)),
            Arc::new(pocket_builder.finish()),
        ],
    )
    .context("building record batch")?;

    let parquet_path = args.output.join("sample_kinase.parquet");
    let file = std::fs::File::create(&parquet_path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing record batch")?;
    writer.close().context("closing parquet writer")?;

    // ---- JSON ----
    let json_path = args.output.join("sample_kinase.json");
    std::fs::write(&json_path, serde_json::to_string(&JsonValue::Object(json_root))?)
        .context("writing JSON store")?;

    // ---- Feature lists ----
    std::fs::write(
        args.output.join("features.txt"),
        "vina\nhbond\nsasa\nrotatable\npocket\n",
    )?;
    std::fs::write(args.output.join("null_features.txt"), "rotatable\n")?;

    println!(
        "Wrote {total_rows} rows for {} proteins to {} and {}",
        PROTEINS.len(),
        parquet_path.display(),
        json_path.display()
    );
    Ok(())
}
