use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use clap::Parser;
use parquet::arrow::ArrowWriter;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

const DEFAULT_OUTPUT: &str = "diabetes_dataset.csv";
const DEFAULT_ROWS: usize = 1000;

const GENDERS: [&str; 3] = ["Female", "Male", "Other"];
const LOCATIONS: [&str; 6] = ["Alabama", "Alaska", "Arizona", "California", "Delaware", "Florida"];

/// One synthetic record.  Flags are mostly 0/1 with a sprinkle of
/// "Yes"/"No" spellings and blanks so the cleaning path gets exercised.
#[derive(Debug, Serialize)]
struct Row {
    year: i64,
    gender: String,
    age: f64,
    location: String,
    race_asian: i64,
    race_caucasian: i64,
    race_hispanic: i64,
    race_other: i64,
    hypertension: String,
    heart_disease: String,
    smoking: String,
    obesity: String,
    high_cholesterol: String,
    high_blood_glucose: String,
    diabetes: String,
}

fn flag(rng: &mut StdRng, p: f64) -> String {
    let yes = rng.gen_bool(p.clamp(0.0, 1.0));
    match rng.gen_range(0..20) {
        0 => String::new(),
        1 => (if yes { "Yes" } else { "no" }).to_string(),
        _ => u8::from(yes).to_string(),
    }
}

fn generate(rows: usize, rng: &mut StdRng) -> Vec<Row> {
    (0..rows)
        .map(|_| {
            let age: f64 = (rng.gen_range(1.0..80.0_f64) * 10.0).round() / 10.0;
            let risk = age / 100.0;
            let race = rng.gen_range(0..4);
            let obesity = flag(rng, 0.15 + risk * 0.3);
            let obese = obesity == "1" || obesity == "Yes";
            Row {
                year: rng.gen_range(2015..=2022),
                gender: GENDERS[rng.gen_range(0..GENDERS.len())].to_string(),
                age,
                location: LOCATIONS[rng.gen_range(0..LOCATIONS.len())].to_string(),
                race_asian: i64::from(race == 0),
                race_caucasian: i64::from(race == 1),
                race_hispanic: i64::from(race == 2),
                race_other: i64::from(race == 3),
                hypertension: flag(rng, risk * 0.4),
                heart_disease: flag(rng, risk * 0.15),
                smoking: flag(rng, 0.2),
                high_cholesterol: flag(rng, risk * 0.5),
                high_blood_glucose: flag(rng, risk * 0.3),
                diabetes: flag(rng, (if obese { 0.25 } else { 0.06 }) + risk * 0.1),
                obesity,
            }
        })
        .collect()
}

fn write_csv(path: &Path, rows: &[Row]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV file")?;
    for row in rows {
        writer.serialize(row).context("writing CSV row")?;
    }
    writer.flush().context("flushing CSV file")?;
    Ok(())
}

fn write_parquet(path: &Path, rows: &[Row]) -> Result<()> {
    let text = |f: fn(&Row) -> &str| -> ArrayRef {
        Arc::new(StringArray::from(rows.iter().map(f).collect::<Vec<_>>()))
    };
    let int = |f: fn(&Row) -> i64| -> ArrayRef {
        Arc::new(Int64Array::from(rows.iter().map(f).collect::<Vec<_>>()))
    };

    let ages: ArrayRef = Arc::new(Float64Array::from(
        rows.iter().map(|r| r.age).collect::<Vec<_>>(),
    ));

    let columns: Vec<(&str, ArrayRef)> = vec![
        ("year", int(|r| r.year)),
        ("gender", text(|r| r.gender.as_str())),
        ("age", ages),
        ("location", text(|r| r.location.as_str())),
        ("race_asian", int(|r| r.race_asian)),
        ("race_caucasian", int(|r| r.race_caucasian)),
        ("race_hispanic", int(|r| r.race_hispanic)),
        ("race_other", int(|r| r.race_other)),
        ("hypertension", text(|r| r.hypertension.as_str())),
        ("heart_disease", text(|r| r.heart_disease.as_str())),
        ("smoking", text(|r| r.smoking.as_str())),
        ("obesity", text(|r| r.obesity.as_str())),
        ("high_cholesterol", text(|r| r.high_cholesterol.as_str())),
        ("high_blood_glucose", text(|r| r.high_blood_glucose.as_str())),
        ("diabetes", text(|r| r.diabetes.as_str())),
    ];

    let schema = Arc::new(Schema::new(
        columns
            .iter()
            .map(|(name, array)| Field::new(*name, array.data_type().clone(), false))
            .collect::<Vec<_>>(),
    ));

    let batch = RecordBatch::try_new(
        schema.clone(),
        columns.into_iter().map(|(_, array)| array).collect(),
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

/// Write a synthetic health dataset for trying the dashboard.
#[derive(Debug, Parser)]
struct Args {
    /// Output file; `.parquet` writes Parquet, anything else CSV.
    #[arg(default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Number of records.
    #[arg(default_value_t = DEFAULT_ROWS)]
    rows: usize,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> Result<()> {
    env_logger::init();
    let Args { output, rows, seed } = Args::parse();

    let mut rng = StdRng::seed_from_u64(seed);
    let data = generate(rows, &mut rng);

    let is_parquet = output
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("parquet"));
    if is_parquet {
        write_parquet(&output, &data)?;
    } else {
        write_csv(&output, &data)?;
    }

    log::info!("Wrote {} records to {}", data.len(), output.display());
    println!("Wrote {} records to {}", data.len(), output.display());
    Ok(())
}
