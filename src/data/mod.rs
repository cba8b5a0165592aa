//! Training data
//!
//! Synthetic dataset generation and JSON-lines dataset files.

use crate::error::{PredictorError, Result};
use crate::schema::{LabeledRecord, RawPropertyRecord, KNOWN_NEIGHBORHOODS};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Reference year for the age term of the synthetic price
const REFERENCE_YEAR: f64 = 2025.0;

/// Standard deviation of the synthetic price noise
const PRICE_NOISE_STD: f64 = 10_000.0;

/// Synthetic sale price for the given attributes plus noise
fn synthetic_price(living_area: f64, quality: f64, year_built: f64, trend: f64, noise: f64) -> f64 {
    living_area * 120.0 + quality * 5_000.0 + (REFERENCE_YEAR - year_built) * -150.0 + trend * 1_000.0 + noise
}

/// Generate `n` labeled records, deterministic for a given seed.
///
/// Half-open ranges: living area [800, 3000), quality [1, 11), year
/// [1950, 2025), trend [-5, 5), tax [1000, 5000), crime [1, 10),
/// school [1, 11), distance [0.5, 30). The supplied price-per-sqft flag is
/// random noise the encoder ignores.
pub fn generate(n: usize, seed: u64) -> Result<Vec<LabeledRecord>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise_dist = Normal::new(0.0, PRICE_NOISE_STD)?;

    let records: Vec<LabeledRecord> = (0..n)
        .map(|_| {
            let living_area = rng.random_range(800..3000) as f64;
            let overall_quality = rng.random_range(1..11_i64);
            let year_built = rng.random_range(1950..2025_i64);
            let neighborhood = KNOWN_NEIGHBORHOODS[rng.random_range(0..KNOWN_NEIGHBORHOODS.len())];
            let recent_price_trend = rng.random_range(-5.0..5.0);
            let property_tax = rng.random_range(1000..5000) as f64;
            let crime_rate = rng.random_range(1.0..10.0);
            let school_rating = rng.random_range(1..11_i64);
            let price_per_sqft_flag = rng.random_range(0..2_i64);
            let distance_to_city = rng.random_range(0.5..30.0);
            let noise = noise_dist.sample(&mut rng);

            let sale_price = synthetic_price(
                living_area,
                overall_quality as f64,
                year_built as f64,
                recent_price_trend,
                noise,
            );

            LabeledRecord::new(
                RawPropertyRecord {
                    living_area: Some(living_area),
                    overall_quality: Some(overall_quality),
                    year_built: Some(year_built),
                    neighborhood: Some(neighborhood.to_string()),
                    recent_price_trend: Some(recent_price_trend),
                    property_tax: Some(property_tax),
                    crime_rate: Some(crime_rate),
                    school_rating: Some(school_rating),
                    distance_to_city: Some(distance_to_city),
                    price_per_sqft_flag: Some(price_per_sqft_flag),
                    ..Default::default()
                },
                sale_price,
            )
        })
        .collect();

    tracing::debug!("Generated {} synthetic records with seed {}", records.len(), seed);
    Ok(records)
}

/// Read a JSON-lines dataset; blank lines are skipped
pub fn read_jsonl(path: impl AsRef<Path>) -> Result<Vec<LabeledRecord>> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: LabeledRecord = serde_json::from_str(&line).map_err(|e| {
            PredictorError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("{}:{}: {}", path.display(), idx + 1, e),
            ))
        })?;
        records.push(record);
    }

    tracing::info!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Write a dataset as JSON lines
pub fn write_jsonl(path: impl AsRef<Path>, records: &[LabeledRecord]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(File::create(path)?);
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;

    tracing::info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FeatureSchema;

    #[test]
    fn test_generate_is_deterministic() {
        let a = generate(25, 42).unwrap();
        let b = generate(25, 42).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, generate(25, 43).unwrap());
    }

    #[test]
    fn test_generated_records_are_valid() {
        let schema = FeatureSchema::with_current_year(2025);
        for labeled in generate(200, 7).unwrap() {
            let record = schema.validate(&labeled.record).unwrap();
            assert!((800.0..3000.0).contains(&record.living_area));
            assert!((1950..2025).contains(&record.year_built));
            assert!(labeled.sale_price.unwrap().is_finite());
        }
    }

    #[test]
    fn test_price_noise_is_centered_with_expected_spread() {
        let residuals: Vec<f64> = generate(2000, 17)
            .unwrap()
            .iter()
            .map(|l| {
                let r = &l.record;
                let clean = synthetic_price(
                    r.living_area.unwrap(),
                    r.overall_quality.unwrap() as f64,
                    r.year_built.unwrap() as f64,
                    r.recent_price_trend.unwrap(),
                    0.0,
                );
                l.sale_price.unwrap() - clean
            })
            .collect();

        let n = residuals.len() as f64;
        let mean = residuals.iter().sum::<f64>() / n;
        let std = (residuals.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n).sqrt();
        assert!(mean.abs() < 1_000.0, "mean {}", mean);
        assert!((std - PRICE_NOISE_STD).abs() < 1_000.0, "std {}", std);
    }

    #[test]
    fn test_synthetic_price_formula() {
        // 1000*120 + 5*5000 + 25*-150 + 2*1000
        let price = synthetic_price(1000.0, 5.0, 2000.0, 2.0, 0.0);
        assert_eq!(price, 143_250.0);
    }

    #[test]
    fn test_jsonl_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("train.jsonl");
        let records = generate(10, 1).unwrap();

        write_jsonl(&path, &records).unwrap();
        let loaded = read_jsonl(&path).unwrap();
        assert_eq!(loaded, records);
    }

    #[test]
    fn test_read_jsonl_reports_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.jsonl");
        std::fs::write(&path, "{\"living_area\": 1200.0}\n\nnot json\n").unwrap();

        let err = read_jsonl(&path).unwrap_err();
        assert!(err.to_string().contains(":3:"), "{}", err);
    }
}
