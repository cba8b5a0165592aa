//! House Price Predictor
//!
//! Train a sale price model and score properties under market scenarios.

use clap::{Args, Parser, Subcommand};
use house_price_predictor::{
    config::Config,
    data,
    ml::{PredictionResult, PredictionService, TrainingPipeline},
    scenario::Scenario,
    schema::{FeatureSchema, RawPropertyRecord},
    storage::{ArtifactSlot, ArtifactStore},
};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "house-price")]
#[command(about = "House sale price estimation with market scenarios")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a synthetic labeled dataset as JSON lines
    Generate {
        /// Output file
        #[arg(short, long, default_value = "train.jsonl")]
        out: PathBuf,
        /// Number of records (defaults to config)
        #[arg(short = 'n', long)]
        samples: Option<usize>,
        /// RNG seed (defaults to config)
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Train a model and save the artifact
    Train {
        /// JSON-lines training file; synthetic data is used when absent
        #[arg(short, long)]
        data: Option<PathBuf>,
    },
    /// Estimate the sale price of one property
    Predict {
        #[command(flatten)]
        property: PropertyArgs,
        /// Scenario to score; all three when omitted
        #[arg(short, long)]
        scenario: Option<Scenario>,
        /// Clamp quality, rating and year to their bounds before validation
        #[arg(long)]
        clamp: bool,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the saved artifact's metadata and encoded features
    Inspect,
}

#[derive(Args)]
struct PropertyArgs {
    /// Read the property from a JSON file instead of flags
    #[arg(long, conflicts_with_all = [
        "living_area",
        "overall_quality",
        "year_built",
        "neighborhood",
        "recent_price_trend",
        "property_tax",
        "crime_rate",
        "school_rating",
        "distance_to_city",
    ])]
    input: Option<PathBuf>,
    /// Above-grade living area (sq ft)
    #[arg(long)]
    living_area: Option<f64>,
    /// Overall quality, 1-10
    #[arg(long)]
    overall_quality: Option<i64>,
    #[arg(long)]
    year_built: Option<i64>,
    #[arg(long)]
    neighborhood: Option<String>,
    /// Recent price trend in percent, -5 to 5
    #[arg(long, allow_negative_numbers = true)]
    recent_price_trend: Option<f64>,
    #[arg(long)]
    property_tax: Option<f64>,
    /// Crime rate, 1-10
    #[arg(long)]
    crime_rate: Option<f64>,
    /// School rating, 1-10
    #[arg(long)]
    school_rating: Option<i64>,
    /// Distance to the city center (miles)
    #[arg(long)]
    distance_to_city: Option<f64>,
}

impl PropertyArgs {
    fn into_raw(self) -> anyhow::Result<RawPropertyRecord> {
        if let Some(path) = self.input {
            let text = std::fs::read_to_string(&path)?;
            return Ok(serde_json::from_str(&text)?);
        }
        Ok(RawPropertyRecord {
            living_area: self.living_area,
            overall_quality: self.overall_quality,
            year_built: self.year_built,
            neighborhood: self.neighborhood,
            recent_price_trend: self.recent_price_trend,
            property_tax: self.property_tax,
            crime_rate: self.crime_rate,
            school_rating: self.school_rating,
            distance_to_city: self.distance_to_city,
            ..Default::default()
        })
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Generate { out, samples, seed } => generate(config, out, samples, seed),
        Commands::Train { data } => train(config, data),
        Commands::Predict {
            property,
            scenario,
            clamp,
            json,
        } => predict(config, property, scenario, clamp, json),
        Commands::Inspect => inspect(config),
    }
}

fn generate(config: Config, out: PathBuf, samples: Option<usize>, seed: Option<u64>) -> anyhow::Result<()> {
    let samples = samples.unwrap_or(config.data.samples);
    let seed = seed.unwrap_or(config.data.seed);

    let records = data::generate(samples, seed)?;
    data::write_jsonl(&out, &records)?;

    println!("Wrote {} records to {}", records.len(), out.display());
    Ok(())
}

fn train(config: Config, data_path: Option<PathBuf>) -> anyhow::Result<()> {
    let dataset = match data_path.or_else(|| config.data.resolved_train_file()) {
        Some(path) => data::read_jsonl(&path)?,
        None => {
            tracing::info!(
                "No training file given, generating {} synthetic records (seed {})",
                config.data.samples,
                config.data.seed
            );
            data::generate(config.data.samples, config.data.seed)?
        }
    };

    let schema = FeatureSchema::new();
    let pipeline = TrainingPipeline::random_forest(schema, config.training.forest_params());
    let store = ArtifactStore::new(config.artifact.resolved_path());

    let slot = ArtifactSlot::new();
    let artifact = slot.retrain(&pipeline, &dataset, Some(&store))?;

    println!("\nTrained artifact {}\n", artifact.id());
    println!("Estimator: {}", artifact.metadata().estimator);
    println!("Rows: {}", artifact.metadata().n_samples);
    println!("Features: {}", artifact.rule().width());
    println!("Saved to: {}", store.path().display());
    Ok(())
}

fn predict(
    config: Config,
    property: PropertyArgs,
    scenario: Option<Scenario>,
    clamp: bool,
    json: bool,
) -> anyhow::Result<()> {
    let schema = FeatureSchema::new();
    let store = ArtifactStore::new(config.artifact.resolved_path());
    let slot: ArtifactSlot = ArtifactSlot::new();
    if let Err(e) = slot.reload(&store) {
        anyhow::bail!("{} (run `house-price train` first)", e);
    }

    let adjuster = config.scenario.adjuster(&schema)?;
    let service: PredictionService = slot.service(schema.clone()).with_adjuster(adjuster);

    let mut raw = property.into_raw()?;
    if clamp {
        raw = schema.clamp_integers(&raw);
    }

    let results: Vec<PredictionResult> = match scenario {
        Some(scenario) => vec![service.predict(&raw, scenario)?],
        None => {
            let estimates = service.predict_scenarios(&raw)?;
            vec![estimates.baseline, estimates.optimistic, estimates.pessimistic]
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    println!("\n🏠 Estimated Sale Price\n");
    for result in &results {
        println!(
            "{:<12} ${:>14}   (trend {:+.1}%)",
            result.scenario.to_string(),
            result.point_estimate.to_string(),
            result.input_echo.recent_price_trend
        );
    }
    for warning in results.iter().flat_map(|r| &r.warnings).take(1) {
        println!("\nNote: {}", warning);
    }
    Ok(())
}

fn inspect(config: Config) -> anyhow::Result<()> {
    let store = ArtifactStore::new(config.artifact.resolved_path());
    let slot: ArtifactSlot = ArtifactSlot::new();
    let artifact = slot.reload(&store)?;
    let meta = artifact.metadata();

    println!("\n📦 Artifact {}\n", meta.id);
    println!("Path: {}", store.path().display());
    println!("Format version: {}", meta.format_version);
    println!("Trained at: {}", meta.trained_at);
    println!("Estimator: {} ({} trees)", meta.estimator, artifact.model().trees().len());
    println!("Rows: {}", meta.n_samples);
    println!("Neighborhoods: {}", artifact.rule().vocabulary().join(", "));

    println!("\nFeatures ({}):", artifact.rule().width());
    for (i, name) in artifact.feature_names().iter().enumerate() {
        println!("  {:>2}  {}", i, name);
    }
    Ok(())
}
