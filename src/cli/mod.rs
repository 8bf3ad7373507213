//! Salary estimator CLI module
//!
//! Command-line interface for training bundles, predicting and validating requests.

use clap::{Parser, Subcommand};
use colored::*;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::explainability::top_k;
use crate::inference::{PredictionResult, Predictor, ValidationRules};
use crate::market::MarketReference;
use crate::preprocessing::{clean_dataset, records_from_frame, DataQualityReport, Record, DEFAULT_LABEL};
use crate::training::{Metric, ModelBank, ModelBundle, TrainingConfig};
use crate::utils::{DataLoader, DataSaver};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn kv(key: &str, val: &str) {
    println!("  {:<18} {}", muted(key), val.white());
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn money(v: f64) -> String {
    let whole = v.round() as i64;
    let digits = whole.abs().to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if whole < 0 {
        format!("-${}", out)
    } else {
        format!("${}", out)
    }
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "salary-estimator")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Salary estimation from job and candidate attributes")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train the model bank and save the bundle
    Train {
        /// Input data file (CSV, TSV, JSON lines, or Parquet)
        #[arg(short, long)]
        data: PathBuf,

        /// Label column name
        #[arg(short, long, default_value = DEFAULT_LABEL)]
        target: String,

        /// Models to train (repeatable); all three when omitted
        #[arg(short, long)]
        model: Vec<String>,

        /// Held-out fraction
        #[arg(long, default_value = "0.2")]
        test_fraction: f64,

        /// Random seed for the split and the ensembles
        #[arg(long, default_value = "42")]
        seed: u64,

        /// JSON training configuration; command-line flags override it
        #[arg(long)]
        config: Option<PathBuf>,

        /// Drop duplicates, fill gaps and remove label outliers first
        #[arg(long)]
        clean: bool,

        /// Output bundle file
        #[arg(short, long, default_value = "salary_bundle.json")]
        output: PathBuf,
    },

    /// Estimate salaries with a trained bundle
    Predict {
        /// Trained bundle file
        #[arg(short, long)]
        bundle: PathBuf,

        /// One record as a JSON object
        #[arg(short, long, conflicts_with = "data")]
        record: Option<String>,

        /// Records file for batch prediction
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Model to use instead of the default priority
        #[arg(short, long)]
        model: Option<String>,

        /// Historical dataset for market comparison
        #[arg(long)]
        history: Option<PathBuf>,

        /// Output file for batch predictions
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check a record against the input rules
    Validate {
        /// Record as a JSON object
        #[arg(short, long)]
        record: String,
    },

    /// Show a data quality report
    Info {
        /// Input data file
        #[arg(short, long)]
        data: PathBuf,

        /// Label column name
        #[arg(short, long, default_value = DEFAULT_LABEL)]
        target: String,
    },
}

// ─── Commands ──────────────────────────────────────────────────────────────────

#[allow(clippy::too_many_arguments)]
pub fn cmd_train(
    data_path: &Path,
    target: &str,
    models: &[String],
    test_fraction: f64,
    seed: u64,
    config_path: Option<&Path>,
    clean: bool,
    output: &Path,
) -> anyhow::Result<()> {
    section("Train");

    step_run("Loading data");
    let start = Instant::now();
    let mut df = DataLoader::new().load(data_path)?;
    step_done(&format!("{} rows × {} cols in {:.2?}", df.height(), df.width(), start.elapsed()));

    if clean {
        step_run("Cleaning");
        let before = df.height();
        df = clean_dataset(&df, target)?;
        step_done(&format!("{} rows removed", before - df.height()));
    }

    let mut config = match config_path {
        Some(path) => TrainingConfig::from_json_file(path)?,
        None => TrainingConfig::new(),
    };
    config.encoder.label_column = target.to_string();
    config = config.with_test_fraction(test_fraction).with_seed(seed);
    if !models.is_empty() {
        config = config.with_models(models.iter().cloned());
    }

    step_run("Training");
    let start = Instant::now();
    let outcome = ModelBank::new(config).train(&df)?;
    step_done(&format!("{:.2?}", start.elapsed()));

    println!();
    println!(
        "  {:<20} {:>10} {:>10} {:>8} {:>8} {:>8}",
        muted("Model"), muted("MAE"), muted("RMSE"), muted("R²"), muted("CV R²"), muted("Gap")
    );
    println!("  {}", dim(&"─".repeat(68)));
    for model in outcome.bundle.models() {
        let m = model.metrics();
        println!(
            "  {:<20} {:>10.0} {:>10.0} {:>8.4} {:>8.4} {:>8.4}",
            model.name(), m.mae, m.rmse, m.r2, m.cv_r2_mean, m.overfitting_gap
        );
    }
    println!("  {}", dim(&"─".repeat(68)));

    for name in &outcome.skipped {
        println!("  {} unknown model '{}' skipped", "!".yellow(), name);
    }
    for failure in &outcome.failures {
        println!("  {} {}", "✗".red(), failure.error);
    }

    if let Some(best) = outcome.bundle.best_model(Metric::R2) {
        println!();
        println!("  {} {} {} {:.4}", ok("best"), best.name().white().bold(), muted("R²:"), best.metrics().r2);
    }

    if outcome.bundle.is_empty() {
        anyhow::bail!("no model trained successfully");
    }

    step_run(&format!("Saving → {}", output.display()));
    outcome.bundle.save(output)?;
    step_done(&format!("{} models", outcome.bundle.len()));
    println!();
    Ok(())
}

fn print_result(result: &PredictionResult, predictor: &Predictor, record: &Record) {
    section("Prediction");
    kv("Estimate", &money(result.estimate).bold().to_string());
    kv("Model", result.model_used.as_deref().unwrap_or("none"));
    if let Some(ci) = &result.interval {
        kv("95% band", &format!("{} – {}", money(ci.lower), money(ci.upper)));
    }
    if result.degraded {
        println!("  {}", "estimate degraded to sentinel".red());
    }
    for diagnostic in &result.diagnostics {
        println!("  {} {}", "!".yellow(), diagnostic);
    }

    if let Some(market) = &result.market {
        section("Market comparison");
        kv("Market average", &money(market.market_mean));
        kv("Market median", &money(market.market_median));
        kv("Versus market", &format!("{:+.1}%", market.relative_to_market_pct));
        kv("Percentile", &format!("{:.0}th", market.percentile_rank));
        match &market.benchmark {
            Some(b) => {
                kv("Similar profiles", &b.sample_size.to_string());
                kv("Similar median", &money(b.median));
                kv("Similar range", &format!("{} – {}", money(b.p25), money(b.p75)));
            }
            None => kv("Similar profiles", "none"),
        }
    }

    if let Some(impacts) = predictor.explain(record, result.model_used.as_deref()) {
        section("Top features");
        for impact in top_k(&impacts, 5) {
            println!("  {}", impact);
        }
    }
    println!();
}

pub fn cmd_predict(
    bundle_path: &Path,
    record: Option<&str>,
    data_path: Option<&Path>,
    model: Option<&str>,
    history: Option<&Path>,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    step_run("Loading bundle");
    let bundle = Arc::new(ModelBundle::load(bundle_path)?);
    step_done(&bundle.model_names().join(", "));

    let mut predictor = Predictor::new(bundle);
    if let Some(path) = history {
        let df = DataLoader::new().load(path)?;
        let label = predictor.bundle().encoding().label_column().to_string();
        predictor = predictor.with_market_reference(MarketReference::from_dataset(&df, &label)?);
    }

    match (record, data_path) {
        (Some(json), _) => {
            let record = Record::from_json(json)?;
            let result = predictor.predict_detailed(&record, model);
            print_result(&result, &predictor, &record);
        }
        (None, Some(path)) => {
            let mut df = DataLoader::new().load(path)?;
            let records = records_from_frame(&df)?;

            step_run("Predicting");
            let start = Instant::now();
            let estimates = predictor.predict_batch(&records, model);
            step_done(&format!("{} rows in {:.2?}", estimates.len(), start.elapsed()));

            df.with_column(Series::new("predicted_salary".into(), estimates))?;
            match output {
                Some(out) => {
                    DataSaver::save(&mut df, out)?;
                    println!("  {} {}", ok("✓"), out.display());
                }
                None => println!("{}", df),
            }
        }
        (None, None) => anyhow::bail!("either --record or --data is required"),
    }
    Ok(())
}

pub fn cmd_validate(record: &str) -> anyhow::Result<()> {
    let record = Record::from_json(record)?;
    let issues = ValidationRules::default().check(&record);

    section("Validate");
    if issues.is_empty() {
        println!("  {} record is valid", ok("✓"));
    }
    for issue in &issues {
        println!("  {} {}", "✗".red(), issue);
    }
    println!();
    Ok(())
}

pub fn cmd_info(data_path: &Path, target: &str) -> anyhow::Result<()> {
    section("Data Info");

    let df = DataLoader::new().load(data_path)?;
    let report = DataQualityReport::from_dataset(&df, target)?;

    kv("File", &data_path.display().to_string());
    kv("Rows", &report.total_records.to_string());
    kv("Columns", &df.width().to_string());
    kv("Missing cells", &report.missing_values.to_string());
    kv("Duplicate rows", &report.duplicate_records.to_string());

    if let Some(stats) = &report.label_statistics {
        section(&format!("Label '{}'", target));
        kv("Mean", &money(stats.mean));
        kv("Median", &money(stats.median));
        kv("Std", &money(stats.std));
        kv("Range", &format!("{} – {}", money(stats.min), money(stats.max)));
        kv("Above p95", &stats.outliers.to_string());
    }

    section("Columns");
    println!("  {:<20} {:<12} {:>6}", muted("Column"), muted("Type"), muted("Nulls"));
    for col in df.get_columns() {
        println!(
            "  {:<20} {:<12} {:>6}",
            col.name(),
            format!("{:?}", col.dtype()).truecolor(140, 140, 140),
            report.missing_per_column.get(col.name().as_str()).copied().unwrap_or(0)
        );
    }
    println!();
    Ok(())
}
