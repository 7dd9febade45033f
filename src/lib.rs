pub mod batch;
pub mod cli;
pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod io_utils;
pub mod report;
pub mod resolve;
pub mod schema;
pub mod table;
pub mod trend;
pub mod validate;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use log::{LevelFilter, debug, error, info};

use crate::{
    cli::{Cli, Commands, DatasetArgs, OutputFormat},
    config::Settings,
    data::RawTable,
    engine::PriceEngine,
    validate::RawQuery,
};

pub use crate::{
    data::RawCell,
    engine::PredictionResult,
    error::{DatasetSchemaError, PredictError},
    resolve::{MIN_SAMPLES, SourceLevel},
    schema::{CanonicalDataset, ColumnSynonyms, normalize},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("crop_price_forecast", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Predict(args) => handle_predict(&args),
        Commands::Batch(args) => batch::execute(&args),
        Commands::Inspect(args) => handle_inspect(&args),
    }
}

fn read_dataset(args: &DatasetArgs) -> Result<(Settings, RawTable)> {
    let settings = Settings::load_optional(args.config.as_deref())?;
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    info!(
        "Loading '{}' with delimiter '{}'",
        args.input.display(),
        printable_delimiter(delimiter)
    );
    let table = io_utils::read_raw_table_from_path(&args.input, delimiter, encoding)?;
    Ok((settings, table))
}

/// Builds the engine for query commands.
///
/// A table whose columns cannot be mapped does not abort: the engine comes up
/// unavailable and each query reports that instead. I/O failures still
/// propagate.
pub(crate) fn load_engine(args: &DatasetArgs) -> Result<PriceEngine> {
    let (settings, raw) = read_dataset(args)?;
    match PriceEngine::from_raw(&raw, &settings.synonyms()) {
        Ok((engine, _)) => Ok(engine.with_unit(settings.unit())),
        Err(err) => {
            error!("Dataset load failed: {err}");
            Ok(PriceEngine::unavailable().with_unit(settings.unit()))
        }
    }
}

fn handle_predict(args: &cli::PredictArgs) -> Result<()> {
    let engine = load_engine(&args.dataset)?;
    let query = RawQuery::new(
        args.crop.as_str(),
        args.district.as_str(),
        args.month.as_str(),
    );
    debug!("Query: {query:?}");
    match engine.predict(&query) {
        Ok(result) => {
            match args.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
                OutputFormat::Table => print!("{}", render_prediction(&result)),
            }
            info!(
                "Predicted {} for {} {} month {} from {} {}-level row(s)",
                result.predicted_price,
                result.input.crop,
                result.input.district,
                result.input.month,
                result.sample_size,
                result.source_level
            );
            Ok(())
        }
        Err(err) => {
            if args.format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&err.to_body())?);
            }
            Err(anyhow!(err))
        }
    }
}

fn render_prediction(result: &PredictionResult) -> String {
    table::render_pairs(&[
        ("crop", result.input.crop.clone()),
        ("district", result.input.district.clone()),
        ("month", result.input.month.to_string()),
        ("target_year", result.target_year.to_string()),
        (
            "predicted_price",
            format!("{:.2} {}", result.predicted_price, result.unit),
        ),
        ("sample_size", result.sample_size.to_string()),
        ("source_level", result.source_level.to_string()),
    ])
}

fn handle_inspect(args: &cli::InspectArgs) -> Result<()> {
    let (settings, raw) = read_dataset(&args.dataset)?;
    let normalized = schema::normalize(&raw, &settings.synonyms())
        .with_context(|| format!("Normalizing {:?}", args.dataset.input))?;
    let summary = &normalized.report;

    table::print_table(&report::mapping_headers(), &report::mapping_rows(summary));
    println!();
    println!(
        "rows read: {}  kept: {}  dropped: {}",
        summary.rows_read, summary.rows_kept, summary.rows_dropped
    );
    println!();
    let coverage = report::crop_coverage(&normalized.dataset);
    table::print_table(&report::coverage_headers(), &report::coverage_rows(&coverage));

    if let Some(crop) = args.crop.as_deref() {
        let crop = data::fold_text(crop);
        let rows = report::district_counts(&normalized.dataset, &crop)
            .into_iter()
            .map(|(district, count)| vec![district, count.to_string()])
            .collect::<Vec<_>>();
        println!();
        table::print_table(&["district".to_string(), "rows".to_string()], &rows);
    }
    info!(
        "Inspected {} usable row(s) across {} crop(s)",
        normalized.dataset.len(),
        coverage.len()
    );
    Ok(())
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
