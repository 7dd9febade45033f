use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Estimate next-year crop prices from historical market data",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Predict next year's price for one crop, district and month
    Predict(PredictArgs),
    /// Run every query in a CSV file and write one result row per query
    Batch(BatchArgs),
    /// Show how the dataset was normalized and what it covers
    Inspect(InspectArgs),
}

#[derive(Debug, Clone, Args)]
pub struct DatasetArgs {
    /// Historical price table (tab separated for .tsv/.txt, comma otherwise)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Delimiter of the price table (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the price table (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// YAML settings file with extra column synonyms and the price unit
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct PredictArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,
    /// Crop or commodity name (case-insensitive)
    #[arg(long)]
    pub crop: String,
    /// District or market name (case-insensitive)
    #[arg(long)]
    pub district: String,
    /// Month number, 1-12
    #[arg(long, allow_hyphen_values = true)]
    pub month: String,
    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

#[derive(Debug, Args)]
pub struct BatchArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,
    /// CSV file with crop, district and month columns
    #[arg(short = 'q', long = "queries")]
    pub queries: PathBuf,
    /// Delimiter of the queries file (defaults by extension)
    #[arg(long = "queries-delimiter", value_parser = parse_delimiter)]
    pub queries_delimiter: Option<u8>,
    /// Output CSV file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct InspectArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,
    /// Also list row counts per district for this crop
    #[arg(long)]
    pub crop: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
#[value(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
