//! Many queries through one engine.
//!
//! The queries file needs `crop`, `district` and `month` headers (matched
//! case-insensitively). A query that fails is written with its error message;
//! it never aborts the rest of the batch.

use std::io::Write;

use anyhow::{Context, Result, bail};
use log::info;

use crate::{
    cli::BatchArgs,
    data::{RawCell, RawTable},
    engine::{PredictionResult, PriceEngine},
    error::PredictResult,
    io_utils,
    schema::fold_header,
    validate::RawQuery,
};

const QUERY_COLUMNS: [&str; 3] = ["crop", "district", "month"];
const OUTPUT_HEADERS: [&str; 9] = [
    "crop",
    "district",
    "month",
    "predicted_price",
    "unit",
    "target_year",
    "sample_size",
    "source_level",
    "error",
];

#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    pub query: RawQuery,
    pub result: PredictResult<PredictionResult>,
}

pub fn execute(args: &BatchArgs) -> Result<()> {
    let engine = crate::load_engine(&args.dataset)?;
    let delimiter = io_utils::resolve_input_delimiter(&args.queries, args.queries_delimiter);
    let encoding = io_utils::resolve_encoding(args.dataset.input_encoding.as_deref())?;
    let queries = io_utils::read_raw_table_from_path(&args.queries, delimiter, encoding)?;

    let outcomes = run_queries(&engine, &queries)
        .with_context(|| format!("Reading queries from {:?}", args.queries))?;
    let mut writer = io_utils::open_csv_writer(args.output.as_deref(), b',')?;
    write_outcomes(&mut writer, &outcomes)?;
    writer.flush().context("Flushing batch output")?;

    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    info!(
        "Answered {} of {} queries ({failed} failed)",
        outcomes.len() - failed,
        outcomes.len()
    );
    Ok(())
}

pub fn run_queries(engine: &PriceEngine, queries: &RawTable) -> Result<Vec<BatchOutcome>> {
    let positions = QUERY_COLUMNS
        .iter()
        .map(|name| {
            queries
                .headers
                .iter()
                .position(|h| fold_header(h) == *name)
        })
        .collect::<Vec<_>>();
    let missing = QUERY_COLUMNS
        .iter()
        .zip(&positions)
        .filter(|(_, pos)| pos.is_none())
        .map(|(name, _)| *name)
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        bail!("Queries file is missing column(s): {}", missing.join(", "));
    }

    let cell = |row: &[RawCell], idx: usize| {
        positions[idx]
            .and_then(|pos| row.get(pos))
            .cloned()
            .unwrap_or_default()
    };
    Ok(queries
        .rows
        .iter()
        .map(|row| {
            let row = row.as_slice();
            let query = RawQuery::new(cell(row, 0), cell(row, 1), cell(row, 2));
            let result = engine.predict(&query);
            BatchOutcome { query, result }
        })
        .collect())
}

pub fn write_outcomes<W: Write>(writer: &mut csv::Writer<W>, outcomes: &[BatchOutcome]) -> Result<()> {
    writer.write_record(OUTPUT_HEADERS)?;
    for outcome in outcomes {
        let record = match &outcome.result {
            Ok(result) => vec![
                result.input.crop.clone(),
                result.input.district.clone(),
                result.input.month.to_string(),
                format!("{:.2}", result.predicted_price),
                result.unit.clone(),
                result.target_year.to_string(),
                result.sample_size.to_string(),
                result.source_level.to_string(),
                String::new(),
            ],
            Err(err) => {
                let mut record = vec![
                    outcome.query.crop.to_string(),
                    outcome.query.district.to_string(),
                    outcome.query.month.to_string(),
                ];
                record.extend(std::iter::repeat_n(String::new(), 5));
                record.push(err.to_string());
                record
            }
        };
        writer.write_record(&record)?;
    }
    Ok(())
}
