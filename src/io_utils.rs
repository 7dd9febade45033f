//! File-side helpers: delimiter and encoding resolution, readers and writers.
//!
//! The estimation core never touches the filesystem; everything that turns a
//! delimited file into a [`RawTable`] (or writes batch output) lives here.
//!
//! - **Delimiter resolution**: `.tsv`, `.tab` and `.txt` default to tab (price
//!   sheets are usually exported tab separated), anything else to comma.
//! - **Encoding**: input bytes are decoded via `encoding_rs`, defaulting to UTF-8.
//! - **stdin/stdout**: the `-` path convention routes through standard streams.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use encoding_rs::{Encoding, UTF_8};
use log::debug;

use crate::data::{RawCell, RawTable};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext)
            if ["tsv", "tab", "txt"]
                .iter()
                .any(|candidate| ext.eq_ignore_ascii_case(candidate)) =>
        {
            DEFAULT_TSV_DELIMITER
        }
        _ => DEFAULT_CSV_DELIMITER,
    })
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true);
    builder.from_reader(reader)
}

pub fn open_csv_reader_from_path(path: &Path, delimiter: u8) -> Result<csv::Reader<Box<dyn Read>>> {
    let reader: Box<dyn Read> = if is_dash(path) {
        Box::new(std::io::stdin().lock())
    } else {
        Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Opening input file {path:?}"))?,
        ))
    };
    Ok(open_csv_reader(reader, delimiter))
}

pub fn open_csv_writer(path: Option<&Path>, delimiter: u8) -> Result<csv::Writer<Box<dyn Write>>> {
    let writer: Box<dyn Write> = match path {
        Some(p) if !is_dash(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        )),
        _ => Box::new(std::io::stdout()),
    };
    let mut builder = csv::WriterBuilder::new();
    builder.delimiter(delimiter).double_quote(true);
    Ok(builder.from_writer(writer))
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

pub fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}

pub fn reader_headers<R>(
    reader: &mut csv::Reader<R>,
    encoding: &'static Encoding,
) -> Result<Vec<String>>
where
    R: Read,
{
    let headers = reader.byte_headers()?.clone();
    decode_record(&headers, encoding)
}

/// Reads every row of a delimited stream into a [`RawTable`].
pub fn read_raw_table<R>(
    reader: &mut csv::Reader<R>,
    encoding: &'static Encoding,
) -> Result<RawTable>
where
    R: Read,
{
    let headers = reader_headers(reader, encoding)?;
    let mut table = RawTable::new(headers);
    for (row_idx, record) in reader.byte_records().enumerate() {
        let record = record.with_context(|| format!("Reading row {}", row_idx + 2))?;
        let decoded = decode_record(&record, encoding)
            .with_context(|| format!("Decoding row {}", row_idx + 2))?;
        table.push_row(decoded.iter().map(|field| RawCell::from_field(field)).collect());
    }
    debug!(
        "Read {} row(s) across {} column(s)",
        table.row_count(),
        table.headers.len()
    );
    Ok(table)
}

pub fn read_raw_table_from_path(
    path: &Path,
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<RawTable> {
    let mut reader = open_csv_reader_from_path(path, delimiter)?;
    read_raw_table(&mut reader, encoding).with_context(|| format!("Reading {path:?}"))
}
