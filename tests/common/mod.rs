#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crop_price_forecast::{
    RawCell,
    data::RawTable,
    engine::PriceEngine,
    schema::ColumnSynonyms,
};
use tempfile::{TempDir, tempdir};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}

/// Tab separated price sheet in the layout of a typical mandi export.
pub const PRICE_SHEET: &str = "\u{feff}Commodity\tMarket\tState\tSeason\tMonth\tYear\tModal Price\n\
Wheat\tDelhi\tDelhi\tRabi\t3\t2019\t1800\n\
Wheat\tDelhi\tDelhi\tRabi\t3\t2020\t1900\n\
Wheat\tDelhi\tDelhi\tRabi\t3\t2021\t2000\n\
Rice\tLucknow\tUttar Pradesh\tKharif\t7\t2020\t2400\n\
Rice\tKanpur\tUttar Pradesh\tKharif\t7\t2020\t2500\n\
Rice\tKanpur\tUttar Pradesh\tKharif\t7\t2021\t2600\n\
Maize\tPatna\tBihar\tKharif\t9\t2021\t1500\n\
Maize\tPatna\tBihar\tKharif\t9\tn/a\t1500\n";

/// One price observation: crop, district, state, month, year, price.
pub type Row<'a> = (&'a str, &'a str, Option<&'a str>, i64, i64, f64);

pub fn table(rows: &[Row<'_>]) -> RawTable {
    RawTable::from_records(rows.iter().map(|(crop, district, state, month, year, price)| {
        vec![
            ("crop", RawCell::text(*crop)),
            ("district", RawCell::text(*district)),
            ("state", RawCell::from(*state)),
            ("month", RawCell::from(*month)),
            ("year", RawCell::from(*year)),
            ("modal_price", RawCell::Number(*price)),
        ]
    }))
}

pub fn engine(rows: &[Row<'_>]) -> PriceEngine {
    PriceEngine::from_raw(&table(rows), &ColumnSynonyms::default())
        .expect("valid schema")
        .0
}
