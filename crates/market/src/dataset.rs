use std::io::Read;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Trim};
use fieldwise_core::estimate::yields::{HistoricalRecord, HistoricalYields};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("could not open dataset `{path}`: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not read dataset header: {0}")]
    Header(#[source] csv::Error),
    #[error("dataset is missing a `{0}` column")]
    MissingColumn(&'static str),
}

const REGION_HEADERS: [&str; 2] = ["region", "State_Name"];
const CROP_HEADERS: [&str; 2] = ["crop", "Crop"];
const AREA_HEADERS: [&str; 2] = ["cultivatedArea", "Area"];
const PRODUCTION_HEADERS: [&str; 2] = ["production", "Production"];

#[derive(Debug)]
struct ColumnMap {
    region: usize,
    crop: usize,
    area: usize,
    production: usize,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Result<Self, DatasetError> {
        let find = |names: [&'static str; 2]| {
            headers
                .iter()
                .position(|header| names.iter().any(|name| header.trim() == *name))
                .ok_or(DatasetError::MissingColumn(names[0]))
        };

        Ok(Self {
            region: find(REGION_HEADERS)?,
            crop: find(CROP_HEADERS)?,
            area: find(AREA_HEADERS)?,
            production: find(PRODUCTION_HEADERS)?,
        })
    }

    fn record(&self, row: &StringRecord) -> Option<HistoricalRecord> {
        Some(HistoricalRecord::from_raw(
            row.get(self.region)?,
            row.get(self.crop)?,
            row.get(self.area)?,
            row.get(self.production)?,
        ))
    }
}

/// Parses a dataset from any reader. Rows that cannot be read or that lack one of the
/// required cells are skipped.
pub fn parse_dataset<R: Read>(reader: R) -> Result<HistoricalYields, DatasetError> {
    let mut reader = ReaderBuilder::new().flexible(true).trim(Trim::All).from_reader(reader);
    let columns = ColumnMap::from_headers(reader.headers().map_err(DatasetError::Header)?)?;

    let mut records = Vec::new();
    let mut skipped = 0_usize;
    for row in reader.records() {
        match row.ok().and_then(|row| columns.record(&row)) {
            Some(record) => records.push(record),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!(event_name = "market.dataset.rows_skipped", skipped, "skipped malformed dataset rows");
    }

    Ok(HistoricalYields::new(records))
}

pub fn read_dataset(path: &Path) -> Result<HistoricalYields, DatasetError> {
    let file = std::fs::File::open(path)
        .map_err(|source| DatasetError::Open { path: path.to_path_buf(), source })?;
    parse_dataset(file)
}

/// Loads the dataset at startup. An unreadable file yields an unavailable dataset so yield
/// lookups fall back instead of failing.
pub fn load_dataset(path: &Path) -> HistoricalYields {
    match read_dataset(path) {
        Ok(dataset) => {
            info!(
                event_name = "market.dataset.loaded",
                path = %path.display(),
                records = dataset.len(),
                "historical dataset loaded"
            );
            dataset
        }
        Err(error) => {
            warn!(
                event_name = "market.dataset.unavailable",
                path = %path.display(),
                error = %error,
                "historical dataset unavailable, yields will use reference values"
            );
            HistoricalYields::unavailable()
        }
    }
}
