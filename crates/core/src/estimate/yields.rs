use std::collections::BTreeMap;
use std::sync::Arc;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::SourceError;
use crate::reference::{self, normalize_key, DEFAULT_YIELD};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum YieldProvenance {
    HistoricalAverage,
    Fallback,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct YieldRate {
    pub tons_per_acre: Decimal,
    pub provenance: YieldProvenance,
    pub source: String,
}

/// One row of the historical production dataset. Keys are stored normalized; quantities
/// that failed to parse are kept as `None` and ignored when averaging.
#[derive(Clone, Debug, PartialEq)]
pub struct HistoricalRecord {
    region_key: String,
    crop_key: String,
    area: Option<f64>,
    production: Option<f64>,
}

impl HistoricalRecord {
    pub fn new(region: &str, crop: &str, area: Option<f64>, production: Option<f64>) -> Self {
        Self {
            region_key: normalize_key(region),
            crop_key: normalize_key(crop),
            area: area.filter(|value| value.is_finite() && *value >= 0.0),
            production: production.filter(|value| value.is_finite() && *value >= 0.0),
        }
    }

    /// Builds a record from raw text cells as they appear in the dataset file.
    pub fn from_raw(region: &str, crop: &str, area: &str, production: &str) -> Self {
        Self::new(region, crop, parse_quantity(area), parse_quantity(production))
    }

    fn matches(&self, crop_key: &str, region_key: &str) -> bool {
        self.crop_key == crop_key && self.region_key == region_key
    }
}

fn parse_quantity(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok()
}

/// Read-only in-memory view of the historical dataset, loaded once per process.
#[derive(Clone, Debug, Default)]
pub struct HistoricalYields {
    records: Vec<HistoricalRecord>,
    available: bool,
}

impl HistoricalYields {
    pub fn new(records: Vec<HistoricalRecord>) -> Self {
        Self { records, available: true }
    }

    /// Placeholder for a dataset that could not be read. Every lookup falls back.
    pub fn unavailable() -> Self {
        Self { records: Vec::new(), available: false }
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Area-weighted production per acre over every matching record, rounded to 2 dp.
    /// Returns `None` when the matching records cover no area.
    pub fn average_yield(&self, crop: &str, region: &str) -> Option<Decimal> {
        let crop_key = normalize_key(crop);
        let region_key = normalize_key(region);

        let (total_area, total_production) = self
            .records
            .iter()
            .filter(|record| record.matches(&crop_key, &region_key))
            .filter_map(|record| Some((record.area?, record.production?)))
            .fold((0.0_f64, 0.0_f64), |(area, production), (row_area, row_production)| {
                (area + row_area, production + row_production)
            });

        if total_area <= 0.0 {
            return None;
        }

        Decimal::from_f64(total_production / total_area).map(|rate| rate.round_dp(2))
    }
}

/// One step of the yield fallback chain. Same `Ok(None)` / `Err` contract as the price
/// sources.
pub trait YieldSource: Send + Sync {
    fn name(&self) -> &'static str;
    fn lookup(&self, crop_key: &str, region_key: &str) -> Result<Option<YieldRate>, SourceError>;
}

#[derive(Clone, Debug)]
pub struct HistoricalAverageSource {
    dataset: Arc<HistoricalYields>,
}

impl HistoricalAverageSource {
    pub fn new(dataset: Arc<HistoricalYields>) -> Self {
        Self { dataset }
    }
}

impl YieldSource for HistoricalAverageSource {
    fn name(&self) -> &'static str {
        "historical_dataset"
    }

    fn lookup(&self, crop_key: &str, region_key: &str) -> Result<Option<YieldRate>, SourceError> {
        if !self.dataset.is_available() {
            return Err(SourceError::unavailable(self.name(), "dataset was not loaded"));
        }

        Ok(self.dataset.average_yield(crop_key, region_key).map(|tons_per_acre| YieldRate {
            tons_per_acre,
            provenance: YieldProvenance::HistoricalAverage,
            source: self.name().to_string(),
        }))
    }
}

#[derive(Clone, Debug)]
pub struct ReferenceYieldTable {
    yields: BTreeMap<String, Decimal>,
}

impl Default for ReferenceYieldTable {
    fn default() -> Self {
        Self { yields: reference::reference_yields() }
    }
}

impl ReferenceYieldTable {
    pub fn new(yields: BTreeMap<String, Decimal>) -> Self {
        Self { yields }
    }
}

impl YieldSource for ReferenceYieldTable {
    fn name(&self) -> &'static str {
        "reference_table"
    }

    fn lookup(&self, crop_key: &str, _region_key: &str) -> Result<Option<YieldRate>, SourceError> {
        Ok(self.yields.get(crop_key).map(|tons_per_acre| YieldRate {
            tons_per_acre: *tons_per_acre,
            provenance: YieldProvenance::Fallback,
            source: self.name().to_string(),
        }))
    }
}

pub struct YieldResolver {
    sources: Vec<Box<dyn YieldSource>>,
    default_yield: Decimal,
}

impl Default for YieldResolver {
    fn default() -> Self {
        Self::new(vec![Box::new(ReferenceYieldTable::default())], DEFAULT_YIELD)
    }
}

impl YieldResolver {
    pub fn new(sources: Vec<Box<dyn YieldSource>>, default_yield: Decimal) -> Self {
        Self { sources, default_yield }
    }

    /// Historical average first, then the reference table, then the default yield.
    pub fn with_dataset(dataset: Arc<HistoricalYields>) -> Self {
        Self::new(
            vec![
                Box::new(HistoricalAverageSource::new(dataset)),
                Box::new(ReferenceYieldTable::default()),
            ],
            DEFAULT_YIELD,
        )
    }

    pub fn resolve(&self, crop: &str, region: &str) -> YieldRate {
        let crop_key = normalize_key(crop);
        let region_key = normalize_key(region);

        for source in &self.sources {
            match source.lookup(&crop_key, &region_key) {
                Ok(Some(rate)) => {
                    debug!(
                        event_name = "advisor.yield.resolved",
                        crop = %crop_key,
                        region = %region_key,
                        source = source.name(),
                        tons_per_acre = %rate.tons_per_acre,
                        "yield rate resolved"
                    );
                    return rate;
                }
                Ok(None) => continue,
                Err(error) => {
                    warn!(
                        event_name = "advisor.yield.fallback",
                        crop = %crop_key,
                        region = %region_key,
                        source = source.name(),
                        error = %error,
                        "yield source failed, trying next source"
                    );
                }
            }
        }

        YieldRate {
            tons_per_acre: self.default_yield,
            provenance: YieldProvenance::Fallback,
            source: "default".to_string(),
        }
    }
}
