//! Static reference data used when live or historical sources cannot supply a value.
//!
//! Prices are in the feed's base currency per ton; yields are tons per acre.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

/// Futures tickers for crops with a live market.
const TICKERS: [(&str, &str); 5] =
    [("corn", "ZC=F"), ("wheat", "ZW=F"), ("soybean", "ZS=F"), ("cotton", "CT=F"), ("rice", "ZR=F")];

/// `(crop, mantissa, scale)`
const REFERENCE_PRICES: [(&str, i64, u32); 6] = [
    ("sugarcane", 40, 0),
    ("tomato", 350, 0),
    ("apple", 800, 0),
    ("potato", 250, 0),
    ("mango", 600, 0),
    ("mangoes", 600, 0),
];

/// `(crop, mantissa, scale)`
const REFERENCE_YIELDS: [(&str, i64, u32); 10] = [
    ("sugarcane", 35, 0),
    ("tomato", 15, 0),
    ("cotton", 12, 1),
    ("rice", 25, 1),
    ("wheat", 22, 1),
    ("corn", 3, 0),
    ("apple", 8, 0),
    ("potato", 10, 0),
    ("mango", 45, 1),
    ("mangoes", 45, 1),
];

pub const DEFAULT_PRICE: Decimal = Decimal::from_parts(25_000, 0, 0, false, 2);
pub const DEFAULT_YIELD: Decimal = Decimal::from_parts(20, 0, 0, false, 1);
pub const DEFAULT_EXCHANGE_RATE: Decimal = Decimal::from_parts(830, 0, 0, false, 1);

/// Lookup key for crop and region names: trimmed and lowercased.
pub fn normalize_key(value: &str) -> String {
    value.trim().to_lowercase()
}

pub fn tickers() -> BTreeMap<String, String> {
    TICKERS.iter().map(|(crop, ticker)| (crop.to_string(), ticker.to_string())).collect()
}

pub fn reference_prices() -> BTreeMap<String, Decimal> {
    decimal_table(&REFERENCE_PRICES)
}

pub fn reference_yields() -> BTreeMap<String, Decimal> {
    decimal_table(&REFERENCE_YIELDS)
}

fn decimal_table(rows: &[(&str, i64, u32)]) -> BTreeMap<String, Decimal> {
    rows.iter()
        .map(|(crop, mantissa, scale)| (crop.to_string(), Decimal::new(*mantissa, *scale)))
        .collect()
}
