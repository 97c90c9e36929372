//! Market data adapters: the live commodity quote feed and the historical crop dataset.
//!
//! Both adapters plug into the resolver chains in `fieldwise-core`. Neither one ever fails
//! a chat turn; their errors become fallback triggers.

pub mod dataset;
pub mod quotes;

pub use dataset::{load_dataset, parse_dataset, read_dataset, DatasetError};
pub use quotes::{FeedError, YahooChartFeed};
