use std::time::Duration;

use async_trait::async_trait;
use fieldwise_core::config::MarketConfig;
use fieldwise_core::errors::SourceError;
use fieldwise_core::estimate::price::QuoteFeed;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

const FEED_NAME: &str = "yahoo_chart";
const USER_AGENT: &str = concat!("fieldwise/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request for `{ticker}` failed: {source}")]
    Transport {
        ticker: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("feed returned status {status} for `{ticker}`")]
    Status { ticker: String, status: StatusCode },
    #[error("could not decode chart for `{ticker}`: {source}")]
    Decode {
        ticker: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("chart for `{ticker}` has no result series")]
    MissingSeries { ticker: String },
}

impl From<FeedError> for SourceError {
    fn from(error: FeedError) -> Self {
        match error {
            FeedError::MissingSeries { ticker } => SourceError::empty(FEED_NAME, ticker),
            FeedError::Decode { .. } => SourceError::malformed(FEED_NAME, error.to_string()),
            other => SourceError::unavailable(FEED_NAME, other.to_string()),
        }
    }
}

/// Daily closes from the Yahoo Finance chart endpoint.
#[derive(Clone, Debug)]
pub struct YahooChartFeed {
    client: Client,
    base_url: String,
    lookback: String,
}

impl YahooChartFeed {
    pub fn new(
        base_url: impl Into<String>,
        lookback: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(FeedError::Client)?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url, lookback: lookback.into() })
    }

    pub fn from_config(config: &MarketConfig) -> Result<Self, FeedError> {
        Self::new(
            config.quote_base_url.clone(),
            config.lookback.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub async fn fetch_closes(&self, ticker: &str) -> Result<Vec<f64>, FeedError> {
        let url = format!("{}/v8/finance/chart/{ticker}", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("range", self.lookback.as_str()), ("interval", "1d")])
            .send()
            .await
            .map_err(|source| FeedError::Transport { ticker: ticker.to_string(), source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status { ticker: ticker.to_string(), status });
        }

        let body: ChartEnvelope = response
            .json()
            .await
            .map_err(|source| FeedError::Decode { ticker: ticker.to_string(), source })?;

        let closes = body
            .chart
            .result
            .and_then(|results| results.into_iter().next())
            .and_then(|result| result.indicators.quote.into_iter().next())
            .map(|quote| quote.close)
            .ok_or_else(|| FeedError::MissingSeries { ticker: ticker.to_string() })?;

        // Yahoo reports gaps as null.
        let closes: Vec<f64> =
            closes.into_iter().map(|close| close.unwrap_or(f64::NAN)).collect();
        debug!(
            event_name = "market.quotes.fetched",
            ticker,
            points = closes.len(),
            "fetched recent closes"
        );
        Ok(closes)
    }
}

#[async_trait]
impl QuoteFeed for YahooChartFeed {
    fn name(&self) -> &'static str {
        FEED_NAME
    }

    async fn recent_closes(&self, ticker: &str) -> Result<Vec<f64>, SourceError> {
        self.fetch_closes(ticker).await.map_err(SourceError::from)
    }
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteSeries>,
}

#[derive(Debug, Deserialize)]
struct QuoteSeries {
    #[serde(default)]
    close: Vec<Option<f64>>,
}
