use std::collections::BTreeMap;

use async_trait::async_trait;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::SourceError;
use crate::reference::{self, normalize_key, DEFAULT_PRICE};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceProvenance {
    Live,
    Fallback,
}

/// Price of one ton of a crop in the feed's base currency, before conversion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketPrice {
    pub amount: Decimal,
    pub provenance: PriceProvenance,
    pub source: String,
    pub ticker: Option<String>,
}

impl MarketPrice {
    pub fn is_live(&self) -> bool {
        self.provenance == PriceProvenance::Live
    }
}

/// One step of the price fallback chain.
///
/// `Ok(None)` means the source has nothing for this crop; `Err` means it failed. Both move
/// the resolver on to the next source.
#[async_trait]
pub trait PriceSource: Send + Sync {
    fn name(&self) -> &'static str;
    async fn lookup(&self, crop_key: &str) -> Result<Option<MarketPrice>, SourceError>;
}

/// Recent daily closing prices for a ticker, oldest first. Gaps may be `NaN`.
#[async_trait]
pub trait QuoteFeed: Send + Sync {
    fn name(&self) -> &'static str;
    async fn recent_closes(&self, ticker: &str) -> Result<Vec<f64>, SourceError>;
}

pub struct LiveTickerSource<F> {
    feed: F,
    tickers: BTreeMap<String, String>,
}

impl<F> LiveTickerSource<F> {
    pub fn new(feed: F) -> Self {
        Self::with_tickers(feed, reference::tickers())
    }

    pub fn with_tickers(feed: F, tickers: BTreeMap<String, String>) -> Self {
        Self { feed, tickers }
    }
}

#[async_trait]
impl<F> PriceSource for LiveTickerSource<F>
where
    F: QuoteFeed,
{
    fn name(&self) -> &'static str {
        self.feed.name()
    }

    async fn lookup(&self, crop_key: &str) -> Result<Option<MarketPrice>, SourceError> {
        let Some(ticker) = self.tickers.get(crop_key) else {
            return Ok(None);
        };

        let closes = self.feed.recent_closes(ticker).await?;
        let latest = closes
            .iter()
            .rev()
            .copied()
            .find(|close| close.is_finite() && *close > 0.0)
            .ok_or_else(|| SourceError::empty(self.feed.name(), ticker.as_str()))?;
        let amount = Decimal::from_f64(latest)
            .ok_or_else(|| {
                SourceError::malformed(self.feed.name(), format!("close {latest} out of range"))
            })?
            .round_dp(2);

        Ok(Some(MarketPrice {
            amount,
            provenance: PriceProvenance::Live,
            source: self.feed.name().to_string(),
            ticker: Some(ticker.clone()),
        }))
    }
}

#[derive(Clone, Debug)]
pub struct ReferencePriceTable {
    prices: BTreeMap<String, Decimal>,
}

impl Default for ReferencePriceTable {
    fn default() -> Self {
        Self { prices: reference::reference_prices() }
    }
}

impl ReferencePriceTable {
    pub fn new(prices: BTreeMap<String, Decimal>) -> Self {
        Self { prices }
    }
}

#[async_trait]
impl PriceSource for ReferencePriceTable {
    fn name(&self) -> &'static str {
        "reference_table"
    }

    async fn lookup(&self, crop_key: &str) -> Result<Option<MarketPrice>, SourceError> {
        Ok(self.prices.get(crop_key).map(|amount| MarketPrice {
            amount: *amount,
            provenance: PriceProvenance::Fallback,
            source: self.name().to_string(),
            ticker: None,
        }))
    }
}

/// Resolves a price for any crop name by trying each source in order, ending at a fixed
/// default. Never fails.
pub struct PriceResolver {
    sources: Vec<Box<dyn PriceSource>>,
    default_price: Decimal,
}

impl Default for PriceResolver {
    fn default() -> Self {
        Self::new(vec![Box::new(ReferencePriceTable::default())], DEFAULT_PRICE)
    }
}

impl PriceResolver {
    pub fn new(sources: Vec<Box<dyn PriceSource>>, default_price: Decimal) -> Self {
        Self { sources, default_price }
    }

    /// Live feed first, then the reference table, then the default price.
    pub fn with_live_feed<F>(feed: F) -> Self
    where
        F: QuoteFeed + 'static,
    {
        Self::new(
            vec![
                Box::new(LiveTickerSource::new(feed)),
                Box::new(ReferencePriceTable::default()),
            ],
            DEFAULT_PRICE,
        )
    }

    pub async fn resolve(&self, crop: &str) -> MarketPrice {
        let crop_key = normalize_key(crop);

        for source in &self.sources {
            match source.lookup(&crop_key).await {
                Ok(Some(price)) => {
                    debug!(
                        event_name = "advisor.price.resolved",
                        crop = %crop_key,
                        source = source.name(),
                        amount = %price.amount,
                        "price resolved"
                    );
                    return price;
                }
                Ok(None) => continue,
                Err(error) => {
                    warn!(
                        event_name = "advisor.price.fallback",
                        crop = %crop_key,
                        source = source.name(),
                        error = %error,
                        "price source failed, trying next source"
                    );
                }
            }
        }

        MarketPrice {
            amount: self.default_price,
            provenance: PriceProvenance::Fallback,
            source: "default".to_string(),
            ticker: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use rust_decimal::Decimal;

    use super::{PriceProvenance, PriceResolver, QuoteFeed};
    use crate::errors::SourceError;

    struct FixedFeed {
        closes: Vec<f64>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl QuoteFeed for FixedFeed {
        fn name(&self) -> &'static str {
            "fixed_feed"
        }

        async fn recent_closes(&self, _ticker: &str) -> Result<Vec<f64>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.closes.clone())
        }
    }

    struct FailingFeed;

    #[async_trait]
    impl QuoteFeed for FailingFeed {
        fn name(&self) -> &'static str {
            "failing_feed"
        }

        async fn recent_closes(&self, _ticker: &str) -> Result<Vec<f64>, SourceError> {
            Err(SourceError::unavailable("failing_feed", "network unreachable"))
        }
    }

    fn fixed(closes: Vec<f64>) -> (PriceResolver, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let resolver = PriceResolver::with_live_feed(FixedFeed { closes, calls: calls.clone() });
        (resolver, calls)
    }

    #[tokio::test]
    async fn tradable_crop_uses_latest_live_close() {
        let (resolver, calls) = fixed(vec![410.0, 415.257, 420.123]);

        let price = resolver.resolve(" Rice ").await;

        assert_eq!(price.amount, Decimal::new(42_012, 2));
        assert_eq!(price.provenance, PriceProvenance::Live);
        assert_eq!(price.ticker.as_deref(), Some("ZR=F"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn trailing_gaps_in_closes_are_skipped() {
        let (resolver, _) = fixed(vec![301.5, f64::NAN]);

        let price = resolver.resolve("corn").await;

        assert_eq!(price.amount, Decimal::new(3015, 1));
        assert!(price.is_live());
    }

    #[tokio::test]
    async fn crop_without_ticker_never_queries_feed() {
        let (resolver, calls) = fixed(vec![999.0]);

        let price = resolver.resolve("Tomato").await;

        assert_eq!(price.amount, Decimal::new(350, 0));
        assert_eq!(price.provenance, PriceProvenance::Fallback);
        assert_eq!(price.source, "reference_table");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_live_lookup_falls_back_to_default_price() {
        let resolver = PriceResolver::with_live_feed(FailingFeed);

        let price = resolver.resolve("rice").await;

        assert_eq!(price.amount, Decimal::new(250, 0));
        assert_eq!(price.provenance, PriceProvenance::Fallback);
        assert_eq!(price.source, "default");
    }

    #[tokio::test]
    async fn empty_live_dataset_falls_back() {
        let (resolver, _) = fixed(Vec::new());

        let price = resolver.resolve("wheat").await;

        assert_eq!(price.provenance, PriceProvenance::Fallback);
        assert_eq!(price.amount, Decimal::new(250, 0));
    }

    #[tokio::test]
    async fn resolver_is_total_over_arbitrary_names() {
        let resolver = PriceResolver::default();

        for crop in ["", "   ", "dragon fruit", "🌾", "RICE"] {
            let price = resolver.resolve(crop).await;
            assert!(price.amount > Decimal::ZERO, "crop {crop:?} should resolve a price");
            assert_eq!(price.provenance, PriceProvenance::Fallback);
        }
    }
}
