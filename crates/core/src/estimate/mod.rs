pub mod price;
pub mod yields;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::profile::Profile;
use crate::format::{format_currency, format_tons, title_case, PLACEHOLDER};
use crate::gate::{GateDecision, SuppressReason};
use crate::reference::DEFAULT_EXCHANGE_RATE;

use self::{
    price::{MarketPrice, PriceResolver},
    yields::{YieldProvenance, YieldRate, YieldResolver},
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimationResult {
    pub total_yield: Decimal,
    pub local_price: Decimal,
    pub total_profit_local: Decimal,
    pub price_used: MarketPrice,
    pub yield_rate_used: YieldRate,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Estimation {
    Computed(EstimationResult),
    /// The crop was judged unsuitable; figures are reported as zero.
    Suppressed,
    /// Inputs were missing; no figures exist.
    Placeholder,
}

/// The engine's output for one turn: the estimate, its display strings, and the text to
/// append to the agronomist's reply, if any.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimateReport {
    pub estimation: Estimation,
    pub estimated_profit: String,
    pub total_yield: String,
    pub annotation: Option<String>,
}

impl EstimateReport {
    fn placeholder() -> Self {
        Self {
            estimation: Estimation::Placeholder,
            estimated_profit: PLACEHOLDER.to_string(),
            total_yield: PLACEHOLDER.to_string(),
            annotation: None,
        }
    }

    pub fn annotate(&self, reply: &str) -> String {
        match &self.annotation {
            Some(annotation) => format!("{reply}<br><br>{annotation}"),
            None => reply.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EstimationSettings {
    pub exchange_rate: Decimal,
    pub currency_symbol: String,
}

impl Default for EstimationSettings {
    fn default() -> Self {
        Self { exchange_rate: DEFAULT_EXCHANGE_RATE, currency_symbol: "₹".to_string() }
    }
}

pub struct EstimationEngine {
    prices: PriceResolver,
    yields: YieldResolver,
    settings: EstimationSettings,
}

impl Default for EstimationEngine {
    fn default() -> Self {
        Self::new(PriceResolver::default(), YieldResolver::default(), EstimationSettings::default())
    }
}

impl EstimationEngine {
    pub fn new(prices: PriceResolver, yields: YieldResolver, settings: EstimationSettings) -> Self {
        Self { prices, yields, settings }
    }

    pub fn settings(&self) -> &EstimationSettings {
        &self.settings
    }

    pub async fn estimate(&self, profile: &Profile, decision: &GateDecision) -> EstimateReport {
        match decision {
            GateDecision::Suppress(SuppressReason::Incomplete) => EstimateReport::placeholder(),
            GateDecision::Suppress(SuppressReason::Unsuitable) => self.unsuitable(profile),
            GateDecision::Proceed if !profile.has_area() => EstimateReport::placeholder(),
            GateDecision::Proceed => self.compute(profile).await,
        }
    }

    fn unsuitable(&self, profile: &Profile) -> EstimateReport {
        EstimateReport {
            estimation: Estimation::Suppressed,
            estimated_profit: format_currency(&self.settings.currency_symbol, Decimal::ZERO),
            total_yield: "0 Tons".to_string(),
            annotation: Some(format!(
                "<span class='advisor-warning'>WARNING: Prediction halted. {} is not climatically \
                 suited for commercial farming in {}.</span>",
                title_case(profile.crop.trim()),
                profile.region.trim()
            )),
        }
    }

    async fn compute(&self, profile: &Profile) -> EstimateReport {
        let rate = self.yields.resolve(&profile.crop, &profile.region);
        let price = self.prices.resolve(&profile.crop).await;

        let Some(result) = self.combine(profile.cultivated_area, price, rate) else {
            warn!(
                event_name = "advisor.estimate.overflow",
                crop = %profile.crop,
                region = %profile.region,
                "estimate exceeded numeric range, reporting placeholder"
            );
            return EstimateReport::placeholder();
        };

        let symbol = &self.settings.currency_symbol;
        let price_label = if result.price_used.is_live() {
            "Live Market Data"
        } else {
            "Reference Price (fallback)"
        };
        let yield_label = match result.yield_rate_used.provenance {
            YieldProvenance::HistoricalAverage => "Regional average yield",
            YieldProvenance::Fallback => "Reference yield (fallback)",
        };
        let annotation = format!(
            "<span class='advisor-market'>{price_label}: Trading at {}/ton. {yield_label} is {} \
             tons/acre.</span>",
            format_currency(symbol, result.local_price),
            result.yield_rate_used.tons_per_acre.normalize()
        );

        EstimateReport {
            estimated_profit: format_currency(symbol, result.total_profit_local),
            total_yield: format_tons(result.total_yield),
            annotation: Some(annotation),
            estimation: Estimation::Computed(result),
        }
    }

    fn combine(
        &self,
        area: Decimal,
        price: MarketPrice,
        rate: YieldRate,
    ) -> Option<EstimationResult> {
        let total_yield = area.checked_mul(rate.tons_per_acre)?;
        let local_price = price.amount.checked_mul(self.settings.exchange_rate)?;
        let total_profit_local = total_yield.checked_mul(local_price)?;

        Some(EstimationResult {
            total_yield: total_yield.max(Decimal::ZERO),
            local_price: local_price.max(Decimal::ZERO),
            total_profit_local: total_profit_local.max(Decimal::ZERO),
            price_used: price,
            yield_rate_used: rate,
        })
    }
}
