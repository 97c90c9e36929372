use clap::Args;
use fieldwise_core::config::{AppConfig, LoadOptions};
use fieldwise_core::domain::profile::{parse_area, Profile};
use fieldwise_core::domain::verdict::SuitabilityVerdict;
use fieldwise_core::estimate::price::PriceResolver;
use fieldwise_core::estimate::yields::YieldResolver;
use fieldwise_core::estimate::EstimationEngine;
use fieldwise_core::gate::SuitabilityGate;
use fieldwise_market::{load_dataset, YahooChartFeed};
use serde_json::json;
use std::sync::Arc;

use super::CommandResult;

#[derive(Debug, Clone, Args)]
pub struct EstimateArgs {
    #[arg(long, help = "Crop name, e.g. rice")]
    pub crop: String,
    #[arg(long, help = "Region or state name, e.g. Punjab")]
    pub region: String,
    #[arg(long, help = "Cultivated area in acres")]
    pub area: String,
    #[arg(long, help = "Treat the crop as unsuited to the region")]
    pub unsuitable: bool,
    #[arg(long, help = "Skip the live price feed and use reference prices")]
    pub offline: bool,
}

pub fn run(args: &EstimateArgs) -> CommandResult {
    let options = LoadOptions { without_llm: true, ..LoadOptions::default() };
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("estimate", "config_validation", error.to_string(), 2);
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "estimate",
                "runtime",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let prices = if args.offline || !config.market.live_prices_enabled {
        PriceResolver::default()
    } else {
        match YahooChartFeed::from_config(&config.market) {
            Ok(feed) => PriceResolver::with_live_feed(feed),
            Err(error) => {
                return CommandResult::failure("estimate", "quote_feed", error.to_string(), 3);
            }
        }
    };
    let dataset = Arc::new(load_dataset(&config.dataset.path));
    let engine = EstimationEngine::new(
        prices,
        YieldResolver::with_dataset(dataset),
        config.market.estimation_settings(),
    );

    let profile = Profile::new(args.region.trim(), "", args.crop.trim(), parse_area(&args.area));
    let verdict = if args.unsuitable {
        SuitabilityVerdict::unsuitable("marked unsuitable by operator")
    } else {
        SuitabilityVerdict::suitable("assumed suitable by operator")
    };
    let decision = SuitabilityGate::new().evaluate(Some(&verdict), &profile);
    let report = runtime.block_on(engine.estimate(&profile, &decision));

    let message = format!(
        "estimate for {} in {}: {} / {}",
        profile.crop, profile.region, report.total_yield, report.estimated_profit
    );
    let details = json!({
        "profile": profile,
        "decision": decision,
        "estimatedProfit": report.estimated_profit,
        "totalYield": report.total_yield,
        "estimation": report.estimation,
        "annotation": report.annotation,
    });

    CommandResult::success("estimate", message, Some(details))
}
