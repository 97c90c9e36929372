use std::sync::Arc;

use fieldwise_agent::{AdvisorRuntime, AgentError, ChatCompletionsClient};
use fieldwise_core::config::{AppConfig, ConfigError};
use fieldwise_core::estimate::price::PriceResolver;
use fieldwise_core::estimate::yields::{HistoricalYields, YieldResolver};
use fieldwise_core::estimate::EstimationEngine;
use fieldwise_market::{load_dataset, FeedError, YahooChartFeed};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub dataset: Arc<HistoricalYields>,
    pub advisor: Arc<AdvisorRuntime>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("quote feed setup failed: {0}")]
    QuoteFeed(#[source] FeedError),
    #[error("llm client setup failed: {0}")]
    LlmClient(#[source] AgentError),
}

/// Builds the runtime from a loaded configuration. Logging is expected to be installed
/// already so every bootstrap event reaches the configured sink.
pub fn bootstrap(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        provider = ?config.llm.provider,
        dataset = %config.dataset.path.display(),
        "starting application bootstrap"
    );

    let dataset = Arc::new(load_dataset(&config.dataset.path));
    info!(
        event_name = "system.bootstrap.dataset_ready",
        correlation_id = "bootstrap",
        available = dataset.is_available(),
        records = dataset.len(),
        "historical dataset initialized"
    );

    let prices = if config.market.live_prices_enabled {
        let feed = YahooChartFeed::from_config(&config.market).map_err(BootstrapError::QuoteFeed)?;
        PriceResolver::with_live_feed(feed)
    } else {
        PriceResolver::default()
    };
    info!(
        event_name = "system.bootstrap.prices_ready",
        correlation_id = "bootstrap",
        live_prices_enabled = config.market.live_prices_enabled,
        "price resolver initialized"
    );

    let engine = EstimationEngine::new(
        prices,
        YieldResolver::with_dataset(dataset.clone()),
        config.market.estimation_settings(),
    );
    let llm = ChatCompletionsClient::from_config(&config.llm).map_err(BootstrapError::LlmClient)?;
    info!(
        event_name = "system.bootstrap.llm_ready",
        correlation_id = "bootstrap",
        model = llm.model(),
        endpoint = %config.llm.endpoint_base(),
        "llm client initialized"
    );

    Ok(Application { config, dataset, advisor: Arc::new(AdvisorRuntime::new(Arc::new(llm), engine)) })
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use fieldwise_core::config::{AppConfig, ConfigOverrides, LlmProvider, LoadOptions};

    use crate::bootstrap::{bootstrap, Application, BootstrapError};

    fn load_and_bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
        let config = AppConfig::load(options)?;
        bootstrap(config)
    }

    fn offline_options() -> LoadOptions {
        LoadOptions {
            config_path: Some(PathBuf::from("does-not-exist.toml")),
            overrides: ConfigOverrides {
                llm_provider: Some(LlmProvider::Ollama),
                live_prices_enabled: Some(false),
                dataset_path: Some(PathBuf::from("does-not-exist.csv")),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[test]
    fn bootstrap_fails_fast_on_placeholder_api_key() {
        let result = load_and_bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                llm_provider: Some(LlmProvider::Groq),
                llm_api_key: Some("YOUR_ACTUAL_KEY".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        });

        let message = result.err().map(|error| error.to_string()).unwrap_or_default();
        assert!(message.contains("llm.api_key"));
    }

    #[test]
    fn missing_dataset_does_not_block_startup() {
        let app = load_and_bootstrap(offline_options())
            .expect("bootstrap should succeed without dataset");

        assert!(!app.dataset.is_available());
        assert!(!app.config.market.live_prices_enabled);
    }
}
