use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::estimate::EstimationSettings;
use crate::reference::DEFAULT_EXCHANGE_RATE;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub market: MarketConfig,
    pub dataset: DatasetConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub api_key: Option<SecretString>,
    pub base_url: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct MarketConfig {
    pub live_prices_enabled: bool,
    pub quote_base_url: String,
    pub lookback: String,
    pub timeout_secs: u64,
    pub exchange_rate: Decimal,
    pub currency_symbol: String,
}

#[derive(Clone, Debug)]
pub struct DatasetConfig {
    pub path: PathBuf,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    Groq,
    #[serde(rename = "openai", alias = "open_ai")]
    OpenAi,
    Ollama,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub llm_provider: Option<LlmProvider>,
    pub llm_api_key: Option<String>,
    pub llm_base_url: Option<String>,
    pub llm_model: Option<String>,
    pub live_prices_enabled: Option<bool>,
    pub quote_base_url: Option<String>,
    pub dataset_path: Option<PathBuf>,
    pub server_port: Option<u16>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    /// Skips the `[llm]` checks for callers that never build an LLM client.
    pub without_llm: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

/// Marker left in sample configs in place of a real key.
const PLACEHOLDER_KEY_MARKER: &str = "YOUR_ACTUAL_KEY";

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig {
                provider: LlmProvider::Groq,
                api_key: None,
                base_url: None,
                model: "llama-3.1-8b-instant".to_string(),
                temperature: 0.4,
                timeout_secs: 30,
            },
            market: MarketConfig {
                live_prices_enabled: true,
                quote_base_url: "https://query1.finance.yahoo.com".to_string(),
                lookback: "5d".to_string(),
                timeout_secs: 10,
                exchange_rate: DEFAULT_EXCHANGE_RATE,
                currency_symbol: "₹".to_string(),
            },
            dataset: DatasetConfig { path: PathBuf::from("india_crop_data.csv") },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 5000,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl LlmProvider {
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::Groq => "https://api.groq.com/openai/v1",
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Ollama => "http://localhost:11434/v1",
        }
    }

    pub fn requires_api_key(&self) -> bool {
        !matches!(self, Self::Ollama)
    }
}

impl LlmConfig {
    pub fn endpoint_base(&self) -> String {
        self.base_url
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| self.provider.default_base_url())
            .trim_end_matches('/')
            .to_string()
    }
}

impl MarketConfig {
    pub fn estimation_settings(&self) -> EstimationSettings {
        EstimationSettings {
            exchange_rate: self.exchange_rate,
            currency_symbol: self.currency_symbol.clone(),
        }
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "groq" => Ok(Self::Groq),
            "openai" | "open_ai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            other => Err(ConfigError::Validation(format!(
                "unsupported llm provider `{other}` (expected groq|openai|ollama)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch)?;
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("fieldwise.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        if options.without_llm {
            config.validate_without_llm()?;
        } else {
            config.validate()?;
        }

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) -> Result<(), ConfigError> {
        if let Some(llm) = patch.llm {
            if let Some(provider) = llm.provider {
                self.llm.provider = provider;
            }
            if let Some(llm_api_key_value) = llm.api_key {
                self.llm.api_key = Some(secret_value(llm_api_key_value));
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = Some(base_url);
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(temperature) = llm.temperature {
                self.llm.temperature = temperature;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
        }

        if let Some(market) = patch.market {
            if let Some(enabled) = market.live_prices_enabled {
                self.market.live_prices_enabled = enabled;
            }
            if let Some(quote_base_url) = market.quote_base_url {
                self.market.quote_base_url = quote_base_url;
            }
            if let Some(lookback) = market.lookback {
                self.market.lookback = lookback;
            }
            if let Some(timeout_secs) = market.timeout_secs {
                self.market.timeout_secs = timeout_secs;
            }
            if let Some(exchange_rate) = market.exchange_rate {
                self.market.exchange_rate = Decimal::from_f64(exchange_rate).ok_or_else(|| {
                    ConfigError::Validation(format!(
                        "market.exchange_rate `{exchange_rate}` is not a representable number"
                    ))
                })?;
            }
            if let Some(currency_symbol) = market.currency_symbol {
                self.market.currency_symbol = currency_symbol;
            }
        }

        if let Some(dataset) = patch.dataset {
            if let Some(path) = dataset.path {
                self.dataset.path = path;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("FIELDWISE_LLM_PROVIDER") {
            self.llm.provider = value.parse()?;
        }
        let api_key = read_env("FIELDWISE_LLM_API_KEY").or_else(|| read_env("GROQ_API_KEY"));
        if let Some(value) = api_key {
            self.llm.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("FIELDWISE_LLM_BASE_URL") {
            self.llm.base_url = Some(value);
        }
        if let Some(value) = read_env("FIELDWISE_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("FIELDWISE_LLM_TEMPERATURE") {
            self.llm.temperature = parse_value("FIELDWISE_LLM_TEMPERATURE", &value)?;
        }
        if let Some(value) = read_env("FIELDWISE_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_value("FIELDWISE_LLM_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("FIELDWISE_MARKET_LIVE_PRICES_ENABLED") {
            self.market.live_prices_enabled =
                parse_value("FIELDWISE_MARKET_LIVE_PRICES_ENABLED", &value)?;
        }
        if let Some(value) = read_env("FIELDWISE_MARKET_QUOTE_BASE_URL") {
            self.market.quote_base_url = value;
        }
        if let Some(value) = read_env("FIELDWISE_MARKET_LOOKBACK") {
            self.market.lookback = value;
        }
        if let Some(value) = read_env("FIELDWISE_MARKET_TIMEOUT_SECS") {
            self.market.timeout_secs = parse_value("FIELDWISE_MARKET_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("FIELDWISE_MARKET_EXCHANGE_RATE") {
            self.market.exchange_rate = parse_value("FIELDWISE_MARKET_EXCHANGE_RATE", &value)?;
        }
        if let Some(value) = read_env("FIELDWISE_MARKET_CURRENCY_SYMBOL") {
            self.market.currency_symbol = value;
        }

        if let Some(value) = read_env("FIELDWISE_DATASET_PATH") {
            self.dataset.path = PathBuf::from(value);
        }

        if let Some(value) = read_env("FIELDWISE_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("FIELDWISE_SERVER_PORT") {
            self.server.port = parse_value("FIELDWISE_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("FIELDWISE_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_value("FIELDWISE_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level =
            read_env("FIELDWISE_LOGGING_LEVEL").or_else(|| read_env("FIELDWISE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("FIELDWISE_LOGGING_FORMAT").or_else(|| read_env("FIELDWISE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(llm_provider) = overrides.llm_provider {
            self.llm.provider = llm_provider;
        }
        if let Some(llm_api_key) = overrides.llm_api_key {
            self.llm.api_key = Some(secret_value(llm_api_key));
        }
        if let Some(llm_base_url) = overrides.llm_base_url {
            self.llm.base_url = Some(llm_base_url);
        }
        if let Some(llm_model) = overrides.llm_model {
            self.llm.model = llm_model;
        }
        if let Some(enabled) = overrides.live_prices_enabled {
            self.market.live_prices_enabled = enabled;
        }
        if let Some(quote_base_url) = overrides.quote_base_url {
            self.market.quote_base_url = quote_base_url;
        }
        if let Some(dataset_path) = overrides.dataset_path {
            self.dataset.path = dataset_path;
        }
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_llm(&self.llm)?;
        self.validate_without_llm()
    }

    pub fn validate_without_llm(&self) -> Result<(), ConfigError> {
        validate_market(&self.market)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("fieldwise.toml"), PathBuf::from("config/fieldwise.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    if llm.timeout_secs == 0 || llm.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if !(0.0..=2.0).contains(&llm.temperature) {
        return Err(ConfigError::Validation(
            "llm.temperature must be in range 0.0..=2.0".to_string(),
        ));
    }

    if llm.model.trim().is_empty() {
        return Err(ConfigError::Validation("llm.model must not be empty".to_string()));
    }

    if llm.provider.requires_api_key() {
        let key = llm.api_key.as_ref().map(|value| value.expose_secret().trim().to_string());
        match key.as_deref() {
            None | Some("") => {
                return Err(ConfigError::Validation(
                    "llm.api_key is required for groq/openai providers (set FIELDWISE_LLM_API_KEY or GROQ_API_KEY)"
                        .to_string(),
                ));
            }
            Some(key) if key.contains(PLACEHOLDER_KEY_MARKER) => {
                return Err(ConfigError::Validation(
                    "llm.api_key still holds the sample placeholder; paste a real key".to_string(),
                ));
            }
            Some(_) => {}
        }
    }

    if let Some(base_url) = &llm.base_url {
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::Validation(
                "llm.base_url must start with http:// or https://".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_market(market: &MarketConfig) -> Result<(), ConfigError> {
    if market.exchange_rate <= Decimal::ZERO {
        return Err(ConfigError::Validation(
            "market.exchange_rate must be greater than zero".to_string(),
        ));
    }

    if market.timeout_secs == 0 || market.timeout_secs > 120 {
        return Err(ConfigError::Validation(
            "market.timeout_secs must be in range 1..=120".to_string(),
        ));
    }

    if market.live_prices_enabled
        && !market.quote_base_url.starts_with("http://")
        && !market.quote_base_url.starts_with("https://")
    {
        return Err(ConfigError::Validation(
            "market.quote_base_url must start with http:// or https://".to_string(),
        ));
    }

    if market.lookback.trim().is_empty() {
        return Err(ConfigError::Validation("market.lookback must not be empty".to_string()));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
{
    value.trim().parse::<T>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    llm: Option<LlmPatch>,
    market: Option<MarketPatch>,
    dataset: Option<DatasetPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    provider: Option<LlmProvider>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct MarketPatch {
    live_prices_enabled: Option<bool>,
    quote_base_url: Option<String>,
    lookback: Option<String>,
    timeout_secs: Option<u64>,
    exchange_rate: Option<f64>,
    currency_symbol: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DatasetPatch {
    path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
