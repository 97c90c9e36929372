use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use fieldwise_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

struct FieldView {
    key_path: &'static str,
    value: String,
    env_keys: &'static [&'static str],
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in fields(&config) {
        let source = field_source(
            field.key_path,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key_path, &field.value, source));
    }

    lines.join("\n")
}

fn fields(config: &AppConfig) -> Vec<FieldView> {
    let api_key = config
        .llm
        .api_key
        .as_ref()
        .map(|key| redact_token(key.expose_secret()))
        .unwrap_or_else(|| "<unset>".to_string());

    vec![
        FieldView {
            key_path: "llm.provider",
            value: format!("{:?}", config.llm.provider),
            env_keys: &["FIELDWISE_LLM_PROVIDER"],
        },
        FieldView {
            key_path: "llm.api_key",
            value: api_key,
            env_keys: &["FIELDWISE_LLM_API_KEY", "GROQ_API_KEY"],
        },
        FieldView {
            key_path: "llm.base_url",
            value: config.llm.endpoint_base(),
            env_keys: &["FIELDWISE_LLM_BASE_URL"],
        },
        FieldView {
            key_path: "llm.model",
            value: config.llm.model.clone(),
            env_keys: &["FIELDWISE_LLM_MODEL"],
        },
        FieldView {
            key_path: "llm.temperature",
            value: config.llm.temperature.to_string(),
            env_keys: &["FIELDWISE_LLM_TEMPERATURE"],
        },
        FieldView {
            key_path: "market.live_prices_enabled",
            value: config.market.live_prices_enabled.to_string(),
            env_keys: &["FIELDWISE_MARKET_LIVE_PRICES_ENABLED"],
        },
        FieldView {
            key_path: "market.quote_base_url",
            value: config.market.quote_base_url.clone(),
            env_keys: &["FIELDWISE_MARKET_QUOTE_BASE_URL"],
        },
        FieldView {
            key_path: "market.exchange_rate",
            value: config.market.exchange_rate.to_string(),
            env_keys: &["FIELDWISE_MARKET_EXCHANGE_RATE"],
        },
        FieldView {
            key_path: "market.currency_symbol",
            value: config.market.currency_symbol.clone(),
            env_keys: &["FIELDWISE_MARKET_CURRENCY_SYMBOL"],
        },
        FieldView {
            key_path: "dataset.path",
            value: config.dataset.path.display().to_string(),
            env_keys: &["FIELDWISE_DATASET_PATH"],
        },
        FieldView {
            key_path: "server.bind_address",
            value: config.server.bind_address.clone(),
            env_keys: &["FIELDWISE_SERVER_BIND_ADDRESS"],
        },
        FieldView {
            key_path: "server.port",
            value: config.server.port.to_string(),
            env_keys: &["FIELDWISE_SERVER_PORT"],
        },
        FieldView {
            key_path: "logging.level",
            value: config.logging.level.clone(),
            env_keys: &["FIELDWISE_LOGGING_LEVEL", "FIELDWISE_LOG_LEVEL"],
        },
        FieldView {
            key_path: "logging.format",
            value: format!("{:?}", config.logging.format),
            env_keys: &["FIELDWISE_LOGGING_FORMAT", "FIELDWISE_LOG_FORMAT"],
        },
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("fieldwise.toml"), PathBuf::from("config/fieldwise.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Keeps a recognizable key prefix such as `gsk` or `sk` and hides the rest.
fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once(['-', '_']) {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}
