use std::env;
use std::fs;
use std::sync::{Mutex, OnceLock};

use fieldwise_cli::commands::{config, doctor, estimate};
use serde_json::Value;
use tempfile::TempDir;

fn estimate_args(crop: &str, region: &str, area: &str) -> estimate::EstimateArgs {
    estimate::EstimateArgs {
        crop: crop.to_string(),
        region: region.to_string(),
        area: area.to_string(),
        unsuitable: false,
        offline: true,
    }
}

fn dataset_dir() -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    fs::write(
        dir.path().join("india_crop_data.csv"),
        "State_Name,District_Name,Crop,Area,Production\nPunjab,LUDHIANA,Rice,40,100\n",
    )
    .expect("write dataset");
    dir
}

#[test]
fn estimate_uses_dataset_and_reference_price_offline() {
    let dir = dataset_dir();
    let dataset = dir.path().join("india_crop_data.csv");
    let dataset = dataset.to_string_lossy();

    with_env(&[("FIELDWISE_LLM_PROVIDER", "ollama"), ("FIELDWISE_DATASET_PATH", &dataset)], || {
        let result = estimate::run(&estimate_args("rice", "Punjab", "2"));
        assert_eq!(result.exit_code, 0, "expected successful estimate");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "estimate");
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["details"]["totalYield"], "5.00 Tons");
        assert_eq!(payload["details"]["estimatedProfit"], "₹103,750.00");
        assert_eq!(payload["details"]["decision"]["decision"], "proceed");
    });
}

#[test]
fn estimate_marked_unsuitable_reports_zero() {
    with_env(&[("FIELDWISE_LLM_PROVIDER", "ollama")], || {
        let mut args = estimate_args("rice", "Rajasthan", "2");
        args.unsuitable = true;

        let result = estimate::run(&args);
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["details"]["totalYield"], "0 Tons");
        assert_eq!(payload["details"]["estimatedProfit"], "₹0.00");
        let annotation = payload["details"]["annotation"].as_str().unwrap_or_default();
        assert!(annotation.contains("Rice is not climatically suited"));
    });
}

#[test]
fn estimate_with_non_numeric_area_is_placeholder() {
    with_env(&[("FIELDWISE_LLM_PROVIDER", "ollama")], || {
        let result = estimate::run(&estimate_args("rice", "Punjab", "two acres"));
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["details"]["totalYield"], "--");
        assert_eq!(payload["details"]["decision"]["reason"], "incomplete");
    });
}

#[test]
fn estimate_runs_offline_without_api_key() {
    with_env(&[], || {
        let result = estimate::run(&estimate_args("rice", "Punjab", "2"));
        assert_eq!(result.exit_code, 0, "estimate should not need an llm credential");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["details"]["totalYield"], "5.00 Tons");
        assert_eq!(payload["details"]["decision"]["decision"], "proceed");
    });
}

#[test]
fn estimate_returns_config_failure_for_bad_market_settings() {
    with_env(&[("FIELDWISE_MARKET_EXCHANGE_RATE", "-1")], || {
        let result = estimate::run(&estimate_args("rice", "Punjab", "2"));
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn doctor_json_reports_missing_dataset() {
    let dir = TempDir::new().expect("tempdir");
    let missing = dir.path().join("absent.csv");
    let missing = missing.to_string_lossy();

    with_env(&[("GROQ_API_KEY", "gsk_test_value"), ("FIELDWISE_DATASET_PATH", &missing)], || {
        let result = doctor::run(true);
        assert_eq!(result.exit_code, 1);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["overall_status"], "fail");
        let checks = payload["checks"].as_array().cloned().unwrap_or_default();
        let status_of = |name: &str| {
            checks
                .iter()
                .find(|check| check["name"] == name)
                .map(|check| check["status"].clone())
                .unwrap_or(Value::Null)
        };
        assert_eq!(status_of("config_validation"), "pass");
        assert_eq!(status_of("dataset_readability"), "fail");
        assert_eq!(status_of("llm_credential_readiness"), "pass");
    });
}

#[test]
fn doctor_human_output_passes_with_dataset() {
    let dir = dataset_dir();
    let dataset = dir.path().join("india_crop_data.csv");
    let dataset = dataset.to_string_lossy();

    with_env(&[("GROQ_API_KEY", "gsk_test_value"), ("FIELDWISE_DATASET_PATH", &dataset)], || {
        let result = doctor::run(false);
        assert_eq!(result.exit_code, 0);
        assert!(result.output.starts_with("doctor: all readiness checks passed"));
        assert!(result.output.contains("- [ok] dataset_readability: read 1 records"));
    });
}

#[test]
fn doctor_flags_key_that_does_not_match_provider() {
    let dir = dataset_dir();
    let dataset = dir.path().join("india_crop_data.csv");
    let dataset = dataset.to_string_lossy();

    with_env(&[("GROQ_API_KEY", "sk-openai-style"), ("FIELDWISE_DATASET_PATH", &dataset)], || {
        let result = doctor::run(false);
        assert_eq!(result.exit_code, 1);
        assert!(result.output.starts_with("doctor: one or more readiness checks failed"));
        assert!(result.output.contains("- [ok] config_validation"));
        assert!(result
            .output
            .contains("- [fail] llm_credential_readiness: api key does not look like a Groq key"));
    });
}

#[test]
fn config_output_attributes_sources_and_redacts_key() {
    with_env(&[("GROQ_API_KEY", "gsk-very-secret"), ("FIELDWISE_SERVER_PORT", "6100")], || {
        let output = config::run();

        assert!(output.contains("- llm.api_key = gsk-*** (source: env (GROQ_API_KEY))"));
        assert!(output.contains("- server.port = 6100 (source: env (FIELDWISE_SERVER_PORT))"));
        assert!(output.contains("- llm.model = llama-3.1-8b-instant (source: default)"));
        assert!(!output.contains("very-secret"));
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard = ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    let keys = [
        "FIELDWISE_LLM_PROVIDER",
        "FIELDWISE_LLM_API_KEY",
        "GROQ_API_KEY",
        "FIELDWISE_LLM_BASE_URL",
        "FIELDWISE_LLM_MODEL",
        "FIELDWISE_LLM_TEMPERATURE",
        "FIELDWISE_LLM_TIMEOUT_SECS",
        "FIELDWISE_MARKET_LIVE_PRICES_ENABLED",
        "FIELDWISE_MARKET_QUOTE_BASE_URL",
        "FIELDWISE_MARKET_EXCHANGE_RATE",
        "FIELDWISE_MARKET_CURRENCY_SYMBOL",
        "FIELDWISE_DATASET_PATH",
        "FIELDWISE_SERVER_BIND_ADDRESS",
        "FIELDWISE_SERVER_PORT",
        "FIELDWISE_LOGGING_LEVEL",
        "FIELDWISE_LOGGING_FORMAT",
        "FIELDWISE_LOG_LEVEL",
        "FIELDWISE_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(test_fn));

    for (key, value) in previous_values {
        match value {
            Some(value) => env::set_var(key, value),
            None => env::remove_var(key),
        }
    }

    if let Err(panic) = outcome {
        std::panic::resume_unwind(panic);
    }
}
