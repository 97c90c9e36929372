use fieldwise_core::config::{AppConfig, LlmProvider, LoadOptions};
use fieldwise_market::read_dataset;
use secrecy::ExposeSecret;
use serde::Serialize;

use super::CommandResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { 1 };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_dataset(&config));
            checks.push(check_llm_credentials(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["dataset_readability", "llm_credential_readiness"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status != CheckStatus::Fail)
        && checks.iter().any(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_dataset(config: &AppConfig) -> DoctorCheck {
    let path = &config.dataset.path;
    match read_dataset(path) {
        Ok(dataset) if dataset.is_empty() => DoctorCheck {
            name: "dataset_readability",
            status: CheckStatus::Fail,
            details: format!("`{}` contains no usable rows", path.display()),
        },
        Ok(dataset) => DoctorCheck {
            name: "dataset_readability",
            status: CheckStatus::Pass,
            details: format!("read {} records from `{}`", dataset.len(), path.display()),
        },
        Err(error) => DoctorCheck {
            name: "dataset_readability",
            status: CheckStatus::Fail,
            details: format!("{error}; yields will fall back to reference values"),
        },
    }
}

fn check_llm_credentials(config: &AppConfig) -> DoctorCheck {
    let provider = config.llm.provider;
    let Some(expected_prefix) = key_prefix(provider) else {
        return DoctorCheck {
            name: "llm_credential_readiness",
            status: CheckStatus::Skipped,
            details: format!("{provider:?} provider does not require an api key"),
        };
    };

    let key = config.llm.api_key.as_ref().map(|key| key.expose_secret().trim()).unwrap_or_default();
    if key.chars().any(char::is_whitespace) {
        return DoctorCheck {
            name: "llm_credential_readiness",
            status: CheckStatus::Fail,
            details: "api key contains whitespace; check for a pasted line break".to_string(),
        };
    }
    if !key.starts_with(expected_prefix) {
        return DoctorCheck {
            name: "llm_credential_readiness",
            status: CheckStatus::Fail,
            details: format!(
                "api key does not look like a {provider:?} key (expected `{expected_prefix}` prefix)"
            ),
        };
    }

    DoctorCheck {
        name: "llm_credential_readiness",
        status: CheckStatus::Pass,
        details: format!(
            "{provider:?} api key is well-formed for {}",
            config.llm.endpoint_base()
        ),
    }
}

fn key_prefix(provider: LlmProvider) -> Option<&'static str> {
    match provider {
        LlmProvider::Groq => Some("gsk_"),
        LlmProvider::OpenAi => Some("sk-"),
        LlmProvider::Ollama => None,
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
