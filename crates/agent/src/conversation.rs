use fieldwise_core::domain::profile::PartialProfile;
use fieldwise_core::domain::verdict::SuitabilityVerdict;
use serde_json::{Map, Value};
use tracing::warn;

use crate::llm::AgentError;

pub const MISSING_REPLY: &str = "Sorry, I encountered an error.";
pub const OFFLINE_REPLY: &str = "AI Agent offline. Please check terminal.";

/// What the agronomist returned for one turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgronomistReply {
    pub proposed: PartialProfile,
    /// `None` only when the agronomist could not be reached or understood.
    pub verdict: Option<SuitabilityVerdict>,
    pub reply: String,
}

impl AgronomistReply {
    pub fn offline() -> Self {
        Self { proposed: PartialProfile::default(), verdict: None, reply: OFFLINE_REPLY.to_string() }
    }

    pub fn is_offline(&self) -> bool {
        self.verdict.is_none()
    }
}

/// Parses the model's raw content into proposals, a verdict and reply text.
///
/// A missing suitability flag counts as suitable and a missing reply gets a stock apology.
/// Content that is not a JSON object is an error.
pub fn parse_reply(raw: &str) -> Result<AgronomistReply, AgentError> {
    let value: Value = serde_json::from_str(strip_code_fence(raw))
        .map_err(|error| AgentError::MalformedReply(error.to_string()))?;
    let Value::Object(object) = value else {
        return Err(AgentError::MalformedReply("top-level value is not an object".to_string()));
    };

    let reply = match object.get("reply") {
        Some(Value::String(text)) if !text.trim().is_empty() => text.clone(),
        _ => MISSING_REPLY.to_string(),
    };
    let is_suitable = suitability_flag(&object);
    let proposed = proposed_fields(object);

    let verdict = if is_suitable {
        SuitabilityVerdict::suitable(reply.clone())
    } else {
        SuitabilityVerdict::unsuitable(reply.clone())
    };

    Ok(AgronomistReply { proposed, verdict: Some(verdict), reply })
}

fn suitability_flag(object: &Map<String, Value>) -> bool {
    let flag = object.get("is_suitable").or_else(|| object.get("isSuitable"));
    match flag {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::String(text)) => !text.trim().eq_ignore_ascii_case("false"),
        _ => true,
    }
}

fn proposed_fields(object: Map<String, Value>) -> PartialProfile {
    match serde_json::from_value(Value::Object(object)) {
        Ok(proposed) => proposed,
        Err(error) => {
            warn!(
                event_name = "advisor.reply.fields_ignored",
                error = %error,
                "agronomist profile fields could not be read"
            );
            PartialProfile::default()
        }
    }
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
