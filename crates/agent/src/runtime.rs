use std::sync::Arc;

use fieldwise_core::domain::profile::Profile;
use fieldwise_core::estimate::EstimationEngine;
use fieldwise_core::gate::{GateDecision, SuitabilityGate};
use fieldwise_core::reconcile::ProfileReconciler;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::conversation::{parse_reply, AgronomistReply};
use crate::llm::{CompletionRequest, LlmClient};
use crate::prompts::{chat_message, dropdown_message, AGRONOMIST_SYSTEM_PROMPT};

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurnRequest {
    #[serde(default, alias = "current_state", deserialize_with = "lenient_profile")]
    pub current_profile: Profile,
    #[serde(default, deserialize_with = "lenient_message")]
    pub message: String,
    #[serde(default, alias = "is_dropdown_update", deserialize_with = "lenient_flag")]
    pub is_dropdown_update: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurnResponse {
    pub reply: String,
    pub profile: Profile,
    pub estimated_profit: String,
    pub total_yield: String,
    #[serde(skip)]
    pub decision: GateDecision,
}

pub struct AdvisorRuntime {
    llm: Arc<dyn LlmClient>,
    reconciler: ProfileReconciler,
    gate: SuitabilityGate,
    engine: EstimationEngine,
}

impl AdvisorRuntime {
    pub fn new(llm: Arc<dyn LlmClient>, engine: EstimationEngine) -> Self {
        Self { llm, reconciler: ProfileReconciler::new(), gate: SuitabilityGate::new(), engine }
    }

    pub fn engine(&self) -> &EstimationEngine {
        &self.engine
    }

    /// Runs one chat turn. Never fails: an unreachable agronomist degrades to the offline
    /// reply and missing market data degrades to reference values.
    pub async fn handle_turn(&self, turn: &ChatTurnRequest) -> ChatTurnResponse {
        let correlation_id = Uuid::new_v4().to_string();
        let agronomist = self.consult(turn, &correlation_id).await;

        let profile = self.reconciler.reconcile(&turn.current_profile, &agronomist.proposed);
        let decision = self.gate.evaluate(agronomist.verdict.as_ref(), &profile);
        let report = self.engine.estimate(&profile, &decision).await;

        info!(
            event_name = "advisor.turn.completed",
            correlation_id = %correlation_id,
            decision = decision.reason_code(),
            dropdown_update = turn.is_dropdown_update,
            agronomist_offline = agronomist.is_offline(),
            crop = %profile.crop,
            region = %profile.region,
            "chat turn completed"
        );

        ChatTurnResponse {
            reply: report.annotate(&agronomist.reply),
            profile,
            estimated_profit: report.estimated_profit,
            total_yield: report.total_yield,
            decision,
        }
    }

    async fn consult(&self, turn: &ChatTurnRequest, correlation_id: &str) -> AgronomistReply {
        let user = if turn.is_dropdown_update {
            dropdown_message(&turn.current_profile)
        } else {
            chat_message(&turn.current_profile, &turn.message)
        };
        let request = CompletionRequest { system: AGRONOMIST_SYSTEM_PROMPT.to_string(), user };

        let outcome = match self.llm.complete(&request).await {
            Ok(raw) => parse_reply(&raw).map_err(anyhow::Error::from),
            Err(error) => Err(error),
        };

        outcome.unwrap_or_else(|error| {
            warn!(
                event_name = "advisor.llm.offline",
                correlation_id = %correlation_id,
                error = %error,
                "agronomist unavailable, replying offline"
            );
            AgronomistReply::offline()
        })
    }
}

fn lenient_profile<'de, D>(deserializer: D) -> Result<Profile, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Object(mut fields) = Value::deserialize(deserializer)? else {
        return Ok(Profile::default());
    };

    // The camelCase key wins when a client sends both spellings of a field.
    for (canonical, legacy) in PROFILE_ALIASES {
        if fields.contains_key(canonical) && fields.remove(legacy).is_some() {
            warn!(
                event_name = "advisor.request.alias_dropped",
                field = canonical,
                alias = legacy,
                "profile carried both spellings of a field, keeping the camelCase one"
            );
        }
    }

    Ok(serde_json::from_value(Value::Object(fields)).unwrap_or_else(|error| {
        warn!(
            event_name = "advisor.request.profile_ignored",
            error = %error,
            "current profile could not be read, starting from an empty profile"
        );
        Profile::default()
    }))
}

const PROFILE_ALIASES: [(&str, &str); 3] =
    [("region", "state"), ("experienceLevel", "experience"), ("cultivatedArea", "area")];

fn lenient_message<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(flag) => flag,
        Value::String(text) => text.trim().eq_ignore_ascii_case("true"),
        _ => false,
    })
}
