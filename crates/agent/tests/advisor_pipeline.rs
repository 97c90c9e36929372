use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fieldwise_agent::{AdvisorRuntime, ChatTurnRequest, CompletionRequest, LlmClient};
use fieldwise_core::domain::profile::Profile;
use fieldwise_core::estimate::price::PriceResolver;
use fieldwise_core::estimate::yields::{HistoricalRecord, HistoricalYields, YieldResolver};
use fieldwise_core::estimate::{EstimationEngine, EstimationSettings};
use fieldwise_core::gate::{GateDecision, SuppressReason};
use rust_decimal::Decimal;

/// Replies with fixed content and records the user messages it was sent.
struct ScriptedLlm {
    content: Option<String>,
    seen: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    fn replying(content: &str) -> Arc<Self> {
        Arc::new(Self { content: Some(content.to_string()), seen: Mutex::new(Vec::new()) })
    }

    fn unreachable() -> Arc<Self> {
        Arc::new(Self { content: None, seen: Mutex::new(Vec::new()) })
    }

    fn last_user_message(&self) -> Option<String> {
        self.seen.lock().ok().and_then(|seen| seen.last().cloned())
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, request: &CompletionRequest) -> anyhow::Result<String> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(request.user.clone());
        }
        self.content.clone().ok_or_else(|| anyhow::anyhow!("connection refused"))
    }
}

fn runtime(llm: Arc<ScriptedLlm>) -> AdvisorRuntime {
    let dataset = Arc::new(HistoricalYields::new(vec![HistoricalRecord::from_raw(
        "Punjab", "Rice", "40", "100",
    )]));
    let engine = EstimationEngine::new(
        PriceResolver::default(),
        YieldResolver::with_dataset(dataset),
        EstimationSettings::default(),
    );
    AdvisorRuntime::new(llm, engine)
}

fn turn(profile: Profile, message: &str) -> ChatTurnRequest {
    ChatTurnRequest { current_profile: profile, message: message.to_string(), is_dropdown_update: false }
}

fn rice_in_punjab() -> Profile {
    Profile::new("Punjab", "Beginner", "rice", Decimal::new(2, 0))
}

#[tokio::test]
async fn suitable_rice_in_punjab_gets_figures_and_market_note() {
    let llm = ScriptedLlm::replying(
        r#"{"state": "Punjab", "crop": "rice", "is_suitable": true, "reply": "Great choice."}"#,
    );
    let runtime = runtime(llm.clone());

    let response = runtime.handle_turn(&turn(rice_in_punjab(), "how much will I make?")).await;

    assert_eq!(response.decision, GateDecision::Proceed);
    assert_eq!(response.total_yield, "5.00 Tons");
    assert_eq!(response.estimated_profit, "₹103,750.00");
    assert!(response.reply.starts_with("Great choice.<br><br>"));
    assert!(response.reply.contains("Trading at ₹20,750.00/ton"));
    assert!(llm
        .last_user_message()
        .is_some_and(|message| message.ends_with("Message: 'how much will I make?'")));
}

#[tokio::test]
async fn unsuitable_crop_reports_zero_and_warning() {
    let llm = ScriptedLlm::replying(
        r#"{"crop": "rice", "is_suitable": false, "reply": "Rainfall is too low."}"#,
    );

    let response = runtime(llm).handle_turn(&turn(rice_in_punjab(), "rice?")).await;

    assert_eq!(response.decision, GateDecision::Suppress(SuppressReason::Unsuitable));
    assert_eq!(response.total_yield, "0 Tons");
    assert_eq!(response.estimated_profit, "₹0.00");
    assert!(response.reply.contains("not climatically suited"));
}

#[tokio::test]
async fn non_numeric_area_yields_placeholder() {
    let llm = ScriptedLlm::replying(
        r#"{"crop": "rice", "area": "lots", "is_suitable": true, "reply": "Sounds good."}"#,
    );
    let request: ChatTurnRequest = serde_json::from_str(
        r#"{"currentProfile": {"region": "Punjab", "crop": "rice", "cultivatedArea": "two"},
            "message": "estimate please"}"#,
    )
    .expect("request");

    let response = runtime(llm).handle_turn(&request).await;

    assert_eq!(response.decision, GateDecision::Suppress(SuppressReason::Incomplete));
    assert_eq!(response.total_yield, "--");
    assert_eq!(response.estimated_profit, "--");
    assert_eq!(response.reply, "Sounds good.");
}

#[tokio::test]
async fn agronomist_proposals_fill_profile_but_prior_area_wins() {
    let llm = ScriptedLlm::replying(
        r#"{"state": "Punjab", "crop": "Wheat", "area": 9, "is_suitable": true, "reply": "Ok."}"#,
    );

    let response = runtime(llm).handle_turn(&turn(rice_in_punjab(), "switch to wheat")).await;

    assert_eq!(response.profile.crop, "Wheat");
    assert_eq!(response.profile.cultivated_area, Decimal::new(2, 0));
    assert!(response.decision.proceeds());
}

#[tokio::test]
async fn unreachable_agronomist_replies_offline_without_figures() {
    let response =
        runtime(ScriptedLlm::unreachable()).handle_turn(&turn(rice_in_punjab(), "hi")).await;

    assert_eq!(response.reply, "AI Agent offline. Please check terminal.");
    assert_eq!(response.decision, GateDecision::Suppress(SuppressReason::Incomplete));
    assert_eq!(response.estimated_profit, "--");
    assert_eq!(response.profile, rice_in_punjab());
}

#[tokio::test]
async fn malformed_agronomist_content_is_treated_as_offline() {
    let response = runtime(ScriptedLlm::replying("I think rice is fine!"))
        .handle_turn(&turn(rice_in_punjab(), "hi"))
        .await;

    assert_eq!(response.reply, "AI Agent offline. Please check terminal.");
}

#[tokio::test]
async fn dropdown_update_asks_for_analysis_instead_of_quoting_message() {
    let llm = ScriptedLlm::replying(r#"{"is_suitable": true, "reply": "Tips."}"#);
    let mut request = turn(rice_in_punjab(), "ignored");
    request.is_dropdown_update = true;

    runtime(llm.clone()).handle_turn(&request).await;

    let message = llm.last_user_message().unwrap_or_default();
    assert!(message.ends_with("Analyze suitability and generate yield tips."));
    assert!(!message.contains("ignored"));
}

#[tokio::test]
async fn identical_turns_produce_identical_responses() {
    let llm = ScriptedLlm::replying(
        r#"{"state": "Punjab", "crop": "rice", "is_suitable": true, "reply": "Great choice."}"#,
    );
    let runtime = runtime(llm);
    let request = turn(rice_in_punjab(), "again");

    let first = runtime.handle_turn(&request).await;
    let second = runtime.handle_turn(&request).await;

    assert_eq!(first, second);
}
