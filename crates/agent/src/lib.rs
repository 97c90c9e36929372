//! Advisor runtime: the agronomist conversation and the per-turn pipeline.
//!
//! One chat turn runs a fixed sequence:
//! 1. **Agronomist call** (`llm`, `prompts`) - send the profile and message to the model
//! 2. **Reply parsing** (`conversation`) - read proposed fields and a suitability verdict
//! 3. **Reconcile and gate** - merge the profile and decide whether numbers are computed
//! 4. **Estimate** - yield and profit from `fieldwise-core`, appended to the reply
//!
//! The model never produces figures. Yield, price and profit are computed locally from
//! market data and the historical dataset.

pub mod conversation;
pub mod llm;
pub mod prompts;
pub mod runtime;

pub use conversation::{parse_reply, AgronomistReply};
pub use llm::{AgentError, ChatCompletionsClient, CompletionRequest, LlmClient};
pub use runtime::{AdvisorRuntime, ChatTurnRequest, ChatTurnResponse};
