use serde::{Deserialize, Serialize};

use crate::domain::{profile::Profile, verdict::SuitabilityVerdict};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuppressReason {
    /// The agronomist judged the crop unsuitable for the region.
    Unsuitable,
    /// Crop, region or area is missing, or no verdict was produced.
    Incomplete,
}

impl SuppressReason {
    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::Unsuitable => "unsuitable",
            Self::Incomplete => "incomplete",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "decision", content = "reason")]
pub enum GateDecision {
    Proceed,
    Suppress(SuppressReason),
}

impl GateDecision {
    pub fn proceeds(&self) -> bool {
        matches!(self, Self::Proceed)
    }

    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::Proceed => "proceed",
            Self::Suppress(reason) => reason.reason_code(),
        }
    }
}

/// Decides whether numeric estimation runs for a turn.
#[derive(Clone, Debug, Default)]
pub struct SuitabilityGate;

impl SuitabilityGate {
    pub fn new() -> Self {
        Self
    }

    /// `verdict` is `None` when the agronomist could not be reached; that is treated the
    /// same as missing profile input, never as an unsuitable crop.
    pub fn evaluate(&self, verdict: Option<&SuitabilityVerdict>, profile: &Profile) -> GateDecision {
        let complete = profile.has_crop() && profile.has_region() && profile.has_area();

        match verdict {
            Some(verdict) if complete && verdict.is_suitable => GateDecision::Proceed,
            Some(_) if complete => GateDecision::Suppress(SuppressReason::Unsuitable),
            _ => GateDecision::Suppress(SuppressReason::Incomplete),
        }
    }
}
