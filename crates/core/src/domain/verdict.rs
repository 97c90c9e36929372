use serde::{Deserialize, Serialize};

/// The agronomist's judgment of whether the profile's crop can be grown commercially in its
/// region, together with the narrative shown to the user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuitabilityVerdict {
    pub is_suitable: bool,
    pub explanation: String,
}

impl SuitabilityVerdict {
    pub fn suitable(explanation: impl Into<String>) -> Self {
        Self { is_suitable: true, explanation: explanation.into() }
    }

    pub fn unsuitable(explanation: impl Into<String>) -> Self {
        Self { is_suitable: false, explanation: explanation.into() }
    }
}
