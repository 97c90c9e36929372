use rust_decimal::Decimal;

use crate::domain::profile::{PartialProfile, Profile};

/// Merges the caller's prior profile with fields proposed by the agronomist.
///
/// Text fields are conversational, so a non-empty proposal replaces the prior value.
/// The cultivated area is set through an explicit control, so a positive prior value is
/// kept and the proposal only fills a missing area.
#[derive(Clone, Debug, Default)]
pub struct ProfileReconciler;

impl ProfileReconciler {
    pub fn new() -> Self {
        Self
    }

    pub fn reconcile(&self, prior: &Profile, proposed: &PartialProfile) -> Profile {
        Profile {
            region: prefer_proposed(proposed.region.as_deref(), &prior.region),
            experience_level: prefer_proposed(
                proposed.experience_level.as_deref(),
                &prior.experience_level,
            ),
            crop: prefer_proposed(proposed.crop.as_deref(), &prior.crop),
            cultivated_area: prefer_prior_area(prior.cultivated_area, proposed.cultivated_area),
        }
    }
}

fn prefer_proposed(proposed: Option<&str>, prior: &str) -> String {
    match proposed.map(str::trim) {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => prior.trim().to_string(),
    }
}

fn prefer_prior_area(prior: Decimal, proposed: Option<Decimal>) -> Decimal {
    if prior > Decimal::ZERO {
        return prior;
    }

    proposed.filter(|area| *area > Decimal::ZERO).unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::ProfileReconciler;
    use crate::domain::profile::{PartialProfile, Profile};

    fn prior() -> Profile {
        Profile::new("Punjab", "Beginner", "wheat", Decimal::new(4, 0))
    }

    #[test]
    fn proposed_text_fields_replace_prior_values() {
        let merged = ProfileReconciler::new().reconcile(
            &prior(),
            &PartialProfile {
                region: Some("Kerala".to_string()),
                experience_level: Some("Expert".to_string()),
                crop: Some("rice".to_string()),
                cultivated_area: None,
            },
        );

        assert_eq!(merged.region, "Kerala");
        assert_eq!(merged.experience_level, "Expert");
        assert_eq!(merged.crop, "rice");
        assert_eq!(merged.cultivated_area, Decimal::new(4, 0));
    }

    #[test]
    fn absent_or_blank_proposals_keep_prior_text() {
        let merged = ProfileReconciler::new().reconcile(
            &prior(),
            &PartialProfile {
                region: Some("   ".to_string()),
                experience_level: None,
                crop: Some(String::new()),
                cultivated_area: None,
            },
        );

        assert_eq!(merged, prior());
    }

    #[test]
    fn positive_prior_area_wins_over_proposal() {
        let merged = ProfileReconciler::new().reconcile(
            &prior(),
            &PartialProfile { cultivated_area: Some(Decimal::new(40, 0)), ..Default::default() },
        );

        assert_eq!(merged.cultivated_area, Decimal::new(4, 0));
    }

    #[test]
    fn proposal_fills_missing_prior_area() {
        let mut without_area = prior();
        without_area.cultivated_area = Decimal::ZERO;

        let merged = ProfileReconciler::new().reconcile(
            &without_area,
            &PartialProfile { cultivated_area: Some(Decimal::new(15, 1)), ..Default::default() },
        );

        assert_eq!(merged.cultivated_area, Decimal::new(15, 1));
    }

    #[test]
    fn area_defaults_to_zero_when_neither_side_has_one() {
        let merged =
            ProfileReconciler::new().reconcile(&Profile::default(), &PartialProfile::default());

        assert_eq!(merged, Profile::default());
    }
}
