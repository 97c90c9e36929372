use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Upper bound on an acceptable cultivated area in acres. Larger inputs are treated as
/// uncoercible so downstream decimal arithmetic stays in range.
pub const MAX_CULTIVATED_AREA: Decimal = Decimal::from_parts(0xD4A5_1000, 0xE8, 0, false, 0);

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default, alias = "state", deserialize_with = "lenient_text")]
    pub region: String,
    #[serde(default, alias = "experience", deserialize_with = "lenient_text")]
    pub experience_level: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub crop: String,
    #[serde(
        default,
        alias = "area",
        deserialize_with = "lenient_area",
        serialize_with = "rust_decimal::serde::float::serialize"
    )]
    pub cultivated_area: Decimal,
}

impl Profile {
    pub fn new(
        region: impl Into<String>,
        experience_level: impl Into<String>,
        crop: impl Into<String>,
        cultivated_area: Decimal,
    ) -> Self {
        Self {
            region: region.into(),
            experience_level: experience_level.into(),
            crop: crop.into(),
            cultivated_area: cultivated_area.max(Decimal::ZERO),
        }
    }

    pub fn has_crop(&self) -> bool {
        !self.crop.trim().is_empty()
    }

    pub fn has_region(&self) -> bool {
        !self.region.trim().is_empty()
    }

    pub fn has_area(&self) -> bool {
        self.cultivated_area > Decimal::ZERO
    }
}

/// Profile fields proposed by the agronomist. Every field may be absent, and blank strings
/// or non-positive areas are normalized to `None` during deserialization.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialProfile {
    #[serde(default, alias = "state", deserialize_with = "lenient_optional_text")]
    pub region: Option<String>,
    #[serde(default, alias = "experience", deserialize_with = "lenient_optional_text")]
    pub experience_level: Option<String>,
    #[serde(default, deserialize_with = "lenient_optional_text")]
    pub crop: Option<String>,
    #[serde(default, alias = "area", deserialize_with = "lenient_optional_area")]
    pub cultivated_area: Option<Decimal>,
}

/// Coerces a loosely-typed JSON value into a cultivated area.
///
/// Numbers and numeric strings are accepted. Negative, out-of-range, non-finite and
/// non-numeric values all coerce to zero.
pub fn coerce_area(value: &Value) -> Decimal {
    match value {
        Value::Number(number) => parse_area(&number.to_string()),
        Value::String(raw) => parse_area(raw),
        _ => Decimal::ZERO,
    }
}

pub fn parse_area(raw: &str) -> Decimal {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Decimal::ZERO;
    }

    let parsed = Decimal::from_str(trimmed).or_else(|_| Decimal::from_scientific(trimmed));
    match parsed {
        Ok(area) if area > Decimal::ZERO && area <= MAX_CULTIVATED_AREA => area.normalize(),
        _ => Decimal::ZERO,
    }
}

fn coerce_text(value: Value) -> String {
    match value {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        _ => String::new(),
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(coerce_text(Value::deserialize(deserializer)?))
}

fn lenient_optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = coerce_text(Value::deserialize(deserializer)?);
    Ok((!text.is_empty()).then_some(text))
}

fn lenient_area<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(coerce_area(&Value::deserialize(deserializer)?))
}

fn lenient_optional_area<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let area = coerce_area(&Value::deserialize(deserializer)?);
    Ok((area > Decimal::ZERO).then_some(area))
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::{coerce_area, PartialProfile, Profile, MAX_CULTIVATED_AREA};

    #[test]
    fn max_area_constant_is_one_trillion_acres() {
        assert_eq!(MAX_CULTIVATED_AREA, Decimal::new(1_000_000_000_000, 0));
    }

    #[test]
    fn area_coercion_accepts_numbers_and_numeric_strings() {
        assert_eq!(coerce_area(&json!(2)), Decimal::new(2, 0));
        assert_eq!(coerce_area(&json!(2.5)), Decimal::new(25, 1));
        assert_eq!(coerce_area(&json!(" 12.75 ")), Decimal::new(1275, 2));
        assert_eq!(coerce_area(&json!("1e2")), Decimal::new(100, 0));
    }

    #[test]
    fn area_coercion_zeroes_everything_else() {
        for value in [
            json!(null),
            json!("two acres"),
            json!(""),
            json!(-4),
            json!("-1.5"),
            json!(true),
            json!([1, 2]),
            json!({"acres": 3}),
            json!("NaN"),
            json!("1e40"),
        ] {
            assert_eq!(coerce_area(&value), Decimal::ZERO, "value {value} should coerce to zero");
        }
    }

    #[test]
    fn profile_accepts_camel_case_and_legacy_field_names() {
        let camel: Profile = serde_json::from_value(json!({
            "region": "Punjab",
            "experienceLevel": "Beginner",
            "crop": "rice",
            "cultivatedArea": "2"
        }))
        .expect("camelCase profile");
        let legacy: Profile = serde_json::from_value(json!({
            "state": "Punjab",
            "experience": "Beginner",
            "crop": "rice",
            "area": 2
        }))
        .expect("legacy profile");

        assert_eq!(camel, legacy);
        assert_eq!(camel.cultivated_area, Decimal::new(2, 0));
    }

    #[test]
    fn profile_tolerates_missing_and_wrongly_typed_fields() {
        let profile: Profile =
            serde_json::from_value(json!({ "crop": null, "area": "lots" })).expect("profile");

        assert_eq!(profile, Profile::default());
        assert!(!profile.has_crop());
        assert!(!profile.has_area());
    }

    #[test]
    fn profile_serializes_area_as_number() {
        let profile = Profile::new("Punjab", "Expert", "rice", Decimal::new(25, 1));
        let value = serde_json::to_value(&profile).expect("serialize");

        assert_eq!(value["cultivatedArea"], json!(2.5));
        assert_eq!(value["experienceLevel"], json!("Expert"));
    }

    #[test]
    fn partial_profile_normalizes_blank_fields_to_none() {
        let partial: PartialProfile = serde_json::from_value(json!({
            "state": "  ",
            "crop": "Wheat",
            "area": 0
        }))
        .expect("partial profile");

        assert_eq!(partial.region, None);
        assert_eq!(partial.crop.as_deref(), Some("Wheat"));
        assert_eq!(partial.experience_level, None);
        assert_eq!(partial.cultivated_area, None);
    }
}
