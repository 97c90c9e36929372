use rust_decimal::{Decimal, RoundingStrategy};

/// Shown in place of a figure when no estimate was attempted.
pub const PLACEHOLDER: &str = "--";

/// Renders `value` with two decimal places and comma-grouped thousands.
pub fn group_thousands(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let mut magnitude = rounded.abs();
    magnitude.rescale(2);
    let rendered = magnitude.to_string();
    let (integer, fraction) = rendered.split_once('.').unwrap_or((rendered.as_str(), "00"));

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (index, digit) in integer.chars().enumerate() {
        if index > 0 && (integer.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    format!("{sign}{grouped}.{fraction}")
}

pub fn format_currency(symbol: &str, value: Decimal) -> String {
    format!("{symbol}{}", group_thousands(value))
}

pub fn format_tons(value: Decimal) -> String {
    format!("{} Tons", group_thousands(value))
}

/// Capitalizes the first letter of every word and lowercases the rest.
pub fn title_case(value: &str) -> String {
    let mut output = String::with_capacity(value.len());
    let mut at_word_start = true;

    for ch in value.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                output.extend(ch.to_uppercase());
            } else {
                output.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            output.push(ch);
            at_word_start = true;
        }
    }

    output
}
