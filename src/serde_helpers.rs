//! Lenient deserializers for JSON coming from outside the crate.
//!
//! Imported template records and third-party market APIs are inconsistent about
//! whether numbers arrive as JSON numbers or strings, and whether lists arrive as
//! arrays or comma-separated text. These helpers accept both shapes.

use serde::{Deserialize, Deserializer, de::Error as _};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    Text(String),
}

/// Parses a decimal that may use a comma as decimal separator (`"10,50"`).
#[must_use]
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .parse::<f64>()
        .ok()
        .or_else(|| trimmed.replace(',', ".").parse::<f64>().ok())
}

/// Deserializes an `f64` from either a JSON number or a numeric string.
pub fn flexible_f64<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(value) => Ok(value),
        NumberOrString::Text(text) => parse_decimal(&text)
            .ok_or_else(|| D::Error::custom(format!("not a number: {text:?}"))),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TagsField {
    List(Vec<String>),
    Csv(String),
}

/// Deserializes optional tags from an array of strings or a comma-separated string.
///
/// Blank entries are dropped and an empty result becomes `None`.
pub fn flexible_tags<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<TagsField>::deserialize(deserializer)?;
    let tags: Vec<String> = match raw {
        None => return Ok(None),
        Some(TagsField::List(list)) => list,
        Some(TagsField::Csv(text)) => text.split(',').map(str::to_string).collect(),
    }
    .into_iter()
    .map(|tag| tag.trim().to_string())
    .filter(|tag| !tag.is_empty())
    .collect();

    Ok((!tags.is_empty()).then_some(tags))
}
