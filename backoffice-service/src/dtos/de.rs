//! Lenient field deserializers for console payloads and query strings.
//!
//! The admin console sends numbers as strings, leaves unset fields as `""`
//! and mixes JSON numbers in between. Every helper here treats an empty
//! string as absent.

use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;
use serde::de::{Deserialize, Deserializer, Error};
use std::str::FromStr;
use uuid::Uuid;

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum Loose {
    Text(String),
    Number(serde_json::Number),
    Flag(bool),
}

impl Loose {
    /// Trimmed text form, `None` when blank.
    fn into_text(self) -> Option<String> {
        let text = match self {
            Loose::Text(s) => s.trim().to_string(),
            Loose::Number(n) => n.to_string(),
            Loose::Flag(b) => b.to_string(),
        };
        if text.is_empty() { None } else { Some(text) }
    }
}

fn loose_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<Loose>::deserialize(d)?.and_then(Loose::into_text))
}

pub fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

pub fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
}

pub fn opt_decimal<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Decimal>, D::Error> {
    match loose_text(d)? {
        None => Ok(None),
        Some(text) => parse_decimal(&text)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid decimal: {}", text))),
    }
}

/// Quantities left blank by the console count as zero.
pub fn decimal_or_zero<'de, D: Deserializer<'de>>(d: D) -> Result<Decimal, D::Error> {
    Ok(opt_decimal(d)?.unwrap_or(Decimal::ZERO))
}

pub fn opt_uuid<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Uuid>, D::Error> {
    match loose_text(d)? {
        None => Ok(None),
        Some(text) => Uuid::parse_str(&text)
            .map(Some)
            .map_err(|_| D::Error::custom(format!("invalid id: {}", text))),
    }
}

pub fn opt_date<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
    match loose_text(d)? {
        None => Ok(None),
        Some(text) => parse_date(&text)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid date: {}", text))),
    }
}

pub fn opt_i32<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i32>, D::Error> {
    match loose_text(d)? {
        None => Ok(None),
        Some(text) => text
            .parse::<i32>()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("invalid integer: {}", text))),
    }
}

pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    loose_text(d)
}

pub fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    match loose_text(d)? {
        None => Ok(false),
        Some(text) => match text.to_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(D::Error::custom(format!("invalid flag: {}", text))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "opt_decimal")]
        amount: Option<Decimal>,
        #[serde(default, deserialize_with = "decimal_or_zero")]
        qty: Decimal,
        #[serde(default, deserialize_with = "opt_uuid")]
        id: Option<Uuid>,
        #[serde(default, deserialize_with = "opt_date")]
        date: Option<NaiveDate>,
        #[serde(default, deserialize_with = "flag")]
        with_date: bool,
    }

    #[test]
    fn blank_strings_are_absent() {
        let sample: Sample = serde_json::from_str(
            r#"{"amount": "", "qty": "", "id": "", "date": "", "with_date": ""}"#,
        )
        .unwrap();
        assert_eq!(sample.amount, None);
        assert!(sample.qty.is_zero());
        assert_eq!(sample.id, None);
        assert_eq!(sample.date, None);
        assert!(!sample.with_date);
    }

    #[test]
    fn numbers_and_strings_both_parse() {
        let sample: Sample = serde_json::from_str(
            r#"{"amount": 12.5, "qty": "3", "date": "2024-05-31", "with_date": true}"#,
        )
        .unwrap();
        assert_eq!(sample.amount, Some(Decimal::new(125, 1)));
        assert_eq!(sample.qty, Decimal::from(3));
        assert_eq!(sample.date, NaiveDate::from_ymd_opt(2024, 5, 31));
        assert!(sample.with_date);
    }

    #[test]
    fn query_strings_parse() {
        let uri: axum::http::Uri = "/expenses?amount=400&with_date=true&date=&id="
            .parse()
            .unwrap();
        let axum::extract::Query(sample) =
            axum::extract::Query::<Sample>::try_from_uri(&uri).unwrap();
        assert_eq!(sample.amount, Some(Decimal::from(400)));
        assert!(sample.with_date);
        assert_eq!(sample.date, None);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(serde_json::from_str::<Sample>(r#"{"amount": "ten"}"#).is_err());
        assert!(serde_json::from_str::<Sample>(r#"{"id": "not-a-uuid"}"#).is_err());
    }
}
