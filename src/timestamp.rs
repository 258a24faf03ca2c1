//! Canonical timestamp rendering for outbound requests.
//!
//! Toggl accepts RFC 3339 timestamps with second precision. Inputs arrive as
//! calendar dates, offset-aware date-times, or strings that are already in
//! (roughly) canonical form. All three are rendered the same way: a zero offset
//! becomes `Z`, any other offset is kept as given.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::error::{Result, TogglError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimestampInput {
    /// Expanded to midnight UTC.
    Date(NaiveDate),
    DateTime(DateTime<FixedOffset>),
    Text(String),
}

impl From<NaiveDate> for TimestampInput {
    fn from(value: NaiveDate) -> Self {
        TimestampInput::Date(value)
    }
}

impl From<NaiveDateTime> for TimestampInput {
    fn from(value: NaiveDateTime) -> Self {
        TimestampInput::DateTime(value.and_utc().fixed_offset())
    }
}

impl From<DateTime<FixedOffset>> for TimestampInput {
    fn from(value: DateTime<FixedOffset>) -> Self {
        TimestampInput::DateTime(value)
    }
}

impl From<DateTime<Utc>> for TimestampInput {
    fn from(value: DateTime<Utc>) -> Self {
        TimestampInput::DateTime(value.fixed_offset())
    }
}

impl From<DateTime<Local>> for TimestampInput {
    fn from(value: DateTime<Local>) -> Self {
        TimestampInput::DateTime(value.fixed_offset())
    }
}

impl From<&str> for TimestampInput {
    fn from(value: &str) -> Self {
        TimestampInput::Text(value.to_string())
    }
}

impl From<String> for TimestampInput {
    fn from(value: String) -> Self {
        TimestampInput::Text(value)
    }
}

/// Only JSON strings can carry a timestamp. Raw epochs are rejected.
impl TryFrom<&Value> for TimestampInput {
    type Error = TogglError;

    fn try_from(value: &Value) -> Result<Self> {
        match value {
            Value::String(text) => Ok(TimestampInput::Text(text.clone())),
            Value::Number(number) => Err(TogglError::invalid(format!(
                "cannot format number {number} as a timestamp"
            ))),
            other => Err(TogglError::invalid(format!(
                "cannot format {other} as a timestamp"
            ))),
        }
    }
}

/// Renders `value` in the canonical wire format.
pub fn format(value: impl Into<TimestampInput>) -> Result<String> {
    let parsed = parse(&value.into())?;
    Ok(render(&parsed))
}

pub fn format_value(value: &Value) -> Result<String> {
    format(TimestampInput::try_from(value)?)
}

pub fn parse(value: &TimestampInput) -> Result<DateTime<FixedOffset>> {
    match value {
        TimestampInput::Date(date) => Ok(midnight_utc(*date)),
        TimestampInput::DateTime(datetime) => Ok(*datetime),
        TimestampInput::Text(text) => parse_text(text),
    }
}

pub fn render(value: &DateTime<FixedOffset>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// True when both strings denote the same instant, whatever their offsets.
pub fn same_moment(left: &str, right: &str) -> Result<bool> {
    Ok(parse_text(left)? == parse_text(right)?)
}

fn parse_text(text: &str) -> Result<DateTime<FixedOffset>> {
    let trimmed = text.trim();

    // -00:00 carries no offset information; read it as UTC.
    let normalized = match trimmed.strip_suffix("-00:00") {
        Some(head) => format!("{head}+00:00"),
        None => trimmed.to_string(),
    };

    if let Ok(datetime) = DateTime::parse_from_rfc3339(&normalized) {
        return Ok(datetime);
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S") {
        return Ok(naive.and_utc().fixed_offset());
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(midnight_utc(date));
    }

    Err(TogglError::invalid(format!("not a valid timestamp: {text:?}")))
}

fn midnight_utc(date: NaiveDate) -> DateTime<FixedOffset> {
    date.and_time(NaiveTime::default()).and_utc().fixed_offset()
}
