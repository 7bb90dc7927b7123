//! Conversion functions that turn a raw input line into a [`Value`].
//!
//! Every function here has the shape expected by
//! [`Prompt::converted_with`](crate::Prompt::converted_with), so they can be
//! passed directly when declaring command parameters.

use crate::value::Value;
use chrono::{NaiveDate, TimeDelta};
use regex::Regex;
use std::num::{ParseFloatError, ParseIntError};
use std::sync::LazyLock;
use thiserror::Error;

static TIME_DELTA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(\d+)w\s+)?(?:(\d+)d\s+)?(\d+):(\d+):(\d+)(?:\.(\d+))?$")
        .expect("time delta pattern is valid")
});

/// Boxed conversion function stored by a prompt.
pub type Conversion = Box<dyn Fn(&str) -> anyhow::Result<Value>>;

/// Input that a conversion function could not turn into a value.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("not an integer: '{input}'")]
    Integer {
        input: String,
        #[source]
        source: ParseIntError,
    },

    #[error("not a number: '{input}'")]
    Float {
        input: String,
        #[source]
        source: ParseFloatError,
    },

    #[error("not a yes/no answer: '{input}'")]
    Bool { input: String },

    #[error("not a date (yyyy-mm-dd): '{input}'")]
    Date { input: String },

    #[error("not a time delta (#w #d hh:mm:ss.micro): '{input}'")]
    TimeDelta { input: String },
}

impl ConversionError {
    /// The raw text that failed to convert.
    pub fn input(&self) -> &str {
        match self {
            Self::Integer { input, .. }
            | Self::Float { input, .. }
            | Self::Bool { input }
            | Self::Date { input }
            | Self::TimeDelta { input } => input,
        }
    }
}

/// Identity conversion: the line as entered.
pub fn text(input: &str) -> anyhow::Result<Value> {
    Ok(Value::Text(input.to_string()))
}

pub fn integer(input: &str) -> anyhow::Result<Value> {
    input
        .trim()
        .parse::<i64>()
        .map(Value::Integer)
        .map_err(|source| {
            ConversionError::Integer {
                input: input.to_string(),
                source,
            }
            .into()
        })
}

pub fn float(input: &str) -> anyhow::Result<Value> {
    input
        .trim()
        .parse::<f64>()
        .map(Value::Float)
        .map_err(|source| {
            ConversionError::Float {
                input: input.to_string(),
                source,
            }
            .into()
        })
}

/// Accepts `y`, `yes`, `true`, `1` and `n`, `no`, `false`, `0`, ignoring case.
pub fn boolean(input: &str) -> anyhow::Result<Value> {
    match input.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "true" | "1" => Ok(Value::Bool(true)),
        "n" | "no" | "false" | "0" => Ok(Value::Bool(false)),
        _ => Err(ConversionError::Bool {
            input: input.to_string(),
        }
        .into()),
    }
}

/// Parses `yyyy-mm-dd` into a calendar date.
pub fn date(input: &str) -> anyhow::Result<Value> {
    let invalid = || ConversionError::Date {
        input: input.to_string(),
    };

    let parts: Vec<&str> = input.trim().split('-').collect();
    if parts.len() != 3 {
        return Err(invalid().into());
    }

    let year = parts[0].trim().parse::<i32>().map_err(|_| invalid())?;
    let month = parts[1].trim().parse::<u32>().map_err(|_| invalid())?;
    let day = parts[2].trim().parse::<u32>().map_err(|_| invalid())?;

    NaiveDate::from_ymd_opt(year, month, day)
        .map(Value::Date)
        .ok_or_else(|| invalid().into())
}

/// Parses `[<weeks>w ][<days>d ]hh:mm:ss[.micro]` into a time delta.
///
/// The digits after the dot are a count of microseconds, so `.5` is five
/// microseconds rather than half a second.
pub fn time_delta(input: &str) -> anyhow::Result<Value> {
    let invalid = || ConversionError::TimeDelta {
        input: input.to_string(),
    };

    let caps = TIME_DELTA.captures(input.trim()).ok_or_else(invalid)?;
    let field = |i: usize| -> Result<i64, ConversionError> {
        match caps.get(i) {
            Some(m) => m.as_str().parse::<i64>().map_err(|_| invalid()),
            None => Ok(0),
        }
    };

    let parts = [
        TimeDelta::try_weeks(field(1)?),
        TimeDelta::try_days(field(2)?),
        TimeDelta::try_hours(field(3)?),
        TimeDelta::try_minutes(field(4)?),
        TimeDelta::try_seconds(field(5)?),
        Some(TimeDelta::microseconds(field(6)?)),
    ];

    parts
        .into_iter()
        .try_fold(TimeDelta::zero(), |acc, part| acc.checked_add(&part?))
        .map(Value::Duration)
        .ok_or_else(|| invalid().into())
}
