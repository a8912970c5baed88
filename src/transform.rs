//! Default transforms, applied with pipe syntax: `subject|name(args...)`.
//!
//! - `date` parses an ISO-8601 string into a date
//! - `stableSample(rate)` and `bucketSample(start, count, total)` sample inputs
//!   deterministically (see [`crate::sampling`])
//! - `keys`, `length`, `mapToProperty(name)` and `regExpMatch(pattern[, flags])`
//!   inspect collections and strings

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::RegexBuilder;

use crate::{error::EvalError, registry::Registry, sampling, value::Value};

pub(crate) fn register_defaults(registry: &mut Registry) {
    registry.add_transform("date", date);
    registry.add_transform("stableSample", stable_sample);
    registry.add_transform("bucketSample", bucket_sample);
    registry.add_transform("keys", keys);
    registry.add_transform("length", length);
    registry.add_transform("mapToProperty", map_to_property);
    registry.add_transform("regExpMatch", regexp_match);
}

fn invalid_args(name: &str, message: impl Into<String>) -> EvalError {
    EvalError::InvalidArguments {
        name: name.to_string(),
        message: message.into(),
    }
}

/// Parses RFC 3339 timestamps, `YYYY-MM-DDTHH:MM:SS[.fff]` (taken as UTC) and
/// plain `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// `"2017-01-01"|date`; integers are taken as milliseconds since the epoch.
fn date(subject: Value, _args: &[Value]) -> Result<Value, EvalError> {
    match subject {
        Value::Date(_) => Ok(subject),
        Value::String(s) => parse_date(&s)
            .map(Value::Date)
            .ok_or(EvalError::InvalidDate(s)),
        Value::Integer(ms) => DateTime::from_timestamp_millis(ms)
            .map(Value::Date)
            .ok_or_else(|| EvalError::InvalidDate(ms.to_string())),
        other => Err(EvalError::InvalidDate(format!(
            "cannot convert {} to a date",
            other.type_name()
        ))),
    }
}

/// `input|stableSample(rate)`
fn stable_sample(subject: Value, args: &[Value]) -> Result<Value, EvalError> {
    let rate = match args {
        [rate] => rate
            .as_float()
            .ok_or_else(|| invalid_args("stableSample", "rate must be a number"))?,
        _ => return Err(invalid_args("stableSample", "expected exactly one rate argument")),
    };
    Ok(Value::Boolean(sampling::stable_sample(&subject, rate)?))
}

/// `input|bucketSample(start, count, total)`
fn bucket_sample(subject: Value, args: &[Value]) -> Result<Value, EvalError> {
    let [start, count, total] = args else {
        return Err(invalid_args(
            "bucketSample",
            "expected start, count and total arguments",
        ));
    };
    let int = |v: &Value, what: &str| {
        v.as_int()
            .ok_or_else(|| invalid_args("bucketSample", format!("{} must be an integer", what)))
    };
    let sampled = sampling::bucket_sample(
        &subject,
        int(start, "start")?,
        int(count, "count")?,
        int(total, "total")?,
    )?;
    Ok(Value::Boolean(sampled))
}

/// Sorted keys of an object; null for anything else
fn keys(subject: Value, _args: &[Value]) -> Result<Value, EvalError> {
    match subject {
        Value::Object(map) => {
            let mut keys: Vec<String> = map.into_keys().collect();
            keys.sort();
            Ok(Value::Array(keys.into_iter().map(Value::String).collect()))
        }
        _ => Ok(Value::Null),
    }
}

/// Length of a string (in characters), array or object; null for anything else
fn length(subject: Value, _args: &[Value]) -> Result<Value, EvalError> {
    let len = match &subject {
        Value::String(s) => s.chars().count(),
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        _ => return Ok(Value::Null),
    };
    Ok(Value::Integer(len as i64))
}

/// `addons|mapToProperty("id")`
fn map_to_property(subject: Value, args: &[Value]) -> Result<Value, EvalError> {
    let [Value::String(property)] = args else {
        return Err(invalid_args("mapToProperty", "expected a property name"));
    };
    match subject {
        Value::Array(items) => Ok(Value::Array(
            items
                .into_iter()
                .map(|item| match item {
                    Value::Object(mut map) => map.remove(property).unwrap_or(Value::Null),
                    _ => Value::Null,
                })
                .collect(),
        )),
        other => Err(EvalError::TypeError(format!(
            "mapToProperty requires an array, got {}",
            other.type_name()
        ))),
    }
}

/// `s|regExpMatch(pattern[, flags])`
///
/// Returns the whole match followed by capture groups (unmatched groups are
/// null), or null when nothing matches. Flags: `i` case-insensitive, `m`
/// multi-line, `s` dot matches newline, `g` every whole match.
fn regexp_match(subject: Value, args: &[Value]) -> Result<Value, EvalError> {
    let (pattern, flags) = match args {
        [Value::String(p)] => (p, ""),
        [Value::String(p), Value::String(f)] => (p, f.as_str()),
        _ => return Err(invalid_args("regExpMatch", "expected a pattern and optional flags")),
    };
    let Value::String(haystack) = subject else {
        return Ok(Value::Null);
    };

    let regex = RegexBuilder::new(pattern)
        .case_insensitive(flags.contains('i'))
        .multi_line(flags.contains('m'))
        .dot_matches_new_line(flags.contains('s'))
        .build()
        .map_err(|e| EvalError::InvalidRegex(e.to_string()))?;

    if flags.contains('g') {
        let matches: Vec<Value> = regex
            .find_iter(&haystack)
            .map(|m| Value::String(m.as_str().to_string()))
            .collect();
        return Ok(if matches.is_empty() {
            Value::Null
        } else {
            Value::Array(matches)
        });
    }

    Ok(regex.captures(&haystack).map_or(Value::Null, |caps| {
        Value::Array(
            caps.iter()
                .map(|group| group.map_or(Value::Null, |m| Value::String(m.as_str().to_string())))
                .collect(),
        )
    }))
}
