//! Deterministic, hash-based population sampling.
//!
//! An input is serialized canonically and hashed with SHA-256. The digest, as
//! 64 lowercase hex characters, is compared against a key derived from the
//! sampling rate. Fixed-width zero-padded hex strings order the same way as
//! the numbers they encode, so raising the rate only ever admits more inputs.

use std::fmt::Write;

use num_bigint::BigUint;
use sha2::{Digest, Sha256};

use crate::{error::RangeError, value::Value};

pub const HASH_BITS: usize = 256;
/// Hex characters in a key or digest
pub const HASH_LENGTH: usize = HASH_BITS / 4;

/// Maps `frac` linearly onto the hash space: `floor(frac * (2^256 - 1))` as
/// 64 lowercase hex characters.
///
/// # Examples
///
/// ```
/// use recipe_filter::sampling::fraction_to_key;
///
/// assert_eq!(fraction_to_key(0.0).unwrap(), "0".repeat(64));
/// assert_eq!(fraction_to_key(1.0).unwrap(), "f".repeat(64));
/// assert!(fraction_to_key(1.5).is_err());
/// ```
pub fn fraction_to_key(frac: f64) -> Result<String, RangeError> {
    if !(0.0..=1.0).contains(&frac) {
        return Err(RangeError::FractionOutOfRange(frac));
    }

    let max = (BigUint::from(1u8) << HASH_BITS) - 1u8;
    let hex = scale(&max, frac).to_str_radix(16);

    if hex.len() > HASH_LENGTH {
        // Not reachable with exact arithmetic; kept so the key never widens.
        log::warn!("key for fraction {} overflowed the hash width", frac);
        return Ok("f".repeat(HASH_LENGTH));
    }
    Ok(format!("{:0>width$}", hex, width = HASH_LENGTH))
}

/// `floor(max * frac)` computed exactly from the binary form of `frac`.
fn scale(max: &BigUint, frac: f64) -> BigUint {
    if frac == 0.0 {
        return BigUint::default();
    }
    let bits = frac.to_bits();
    let exponent = ((bits >> 52) & 0x7ff) as i64;
    let fraction = bits & ((1u64 << 52) - 1);
    // frac == mantissa / 2^shift, and shift >= 52 because frac <= 1
    let (mantissa, shift) = if exponent == 0 {
        (fraction, 1074)
    } else {
        (fraction | (1u64 << 52), 1075 - exponent)
    };
    (max * mantissa) >> (shift as usize)
}

/// SHA-256 of the canonical serialization of `input`, as lowercase hex.
pub fn input_hash(input: &Value) -> String {
    let mut serialized = String::new();
    write_canonical(input, &mut serialized);
    format!("{:x}", Sha256::digest(serialized.as_bytes()))
}

/// Whether `input` falls within a stable sample of `rate` (in `[0, 1]`).
///
/// The same input always gets the same answer for the same rate, and an
/// input sampled at some rate is also sampled at every higher rate.
///
/// # Examples
///
/// ```
/// use recipe_filter::{Value, sampling::stable_sample};
///
/// let input = Value::Array(vec![Value::from("test-1")]);
/// assert!(stable_sample(&input, 0.5).unwrap());
/// assert!(!stable_sample(&input, 0.0).unwrap());
/// ```
pub fn stable_sample(input: &Value, rate: f64) -> Result<bool, RangeError> {
    let hash = input_hash(input);
    let sample_point = fraction_to_key(rate)?;
    check_length(&hash)?;
    check_length(&sample_point)?;
    Ok(hash < sample_point)
}

/// Whether `input` falls within `count` consecutive buckets starting at
/// `start`, out of `total` equal buckets covering the hash space.
///
/// The range wraps around: with `total = 10`, `start = 8` and `count = 5` the
/// buckets are 8, 9, 0, 1 and 2. A non-positive `count` matches nothing.
pub fn bucket_sample(input: &Value, start: i64, count: i64, total: i64) -> Result<bool, RangeError> {
    if total <= 0 {
        return Err(RangeError::InvalidBucketTotal(total));
    }
    if count <= 0 {
        return Ok(false);
    }

    let hash = input_hash(input);
    check_length(&hash)?;

    let wrapped_start = start.rem_euclid(total);
    let end = wrapped_start.saturating_add(count);

    if end > total {
        Ok(in_bucket(&hash, 0, end % total, total)?
            || in_bucket(&hash, wrapped_start, total, total)?)
    } else {
        in_bucket(&hash, wrapped_start, end, total)
    }
}

/// Half-open test `key(min/total) <= hash < key(max/total)`.
fn in_bucket(hash: &str, min_bucket: i64, max_bucket: i64, total: i64) -> Result<bool, RangeError> {
    let min_hash = fraction_to_key(min_bucket as f64 / total as f64)?;
    let max_hash = fraction_to_key(max_bucket as f64 / total as f64)?;
    check_length(&min_hash)?;
    check_length(&max_hash)?;
    Ok(min_hash.as_str() <= hash && hash < max_hash.as_str())
}

fn check_length(hex: &str) -> Result<(), RangeError> {
    if hex.len() != HASH_LENGTH {
        return Err(RangeError::InvalidHashLength(hex.to_string()));
    }
    Ok(())
}

/// Stable JSON rendering: object keys sorted, non-finite numbers as `null`,
/// dates as RFC 3339 strings. Numbers are written the way `JSON.stringify`
/// writes them, so whole floats lose their fraction and magnitudes outside
/// `[1e-6, 1e21)` switch to exponent form.
fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Boolean(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Integer(n) => {
            let _ = write!(out, "{}", n);
        }
        Value::Float(n) if !n.is_finite() => out.push_str("null"),
        Value::Float(n) if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 => {
            let _ = write!(out, "{}", *n as i64);
        }
        Value::Float(n) => write_float(*n, out),
        Value::String(s) => write_string(s, out),
        Value::Date(_) => write_string(&value.as_string(), out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(key, out);
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
    }
}

fn write_float(n: f64, out: &mut String) {
    let magnitude = n.abs();
    if (1e-6..1e21).contains(&magnitude) {
        let _ = write!(out, "{}", n);
        return;
    }
    // `{:e}` yields the same shortest digits but omits the `+` on positive exponents
    let formatted = format!("{:e}", n);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            let _ = write!(out, "{}e+{}", mantissa, exponent);
        }
        _ => out.push_str(&formatted),
    }
}

fn write_string(s: &str, out: &mut String) {
    out.push_str(&serde_json::Value::String(s.to_string()).to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn canonical(value: serde_json::Value) -> String {
        let mut out = String::new();
        write_canonical(&Value::from(value), &mut out);
        out
    }

    #[test]
    fn test_fraction_to_key_bounds() {
        assert_eq!(fraction_to_key(0.0).unwrap(), "0".repeat(64));
        assert_eq!(fraction_to_key(1.0).unwrap(), "f".repeat(64));
        assert_eq!(
            fraction_to_key(0.5).unwrap(),
            format!("7{}", "f".repeat(63))
        );
        assert_eq!(
            fraction_to_key(0.25).unwrap(),
            format!("3{}", "f".repeat(63))
        );
    }

    #[test]
    fn test_fraction_to_key_rejects_out_of_range() {
        assert_eq!(
            fraction_to_key(-0.1),
            Err(RangeError::FractionOutOfRange(-0.1))
        );
        assert!(fraction_to_key(1.0000001).is_err());
        assert!(fraction_to_key(f64::NAN).is_err());
    }

    #[test]
    fn test_fraction_to_key_is_fixed_width_and_ordered() {
        let mut previous = fraction_to_key(0.0).unwrap();
        for i in 1..=100 {
            let key = fraction_to_key(i as f64 / 100.0).unwrap();
            assert_eq!(key.len(), HASH_LENGTH);
            assert!(key > previous, "key for {} not above previous", i);
            previous = key;
        }
        let tiny = fraction_to_key(f64::MIN_POSITIVE).unwrap();
        assert_eq!(tiny.len(), HASH_LENGTH);
    }

    #[test]
    fn test_canonical_serialization() {
        assert_eq!(canonical(json!(["test-1"])), r#"["test-1"]"#);
        assert_eq!(canonical(json!({"b": 1, "a": [true, null]})), r#"{"a":[true,null],"b":1}"#);
        assert_eq!(canonical(json!(1.0)), "1");
        assert_eq!(canonical(json!(1.5)), "1.5");
        assert_eq!(canonical(json!(-0.0)), "0");
        assert_eq!(canonical(json!("quote\"d")), r#""quote\"d""#);
    }

    #[test]
    fn test_canonical_numbers_match_json_stringify() {
        let test_cases = vec![
            (json!([1e21]), "[1e+21]"),
            (json!([1.5e25]), "[1.5e+25]"),
            (json!([1e20]), "[100000000000000000000]"),
            (json!([1e-7]), "[1e-7]"),
            (json!([-2.5e-8]), "[-2.5e-8]"),
            (json!([0.000001]), "[0.000001]"),
            (json!([123.456]), "[123.456]"),
        ];

        for (input, expected) in test_cases {
            assert_eq!(canonical(input.clone()), expected, "Failed for: {}", input);
        }
    }

    #[test]
    fn test_input_hash() {
        let input = Value::Array(vec![Value::from("test-1")]);
        assert_eq!(
            input_hash(&input),
            "292cf0ed1b11d678fb059041de459aa678f81f7bef20cbceb8a0517532261539"
        );
    }

    #[test]
    fn test_bucket_sample_rejects_empty_total() {
        assert_eq!(
            bucket_sample(&Value::Null, 0, 1, 0),
            Err(RangeError::InvalidBucketTotal(0))
        );
        assert_eq!(bucket_sample(&Value::Null, 0, 0, 10), Ok(false));
    }
}
