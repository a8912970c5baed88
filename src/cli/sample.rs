//! Run the sampling primitives directly

use super::{CliError, parse_json};
use crate::sampling;

pub fn execute_fraction_to_key(fraction: f64) -> Result<String, CliError> {
    Ok(sampling::fraction_to_key(fraction)?)
}

pub fn execute_stable_sample(input: &str, rate: f64) -> Result<bool, CliError> {
    let input = parse_json(input)?;
    Ok(sampling::stable_sample(&input, rate)?)
}

pub fn execute_bucket_sample(
    input: &str,
    start: i64,
    count: i64,
    total: i64,
) -> Result<bool, CliError> {
    let input = parse_json(input)?;
    Ok(sampling::bucket_sample(&input, start, count, total)?)
}
