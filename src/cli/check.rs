//! Evaluate filter expressions against a JSON context

use super::{CliError, parse_json};
use crate::{Engine, Value};

/// Options for the check command
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// The filter expression to evaluate
    pub expression: String,
    /// JSON context; an empty object when absent
    pub context: Option<String>,
    /// Only validate syntax, don't evaluate
    pub syntax_only: bool,
}

/// Result of a check operation
#[derive(Debug)]
pub enum CheckResult {
    /// Syntax validation passed
    SyntaxValid,
    /// Expression evaluated successfully
    Success(serde_json::Value),
}

/// Execute a check operation on a single-threaded runtime
pub fn execute_check(options: &CheckOptions) -> Result<CheckResult, CliError> {
    let engine = Engine::new();

    if options.syntax_only {
        engine.parse(&options.expression)?;
        return Ok(CheckResult::SyntaxValid);
    }

    let context = match &options.context {
        Some(json) => parse_json(json)?,
        None => Value::Object(Default::default()),
    };

    let runtime = tokio::runtime::Builder::new_current_thread().build()?;
    let result = runtime.block_on(engine.evaluate(&options.expression, &context))?;

    Ok(CheckResult::Success(result.to_json()))
}
