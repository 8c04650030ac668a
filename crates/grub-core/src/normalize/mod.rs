//! Response normalizer: untrusted completion text in, validated [`PlanSet`] out.
//!
//! Stages:
//! 1. [`extract::object_span`] cuts the greedy `{ ... }` span out of the raw
//!    text, discarding prose and code fences.
//! 2. [`repair::repair`] strips comments, trailing commas and quotes bare keys.
//! 3. The repaired text is parsed with `serde_json`.
//! 4. [`schema`] validates the top-level shape and coerces every day and meal.
//!
//! Stages 1-3 are shared by every AI-backed feature through [`recover_json`].

pub mod extract;
pub mod repair;
pub mod schema;

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::plan::{MealPlan, PlanSet};

/// Why a completion could not be turned into JSON at all.
#[derive(Debug, Error)]
pub enum MalformedReason {
    #[error("no JSON object found in completion")]
    NoObject,

    #[error("repaired JSON still fails to parse: {0}")]
    Unparseable(#[source] serde_json::Error),
}

/// Why parsed JSON is structurally unusable.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaViolation {
    #[error("top-level JSON value is not an object")]
    NotAnObject,

    #[error("`plans` is not an array")]
    PlansNotArray,

    #[error("object has neither `plans` nor any weekday key")]
    UnrecognizedShape,

    #[error("no plan contains a valid meal")]
    EmptyAfterCoercion,

    #[error("missing or invalid field `{0}`")]
    InvalidField(&'static str),

    #[error("`{0}` contains no usable entries")]
    NoEntries(&'static str),
}

/// Errors from normalizing an AI reply.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("malformed completion: {0}")]
    Malformed(#[from] MalformedReason),

    #[error("schema error: {0}")]
    Schema(#[from] SchemaViolation),
}

impl NormalizeError {
    /// Stable machine-readable kind, used in HTTP error bodies and CLI output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "malformed_response",
            Self::Schema(_) => "schema_error",
        }
    }
}

/// Recover a JSON document from raw completion text.
///
/// Fails with [`MalformedReason::NoObject`] when there is no `{ ... }` span
/// and with [`MalformedReason::Unparseable`] when the repaired span is still
/// not valid JSON.
pub fn recover_json(raw: &str) -> Result<Value, NormalizeError> {
    let span = extract::object_span(raw).ok_or(MalformedReason::NoObject)?;
    let repaired = repair::repair(span);
    if repaired != span {
        debug!(
            before = span.len(),
            after = repaired.len(),
            "applied textual repairs to completion"
        );
    }
    serde_json::from_str(&repaired).map_err(|e| MalformedReason::Unparseable(e).into())
}

/// Normalize a raw completion into a validated [`PlanSet`].
pub fn normalize(raw: &str) -> Result<PlanSet, NormalizeError> {
    let value = recover_json(raw)?;
    schema::plan_set_from_value(&value)
}

/// Validate a client-supplied plan document with the same coercion rules.
pub fn validate_plan(value: &Value) -> Result<MealPlan, NormalizeError> {
    schema::plan_from_value(value)
}
