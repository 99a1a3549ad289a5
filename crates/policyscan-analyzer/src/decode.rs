//! Validation of raw completion answers.
//!
//! This is the only place that looks inside a model answer. Narrative answers
//! pass through unless they are the no-policy sentinel; structured answers
//! must carry every [`CategoryKey`] with an integer score in `1..=10` and a
//! string description, or decoding fails with a typed error.

use policyscan_core::{
    aggregate, CategoryKey, CompletionAnswer, PipelineError, PromptMode, ScanOutcome, ScoreDraft,
};
use serde_json::{Map, Value};

/// Sentence the model is told to answer with when there is no policy.
pub const NO_POLICY_SENTINEL: &str = "No privacy policy detected.";

const SCORE_RANGE: std::ops::RangeInclusive<i64> = 1..=10;

/// Decodes `answer` according to `mode`.
///
/// # Errors
///
/// Structured mode only:
/// - [`PipelineError::MalformedResponse`] if the answer is not JSON.
/// - [`PipelineError::SchemaViolation`] naming the first missing or invalid field.
pub fn decode(answer: &CompletionAnswer, mode: PromptMode) -> Result<ScanOutcome, PipelineError> {
    match mode {
        PromptMode::Narrative => Ok(decode_narrative(answer.as_str())),
        PromptMode::Structured => decode_structured(answer.as_str()),
    }
}

fn decode_narrative(text: &str) -> ScanOutcome {
    let head = text
        .trim()
        .trim_start_matches(|c: char| matches!(c, '"' | '\'' | '*' | '`' | '>'))
        .trim_start();
    if head.starts_with(NO_POLICY_SENTINEL) {
        return ScanOutcome::NotFound;
    }
    ScanOutcome::Narrative {
        text: text.to_string(),
    }
}

fn decode_structured(text: &str) -> Result<ScanOutcome, PipelineError> {
    let body = strip_code_fence(text.trim());
    let value: Value = serde_json::from_str(body)
        .map_err(|e| PipelineError::MalformedResponse(e.to_string()))?;

    let root = value.as_object().ok_or_else(|| {
        PipelineError::schema("$", format!("expected an object, got {}", kind(&value)))
    })?;

    // Every score is checked before any description.
    let scores = object_field(root, "scores")?;
    let mut validated = Vec::with_capacity(CategoryKey::ALL.len());
    for key in CategoryKey::ALL {
        validated.push((key, category_score(scores, key)?));
    }

    let descriptions = object_field(root, "description")?;
    let mut draft = ScoreDraft::default();
    for (key, score) in validated {
        draft.insert(key, score, category_description(descriptions, key)?);
    }

    Ok(ScanOutcome::Report {
        report: aggregate(draft),
    })
}

/// Unwraps a single surrounding markdown code fence, if present.
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let Some(inner) = rest.strip_suffix("```") else {
        return text;
    };
    // Drop an info string such as `json` on the opening fence line.
    match inner.split_once('\n') {
        Some((info, body)) if !info.trim_start().starts_with('{') => body.trim(),
        _ => inner.trim(),
    }
}

fn object_field<'a>(
    root: &'a Map<String, Value>,
    name: &str,
) -> Result<&'a Map<String, Value>, PipelineError> {
    match root.get(name) {
        Some(Value::Object(map)) => Ok(map),
        Some(other) => Err(PipelineError::schema(
            name,
            format!("expected an object, got {}", kind(other)),
        )),
        None => Err(PipelineError::schema(name, "missing")),
    }
}

fn category_score(scores: &Map<String, Value>, key: CategoryKey) -> Result<u8, PipelineError> {
    let field = format!("scores.{key}");
    let raw = match scores.get(key.as_str()) {
        None => return Err(PipelineError::schema(field, "missing")),
        Some(Value::Number(n)) => n.as_i64().ok_or_else(|| {
            PipelineError::schema(&field, format!("expected an integer 1-10, got {n}"))
        })?,
        Some(other) => {
            return Err(PipelineError::schema(
                field,
                format!("expected an integer 1-10, got {}", kind(other)),
            ))
        }
    };
    if !SCORE_RANGE.contains(&raw) {
        return Err(PipelineError::schema(field, format!("score {raw} is outside 1-10")));
    }
    u8::try_from(raw)
        .map_err(|_| PipelineError::schema(field, format!("score {raw} is outside 1-10")))
}

fn category_description(
    descriptions: &Map<String, Value>,
    key: CategoryKey,
) -> Result<String, PipelineError> {
    let field = format!("description.{key}");
    match descriptions.get(key.as_str()) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(PipelineError::schema(
            field,
            format!("expected a string, got {}", kind(other)),
        )),
        None => Err(PipelineError::schema(field, "missing")),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
#[path = "decode_test.rs"]
mod tests;
