//! Builds sanitized request payloads for the prediction endpoints.
//!
//! Whatever the input route (form fields, a raw JSON override, batch rows),
//! the output contract is the same: only declared fields survive, the
//! protected target field is stripped unconditionally, and the required
//! numeric fields must be present and non-empty before anything is sent.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::fields;
use crate::form::FormModel;
use crate::schema::{ModelEntry, ModelKind};

/// Body of `POST /predict`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestPayload {
    /// Canonical tag of the model the payload targets.
    pub model_type: String,
    /// Sanitized feature map; keys are a subset of the declared fields.
    pub features: Map<String, Value>,
}

/// Body of `POST /batch_predict`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchPayload {
    /// Canonical tag of the model the payload targets.
    pub model_type: String,
    /// One sanitized feature map per row.
    pub rows: Vec<Map<String, Value>>,
}

/// A built payload plus the keys that were dropped along the way.
///
/// Dropped keys are informational, not an error: submission proceeds
/// without them, but the caller should tell the user.
#[derive(Debug, Clone, PartialEq)]
pub struct PayloadOutcome {
    /// The request body, ready to submit.
    pub payload: RequestPayload,
    /// Undeclared keys that were removed from the input.
    pub ignored: Vec<String>,
}

/// A built batch payload plus the keys dropped from any row.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    /// The request body, ready to submit.
    pub payload: BatchPayload,
    /// Undeclared keys removed from rows, labelled with their row index.
    pub ignored: Vec<String>,
}

/// Reasons a payload cannot be built. None of these reach the network.
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    /// The override or batch input did not parse as JSON.
    #[error("Input is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    /// The raw override parsed, but is not a JSON object.
    #[error("Override must be a JSON object")]
    OverrideNotObject,
    /// Batch input must be a JSON array of objects.
    #[error("Batch input must be a JSON array of objects")]
    BatchShape,
    /// One or more required numeric fields are absent or empty.
    #[error("Missing required numeric fields: {}", .missing.join(", "))]
    MissingFields {
        /// The absent fields, in the model's declared order.
        missing: Vec<String>,
    },
    /// A batch row is missing required numeric fields.
    #[error("Row {row}: missing required numeric fields: {}", .missing.join(", "))]
    RowMissingFields {
        /// Zero-based index of the offending row.
        row: usize,
        /// The absent fields, in the model's declared order.
        missing: Vec<String>,
    },
}

/// Build a payload from the form alone.
pub fn build(form: &FormModel) -> Result<PayloadOutcome, PayloadError> {
    build_with_override(form, None)
}

/// Build a payload from the form, optionally shallow-merging a raw JSON
/// object over it. Override values win; undeclared keys are dropped and
/// reported back rather than rejected.
pub fn build_with_override(
    form: &FormModel,
    override_json: Option<&str>,
) -> Result<PayloadOutcome, PayloadError> {
    let mut features = form.to_feature_map();
    if let Some(text) = override_json {
        let parsed: Value = serde_json::from_str(text)?;
        let Value::Object(overrides) = parsed else {
            return Err(PayloadError::OverrideNotObject);
        };
        for (key, value) in overrides {
            features.insert(key, value);
        }
    }

    let mut ignored = Vec::new();
    sanitize(&mut features, form, &mut ignored, None);

    let missing = missing_numeric_fields(form.kind(), &features);
    if !missing.is_empty() {
        return Err(PayloadError::MissingFields { missing });
    }

    Ok(PayloadOutcome {
        payload: RequestPayload {
            model_type: form.kind().tag().to_string(),
            features,
        },
        ignored,
    })
}

/// Build a batch payload from a raw JSON array of feature objects,
/// applying the single-payload sanitation and validation to every row.
pub fn build_batch(entry: &ModelEntry, rows_json: &str) -> Result<BatchOutcome, PayloadError> {
    let parsed: Value = serde_json::from_str(rows_json)?;
    let Value::Array(raw_rows) = parsed else {
        return Err(PayloadError::BatchShape);
    };

    let mut rows = Vec::with_capacity(raw_rows.len());
    let mut ignored = Vec::new();
    for (index, raw_row) in raw_rows.into_iter().enumerate() {
        let Value::Object(mut features) = raw_row else {
            return Err(PayloadError::BatchShape);
        };
        sanitize_against(&mut features, &entry.required_fields, &mut ignored, Some(index));
        let missing = missing_numeric_fields(entry.kind, &features);
        if !missing.is_empty() {
            return Err(PayloadError::RowMissingFields {
                row: index,
                missing,
            });
        }
        rows.push(features);
    }

    Ok(BatchOutcome {
        payload: BatchPayload {
            model_type: entry.kind.tag().to_string(),
            rows,
        },
        ignored,
    })
}

fn sanitize(
    features: &mut Map<String, Value>,
    form: &FormModel,
    ignored: &mut Vec<String>,
    row: Option<usize>,
) {
    let declared: Vec<&str> = form.fields().iter().map(|field| field.name.as_str()).collect();
    sanitize_keys(features, &declared, ignored, row);
}

fn sanitize_against(
    features: &mut Map<String, Value>,
    declared: &[String],
    ignored: &mut Vec<String>,
    row: Option<usize>,
) {
    let declared: Vec<&str> = declared.iter().map(String::as_str).collect();
    sanitize_keys(features, &declared, ignored, row);
}

fn sanitize_keys(
    features: &mut Map<String, Value>,
    declared: &[&str],
    ignored: &mut Vec<String>,
    row: Option<usize>,
) {
    // The prediction target never travels, and is not worth reporting.
    features.remove(fields::PROTECTED_FIELD);

    let unknown: Vec<String> = features
        .keys()
        .filter(|key| !declared.contains(&key.as_str()))
        .cloned()
        .collect();
    for key in unknown {
        features.remove(&key);
        match row {
            Some(index) => ignored.push(format!("row {index}: {key}")),
            None => ignored.push(key),
        }
    }
}

fn missing_numeric_fields(kind: ModelKind, features: &Map<String, Value>) -> Vec<String> {
    kind.required_numeric_fields()
        .iter()
        .filter(|name| is_unset(features.get(**name)))
        .map(|name| name.to_string())
        .collect()
}

fn is_unset(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.is_empty(),
        Some(_) => false,
    }
}
