//! Turns raw prediction responses into display-ready summaries.
//!
//! `present` is a pure mapping from a tagged response to a summary value;
//! rendering to text happens in the `Display` impl so the terminal loop
//! stays free of interpretation logic.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use crate::client::PredictionResult;
use crate::schema::ModelKind;

/// Cluster labels assumed when the catalog supplies none.
const DEFAULT_CLUSTER_LABELS: [(&str, &str); 3] = [
    ("0", "Low Spenders"),
    ("1", "Mid Spenders"),
    ("2", "High Spenders"),
];

const PROBABILITY_BAR_WIDTH: usize = 20;

/// Binary churn outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChurnVerdict {
    /// The customer is predicted to stay.
    Stay,
    /// The customer is predicted to churn.
    Churn,
}

impl ChurnVerdict {
    /// Human-facing label.
    pub fn label(self) -> &'static str {
        match self {
            ChurnVerdict::Stay => "Stay",
            ChurnVerdict::Churn => "Churn",
        }
    }
}

/// Presentation-neutral view of one prediction response.
#[derive(Debug, Clone, PartialEq)]
pub enum Summary {
    /// A k-means cluster assignment.
    Cluster {
        /// Cluster id from the response.
        id: i64,
        /// Resolved segment label.
        label: String,
    },
    /// A regression estimate.
    Sales {
        /// Raw predicted value.
        value: f64,
        /// Zero-decimal currency rendering of the value.
        formatted: String,
    },
    /// A churn classification.
    Churn {
        /// Stay or churn.
        verdict: ChurnVerdict,
        /// Churn probability clamped to [0, 1], when the model reports one.
        probability: Option<f64>,
    },
    /// The response carried no recognizable model tag.
    Nothing,
}

/// Map a response to its summary. Unknown or missing tags yield
/// [`Summary::Nothing`]; that is "nothing to show", not an error.
pub fn present(
    result: &PredictionResult,
    cluster_labels: Option<&BTreeMap<String, String>>,
) -> Summary {
    let Some(kind) = result.model_kind() else {
        return Summary::Nothing;
    };
    match kind {
        ModelKind::Kmeans => {
            let id = result
                .0
                .get("prediction_cluster")
                .and_then(Value::as_i64)
                .unwrap_or(0);
            Summary::Cluster {
                id,
                label: resolve_cluster_label(id, cluster_labels),
            }
        }
        ModelKind::Linreg => {
            let value = result
                .0
                .get("predicted_sales_value")
                .and_then(Value::as_f64)
                .unwrap_or(0.0);
            Summary::Sales {
                value,
                formatted: format_currency(value),
            }
        }
        ModelKind::Logreg | ModelKind::Dtree | ModelKind::Svm => {
            let churned = result.0.get("prediction").and_then(Value::as_i64) == Some(1);
            let probability = result
                .0
                .get("probability_of_churn")
                .and_then(Value::as_f64)
                .map(clamp01);
            Summary::Churn {
                verdict: if churned {
                    ChurnVerdict::Churn
                } else {
                    ChurnVerdict::Stay
                },
                probability,
            }
        }
    }
}

fn resolve_cluster_label(id: i64, labels: Option<&BTreeMap<String, String>>) -> String {
    let key = id.to_string();
    let fallback = || format!("Cluster {id}");
    match labels {
        Some(labels) => labels.get(&key).cloned().unwrap_or_else(fallback),
        None => DEFAULT_CLUSTER_LABELS
            .iter()
            .find(|(candidate, _)| *candidate == key)
            .map(|(_, label)| (*label).to_string())
            .unwrap_or_else(fallback),
    }
}

fn clamp01(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Zero-decimal currency with manual thousands grouping.
fn format_currency(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (offset, digit) in digits.chars().enumerate() {
        if offset > 0 && (digits.len() - offset) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    let sign = if rounded < 0 { "-" } else { "" };
    format!("{sign}${grouped}")
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Summary::Cluster { id, label } => {
                write!(f, "Segment: {label} (cluster #{id})")
            }
            Summary::Sales { formatted, .. } => write!(f, "Predicted sales: {formatted}"),
            Summary::Churn {
                verdict,
                probability,
            } => {
                write!(f, "Prediction: {}", verdict.label())?;
                match probability {
                    Some(probability) => {
                        let filled = (probability * PROBABILITY_BAR_WIDTH as f64).round() as usize;
                        write!(
                            f,
                            "\nChurn probability: {:.1}% [{}{}]",
                            probability * 100.0,
                            "#".repeat(filled),
                            "-".repeat(PROBABILITY_BAR_WIDTH - filled),
                        )
                    }
                    None => write!(f, "\nProbability not available for this model."),
                }
            }
            Summary::Nothing => write!(f, "Nothing to show."),
        }
    }
}
