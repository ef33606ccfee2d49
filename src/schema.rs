//! Model catalog fetched from the service's `/schema` endpoint.
//!
//! The document is decoded defensively: a model entry that is missing,
//! mistyped, or incomplete is dropped from the catalog (and logged) rather
//! than failing the whole fetch. Only an unparseable document is an error.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::fields;

/// The closed set of prediction models the service can host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    /// Churn via logistic regression.
    Logreg,
    /// Churn via decision tree.
    Dtree,
    /// Churn via support vector machine.
    Svm,
    /// Customer clustering via k-means.
    Kmeans,
    /// Sales value via linear regression.
    Linreg,
}

impl ModelKind {
    /// All kinds in their fixed display order.
    pub const ALL: [ModelKind; 5] = [
        ModelKind::Logreg,
        ModelKind::Dtree,
        ModelKind::Svm,
        ModelKind::Kmeans,
        ModelKind::Linreg,
    ];

    /// Canonical wire tag, as carried in `model_type`.
    pub fn tag(self) -> &'static str {
        match self {
            ModelKind::Logreg => "logreg",
            ModelKind::Dtree => "dtree",
            ModelKind::Svm => "svm",
            ModelKind::Kmeans => "kmeans",
            ModelKind::Linreg => "linreg",
        }
    }

    /// Key of this model's entry in the catalog document.
    pub fn catalog_key(self) -> &'static str {
        match self {
            ModelKind::Logreg => "logreg_churn",
            ModelKind::Dtree => "decision_tree_churn",
            ModelKind::Svm => "svm_churn",
            ModelKind::Kmeans => "kmeans_clusters",
            ModelKind::Linreg => "linreg_sales",
        }
    }

    /// Human-facing name for menus and summaries.
    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::Logreg => "Churn — Logistic Regression",
            ModelKind::Dtree => "Churn — Decision Tree",
            ModelKind::Svm => "Churn — SVM",
            ModelKind::Kmeans => "Clustering — KMeans",
            ModelKind::Linreg => "Sales — Linear Regression",
        }
    }

    /// Parse a wire tag back into a kind.
    pub fn from_tag(tag: &str) -> Option<ModelKind> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }

    /// Numeric fields that must be filled before this kind may be submitted.
    ///
    /// Linear regression predicts `total_value`, so that column is not an
    /// input for it. Every other kind requires the full numeric set.
    pub fn required_numeric_fields(self) -> &'static [&'static str] {
        match self {
            ModelKind::Linreg => &["price", "quantity", "age", "tenure_months"],
            _ => fields::NUMERIC_FIELDS,
        }
    }
}

/// One model's declaration in the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelEntry {
    /// Which model this entry describes.
    pub kind: ModelKind,
    /// Input field names in the server's declared order, deduplicated.
    pub required_fields: Vec<String>,
    /// Example feature values published alongside the entry, if any.
    pub example_features: Option<Map<String, Value>>,
    /// Free-form server notes about the model.
    pub notes: Option<String>,
}

/// Parsed `/schema` document. Immutable between refreshes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelCatalog {
    entries: Vec<ModelEntry>,
    cluster_labels: Option<BTreeMap<String, String>>,
}

/// Failure to parse the catalog document as a whole.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The response body was not a JSON document of the expected shape.
    #[error("Schema document could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    models: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    model_type: String,
    #[serde(default)]
    required_fields: Option<Vec<String>>,
    #[serde(default)]
    required_numeric_fields: Option<Vec<String>>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    example_payload: Option<RawExample>,
    #[serde(default)]
    example_payload_dict: Option<RawExample>,
    #[serde(default)]
    cluster_labels: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Deserialize)]
struct RawExample {
    #[serde(default)]
    features: Option<Value>,
}

impl ModelCatalog {
    /// Decode a `/schema` response body.
    pub fn parse(document: &[u8]) -> Result<Self, SchemaError> {
        let raw: RawDocument = serde_json::from_slice(document)?;
        let mut entries = Vec::new();
        let mut cluster_labels = None;
        for kind in ModelKind::ALL {
            let Some(value) = raw.models.get(kind.catalog_key()) else {
                continue;
            };
            match decode_entry(kind, value.clone()) {
                Ok((entry, labels)) => {
                    if kind == ModelKind::Kmeans {
                        cluster_labels = labels;
                    }
                    entries.push(entry);
                }
                Err(reason) => {
                    tracing::warn!(model = kind.tag(), %reason, "Dropping unusable catalog entry");
                }
            }
        }
        Ok(Self {
            entries,
            cluster_labels,
        })
    }

    /// Entry for `kind`, if the server declared that model.
    pub fn entry(&self, kind: ModelKind) -> Option<&ModelEntry> {
        self.entries.iter().find(|entry| entry.kind == kind)
    }

    /// Declared models in display order.
    pub fn available(&self) -> Vec<ModelKind> {
        self.entries.iter().map(|entry| entry.kind).collect()
    }

    /// True when the catalog declares no models at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Server-supplied cluster-id to label mapping for k-means, if any.
    pub fn cluster_labels(&self) -> Option<&BTreeMap<String, String>> {
        self.cluster_labels.as_ref()
    }
}

fn decode_entry(
    kind: ModelKind,
    value: Value,
) -> Result<(ModelEntry, Option<BTreeMap<String, String>>), String> {
    let raw: RawEntry =
        serde_json::from_value(value).map_err(|err| format!("entry shape: {err}"))?;
    if raw.model_type != kind.tag() {
        return Err(format!(
            "model_type '{}' does not match expected '{}'",
            raw.model_type,
            kind.tag()
        ));
    }

    let declared = if kind == ModelKind::Kmeans {
        raw.required_numeric_fields
    } else {
        raw.required_fields
    };
    let Some(declared) = declared else {
        return Err("missing required-field list".to_string());
    };
    if declared.is_empty() {
        return Err("empty required-field list".to_string());
    }
    let required_fields = dedup_preserving_order(declared);

    // The kmeans entry publishes its dict-form example under a distinct key.
    let example = match kind {
        ModelKind::Kmeans => raw.example_payload_dict.or(raw.example_payload),
        _ => raw.example_payload,
    };
    let example_features = example
        .and_then(|example| example.features)
        .and_then(|features| match features {
            Value::Object(map) => Some(map),
            _ => None,
        });

    Ok((
        ModelEntry {
            kind,
            required_fields,
            example_features,
            notes: raw.notes,
        },
        raw.cluster_labels,
    ))
}

fn dedup_preserving_order(names: Vec<String>) -> Vec<String> {
    let mut seen = Vec::with_capacity(names.len());
    for name in names {
        if !seen.contains(&name) {
            seen.push(name);
        }
    }
    seen
}
