//! Form state for the currently selected model.
//!
//! A form is rebuilt wholesale whenever the selected model changes; field
//! order always mirrors the catalog's declared order, since payloads and
//! presets iterate the same sequence.

use std::collections::BTreeMap;

use serde_json::{Map, Number, Value};

use crate::fields::{self, ValueKind};
use crate::schema::{ModelCatalog, ModelEntry, ModelKind};

/// A single input field derived from the catalog and the static tables.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Field name as declared by the catalog.
    pub name: String,
    /// How raw input for this field is interpreted.
    pub kind: ValueKind,
}

/// Editable input state for one model kind.
#[derive(Debug, Clone, PartialEq)]
pub struct FormModel {
    kind: ModelKind,
    fields: Vec<FieldDescriptor>,
    values: BTreeMap<String, String>,
}

/// Rejected form operations.
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    /// The catalog does not declare the requested model.
    #[error("Model '{}' is not available in the fetched catalog", .kind.tag())]
    ModelUnavailable {
        /// The kind that was requested.
        kind: ModelKind,
    },
    /// The named field is not part of the current form.
    #[error("'{0}' is not a field of the current form")]
    UnknownField(String),
    /// A numeric field was given input that does not parse as a number.
    #[error("'{value}' is not a number (field '{field}' is numeric)")]
    InvalidNumber {
        /// The numeric field being edited.
        field: String,
        /// The rejected raw input.
        value: String,
    },
}

impl FormModel {
    /// Derive an empty form for `kind` from the catalog's declared fields.
    pub fn build(kind: ModelKind, catalog: &ModelCatalog) -> Result<Self, FormError> {
        let entry = catalog
            .entry(kind)
            .ok_or(FormError::ModelUnavailable { kind })?;
        Ok(Self::from_entry(entry))
    }

    pub(crate) fn from_entry(entry: &ModelEntry) -> Self {
        let fields = entry
            .required_fields
            .iter()
            .map(|name| {
                let kind = fields::value_kind_of(name);
                if kind == ValueKind::FreeText {
                    // Not in the fixed tables; the permissive fallback is
                    // unverified for future fields, so make it visible.
                    tracing::warn!(field = %name, "Unclassified field; treating input as free text");
                }
                FieldDescriptor {
                    name: name.clone(),
                    kind,
                }
            })
            .collect();
        Self {
            kind: entry.kind,
            fields,
            values: BTreeMap::new(),
        }
    }

    /// The model this form feeds.
    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    /// Declared fields in catalog order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Descriptor for a declared field.
    pub fn descriptor(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Overwrite one field's raw value.
    ///
    /// Numeric fields accept only parseable numbers or the empty string
    /// (meaning "unset"), mirroring what a number input widget allows.
    pub fn set_value(&mut self, name: &str, value: impl Into<String>) -> Result<(), FormError> {
        let value = value.into();
        let Some(descriptor) = self.descriptor(name) else {
            return Err(FormError::UnknownField(name.to_string()));
        };
        if descriptor.kind == ValueKind::Numeric
            && !value.is_empty()
            && coerce_number(&value).is_none()
        {
            return Err(FormError::InvalidNumber {
                field: name.to_string(),
                value,
            });
        }
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    /// Current raw value of a field; unset fields read as empty.
    pub fn value_of(&self, name: &str) -> &str {
        self.values.get(name).map(String::as_str).unwrap_or("")
    }

    /// Clear every field back to unset.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Snapshot the form as a wire-ready feature map.
    ///
    /// Numeric fields with non-empty input become JSON numbers; an empty
    /// numeric field stays an empty string so validation can tell "unset"
    /// from zero. Categorical and free-text values pass through unchanged.
    pub fn to_feature_map(&self) -> Map<String, Value> {
        let mut features = Map::new();
        for field in &self.fields {
            let raw = self.value_of(&field.name);
            let value = match field.kind {
                ValueKind::Numeric if !raw.is_empty() => {
                    coerce_number(raw).unwrap_or_else(|| Value::String(raw.to_string()))
                }
                _ => Value::String(raw.to_string()),
            };
            features.insert(field.name.clone(), value);
        }
        features
    }
}

/// Parse a raw string as a JSON number, preferring integers.
pub(crate) fn coerce_number(raw: &str) -> Option<Value> {
    if let Ok(int) = raw.parse::<i64>() {
        return Some(Value::Number(Number::from(int)));
    }
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}
