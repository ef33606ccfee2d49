//! Named example inputs for each model.
//!
//! The first preset of a model comes verbatim from the catalog's example
//! payload; the alternates are fixed contrasting scenarios. The library is
//! recomputed whenever the catalog is refreshed, since example payloads may
//! change between refreshes.

use serde_json::{Map, Value};

use crate::fields::ValueKind;
use crate::form::FormModel;
use crate::schema::{ModelCatalog, ModelKind};

/// A named, pre-filled input set for one model kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Preset {
    /// Menu label.
    pub name: String,
    /// Field name to value. Immutable once constructed.
    pub data: Map<String, Value>,
}

/// All presets, grouped per model kind.
#[derive(Debug, Clone, Default)]
pub struct PresetLibrary {
    by_kind: Vec<(ModelKind, Vec<Preset>)>,
}

impl PresetLibrary {
    /// Build the preset set for every model the catalog declares.
    pub fn from_catalog(catalog: &ModelCatalog) -> Self {
        let mut by_kind = Vec::new();
        for kind in catalog.available() {
            let mut presets = Vec::new();
            if let Some(example) = catalog
                .entry(kind)
                .and_then(|entry| entry.example_features.as_ref())
            {
                presets.push(Preset {
                    name: catalog_preset_name(kind).to_string(),
                    data: example.clone(),
                });
            }
            presets.extend(alternates_for(kind));
            by_kind.push((kind, presets));
        }
        Self { by_kind }
    }

    /// Presets for `kind`, in menu order. Empty for an unavailable kind.
    pub fn presets_for(&self, kind: ModelKind) -> &[Preset] {
        self.by_kind
            .iter()
            .find(|(entry_kind, _)| *entry_kind == kind)
            .map(|(_, presets)| presets.as_slice())
            .unwrap_or(&[])
    }
}

/// Overwrite every declared field of `form` from `preset`.
///
/// A categorical field never ends up outside its allowed set: values the
/// preset does not cover (or covers with something invalid) fall back to
/// the first allowed option. Fields the preset leaves out are cleared.
pub fn apply(preset: &Preset, form: &mut FormModel) {
    let fields: Vec<_> = form.fields().to_vec();
    for field in fields {
        let value = preset.data.get(&field.name);
        match field.kind {
            ValueKind::Categorical(allowed) => {
                let supplied = value.and_then(Value::as_str);
                let chosen = match supplied {
                    Some(option) if allowed.contains(&option) => option,
                    _ => allowed.first().copied().unwrap_or(""),
                };
                let _ = form.set_value(&field.name, chosen);
            }
            ValueKind::Numeric | ValueKind::FreeText => {
                let raw = raw_text(value);
                if form.set_value(&field.name, raw).is_err() {
                    // A malformed numeric value in a preset clears the field.
                    let _ = form.set_value(&field.name, "");
                }
            }
        }
    }
}

fn raw_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::Bool(flag)) => flag.to_string(),
        Some(other) => other.to_string(),
    }
}

fn catalog_preset_name(kind: ModelKind) -> &'static str {
    match kind {
        ModelKind::Logreg => "Corporate Electronics",
        ModelKind::Dtree => "Default Tree Sample",
        ModelKind::Svm => "Corporate High Value",
        ModelKind::Kmeans => "Mid Spender",
        ModelKind::Linreg => "Projector Corporate",
    }
}

fn alternates_for(kind: ModelKind) -> Vec<Preset> {
    match kind {
        ModelKind::Logreg => vec![preset(
            "Small Biz Furniture",
            serde_json::json!({
                "price": 12000, "quantity": 2, "total_value": 24000,
                "age": 40, "tenure_months": 37,
                "gender": "Female", "region": "West", "segment": "Small Business",
                "product_name": "Desk", "category": "Furniture", "sentiment": "Negative"
            }),
        )],
        ModelKind::Dtree => vec![preset(
            "Young, short tenure",
            serde_json::json!({
                "price": 8000, "quantity": 1, "total_value": 8000,
                "age": 26, "tenure_months": 6,
                "gender": "Male", "region": "East", "segment": "Home Office",
                "product_name": "Chair", "category": "Furniture", "sentiment": "Neutral"
            }),
        )],
        ModelKind::Svm => vec![preset(
            "West, Low Value",
            serde_json::json!({
                "price": 3000, "quantity": 1, "total_value": 3000,
                "age": 52, "tenure_months": 60,
                "gender": "Female", "region": "West", "segment": "Corporate",
                "product_name": "Mouse", "category": "Electronics", "sentiment": "Positive"
            }),
        )],
        ModelKind::Kmeans => vec![preset(
            "High Spender",
            serde_json::json!({
                "price": 70000, "quantity": 3, "total_value": 210000,
                "age": 45, "tenure_months": 80
            }),
        )],
        ModelKind::Linreg => vec![preset(
            "Desk Small Biz",
            serde_json::json!({
                "price": 12000, "quantity": 2, "age": 40, "tenure_months": 37,
                "gender": "Female", "region": "West", "segment": "Small Business",
                "product_name": "Desk", "category": "Furniture", "sentiment": "Negative"
            }),
        )],
    }
}

fn preset(name: &str, value: Value) -> Preset {
    let data = match value {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    Preset {
        name: name.to_string(),
        data,
    }
}
