//! Static classification of the service's input fields.
//!
//! The numeric and categorical tables are fixed rather than schema-supplied:
//! the domain semantics (currency, counts, ages, durations, enumerated
//! labels) were decided at model-training time and the server does not
//! publish them. Any field outside both tables is treated as free text.

/// Field names whose values are numbers on the wire.
pub const NUMERIC_FIELDS: &[&str] = &["price", "quantity", "total_value", "age", "tenure_months"];

/// The prediction target. Stripped from every outgoing payload, no matter
/// where the value came from.
pub const PROTECTED_FIELD: &str = "churn";

const GENDER_VALUES: &[&str] = &["Female", "Male", "Other"];
const REGION_VALUES: &[&str] = &["North", "South", "East", "West"];
const SEGMENT_VALUES: &[&str] = &["Corporate", "Small Business", "Home Office"];
const CATEGORY_VALUES: &[&str] = &["Electronics", "Furniture", "Office Supplies"];
const PRODUCT_VALUES: &[&str] = &[
    "Projector", "Desk", "Chair", "Printer", "Monitor", "Mouse", "Keyboard",
];
const SENTIMENT_VALUES: &[&str] = &["Positive", "Neutral", "Negative"];

/// How a field's raw input is interpreted when building a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Coerced to a JSON number; an empty value means "unset".
    Numeric,
    /// Restricted to a fixed, ordered set of string options.
    Categorical(&'static [&'static str]),
    /// Passed through unchanged.
    FreeText,
}

/// Classify a field name against the fixed tables.
pub fn value_kind_of(name: &str) -> ValueKind {
    if NUMERIC_FIELDS.contains(&name) {
        return ValueKind::Numeric;
    }
    match allowed_values_of(name) {
        Some(values) => ValueKind::Categorical(values),
        None => ValueKind::FreeText,
    }
}

/// The fixed option list for a known categorical field.
pub fn allowed_values_of(name: &str) -> Option<&'static [&'static str]> {
    match name {
        "gender" => Some(GENDER_VALUES),
        "region" => Some(REGION_VALUES),
        "segment" => Some(SEGMENT_VALUES),
        "category" => Some(CATEGORY_VALUES),
        "product_name" => Some(PRODUCT_VALUES),
        "sentiment" => Some(SENTIMENT_VALUES),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_fields_classify_as_numeric() {
        for name in NUMERIC_FIELDS {
            assert_eq!(value_kind_of(name), ValueKind::Numeric);
        }
    }

    #[test]
    fn categorical_fields_carry_their_options() {
        let ValueKind::Categorical(values) = value_kind_of("region") else {
            panic!("region should be categorical");
        };
        assert_eq!(values, REGION_VALUES);
        assert_eq!(allowed_values_of("sentiment"), Some(SENTIMENT_VALUES));
    }

    #[test]
    fn unknown_fields_fall_back_to_free_text() {
        assert_eq!(value_kind_of("loyalty_tier"), ValueKind::FreeText);
        assert_eq!(allowed_values_of("loyalty_tier"), None);
    }

    #[test]
    fn protected_field_is_not_an_input() {
        assert_eq!(value_kind_of(PROTECTED_FIELD), ValueKind::FreeText);
        assert!(!NUMERIC_FIELDS.contains(&PROTECTED_FIELD));
    }
}
