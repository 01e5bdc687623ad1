//! Maps a submitted form onto the model's input row.
//!
//! The builder never fails. A missing, empty or malformed value becomes `0.0`,
//! so a messy submission degrades the prediction instead of being rejected.

use ahash::RandomState;
use ndarray::Array1;
use std::collections::HashMap;

use crate::schema::{FeatureKind, FeatureSchema};

/// Submitted form fields, keyed by feature name.
pub type FormFields = HashMap<String, String, RandomState>;

/// Form body as submitted: every `name=value` pair, in order, repeats included.
pub type FormPairs = Vec<(String, String)>;

/// Checkbox values that count as ticked. Matching is exact and case-sensitive.
const CHECKED_VALUES: [&str; 4] = ["on", "1", "true", "True"];

/// Keys the submitted pairs by name. A repeated field keeps its first value.
pub fn collect_fields<I>(pairs: I) -> FormFields
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut fields = FormFields::default();
    for (name, value) in pairs {
        fields.entry(name).or_insert(value);
    }
    fields
}

/// Builds a row with one value per schema column, in schema order.
/// Fields that are not part of the schema are ignored.
pub fn build_feature_vector(fields: &FormFields, schema: &FeatureSchema) -> Array1<f64> {
    schema
        .columns()
        .iter()
        .map(|column| {
            let raw = fields.get(&column.name).map(String::as_str);
            match column.kind {
                FeatureKind::Boolean => checkbox_value(raw),
                FeatureKind::Numeric => numeric_value(raw),
            }
        })
        .collect()
}

fn checkbox_value(raw: Option<&str>) -> f64 {
    match raw {
        Some(value) if CHECKED_VALUES.contains(&value) => 1.0,
        _ => 0.0,
    }
}

fn numeric_value(raw: Option<&str>) -> f64 {
    match raw {
        None | Some("") => 0.0,
        Some(value) => value.trim().parse::<f64>().unwrap_or(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> FormFields {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn test_repeated_field_keeps_first_value() {
        let pairs = [("age", "1"), ("age", "2"), ("tutoring", "off"), ("tutoring", "on")]
            .map(|(k, v)| (k.to_string(), v.to_string()));
        let fields = collect_fields(pairs);
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["age"], "1");
        assert_eq!(fields["tutoring"], "off");

        let schema = FeatureSchema::new(["age", "tutoring"]);
        assert_eq!(build_feature_vector(&fields, &schema).to_vec(), vec![1.0, 0.0]);
    }

    #[test]
    fn test_numeric_and_checked_box() {
        let schema = FeatureSchema::new(["age", "tutoring"]);
        let row = build_feature_vector(&form(&[("age", "16"), ("tutoring", "on")]), &schema);
        assert_eq!(row.to_vec(), vec![16.0, 1.0]);
    }

    #[test]
    fn test_empty_numeric_and_missing_box() {
        let schema = FeatureSchema::new(["age", "tutoring"]);
        let row = build_feature_vector(&form(&[("age", "")]), &schema);
        assert_eq!(row.to_vec(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_malformed_numeric_becomes_zero() {
        let schema = FeatureSchema::new(["age"]);
        let row = build_feature_vector(&form(&[("age", "not-a-number")]), &schema);
        assert_eq!(row.to_vec(), vec![0.0]);
    }

    #[test]
    fn test_checkbox_literals() {
        let schema = FeatureSchema::new(["music"]);
        for checked in ["on", "1", "true", "True"] {
            let row = build_feature_vector(&form(&[("music", checked)]), &schema);
            assert_eq!(row[0], 1.0, "value {checked:?} should tick the box");
        }
        for unchecked in ["false", "TRUE", "yes", "0", "", "off", " on"] {
            let row = build_feature_vector(&form(&[("music", unchecked)]), &schema);
            assert_eq!(row[0], 0.0, "value {unchecked:?} should not tick the box");
        }
        let row = build_feature_vector(&form(&[]), &schema);
        assert_eq!(row[0], 0.0);
    }

    #[test]
    fn test_numeric_parsing() {
        let schema = FeatureSchema::new(["score"]);
        let cases = [
            ("3.5", 3.5),
            ("-2", -2.0),
            ("1e3", 1000.0),
            (" 4.25 ", 4.25),
            ("abc", 0.0),
            ("   ", 0.0),
            ("3,5", 0.0),
        ];
        for (raw, expected) in cases {
            let row = build_feature_vector(&form(&[("score", raw)]), &schema);
            assert_eq!(row[0], expected, "input {raw:?}");
        }
    }

    #[test]
    fn test_length_and_order_follow_schema() {
        let schema = FeatureSchema::new(["c", "sports", "a", "b"]);
        let fields = form(&[
            ("a", "1"),
            ("b", "2"),
            ("c", "3"),
            ("unrelated", "99"),
            ("sports", "on"),
        ]);
        let row = build_feature_vector(&fields, &schema);
        assert_eq!(row.len(), schema.len());
        assert_eq!(row.to_vec(), vec![3.0, 1.0, 1.0, 2.0]);
    }

    #[test]
    fn test_empty_schema_gives_empty_row() {
        let schema = FeatureSchema::new(Vec::<String>::new());
        let row = build_feature_vector(&form(&[("age", "3")]), &schema);
        assert!(row.is_empty());
    }

    #[test]
    fn test_builder_is_deterministic() {
        let schema = FeatureSchema::new(["age", "tutoring", "absences"]);
        let fields = form(&[("age", "17"), ("tutoring", "True"), ("absences", "x")]);
        let first = build_feature_vector(&fields, &schema);
        let second = build_feature_vector(&fields, &schema);
        assert_eq!(first, second);
    }
}
