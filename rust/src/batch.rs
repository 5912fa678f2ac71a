//! Batch aggregation over sequences of UUID strings.
//!
//! Malformed elements never abort a batch; they are counted and reported.
//! The only error is an empty input sequence.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};

use crate::parse::{SourceFormat, UuidAnalysis, UuidError, normalize, uuid_version};

/// One element of a batch: a bare string or an object carrying the UUID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BatchInput {
    Raw(String),
    Wrapped {
        #[serde(alias = "uuid", alias = "id")]
        identifier: String,
    },
}

impl BatchInput {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Raw(s) => s,
            Self::Wrapped { identifier } => identifier,
        }
    }

    /// Flatten a list of inputs into plain strings, preserving order.
    pub fn resolve_all(inputs: &[BatchInput]) -> Vec<String> {
        inputs.iter().map(|i| i.as_str().to_string()).collect()
    }

    /// Lenient conversion: anything that is neither a string nor an
    /// identifier object is kept as its JSON text and later reported invalid.
    pub fn from_value(value: &Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_else(|_| Self::Raw(value.to_string()))
    }
}

/// Resolve a JSON value that must be a non-empty list of batch inputs.
pub fn inputs_from_value(value: &Value) -> Result<Vec<String>, UuidError> {
    let Value::Array(items) = value else {
        return Err(UuidError::NotAList);
    };
    if items.is_empty() {
        return Err(UuidError::EmptyBatch);
    }
    let inputs: Vec<BatchInput> = items.iter().map(BatchInput::from_value).collect();
    Ok(BatchInput::resolve_all(&inputs))
}

impl From<&str> for BatchInput {
    fn from(s: &str) -> Self {
        Self::Raw(s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationEntry {
    pub input: String,
    pub valid: bool,
    pub version: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchValidation {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    pub results: Vec<ValidationEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchAnalysis {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    pub versions: BTreeMap<u8, usize>,
    pub results: Vec<UuidAnalysis>,
}

/// A repeated value. `index` is the repeat, `first_index` where it was first seen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collision {
    pub value: String,
    pub index: usize,
    pub first_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionReport {
    pub total: usize,
    pub unique: usize,
    pub duplicates: usize,
    pub collisions: Vec<Collision>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatHistogram {
    pub standard: usize,
    pub compact: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub total: usize,
    pub valid: usize,
    pub versions: BTreeMap<u8, usize>,
    pub formats: FormatHistogram,
    pub variants: BTreeMap<String, usize>,
}

fn ensure_non_empty<S>(inputs: &[S]) -> Result<(), UuidError> {
    if inputs.is_empty() {
        return Err(UuidError::EmptyBatch);
    }
    Ok(())
}

/// Validate every element, preserving input order.
pub fn batch_validate<S: AsRef<str>>(inputs: &[S]) -> Result<BatchValidation, UuidError> {
    ensure_non_empty(inputs)?;

    let results: Vec<ValidationEntry> = inputs
        .iter()
        .map(|s| {
            let s = s.as_ref();
            let version = uuid_version(s);
            ValidationEntry {
                input: s.to_string(),
                valid: version.is_some(),
                version,
            }
        })
        .collect();

    let valid = results.iter().filter(|r| r.valid).count();
    Ok(BatchValidation {
        total: results.len(),
        valid,
        invalid: results.len() - valid,
        results,
    })
}

/// Analyze every element; the version histogram counts valid results only.
pub fn batch_analyze<S: AsRef<str>>(inputs: &[S]) -> Result<BatchAnalysis, UuidError> {
    ensure_non_empty(inputs)?;

    let results: Vec<UuidAnalysis> = inputs.iter().map(|s| UuidAnalysis::of(s.as_ref())).collect();

    let mut versions = BTreeMap::new();
    let mut valid = 0;
    for r in results.iter().filter(|r| r.valid) {
        valid += 1;
        if let Some(v) = r.version {
            *versions.entry(v).or_insert(0) += 1;
        }
    }

    Ok(BatchAnalysis {
        total: results.len(),
        valid,
        invalid: results.len() - valid,
        versions,
        results,
    })
}

/// Report repeats of the same normalized value.
///
/// Case and dashes are ignored when comparing. The first occurrence is never
/// a collision; every later occurrence is.
pub fn check_collisions<S: AsRef<str>>(inputs: &[S]) -> Result<CollisionReport, UuidError> {
    ensure_non_empty(inputs)?;

    let mut seen: HashMap<String, usize> = HashMap::with_capacity(inputs.len());
    let mut collisions = Vec::new();

    for (index, s) in inputs.iter().enumerate() {
        let s = s.as_ref();
        match seen.entry(normalize(s)) {
            Entry::Occupied(first) => collisions.push(Collision {
                value: s.to_string(),
                index,
                first_index: *first.get(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(index);
            }
        }
    }

    Ok(CollisionReport {
        total: inputs.len(),
        unique: seen.len(),
        duplicates: collisions.len(),
        collisions,
    })
}

/// Version, format and variant histograms over the valid elements.
pub fn generate_statistics<S: AsRef<str>>(inputs: &[S]) -> Result<Statistics, UuidError> {
    ensure_non_empty(inputs)?;

    let mut stats = Statistics {
        total: inputs.len(),
        valid: 0,
        versions: BTreeMap::new(),
        formats: FormatHistogram::default(),
        variants: BTreeMap::new(),
    };

    for a in inputs.iter().map(|s| UuidAnalysis::of(s.as_ref())) {
        if !a.valid {
            continue;
        }
        stats.valid += 1;
        if let Some(v) = a.version {
            *stats.versions.entry(v).or_insert(0) += 1;
        }
        match a.format {
            Some(SourceFormat::Standard) => stats.formats.standard += 1,
            Some(SourceFormat::Compact) => stats.formats.compact += 1,
            None => {}
        }
        if let Some(variant) = a.variant {
            *stats.variants.entry(variant.as_str().to_string()).or_insert(0) += 1;
        }
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    const V1: &str = "6fa459ea-ee8a-11ed-a05b-0242ac120003";
    const V4: &str = "f47ac10b-58cc-4372-a567-0e02b2c3d479";
    const V5: &str = "cfbff0d1-9375-5685-968c-48ce8b15ae17";

    #[test]
    fn test_empty_batches_are_rejected() {
        let empty: [&str; 0] = [];
        assert_eq!(batch_validate(&empty), Err(UuidError::EmptyBatch));
        assert_eq!(batch_analyze(&empty), Err(UuidError::EmptyBatch));
        assert_eq!(check_collisions(&empty), Err(UuidError::EmptyBatch));
        assert_eq!(generate_statistics(&empty), Err(UuidError::EmptyBatch));
    }

    #[test]
    fn test_batch_validate_counts_and_order() {
        let r = batch_validate(&[V4, "garbage"]).unwrap();
        assert_eq!(r.total, 2);
        assert_eq!(r.valid, 1);
        assert_eq!(r.invalid, 1);
        assert_eq!(r.results[0].input, V4);
        assert_eq!(r.results[0].version, Some(4));
        assert_eq!(r.results[1].input, "garbage");
        assert_eq!(r.results[1].version, None);
        assert!(!r.results[1].valid);
    }

    #[test]
    fn test_batch_validate_json_keeps_null_version() {
        let r = batch_validate(&["garbage"]).unwrap();
        let v = serde_json::to_value(&r).unwrap();
        assert!(v["results"][0]["version"].is_null());
    }

    #[test]
    fn test_batch_analyze_histogram_ignores_invalid() {
        let r = batch_analyze(&[V1, V4, "nope", V4]).unwrap();
        assert_eq!(r.total, 4);
        assert_eq!(r.valid, 3);
        assert_eq!(r.invalid, 1);
        assert_eq!(r.versions.get(&1), Some(&1));
        assert_eq!(r.versions.get(&4), Some(&2));
        assert_eq!(r.results.len(), 4);
        assert_eq!(r.results[2].error.as_deref(), Some("Invalid UUID length"));
    }

    #[test]
    fn test_collision_recorded_at_second_occurrence() {
        let r = check_collisions(&[V4, V4]).unwrap();
        assert_eq!(r.unique, 1);
        assert_eq!(r.duplicates, 1);
        assert_eq!(r.collisions[0].index, 1);
        assert_eq!(r.collisions[0].first_index, 0);
    }

    #[test]
    fn test_collision_ignores_case_and_dashes() {
        let r = check_collisions(&[
            "F47AC10B-58CC-4372-A567-0E02B2C3D479",
            "f47ac10b58cc4372a5670e02b2c3d479",
        ])
        .unwrap();
        assert_eq!(r.total, 2);
        assert_eq!(r.unique, 1);
        assert_eq!(r.duplicates, 1);
        assert_eq!(r.collisions[0].index, 1);
        assert_eq!(r.collisions[0].value, "f47ac10b58cc4372a5670e02b2c3d479");
    }

    #[test]
    fn test_collisions_report_every_repeat() {
        let r = check_collisions(&[V4, V1, V4, V5, V4, V1]).unwrap();
        assert_eq!(r.unique, 3);
        assert_eq!(r.duplicates, 3);
        let idx: Vec<usize> = r.collisions.iter().map(|c| c.index).collect();
        assert_eq!(idx, vec![2, 4, 5]);
        assert_eq!(r.collisions[1].first_index, 0);
        assert_eq!(r.collisions[2].first_index, 1);
    }

    #[test]
    fn test_statistics_histograms() {
        let s = generate_statistics(&[V1, V4, V5]).unwrap();
        assert_eq!(s.total, 3);
        assert_eq!(s.valid, 3);
        assert_eq!(s.formats.standard, 3);
        assert_eq!(s.formats.compact, 0);
        assert_eq!(s.variants.get("RFC 4122"), Some(&3));

        let v = serde_json::to_value(&s).unwrap();
        assert_eq!(v["versions"], serde_json::json!({"1": 1, "4": 1, "5": 1}));
    }

    #[test]
    fn test_statistics_skip_invalid_and_count_compact() {
        let s = generate_statistics(&["f47ac10b58cc4372a5670e02b2c3d479", "bad", ""]).unwrap();
        assert_eq!(s.total, 3);
        assert_eq!(s.valid, 1);
        assert_eq!(s.formats.compact, 1);
        assert_eq!(s.versions.len(), 1);
    }

    #[test]
    fn test_batch_input_tagged_union() {
        let inputs: Vec<BatchInput> = serde_json::from_value(serde_json::json!([
            V4,
            {"identifier": V1},
            {"uuid": V5}
        ]))
        .unwrap();
        assert_eq!(
            BatchInput::resolve_all(&inputs),
            vec![V4.to_string(), V1.to_string(), V5.to_string()]
        );
    }

    #[test]
    fn test_inputs_from_value() {
        let v = serde_json::json!([V4, 7, {"other": 1}]);
        let inputs = inputs_from_value(&v).unwrap();
        assert_eq!(inputs, vec![V4.to_string(), "7".to_string(), "{\"other\":1}".to_string()]);
        assert_eq!(
            inputs_from_value(&serde_json::json!(V4)),
            Err(UuidError::NotAList)
        );
        assert_eq!(
            inputs_from_value(&serde_json::json!([])),
            Err(UuidError::EmptyBatch)
        );
    }
}
