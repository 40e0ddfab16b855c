/// GUTS kernel: canonical hashing
///
/// Deterministic canonical serialization + SHA-256 for reproducibility
/// checks across runs and experiment variants.
///
/// Rules:
///   - every f64 is written as its IEEE-754 bit pattern (16 hex digits),
///     so equal hashes mean bit-identical dynamics
///   - fixed field order, no whitespace
///   - individuals ordered by id

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::domain::{DayOutcome, GutsModel};
use crate::engine::Individual;
use crate::state::ExposureState;
use crate::KERNEL_VERSION;

/// Lowercase hex of the raw bits of `v`.
pub fn f64_bits(v: f64) -> String {
    format!("{:016x}", v.to_bits())
}

/// SHA-256 of `bytes`, lowercase hex.
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

fn state_value(state: &ExposureState) -> Value {
    let mut m = Map::new();
    m.insert("oral_dose".to_string(), Value::String(f64_bits(state.oral_dose)));
    m.insert(
        "contact_dose".to_string(),
        Value::String(f64_bits(state.contact_dose)),
    );
    m.insert("damage".to_string(), Value::String(f64_bits(state.damage)));
    Value::Object(m)
}

fn outcome_value(outcome: &DayOutcome) -> Value {
    let mut m = Map::new();
    m.insert("lethal".to_string(), Value::Bool(outcome.lethal));
    m.insert("state".to_string(), state_value(&outcome.state));
    Value::Object(m)
}

fn individual_value(id: u64, ind: &Individual) -> Value {
    let mut m = Map::new();
    m.insert("id".to_string(), Value::Number(id.into()));
    let model = match ind.model() {
        GutsModel::Sd => "SD",
        GutsModel::It => "IT",
    };
    m.insert("model".to_string(), Value::String(model.to_string()));
    m.insert("state".to_string(), state_value(ind.state()));
    m.insert(
        "threshold".to_string(),
        ind.threshold()
            .map(|t| Value::String(f64_bits(t)))
            .unwrap_or(Value::Null),
    );
    m.insert("last_day".to_string(), Value::Number(ind.last_day().into()));
    m.insert(
        "died_on".to_string(),
        ind.died_on()
            .map(|d| Value::Number(d.into()))
            .unwrap_or(Value::Null),
    );
    Value::Object(m)
}

fn with_version(key: &str, body: Value) -> Value {
    // kernel_version first: it is part of the result identity.
    let mut root = Map::new();
    root.insert(
        "kernel_version".to_string(),
        Value::Number(KERNEL_VERSION.into()),
    );
    root.insert(key.to_string(), body);
    Value::Object(root)
}

/// Canonical bytes of a day-by-day trajectory.
pub fn canonical_serialize_outcomes(outcomes: &[DayOutcome]) -> Vec<u8> {
    let list = outcomes.iter().map(outcome_value).collect();
    with_version("outcomes", Value::Array(list))
        .to_string()
        .into_bytes()
}

pub fn canonical_hash_outcomes(outcomes: &[DayOutcome]) -> String {
    sha256_hex(&canonical_serialize_outcomes(outcomes))
}

/// Canonical bytes of a set of individuals. Sorted by id here, so callers
/// may pass them in any order.
pub fn canonical_serialize_individuals<'a, I>(individuals: I) -> Vec<u8>
where
    I: IntoIterator<Item = (u64, &'a Individual)>,
{
    let mut sorted: Vec<(u64, &Individual)> = individuals.into_iter().collect();
    sorted.sort_by_key(|(id, _)| *id);
    let list = sorted
        .into_iter()
        .map(|(id, ind)| individual_value(id, ind))
        .collect();
    with_version("individuals", Value::Array(list))
        .to_string()
        .into_bytes()
}

pub fn canonical_hash_individuals<'a, I>(individuals: I) -> String
where
    I: IntoIterator<Item = (u64, &'a Individual)>,
{
    sha256_hex(&canonical_serialize_individuals(individuals))
}
