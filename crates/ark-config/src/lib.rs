//! ark-config
//!
//! Layered YAML configuration for strategy runs:
//! - documents are merged in order (later layers override earlier ones)
//! - the merged document is rendered to canonical JSON and hashed (SHA-256)
//! - typed readers by JSON pointer return [`ConfigError`] on missing/bad keys
//! - an unused-key report flags leaves no consumer reads

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use tracing::warn;

// ---------------------------------------------------------------------------
// Typed key errors
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A required key is absent (or null).
    MissingKey { pointer: String },
    /// The key is present but cannot be used as requested.
    InvalidValue { pointer: String, reason: String },
}

impl ConfigError {
    pub fn invalid<P: Into<String>, R: Into<String>>(pointer: P, reason: R) -> Self {
        Self::InvalidValue {
            pointer: pointer.into(),
            reason: reason.into(),
        }
    }

    pub fn pointer(&self) -> &str {
        match self {
            Self::MissingKey { pointer } | Self::InvalidValue { pointer, .. } => pointer,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingKey { pointer } => write!(f, "CONFIG_MISSING_KEY {pointer}"),
            Self::InvalidValue { pointer, reason } => {
                write!(f, "CONFIG_INVALID_VALUE {pointer}: {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

fn lookup<'a>(config: &'a Value, pointer: &str) -> Option<&'a Value> {
    config.pointer(pointer).filter(|v| !v.is_null())
}

/// Fails on the first pointer (in the given order) that is absent or null.
pub fn require_keys(config: &Value, pointers: &[&str]) -> Result<(), ConfigError> {
    for p in pointers {
        if lookup(config, p).is_none() {
            return Err(ConfigError::MissingKey {
                pointer: p.to_string(),
            });
        }
    }
    Ok(())
}

pub fn read_f64(config: &Value, pointer: &str) -> Result<f64, ConfigError> {
    read_opt_f64(config, pointer)?.ok_or_else(|| ConfigError::MissingKey {
        pointer: pointer.to_string(),
    })
}

pub fn read_opt_f64(config: &Value, pointer: &str) -> Result<Option<f64>, ConfigError> {
    match lookup(config, pointer) {
        None => Ok(None),
        Some(v) => v
            .as_f64()
            .filter(|x| x.is_finite())
            .map(Some)
            .ok_or_else(|| ConfigError::invalid(pointer, "expected a finite number")),
    }
}

pub fn read_u64(config: &Value, pointer: &str) -> Result<u64, ConfigError> {
    read_opt_u64(config, pointer)?.ok_or_else(|| ConfigError::MissingKey {
        pointer: pointer.to_string(),
    })
}

pub fn read_opt_u64(config: &Value, pointer: &str) -> Result<Option<u64>, ConfigError> {
    match lookup(config, pointer) {
        None => Ok(None),
        Some(v) => v
            .as_u64()
            .map(Some)
            .ok_or_else(|| ConfigError::invalid(pointer, "expected a non-negative integer")),
    }
}

pub fn read_str<'a>(config: &'a Value, pointer: &str) -> Result<&'a str, ConfigError> {
    read_opt_str(config, pointer)?.ok_or_else(|| ConfigError::MissingKey {
        pointer: pointer.to_string(),
    })
}

pub fn read_opt_str<'a>(config: &'a Value, pointer: &str) -> Result<Option<&'a str>, ConfigError> {
    match lookup(config, pointer) {
        None => Ok(None),
        Some(v) => v
            .as_str()
            .map(Some)
            .ok_or_else(|| ConfigError::invalid(pointer, "expected a string")),
    }
}

/// A list of strings; absent means empty.
pub fn read_str_list(config: &Value, pointer: &str) -> Result<Vec<String>, ConfigError> {
    match lookup(config, pointer) {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, v)| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| ConfigError::invalid(format!("{pointer}/{i}"), "expected a string"))
            })
            .collect(),
        Some(_) => Err(ConfigError::invalid(pointer, "expected a list of strings")),
    }
}

// ---------------------------------------------------------------------------
// Unused-key guard
// ---------------------------------------------------------------------------

/// JSON-pointer prefixes read by `ark_strategy::StrategyConfig::from_config_json`.
///
/// Keep in step with the reader; do not list keys nothing reads.
pub const STRATEGY_POINTERS: &[&str] = &[
    "/init_balance",
    "/period",
    "/days_delay",
    "/position_ratio",
    "/universe",
    "/benchmark",
    "/pc_method",
    "/mc/n_samples",
    "/mc/seed",
    "/exec_style",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnusedKeyPolicy {
    Warn,
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnusedKeyReport {
    /// Consumed prefixes used for this analysis (sorted, unique).
    pub consumed_prefixes: Vec<String>,
    /// Unused leaf pointers (sorted).
    pub unused_leaf_pointers: Vec<String>,
}

impl UnusedKeyReport {
    pub fn is_clean(&self) -> bool {
        self.unused_leaf_pointers.is_empty()
    }
}

/// Report leaves of `config_json` not covered by any `consumed` prefix.
///
/// `Warn` logs and returns the report; `Fail` errors when anything is unused.
pub fn report_unused_keys(
    consumed: &[&str],
    config_json: &Value,
    policy: UnusedKeyPolicy,
) -> Result<UnusedKeyReport> {
    let consumed: BTreeSet<String> = consumed.iter().map(|p| normalize_pointer(p)).collect();
    let consumed_prefixes: Vec<String> = consumed.into_iter().collect();

    let mut leaves = Vec::new();
    collect_leaf_pointers(config_json, "", &mut leaves);

    let mut unused: Vec<String> = leaves
        .into_iter()
        .filter(|lp| !consumed_prefixes.iter().any(|cp| is_prefix_pointer(cp, lp)))
        .collect();
    unused.sort();
    unused.dedup();

    let report = UnusedKeyReport {
        consumed_prefixes,
        unused_leaf_pointers: unused,
    };

    if !report.is_clean() {
        match policy {
            UnusedKeyPolicy::Fail => bail!(
                "CONFIG_UNUSED_KEYS: {} unused config leaf key(s). First few: {}",
                report.unused_leaf_pointers.len(),
                preview_list(&report.unused_leaf_pointers, 12)
            ),
            UnusedKeyPolicy::Warn => warn!(
                count = report.unused_leaf_pointers.len(),
                first = %preview_list(&report.unused_leaf_pointers, 12),
                "unused config keys"
            ),
        }
    }

    Ok(report)
}

/// Leading "/" enforced, trailing "/" stripped.
fn normalize_pointer(p: &str) -> String {
    let mut s = p.trim().to_string();
    if s.is_empty() {
        return "/".to_string();
    }
    if !s.starts_with('/') {
        s.insert(0, '/');
    }
    while s.ends_with('/') && s.len() > 1 {
        s.pop();
    }
    s
}

/// "/a/b" covers "/a/b" and "/a/b/c" but not "/a/bc". "/" covers everything.
fn is_prefix_pointer(prefix: &str, leaf: &str) -> bool {
    if prefix == "/" || leaf == prefix {
        return true;
    }
    leaf.strip_prefix(prefix)
        .map(|rest| rest.starts_with('/'))
        .unwrap_or(false)
}

fn collect_leaf_pointers(v: &Value, prefix: &str, out: &mut Vec<String>) {
    match v {
        Value::Object(map) => {
            for (k, vv) in map {
                let next = format!("{}/{}", prefix, escape_pointer_token(k));
                collect_leaf_pointers(vv, &next, out);
            }
        }
        Value::Array(arr) => {
            for (i, vv) in arr.iter().enumerate() {
                collect_leaf_pointers(vv, &format!("{prefix}/{i}"), out);
            }
        }
        _ => out.push(if prefix.is_empty() {
            "/".to_string()
        } else {
            prefix.to_string()
        }),
    }
}

fn escape_pointer_token(s: &str) -> String {
    s.replace('~', "~0").replace('/', "~1")
}

fn preview_list(items: &[String], n: usize) -> String {
    format!("{:?}", items.iter().take(n).collect::<Vec<_>>())
}

// ---------------------------------------------------------------------------
// Layered loading + hashing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
}

pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let mut docs = Vec::with_capacity(paths.len());
    for p in paths {
        let raw = fs::read_to_string(p).with_context(|| format!("failed to read yaml path: {p}"))?;
        docs.push(raw);
    }
    let doc_refs: Vec<&str> = docs.iter().map(String::as_str).collect();
    load_layered_yaml_from_strings(&doc_refs)
}

/// Merge YAML docs in order: earlier docs are base, later docs override.
/// JSON is valid YAML, so JSON layers go through here as well.
pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let mut merged = serde_json::json!({});
    for (i, raw) in yaml_docs.iter().enumerate() {
        let v_yaml: serde_yaml::Value =
            serde_yaml::from_str(raw).with_context(|| format!("invalid yaml in layer {i}"))?;
        let v_json = serde_json::to_value(v_yaml).context("yaml->json conversion failed")?;
        merged = deep_merge(merged, v_json);
    }
    from_value(merged)
}

/// Hash an already-built document (e.g. assembled by a caller in code).
pub fn from_value(config_json: Value) -> Result<LoadedConfig> {
    let canonical_json = canonicalize_json(&config_json)?;
    let config_hash = sha256_hex(canonical_json.as_bytes());
    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json,
    })
}

fn deep_merge(a: Value, b: Value) -> Value {
    match (a, b) {
        (Value::Object(mut a_map), Value::Object(b_map)) => {
            for (k, b_val) in b_map {
                let a_val = a_map.remove(&k).unwrap_or(Value::Null);
                a_map.insert(k, deep_merge(a_val, b_val));
            }
            Value::Object(a_map)
        }
        (_, b_other) => b_other,
    }
}

/// serde_json's default map is key-ordered, so compact output is canonical.
fn canonicalize_json(v: &Value) -> Result<String> {
    serde_json::to_string(v).context("canonical json serialize failed")
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
