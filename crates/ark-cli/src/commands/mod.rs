//! Subcommand handlers.
//!
//! Each handler loads the layered config itself so the hash printed next to
//! a result always matches the document that produced it.

pub mod plan;
pub mod schedule;

use std::collections::BTreeMap;
use std::fs;

use anyhow::{Context, Result};
use ark_config::LoadedConfig;
use serde::de::DeserializeOwned;

pub(crate) fn load_config(paths: &[String]) -> Result<LoadedConfig> {
    let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
    ark_config::load_layered_yaml(&path_refs)
}

/// Read a JSON object keyed by symbol.
pub(crate) fn read_symbol_map<T: DeserializeOwned>(path: &str) -> Result<BTreeMap<String, T>> {
    let raw = fs::read_to_string(path).with_context(|| format!("read failed: {path}"))?;
    serde_json::from_str(&raw).with_context(|| format!("parse json failed: {path}"))
}
