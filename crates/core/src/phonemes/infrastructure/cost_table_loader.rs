use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;

use crate::phonemes::domain::substitution_cost_table::SubstitutionCostTable;
use crate::shared::constants::{COST_TABLE_META_SECTION, COST_TABLE_PAIR_SEPARATOR};

#[derive(Error, Debug)]
pub enum CostTableError {
    #[error("failed to read cost table {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cost table is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cost table must be a JSON object of sections")]
    NotAnObject,
    #[error("section '{0}' must be an object of \"a|b\": cost entries")]
    InvalidSection(String),
    #[error("pair key '{0}' must have the form \"a|b\"")]
    InvalidPair(String),
    #[error("cost for '{key}' must be a non-negative number, got {value}")]
    InvalidCost { key: String, value: Value },
}

/// Loads a substitution cost table from a JSON file.
///
/// A missing file is not an error: it yields an empty table, which makes
/// every substitution fall back to the default cost.
pub fn load(path: &Path) -> Result<SubstitutionCostTable, CostTableError> {
    if !path.exists() {
        log::warn!(
            "Cost table {} not found, using default substitution cost for all pairs",
            path.display()
        );
        return Ok(SubstitutionCostTable::new());
    }
    let json = fs::read_to_string(path).map_err(|e| CostTableError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse(&json)
}

/// Parses the cost table format:
///
/// ```json
/// { "_meta": { ... }, "vowels": { "a|aa": 0.3 }, "emphatics": { "s|S": 0.4 } }
/// ```
///
/// Pairs are similarity relations, so each is stored under both orderings.
pub fn parse(json: &str) -> Result<SubstitutionCostTable, CostTableError> {
    let root: Value = serde_json::from_str(json)?;
    let sections = root.as_object().ok_or(CostTableError::NotAnObject)?;

    let mut table = SubstitutionCostTable::new();
    for (name, section) in sections {
        if name == COST_TABLE_META_SECTION {
            continue;
        }
        let entries = section
            .as_object()
            .ok_or_else(|| CostTableError::InvalidSection(name.clone()))?;
        parse_section(entries, &mut table)?;
    }
    log::debug!("Loaded {} substitution cost entries", table.len());
    Ok(table)
}

fn parse_section(
    entries: &Map<String, Value>,
    table: &mut SubstitutionCostTable,
) -> Result<(), CostTableError> {
    for (key, value) in entries {
        let (a, b) = split_pair(key)?;
        let cost = value
            .as_f64()
            .filter(|c| c.is_finite() && *c >= 0.0)
            .ok_or_else(|| CostTableError::InvalidCost {
                key: key.clone(),
                value: value.clone(),
            })?;
        table.insert_symmetric(a, b, cost);
    }
    Ok(())
}

fn split_pair(key: &str) -> Result<(&str, &str), CostTableError> {
    let mut parts = key.split(COST_TABLE_PAIR_SEPARATOR);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(a), Some(b), None) if !a.is_empty() && !b.is_empty() => Ok((a, b)),
        _ => Err(CostTableError::InvalidPair(key.to_string())),
    }
}
