//! Index-shape schema checks (C4-level checks specialized for the
//! marketplace index), done against raw JSON rather than the strict
//! [`marketgate_types::MarketplaceIndex`] type so that one malformed plugin
//! entry fails only that entry, not the whole run.

use std::collections::HashSet;

use marketgate_types::PluginEntry;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("index root is not a JSON object")]
    NotAnObject,
    #[error("index is missing required field '{0}'")]
    MissingField(&'static str),
    #[error("index field '{field}' has the wrong type: {detail}")]
    WrongType { field: &'static str, detail: String },
    #[error("index field 'plugins' must be an array")]
    PluginsNotArray,
    #[error("duplicate plugin name in index: '{0}'")]
    DuplicateName(String),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// One entry slot in the index: either it parsed cleanly, or parsing itself
/// failed and the caller must synthesize an `EntryParse`-class result.
pub enum EntrySlot {
    Parsed(PluginEntry),
    Invalid { raw_name: String, reason: String },
}

pub struct ParsedIndex {
    pub name: String,
    pub version: String,
    pub owner_name: String,
    pub entries: Vec<EntrySlot>,
    /// Non-fatal index-level anomalies (e.g. non-semver version).
    pub warnings: Vec<String>,
}

fn require_str<'a>(obj: &'a serde_json::Map<String, Value>, field: &'static str) -> Result<&'a str, IndexError> {
    match obj.get(field) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.as_str()),
        Some(Value::String(_)) => Err(IndexError::WrongType {
            field,
            detail: "must not be empty".to_string(),
        }),
        Some(other) => Err(IndexError::WrongType {
            field,
            detail: format!("expected string, got {other}"),
        }),
        None => Err(IndexError::MissingField(field)),
    }
}

/// Parse and schema-check the raw index document. Any violation here is
/// fatal for the whole run (§7, `IndexSchema`).
pub fn parse(text: &str) -> Result<ParsedIndex, IndexError> {
    let value: Value = serde_json::from_str(text)?;
    let obj = value.as_object().ok_or(IndexError::NotAnObject)?;

    let name = require_str(obj, "name")?.to_string();
    let version = require_str(obj, "version")?.to_string();

    let owner = obj
        .get("owner")
        .and_then(Value::as_object)
        .ok_or(IndexError::MissingField("owner"))?;
    let owner_name = require_str(owner, "name")?.to_string();

    let plugins = obj
        .get("plugins")
        .ok_or(IndexError::MissingField("plugins"))?
        .as_array()
        .ok_or(IndexError::PluginsNotArray)?;

    let mut warnings = Vec::new();
    if semver::Version::parse(&version).is_err() {
        warnings.push(format!("index version '{version}' is not valid semver"));
    }

    let mut seen_names: HashSet<String> = HashSet::new();
    let mut entries = Vec::with_capacity(plugins.len());
    for raw in plugins {
        match serde_json::from_value::<PluginEntry>(raw.clone()) {
            Ok(entry) => {
                if !seen_names.insert(entry.name.clone()) {
                    entries.push(EntrySlot::Invalid {
                        raw_name: entry.name.clone(),
                        reason: format!("duplicate plugin name '{}'", entry.name),
                    });
                } else {
                    entries.push(EntrySlot::Parsed(entry));
                }
            }
            Err(e) => {
                let raw_name = raw
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or("<unknown>")
                    .to_string();
                entries.push(EntrySlot::Invalid {
                    raw_name,
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok(ParsedIndex {
        name,
        version,
        owner_name,
        entries,
        warnings,
    })
}
