//! Lenient manifest field extraction for the catalog.
//!
//! The catalog reads fields (`capabilities.filesystem`, `capabilities.commands`,
//! `capabilities.secrets`) that are not part of the strict manifest schema
//! `marketgate-manifest` enforces; a missing or malformed field here is
//! simply absent from the rendered catalog, never a validation error.

use marketgate_types::{PluginEntry, Tier};
use serde_json::Value;

#[derive(Debug, Clone, Default)]
pub struct PluginInfo {
    pub name: String,
    pub tier: Tier,
    pub description: String,
    pub url: String,
    pub tags: Vec<String>,
    pub version: Option<String>,
    pub network_mode: String,
    pub network_domains: Vec<String>,
    pub fs_write: Vec<String>,
    pub commands_allow: Vec<String>,
    pub commands_deny: Vec<String>,
    pub secrets_required: Vec<String>,
    pub risk_egress: Option<String>,
    pub risk_notes: Option<String>,
}

fn string_array(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}

/// Build a [`PluginInfo`] from the marketplace entry and, if present, the
/// plugin's fetched manifest document.
pub fn extract(entry: &PluginEntry, manifest: Option<&Value>) -> PluginInfo {
    let mut info = PluginInfo {
        name: entry.name.clone(),
        tier: entry.tier,
        url: entry.source.url.clone(),
        tags: entry.tags.clone(),
        network_mode: "none".to_string(),
        ..PluginInfo::default()
    };

    let Some(manifest) = manifest else { return info };
    let obj = manifest.as_object();

    if let Some(description) = obj.and_then(|o| o.get("description")).and_then(Value::as_str) {
        info.description = description.to_string();
    }
    info.version = obj
        .and_then(|o| o.get("version"))
        .and_then(Value::as_str)
        .map(str::to_string);

    if let Some(caps) = obj.and_then(|o| o.get("capabilities")) {
        let caps_obj = caps.as_object();

        if let Some(network) = caps_obj.and_then(|o| o.get("network")).and_then(Value::as_object) {
            if let Some(mode) = network.get("mode").and_then(Value::as_str) {
                info.network_mode = mode.to_string();
            }
            info.network_domains = string_array(network.get("domains"));
        }

        if let Some(fs) = caps_obj.and_then(|o| o.get("filesystem")).and_then(Value::as_object) {
            info.fs_write = string_array(fs.get("write"));
        }

        if let Some(cmds) = caps_obj.and_then(|o| o.get("commands")).and_then(Value::as_object) {
            info.commands_allow = string_array(cmds.get("allow"));
            info.commands_deny = string_array(cmds.get("deny"));
        }

        if let Some(secrets) = caps_obj.and_then(|o| o.get("secrets")).and_then(Value::as_object) {
            info.secrets_required = string_array(secrets.get("required"));
        }
    }

    if let Some(risk) = obj.and_then(|o| o.get("risk")).and_then(Value::as_object) {
        info.risk_egress = risk.get("dataEgress").and_then(Value::as_str).map(str::to_string);
        info.risk_notes = risk.get("notes").and_then(Value::as_str).map(str::to_string);
    }

    info
}
