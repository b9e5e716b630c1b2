//! Plugin catalog generator: fetches each marketplace plugin, extracts
//! catalog-relevant manifest fields, and renders a markdown catalog.
//!
//! This sits outside the validation pipeline: it reads the same inputs but
//! never produces pass/fail errors, only best-effort display data.

mod extract;
mod render;

use chrono::{DateTime, Utc};
use marketgate_orchestrator::{clone_shallow, PluginWorkdir, RunTempRoot, CLONE_TIMEOUT};
use marketgate_types::MarketplaceIndex;

pub use extract::PluginInfo;
pub use render::strip_generated_line;

const MANIFEST_CANDIDATES: &[&str] = &["plugin.json", ".claude-plugin/plugin.json"];

fn fetch_manifest(url: &str, run_root: &std::path::Path, plugin_name: &str) -> Option<serde_json::Value> {
    let workdir = PluginWorkdir::create(run_root, plugin_name).ok()?;
    if clone_shallow(url, workdir.path(), CLONE_TIMEOUT).is_err() {
        tracing::warn!(plugin = plugin_name, "could not clone for catalog generation");
        return None;
    }
    MANIFEST_CANDIDATES
        .iter()
        .map(|rel| workdir.path().join(rel))
        .find(|p| p.exists())
        .and_then(|path| std::fs::read_to_string(path).ok())
        .and_then(|text| serde_json::from_str(&text).ok())
}

/// Build the full plugin-info list for `index`, fetching each plugin's
/// manifest on a best-effort basis.
pub fn collect_plugin_info(index: &MarketplaceIndex) -> Vec<PluginInfo> {
    let run_root = RunTempRoot::create().expect("failed to create run temp root");
    index
        .plugins
        .iter()
        .map(|entry| {
            tracing::info!(plugin = %entry.name, "processing for catalog");
            let manifest = fetch_manifest(&entry.source.url, run_root.path(), &entry.name);
            extract::extract(entry, manifest.as_ref())
        })
        .collect()
}

/// Render the catalog document for `index` as of `generated_at`.
pub fn generate(index: &MarketplaceIndex, generated_at: DateTime<Utc>) -> String {
    let plugins = collect_plugin_info(index);
    let timestamp = generated_at.format("%Y-%m-%d %H:%M UTC").to_string();
    render::render(&index.name, &index.version, &timestamp, &plugins)
}

/// `--check` mode: compare a freshly rendered catalog against `existing`,
/// ignoring the `**Generated:**` line. Returns `true` when they match (no
/// drift).
pub fn check(index: &MarketplaceIndex, existing: &str, generated_at: DateTime<Utc>) -> bool {
    let fresh = generate(index, generated_at);
    strip_generated_line(&fresh) == strip_generated_line(existing)
}
