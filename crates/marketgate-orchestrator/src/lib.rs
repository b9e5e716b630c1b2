//! Per-plugin orchestrator (C7): fetch a plugin's repository and run the
//! manifest/policy/scan/reconcile pipeline against it, producing one
//! [`PluginResult`]. Owns the plugin's temporary clone directory end to end
//! and guarantees its removal on every exit path, including an internal
//! panic.

mod git;
mod tempdir;

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::time::Duration;

use marketgate_manifest::ManifestCheck;
use marketgate_scanner::Classification;
use marketgate_types::{PluginEntry, PluginResult};

pub use git::{clone_shallow, CloneError, CLONE_TIMEOUT};
pub use tempdir::{PluginWorkdir, RunTempRoot};

const MANIFEST_CANDIDATES: &[&str] = &["plugin.json", ".claude-plugin/plugin.json"];
const CONTENT_DIRS: &[&str] = &["commands", "hooks", "agents", "skills"];

/// Run the full C2-C6 pipeline for a single marketplace entry, using the
/// default clone deadline ([`CLONE_TIMEOUT`]).
///
/// Never panics out to the caller: an unexpected failure anywhere in the
/// pipeline is caught and recorded as a single error on the returned result.
pub fn run_plugin(entry: &PluginEntry, run_root: &Path) -> PluginResult {
    run_plugin_with_timeout(entry, run_root, CLONE_TIMEOUT)
}

/// Same as [`run_plugin`], but with a caller-supplied clone deadline (e.g.
/// from a `.marketgate.toml` override).
pub fn run_plugin_with_timeout(entry: &PluginEntry, run_root: &Path, clone_timeout: Duration) -> PluginResult {
    let name = entry.name.clone();
    let tier = entry.tier;
    let url = entry.source.url.clone();

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| run_plugin_inner(entry, run_root, clone_timeout)));

    match outcome {
        Ok(result) => result,
        Err(_) => {
            let mut result = PluginResult::new(name, tier, url);
            result.push_error("internal error: plugin pipeline panicked");
            result
        }
    }
}

fn run_plugin_inner(entry: &PluginEntry, run_root: &Path, clone_timeout: Duration) -> PluginResult {
    let mut result = PluginResult::new(entry.name.clone(), entry.tier, entry.source.url.clone());
    tracing::debug!(plugin = %entry.name, tier = %entry.tier, "starting plugin pipeline");

    let workdir = match PluginWorkdir::create(run_root, &entry.name) {
        Ok(w) => w,
        Err(e) => {
            result.push_error(format!("failed to create working directory: {e}"));
            return result;
        }
    };

    if let Err(e) = clone_shallow(&entry.source.url, workdir.path(), clone_timeout) {
        tracing::warn!(plugin = %entry.name, error = %e, "clone failed");
        result.push_error(format!("fetch failed: {e}"));
        return result;
    }

    let repo_root = workdir.path();

    let manifest_path = MANIFEST_CANDIDATES
        .iter()
        .map(|rel| repo_root.join(rel))
        .find(|p| p.exists());

    if manifest_path.is_none() {
        result.push_error("missing plugin manifest (plugin.json or .claude-plugin/plugin.json)");
    }
    if !repo_root.join("README.md").exists() {
        result.push_error("missing required file README.md");
    }
    if !repo_root.join("LICENSE").exists() {
        result.push_error("missing required file LICENSE");
    }
    let has_content_dir = CONTENT_DIRS.iter().any(|d| repo_root.join(d).is_dir());
    if !has_content_dir {
        result.push_error("repository has no content directory (commands, hooks, agents, skills)");
    }

    let manifest_check = manifest_path.as_ref().and_then(|path| {
        let text = std::fs::read_to_string(path).ok()?;
        match serde_json::from_str::<serde_json::Value>(&text) {
            Ok(value) => Some(marketgate_manifest::validate(&value, entry.tier)),
            Err(e) => {
                result.push_error(format!("manifest is not valid JSON: {e}"));
                None
            }
        }
    });

    let declared_network = manifest_check
        .as_ref()
        .map(|c| c.effective_network.clone())
        .unwrap_or_default();

    apply_manifest_check(&mut result, manifest_check.as_ref());

    if let Some(check) = &manifest_check {
        let policy_errors = marketgate_policy::check(entry.tier, &check.effective_network, check.data_egress);
        for e in policy_errors {
            result.push_error(e);
        }
    }

    let walk_result = marketgate_walker::walk(repo_root);
    let (walked_files, network_detected, detected_domains) = match &walk_result {
        Ok(w) => {
            for warning in &w.warnings {
                result.push_warning(warning.clone());
            }
            let scan = marketgate_scanner::scan(repo_root, &w.files).unwrap_or_default();
            apply_scan(&mut result, &scan, entry.tier);
            (w.files.clone(), scan.network_detected, scan.detected_domains)
        }
        Err(e) => {
            result.push_error(format!("repository walk failed: {e}"));
            (Vec::new(), false, Default::default())
        }
    };

    let reconcile_errors = marketgate_reconcile::reconcile(
        entry.tier,
        &declared_network,
        network_detected,
        &detected_domains,
    );
    for e in reconcile_errors {
        result.push_error(e);
    }
    result.network_detected = network_detected;
    result.detected_domains = detected_domains;

    for file in &walked_files {
        if let Ok(rel) = file.path.strip_prefix("commands") {
            if let Some(stem) = command_stem(rel) {
                result.commands.insert(stem);
            }
        }
    }

    result
}

fn command_stem(rel: &Path) -> Option<String> {
    let ext = rel.extension()?.to_string_lossy().to_lowercase();
    if ext != "md" && ext != "txt" {
        return None;
    }
    rel.file_stem().map(|s| s.to_string_lossy().to_string())
}

fn apply_manifest_check(result: &mut PluginResult, check: Option<&ManifestCheck>) {
    let Some(check) = check else { return };
    for e in &check.errors {
        result.push_error(e.clone());
    }
    for w in &check.warnings {
        result.push_warning(w.clone());
    }
}

fn apply_scan(result: &mut PluginResult, scan: &marketgate_scanner::ScanResult, tier: marketgate_types::Tier) {
    for finding in &scan.findings {
        let message = format!(
            "{} finding '{}' at {}:{}: {}",
            finding.class, finding.pattern_name, finding.path, finding.line, finding.snippet
        );
        match marketgate_scanner::classify(finding.class, tier) {
            Classification::Error => result.push_error(message),
            Classification::Warning => result.push_warning(message),
        }
    }
}
