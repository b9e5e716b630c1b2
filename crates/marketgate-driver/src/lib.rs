//! Marketplace driver (C8): loads and schema-checks the index, fans the
//! per-plugin pipeline out across a worker pool, and aggregates the results
//! into a final [`Report`].

mod index;

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use marketgate_orchestrator::RunTempRoot;
use marketgate_types::PluginResult;

pub use index::IndexError;
use index::EntrySlot;

/// Final aggregated outcome of one validation run.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Report {
    pub marketplace_name: String,
    pub marketplace_version: String,
    pub owner_name: String,
    /// Index-level warnings (e.g. non-semver index version).
    pub warnings: Vec<String>,
    /// Per-plugin results, in the same order as the index's `plugins` list.
    pub results: Vec<PluginResult>,
    /// Command names used by two or more plugins, for collision warnings.
    pub command_collisions: Vec<(String, Vec<String>)>,
}

impl Report {
    /// `0` iff every plugin result has no errors (§4.8, §8).
    pub fn exit_code(&self) -> i32 {
        if self.results.iter().all(PluginResult::passed) {
            0
        } else {
            1
        }
    }
}

/// Default worker count used by [`run`]: the lesser of plugin count and
/// available parallelism. `run_with_concurrency` lets callers override this
/// (the CLI does not expose it, per the "no CLI-alterable limits" design
/// note).
fn default_concurrency(n: usize) -> usize {
    let cpus = thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
    n.min(cpus).max(1)
}

/// Load the index at `index_path`, validate its shape, and drive the
/// per-plugin pipeline across all entries using the default clone deadline.
///
/// Returns `Err` only for a fatal `IndexSchema` violation; a plugin-level
/// failure never aborts the run.
pub fn run(index_path: &Path) -> Result<Report, IndexError> {
    run_with_clone_timeout(index_path, None)
}

/// Same as [`run`], but with an optional clone deadline override (e.g. from
/// a `.marketgate.toml` config file). `None` keeps the orchestrator's
/// default.
pub fn run_with_clone_timeout(index_path: &Path, clone_timeout: Option<Duration>) -> Result<Report, IndexError> {
    let text = std::fs::read_to_string(index_path).map_err(|e| {
        IndexError::Json(serde_json::Error::io(e))
    })?;
    let parsed = index::parse(&text)?;
    let concurrency = default_concurrency(parsed.entries.len());
    Ok(run_parsed(parsed, concurrency, clone_timeout))
}

fn run_parsed(parsed: index::ParsedIndex, concurrency: usize, clone_timeout: Option<Duration>) -> Report {
    let run_root = RunTempRoot::create().expect("failed to create run temp root");
    let run_root_path = Arc::new(run_root.path().to_path_buf());

    let placeholders: Vec<Option<PluginResult>> = (0..parsed.entries.len()).map(|_| None).collect();
    let shared_results = Arc::new(Mutex::new(placeholders));

    let entries: Vec<(usize, EntrySlot)> = parsed.entries.into_iter().enumerate().collect();
    for chunk in entries.chunks(concurrency.max(1)) {
        let mut handles = Vec::new();
        for (idx, slot) in chunk {
            let idx = *idx;
            let run_root_path = Arc::clone(&run_root_path);
            let shared_results = Arc::clone(&shared_results);
            match slot {
                EntrySlot::Parsed(entry) => {
                    let entry = entry.clone();
                    handles.push(thread::spawn(move || {
                        tracing::info!(plugin = %entry.name, "running plugin pipeline");
                        let result = match clone_timeout {
                            Some(timeout) => {
                                marketgate_orchestrator::run_plugin_with_timeout(&entry, &run_root_path, timeout)
                            }
                            None => marketgate_orchestrator::run_plugin(&entry, &run_root_path),
                        };
                        shared_results.lock().unwrap()[idx] = Some(result);
                    }));
                }
                EntrySlot::Invalid { raw_name, reason } => {
                    let mut result = PluginResult::new(
                        raw_name.clone(),
                        marketgate_types::Tier::Community,
                        String::new(),
                    );
                    result.push_error(format!("failed to parse plugin entry: {reason}"));
                    shared_results.lock().unwrap()[idx] = Some(result);
                }
            }
        }
        for handle in handles {
            handle.join().expect("plugin worker thread panicked");
        }
    }

    let results: Vec<PluginResult> = Arc::try_unwrap(shared_results)
        .unwrap()
        .into_inner()
        .unwrap()
        .into_iter()
        .map(|r| r.expect("every index slot produces exactly one result"))
        .collect();

    let command_collisions = compute_collisions(&results);

    Report {
        marketplace_name: parsed.name,
        marketplace_version: parsed.version,
        owner_name: parsed.owner_name,
        warnings: parsed.warnings,
        results,
        command_collisions,
    }
}

fn compute_collisions(results: &[PluginResult]) -> Vec<(String, Vec<String>)> {
    use std::collections::BTreeMap;
    let mut owners: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for result in results {
        for command in &result.commands {
            owners.entry(command.clone()).or_default().push(result.name.clone());
        }
    }
    owners.into_iter().filter(|(_, plugins)| plugins.len() >= 2).collect()
}
