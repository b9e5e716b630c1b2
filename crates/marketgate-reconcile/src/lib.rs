//! Consistency reconciler (C6): cross-checks the manifest's declared
//! capabilities against what the scanner actually observed.

use std::collections::BTreeSet;

use marketgate_types::{DeclaredNetwork, NetworkMode, Tier};

/// Reconcile `declared` capabilities against the scanner's observations for
/// a plugin of `tier`. Returns consistency errors; the empty vec means
/// declared and observed capabilities agree.
pub fn reconcile(
    tier: Tier,
    declared: &DeclaredNetwork,
    network_detected: bool,
    detected_domains: &BTreeSet<String>,
) -> Vec<String> {
    let mut errors = Vec::new();

    if network_detected && declared.mode == NetworkMode::None {
        errors.push("CONSISTENCY: network code detected but declared none".to_string());
    }

    if tier == Tier::Community && declared.mode == NetworkMode::Allowlist {
        let undeclared: Vec<&String> = detected_domains.difference(&declared.domains).collect();
        if !undeclared.is_empty() {
            let list = undeclared
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            errors.push(format!(
                "CONSISTENCY: detected domains not in declared allowlist: {list}"
            ));
        }
    }

    errors
}
