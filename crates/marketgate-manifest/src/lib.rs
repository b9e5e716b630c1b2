//! Manifest schema validator (C4).
//!
//! Operates on the raw `serde_json::Value` rather than a strict `Deserialize`
//! target because error/warning wording needs to name the offending field,
//! and because the catalog generator needs a separate, more permissive read
//! of the same document (see `marketgate-catalog`).

use std::net::Ipv4Addr;

use marketgate_types::{DataEgress, DeclaredNetwork, NetworkMode, Tier};
use serde_json::Value;

fn is_kebab_case(s: &str) -> bool {
    !s.is_empty()
        && s.chars().next().is_some_and(|c| c.is_ascii_lowercase())
        && s.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

fn looks_like_semver(s: &str) -> bool {
    semver::Version::parse(s).is_ok()
}

fn is_valid_domain_label_sequence(s: &str) -> bool {
    if s.is_empty() || s.len() > 253 {
        return false;
    }
    s.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && label.chars().next().is_some_and(|c| c.is_ascii_alphanumeric())
            && label.chars().last().is_some_and(|c| c.is_ascii_alphanumeric())
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}

fn is_bare_ipv4(s: &str) -> bool {
    s.parse::<Ipv4Addr>().is_ok()
}

fn is_valid_domain(s: &str) -> bool {
    !s.starts_with("*.") && !is_bare_ipv4(s) && is_valid_domain_label_sequence(s)
}

/// Result of validating one manifest.
#[derive(Debug, Clone, Default)]
pub struct ManifestCheck {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub is_legacy: bool,
    pub effective_policy_tier: Tier,
    pub effective_network: DeclaredNetwork,
    pub data_egress: Option<DataEgress>,
}

impl ManifestCheck {
    fn error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    fn warn(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }
}

fn parse_tier(s: &str) -> Option<Tier> {
    match s {
        "curated" | "official" => Some(Tier::Curated),
        "community" => Some(Tier::Community),
        _ => None,
    }
}

fn parse_data_egress(s: &str) -> Option<DataEgress> {
    match s {
        "low" => Some(DataEgress::Low),
        "medium" => Some(DataEgress::Medium),
        "high" => Some(DataEgress::High),
        _ => None,
    }
}

/// Validate `manifest` (the parsed `plugin.json`) against `entry_tier` (the
/// tier declared in the marketplace index for this plugin).
pub fn validate(manifest: &Value, entry_tier: Tier) -> ManifestCheck {
    let mut check = ManifestCheck {
        effective_policy_tier: entry_tier,
        ..ManifestCheck::default()
    };

    let obj = manifest.as_object();

    match obj.and_then(|o| o.get("name")).and_then(Value::as_str) {
        Some(name) if !name.is_empty() => {
            if !is_kebab_case(name) {
                check.warn(format!("manifest name '{name}' is not lowercase with hyphens"));
            }
        }
        _ => check.error("manifest is missing required field 'name'"),
    }

    match obj.and_then(|o| o.get("version")).and_then(Value::as_str) {
        Some(version) => {
            if !looks_like_semver(version) {
                check.warn(format!("manifest version '{version}' is not valid semver"));
            }
        }
        None => check.warn("manifest is missing recommended field 'version'"),
    }

    if obj.and_then(|o| o.get("description")).and_then(Value::as_str).is_none() {
        check.warn("manifest is missing recommended field 'description'");
    }

    let has_policy_tier = obj.is_some_and(|o| o.contains_key("policyTier"));
    let has_capabilities = obj.is_some_and(|o| o.contains_key("capabilities"));
    check.is_legacy = !has_policy_tier && !has_capabilities;

    if check.is_legacy {
        check.warn("manifest is a legacy manifest: missing 'policyTier'");
        check.warn("manifest is a legacy manifest: missing 'capabilities'");
        check.effective_policy_tier = entry_tier;
        check.effective_network = DeclaredNetwork::default();
        return finish(check, entry_tier);
    }

    if let Some(raw_tier) = obj.and_then(|o| o.get("policyTier")).and_then(Value::as_str) {
        match parse_tier(raw_tier) {
            Some(tier) => {
                check.effective_policy_tier = tier;
                if tier != entry_tier {
                    check.error(format!(
                        "manifest policyTier '{raw_tier}' does not match marketplace tier '{entry_tier}'"
                    ));
                }
            }
            None => check.error(format!("manifest policyTier '{raw_tier}' is not one of curated, community")),
        }
    } else if has_policy_tier {
        check.error("manifest field 'policyTier' must be a string");
    }

    if let Some(caps) = obj.and_then(|o| o.get("capabilities")) {
        validate_capabilities(caps, &mut check);
    }

    let effective_tier_for_risk = if has_policy_tier {
        check.effective_policy_tier
    } else {
        entry_tier
    };
    if effective_tier_for_risk == Tier::Community {
        match obj.and_then(|o| o.get("risk")).and_then(|r| r.get("dataEgress")).and_then(Value::as_str) {
            Some(raw) => match parse_data_egress(raw) {
                Some(egress) => check.data_egress = Some(egress),
                None => check.error(format!("risk.dataEgress '{raw}' is not one of low, medium, high")),
            },
            None => check.error("risk required: community plugins must declare risk.dataEgress"),
        }
    } else if let Some(raw) = obj.and_then(|o| o.get("risk")).and_then(|r| r.get("dataEgress")).and_then(Value::as_str) {
        check.data_egress = parse_data_egress(raw);
    }

    finish(check, entry_tier)
}

fn finish(check: ManifestCheck, _entry_tier: Tier) -> ManifestCheck {
    check
}

fn validate_capabilities(caps: &Value, check: &mut ManifestCheck) {
    let Some(caps_obj) = caps.as_object() else {
        check.error("manifest field 'capabilities' must be an object");
        return;
    };

    let Some(network) = caps_obj.get("network") else {
        return;
    };
    let Some(network_obj) = network.as_object() else {
        check.error("manifest field 'capabilities.network' must be an object");
        return;
    };

    let mode_str = network_obj.get("mode").and_then(Value::as_str);
    let mode = match mode_str {
        Some("none") => NetworkMode::None,
        Some("allowlist") => NetworkMode::Allowlist,
        Some(other) => {
            check.error(format!("capabilities.network.mode '{other}' is not one of none, allowlist"));
            return;
        }
        None => {
            check.error("capabilities.network.mode is required when capabilities is present");
            return;
        }
    };

    let domains_value = network_obj.get("domains");
    let domains: Vec<String> = domains_value
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    match mode {
        NetworkMode::None => {
            if domains_value.is_some_and(|v| v.as_array().is_some_and(|a| !a.is_empty())) {
                check.error("capabilities.network.domains must be empty when mode is 'none'");
            }
        }
        NetworkMode::Allowlist => {
            if domains.is_empty() {
                check.error("capabilities.network.mode 'allowlist' requires a non-empty domains list");
            }
            for domain in &domains {
                if domain.starts_with("*.") {
                    check.error(format!("domain '{domain}' uses a wildcard, which is not allowed"));
                } else if is_bare_ipv4(domain) {
                    check.error(format!("domain '{domain}' is a bare IP address, which is not allowed"));
                } else if !is_valid_domain(domain) {
                    check.error(format!("domain '{domain}' does not match the expected domain syntax"));
                }
            }
        }
    }

    check.effective_network = DeclaredNetwork {
        mode,
        domains: domains.into_iter().collect(),
    };
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_json::json;

    use super::*;

    #[test]
    fn clean_curated_manifest_passes() {
        let manifest = json!({
            "name": "x",
            "version": "1.0.0",
            "description": "d",
            "policyTier": "curated",
            "capabilities": {"network": {"mode": "none"}}
        });
        let check = validate(&manifest, Tier::Curated);
        assert!(check.errors.is_empty());
        assert!(check.warnings.is_empty());
        assert!(!check.is_legacy);
    }

    #[test]
    fn missing_both_policy_tier_and_capabilities_is_legacy() {
        let manifest = json!({"name": "x", "version": "1.0.0", "description": "d"});
        let check = validate(&manifest, Tier::Curated);
        assert!(check.is_legacy);
        assert_eq!(check.warnings.len(), 2);
        assert!(check.warnings.iter().all(|w| w.contains("legacy")));
        assert_eq!(check.effective_network.mode, NetworkMode::None);
    }

    #[test]
    fn policy_tier_absent_but_capabilities_present_is_not_legacy() {
        let manifest = json!({
            "name": "x",
            "capabilities": {"network": {"mode": "none"}}
        });
        let check = validate(&manifest, Tier::Curated);
        assert!(!check.is_legacy);
    }

    #[test]
    fn wildcard_domain_is_manifest_schema_error() {
        let manifest = json!({
            "name": "x",
            "policyTier": "community",
            "capabilities": {"network": {"mode": "allowlist", "domains": ["*.example.com"]}},
            "risk": {"dataEgress": "low"}
        });
        let check = validate(&manifest, Tier::Community);
        assert!(check.errors.iter().any(|e| e.contains("wildcard")));
    }

    #[test]
    fn bare_ipv4_domain_is_error() {
        let manifest = json!({
            "name": "x",
            "policyTier": "community",
            "capabilities": {"network": {"mode": "allowlist", "domains": ["10.0.0.1"]}},
            "risk": {"dataEgress": "low"}
        });
        let check = validate(&manifest, Tier::Community);
        assert!(check.errors.iter().any(|e| e.contains("IP address")));
    }

    #[test]
    fn community_without_risk_is_error() {
        let manifest = json!({
            "name": "x",
            "policyTier": "community",
            "capabilities": {"network": {"mode": "none"}}
        });
        let check = validate(&manifest, Tier::Community);
        assert!(check.errors.iter().any(|e| e.contains("risk required")));
    }

    #[test]
    fn bad_semver_warns_but_does_not_reject() {
        let manifest = json!({"name": "x", "version": "not-semver", "description": "d", "policyTier": "curated", "capabilities": {"network": {"mode": "none"}}});
        let check = validate(&manifest, Tier::Curated);
        assert!(check.errors.is_empty());
        assert!(check.warnings.iter().any(|w| w.contains("semver")));
    }

    #[test]
    fn policy_tier_mismatch_with_entry_is_error() {
        let manifest = json!({"name": "x", "policyTier": "community", "capabilities": {"network": {"mode": "none"}}, "risk": {"dataEgress": "low"}});
        let check = validate(&manifest, Tier::Curated);
        assert!(check.errors.iter().any(|e| e.contains("does not match")));
    }

    proptest! {
        #[test]
        fn valid_label_sequences_are_accepted(
            labels in proptest::collection::vec("[a-z][a-z0-9]{0,10}", 1..5),
        ) {
            let domain = labels.join(".");
            prop_assume!(domain.len() <= 253);
            prop_assert!(is_valid_domain(&domain));
        }

        #[test]
        fn wildcard_prefix_is_never_a_valid_domain(rest in "[a-z][a-z0-9.-]{0,30}") {
            let domain = format!("*.{rest}");
            prop_assert!(!is_valid_domain(&domain));
        }

        #[test]
        fn bare_ipv4_is_never_a_valid_domain(a in 0u8..=255, b in 0u8..=255, c in 0u8..=255, d in 0u8..=255) {
            let domain = format!("{a}.{b}.{c}.{d}");
            prop_assert!(!is_valid_domain(&domain));
        }

        #[test]
        fn labels_with_underscores_are_rejected(
            labels in proptest::collection::vec("[a-z][a-z0-9_]{1,10}", 1..3),
        ) {
            let domain = labels.join(".");
            prop_assume!(domain.contains('_'));
            prop_assert!(!is_valid_domain(&domain));
        }
    }
}
