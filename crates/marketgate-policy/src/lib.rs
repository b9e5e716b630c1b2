//! Tier policy engine (C5): maps `(tier, declared network, declared risk)`
//! to policy errors, independent of anything the scanner observed.

use marketgate_types::{DataEgress, DeclaredNetwork, NetworkMode, Tier};

/// Evaluate tier policy for a plugin's declared (not observed) capabilities.
pub fn check(tier: Tier, network: &DeclaredNetwork, data_egress: Option<DataEgress>) -> Vec<String> {
    let mut errors = Vec::new();

    match tier {
        Tier::Curated => {
            if network.mode != NetworkMode::None {
                errors.push(
                    "curated plugins must not declare network access; move to community or remove network"
                        .to_string(),
                );
            }
            if matches!(data_egress, Some(DataEgress::Medium) | Some(DataEgress::High)) {
                errors.push(
                    "curated plugins may not declare medium/high risk data egress".to_string(),
                );
            }
        }
        Tier::Community => {
            if network.mode == NetworkMode::Allowlist && network.domains.is_empty() {
                errors.push(
                    "capabilities.network.mode 'allowlist' requires a non-empty domains list"
                        .to_string(),
                );
            }
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn curated_with_network_is_error() {
        let network = DeclaredNetwork {
            mode: NetworkMode::Allowlist,
            domains: BTreeSet::from(["api.example.com".to_string()]),
        };
        let errors = check(Tier::Curated, &network, None);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn curated_with_high_risk_is_error() {
        let network = DeclaredNetwork::default();
        let errors = check(Tier::Curated, &network, Some(DataEgress::High));
        assert!(errors.iter().any(|e| e.contains("risk")));
    }

    #[test]
    fn curated_clean_has_no_errors() {
        let network = DeclaredNetwork::default();
        assert!(check(Tier::Curated, &network, Some(DataEgress::Low)).is_empty());
    }

    #[test]
    fn community_allowlist_with_empty_domains_is_error() {
        let network = DeclaredNetwork {
            mode: NetworkMode::Allowlist,
            domains: BTreeSet::new(),
        };
        let errors = check(Tier::Community, &network, Some(DataEgress::Low));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn community_none_mode_is_fine() {
        let network = DeclaredNetwork::default();
        assert!(check(Tier::Community, &network, Some(DataEgress::Low)).is_empty());
    }
}
