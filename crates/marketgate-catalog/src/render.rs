//! Markdown rendering for the plugin catalog, reproducing the section
//! structure and badge set of the reference catalog generator.

use marketgate_types::Tier;

use crate::extract::PluginInfo;

fn tier_badge(tier: Tier) -> String {
    match tier {
        Tier::Curated => "![Curated](https://img.shields.io/badge/Tier-Curated-7c3aed)".to_string(),
        Tier::Community => "![Community](https://img.shields.io/badge/Tier-Community-blue)".to_string(),
    }
}

fn network_badge(info: &PluginInfo) -> String {
    match info.network_mode.as_str() {
        "none" => "![None](https://img.shields.io/badge/Network-None-success)".to_string(),
        "allowlist" => {
            let domains = info.network_domains.join(", ");
            format!("![Allowlist](https://img.shields.io/badge/Network-Allowlist-yellow) `{domains}`")
        }
        other => format!("![Unknown](https://img.shields.io/badge/Network-{other}-gray)"),
    }
}

fn risk_badge(egress: Option<&str>) -> String {
    let Some(egress) = egress else { return String::new() };
    let color = match egress {
        "low" => "success",
        "medium" => "yellow",
        "high" => "red",
        _ => "gray",
    };
    format!("![Risk: {egress}](https://img.shields.io/badge/Risk-{egress}-{color})")
}

fn render_curated_section(plugins: &[&PluginInfo], lines: &mut Vec<String>) {
    lines.push("---".to_string());
    lines.push(String::new());
    lines.push("## Curated Plugins".to_string());
    lines.push(String::new());
    lines.push("Security-first plugins with no network access. Recommended for teams.".to_string());
    lines.push(String::new());

    if plugins.is_empty() {
        lines.push("*No curated plugins yet.*".to_string());
        lines.push(String::new());
        return;
    }

    for p in plugins {
        lines.push(format!("### {}", p.name));
        lines.push(String::new());
        lines.push(format!("{} {}", tier_badge(p.tier), network_badge(p)));
        lines.push(String::new());
        lines.push(format!("**Description:** {}", p.description));
        lines.push(String::new());
        if let Some(version) = &p.version {
            lines.push(format!("**Version:** {version}"));
        }
        lines.push(format!("**Repository:** [{0}]({0})", p.url));
        if !p.tags.is_empty() {
            lines.push(format!("**Tags:** {}", p.tags.join(", ")));
        }
        lines.push(String::new());

        lines.push("| Capability | Value |".to_string());
        lines.push("|------------|-------|".to_string());
        lines.push("| Network | None |".to_string());
        if !p.fs_write.is_empty() {
            lines.push(format!("| FS Writes | `{}` |", join_limited(&p.fs_write, 3)));
        }
        if !p.commands_allow.is_empty() {
            lines.push(format!("| Commands Allow | `{}` |", join_limited(&p.commands_allow, 3)));
        }
        if !p.commands_deny.is_empty() {
            lines.push(format!("| Commands Deny | `{}` |", join_limited(&p.commands_deny, 3)));
        }
        if !p.secrets_required.is_empty() {
            lines.push(format!("| Secrets Required | `{}` |", p.secrets_required.join(", ")));
        }
        lines.push(String::new());
    }
}

fn render_community_section(plugins: &[&PluginInfo], lines: &mut Vec<String>) {
    lines.push("---".to_string());
    lines.push(String::new());
    lines.push("## Community Plugins".to_string());
    lines.push(String::new());
    lines.push("Community-contributed plugins. May use network via explicit allowlist.".to_string());
    lines.push(String::new());

    if plugins.is_empty() {
        lines.push("*No community plugins yet. [Submit yours!](CONTRIBUTING.md)*".to_string());
        lines.push(String::new());
        return;
    }

    for p in plugins {
        lines.push(format!("### {}", p.name));
        lines.push(String::new());
        lines.push(format!(
            "{} {} {}",
            tier_badge(p.tier),
            network_badge(p),
            risk_badge(p.risk_egress.as_deref())
        ));
        lines.push(String::new());
        lines.push(format!("**Description:** {}", p.description));
        lines.push(String::new());
        if let Some(version) = &p.version {
            lines.push(format!("**Version:** {version}"));
        }
        lines.push(format!("**Repository:** [{0}]({0})", p.url));
        if !p.tags.is_empty() {
            lines.push(format!("**Tags:** {}", p.tags.join(", ")));
        }
        lines.push(String::new());

        lines.push("| Capability | Value |".to_string());
        lines.push("|------------|-------|".to_string());
        if p.network_mode == "allowlist" && !p.network_domains.is_empty() {
            lines.push(format!("| Network Domains | `{}` |", p.network_domains.join(", ")));
        }
        if !p.fs_write.is_empty() {
            lines.push(format!("| FS Writes | `{}` |", join_limited(&p.fs_write, 3)));
        }
        if !p.secrets_required.is_empty() {
            lines.push(format!("| Secrets Required | `{}` |", p.secrets_required.join(", ")));
        }
        if let Some(egress) = &p.risk_egress {
            lines.push(format!("| Risk Level | {egress} |"));
        }
        if let Some(notes) = &p.risk_notes {
            lines.push(format!("| Risk Notes | {notes} |"));
        }
        lines.push(String::new());
    }
}

fn join_limited(items: &[String], limit: usize) -> String {
    items.iter().take(limit).cloned().collect::<Vec<_>>().join(", ")
}

/// Render the full catalog document. `generated_at` is formatted by the
/// caller so this function stays free of wall-clock access.
pub fn render(
    marketplace_name: &str,
    marketplace_version: &str,
    generated_at: &str,
    plugins: &[PluginInfo],
) -> String {
    let mut lines = Vec::new();

    lines.push("# Plugin Catalog".to_string());
    lines.push(String::new());
    lines.push(format!("**Marketplace:** {marketplace_name}"));
    lines.push(format!("**Version:** {marketplace_version}"));
    lines.push(format!("**Generated:** {generated_at}"));
    lines.push(String::new());
    lines.push("> This file is auto-generated by the marketgate catalog command. Do not edit manually.".to_string());
    lines.push(String::new());

    let curated: Vec<&PluginInfo> = plugins.iter().filter(|p| p.tier == Tier::Curated).collect();
    let community: Vec<&PluginInfo> = plugins.iter().filter(|p| p.tier == Tier::Community).collect();

    lines.push("## Summary".to_string());
    lines.push(String::new());
    lines.push(format!("- **Total plugins:** {}", plugins.len()));
    lines.push(format!("- **Curated:** {} (no network access)", curated.len()));
    lines.push(format!("- **Community:** {} (network via allowlist)", community.len()));
    lines.push(String::new());

    render_curated_section(&curated, &mut lines);
    render_community_section(&community, &mut lines);

    lines.push("---".to_string());
    lines.push(String::new());
    lines.push("## Permission Badges Legend".to_string());
    lines.push(String::new());
    lines.push("| Badge | Meaning |".to_string());
    lines.push("|-------|---------|".to_string());
    lines.push("| ![Curated](https://img.shields.io/badge/Tier-Curated-7c3aed) | Security-first, no network |".to_string());
    lines.push("| ![Community](https://img.shields.io/badge/Tier-Community-blue) | Network via allowlist |".to_string());
    lines.push("| ![None](https://img.shields.io/badge/Network-None-success) | No network access |".to_string());
    lines.push("| ![Allowlist](https://img.shields.io/badge/Network-Allowlist-yellow) | Specific domains only |".to_string());
    lines.push("| ![Risk: low](https://img.shields.io/badge/Risk-low-success) | Low data egress risk |".to_string());
    lines.push("| ![Risk: medium](https://img.shields.io/badge/Risk-medium-yellow) | Medium data egress risk |".to_string());
    lines.push("| ![Risk: high](https://img.shields.io/badge/Risk-high-red) | High data egress risk |".to_string());
    lines.push(String::new());

    lines.join("\n")
}

/// Strip the `**Generated:**` line before comparing two renderings for
/// drift, matching the `--check` semantics.
pub fn strip_generated_line(content: &str) -> String {
    content
        .lines()
        .filter(|line| !line.starts_with("**Generated:**"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PluginInfo {
        PluginInfo {
            name: "x".to_string(),
            tier: Tier::Curated,
            description: "d".to_string(),
            url: "https://example.com/x.git".to_string(),
            network_mode: "none".to_string(),
            ..PluginInfo::default()
        }
    }

    #[test]
    fn empty_curated_section_says_no_plugins_yet() {
        let out = render("m", "1.0.0", "2026-01-01 00:00 UTC", &[]);
        assert!(out.contains("*No curated plugins yet.*"));
        assert!(out.contains("*No community plugins yet."));
    }

    #[test]
    fn renders_one_curated_plugin_section() {
        let out = render("m", "1.0.0", "2026-01-01 00:00 UTC", &[sample()]);
        assert!(out.contains("### x"));
        assert!(out.contains("Tier-Curated"));
    }

    #[test]
    fn check_ignores_generated_timestamp() {
        let a = render("m", "1.0.0", "2026-01-01 00:00 UTC", &[sample()]);
        let b = render("m", "1.0.0", "2030-12-31 23:59 UTC", &[sample()]);
        assert_ne!(a, b);
        assert_eq!(strip_generated_line(&a), strip_generated_line(&b));
    }

    #[test]
    fn renders_empty_catalog_snapshot() {
        let out = render("demo-marketplace", "1.0.0", "2026-01-01 00:00 UTC", &[]);
        insta::assert_snapshot!(out, @r#"
        # Plugin Catalog

        **Marketplace:** demo-marketplace
        **Version:** 1.0.0
        **Generated:** 2026-01-01 00:00 UTC

        > This file is auto-generated by the marketgate catalog command. Do not edit manually.

        ## Summary

        - **Total plugins:** 0
        - **Curated:** 0 (no network access)
        - **Community:** 0 (network via allowlist)

        ---

        ## Curated Plugins

        Security-first plugins with no network access. Recommended for teams.

        *No curated plugins yet.*

        ---

        ## Community Plugins

        Community-contributed plugins. May use network via explicit allowlist.

        *No community plugins yet. [Submit yours!](CONTRIBUTING.md)*

        ---

        ## Permission Badges Legend

        | Badge | Meaning |
        |-------|---------|
        | ![Curated](https://img.shields.io/badge/Tier-Curated-7c3aed) | Security-first, no network |
        | ![Community](https://img.shields.io/badge/Tier-Community-blue) | Network via allowlist |
        | ![None](https://img.shields.io/badge/Network-None-success) | No network access |
        | ![Allowlist](https://img.shields.io/badge/Network-Allowlist-yellow) | Specific domains only |
        | ![Risk: low](https://img.shields.io/badge/Risk-low-success) | Low data egress risk |
        | ![Risk: medium](https://img.shields.io/badge/Risk-medium-yellow) | Medium data egress risk |
        | ![Risk: high](https://img.shields.io/badge/Risk-high-red) | High data egress risk |
        "#);
    }

    #[test]
    fn renders_one_curated_plugin_snapshot() {
        let out = render("demo-marketplace", "1.0.0", "2026-01-01 00:00 UTC", &[sample()]);
        insta::assert_snapshot!(out, @r#"
        # Plugin Catalog

        **Marketplace:** demo-marketplace
        **Version:** 1.0.0
        **Generated:** 2026-01-01 00:00 UTC

        > This file is auto-generated by the marketgate catalog command. Do not edit manually.

        ## Summary

        - **Total plugins:** 1
        - **Curated:** 1 (no network access)
        - **Community:** 0 (network via allowlist)

        ---

        ## Curated Plugins

        Security-first plugins with no network access. Recommended for teams.

        ### x

        ![Curated](https://img.shields.io/badge/Tier-Curated-7c3aed) ![None](https://img.shields.io/badge/Network-None-success)

        **Description:** d

        **Repository:** [https://example.com/x.git](https://example.com/x.git)

        | Capability | Value |
        |------------|-------|
        | Network | None |

        ---

        ## Community Plugins

        Community-contributed plugins. May use network via explicit allowlist.

        *No community plugins yet. [Submit yours!](CONTRIBUTING.md)*

        ---

        ## Permission Badges Legend

        | Badge | Meaning |
        |-------|---------|
        | ![Curated](https://img.shields.io/badge/Tier-Curated-7c3aed) | Security-first, no network |
        | ![Community](https://img.shields.io/badge/Tier-Community-blue) | Network via allowlist |
        | ![None](https://img.shields.io/badge/Network-None-success) | No network access |
        | ![Allowlist](https://img.shields.io/badge/Network-Allowlist-yellow) | Specific domains only |
        | ![Risk: low](https://img.shields.io/badge/Risk-low-success) | Low data egress risk |
        | ![Risk: medium](https://img.shields.io/badge/Risk-medium-yellow) | Medium data egress risk |
        | ![Risk: high](https://img.shields.io/badge/Risk-high-red) | High data egress risk |
        "#);
    }
}
