//! Shared data model for the marketgate plugin validator and catalog
//! generator.
//!
//! These types are intentionally permissive at the edges (legacy aliases,
//! optional fields) because the untrusted marketplace index and plugin
//! manifests are the system's primary input surface; strictness is enforced
//! by the schema/policy crates, not by deserialization failures here.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Trust tier of a plugin. `curated` plugins may not use the network;
/// `community` plugins may, through an explicit domain allowlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    #[serde(alias = "official")]
    Curated,
    Community,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Curated => write!(f, "curated"),
            Tier::Community => write!(f, "community"),
        }
    }
}

/// Declared network capability mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkMode {
    #[default]
    None,
    Allowlist,
}

/// Declared data-egress risk level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataEgress {
    Low,
    Medium,
    High,
}

/// Transport type for a plugin's source. The only variant is `git`; the
/// legacy value `url` means the same thing and is normalized away on
/// deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum RawSourceType {
    Git,
    Url,
}

/// Where a plugin's source is fetched from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Source {
    pub url: String,
}

impl<'de> Deserialize<'de> for Source {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct RawSource {
            // Legacy marketplaces name this field `source` instead of
            // `type`; both spellings mean the same thing (issue predates
            // the schema settling on `type`).
            #[serde(rename = "type", alias = "source", default)]
            kind: Option<RawSourceType>,
            url: String,
        }

        let raw = RawSource::deserialize(deserializer)?;
        // Absence of a type tag or an explicit `git`/legacy `url` value are
        // all treated as git — it is the only transport this system knows.
        let _ = raw.kind.unwrap_or(RawSourceType::Git);
        Ok(Source { url: raw.url })
    }
}

/// One record in the marketplace index.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PluginEntry {
    pub name: String,
    // Legacy marketplaces call this field `category`.
    #[serde(alias = "category")]
    pub tier: Tier,
    #[serde(default)]
    pub tags: Vec<String>,
    pub source: Source,
}

/// Marketplace owner metadata. Only `name` is load-bearing; the rest is
/// opaque passthrough preserved for the catalog renderer.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Owner {
    pub name: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The top-level marketplace registry document.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MarketplaceIndex {
    pub name: String,
    pub version: String,
    pub owner: Owner,
    pub plugins: Vec<PluginEntry>,
}

/// Effective (post-default) declared network capability of a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeclaredNetwork {
    pub mode: NetworkMode,
    pub domains: BTreeSet<String>,
}

/// The class of a scanner finding, in ascending order of how it is treated
/// by tier policy (secrets and telemetry are unconditional; the rest are
/// tier-dependent).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FindingClass {
    Secret,
    NetworkCode,
    ShellNetwork,
    Telemetry,
}

impl fmt::Display for FindingClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FindingClass::Secret => "secret",
            FindingClass::NetworkCode => "network-code",
            FindingClass::ShellNetwork => "shell-network",
            FindingClass::Telemetry => "telemetry",
        };
        write!(f, "{s}")
    }
}

/// One scanner hit: a pattern matched on one line of one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    /// Path relative to the repository root.
    pub path: String,
    /// 1-based line number.
    pub line: usize,
    pub class: FindingClass,
    pub pattern_name: String,
    /// Truncated, and for secrets redacted to first-8 + last-4 characters.
    pub snippet: String,
}

/// Accumulated validation result for a single plugin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginResult {
    pub name: String,
    pub tier: Tier,
    pub url: String,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub network_detected: bool,
    pub detected_domains: BTreeSet<String>,
    pub commands: BTreeSet<String>,
}

impl PluginResult {
    pub fn new(name: impl Into<String>, tier: Tier, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tier,
            url: url.into(),
            errors: Vec::new(),
            warnings: Vec::new(),
            network_detected: false,
            detected_domains: BTreeSet::new(),
            commands: BTreeSet::new(),
        }
    }

    pub fn push_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    pub fn push_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    pub fn passed(&self) -> bool {
        self.errors.is_empty()
    }
}
