//! Static security scanner (C3): runs the pattern tables over the subset of
//! a walked repository that lives under a content directory.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path};

use marketgate_patterns::{self as patterns, ALL_CLASSES};
use marketgate_types::{Finding, FindingClass, Tier};
use marketgate_walker::WalkedFile;

const CONTENT_DIRS: &[&str] = &["commands", "hooks", "agents", "skills"];
const SCANNED_EXTENSIONS: &[&str] = &[
    "py", "js", "ts", "sh", "bash", "zsh", "rb", "go", "rs", "ps1",
];

/// Outcome of scanning one plugin's files.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    pub findings: Vec<Finding>,
    /// True once any network-code/shell-network pattern matched, regardless
    /// of tier. Whether a given finding is an error or a warning for this
    /// plugin is a separate question; see [`classify`].
    pub network_detected: bool,
    pub detected_domains: BTreeSet<String>,
}

fn is_under_content_dir(path: &Path) -> bool {
    path.components().any(|c| match c {
        Component::Normal(s) => CONTENT_DIRS.contains(&s.to_string_lossy().as_ref()),
        _ => false,
    })
}

fn has_scanned_extension(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|e| SCANNED_EXTENSIONS.contains(&e.as_str()))
}

/// Redact a matched snippet for secret findings: keep first 8 and last 4
/// characters, collapse the middle. Non-secret classes are truncated only.
fn redact_snippet(class: FindingClass, line: &str) -> String {
    const MAX_LEN: usize = 200;
    let trimmed = line.trim();
    if class != FindingClass::Secret {
        return if trimmed.len() > MAX_LEN {
            format!("{}…", &trimmed[..MAX_LEN])
        } else {
            trimmed.to_string()
        };
    }
    let chars: Vec<char> = trimmed.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..8].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}…{tail}")
}

/// Scan `walked` files under `root`, emitting a [`Finding`] per pattern
/// match. Tier-dependent error/warning classification is left to the caller
/// via [`classify`].
pub fn scan(root: &Path, walked: &[WalkedFile]) -> std::io::Result<ScanResult> {
    let mut result = ScanResult::default();

    for file in walked {
        if !is_under_content_dir(&file.path) || !has_scanned_extension(&file.path) {
            continue;
        }

        let bytes = fs::read(root.join(&file.path))?;
        let text = String::from_utf8_lossy(&bytes);

        for (line_no, line) in text.split('\n').enumerate() {
            if patterns::is_comment_line(line) {
                continue;
            }

            for &class in &ALL_CLASSES {
                for pattern in patterns::patterns_for(class) {
                    if !pattern.is_match(line) {
                        continue;
                    }

                    if matches!(class, FindingClass::NetworkCode | FindingClass::ShellNetwork) {
                        if let Some(host) = patterns::extract_host(line) {
                            result.detected_domains.insert(host);
                        }
                        // Detection is tier-independent; only the error/warning
                        // classification of the finding itself (see `classify`)
                        // depends on tier. The reconciler needs to know a
                        // plugin *did* use the network even when that use was
                        // already an error for a curated plugin.
                        result.network_detected = true;
                    }

                    result.findings.push(Finding {
                        path: file.path.to_string_lossy().to_string(),
                        line: line_no + 1,
                        class,
                        pattern_name: pattern.name.to_string(),
                        snippet: redact_snippet(class, line),
                    });
                }
            }
        }
    }

    Ok(result)
}

/// Classification of a finding's effect on the plugin result, per §4.3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Error,
    Warning,
}

/// How a finding of `class` is treated for a plugin of `tier`.
pub fn classify(class: FindingClass, tier: Tier) -> Classification {
    match class {
        FindingClass::Secret | FindingClass::Telemetry => Classification::Error,
        FindingClass::NetworkCode | FindingClass::ShellNetwork => match tier {
            Tier::Curated => Classification::Error,
            Tier::Community => Classification::Warning,
        },
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use std::fs::{self as stdfs, File};
    use std::io::Write;

    fn write_file(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            stdfs::create_dir_all(parent).unwrap();
        }
        File::create(path).unwrap().write_all(contents.as_bytes()).unwrap();
    }

    #[test]
    fn ignores_files_outside_content_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        write_file(tmp.path(), "lib/helper.py", "api_key = \"sk-abcdefghijklmnopqrstuvwxyz\"");
        let walked = vec![WalkedFile {
            path: "lib/helper.py".into(),
            size: 10,
        }];
        let result = scan(tmp.path(), &walked).unwrap();
        assert!(result.findings.is_empty());
    }

    #[test]
    fn finds_secret_in_commands_dir() {
        let tmp = tempfile::tempdir().unwrap();
        write_file(
            tmp.path(),
            "commands/run.py",
            "api_key = \"sk-abcdefghijklmnopqrstuvwxyz\"",
        );
        let walked = vec![WalkedFile {
            path: "commands/run.py".into(),
            size: 10,
        }];
        let result = scan(tmp.path(), &walked).unwrap();
        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.findings[0].line, 1);
        assert_eq!(result.findings[0].class, FindingClass::Secret);
    }

    #[test]
    fn network_call_sets_detected_flag_and_extracts_host() {
        let tmp = tempfile::tempdir().unwrap();
        write_file(tmp.path(), "commands/x.sh", "curl https://api.example.com/\n");
        let walked = vec![WalkedFile {
            path: "commands/x.sh".into(),
            size: 10,
        }];

        let result = scan(tmp.path(), &walked).unwrap();
        assert!(result.network_detected);
        assert!(result.detected_domains.contains("api.example.com"));
    }

    #[test]
    fn comment_lines_are_never_reported() {
        let tmp = tempfile::tempdir().unwrap();
        write_file(tmp.path(), "commands/run.py", "# api_key = \"sk-abcdefghijklmnopqrstuvwxyz\"");
        let walked = vec![WalkedFile {
            path: "commands/run.py".into(),
            size: 10,
        }];
        let result = scan(tmp.path(), &walked).unwrap();
        assert!(result.findings.is_empty());
    }

    #[test]
    fn classify_matches_tier_rules() {
        assert_eq!(classify(FindingClass::Secret, Tier::Community), Classification::Error);
        assert_eq!(classify(FindingClass::Telemetry, Tier::Curated), Classification::Error);
        assert_eq!(classify(FindingClass::NetworkCode, Tier::Curated), Classification::Error);
        assert_eq!(classify(FindingClass::NetworkCode, Tier::Community), Classification::Warning);
    }

    proptest! {
        #[test]
        fn short_secret_snippets_are_fully_masked(body in "[A-Za-z0-9_-]{1,12}") {
            let redacted = redact_snippet(FindingClass::Secret, &body);
            prop_assert_eq!(redacted.chars().count(), body.chars().count());
            prop_assert!(redacted.chars().all(|c| c == '*'));
        }

        #[test]
        fn long_secret_snippets_never_expose_the_middle(body in "[A-Za-z0-9_-]{13,80}") {
            let redacted = redact_snippet(FindingClass::Secret, &body);
            let head: String = body.chars().take(8).collect();
            let tail: String = body.chars().skip(body.chars().count() - 4).collect();
            prop_assert!(redacted.starts_with(&head));
            prop_assert!(redacted.ends_with(&tail));
            prop_assert!(redacted.contains('…'));
            prop_assert!(!redacted.contains(&body));
        }

        #[test]
        fn non_secret_classes_are_never_masked(
            class in proptest::sample::select(vec![
                FindingClass::NetworkCode,
                FindingClass::ShellNetwork,
                FindingClass::Telemetry,
            ]),
            body in "[A-Za-z0-9_ /:.-]{1,150}",
        ) {
            let redacted = redact_snippet(class, &body);
            prop_assert_eq!(redacted, body.trim().to_string());
        }
    }
}
