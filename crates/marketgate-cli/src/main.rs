use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use marketgate_driver::Report;
use marketgate_types::PluginResult;

mod progress;

#[derive(Parser, Debug)]
#[command(name = "marketgate", version)]
#[command(about = "Validate a plugin marketplace index and generate its catalog")]
struct Cli {
    /// Path to the marketplace index JSON file.
    #[arg(long, global = true, default_value = "marketplace.json")]
    index: PathBuf,

    /// Output format for the validation report.
    #[arg(long, value_enum, global = true, default_value_t = OutputFormat::Human)]
    format: OutputFormat,

    /// Emit debug-level internal logging to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Option<Commands>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Human,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate every plugin in the marketplace index (default).
    Validate,
    /// Generate or check the plugin catalog document.
    Catalog {
        /// Compare against the existing file instead of writing it; exits
        /// non-zero on drift.
        #[arg(long)]
        check: bool,

        /// Catalog output path.
        #[arg(long, default_value = "CATALOG.md")]
        output: PathBuf,
    },
}

trait Reporter {
    fn info(&mut self, msg: &str);
    fn warn(&mut self, msg: &str);
    fn error(&mut self, msg: &str);
}

struct CliReporter;

impl Reporter for CliReporter {
    fn info(&mut self, msg: &str) {
        tracing::info!("{msg}");
    }

    fn warn(&mut self, msg: &str) {
        tracing::warn!("{msg}");
    }

    fn error(&mut self, msg: &str) {
        tracing::error!("{msg}");
    }
}

fn init_logging(verbose: bool) {
    let default_directive = if verbose { "marketgate=debug" } else { "marketgate=info" };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(default_directive.parse().unwrap()))
        .with_target(false)
        .without_time()
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let mut reporter = CliReporter;

    let result = match cli.cmd.unwrap_or(Commands::Validate) {
        Commands::Validate => run_validate(&cli.index, cli.format, &mut reporter),
        Commands::Catalog { check, output } => run_catalog(&cli.index, check, &output, &mut reporter),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            reporter.error(&format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}

fn effective_index_path(cli_index: &PathBuf, config: &marketgate_config::Config) -> PathBuf {
    if cli_index != &PathBuf::from("marketplace.json") {
        return cli_index.clone();
    }
    config.index_path().map(PathBuf::from).unwrap_or_else(|| cli_index.clone())
}

fn run_validate(index_path: &PathBuf, format: OutputFormat, reporter: &mut dyn Reporter) -> Result<u8> {
    let config = marketgate_config::load_config(std::path::Path::new(".")).unwrap_or_default();
    let index_path = effective_index_path(index_path, &config);
    reporter.info(&format!("loading marketplace index: {}", index_path.display()));

    let bar = match format {
        OutputFormat::Human => progress::ProgressReporter::new(),
        OutputFormat::Json => progress::ProgressReporter::silent(),
    };

    let report = marketgate_driver::run_with_clone_timeout(&index_path, config.clone_timeout())
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    let passed = report.results.iter().filter(|r| r.passed()).count();
    bar.finish(passed, report.results.len());

    match format {
        OutputFormat::Human => print_human_report(&report),
        OutputFormat::Json => {
            let text = serde_json::to_string_pretty(&report).context("serializing report")?;
            println!("{text}");
        }
    }

    let code = report.exit_code();
    Ok(code as u8)
}

fn run_catalog(index_path: &PathBuf, check: bool, output: &PathBuf, reporter: &mut dyn Reporter) -> Result<u8> {
    let config = marketgate_config::load_config(std::path::Path::new(".")).unwrap_or_default();
    let index_path = effective_index_path(index_path, &config);
    let output = if output != &PathBuf::from("CATALOG.md") {
        output.clone()
    } else {
        config.catalog_output().map(PathBuf::from).unwrap_or_else(|| output.clone())
    };
    let output = &output;

    let text = std::fs::read_to_string(&index_path)
        .with_context(|| format!("reading marketplace index {}", index_path.display()))?;
    let index: marketgate_types::MarketplaceIndex =
        serde_json::from_str(&text).with_context(|| format!("parsing marketplace index {}", index_path.display()))?;

    let now = Utc::now();

    if check {
        let existing = std::fs::read_to_string(output)
            .with_context(|| format!("reading existing catalog {}", output.display()))?;
        let up_to_date = marketgate_catalog::check(&index, &existing, now);
        if up_to_date {
            reporter.info("✅ catalog is up to date");
            Ok(0)
        } else {
            reporter.error(&format!("❌ catalog is out of date; regenerate with `marketgate catalog --output {}`", output.display()));
            Ok(1)
        }
    } else {
        let rendered = marketgate_catalog::generate(&index, now);
        std::fs::write(output, rendered).with_context(|| format!("writing catalog {}", output.display()))?;
        reporter.info(&format!("wrote catalog to {}", output.display()));
        Ok(0)
    }
}

fn status_badge(result: &PluginResult) -> &'static str {
    if result.passed() {
        "✅ PASS"
    } else {
        "❌ FAIL"
    }
}

fn render_human_report(report: &Report) -> String {
    use std::fmt::Write as _;
    let mut out = String::new();

    let _ = writeln!(out, "marketplace: {} v{} (owner: {})", report.marketplace_name, report.marketplace_version, report.owner_name);
    let _ = writeln!(out);

    for warning in &report.warnings {
        let _ = writeln!(out, "[index warning] {warning}");
    }
    if !report.warnings.is_empty() {
        let _ = writeln!(out);
    }

    for result in &report.results {
        let _ = writeln!(out, "[{}] {} ({})", status_badge(result), result.name, result.tier);
        let _ = writeln!(out, "  source: {}", result.url);

        for error in &result.errors {
            let _ = writeln!(out, "  error:   {error}");
        }
        for warning in &result.warnings {
            let _ = writeln!(out, "  warning: {warning}");
        }
        if result.tier == marketgate_types::Tier::Community && !result.detected_domains.is_empty() {
            let domains = result.detected_domains.iter().cloned().collect::<Vec<_>>().join(", ");
            let _ = writeln!(out, "  network domains observed: {domains}");
        }
        let _ = writeln!(out);
    }

    if !report.command_collisions.is_empty() {
        let _ = writeln!(out, "command name collisions:");
        for (command, plugins) in &report.command_collisions {
            let _ = writeln!(out, "  /{command}: {}", plugins.join(", "));
        }
        let _ = writeln!(out);
    }

    let total = report.results.len();
    let passed = report.results.iter().filter(|r| r.passed()).count();
    let failed = total - passed;
    let _ = writeln!(out, "{passed}/{total} plugins passed, {failed} failed");

    if failed > 0 {
        let _ = writeln!(out);
        let _ = writeln!(out, "one or more plugins failed validation; see the error lines above for the");
        let _ = writeln!(out, "offending finding and fix the manifest or source before re-running.");
    }

    out
}

fn print_human_report(report: &Report) {
    print!("{}", render_human_report(report));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_badge_reflects_errors() {
        let mut r = PluginResult::new("x", marketgate_types::Tier::Curated, "https://example.com/x.git");
        assert_eq!(status_badge(&r), "✅ PASS");
        r.push_error("boom");
        assert_eq!(status_badge(&r), "❌ FAIL");
    }

    #[test]
    fn explicit_flag_wins_over_config_default() {
        let config = marketgate_config::Config::default();
        let explicit = PathBuf::from("custom.json");
        assert_eq!(effective_index_path(&explicit, &config), explicit);
    }

    #[test]
    fn human_report_snapshot_for_a_single_passing_plugin() {
        let report = Report {
            marketplace_name: "demo-marketplace".to_string(),
            marketplace_version: "1.0.0".to_string(),
            owner_name: "demo-org".to_string(),
            warnings: vec![],
            results: vec![PluginResult::new("x", marketgate_types::Tier::Curated, "https://example.com/x.git")],
            command_collisions: Default::default(),
        };
        insta::assert_snapshot!(render_human_report(&report), @r#"
        marketplace: demo-marketplace v1.0.0 (owner: demo-org)

        [✅ PASS] x (curated)
          source: https://example.com/x.git

        1/1 plugins passed, 0 failed
        "#);
    }
}
