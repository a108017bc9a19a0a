use anyhow::{bail, Context, Result};
use clap::Parser;
use futures::future::join_all;
use std::sync::Arc;

use argus_extractor::core::{AnalysisRequest, ProductPageAnalyzer, Tier};
use argus_extractor::ops::telemetry;
use argus_extractor::Settings;

#[derive(Parser, Debug)]
#[command(name = "argus-extract")]
#[command(about = "Extract structured product data from saved product pages")]
#[command(version)]
struct Cli {
    /// HTML files to analyze
    #[arg(required = true)]
    files: Vec<String>,

    /// Page URL used to resolve relative links (defaults to file://<path>)
    #[arg(long)]
    url: Option<String>,

    /// Run the Pro module tier
    #[arg(long)]
    pro: bool,

    /// Allow LLM-backed sub-parsers
    #[arg(long)]
    llm: bool,

    /// Human-readable logs instead of JSON
    #[arg(long)]
    pretty_logs: bool,
}

impl Cli {
    fn tier(&self) -> Tier {
        if self.pro {
            Tier::Pro
        } else {
            Tier::Free
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    if args.pretty_logs {
        telemetry::init_tracing_pretty();
    } else {
        telemetry::init_tracing();
    }
    telemetry::install_panic_hook();

    let settings = Settings::load().context("Failed to load settings")?;
    let analyzer = Arc::new(ProductPageAnalyzer::new(&settings).context("Failed to build analyzer")?);

    tracing::info!(files = args.files.len(), tier = ?args.tier(), "Argus extractor initialized");

    // * One blocking task per page; the analyzer is shared, each run owns its own context
    let tasks = args.files.iter().map(|path| {
        let analyzer = Arc::clone(&analyzer);
        let path = path.clone();
        let url = args.url.clone().unwrap_or_else(|| format!("file://{}", path));
        let tier = args.tier();
        let use_llm = args.llm;

        tokio::task::spawn_blocking(move || -> Result<(String, String)> {
            let html = std::fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path))?;
            let request = AnalysisRequest::new(html, url).with_tier(tier).with_llm(use_llm);
            let report = analyzer
                .analyze(&request)
                .with_context(|| format!("Analysis failed for {}", path))?;
            Ok((path, serde_json::to_string_pretty(&report)?))
        })
    });

    let mut failures = 0;
    for joined in join_all(tasks).await {
        match joined.context("Analysis task panicked")? {
            Ok((path, report)) => println!("// {}\n{}", path, report),
            Err(err) => {
                failures += 1;
                tracing::error!(error = %format!("{:#}", err), "Page analysis failed");
            }
        }
    }

    let stats = analyzer.stats();
    tracing::info!(
        runs_completed = stats.runs_completed,
        runs_failed = stats.runs_failed,
        fields_resolved = stats.fields_resolved,
        "Argus extractor finished"
    );

    if failures > 0 {
        bail!("{} of {} pages failed", failures, args.files.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_flags_and_files() {
        let cli = Cli::try_parse_from(["argus-extract", "a.html", "--url", "https://shop.example/p", "--pro", "b.html"])
            .unwrap();
        assert_eq!(cli.files, vec!["a.html", "b.html"]);
        assert_eq!(cli.url.as_deref(), Some("https://shop.example/p"));
        assert_eq!(cli.tier(), Tier::Pro);
        assert!(!cli.llm);
        assert!(!cli.pretty_logs);
    }

    #[test]
    fn test_url_with_equals_sign() {
        let cli = Cli::try_parse_from(["argus-extract", "a.html", "--url=https://shop.example/p"]).unwrap();
        assert_eq!(cli.url.as_deref(), Some("https://shop.example/p"));
        assert_eq!(cli.tier(), Tier::Free);
    }

    #[test]
    fn test_help_is_not_a_failure() {
        let err = Cli::try_parse_from(["argus-extract", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
        assert_eq!(err.exit_code(), 0);
    }

    #[test]
    fn test_rejects_missing_files_and_unknown_flags() {
        assert!(Cli::try_parse_from(["argus-extract", "--llm"]).is_err());
        assert!(Cli::try_parse_from(["argus-extract", "a.html", "--url"]).is_err());
        assert!(Cli::try_parse_from(["argus-extract", "a.html", "--verbose"]).is_err());
    }
}
