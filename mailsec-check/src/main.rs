//! Mailsec Check CLI Application
//!
//! A command-line interface that reports a domain's email-security posture
//! (MX, SPF, DKIM, DMARC, MTA-STS, DNSSEC) as returned by a lookup service.
//! This CLI application provides a terminal front-end to mailsec-check-lib.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use mailsec_check_lib::{
    export_reports, load_env_config, parse_timeout, Celebration, ClientConfig, ConfigManager,
    EnvConfig, ExportFormat, FileConfig, HttpLookupClient, NoCelebration, Report, ReportBuilder,
    ReportView, RequestController,
};
use std::path::Path;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use ui::{JsonView, TerminalCelebration, TerminalView};

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// CLI arguments for mailsec-check
#[derive(Parser, Debug)]
#[command(name = "mailsec-check")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Report a domain's email-security posture")]
#[command(
    long_about = "Report a domain's email-security posture via a lookup service.\n\nShows MX, SPF, DKIM, DMARC, MTA-STS and DNSSEC results together with nameservers and WHOIS registration details."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// Domain names to check
    #[arg(value_name = "DOMAINS", help_heading = "Domain Selection")]
    pub domains: Vec<String>,

    /// Base URL of the lookup service (e.g. http://127.0.0.1:5000)
    #[arg(long = "url", value_name = "URL", help_heading = "Lookup Service")]
    pub url: Option<String>,

    /// Path of the lookup endpoint
    #[arg(
        long = "lookup-path",
        value_name = "PATH",
        help_heading = "Lookup Service"
    )]
    pub lookup_path: Option<String>,

    /// Deadline for each lookup (e.g. 5s, 2m)
    #[arg(long = "timeout", value_name = "DURATION", help_heading = "Lookup Service")]
    pub timeout: Option<String>,

    /// Output reports as a JSON array
    #[arg(short = 'j', long = "json", help_heading = "Output Format")]
    pub json: bool,

    /// Write finished reports to a .json or .csv file
    #[arg(long = "export", value_name = "FILE", help_heading = "Output Format")]
    pub export: Option<String>,

    /// Print an explanation and reference link under each check
    #[arg(short = 'e', long = "explain", help_heading = "Output Format")]
    pub explain: bool,

    /// Skip the banner shown when every check passes
    #[arg(long = "no-celebrate", help_heading = "Output Format")]
    pub no_celebrate: bool,

    /// Fail when the service omits any security check
    #[arg(long = "strict", help_heading = "Report")]
    pub strict: bool,

    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Show debug logging
    #[arg(short = 'd', long = "debug", help_heading = "Configuration")]
    pub debug: bool,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose", help_heading = "Configuration")]
    pub verbose: bool,
}

/// Everything a run needs once all configuration sources are merged.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Settings {
    client: ClientConfig,
    json: bool,
    explain: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_tracing(&args);

    // Validate arguments
    if let Err(e) = validate_args(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    match run(args).await {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn init_tracing(args: &Args) {
    let default_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else {
        "warn"
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .without_time()
                .with_target(false),
        )
        .with(filter)
        .init();
}

fn validate_args(args: &Args) -> Result<(), String> {
    if args.domains.is_empty() {
        return Err("You must specify at least one domain name".to_string());
    }

    if let Some(url) = &args.url {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(format!(
                "Invalid --url '{}': must start with http:// or https://",
                url
            ));
        }
    }

    if let Some(timeout) = &args.timeout {
        if parse_timeout(timeout).is_none() {
            return Err(format!(
                "Invalid --timeout '{}'. Use format like '5s', '30s', '2m'",
                timeout
            ));
        }
    }

    if let Some(export) = &args.export {
        ExportFormat::from_path(Path::new(export)).map_err(|e| e.to_string())?;
    }

    Ok(())
}

async fn run(args: Args) -> Result<bool, Box<dyn std::error::Error>> {
    let settings = build_settings(&args)?;
    tracing::debug!(?settings, "resolved configuration");

    let client = HttpLookupClient::with_config(&settings.client)?;
    let builder = ReportBuilder::new(settings.client.build_options());

    let (reports, all_ok) = if settings.json {
        let controller =
            RequestController::new(client, JsonView::default(), NoCelebration, builder);
        let result = run_cycles(&controller, &args.domains).await;
        controller.view().print()?;
        result
    } else {
        let celebration = TerminalCelebration {
            enabled: settings.client.celebrate,
        };
        let controller = RequestController::new(
            client,
            TerminalView::new(settings.explain),
            celebration,
            builder,
        );
        run_cycles(&controller, &args.domains).await
    };

    if let Some(path) = &args.export {
        export_reports(&reports, path)?;
        if !settings.json {
            eprintln!("Exported {} report(s) to {}", reports.len(), path);
        }
    }

    Ok(all_ok)
}

/// Run one cycle per domain, in order, on the same controller.
///
/// Returns the rendered reports and whether every cycle succeeded.
async fn run_cycles<V, C>(
    controller: &RequestController<HttpLookupClient, V, C>,
    domains: &[String],
) -> (Vec<Report>, bool)
where
    V: ReportView,
    C: Celebration,
{
    let mut reports = Vec::with_capacity(domains.len());
    let mut all_ok = true;

    for domain in domains {
        let outcome = controller.run_check(domain).await;
        all_ok &= outcome.is_success();
        if let Some(report) = outcome.report() {
            reports.push(report.clone());
        }
    }

    (reports, all_ok)
}

/// Merge configuration sources.
///
/// Precedence: CLI args > environment variables > config file > defaults.
/// The config file is the one named by `--config`, else `MSC_CONFIG`, else
/// whatever discovery finds.
fn build_settings(args: &Args) -> Result<Settings, Box<dyn std::error::Error>> {
    let config_manager = ConfigManager::new(args.verbose);
    let env_config = load_env_config(args.verbose);

    let explicit_path = args.config.as_ref().or(env_config.config.as_ref());
    let file_config = match explicit_path {
        Some(path) => {
            tracing::info!(path = %path, "using explicit config file");
            config_manager
                .load_file(path)
                .map_err(|e| format!("Failed to load config file '{}': {}", path, e))?
        }
        None => config_manager.discover_and_load(),
    };

    Ok(resolve_settings(args, &file_config, &env_config))
}

fn resolve_settings(args: &Args, file_config: &FileConfig, env_config: &EnvConfig) -> Settings {
    let mut client = ClientConfig::default()
        .merge_file(file_config)
        .merge_env(env_config);

    if let Some(url) = &args.url {
        client = client.with_base_url(url.as_str());
    }
    if let Some(lookup_path) = &args.lookup_path {
        client = client.with_lookup_path(lookup_path.as_str());
    }
    if let Some(timeout) = args.timeout.as_deref().and_then(parse_timeout) {
        client = client.with_timeout(Some(timeout));
    }
    if args.strict {
        client = client.with_strict(true);
    }
    if args.no_celebrate {
        client = client.with_celebrate(false);
    }

    let output = file_config.output.as_ref();
    let json = args.json
        || env_config
            .json
            .unwrap_or_else(|| output.and_then(|o| o.format.as_deref()) == Some("json"));
    let explain = args.explain || output.and_then(|o| o.explain).unwrap_or(false);

    Settings {
        client,
        json,
        explain,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mailsec_check_lib::{OutputConfig, ServiceConfig, DEFAULT_BASE_URL};
    use std::time::Duration;

    // Helper function with all required fields
    fn create_test_args() -> Args {
        Args {
            domains: vec!["example.com".to_string()],
            url: None,
            lookup_path: None,
            timeout: None,
            json: false,
            export: None,
            explain: false,
            no_celebrate: false,
            strict: false,
            config: None,
            debug: false,
            verbose: false,
        }
    }

    #[test]
    fn test_validate_args_requires_domain() {
        let mut args = create_test_args();
        args.domains.clear();
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_accepts_defaults() {
        assert!(validate_args(&create_test_args()).is_ok());
    }

    #[test]
    fn test_validate_args_rejects_bad_url() {
        let mut args = create_test_args();
        args.url = Some("localhost:5000".to_string());
        assert!(validate_args(&args).unwrap_err().contains("--url"));
    }

    #[test]
    fn test_validate_args_rejects_bad_timeout() {
        let mut args = create_test_args();
        args.timeout = Some("fast".to_string());
        assert!(validate_args(&args).unwrap_err().contains("--timeout"));
    }

    #[test]
    fn test_validate_args_export_extension() {
        let mut args = create_test_args();
        args.export = Some("report.csv".to_string());
        assert!(validate_args(&args).is_ok());

        args.export = Some("report.xlsx".to_string());
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_resolve_settings_defaults() {
        let settings = resolve_settings(
            &create_test_args(),
            &FileConfig::default(),
            &EnvConfig::default(),
        );
        assert_eq!(settings.client, ClientConfig::default());
        assert_eq!(settings.client.base_url, DEFAULT_BASE_URL);
        assert!(!settings.json);
        assert!(!settings.explain);
    }

    #[test]
    fn test_cli_overrides_env_and_file() {
        let mut args = create_test_args();
        args.url = Some("http://cli:9000".to_string());
        args.timeout = Some("3s".to_string());
        args.no_celebrate = true;

        let file_config = FileConfig {
            service: Some(ServiceConfig {
                base_url: Some("http://file:5000".to_string()),
                lookup_path: Some("/v2/lookup".to_string()),
                timeout: Some("30s".to_string()),
            }),
            ..Default::default()
        };
        let env_config = EnvConfig {
            base_url: Some("http://env:5000".to_string()),
            strict: Some(true),
            ..Default::default()
        };

        let settings = resolve_settings(&args, &file_config, &env_config);
        assert_eq!(settings.client.base_url, "http://cli:9000");
        assert_eq!(settings.client.lookup_path, "/v2/lookup"); // From file
        assert_eq!(settings.client.timeout, Some(Duration::from_secs(3)));
        assert!(settings.client.strict); // From env
        assert!(!settings.client.celebrate);
    }

    #[test]
    fn test_output_format_precedence() {
        let file_config = FileConfig {
            output: Some(OutputConfig {
                format: Some("json".to_string()),
                explain: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        };

        let settings = resolve_settings(&create_test_args(), &file_config, &EnvConfig::default());
        assert!(settings.json);
        assert!(settings.explain);

        // MSC_JSON=false beats the file
        let env_config = EnvConfig {
            json: Some(false),
            ..Default::default()
        };
        let settings = resolve_settings(&create_test_args(), &file_config, &env_config);
        assert!(!settings.json);

        // --json beats everything
        let mut args = create_test_args();
        args.json = true;
        let settings = resolve_settings(&args, &file_config, &env_config);
        assert!(settings.json);
    }
}
