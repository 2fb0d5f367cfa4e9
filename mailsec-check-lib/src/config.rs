//! Configuration file parsing and management.
//!
//! This module handles loading configuration from TOML files and
//! environment variables, and merging them into a [`ClientConfig`] with
//! proper precedence rules.

use crate::error::MailsecError;
use crate::report::BuildOptions;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Default lookup service location.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

/// Default lookup endpoint path.
pub const DEFAULT_LOOKUP_PATH: &str = "/api/lookup";

/// Resolved runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Scheme, host and port of the lookup service
    pub base_url: String,

    /// Path of the lookup endpoint
    pub lookup_path: String,

    /// Deadline for a single lookup
    /// Default: none, a slow service keeps the cycle loading
    pub timeout: Option<Duration>,

    /// Treat a missing security check as a malformed payload
    /// Default: false
    pub strict: bool,

    /// Fire the celebration signal when every check passes
    /// Default: true
    pub celebrate: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            lookup_path: DEFAULT_LOOKUP_PATH.to_string(),
            timeout: None,
            strict: false,
            celebrate: true,
        }
    }
}

impl ClientConfig {
    pub fn with_base_url<U: Into<String>>(mut self, base_url: U) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_lookup_path<P: Into<String>>(mut self, lookup_path: P) -> Self {
        self.lookup_path = lookup_path.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_celebrate(mut self, celebrate: bool) -> Self {
        self.celebrate = celebrate;
        self
    }

    /// Report builder options derived from this configuration.
    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            require_all_checks: self.strict,
        }
    }

    /// Overlay values from a configuration file.
    pub fn merge_file(mut self, file: &FileConfig) -> Self {
        if let Some(service) = &file.service {
            if let Some(base_url) = &service.base_url {
                self.base_url = base_url.clone();
            }
            if let Some(lookup_path) = &service.lookup_path {
                self.lookup_path = lookup_path.clone();
            }
            if let Some(timeout) = service.timeout.as_deref().and_then(parse_timeout) {
                self.timeout = Some(timeout);
            }
        }
        if let Some(strict) = file.report.as_ref().and_then(|r| r.strict) {
            self.strict = strict;
        }
        if let Some(celebrate) = file.output.as_ref().and_then(|o| o.celebrate) {
            self.celebrate = celebrate;
        }
        self
    }

    /// Overlay values from `MSC_*` environment variables.
    pub fn merge_env(mut self, env_config: &EnvConfig) -> Self {
        if let Some(base_url) = &env_config.base_url {
            self.base_url = base_url.clone();
        }
        if let Some(lookup_path) = &env_config.lookup_path {
            self.lookup_path = lookup_path.clone();
        }
        if let Some(timeout) = env_config.timeout {
            self.timeout = Some(timeout);
        }
        if let Some(strict) = env_config.strict {
            self.strict = strict;
        }
        if let Some(celebrate) = env_config.celebrate {
            self.celebrate = celebrate;
        }
        self
    }
}

/// Configuration loaded from TOML files.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// Where the lookup service lives
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<ServiceConfig>,

    /// Report interpretation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ReportConfig>,

    /// Output formatting preferences
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ServiceConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub lookup_path: Option<String>,

    /// Timeout as string, e.g. "5s", "2m"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ReportConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct OutputConfig {
    /// "text" or "json"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub celebrate: Option<bool>,

    /// Print tooltip text and link under each row
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explain: Option<bool>,
}

/// Directories searched during config discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryRoots {
    /// `$XDG_CONFIG_HOME`, falling back to `$HOME/.config` when unset
    pub xdg_config_home: Option<PathBuf>,
    pub home: Option<PathBuf>,
    pub working_dir: PathBuf,
}

impl DiscoveryRoots {
    /// Read the roots from `XDG_CONFIG_HOME`, `HOME` and the current directory.
    pub fn from_env() -> Self {
        Self {
            xdg_config_home: env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
            home: env::var_os("HOME").map(PathBuf::from),
            working_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }
}

/// Configuration discovery and loading functionality.
pub struct ConfigManager {
    /// Whether to log which files were picked up
    pub verbose: bool,
}

impl ConfigManager {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Load configuration from a specific file.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, MailsecError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(MailsecError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            MailsecError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content)
            .map_err(|e| MailsecError::config(format!("Failed to parse TOML configuration: {}", e)))?;

        self.validate_config(&config)?;

        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// XDG config is applied first, then the global file in `$HOME`, then the
    /// local file in the working directory. Files that fail to load are
    /// skipped with a warning.
    pub fn discover_and_load(&self) -> FileConfig {
        self.discover_and_load_from(&DiscoveryRoots::from_env())
    }

    /// Same as [`discover_and_load`](Self::discover_and_load) but searches
    /// the given directories instead of the process environment.
    pub fn discover_and_load_from(&self, roots: &DiscoveryRoots) -> FileConfig {
        let mut merged_config = FileConfig::default();

        let candidates = [
            self.get_xdg_config_path(roots),
            self.get_global_config_path(roots),
            self.get_local_config_path(roots),
        ];

        for path in candidates.into_iter().flatten() {
            match self.load_file(&path) {
                Ok(config) => {
                    if self.verbose {
                        info!(path = %path.display(), "loaded config file");
                    }
                    merged_config = self.merge_configs(merged_config, config);
                }
                Err(e) => warn!(path = %path.display(), error = %e, "skipping config file"),
            }
        }

        merged_config
    }

    fn get_local_config_path(&self, roots: &DiscoveryRoots) -> Option<PathBuf> {
        ["mailsec-check.toml", ".mailsec-check.toml"]
            .iter()
            .map(|candidate| roots.working_dir.join(candidate))
            .find(|path| path.exists())
    }

    fn get_global_config_path(&self, roots: &DiscoveryRoots) -> Option<PathBuf> {
        let home = roots.home.as_ref()?;
        [".mailsec-check.toml", "mailsec-check.toml"]
            .iter()
            .map(|candidate| home.join(candidate))
            .find(|path| path.exists())
    }

    /// Follows the XDG Base Directory Specification.
    fn get_xdg_config_path(&self, roots: &DiscoveryRoots) -> Option<PathBuf> {
        let config_dir = roots
            .xdg_config_home
            .clone()
            .or_else(|| roots.home.as_ref().map(|home| home.join(".config")))?;

        let path = config_dir.join("mailsec-check").join("config.toml");
        path.exists().then_some(path)
    }

    /// Merge two configurations; values from `higher` win.
    fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            service: match (lower.service, higher.service) {
                (Some(mut lower_service), Some(higher_service)) => {
                    if higher_service.base_url.is_some() {
                        lower_service.base_url = higher_service.base_url;
                    }
                    if higher_service.lookup_path.is_some() {
                        lower_service.lookup_path = higher_service.lookup_path;
                    }
                    if higher_service.timeout.is_some() {
                        lower_service.timeout = higher_service.timeout;
                    }
                    Some(lower_service)
                }
                (lower_service, higher_service) => higher_service.or(lower_service),
            },
            report: match (lower.report, higher.report) {
                (Some(lower_report), Some(higher_report)) => Some(ReportConfig {
                    strict: higher_report.strict.or(lower_report.strict),
                }),
                (lower_report, higher_report) => higher_report.or(lower_report),
            },
            output: match (lower.output, higher.output) {
                (Some(lower_output), Some(higher_output)) => Some(OutputConfig {
                    format: higher_output.format.or(lower_output.format),
                    celebrate: higher_output.celebrate.or(lower_output.celebrate),
                    explain: higher_output.explain.or(lower_output.explain),
                }),
                (lower_output, higher_output) => higher_output.or(lower_output),
            },
        }
    }

    fn validate_config(&self, config: &FileConfig) -> Result<(), MailsecError> {
        if let Some(service) = &config.service {
            if let Some(base_url) = &service.base_url {
                if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
                    return Err(MailsecError::config(format!(
                        "Invalid base_url '{}': must start with http:// or https://",
                        base_url
                    )));
                }
            }

            if let Some(timeout_str) = &service.timeout {
                if parse_timeout(timeout_str).is_none() {
                    return Err(MailsecError::config(format!(
                        "Invalid timeout format '{}'. Use format like '5s', '30s', '2m'",
                        timeout_str
                    )));
                }
            }
        }

        if let Some(format) = config.output.as_ref().and_then(|o| o.format.as_deref()) {
            if !matches!(format, "text" | "json") {
                return Err(MailsecError::config(format!(
                    "Invalid output format '{}'. Use 'text' or 'json'",
                    format
                )));
            }
        }

        Ok(())
    }
}

/// Configuration values read from `MSC_*` environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvConfig {
    pub base_url: Option<String>,
    pub lookup_path: Option<String>,
    pub timeout: Option<Duration>,
    pub strict: Option<bool>,
    pub json: Option<bool>,
    pub celebrate: Option<bool>,
    pub config: Option<String>,
}

/// Load configuration from environment variables.
///
/// Invalid values are logged as warnings and ignored.
pub fn load_env_config(verbose: bool) -> EnvConfig {
    load_env_config_from(verbose, |key| env::var(key).ok())
}

/// Same as [`load_env_config`] but reads variables through `lookup`.
pub fn load_env_config_from<F>(verbose: bool, lookup: F) -> EnvConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut env_config = EnvConfig::default();

    let non_empty = |key: &str| {
        lookup(key).filter(|value| !value.trim().is_empty()).map(|value| {
            if verbose {
                info!("using {}={}", key, value);
            }
            value
        })
    };

    let flag = |key: &str| {
        let value = lookup(key)?;
        let parsed = parse_bool(&value);
        match parsed {
            Some(enabled) if verbose => info!("using {}={}", key, enabled),
            Some(_) => {}
            None => warn!("invalid {}='{}', use true/false", key, value),
        }
        parsed
    };

    env_config.base_url = non_empty("MSC_URL");
    env_config.lookup_path = non_empty("MSC_LOOKUP_PATH");
    env_config.config = non_empty("MSC_CONFIG");

    if let Some(timeout_str) = lookup("MSC_TIMEOUT") {
        match parse_timeout(&timeout_str) {
            Some(timeout) => {
                if verbose {
                    info!("using MSC_TIMEOUT={}", timeout_str);
                }
                env_config.timeout = Some(timeout);
            }
            None => warn!(
                "invalid MSC_TIMEOUT='{}', use format like '5s', '30s', '2m'",
                timeout_str
            ),
        }
    }

    env_config.strict = flag("MSC_STRICT");
    env_config.json = flag("MSC_JSON");
    env_config.celebrate = flag("MSC_CELEBRATE");

    env_config
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a timeout string like "5s", "30s", "2m" or "10".
///
/// A bare number is taken as seconds. Zero is rejected.
pub fn parse_timeout(timeout_str: &str) -> Option<Duration> {
    let timeout_str = timeout_str.trim().to_lowercase();

    let secs = if let Some(secs) = timeout_str.strip_suffix('s') {
        secs.parse::<u64>().ok()
    } else if let Some(mins) = timeout_str.strip_suffix('m') {
        mins.parse::<u64>().ok().and_then(|m| m.checked_mul(60))
    } else {
        timeout_str.parse::<u64>().ok()
    }?;

    (secs > 0).then(|| Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();
        temp_file.flush().unwrap();
        temp_file
    }

    #[test]
    fn test_parse_timeout() {
        assert_eq!(parse_timeout("5s"), Some(Duration::from_secs(5)));
        assert_eq!(parse_timeout("30S"), Some(Duration::from_secs(30)));
        assert_eq!(parse_timeout("2m"), Some(Duration::from_secs(120)));
        assert_eq!(parse_timeout("7"), Some(Duration::from_secs(7)));
        assert_eq!(parse_timeout("0s"), None);
        assert_eq!(parse_timeout("soon"), None);
        assert_eq!(parse_timeout("307445734561825861m"), None);
        assert_eq!(
            parse_timeout("18446744073709551615s"),
            Some(Duration::from_secs(u64::MAX))
        );
    }

    #[test]
    fn test_load_valid_config() {
        let temp_file = write_config(
            r#"
[service]
base_url = "https://checker.example.net"
timeout = "10s"

[report]
strict = true

[output]
format = "json"
celebrate = false
"#,
        );

        let config = ConfigManager::new(false).load_file(temp_file.path()).unwrap();
        let service = config.service.clone().unwrap();
        assert_eq!(
            service.base_url.as_deref(),
            Some("https://checker.example.net")
        );
        assert_eq!(config.report.clone().unwrap().strict, Some(true));

        let resolved = ClientConfig::default().merge_file(&config);
        assert_eq!(resolved.base_url, "https://checker.example.net");
        assert_eq!(resolved.lookup_path, DEFAULT_LOOKUP_PATH);
        assert_eq!(resolved.timeout, Some(Duration::from_secs(10)));
        assert!(resolved.strict);
        assert!(!resolved.celebrate);
        assert!(resolved.build_options().require_all_checks);
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let temp_file = write_config("[service]\nbase_url = \"checker.local\"\n");
        let result = ConfigManager::new(false).load_file(temp_file.path());
        assert!(matches!(result, Err(MailsecError::ConfigError { .. })));
    }

    #[test]
    fn test_invalid_output_format_rejected() {
        let temp_file = write_config("[output]\nformat = \"xml\"\n");
        assert!(ConfigManager::new(false).load_file(temp_file.path()).is_err());
    }

    #[test]
    fn test_missing_file_is_file_error() {
        let result = ConfigManager::new(false).load_file("/nonexistent/mailsec-check.toml");
        assert!(matches!(result, Err(MailsecError::FileError { .. })));
    }

    #[test]
    fn test_merge_configs() {
        let manager = ConfigManager::new(false);

        let lower = FileConfig {
            service: Some(ServiceConfig {
                base_url: Some("http://lower:5000".to_string()),
                timeout: Some("5s".to_string()),
                ..Default::default()
            }),
            output: Some(OutputConfig {
                explain: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        };

        let higher = FileConfig {
            service: Some(ServiceConfig {
                base_url: Some("http://higher:5000".to_string()),
                ..Default::default()
            }),
            report: Some(ReportConfig { strict: Some(true) }),
            ..Default::default()
        };

        let merged = manager.merge_configs(lower, higher);
        let service = merged.service.unwrap();
        assert_eq!(service.base_url.as_deref(), Some("http://higher:5000")); // Higher wins
        assert_eq!(service.timeout.as_deref(), Some("5s")); // Lower preserved
        assert_eq!(merged.report.unwrap().strict, Some(true));
        assert_eq!(merged.output.unwrap().explain, Some(true));
    }

    fn write_at(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_discovery_precedence() {
        let root = tempfile::tempdir().unwrap();
        let xdg = root.path().join("xdg");
        let home = root.path().join("home");
        let work = root.path().join("work");
        fs::create_dir_all(&work).unwrap();

        write_at(
            &xdg.join("mailsec-check").join("config.toml"),
            "[service]\nbase_url = \"http://xdg:5000\"\nlookup_path = \"/xdg/lookup\"\n\n[report]\nstrict = true\n",
        );
        write_at(
            &home.join(".mailsec-check.toml"),
            "[service]\nbase_url = \"http://home:5000\"\ntimeout = \"9s\"\n",
        );
        write_at(
            &work.join("mailsec-check.toml"),
            "[service]\nbase_url = \"http://local:5000\"\n",
        );

        let roots = DiscoveryRoots {
            xdg_config_home: Some(xdg),
            home: Some(home),
            working_dir: work,
        };
        let config = ConfigManager::new(false).discover_and_load_from(&roots);
        let service = config.service.clone().unwrap();

        assert_eq!(service.base_url.as_deref(), Some("http://local:5000")); // Local wins
        assert_eq!(service.timeout.as_deref(), Some("9s")); // From global
        assert_eq!(service.lookup_path.as_deref(), Some("/xdg/lookup")); // From XDG
        assert_eq!(config.report.unwrap().strict, Some(true));
    }

    #[test]
    fn test_discovery_xdg_falls_back_to_home_config() {
        let root = tempfile::tempdir().unwrap();
        let home = root.path().join("home");
        write_at(
            &home.join(".config").join("mailsec-check").join("config.toml"),
            "[output]\nexplain = true\n",
        );

        let roots = DiscoveryRoots {
            xdg_config_home: None,
            home: Some(home),
            working_dir: root.path().to_path_buf(),
        };
        let config = ConfigManager::new(false).discover_and_load_from(&roots);
        assert_eq!(config.output.unwrap().explain, Some(true));
    }

    #[test]
    fn test_discovery_skips_invalid_file() {
        let root = tempfile::tempdir().unwrap();
        let home = root.path().join("home");
        write_at(&home.join(".mailsec-check.toml"), "[service]\nbase_url = \"http://home:5000\"\n");
        write_at(&root.path().join("mailsec-check.toml"), "[service]\nbase_url = \"nope\"\n");

        let roots = DiscoveryRoots {
            xdg_config_home: None,
            home: Some(home),
            working_dir: root.path().to_path_buf(),
        };
        let config = ConfigManager::new(false).discover_and_load_from(&roots);
        assert_eq!(
            config.service.unwrap().base_url.as_deref(),
            Some("http://home:5000")
        );
    }

    #[test]
    fn test_env_config_parsing() {
        let vars: HashMap<&str, &str> = [
            ("MSC_URL", "http://env:8080"),
            ("MSC_TIMEOUT", "2m"),
            ("MSC_STRICT", "yes"),
            ("MSC_CELEBRATE", "maybe"),
            ("MSC_LOOKUP_PATH", "  "),
        ]
        .into_iter()
        .collect();

        let env_config =
            load_env_config_from(false, |key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(env_config.base_url.as_deref(), Some("http://env:8080"));
        assert_eq!(env_config.timeout, Some(Duration::from_secs(120)));
        assert_eq!(env_config.strict, Some(true));
        assert_eq!(env_config.celebrate, None); // Invalid value ignored
        assert_eq!(env_config.lookup_path, None); // Blank ignored
        assert_eq!(env_config.json, None);
    }

    #[test]
    fn test_env_overrides_file() {
        let file = FileConfig {
            service: Some(ServiceConfig {
                base_url: Some("http://file:5000".to_string()),
                ..Default::default()
            }),
            report: Some(ReportConfig { strict: Some(true) }),
            ..Default::default()
        };
        let env_config = EnvConfig {
            base_url: Some("http://env:5000".to_string()),
            strict: Some(false),
            ..Default::default()
        };

        let resolved = ClientConfig::default()
            .merge_file(&file)
            .merge_env(&env_config);
        assert_eq!(resolved.base_url, "http://env:5000");
        assert!(!resolved.strict);
    }
}
