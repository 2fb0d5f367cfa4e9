//! # Mailsec Check Library
//!
//! Builds email-security posture reports from a lookup service.
//!
//! The lookup service probes a domain's MX, SPF, DKIM, DMARC, MTA-STS and
//! DNSSEC configuration plus its nameservers and WHOIS record, and answers
//! with one JSON object. This library turns that object into an ordered,
//! immutable [`Report`] and runs the request lifecycle around it.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mailsec_check_lib::{HttpLookupClient, LookupService, ReportBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = HttpLookupClient::new()?;
//!     let payload = client.lookup("example.com").await?;
//!     let report = ReportBuilder::default().build_from_value("example.com", &payload)?;
//!
//!     for row in &report.rows {
//!         println!("{}: {}", row.check, if row.passed { "pass" } else { "fail" });
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Typed payloads**: scalar and list values kept as the service sent them
//! - **Fixed row order**: MX, SPF, DKIM, DMARC, MTA-STS, DNSSEC
//! - **Lifecycle**: reset, load, render or fail, clean up, with stale cycles fenced
//! - **Configurable**: TOML files and `MSC_*` environment variables

// Re-export main public API types and functions
// This makes them available as mailsec_check_lib::TypeName
pub use client::{HttpLookupClient, LookupService};
pub use config::{
    load_env_config, load_env_config_from, parse_timeout, ClientConfig, ConfigManager, EnvConfig,
    DiscoveryRoots, FileConfig, OutputConfig, ReportConfig, ServiceConfig, DEFAULT_BASE_URL,
    DEFAULT_LOOKUP_PATH,
};
pub use controller::{
    validate_input, Celebration, CycleOutcome, NoCelebration, ReportView, RequestController,
    GENERIC_ERROR_NOTICE, VALIDATION_NOTICE,
};
pub use error::{ErrorCategory, MailsecError};
pub use export::{export_reports, write_csv, write_json, ExportFormat};
pub use report::{
    BuildOptions, InfoBlock, Report, ReportBuilder, ReportRow, WhoisBlock, NOT_FOUND_PLACEHOLDER,
};
pub use tooltip::{tooltip_for, Tooltip};
pub use types::{CheckResult, CheckType, CheckValue, LookupResponse, WhoisInfo};

// Internal modules - these are not part of the public API
mod client;
mod config;
mod controller;
mod error;
mod export;
mod report;
mod tooltip;
mod types;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, MailsecError>;

// Library version and metadata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
