//! Report building.
//!
//! [`ReportBuilder`] is a pure transformation from a [`LookupResponse`] to an
//! immutable [`Report`]: ordered pass/fail rows, an aggregate verdict, and the
//! supplementary nameserver and registration blocks. Nothing here performs
//! I/O; presentation layers paint the finished value however they like.

use crate::error::MailsecError;
use crate::tooltip::{tooltip_for, Tooltip};
use crate::types::{CheckType, CheckValue, LookupResponse, WhoisInfo};
use serde::Serialize;

/// Placeholder shown for registration fields the lookup did not return.
pub const NOT_FOUND_PLACEHOLDER: &str = "Not found";

/// One pass/fail line of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    #[serde(rename = "type")]
    pub check: CheckType,
    pub passed: bool,
    pub value: CheckValue,
    pub tooltip: Tooltip,
}

/// Registration details as they should be displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum WhoisBlock {
    Registration {
        registrar: String,
        creation_date: String,
    },
    Error {
        message: String,
    },
}

/// Supplementary, non pass/fail data attached to a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InfoBlock {
    Nameservers {
        domain: String,
        nameservers: Vec<String>,
    },
    Whois {
        domain: String,
        whois: WhoisBlock,
    },
}

/// A complete, display-ready report for one domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub domain: String,
    pub rows: Vec<ReportRow>,
    /// True when every produced row passed (vacuously true with no rows)
    pub all_passed: bool,
    pub info_blocks: Vec<InfoBlock>,
}

impl Report {
    /// Rows that did not pass.
    pub fn failed_rows(&self) -> impl Iterator<Item = &ReportRow> {
        self.rows.iter().filter(|row| !row.passed)
    }

    /// Row for a given check, if the lookup reported it.
    pub fn row(&self, check: CheckType) -> Option<&ReportRow> {
        self.rows.iter().find(|row| row.check == check)
    }
}

/// Options that change how strictly payloads are interpreted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Fail the build when any of the six security checks is missing
    pub require_all_checks: bool,
}

/// Turns lookup responses into reports.
#[derive(Debug, Clone, Default)]
pub struct ReportBuilder {
    options: BuildOptions,
}

impl ReportBuilder {
    pub fn new(options: BuildOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Build a report from a parsed lookup response.
    ///
    /// Rows always follow [`CheckType::SECURITY_CHECKS`] order regardless of
    /// the key order in the original payload. Missing checks are skipped
    /// unless strict mode is enabled.
    ///
    /// # Errors
    ///
    /// Returns `MailsecError::BuildError` if strict mode is on and a check
    /// is missing, or if a check has no tooltip entry.
    pub fn build(&self, domain: &str, response: &LookupResponse) -> Result<Report, MailsecError> {
        let mut rows = Vec::with_capacity(CheckType::SECURITY_CHECKS.len());

        for check in CheckType::SECURITY_CHECKS {
            let Some(result) = response.check(check) else {
                if self.options.require_all_checks {
                    return Err(MailsecError::build_at(
                        check.as_str(),
                        "check missing from lookup response",
                    ));
                }
                continue;
            };

            let tooltip = tooltip_for(check).ok_or_else(|| {
                MailsecError::build_at(check.as_str(), "no tooltip entry for check")
            })?;

            rows.push(ReportRow {
                check,
                passed: result.status,
                value: result.value.clone(),
                tooltip: *tooltip,
            });
        }

        let all_passed = rows.iter().all(|row| row.passed);

        let mut info_blocks = Vec::new();

        if let Some(nameservers) = &response.nameservers {
            info_blocks.push(InfoBlock::Nameservers {
                domain: domain.to_string(),
                nameservers: nameservers.clone(),
            });
        }

        if let Some(whois) = &response.whois {
            info_blocks.push(InfoBlock::Whois {
                domain: domain.to_string(),
                whois: whois_block(whois),
            });
        }

        Ok(Report {
            domain: domain.to_string(),
            rows,
            all_passed,
            info_blocks,
        })
    }

    /// Parse a raw payload and build a report from it.
    pub fn build_from_value(
        &self,
        domain: &str,
        payload: &serde_json::Value,
    ) -> Result<Report, MailsecError> {
        let response = LookupResponse::from_value(payload)?;
        self.build(domain, &response)
    }
}

fn whois_block(whois: &WhoisInfo) -> WhoisBlock {
    match whois {
        WhoisInfo::Failed { error } => WhoisBlock::Error {
            message: error.clone(),
        },
        WhoisInfo::Found {
            registrar,
            creation_date,
        } => WhoisBlock::Registration {
            registrar: registrar
                .clone()
                .unwrap_or_else(|| NOT_FOUND_PLACEHOLDER.to_string()),
            creation_date: creation_date
                .clone()
                .unwrap_or_else(|| NOT_FOUND_PLACEHOLDER.to_string()),
        },
    }
}
