//! Core data types for lookup payloads.
//!
//! The lookup service answers with a single JSON object whose keys are check
//! names. The six security checks share one shape, while `NS` and `WHOIS`
//! carry their own payloads. This module turns that object into typed values
//! once, so nothing downstream has to inspect JSON shapes again.

use crate::error::MailsecError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Every key the lookup service may return.
///
/// Declaration order is the display order of the security checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CheckType {
    #[serde(rename = "MX")]
    Mx,
    #[serde(rename = "SPF")]
    Spf,
    #[serde(rename = "DKIM")]
    Dkim,
    #[serde(rename = "DMARC")]
    Dmarc,
    #[serde(rename = "MTA-STS")]
    MtaSts,
    #[serde(rename = "DNSSEC")]
    Dnssec,
    #[serde(rename = "NS")]
    Ns,
    #[serde(rename = "WHOIS")]
    Whois,
}

impl CheckType {
    /// The pass/fail checks, in the order rows are produced.
    pub const SECURITY_CHECKS: [CheckType; 6] = [
        CheckType::Mx,
        CheckType::Spf,
        CheckType::Dkim,
        CheckType::Dmarc,
        CheckType::MtaSts,
        CheckType::Dnssec,
    ];

    /// Wire name used as the payload key.
    pub fn as_str(self) -> &'static str {
        match self {
            CheckType::Mx => "MX",
            CheckType::Spf => "SPF",
            CheckType::Dkim => "DKIM",
            CheckType::Dmarc => "DMARC",
            CheckType::MtaSts => "MTA-STS",
            CheckType::Dnssec => "DNSSEC",
            CheckType::Ns => "NS",
            CheckType::Whois => "WHOIS",
        }
    }

    /// NS and WHOIS are informational and never produce pass/fail rows.
    pub fn is_security_check(self) -> bool {
        !matches!(self, CheckType::Ns | CheckType::Whois)
    }
}

impl fmt::Display for CheckType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckType {
    type Err = MailsecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MX" => Ok(CheckType::Mx),
            "SPF" => Ok(CheckType::Spf),
            "DKIM" => Ok(CheckType::Dkim),
            "DMARC" => Ok(CheckType::Dmarc),
            "MTA-STS" => Ok(CheckType::MtaSts),
            "DNSSEC" => Ok(CheckType::Dnssec),
            "NS" => Ok(CheckType::Ns),
            "WHOIS" => Ok(CheckType::Whois),
            other => Err(MailsecError::build_at(other, "unknown check type")),
        }
    }
}

/// Value reported for a security check.
///
/// The producer decides the shape: MX usually returns a list of exchanges,
/// the TXT-based checks a single record. The shape is kept as received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CheckValue {
    Scalar(String),
    Sequence(Vec<String>),
}

impl CheckValue {
    /// Flatten to a single line, joining sequence items with `sep`.
    pub fn joined(&self, sep: &str) -> String {
        match self {
            CheckValue::Scalar(value) => value.clone(),
            CheckValue::Sequence(values) => values.join(sep),
        }
    }
}

/// Outcome of one security check as reported by the lookup service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    /// Whether the check passed
    pub status: bool,

    /// Record contents or a short explanation
    pub value: CheckValue,
}

/// Registration data for the domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum WhoisInfo {
    /// The WHOIS lookup failed; only the message is available
    Failed { error: String },

    /// The WHOIS lookup succeeded, possibly with missing fields
    Found {
        registrar: Option<String>,
        creation_date: Option<String>,
    },
}

/// Parsed lookup service response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupResponse {
    /// Security check results keyed by type (never NS or WHOIS)
    pub checks: BTreeMap<CheckType, CheckResult>,

    /// Nameserver hostnames, in the order the service returned them
    pub nameservers: Option<Vec<String>>,

    /// Registration data
    pub whois: Option<WhoisInfo>,
}

impl LookupResponse {
    /// Parse a raw lookup payload.
    ///
    /// A `null` NS or WHOIS entry counts as absent.
    ///
    /// # Errors
    ///
    /// Returns `MailsecError::BuildError` when the payload is not an object,
    /// carries a key that is not a known check, or any known key carries a
    /// value of the wrong shape.
    pub fn from_value(value: &Value) -> Result<Self, MailsecError> {
        let object = value
            .as_object()
            .ok_or_else(|| MailsecError::build("top-level payload must be a JSON object"))?;

        let mut response = LookupResponse::default();

        for (key, entry) in object {
            let check = key.parse::<CheckType>().map_err(|e| {
                debug!(key = %key, "unknown lookup key");
                e
            })?;

            match check {
                CheckType::Ns => {
                    if !entry.is_null() {
                        response.nameservers = Some(parse_string_list(key, entry)?);
                    }
                }
                CheckType::Whois => {
                    if !entry.is_null() {
                        response.whois = Some(parse_whois(entry)?);
                    }
                }
                _ => {
                    response.checks.insert(check, parse_check_result(key, entry)?);
                }
            }
        }

        Ok(response)
    }

    /// Look up the result for a security check.
    pub fn check(&self, check: CheckType) -> Option<&CheckResult> {
        self.checks.get(&check)
    }
}

impl FromStr for LookupResponse {
    type Err = MailsecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: Value = serde_json::from_str(s)?;
        Self::from_value(&value)
    }
}

fn parse_check_result(key: &str, entry: &Value) -> Result<CheckResult, MailsecError> {
    let object = entry
        .as_object()
        .ok_or_else(|| MailsecError::build_at(key, "expected an object with 'status' and 'value'"))?;

    let status = match object.get("status") {
        Some(Value::Bool(status)) => *status,
        Some(_) => return Err(MailsecError::build_at(key, "'status' must be a boolean")),
        None => return Err(MailsecError::build_at(key, "missing 'status'")),
    };

    let value = match object.get("value") {
        Some(Value::String(value)) => CheckValue::Scalar(value.clone()),
        Some(list @ Value::Array(_)) => CheckValue::Sequence(parse_string_list(key, list)?),
        Some(_) => {
            return Err(MailsecError::build_at(
                key,
                "'value' must be a string or a list of strings",
            ))
        }
        None => return Err(MailsecError::build_at(key, "missing 'value'")),
    };

    Ok(CheckResult { status, value })
}

fn parse_string_list(key: &str, entry: &Value) -> Result<Vec<String>, MailsecError> {
    let items = entry
        .as_array()
        .ok_or_else(|| MailsecError::build_at(key, "expected a list of strings"))?;

    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(String::from)
                .ok_or_else(|| MailsecError::build_at(key, "list items must be strings"))
        })
        .collect()
}

fn parse_whois(entry: &Value) -> Result<WhoisInfo, MailsecError> {
    let object = entry
        .as_object()
        .ok_or_else(|| MailsecError::build_at("WHOIS", "expected an object"))?;

    let field = |name: &str| -> Result<Option<String>, MailsecError> {
        match object.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(value)) if value.is_empty() => Ok(None),
            Some(Value::String(value)) => Ok(Some(value.clone())),
            Some(_) => Err(MailsecError::build_at(
                "WHOIS",
                format!("'{}' must be a string", name),
            )),
        }
    };

    // A non-empty error wins over any registration fields sent alongside it.
    if let Some(error) = field("error")? {
        return Ok(WhoisInfo::Failed { error });
    }

    Ok(WhoisInfo::Found {
        registrar: field("registrar")?,
        creation_date: field("creation_date")?,
    })
}
