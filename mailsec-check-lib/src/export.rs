//! Export finished reports to a file.

use crate::error::MailsecError;
use crate::report::Report;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    /// Pick a format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self, MailsecError> {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("json") => Ok(ExportFormat::Json),
            Some("csv") => Ok(ExportFormat::Csv),
            _ => Err(MailsecError::file_error(
                path.to_string_lossy(),
                "Unsupported export format, use a .json or .csv file",
            )),
        }
    }
}

#[derive(Serialize)]
struct CsvRecord<'a> {
    domain: &'a str,
    check: &'a str,
    passed: bool,
    value: String,
}

/// Write `reports` to `path`, choosing the format by extension.
pub fn export_reports<P: AsRef<Path>>(reports: &[Report], path: P) -> Result<(), MailsecError> {
    let path = path.as_ref();
    let format = ExportFormat::from_path(path)?;

    let file = File::create(path).map_err(|e| {
        MailsecError::file_error(path.to_string_lossy(), format!("Failed to create file: {}", e))
    })?;

    match format {
        ExportFormat::Json => write_json(reports, file),
        ExportFormat::Csv => write_csv(reports, file),
    }
}

/// Write reports as a pretty-printed JSON array.
pub fn write_json<W: Write>(reports: &[Report], mut writer: W) -> Result<(), MailsecError> {
    serde_json::to_writer_pretty(&mut writer, reports)?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// Write one CSV line per report row.
pub fn write_csv<W: Write>(reports: &[Report], writer: W) -> Result<(), MailsecError> {
    let mut wtr = csv::Writer::from_writer(writer);

    for report in reports {
        for row in &report.rows {
            wtr.serialize(CsvRecord {
                domain: &report.domain,
                check: row.check.as_str(),
                passed: row.passed,
                value: row.value.joined("; "),
            })?;
        }
    }

    wtr.flush()?;
    Ok(())
}
