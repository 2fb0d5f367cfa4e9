//! Terminal presentation for mailsec-check.
//!
//! This module paints reports in the terminal: spinner while a lookup is in
//! flight, the pass/fail table, nameserver and WHOIS boxes, and the
//! celebration banner. It also holds the JSON surface used with `--json`.

use console::{pad_str, style, Alignment, Term};
use mailsec_check_lib::{
    Celebration, CheckValue, InfoBlock, Report, ReportRow, ReportView, WhoisBlock,
};
use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const CHECK_WIDTH: usize = 9;
const VALUE_INDENT: &str = "               ";

// ── Spinner ──────────────────────────────────────────────────────────────────

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// An async braille-dot spinner that writes to stderr so stdout stays clean.
///
/// Frames are drawn under `frame_lock` and only while `running` is set, so
/// no frame can land after [`Spinner::stop`] has cleared the line.
pub struct Spinner {
    running: Arc<AtomicBool>,
    frame_lock: Arc<Mutex<()>>,
}

impl Spinner {
    /// Start a spinner, or return `None` when stderr is not a terminal.
    pub fn start(message: String) -> Option<Self> {
        if !Term::stderr().is_term() {
            return None;
        }

        let running = Arc::new(AtomicBool::new(true));
        let frame_lock = Arc::new(Mutex::new(()));
        let running_clone = running.clone();
        let lock_clone = frame_lock.clone();

        tokio::spawn(async move {
            let term = Term::stderr();
            let mut idx = 0usize;
            while draw_frame(&term, &lock_clone, &running_clone, idx, &message) {
                idx += 1;
                tokio::time::sleep(Duration::from_millis(80)).await;
            }
            let _guard = lock_clone.lock();
            let _ = term.clear_line();
        });

        Some(Self {
            running,
            frame_lock,
        })
    }

    /// Stop the spinner and clear its line.
    pub fn stop(self) {
        let _guard = self.frame_lock.lock();
        self.running.store(false, Ordering::SeqCst);
        let _ = Term::stderr().clear_line();
    }
}

/// Draw one frame if the spinner is still running.
fn draw_frame(
    term: &Term,
    frame_lock: &Mutex<()>,
    running: &AtomicBool,
    idx: usize,
    message: &str,
) -> bool {
    let _guard = frame_lock.lock();
    if !running.load(Ordering::SeqCst) {
        return false;
    }
    let frame = SPINNER_FRAMES[idx % SPINNER_FRAMES.len()];
    let _ = term.clear_line();
    let _ = term.write_str(&format!("{} {}", style(frame).cyan(), message));
    true
}

// ── Terminal surface ─────────────────────────────────────────────────────────

/// Report surface that prints to the terminal.
pub struct TerminalView {
    spinner: RefCell<Option<Spinner>>,
    explain: bool,
}

impl TerminalView {
    pub fn new(explain: bool) -> Self {
        Self {
            spinner: RefCell::new(None),
            explain,
        }
    }

    fn stop_spinner(&self) {
        if let Some(spinner) = self.spinner.borrow_mut().take() {
            spinner.stop();
        }
    }
}

impl ReportView for TerminalView {
    fn reset(&self) {
        self.stop_spinner();
        *self.spinner.borrow_mut() = Spinner::start("Looking up records...".to_string());
    }

    fn render(&self, report: &Report) {
        self.stop_spinner();
        for line in format_report(report, self.explain) {
            println!("{}", line);
        }
    }

    fn show_error_notice(&self, message: &str) {
        self.stop_spinner();
        eprintln!("{} {}", style("✗").red().bold(), style(message).red());
    }

    fn show_validation_error(&self, message: &str) {
        eprintln!("{} {}", style("!").yellow().bold(), style(message).yellow());
    }

    fn finish(&self) {
        self.stop_spinner();
        println!();
    }
}

/// Prints a confetti banner when every check passed.
pub struct TerminalCelebration {
    pub enabled: bool,
}

impl Celebration for TerminalCelebration {
    fn celebrate(&self) {
        if self.enabled {
            println!("{}", celebration_banner());
        }
    }
}

fn celebration_banner() -> String {
    format!(
        "  {} {} {}",
        style("🎉 ✨ 🎊").bold(),
        style("All email security checks passed!").green().bold(),
        style("🎊 ✨ 🎉").bold(),
    )
}

// ── Formatting ───────────────────────────────────────────────────────────────

/// Render a whole report as terminal lines.
pub fn format_report(report: &Report, explain: bool) -> Vec<String> {
    let mut lines = vec![format!(
        "{} {}",
        style("Email security report for").dim(),
        style(&report.domain).bold()
    )];
    lines.push(String::new());

    for row in &report.rows {
        lines.extend(format_row(row, explain));
    }

    if !report.rows.is_empty() {
        lines.push(String::new());
        lines.push(format_verdict(report));
    }

    for block in &report.info_blocks {
        lines.push(String::new());
        lines.extend(format_info_block(block));
    }

    lines
}

/// Format one pass/fail row, with sequence values as bullet lines.
pub fn format_row(row: &ReportRow, explain: bool) -> Vec<String> {
    let name = pad_str(row.check.as_str(), CHECK_WIDTH, Alignment::Left, None);
    let icon = if row.passed { "✅" } else { "❌" };
    let name = if row.passed {
        style(name).green().bold()
    } else {
        style(name).red().bold()
    };

    let mut lines = Vec::new();
    match &row.value {
        CheckValue::Scalar(value) => {
            lines.push(format!("  {} {}  {}", name, icon, value));
        }
        CheckValue::Sequence(values) => {
            lines.push(format!("  {} {}", name, icon));
            for value in values {
                lines.push(format!("{}• {}", VALUE_INDENT, value));
            }
        }
    }

    if explain {
        lines.push(format!(
            "{}{}",
            VALUE_INDENT,
            style(format!("{} Learn more: {}", row.tooltip.text, row.tooltip.link)).dim()
        ));
    }

    lines
}

fn format_verdict(report: &Report) -> String {
    let failed = report.failed_rows().count();
    if failed == 0 {
        format!("  {}", style("All checks passed").green().bold())
    } else {
        format!(
            "  {}",
            style(format!(
                "{} of {} check{} failed",
                failed,
                report.rows.len(),
                if report.rows.len() == 1 { "" } else { "s" }
            ))
            .red()
            .bold()
        )
    }
}

/// Format a nameserver or WHOIS box.
pub fn format_info_block(block: &InfoBlock) -> Vec<String> {
    match block {
        InfoBlock::Nameservers {
            domain,
            nameservers,
        } => {
            let mut lines = vec![format!(
                "  {}",
                style(format!("Nameservers for {}:", domain)).yellow().bold()
            )];
            lines.extend(nameservers.iter().map(|ns| format!("    • {}", ns)));
            lines
        }
        InfoBlock::Whois { domain, whois } => {
            let mut lines = vec![format!(
                "  {}",
                style(format!("WHOIS Information for {}:", domain))
                    .yellow()
                    .bold()
            )];
            match whois {
                WhoisBlock::Registration {
                    registrar,
                    creation_date,
                } => {
                    lines.push(format!("    • Registrar: {}", registrar));
                    lines.push(format!("    • Date of Registration: {}", creation_date));
                }
                WhoisBlock::Error { message } => {
                    lines.push(format!("    {}", message));
                }
            }
            lines
        }
    }
}

// ── JSON surface ─────────────────────────────────────────────────────────────

/// Collects finished reports and prints them as one JSON array at the end.
#[derive(Default)]
pub struct JsonView {
    current: RefCell<Option<Report>>,
    finished: RefCell<Vec<Report>>,
}

impl JsonView {
    #[cfg(test)]
    fn reports(&self) -> Vec<Report> {
        self.finished.borrow().clone()
    }

    pub fn print(&self) -> Result<(), serde_json::Error> {
        println!("{}", serde_json::to_string_pretty(&*self.finished.borrow())?);
        Ok(())
    }
}

impl ReportView for JsonView {
    fn reset(&self) {
        self.current.borrow_mut().take();
    }

    fn render(&self, report: &Report) {
        *self.current.borrow_mut() = Some(report.clone());
    }

    fn show_error_notice(&self, message: &str) {
        eprintln!("Error: {}", message);
    }

    fn show_validation_error(&self, message: &str) {
        eprintln!("Error: {}", message);
    }

    fn finish(&self) {
        if let Some(report) = self.current.borrow_mut().take() {
            self.finished.borrow_mut().push(report);
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use mailsec_check_lib::ReportBuilder;
    use serde_json::json;

    fn report() -> Report {
        ReportBuilder::default()
            .build_from_value(
                "example.com",
                &json!({
                    "MX": {"status": true, "value": ["10 mail.example.com", "20 backup.example.com"]},
                    "SPF": {"status": false, "value": "v=spf1 ~all"},
                    "NS": ["ns1.example.com"],
                    "WHOIS": {"registrar": "Example Registrar"}
                }),
            )
            .unwrap()
    }

    #[test]
    fn test_format_row_sequence_as_bullets() {
        let report = report();
        let lines = format_row(&report.rows[0], false);
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("MX"));
        assert!(lines[0].contains("✅"));
        assert!(lines[1].ends_with("• 10 mail.example.com"));
        assert!(lines[2].ends_with("• 20 backup.example.com"));
    }

    #[test]
    fn test_format_row_scalar_inline() {
        let report = report();
        let lines = format_row(&report.rows[1], false);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("❌"));
        assert!(lines[0].ends_with("v=spf1 ~all"));
    }

    #[test]
    fn test_format_row_explain_adds_tooltip() {
        let report = report();
        let lines = format_row(&report.rows[1], true);
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("Sender Policy Framework"));
        assert!(lines[1].contains("https://"));
    }

    #[test]
    fn test_format_info_blocks() {
        let report = report();
        let ns = format_info_block(&report.info_blocks[0]);
        assert!(ns[0].contains("Nameservers for example.com:"));
        assert_eq!(ns[1], "    • ns1.example.com");

        let whois = format_info_block(&report.info_blocks[1]);
        assert!(whois[0].contains("WHOIS Information for example.com:"));
        assert_eq!(whois[1], "    • Registrar: Example Registrar");
        assert_eq!(whois[2], "    • Date of Registration: Not found");
    }

    #[test]
    fn test_format_whois_error_only_message() {
        let block = InfoBlock::Whois {
            domain: "example.com".to_string(),
            whois: WhoisBlock::Error {
                message: "WHOIS server unreachable".to_string(),
            },
        };
        let lines = format_info_block(&block);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "    WHOIS server unreachable");
    }

    #[test]
    fn test_format_report_verdict_line() {
        let lines = format_report(&report(), false);
        assert!(lines.iter().any(|l| l.contains("1 of 2 checks failed")));
    }

    #[test]
    fn test_stopped_spinner_draws_no_more_frames() {
        let term = Term::stderr();
        let lock = Mutex::new(());
        let running = AtomicBool::new(true);

        assert!(draw_frame(&term, &lock, &running, 0, "Looking up records..."));

        running.store(false, Ordering::SeqCst);
        assert!(!draw_frame(&term, &lock, &running, 1, "Looking up records..."));
    }

    #[test]
    fn test_json_view_keeps_only_finished_reports() {
        let view = JsonView::default();

        view.reset();
        view.render(&report());
        view.finish();

        view.reset();
        view.show_error_notice("boom");
        view.finish();

        assert_eq!(view.reports().len(), 1);
        assert_eq!(view.reports()[0].domain, "example.com");
    }
}
