//! Request lifecycle.
//!
//! [`RequestController`] runs one check cycle per call: validate the input,
//! reset the presentation surface, fetch the lookup payload, build the
//! report and hand it to the surface, then clean up. Presentation and the
//! celebration effect are supplied by the caller through [`ReportView`] and
//! [`Celebration`].
//!
//! Cycles may overlap when a caller starts a new one before the previous
//! lookup returns. Every cycle takes a generation ticket when it starts; a
//! cycle that finishes after a newer one has started drops its outcome, so
//! the most recently started cycle always owns the surface.

use crate::client::LookupService;
use crate::error::MailsecError;
use crate::report::{Report, ReportBuilder};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

/// Notice shown for any failure after the lookup has started.
pub const GENERIC_ERROR_NOTICE: &str = "An error occurred. My apologies for the inconvenience.";

/// Notice shown for blank input.
pub const VALIDATION_NOTICE: &str = "Please enter a valid domain.";

/// The surface a report is painted on.
///
/// Methods take `&self` so overlapping cycles can share one surface;
/// implementations use interior mutability where they hold state.
pub trait ReportView {
    /// Clear rows and info blocks, hide results and export, show loading.
    fn reset(&self);

    /// Replace the displayed content with `report`.
    fn render(&self, report: &Report);

    /// Show a failure notice for the current cycle.
    fn show_error_notice(&self, message: &str);

    /// Reject input before a cycle starts.
    fn show_validation_error(&self, message: &str);

    /// Hide loading and reveal the results section and export.
    fn finish(&self);
}

/// One-shot visual effect for a fully passing report.
pub trait Celebration {
    fn celebrate(&self);
}

/// Celebration that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCelebration;

impl Celebration for NoCelebration {
    fn celebrate(&self) {}
}

/// How a single [`RequestController::run_check`] call ended.
#[derive(Debug, Clone)]
pub enum CycleOutcome {
    /// Input was blank; nothing was reset or fetched
    Rejected(MailsecError),
    /// The report was rendered
    Completed(Report),
    /// Lookup or build failed and the generic notice was shown
    Failed(MailsecError),
    /// A newer cycle started before this one finished; nothing was shown
    Superseded,
}

impl CycleOutcome {
    pub fn report(&self) -> Option<&Report> {
        match self {
            CycleOutcome::Completed(report) => Some(report),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CycleOutcome::Completed(_) | CycleOutcome::Superseded)
    }
}

/// Drives check cycles against a lookup service and a presentation surface.
pub struct RequestController<S, V, C = NoCelebration> {
    service: S,
    view: V,
    celebration: C,
    builder: ReportBuilder,
    generation: AtomicU64,
}

impl<S, V, C> RequestController<S, V, C>
where
    S: LookupService,
    V: ReportView,
    C: Celebration,
{
    pub fn new(service: S, view: V, celebration: C, builder: ReportBuilder) -> Self {
        Self {
            service,
            view,
            celebration,
            builder,
            generation: AtomicU64::new(0),
        }
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Run one full check cycle for `input`.
    ///
    /// Blank input is rejected synchronously without touching the current
    /// display. Otherwise the surface is reset before the lookup starts and
    /// `finish` is always called once the cycle ends, unless a newer cycle
    /// has taken over in the meantime.
    pub async fn run_check(&self, input: &str) -> CycleOutcome {
        let domain = match validate_input(input) {
            Ok(domain) => domain,
            Err(e) => {
                debug!(error = %e, "rejected input");
                self.view.show_validation_error(VALIDATION_NOTICE);
                return CycleOutcome::Rejected(e);
            }
        };

        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.view.reset();

        info!(domain = %domain, ticket, "starting check");
        let result = self.fetch_report(domain).await;

        if self.generation.load(Ordering::SeqCst) != ticket {
            debug!(domain = %domain, ticket, "discarding superseded cycle");
            return CycleOutcome::Superseded;
        }

        let outcome = match result {
            Ok(report) => {
                self.view.render(&report);
                if report.all_passed {
                    self.celebration.celebrate();
                }
                CycleOutcome::Completed(report)
            }
            Err(e) => {
                warn!(domain = %domain, category = ?e.category(), error = %e, "check failed");
                self.view.show_error_notice(GENERIC_ERROR_NOTICE);
                CycleOutcome::Failed(e)
            }
        };

        self.view.finish();
        outcome
    }

    async fn fetch_report(&self, domain: &str) -> Result<Report, MailsecError> {
        let payload = self.service.lookup(domain).await?;
        self.builder.build_from_value(domain, &payload)
    }
}

/// Trim input and reject it when nothing is left.
pub fn validate_input(input: &str) -> Result<&str, MailsecError> {
    let domain = input.trim();
    if domain.is_empty() {
        return Err(MailsecError::invalid_input(input, "Domain name cannot be empty"));
    }
    Ok(domain)
}
