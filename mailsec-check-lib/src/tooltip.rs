//! Static reference text for each security check.

use crate::types::CheckType;
use serde::Serialize;

/// Short explanation of a check plus a link to further reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Tooltip {
    pub text: &'static str,
    pub link: &'static str,
}

const MX: Tooltip = Tooltip {
    text: "Mail Exchange record, checks if a MX record is configured.",
    link: "https://justinverstijnen.nl/enhance-email-security-with-spf-dkim-dmarc/#mx",
};

const SPF: Tooltip = Tooltip {
    text: "Sender Policy Framework, checks if a record is configured and is using hardfail (-all).",
    link: "https://justinverstijnen.nl/enhance-email-security-with-spf-dkim-dmarc/#spf",
};

const DKIM: Tooltip = Tooltip {
    text: "DomainKeys Identified Mail, checks if records for DKIM are configured.",
    link: "https://justinverstijnen.nl/enhance-email-security-with-spf-dkim-dmarc/#dkim",
};

const DMARC: Tooltip = Tooltip {
    text: "Domain-based Message Authentication, Reporting and Conformance. Checks if a DMARC record is configured and is using Reject as policy.",
    link: "https://justinverstijnen.nl/enhance-email-security-with-spf-dkim-dmarc/#dmarc",
};

const MTA_STS: Tooltip = Tooltip {
    text: "Mail Transfer Agent Strict Transport Security, checks if a policy is configured and published through HTTPS.",
    link: "https://justinverstijnen.nl/what-is-mta-sts-and-how-to-protect-your-email-flow/",
};

const DNSSEC: Tooltip = Tooltip {
    text: "Domain Name System Security Extensions, checks if DNSSEC is enabled and signed for the domain.",
    link: "https://justinverstijnen.nl/configure-dnssec-and-smtp-dane-with-exchange-online-microsoft-365/",
};

/// Tooltip for a check, or `None` for the informational NS/WHOIS keys.
pub fn tooltip_for(check: CheckType) -> Option<&'static Tooltip> {
    match check {
        CheckType::Mx => Some(&MX),
        CheckType::Spf => Some(&SPF),
        CheckType::Dkim => Some(&DKIM),
        CheckType::Dmarc => Some(&DMARC),
        CheckType::MtaSts => Some(&MTA_STS),
        CheckType::Dnssec => Some(&DNSSEC),
        CheckType::Ns | CheckType::Whois => None,
    }
}
