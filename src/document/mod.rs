//! Record types that flow through the pipeline, one per stage.
//!
//! A [`DocumentCandidate`] is produced once per discovered attachment link,
//! becomes a [`ClassifiedCandidate`] after type classification, and is later
//! paired with a selection flag and a materialization result. Titles and URLs
//! come from external pages and may be empty or contain arbitrary text.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of one case, derived from its page path (e.g. `/cma-cases/example`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseId(String);

impl CaseId {
    /// Wraps a case page path.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Returns the raw case path.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CaseId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for CaseId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A case listed by a discovery source: display title plus site-relative link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseRef {
    /// Case title as shown in listings.
    #[serde(default)]
    pub title: String,
    /// Site-relative case path, e.g. `/cma-cases/example-merger`.
    #[serde(default)]
    pub link: String,
}

impl CaseRef {
    /// Creates a case reference.
    #[must_use]
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
        }
    }

    /// Returns the case identifier derived from the link.
    #[must_use]
    pub fn case_id(&self) -> CaseId {
        CaseId::new(self.link.clone())
    }
}

/// A raw attachment link found on a case page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentCandidate {
    /// Case this attachment belongs to.
    pub case_id: CaseId,
    /// Title of the owning case.
    pub case_title: String,
    /// Absolute URL of the case page the link was found on.
    pub case_url: String,
    /// Link text (may be empty).
    pub title: String,
    /// Absolute URL of the attachment.
    pub source_url: String,
    /// Display date shown next to the link, e.g. `9/9/25`.
    pub observed_date: Option<String>,
}

impl DocumentCandidate {
    /// Creates a candidate with no case URL or observed date.
    #[must_use]
    pub fn new(
        case_id: impl Into<CaseId>,
        case_title: impl Into<String>,
        title: impl Into<String>,
        source_url: impl Into<String>,
    ) -> Self {
        Self {
            case_id: case_id.into(),
            case_title: case_title.into(),
            case_url: String::new(),
            title: title.into(),
            source_url: source_url.into(),
            observed_date: None,
        }
    }

    /// Sets the case page URL.
    #[must_use]
    pub fn with_case_url(mut self, case_url: impl Into<String>) -> Self {
        self.case_url = case_url.into();
        self
    }

    /// Sets the observed display date.
    #[must_use]
    pub fn with_observed_date(mut self, date: impl Into<String>) -> Self {
        self.observed_date = Some(date.into());
        self
    }
}

/// Closed taxonomy of legal documents published on case pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DocumentType {
    InitialEnforcementOrder,
    Derogation,
    RevocationOrder,
    HoldSeparateManager,
    MonitoringTrustee,
    CommencementNotice,
    Decision,
    FinalReport,
    ProvisionalFindings,
    SimplePdf,
    Other,
}

impl DocumentType {
    /// Every variant, in declaration order.
    pub const ALL: [Self; 11] = [
        Self::InitialEnforcementOrder,
        Self::Derogation,
        Self::RevocationOrder,
        Self::HoldSeparateManager,
        Self::MonitoringTrustee,
        Self::CommencementNotice,
        Self::Decision,
        Self::FinalReport,
        Self::ProvisionalFindings,
        Self::SimplePdf,
        Self::Other,
    ];

    /// Human-readable label used in the index.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::InitialEnforcementOrder => "Initial enforcement order",
            Self::Derogation => "Derogation",
            Self::RevocationOrder => "Revocation order",
            Self::HoldSeparateManager => "Hold separate manager",
            Self::MonitoringTrustee => "Monitoring trustee",
            Self::CommencementNotice => "Commencement notice",
            Self::Decision => "Decision",
            Self::FinalReport => "Final report",
            Self::ProvisionalFindings => "Provisional findings",
            Self::SimplePdf => "Simple PDF",
            Self::Other => "Other",
        }
    }

    /// Category sub-directory used in the output tree and the archive.
    #[must_use]
    pub fn folder(self) -> &'static str {
        match self {
            Self::InitialEnforcementOrder => "IEOs",
            Self::Derogation => "Derogations",
            Self::RevocationOrder => "Revocations",
            Self::HoldSeparateManager => "Hold separate manager",
            Self::MonitoringTrustee => "Monitoring trustee",
            Self::CommencementNotice => "Commencement notice",
            Self::Decision => "Decision",
            Self::FinalReport => "Final report",
            Self::ProvisionalFindings => "Provisional findings",
            Self::SimplePdf => "PDFs",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A candidate together with its classified type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedCandidate {
    pub candidate: DocumentCandidate,
    pub doc_type: DocumentType,
}

impl ClassifiedCandidate {
    /// Classifies a candidate from its title and URL.
    #[must_use]
    pub fn classify(candidate: DocumentCandidate) -> Self {
        let doc_type = crate::classify::classify(&candidate.title, &candidate.source_url);
        Self {
            candidate,
            doc_type,
        }
    }

    /// Shortcut for the candidate's link text.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.candidate.title
    }
}
