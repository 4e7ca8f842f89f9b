//! The correction loop: apply edits, re-run analysis, replace the cached result.
//!
//! [`ReviewSession`] owns the document and the last [`AnalysisResult`]. Every
//! mutating operation takes `&mut self`, so one session never has two
//! mutations in flight.

use crate::analysis::{AnalysisError, Analyzer};
use crate::classify::{classify, Classification};
use crate::config::ReviewSettings;
use crate::edit::{self, AppliedEdit, EditError, SkippedEdit};
use crate::model::AnalysisResult;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("the document is empty")]
    EmptyInput,

    #[error("no analysis result available; submit the document first")]
    NoAnalysis,

    #[error("no finding with id {0:?} in the current analysis")]
    UnknownFinding(String),

    #[error("finding {0:?} has no proposed correction")]
    NotCorrectable(String),

    #[error(transparent)]
    Edit(#[from] EditError),

    #[error(transparent)]
    Service(#[from] AnalysisError),

    /// The document took the edits, but analyzing it again failed.
    ///
    /// The cached result is stale until the next successful submit.
    #[error("{applied} corrections applied, but re-analysis failed: {source}")]
    Reanalysis {
        applied: usize,
        /// Set for bulk corrections
        report: Option<BatchReport>,
        source: Box<SessionError>,
    },
}

impl SessionError {
    /// Message telling the user what to do next.
    pub fn user_message(&self) -> String {
        match self {
            SessionError::EmptyInput => "The text is empty.".to_string(),
            SessionError::NoAnalysis => "No analysis data found. Analyze the text first.".to_string(),
            SessionError::UnknownFinding(id) => {
                format!("Finding {id} is not part of the latest analysis. Analyze again.")
            }
            SessionError::NotCorrectable(id) => {
                format!("Finding {id} has no automatic correction; fix it by hand.")
            }
            SessionError::Edit(EditError::NotFound { .. }) => {
                "Could not find the original passage. It may already have been corrected."
                    .to_string()
            }
            SessionError::Edit(EditError::Drift { .. }) => {
                "Could not apply the corrections. The text may have been edited after the \
                 analysis, or the positions no longer line up. Analyze again before correcting."
                    .to_string()
            }
            SessionError::Edit(EditError::NoCandidates) => {
                "None of the findings has a correction with a known position.".to_string()
            }
            SessionError::Edit(EditError::Overlap { first, second }) => format!(
                "Corrections at {first} and {second} overlap; apply them one at a time."
            ),
            SessionError::Service(_) => "Could not connect to the analysis server.".to_string(),
            SessionError::Reanalysis { source, .. } => format!(
                "The corrections were applied, but the text could not be analyzed again. {}",
                source.user_message()
            ),
        }
    }
}

/// What a bulk correction did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub applied: Vec<AppliedEdit>,
    pub skipped: Vec<SkippedEdit>,
}

impl BatchReport {
    pub fn applied_count(&self) -> usize {
        self.applied.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

pub struct ReviewSession<A> {
    analyzer: A,
    settings: ReviewSettings,
    document: String,
    result: Option<AnalysisResult>,
    stale: bool,
}

impl<A: Analyzer> ReviewSession<A> {
    pub fn new(analyzer: A, settings: ReviewSettings, document: impl Into<String>) -> Self {
        Self {
            analyzer,
            settings,
            document: document.into(),
            result: None,
            stale: false,
        }
    }

    pub fn document(&self) -> &str {
        &self.document
    }

    pub fn into_document(self) -> String {
        self.document
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn settings(&self) -> &ReviewSettings {
        &self.settings
    }

    /// True when the document changed after the cached result was produced.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Replace the text as a user edit would.
    ///
    /// The cached result is kept but marked stale; drift is caught when
    /// corrections are applied.
    pub fn set_document(&mut self, text: impl Into<String>) {
        self.document = text.into();
        self.stale = true;
    }

    /// Drop the cached result and go back to editing.
    pub fn discard_review(&mut self) {
        self.result = None;
        self.stale = false;
    }

    /// Grouping of the cached findings, if there is a result.
    pub fn classification(&self) -> Option<Classification<'_>> {
        self.result
            .as_ref()
            .map(|result| classify(&result.findings, &self.settings.primary_context))
    }

    /// Send the current document for analysis and cache the result.
    ///
    /// Blank text is rejected before any request is made. On service failure
    /// the previous result stays cached.
    pub fn submit(&mut self) -> Result<&AnalysisResult, SessionError> {
        if self.settings.normalize_newlines {
            let normalized = edit::normalize_newlines(&self.document).into_owned();
            self.document = normalized;
        }

        if self.document.trim().is_empty() {
            return Err(SessionError::EmptyInput);
        }

        let result = self.analyzer.analyze(&self.document).map_err(|e| {
            tracing::error!(error = %e, "analysis failed");
            e
        })?;
        self.stale = false;
        Ok(self.result.insert(result))
    }

    /// Re-analyze after an apply already changed the document.
    fn reanalyze(
        &mut self,
        applied: usize,
        report: Option<BatchReport>,
    ) -> Result<&AnalysisResult, SessionError> {
        self.stale = true;
        match self.submit() {
            Ok(result) => Ok(result),
            Err(source) => Err(SessionError::Reanalysis {
                applied,
                report,
                source: Box::new(source),
            }),
        }
    }

    /// Replace the first occurrence of `original`, then re-analyze.
    ///
    /// Nothing changes when `original` is not in the document.
    pub fn apply_one(
        &mut self,
        original: &str,
        replacement: &str,
    ) -> Result<&AnalysisResult, SessionError> {
        let updated = edit::apply_one(&self.document, original, replacement)?;
        tracing::info!("applied single correction");
        self.document = updated;
        self.reanalyze(1, None)
    }

    /// Apply the correction attached to finding `id` of the cached result.
    pub fn apply_finding(&mut self, id: &str) -> Result<&AnalysisResult, SessionError> {
        let result = self.result.as_ref().ok_or(SessionError::NoAnalysis)?;
        let finding = result
            .find(id)
            .ok_or_else(|| SessionError::UnknownFinding(id.to_string()))?;
        let correction = finding
            .correction
            .clone()
            .ok_or_else(|| SessionError::NotCorrectable(id.to_string()))?;

        self.apply_one(&correction.original, &correction.replacement)
    }

    /// Apply every span-anchored correction of the cached result, then
    /// re-analyze.
    ///
    /// If nothing could be applied the document is left as it was and no
    /// request is made.
    pub fn apply_all(&mut self) -> Result<BatchReport, SessionError> {
        let result = self.result.as_ref().ok_or(SessionError::NoAnalysis)?;

        let outcome = if self.settings.normalize_newlines {
            edit::apply_all(&edit::normalize_newlines(&self.document), &result.findings)?
        } else {
            edit::apply_all(&self.document, &result.findings)?
        };

        tracing::info!(
            applied = outcome.applied_count(),
            skipped = outcome.skipped_count(),
            "applied batch corrections"
        );

        self.document = outcome.text;
        let report = BatchReport {
            applied: outcome.applied,
            skipped: outcome.skipped,
        };
        self.reanalyze(report.applied_count(), Some(report.clone()))?;
        Ok(report)
    }
}
