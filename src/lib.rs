//! Redline: a document correction loop.
//!
//! A document is sent to an external analysis service, which answers with
//! findings. Findings may carry a proposed correction, optionally anchored
//! to a character span of the text the service read. This crate applies
//! those corrections back into the document and re-submits it.
//!
//! # Architecture
//!
//! Span-anchored corrections compile down to one primitive, [`Edit`]: a
//! character-span replacement that verifies the live text before applying.
//! Two appliers build on the model:
//!
//! - [`apply_one`] replaces the first literal occurrence of a snippet. It is
//!   position-agnostic and always repairs the first occurrence.
//! - [`apply_all`] applies every span-anchored correction right to left, so
//!   earlier spans stay valid, and skips any edit whose span has drifted.
//!
//! [`ReviewSession`] owns the document and the latest [`AnalysisResult`] and
//! sequences apply, re-analyze, replace.
//!
//! # Example
//!
//! ```
//! use redline::{apply_all, Correction, Finding};
//!
//! let findings = vec![
//!     Finding::new("Ordinal", "use °", "Resolução")
//!         .with_correction(Correction::new("ab", "WXYZ").with_span(0, 2)),
//!     Finding::new("Ordinal", "use °", "Resolução")
//!         .with_correction(Correction::new("ef", "Q").with_span(6, 8)),
//! ];
//!
//! let outcome = apply_all("ab-CD-ef", &findings).unwrap();
//! assert_eq!(outcome.text, "WXYZ-CD-Q");
//! ```

pub mod analysis;
pub mod classify;
pub mod config;
pub mod edit;
pub mod logging;
pub mod model;
pub mod session;
pub mod store;

// Re-exports
pub use analysis::{AnalysisError, Analyzer, HttpAnalyzer};
pub use classify::{classify, Classification, FindingGroup};
pub use config::{load_from_path, load_from_str, ConfigError, ReviewConfig, ReviewSettings};
pub use edit::{
    apply_all, apply_one, normalize_newlines, AppliedEdit, BatchOutcome, Edit, EditError,
    EditVerification, SkipReason, SkippedEdit,
};
pub use model::{AnalysisResult, Correction, Finding, Span};
pub use session::{BatchReport, ReviewSession, SessionError};
pub use store::{read_document, write_document, StoreError};
