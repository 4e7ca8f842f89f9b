use crate::model::{Finding, Span};
use std::borrow::Cow;
use std::fmt;
use std::ops::Range;
use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

/// Snippets longer than this are verified by hash instead of by copy.
const HASH_THRESHOLD: usize = 1024;

/// The fundamental edit primitive: character-span replacement with verification.
///
/// Batch corrections compile down to this. The span is in characters and
/// refers to the snapshot the analysis service read, so it is only trusted
/// after the live text at that position passes `expected_before`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "Edit does nothing until apply_to() is called"]
pub struct Edit {
    /// Character range in the analyzed snapshot
    pub span: Span,
    /// Text to insert at `span`
    pub replacement: String,
    /// What we expect to find at `span` before replacing it
    pub expected_before: EditVerification,
}

/// Verification strategy for edit safety.
///
/// Both variants compare whitespace-trimmed text: the service reports the
/// snippet it read, and surrounding whitespace is not significant for a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditVerification {
    /// Trimmed text match required
    Snippet(String),
    /// xxh3 hash of the trimmed expected text (used for long snippets)
    Hash(u64),
}

impl EditVerification {
    /// Check if the provided text matches the verification criteria.
    pub fn matches(&self, text: &str) -> bool {
        let text = text.trim();
        match self {
            EditVerification::Snippet(expected) => text == expected,
            EditVerification::Hash(expected_hash) => xxh3_64(text.as_bytes()) == *expected_hash,
        }
    }

    /// Create verification from text, using a hash for text over 1KB.
    pub fn from_text(text: &str) -> Self {
        let text = text.trim();
        if text.len() > HASH_THRESHOLD {
            EditVerification::Hash(xxh3_64(text.as_bytes()))
        } else {
            EditVerification::Snippet(text.to_string())
        }
    }
}

impl fmt::Display for EditVerification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditVerification::Snippet(text) => write!(f, "{text:?}"),
            EditVerification::Hash(hash) => write!(f, "<xxh3 {hash:016x}>"),
        }
    }
}

/// Why a span-anchored correction was left out of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Live text at the span differs from what the service reported.
    ///
    /// `expected` is the trimmed snippet, even when verification went by hash.
    Mismatch { expected: String, found: String },
    /// Live text at the span already equals the replacement
    AlreadyApplied,
    /// The span does not fit inside the current document
    OutOfBounds { doc_len: usize },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Mismatch { expected, found } => {
                write!(f, "expected {expected:?}, found {found:?}")
            }
            SkipReason::AlreadyApplied => write!(f, "replacement already present"),
            SkipReason::OutOfBounds { doc_len } => {
                write!(f, "span outside document of {doc_len} characters")
            }
        }
    }
}

/// A correction that made it into the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedEdit {
    /// Position of the finding in the input sequence
    pub index: usize,
    pub rule_name: String,
    pub span: Span,
}

/// A correction skipped because of drift.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEdit {
    /// Position of the finding in the input sequence
    pub index: usize,
    pub rule_name: String,
    pub span: Span,
    pub reason: SkipReason,
}

#[derive(Error, Debug)]
pub enum EditError {
    #[error("original text not found: {snippet:?} (it may already have been corrected)")]
    NotFound { snippet: String },

    #[error(
        "none of the {} anchored corrections match the current text; re-analyze before retrying",
        skipped.len()
    )]
    Drift { skipped: Vec<SkippedEdit> },

    #[error("no corrections with a known position to apply")]
    NoCandidates,

    #[error("overlapping correction spans {first} and {second}")]
    Overlap { first: Span, second: Span },
}

/// Result of a batch apply that changed the document.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "BatchOutcome carries the corrected text"]
pub struct BatchOutcome {
    pub text: String,
    /// Applied edits, in application order (right to left)
    pub applied: Vec<AppliedEdit>,
    /// Drifted edits, in the order they were tried
    pub skipped: Vec<SkippedEdit>,
}

impl BatchOutcome {
    pub fn applied_count(&self) -> usize {
        self.applied.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// Some edits went in while others drifted.
    pub fn is_partial(&self) -> bool {
        !self.skipped.is_empty()
    }
}

impl Edit {
    /// Create a new edit with automatic verification generation.
    pub fn new(span: Span, replacement: impl Into<String>, expected_before: &str) -> Self {
        Self {
            span,
            replacement: replacement.into(),
            expected_before: EditVerification::from_text(expected_before),
        }
    }

    /// Build the edit for a finding whose correction carries a span.
    pub fn from_finding(finding: &Finding) -> Option<Self> {
        let correction = finding.correction.as_ref()?;
        let span = correction.span?;
        Some(Self::new(span, correction.replacement.as_str(), &correction.original))
    }

    /// Validate the edit against `text`.
    ///
    /// Returns the byte range covered by the span if validation succeeds.
    fn validate(&self, text: &str) -> Result<Range<usize>, SkipReason> {
        let range = byte_range(text, self.span).ok_or_else(|| SkipReason::OutOfBounds {
            doc_len: text.chars().count(),
        })?;
        let current = &text[range.clone()];

        if self.expected_before.matches(current) {
            return Ok(range);
        }

        if current.trim() == self.replacement.trim() {
            return Err(SkipReason::AlreadyApplied);
        }

        let expected = match &self.expected_before {
            EditVerification::Snippet(text) => text.clone(),
            EditVerification::Hash(_) => self.expected_before.to_string(),
        };
        Err(SkipReason::Mismatch {
            expected,
            found: current.to_string(),
        })
    }

    /// Replace the span in `buffer` if the live text still matches.
    ///
    /// The buffer is left untouched when validation fails.
    pub fn apply_to(&self, buffer: &mut String) -> Result<(), SkipReason> {
        let range = self.validate(buffer)?;
        buffer.replace_range(range, &self.replacement);
        Ok(())
    }
}

/// Replace the first literal occurrence of `original` with `replacement`.
///
/// The match is exact: no trimming, case-sensitive. Only the first
/// occurrence is touched, even when `original` appears several times.
pub fn apply_one(document: &str, original: &str, replacement: &str) -> Result<String, EditError> {
    let not_found = || EditError::NotFound {
        snippet: original.to_string(),
    };
    if original.is_empty() {
        return Err(not_found());
    }
    let start = document.find(original).ok_or_else(not_found)?;
    let end = start + original.len();

    let mut updated = String::with_capacity(document.len() - original.len() + replacement.len());
    updated.push_str(&document[..start]);
    updated.push_str(replacement);
    updated.push_str(&document[end..]);

    tracing::debug!(offset = start, "replaced first occurrence of snippet");
    Ok(updated)
}

struct Candidate<'a> {
    index: usize,
    finding: &'a Finding,
    /// Trimmed snippet the service read, kept for drift reports
    expected: &'a str,
    edit: Edit,
}

/// Apply every span-anchored correction in `findings` to `document`.
///
/// Edits are sorted by span start descending and applied right to left so
/// earlier spans stay valid while later text changes length. Equal starts
/// are ordered by end descending. Two insertions at the same position count
/// as overlapping, so the result never depends on input order. Each edit is checked
/// against the live text and skipped on mismatch; the batch continues.
///
/// Fails without touching anything if spans overlap, if no finding has a
/// span, or if every candidate drifted.
pub fn apply_all(document: &str, findings: &[Finding]) -> Result<BatchOutcome, EditError> {
    let mut candidates: Vec<Candidate<'_>> = findings
        .iter()
        .enumerate()
        .filter_map(|(index, finding)| {
            let correction = finding.correction.as_ref()?;
            Edit::from_finding(finding).map(|edit| Candidate {
                index,
                finding,
                expected: correction.original.trim(),
                edit,
            })
        })
        .collect();

    if candidates.is_empty() {
        return Err(EditError::NoCandidates);
    }

    check_overlaps(&candidates)?;

    candidates.sort_by(|a, b| {
        b.edit
            .span
            .start
            .cmp(&a.edit.span.start)
            .then(b.edit.span.end.cmp(&a.edit.span.end))
    });

    let mut buffer = document.to_string();
    let mut applied = Vec::new();
    let mut skipped = Vec::new();

    for candidate in candidates {
        let rule_name = candidate.finding.rule_name.clone();
        let span = candidate.edit.span;
        match candidate.edit.apply_to(&mut buffer) {
            Ok(()) => {
                tracing::debug!(rule = %rule_name, %span, "applied correction");
                applied.push(AppliedEdit {
                    index: candidate.index,
                    rule_name,
                    span,
                });
            }
            Err(reason) => {
                let reason = match reason {
                    SkipReason::Mismatch { found, .. } => SkipReason::Mismatch {
                        expected: candidate.expected.to_string(),
                        found,
                    },
                    other => other,
                };
                tracing::warn!(rule = %rule_name, %span, %reason, "skipped drifted correction");
                skipped.push(SkippedEdit {
                    index: candidate.index,
                    rule_name,
                    span,
                    reason,
                });
            }
        }
    }

    if applied.is_empty() {
        return Err(EditError::Drift { skipped });
    }

    Ok(BatchOutcome {
        text: buffer,
        applied,
        skipped,
    })
}

fn check_overlaps(candidates: &[Candidate<'_>]) -> Result<(), EditError> {
    for (i, a) in candidates.iter().enumerate() {
        for b in &candidates[i + 1..] {
            if a.edit.span.overlaps(&b.edit.span) {
                return Err(EditError::Overlap {
                    first: a.edit.span,
                    second: b.edit.span,
                });
            }
        }
    }
    Ok(())
}

/// Convert `\r\n` and lone `\r` line endings to `\n`.
///
/// The analysis service counts offsets over normalized text.
pub fn normalize_newlines(text: &str) -> Cow<'_, str> {
    if text.contains('\r') {
        Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(text)
    }
}

/// Map a character span onto a byte range of `text`.
fn byte_range(text: &str, span: Span) -> Option<Range<usize>> {
    if span.start > span.end {
        return None;
    }
    let mut offsets = text
        .char_indices()
        .map(|(offset, _)| offset)
        .chain(std::iter::once(text.len()));
    let start = offsets.nth(span.start)?;
    let end = if span.is_empty() {
        start
    } else {
        offsets.nth(span.len() - 1)?
    };
    Some(start..end)
}
