//! Wire model shared by the analysis client, the appliers and the classifier.
//!
//! Field names follow the service's JSON (`camelCase`). The legacy Portuguese
//! field names emitted by older deployments are accepted as aliases.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Half-open `[start, end)` range counted in characters (Unicode scalar
/// values) into a document snapshot.
///
/// Serialized as a two-element array, `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[usize; 2]", into = "[usize; 2]")]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Two spans overlap when they share at least one character.
    ///
    /// An empty span is an insertion point: it conflicts with a span that
    /// strictly contains it, and with another insertion at the same point.
    pub fn overlaps(&self, other: &Span) -> bool {
        if self.start == self.end && other.start == other.end {
            return self.start == other.start;
        }
        self.start < other.end && other.start < self.end
    }
}

impl From<[usize; 2]> for Span {
    fn from([start, end]: [usize; 2]) -> Self {
        Self { start, end }
    }
}

impl From<Span> for [usize; 2] {
    fn from(span: Span) -> Self {
        [span.start, span.end]
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// A proposed replacement reported alongside a finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correction {
    /// Exact text the service read at analysis time
    pub original: String,
    /// Text to substitute
    #[serde(alias = "novo")]
    pub replacement: String,
    /// Location in the analyzed snapshot, when the service knew it
    #[serde(default)]
    pub span: Option<Span>,
}

impl Correction {
    pub fn new(original: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            original: original.into(),
            replacement: replacement.into(),
            span: None,
        }
    }

    pub fn with_span(mut self, start: usize, end: usize) -> Self {
        self.span = Some(Span::new(start, end));
        self
    }
}

/// One reported issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(alias = "regra")]
    pub rule_name: String,
    #[serde(alias = "mensagem")]
    pub message: String,
    #[serde(default, alias = "contexto")]
    pub context: String,
    #[serde(default, alias = "tem_link")]
    pub has_anchor: bool,
    #[serde(default, alias = "correcao")]
    pub correction: Option<Correction>,
}

impl Finding {
    pub fn new(
        rule_name: impl Into<String>,
        message: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            rule_name: rule_name.into(),
            message: message.into(),
            context: context.into(),
            has_anchor: false,
            correction: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self.has_anchor = true;
        self
    }

    pub fn with_correction(mut self, correction: Correction) -> Self {
        self.correction = Some(correction);
        self
    }

    pub fn is_correctable(&self) -> bool {
        self.correction.is_some()
    }

    /// The correction's span, if this finding can take part in a batch apply.
    pub fn anchored_span(&self) -> Option<Span> {
        self.correction.as_ref().and_then(|c| c.span)
    }
}

/// Everything the analysis service returns for one submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    #[serde(default, alias = "tipo_documento")]
    pub document_type_label: String,
    #[serde(default, rename = "html")]
    pub rendered_html: String,
    #[serde(default, alias = "erros")]
    pub findings: Vec<Finding>,
}

impl AnalysisResult {
    pub fn find(&self, id: &str) -> Option<&Finding> {
        self.findings
            .iter()
            .find(|finding| finding.id.as_deref() == Some(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_overlap() {
        let a = Span::new(0, 5);
        assert!(a.overlaps(&Span::new(4, 8)));
        assert!(!a.overlaps(&Span::new(5, 8)));
        assert!(a.overlaps(&Span::new(2, 2)));
        assert!(!a.overlaps(&Span::new(5, 5)));
        assert!(!a.overlaps(&Span::new(0, 0)));
        assert!(Span::new(3, 3).overlaps(&Span::new(3, 3)));
        assert!(!Span::new(3, 3).overlaps(&Span::new(4, 4)));
    }

    #[test]
    fn test_decode_english_fields() {
        let json = r#"{
            "documentTypeLabel": "Resolução",
            "html": "<p>x</p>",
            "findings": [{
                "id": "erro_1",
                "ruleName": "Siglas",
                "message": "Sigla sem definição",
                "context": "Resolução",
                "hasAnchor": true,
                "correction": {"original": "ab", "replacement": "AB", "span": [3, 5]}
            }]
        }"#;
        let result: AnalysisResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.document_type_label, "Resolução");
        assert_eq!(result.rendered_html, "<p>x</p>");
        let finding = &result.findings[0];
        assert!(finding.has_anchor);
        assert_eq!(finding.anchored_span(), Some(Span::new(3, 5)));
        assert!(result.find("erro_1").is_some());
    }

    #[test]
    fn test_decode_legacy_fields() {
        let json = r#"{
            "tipo_documento": "CONDEL",
            "html": "",
            "erros": [
                {"id": null, "regra": "Artigos", "mensagem": "m", "contexto": "Anexo",
                 "tem_link": false, "correcao": null},
                {"id": "erro_2", "regra": "Incisos", "mensagem": "m", "contexto": "Resolução",
                 "tem_link": true, "correcao": {"original": "a", "novo": "b", "span": null}}
            ]
        }"#;
        let result: AnalysisResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.document_type_label, "CONDEL");
        assert_eq!(result.findings.len(), 2);
        assert!(!result.findings[0].is_correctable());
        let correction = result.findings[1].correction.as_ref().unwrap();
        assert_eq!(correction.replacement, "b");
        assert_eq!(correction.span, None);
    }

    #[test]
    fn test_span_serializes_as_pair() {
        let correction = Correction::new("a", "b").with_span(1, 2);
        let json = serde_json::to_value(&correction).unwrap();
        assert_eq!(json["span"], serde_json::json!([1, 2]));
    }
}
