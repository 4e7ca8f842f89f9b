//! Grouping of findings for presentation.
//!
//! Pure and borrowing: a [`Classification`] can be rebuilt from the same
//! findings at any time and always comes out the same.

use crate::model::Finding;

/// Findings sharing one context label, in their original relative order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindingGroup<'a> {
    pub context: &'a str,
    pub findings: Vec<&'a Finding>,
}

impl FindingGroup<'_> {
    /// A group is shown only when it has something in it.
    pub fn is_visible(&self) -> bool {
        !self.findings.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification<'a> {
    /// Primary context first (when present), then first-appearance order
    pub groups: Vec<FindingGroup<'a>>,
    /// Findings carrying a correction, with or without a span
    pub correctable_count: usize,
    /// Findings whose correction can be applied in bulk
    pub span_anchored_count: usize,
}

impl<'a> Classification<'a> {
    pub fn group(&self, context: &str) -> Option<&FindingGroup<'a>> {
        self.groups.iter().find(|group| group.context == context)
    }

    pub fn visible_groups(&self) -> impl Iterator<Item = &FindingGroup<'a>> {
        self.groups.iter().filter(|group| group.is_visible())
    }

    /// No findings at all.
    pub fn is_clean(&self) -> bool {
        self.groups.iter().all(|group| group.findings.is_empty())
    }

    pub fn total(&self) -> usize {
        self.groups.iter().map(|group| group.findings.len()).sum()
    }
}

/// Partition `findings` by context and count the correctable ones.
pub fn classify<'a>(findings: &'a [Finding], primary_context: &str) -> Classification<'a> {
    let mut groups: Vec<FindingGroup<'a>> = Vec::new();
    let mut correctable_count = 0;
    let mut span_anchored_count = 0;

    for finding in findings {
        if finding.is_correctable() {
            correctable_count += 1;
        }
        if finding.anchored_span().is_some() {
            span_anchored_count += 1;
        }

        match groups
            .iter_mut()
            .find(|group| group.context == finding.context)
        {
            Some(group) => group.findings.push(finding),
            None => groups.push(FindingGroup {
                context: &finding.context,
                findings: vec![finding],
            }),
        }
    }

    if let Some(pos) = groups
        .iter()
        .position(|group| group.context == primary_context)
    {
        let primary = groups.remove(pos);
        groups.insert(0, primary);
    }

    Classification {
        groups,
        correctable_count,
        span_anchored_count,
    }
}
