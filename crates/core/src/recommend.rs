use std::cmp::Ordering;

use itertools::Itertools;

use crate::finding::{Finding, Severity};

// Fixed caps on caller-visible lists.
pub const MAX_CHECKS: usize = 20;
pub const MAX_ISSUES: usize = 10;
pub const MAX_CLAUSES: usize = 10;
pub const MAX_RECOMMENDATIONS: usize = 5;

/// Stable severity-descending order; confidence breaks ties, original order
/// breaks the rest, so truncation is deterministic for identical input.
pub fn sort_by_severity(findings: &mut [Finding]) {
    findings.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| {
                b.confidence
                    .partial_cmp(&a.confidence)
                    .unwrap_or(Ordering::Equal)
            })
    });
}

/// Sort by severity descending, then take the first `cap`.
pub fn truncate_findings(mut findings: Vec<Finding>, cap: usize) -> Vec<Finding> {
    sort_by_severity(&mut findings);
    findings.truncate(cap);
    findings
}

/// Remove exact duplicates, keeping the first occurrence.
pub fn dedupe(items: Vec<String>) -> Vec<String> {
    items.into_iter().unique().collect()
}

/// Derive the capped recommendation list. Critical findings collapse into a
/// single "address N critical ..." summary so they cannot flood the output;
/// remaining findings contribute their mitigation text in severity order.
/// Duplicates are removed before truncation.
pub fn derive_recommendations(
    findings: &[Finding],
    critical_label: &str,
    cap: usize,
) -> Vec<String> {
    let critical = findings
        .iter()
        .filter(|f| f.severity == Severity::Critical)
        .count();
    let mut out = Vec::new();
    if critical > 0 {
        let noun = if critical == 1 { "gap" } else { "gaps" };
        out.push(format!("Address {critical} critical {critical_label} {noun}"));
    }
    let mut rest: Vec<&Finding> = findings
        .iter()
        .filter(|f| f.severity != Severity::Critical)
        .collect();
    rest.sort_by(|a, b| b.severity.cmp(&a.severity));
    for finding in rest {
        match &finding.mitigation {
            Some(mitigation) => out.push(mitigation.clone()),
            None => out.push(format!("Review {}", finding.description)),
        }
    }
    let mut deduped = dedupe(out);
    deduped.truncate(cap);
    deduped
}
