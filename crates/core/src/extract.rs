use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::finding::{Category, Finding, Severity};

struct Rule {
    name: &'static str,
    category: Category,
    severity: Severity,
    confidence: f32,
    pattern: &'static str,
    mitigation: Option<&'static str>,
}

struct CompiledRule {
    rule: &'static Rule,
    regex: Regex,
}

fn compile(rules: &'static [Rule]) -> Vec<CompiledRule> {
    rules
        .iter()
        .map(|rule| CompiledRule {
            rule,
            regex: Regex::new(rule.pattern).expect("valid rule pattern"),
        })
        .collect()
}

static CLAUSE_RULES: [Rule; 10] = [
    Rule {
        name: "indemnification",
        category: Category::Legal,
        severity: Severity::Low,
        confidence: 0.9,
        pattern: r"(?i)indemnif(?:y|ies|ied|ication)",
        mitigation: None,
    },
    Rule {
        name: "limitation of liability",
        category: Category::Legal,
        severity: Severity::Low,
        confidence: 0.9,
        pattern: r"(?i)limitation\s+of\s+liability",
        mitigation: None,
    },
    Rule {
        name: "termination",
        category: Category::Legal,
        severity: Severity::Low,
        confidence: 0.85,
        pattern: r"(?i)terminat(?:e|es|ed|ion)",
        mitigation: None,
    },
    Rule {
        name: "confidentiality",
        category: Category::DataProtection,
        severity: Severity::Low,
        confidence: 0.9,
        pattern: r"(?i)confidential(?:ity)?",
        mitigation: None,
    },
    Rule {
        name: "payment terms",
        category: Category::Financial,
        severity: Severity::Low,
        confidence: 0.85,
        pattern: r"(?i)payment\s+terms|net\s+\d{2,3}\b",
        mitigation: None,
    },
    Rule {
        name: "governing law",
        category: Category::Legal,
        severity: Severity::Low,
        confidence: 0.9,
        pattern: r"(?i)governing\s+law|governed\s+by\s+the\s+laws",
        mitigation: None,
    },
    Rule {
        name: "force majeure",
        category: Category::Operational,
        severity: Severity::Low,
        confidence: 0.9,
        pattern: r"(?i)force\s+majeure",
        mitigation: None,
    },
    Rule {
        name: "warranty",
        category: Category::Legal,
        severity: Severity::Low,
        confidence: 0.85,
        pattern: r"(?i)warrant(?:y|ies)",
        mitigation: None,
    },
    Rule {
        name: "insurance",
        category: Category::Operational,
        severity: Severity::Low,
        confidence: 0.85,
        pattern: r"(?i)insurance|insured",
        mitigation: None,
    },
    Rule {
        name: "assignment",
        category: Category::Legal,
        severity: Severity::Low,
        confidence: 0.8,
        pattern: r"(?i)assign(?:ment)?\s+of\s+this\s+agreement|may\s+not\s+assign",
        mitigation: None,
    },
];

static RISK_RULES: [Rule; 11] = [
    Rule {
        name: "unlimited liability",
        category: Category::Legal,
        severity: Severity::Critical,
        confidence: 0.9,
        pattern: r"(?i)unlimited\s+liability",
        mitigation: Some("Negotiate a liability cap tied to fees paid"),
    },
    Rule {
        name: "unilateral amendment",
        category: Category::Legal,
        severity: Severity::High,
        confidence: 0.85,
        pattern: r"(?i)unilateral(?:ly)?\s+(?:amend|modif|chang)",
        mitigation: Some("Require mutual written consent for amendments"),
    },
    Rule {
        name: "sole discretion",
        category: Category::Legal,
        severity: Severity::High,
        confidence: 0.8,
        pattern: r"(?i)sole\s+discretion",
        mitigation: Some("Replace sole-discretion language with objective criteria"),
    },
    Rule {
        name: "liquidated damages",
        category: Category::Financial,
        severity: Severity::High,
        confidence: 0.85,
        pattern: r"(?i)liquidated\s+damages",
        mitigation: Some("Cap liquidated damages and tie them to actual loss"),
    },
    Rule {
        name: "non-cancelable term",
        category: Category::Financial,
        severity: Severity::High,
        confidence: 0.85,
        pattern: r"(?i)non[-\s]?cancell?able",
        mitigation: Some("Add a termination-for-convenience right with notice"),
    },
    Rule {
        name: "automatic renewal",
        category: Category::Financial,
        severity: Severity::Medium,
        confidence: 0.85,
        pattern: r"(?i)auto(?:matic(?:ally)?)?[-\s]?renew",
        mitigation: Some("Require renewal notice at least 60 days before term end"),
    },
    Rule {
        name: "perpetual obligation",
        category: Category::Legal,
        severity: Severity::Medium,
        confidence: 0.75,
        pattern: r"(?i)\bperpetual\b|\birrevocable\b",
        mitigation: Some("Bound perpetual or irrevocable grants to the agreement term"),
    },
    Rule {
        name: "change without notice",
        category: Category::Operational,
        severity: Severity::Medium,
        confidence: 0.75,
        pattern: r"(?i)without\s+(?:prior\s+)?notice",
        mitigation: Some("Require written notice before changes take effect"),
    },
    Rule {
        name: "penalty exposure",
        category: Category::Financial,
        severity: Severity::Medium,
        confidence: 0.7,
        pattern: r"(?i)penalt(?:y|ies)",
        mitigation: Some("Review penalty triggers and negotiate grace periods"),
    },
    Rule {
        name: "waiver of rights",
        category: Category::Legal,
        severity: Severity::Medium,
        confidence: 0.75,
        pattern: r"(?i)waiv(?:e|es|er)\s+(?:of\s+)?(?:any\s+)?right",
        mitigation: Some("Strike blanket waivers of statutory rights"),
    },
    Rule {
        name: "exclusivity",
        category: Category::Operational,
        severity: Severity::Medium,
        confidence: 0.75,
        pattern: r"(?i)exclusive\s+(?:supplier|provider|remedy|right)",
        mitigation: Some("Limit exclusivity to a defined scope and period"),
    },
];

static PROTECTION_RULES: [Rule; 6] = [
    Rule {
        name: "termination for convenience",
        category: Category::Legal,
        severity: Severity::Low,
        confidence: 0.85,
        pattern: r"(?i)terminat(?:e|ion)\s+for\s+convenience",
        mitigation: None,
    },
    Rule {
        name: "liability cap",
        category: Category::Legal,
        severity: Severity::Low,
        confidence: 0.85,
        pattern: r"(?i)liability\s+(?:is\s+)?(?:capped|limited\s+to)|cap\s+on\s+liability",
        mitigation: None,
    },
    Rule {
        name: "audit rights",
        category: Category::Compliance,
        severity: Severity::Low,
        confidence: 0.85,
        pattern: r"(?i)right\s+to\s+audit|audit\s+rights",
        mitigation: None,
    },
    Rule {
        name: "service levels",
        category: Category::Operational,
        severity: Severity::Low,
        confidence: 0.85,
        pattern: r"(?i)service\s+level(?:\s+agreement)?|\bSLA\b",
        mitigation: None,
    },
    Rule {
        name: "cure period",
        category: Category::Legal,
        severity: Severity::Low,
        confidence: 0.8,
        pattern: r"(?i)cure\s+period|opportunity\s+to\s+cure",
        mitigation: None,
    },
    Rule {
        name: "mutual indemnification",
        category: Category::Legal,
        severity: Severity::Low,
        confidence: 0.8,
        pattern: r"(?i)mutual(?:ly)?\s+(?:indemnif|agree)",
        mitigation: None,
    },
];

// Clauses a complete commercial contract is expected to carry; each absence
// feeds the missing-clause term of the risk score.
static EXPECTED_CLAUSES: [(&str, &str); 8] = [
    ("indemnification", r"(?i)indemnif"),
    ("limitation of liability", r"(?i)limitation\s+of\s+liability|liability\s+(?:is\s+)?(?:capped|limited)"),
    ("termination", r"(?i)terminat"),
    ("confidentiality", r"(?i)confidential"),
    ("governing law", r"(?i)governing\s+law|governed\s+by"),
    ("dispute resolution", r"(?i)dispute\s+resolution|arbitration|mediation"),
    ("force majeure", r"(?i)force\s+majeure"),
    ("data protection", r"(?i)data\s+protection|personal\s+data|\bGDPR\b"),
];

static COMPILED_CLAUSES: Lazy<Vec<CompiledRule>> = Lazy::new(|| compile(&CLAUSE_RULES));
static COMPILED_RISKS: Lazy<Vec<CompiledRule>> = Lazy::new(|| compile(&RISK_RULES));
static COMPILED_PROTECTIONS: Lazy<Vec<CompiledRule>> = Lazy::new(|| compile(&PROTECTION_RULES));
static COMPILED_EXPECTED: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    EXPECTED_CLAUSES
        .iter()
        .map(|(name, pattern)| (*name, Regex::new(pattern).expect("valid clause pattern")))
        .collect()
});

static PARTY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)between\s+(?:["“]?)([A-Z][A-Za-z0-9 .&'-]{2,60}?)(?:["”]?)\s+and\s+(?:["“]?)([A-Z][A-Za-z0-9 .&'-]{2,60}?)(?:["”]?)\s*[,.;(]"#)
        .expect("valid party pattern")
});
static AMOUNT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:USD|EUR|GBP|\$|€|£)\s?\d{1,3}(?:[\d,.]*)(?:\s?(?:million|billion|k|m))?")
        .expect("valid amount pattern")
});
static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:january|february|march|april|may|june|july|august|september|october|november|december)\s+\d{1,2},?\s+\d{4}\b|\b\d{4}-\d{2}-\d{2}\b")
        .expect("valid date pattern")
});

#[derive(Debug, Clone, Default)]
pub struct ExtractionConfig {
    /// Restrict risk extraction to these categories; empty means all.
    pub categories: Vec<Category>,
}

impl ExtractionConfig {
    fn admits(&self, category: Category) -> bool {
        self.categories.is_empty() || self.categories.contains(&category)
    }
}

fn scan(text: &str, rules: &[CompiledRule], config: &ExtractionConfig) -> Vec<Finding> {
    let mut findings = Vec::new();
    for compiled in rules {
        if !config.admits(compiled.rule.category) {
            continue;
        }
        if let Some(m) = compiled.regex.find(text) {
            let mut finding = Finding::new(
                compiled.rule.category,
                compiled.rule.severity,
                compiled.rule.confidence,
                compiled.rule.name,
            )
            .at(m.start());
            if let Some(mitigation) = compiled.rule.mitigation {
                finding = finding.with_mitigation(mitigation);
            }
            findings.push(finding);
        }
    }
    findings
}

/// Detect which standard clause types the text carries. Empty on no match.
pub fn extract_clauses(text: &str, config: &ExtractionConfig) -> Vec<Finding> {
    scan(text, &COMPILED_CLAUSES, config)
}

/// Detect risk language. Each hit carries a mitigation suggestion.
pub fn extract_risks(text: &str, config: &ExtractionConfig) -> Vec<Finding> {
    scan(text, &COMPILED_RISKS, config)
}

/// Detect protective language that offsets the risk score.
pub fn extract_protections(text: &str, config: &ExtractionConfig) -> Vec<Finding> {
    scan(text, &COMPILED_PROTECTIONS, config)
}

/// Expected clause types with no match anywhere in the text.
pub fn missing_clauses(text: &str) -> Vec<&'static str> {
    COMPILED_EXPECTED
        .iter()
        .filter(|(_, regex)| !regex.is_match(text))
        .map(|(name, _)| *name)
        .collect()
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ContractEntities {
    pub parties: Vec<String>,
    pub amounts: Vec<String>,
    pub dates: Vec<String>,
}

/// Named entities useful for the report header: contracting parties,
/// monetary amounts, dates.
pub fn extract_entities(text: &str) -> ContractEntities {
    let mut entities = ContractEntities::default();
    if let Some(caps) = PARTY_RE.captures(text) {
        for idx in 1..=2 {
            if let Some(party) = caps.get(idx) {
                entities.parties.push(party.as_str().trim().to_string());
            }
        }
    }
    for m in AMOUNT_RE.find_iter(text).take(10) {
        entities.amounts.push(m.as_str().trim().to_string());
    }
    for m in DATE_RE.find_iter(text).take(10) {
        entities.dates.push(m.as_str().trim().to_string());
    }
    entities.amounts.dedup();
    entities.dates.dedup();
    entities
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::Severity;

    const SAMPLE: &str = "This Agreement is made between Acme Corp and Widget LLC, \
        effective January 5, 2026. Supplier accepts unlimited liability for all claims. \
        Fees of $120,000 are payable net 30. The term auto-renews annually. \
        Either party may terminate for convenience with 30 days notice. \
        All information is confidential.";

    #[test]
    fn detects_risks_with_severity() {
        let risks = extract_risks(SAMPLE, &ExtractionConfig::default());
        let unlimited = risks
            .iter()
            .find(|f| f.description == "unlimited liability")
            .expect("unlimited liability detected");
        assert_eq!(unlimited.severity, Severity::Critical);
        assert!(unlimited.mitigation.is_some());
        assert!(unlimited.location.is_some());
    }

    #[test]
    fn detects_protections() {
        let protections = extract_protections(SAMPLE, &ExtractionConfig::default());
        assert!(protections
            .iter()
            .any(|f| f.description == "termination for convenience"));
    }

    #[test]
    fn category_filter_restricts_output() {
        let config = ExtractionConfig {
            categories: vec![Category::Financial],
        };
        let risks = extract_risks(SAMPLE, &config);
        assert!(!risks.is_empty());
        assert!(risks.iter().all(|f| f.category == Category::Financial));
    }

    #[test]
    fn no_matches_yields_empty_not_error() {
        let findings = extract_risks("nothing notable here", &ExtractionConfig::default());
        assert!(findings.is_empty());
    }

    #[test]
    fn missing_clauses_reports_absent_expected_clauses() {
        let missing = missing_clauses(SAMPLE);
        assert!(missing.contains(&"force majeure"));
        assert!(missing.contains(&"governing law"));
        assert!(!missing.contains(&"confidentiality"));
        assert!(!missing.contains(&"termination"));
    }

    #[test]
    fn entities_capture_parties_and_amounts() {
        let entities = extract_entities(SAMPLE);
        assert_eq!(entities.parties, vec!["Acme Corp", "Widget LLC"]);
        assert!(entities.amounts.iter().any(|a| a.contains("120,000")));
        assert!(entities.dates.iter().any(|d| d.contains("2026")));
    }
}
