use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use serde_json::json;
use tokio::runtime::Runtime;
use walkdir::WalkDir;

use clausewise_agents::{
    AgentContext, ComplianceChecker, ContractAnalyzer, NegotiationAdvisor, NegotiationRequest,
    RfqEvaluator, RfqRequest, SavingsRequest, SavingsTracker, VendorRequest, VendorRiskAgent,
};
use clausewise_core::{AnalysisDepth, AnalysisOptions, AnalysisRequest};

use crate::config::{self, CliConfig};
use crate::logging;

pub fn contract(input: String, depth: String) -> Result<()> {
    let text = read_text(&input)?;
    let depth = parse_depth(&depth)?;
    let ctx = build_context()?;
    let analyzer = ContractAnalyzer::new(ctx);
    let runtime = Runtime::new().context("failed to start tokio runtime")?;
    logging::stage("contract", format!("analyzing {input}"));
    let request = AnalysisRequest {
        text,
        options: AnalysisOptions {
            depth,
            ..Default::default()
        },
    };
    let report = runtime.block_on(analyzer.analyze(&request))?;
    print_json(&report)
}

pub fn compliance(input: String, regulations: String) -> Result<()> {
    let text = read_text(&input)?;
    let ctx = build_context()?;
    let checker = ComplianceChecker::new(ctx);
    logging::stage("compliance", format!("checking {input}"));
    let request = AnalysisRequest {
        text,
        options: AnalysisOptions {
            regulations: split_list(&regulations),
            ..Default::default()
        },
    };
    let report = checker.check(&request)?;
    print_json(&report)
}

pub fn vendor(input: String) -> Result<()> {
    let request: VendorRequest = read_json(&input)?;
    logging::stage("vendor", format!("evaluating {}", request.vendor));
    let report = VendorRiskAgent::new().evaluate(&request)?;
    print_json(&report)
}

pub fn rfq(input: String) -> Result<()> {
    let request: RfqRequest = read_json(&input)?;
    logging::stage("rfq", format!("evaluating {}", request.title));
    let report = RfqEvaluator::new().evaluate(&request)?;
    print_json(&report)
}

pub fn negotiation(input: String) -> Result<()> {
    let request: NegotiationRequest = read_json(&input)?;
    let ctx = build_context()?;
    let advisor = NegotiationAdvisor::new(ctx);
    let runtime = Runtime::new().context("failed to start tokio runtime")?;
    logging::stage("negotiation", format!("preparing brief from {input}"));
    let report = runtime.block_on(advisor.prepare(&request))?;
    print_json(&report)
}

pub fn savings(input: String) -> Result<()> {
    let request: SavingsRequest = read_json(&input)?;
    logging::stage("savings", format!("summarizing {} records", request.records.len()));
    let report = SavingsTracker::new().report(&request)?;
    print_json(&report)
}

pub fn batch(input: String, extensions: String) -> Result<()> {
    let root = Path::new(&input);
    if !root.is_dir() {
        return Err(anyhow!("{input} is not a directory"));
    }
    let allowed = split_list(&extensions);
    let files = collect_files(root, &allowed);
    if files.is_empty() {
        return Err(anyhow!("no matching files under {input}"));
    }
    let ctx = build_context()?;
    let analyzer = ContractAnalyzer::new(ctx);
    let runtime = Runtime::new().context("failed to start tokio runtime")?;
    let total = files.len();
    let mut entries = Vec::with_capacity(total);
    for (position, path) in files.into_iter().enumerate() {
        logging::stage(
            "batch",
            format!("analyzing {} ({}/{})", path.display(), position + 1, total),
        );
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let request = AnalysisRequest::new(text);
        match runtime.block_on(analyzer.analyze(&request)) {
            Ok(report) => entries.push(json!({
                "file": path.display().to_string(),
                "report": report,
            })),
            Err(err) => {
                logging::stage("batch", format!("skipping {}: {err}", path.display()));
                entries.push(json!({
                    "file": path.display().to_string(),
                    "error": { "error": err.code(), "message": err.to_string() },
                }));
            }
        }
    }
    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}

fn build_context() -> Result<Arc<AgentContext>> {
    let cli_config = CliConfig::from_env()?;
    let llm = match cli_config.build_client() {
        Ok(client) => {
            logging::verbose(format!(
                "llm provider {} model {}",
                client.provider().as_str(),
                client.model()
            ));
            Some(client)
        }
        Err(err) => {
            logging::info(format!("llm unavailable ({err}), running pattern-only"));
            None
        }
    };
    Ok(AgentContext::new(llm, config::load_weight_settings()))
}

fn parse_depth(raw: &str) -> Result<AnalysisDepth> {
    match raw.trim().to_lowercase().as_str() {
        "quick" => Ok(AnalysisDepth::Quick),
        "standard" => Ok(AnalysisDepth::Standard),
        "deep" => Ok(AnalysisDepth::Deep),
        other => Err(anyhow!("unknown depth {other}")),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

fn collect_files(root: &Path, extensions: &[String]) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| {
                    let lower = ext.to_lowercase();
                    extensions.iter().any(|allowed| *allowed == lower)
                })
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    files
}

fn read_text(input: &str) -> Result<String> {
    fs::read_to_string(input).with_context(|| format!("failed to read {input}"))
}

fn read_json<T: serde::de::DeserializeOwned>(input: &str) -> Result<T> {
    let raw = read_text(input)?;
    serde_json::from_str(&raw).with_context(|| format!("invalid request in {input}"))
}

fn print_json<T: serde::Serialize>(report: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parse_depth_accepts_known_values() {
        assert_eq!(parse_depth("Quick").unwrap(), AnalysisDepth::Quick);
        assert_eq!(parse_depth(" deep ").unwrap(), AnalysisDepth::Deep);
        assert!(parse_depth("thorough").is_err());
    }

    #[test]
    fn split_list_drops_blanks() {
        assert_eq!(split_list("gdpr, ,sox"), vec!["gdpr", "sox"]);
        assert!(split_list("").is_empty());
    }

    #[test]
    fn collect_files_filters_by_extension_and_sorts() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), "b").unwrap();
        fs::write(dir.path().join("a.md"), "a").unwrap();
        fs::write(dir.path().join("c.pdf"), "c").unwrap();
        let files = collect_files(
            dir.path(),
            &["txt".to_string(), "md".to_string()],
        );
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("a.md"));
        assert!(files[1].ends_with("b.txt"));
    }
}
