//! JSON Lines result records
//!
//! Each line is one [`CrawlResult`]: `organization`, `status`,
//! `termination`, `discovered_documents`, `urls_visited`, `failed_fetches`,
//! `coverage` and `crawled_at`.

use crate::crawler::CrawlResult;
use crate::output::OutputResult;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Serializes one result as a single JSON line (without the newline)
pub fn to_json_line(result: &CrawlResult) -> OutputResult<String> {
    Ok(serde_json::to_string(result)?)
}

/// Writes all results to `output_path`, one per line, replacing the file
pub fn write_results_jsonl(results: &[CrawlResult], output_path: &Path) -> OutputResult<()> {
    let mut writer = BufWriter::new(File::create(output_path)?);
    for result in results {
        writeln!(writer, "{}", to_json_line(result)?)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::{CoverageReport, DiscoveredDocument};
    use crate::state::{CrawlState, Termination};
    use std::collections::BTreeSet;
    use tempfile::TempDir;
    use url::Url;

    fn create_test_result(org: &str) -> CrawlResult {
        let page = Url::parse("https://x.test/providers").unwrap();
        CrawlResult {
            organization: org.to_string(),
            status: CrawlState::Completed,
            termination: Termination::FrontierExhausted,
            discovered_documents: vec![DiscoveredDocument {
                url: Url::parse("https://x.test/oh/manual.pdf").unwrap(),
                source_page: page.clone(),
                anchor_text: "Ohio Provider Manual".to_string(),
                regional_tags: ["OH".to_string()].into_iter().collect(),
                discovery_depth: 0,
                topics: BTreeSet::new(),
            }],
            urls_visited: vec![page],
            failed_fetches: Vec::new(),
            coverage: CoverageReport {
                organization: org.to_string(),
                states_covered: ["OH".to_string()].into_iter().collect(),
                total_documents: 1,
                total_pages_visited: 1,
                elapsed_seconds: 1.5,
            },
            crawled_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_json_line_fields() {
        let line = to_json_line(&create_test_result("X")).unwrap();
        assert!(!line.contains('\n'));

        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["organization"], "X");
        assert_eq!(value["status"], "completed");
        assert_eq!(value["termination"], "frontier_exhausted");
        assert_eq!(value["urls_visited"][0], "https://x.test/providers");
        assert_eq!(value["discovered_documents"][0]["regional_tags"][0], "OH");
        assert_eq!(value["coverage"]["total_pages_visited"], 1);
        assert!(value["failed_fetches"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_write_results_jsonl() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.jsonl");

        write_results_jsonl(&[create_test_result("A"), create_test_result("B")], &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"organization\":\"A\""));
        assert!(lines[1].contains("\"organization\":\"B\""));
    }
}
