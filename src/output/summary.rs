//! Aggregation of per-organization coverage reports

use crate::crawler::CoverageReport;
use crate::relevance::{is_state_tag, STATE_COUNT};
use std::collections::BTreeSet;

/// Totals across every organization of a run
#[derive(Debug, Clone, Default)]
pub struct CoverageSummary {
    /// Per-organization reports, in input order
    pub organizations: Vec<CoverageReport>,

    pub total_documents: usize,
    pub total_pages_visited: usize,

    /// Union of the states covered by any organization
    pub states_covered: BTreeSet<String>,

    /// `states_covered / 51`
    pub completeness: f64,
}

impl CoverageSummary {
    /// States with no document or page at all
    pub fn missing_states(&self) -> Vec<&'static str> {
        crate::relevance::STATES
            .iter()
            .map(|(_, code)| *code)
            .filter(|code| !self.states_covered.contains(*code))
            .collect()
    }
}

/// Builds the run summary; pure, no side effects
pub fn summarize(reports: &[CoverageReport]) -> CoverageSummary {
    let states_covered: BTreeSet<String> = reports
        .iter()
        .flat_map(|r| r.states_covered.iter())
        .filter(|tag| is_state_tag(tag))
        .cloned()
        .collect();

    CoverageSummary {
        organizations: reports.to_vec(),
        total_documents: reports.iter().map(|r| r.total_documents).sum(),
        total_pages_visited: reports.iter().map(|r| r.total_pages_visited).sum(),
        completeness: states_covered.len() as f64 / STATE_COUNT as f64,
        states_covered,
    }
}

/// Prints the summary to stdout in a formatted manner
pub fn print_summary(summary: &CoverageSummary) {
    println!("=== Coverage Summary ===\n");

    println!("Overview:");
    println!("  Organizations crawled: {}", summary.organizations.len());
    println!("  Pages visited: {}", summary.total_pages_visited);
    println!("  Documents found: {}", summary.total_documents);
    println!(
        "  States covered: {} / {} ({:.1}%)",
        summary.states_covered.len(),
        STATE_COUNT,
        summary.completeness * 100.0
    );
    println!();

    if !summary.organizations.is_empty() {
        println!("By Organization:");
        for report in &summary.organizations {
            println!(
                "  {}: {} document(s), {} page(s), {} state(s) in {:.1}s",
                report.organization,
                report.total_documents,
                report.total_pages_visited,
                report.states_covered.len(),
                report.elapsed_seconds
            );
        }
        println!();
    }

    if !summary.states_covered.is_empty() {
        let states: Vec<_> = summary.states_covered.iter().map(String::as_str).collect();
        println!("Covered: {}", states.join(", "));
    }
}
