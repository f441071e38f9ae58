//! Markdown coverage summary
//!
//! Renders a [`CoverageSummary`] as a human-readable report: overall
//! totals, a per-organization table and the states still missing.

use crate::output::summary::CoverageSummary;
use crate::output::OutputResult;
use crate::relevance::STATE_COUNT;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown summary to `output_path`
pub fn generate_markdown_summary(summary: &CoverageSummary, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(summary);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a coverage summary as markdown
pub fn format_markdown_summary(summary: &CoverageSummary) -> String {
    let mut md = String::new();

    md.push_str("# Payer-Scout Coverage Summary\n\n");

    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!(
        "- **Organizations**: {}\n",
        summary.organizations.len()
    ));
    md.push_str(&format!(
        "- **Pages Visited**: {}\n",
        summary.total_pages_visited
    ));
    md.push_str(&format!(
        "- **Documents Found**: {}\n",
        summary.total_documents
    ));
    md.push_str(&format!(
        "- **States Covered**: {} / {}\n",
        summary.states_covered.len(),
        STATE_COUNT
    ));
    md.push_str(&format!(
        "- **Completeness**: {:.1}%\n\n",
        summary.completeness * 100.0
    ));

    if !summary.organizations.is_empty() {
        md.push_str("## By Organization\n\n");
        md.push_str("| Organization | Documents | Pages | States | Elapsed (s) |\n");
        md.push_str("|--------------|-----------|-------|--------|-------------|\n");

        for report in &summary.organizations {
            let states = if report.states_covered.is_empty() {
                "-".to_string()
            } else {
                report
                    .states_covered
                    .iter()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            md.push_str(&format!(
                "| {} | {} | {} | {} | {:.1} |\n",
                report.organization,
                report.total_documents,
                report.total_pages_visited,
                states,
                report.elapsed_seconds
            ));
        }
        md.push('\n');
    }

    let missing = summary.missing_states();
    if !missing.is_empty() {
        md.push_str("## States Without Coverage\n\n");
        md.push_str(&missing.join(", "));
        md.push_str("\n\n");
    }

    md
}
