//! Markdown report generation
//!
//! This module writes a markdown version of a crawl report, including
//! counts, the error breakdown, and every recorded error.

use crate::output::report::{CrawlReport, ErrorKind};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes a markdown report of a crawl
///
/// # Arguments
///
/// * `report` - The crawl report
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote the report
/// * `Err(io::Error)` - Failed to write the report
pub fn write_markdown_report(report: &CrawlReport, output_path: &Path) -> std::io::Result<()> {
    let markdown = format_markdown_report(report);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a crawl report as markdown
pub fn format_markdown_report(report: &CrawlReport) -> String {
    let mut md = String::new();

    md.push_str("# Offline Archive Report\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Seed**: {}\n", report.seed));
    md.push_str(&format!("- **Started**: {}\n", report.started_at.to_rfc3339()));
    if let Some(finished) = &report.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished.to_rfc3339()));
    }
    if let Some(duration) = report.duration_seconds() {
        md.push_str(&format!("- **Duration**: {:.1} seconds\n", duration));
    }
    md.push('\n');

    // Counts
    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Pages Visited**: {}\n", report.pages_visited));
    md.push_str(&format!("- **Pages Saved**: {}\n", report.pages_saved));
    md.push_str(&format!("- **Assets Saved**: {}\n", report.assets_saved));
    if report.pages_remaining > 0 {
        md.push_str(&format!(
            "- **Pages Not Crawled (budget)**: {}\n",
            report.pages_remaining
        ));
    }
    md.push_str(&format!("- **Total Errors**: {}\n", report.error_count()));
    md.push_str(&format!(
        "- **Success Rate**: {:.2}%\n\n",
        report.success_rate()
    ));

    if !report.errors.is_empty() {
        md.push_str("## Error Summary\n\n");
        md.push_str("| Error Type | Count |\n");
        md.push_str("|------------|-------|\n");
        for kind in [ErrorKind::Fetch, ErrorKind::Parse, ErrorKind::Write] {
            md.push_str(&format!("| {} | {} |\n", kind, report.errors_of(kind).count()));
        }
        md.push('\n');

        md.push_str("## Errors\n\n");
        md.push_str("| Type | URL | Message |\n");
        md.push_str("|------|-----|---------|\n");
        for error in &report.errors {
            md.push_str(&format!(
                "| {} | {} | {} |\n",
                error.kind,
                table_cell(&error.url),
                table_cell(&error.message)
            ));
        }
        md.push('\n');
    }

    md
}

/// Escapes text so it stays inside one markdown table cell
fn table_cell(text: &str) -> String {
    text.replace('|', "\\|").replace(['\r', '\n'], " ")
}
