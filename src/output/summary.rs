//! Terminal summary of a crawl
//!
//! This module renders a [`CrawlReport`] for humans, the way the run ends
//! on the command line.

use crate::output::report::{CrawlReport, ErrorKind};

/// Maximum number of individual errors listed in the terminal summary
const MAX_LISTED_ERRORS: usize = 20;

/// Prints a crawl report to stdout in a formatted manner
///
/// # Arguments
///
/// * `report` - The report to display
pub fn print_report(report: &CrawlReport) {
    print!("{}", format_report(report));
}

/// Formats a crawl report as plain text
pub fn format_report(report: &CrawlReport) -> String {
    let mut out = String::new();

    out.push_str("=== Archive Summary ===\n\n");

    out.push_str(&format!("Seed: {}\n", report.seed));
    if let Some(duration) = report.duration_seconds() {
        out.push_str(&format!("Duration: {:.1}s\n", duration));
    }
    out.push('\n');

    out.push_str("Overview:\n");
    out.push_str(&format!("  Pages visited: {}\n", report.pages_visited));
    out.push_str(&format!("  Pages saved: {}\n", report.pages_saved));
    out.push_str(&format!("  Assets saved: {}\n", report.assets_saved));
    if report.pages_remaining > 0 {
        out.push_str(&format!(
            "  Pages left in frontier (page budget reached): {}\n",
            report.pages_remaining
        ));
    }
    out.push('\n');

    if !report.errors.is_empty() {
        out.push_str("Error Summary:\n");
        for kind in [ErrorKind::Fetch, ErrorKind::Parse, ErrorKind::Write] {
            let count = report.errors_of(kind).count();
            if count > 0 {
                out.push_str(&format!("  {}: {}\n", kind, count));
            }
        }
        out.push('\n');

        out.push_str("Errors:\n");
        for error in report.errors.iter().take(MAX_LISTED_ERRORS) {
            out.push_str(&format!("  - [{}] {}: {}\n", error.kind, error.url, error.message));
        }
        if report.errors.len() > MAX_LISTED_ERRORS {
            out.push_str(&format!(
                "  ... and {} more\n",
                report.errors.len() - MAX_LISTED_ERRORS
            ));
        }
        out.push('\n');
    }

    out.push_str(&format!(
        "Success Rate: {:.1}% ({} / {} pages saved, {} errors)\n",
        report.success_rate(),
        report.pages_saved,
        report.pages_visited,
        report.error_count()
    ));

    out
}
