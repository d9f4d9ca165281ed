//! Plain-text reports for a firing and for a dry run

use crate::crawler::{FiringReport, ListingSource, RentalIndexScraper};

/// Formats the per-source outcomes of one firing
pub fn format_firing_report(report: &FiringReport) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "Firing started {} ({} sources, {} succeeded, {} failed)\n",
        report.started_at.format("%Y-%m-%d %H:%M:%S"),
        report.outcomes.len(),
        report.succeeded(),
        report.failed()
    ));

    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(summary) if summary.success => out.push_str(&format!(
                "  {}: ok, {} found, {} added\n",
                outcome.source, summary.listings_found, summary.listings_added
            )),
            Ok(summary) => out.push_str(&format!(
                "  {}: FAILED ({})\n",
                outcome.source,
                summary.error_message.as_deref().unwrap_or("unknown error")
            )),
            Err(message) => out.push_str(&format!(
                "  {}: ERROR, summary not recorded ({})\n",
                outcome.source, message
            )),
        }
    }

    out
}

/// Formats the index URLs a source would fetch and the policy decision for each
pub fn format_dry_run(scraper: &RentalIndexScraper) -> String {
    let mut out = format!(
        "{} ({} locations)\n",
        scraper.source_name(),
        scraper.locations().len()
    );

    for (url, allowed) in scraper.planned_fetches() {
        let decision = if allowed { "allowed" } else { "DISALLOWED" };
        out.push_str(&format!("  [{}] {}\n", decision, url));
    }

    out
}
