//! Terminal rendering of scan outcomes.

use policyscan_core::ScanOutcome;

pub(crate) const NOT_FOUND_MESSAGE: &str = "No privacy policy found on this page.";

pub(crate) const FAILURE_MESSAGE: &str = "The privacy policy could not be analyzed.";

/// The URL a report was made for, or the one the user submitted.
fn analyzed_url<'a>(outcome: &'a ScanOutcome, submitted: &'a str) -> &'a str {
    match outcome {
        ScanOutcome::Report { report } => report.url().unwrap_or(submitted),
        ScanOutcome::Narrative { .. } | ScanOutcome::NotFound => submitted,
    }
}

/// Markdown for narrative answers and reports, or the plain not-found line.
pub(crate) fn outcome_text(outcome: &ScanOutcome, submitted: &str) -> String {
    match outcome {
        ScanOutcome::Narrative { text } => text.clone(),
        ScanOutcome::Report { report } => report.to_markdown(analyzed_url(outcome, submitted)),
        ScanOutcome::NotFound => NOT_FOUND_MESSAGE.to_string(),
    }
}

pub(crate) fn outcome_json(outcome: &ScanOutcome, submitted: &str) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&serde_json::json!({
        "url": analyzed_url(outcome, submitted),
        "outcome": outcome,
    }))
}

#[cfg(test)]
mod tests {
    use policyscan_core::{aggregate, CategoryKey, ScoreDraft};

    use super::*;

    fn full_report() -> ScanOutcome {
        let mut draft = ScoreDraft::default();
        for key in CategoryKey::ALL {
            draft.insert(key, 6, format!("{} is average.", key.label()));
        }
        ScanOutcome::Report {
            report: aggregate(draft),
        }
    }

    #[test]
    fn not_found_renders_plain_message() {
        assert_eq!(
            outcome_text(&ScanOutcome::NotFound, "https://a.test/"),
            NOT_FOUND_MESSAGE
        );
    }

    #[test]
    fn narrative_passes_through() {
        let outcome = ScanOutcome::Narrative {
            text: "# https://a.test/privacy\n\n## Purpose: 6/10".to_string(),
        };
        assert_eq!(
            outcome_text(&outcome, "https://a.test/privacy"),
            "# https://a.test/privacy\n\n## Purpose: 6/10"
        );
    }

    #[test]
    fn report_renders_markdown_with_url() {
        let text = outcome_text(&full_report(), "https://a.test/privacy");
        assert!(text.contains("https://a.test/privacy"));
        assert!(text.contains("Data Collected"));
        assert!(text.contains("60/100"));
    }

    #[test]
    fn json_carries_kind_and_url() {
        let rendered = outcome_json(&full_report(), "https://a.test/privacy").unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["url"], "https://a.test/privacy");
        assert_eq!(value["outcome"]["kind"], "report");
        assert_eq!(value["outcome"]["report"]["scores"]["dataSold"], 6);
    }

    #[test]
    fn not_found_json_has_only_kind() {
        let rendered = outcome_json(&ScanOutcome::NotFound, "https://a.test/").unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["outcome"], serde_json::json!({ "kind": "not_found" }));
    }

    #[test]
    fn report_is_headed_with_the_analyzed_url() {
        let ScanOutcome::Report { report } = full_report() else {
            unreachable!()
        };
        let outcome = ScanOutcome::Report {
            report: report.with_url("https://www.a.test/privacy"),
        };

        let text = outcome_text(&outcome, "https://a.test/privacy");
        assert!(text.contains("**URL:** https://www.a.test/privacy"), "{text}");

        let rendered = outcome_json(&outcome, "https://a.test/privacy").unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["url"], "https://www.a.test/privacy");
    }
}
