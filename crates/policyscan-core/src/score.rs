//! Score model and the aggregation that derives the overall score.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Serialize;

use crate::category::CategoryKey;

/// Significant digits kept in [`ScoreReport::overall`].
const OVERALL_SIGNIFICANT_DIGITS: i32 = 3;

/// Per-category values that passed validation but have not been aggregated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreDraft {
    pub scores: BTreeMap<CategoryKey, u8>,
    pub descriptions: BTreeMap<CategoryKey, String>,
}

impl ScoreDraft {
    /// Records one category. A later insert for the same key replaces the earlier one.
    pub fn insert(&mut self, key: CategoryKey, score: u8, description: impl Into<String>) {
        self.scores.insert(key, score);
        self.descriptions.insert(key, description.into());
    }
}

impl From<&ScoreReport> for ScoreDraft {
    fn from(report: &ScoreReport) -> Self {
        Self {
            scores: report.scores.clone(),
            descriptions: report.descriptions.clone(),
        }
    }
}

/// Aggregated assessment. Only [`aggregate`] constructs one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    scores: BTreeMap<CategoryKey, u8>,
    descriptions: BTreeMap<CategoryKey, String>,
    overall: f64,
    complete: bool,
}

/// One display row of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportRow<'a> {
    pub key: CategoryKey,
    pub label: &'static str,
    pub score: u8,
    pub description: &'a str,
}

impl ScoreReport {
    /// Attaches the URL the assessment was made for.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// URL the model was asked about, when known.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    #[must_use]
    pub fn scores(&self) -> &BTreeMap<CategoryKey, u8> {
        &self.scores
    }

    #[must_use]
    pub fn descriptions(&self) -> &BTreeMap<CategoryKey, String> {
        &self.descriptions
    }

    #[must_use]
    pub fn score(&self, key: CategoryKey) -> Option<u8> {
        self.scores.get(&key).copied()
    }

    /// Mean category score scaled to `[0, 100]`, rounded to three significant digits.
    #[must_use]
    pub fn overall(&self) -> f64 {
        self.overall
    }

    /// `true` when every category in [`CategoryKey::ALL`] has a score.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Scored categories in canonical order, with their display labels.
    pub fn rows(&self) -> impl Iterator<Item = ReportRow<'_>> {
        CategoryKey::ALL.into_iter().filter_map(|key| {
            let score = *self.scores.get(&key)?;
            Some(ReportRow {
                key,
                label: key.label(),
                score,
                description: self.descriptions.get(&key).map_or("", String::as_str),
            })
        })
    }

    /// Renders the report as a markdown document headed by the analyzed URL.
    #[must_use]
    pub fn to_markdown(&self, url: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Privacy policy analysis\n");
        let _ = writeln!(out, "**URL:** {url}\n");
        let _ = writeln!(out, "**Overall score:** {}/100", self.overall);
        if !self.complete {
            let _ = writeln!(
                out,
                "\n_Partial report: {} of {} categories scored._",
                self.scores.len(),
                CategoryKey::ALL.len()
            );
        }
        for row in self.rows() {
            let _ = writeln!(out, "\n## {} ({}/10)\n", row.label, row.score);
            let _ = writeln!(out, "{}", row.description);
        }
        out
    }
}

/// Builds a [`ScoreReport`] from validated category values.
///
/// `overall` is the mean of whatever scores are present times ten, rounded to
/// three significant digits. Absent categories are left out of the mean and
/// clear the `complete` flag. An empty draft aggregates to `0.0`.
#[must_use]
pub fn aggregate(draft: ScoreDraft) -> ScoreReport {
    let complete = CategoryKey::ALL
        .iter()
        .all(|key| draft.scores.contains_key(key));

    let overall = if draft.scores.is_empty() {
        0.0
    } else {
        let sum: u32 = draft.scores.values().map(|&s| u32::from(s)).sum();
        #[allow(clippy::cast_precision_loss)]
        let mean = f64::from(sum) / draft.scores.len() as f64;
        round_significant(mean * 10.0, OVERALL_SIGNIFICANT_DIGITS)
    };

    ScoreReport {
        url: None,
        scores: draft.scores,
        descriptions: draft.descriptions,
        overall,
        complete,
    }
}

fn round_significant(value: f64, digits: i32) -> f64 {
    if value == 0.0 || !value.is_finite() {
        return value;
    }
    #[allow(clippy::cast_possible_truncation)]
    let magnitude = value.abs().log10().floor() as i32 + 1;
    let factor = 10f64.powi(digits - magnitude);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_draft(values: [u8; 8]) -> ScoreDraft {
        let mut draft = ScoreDraft::default();
        for (key, score) in CategoryKey::ALL.into_iter().zip(values) {
            draft.insert(key, score, format!("about {key}"));
        }
        draft
    }

    #[test]
    fn mean_of_six_gives_sixty() {
        let report = aggregate(full_draft([8, 7, 5, 2, 6, 9, 4, 7]));
        assert!((report.overall() - 60.0).abs() < f64::EPSILON);
        assert!(report.is_complete());
    }

    #[test]
    fn overall_is_rounded_to_three_significant_digits() {
        // mean = 49 / 8 = 6.125 -> 61.25 -> 61.3
        let report = aggregate(full_draft([7, 6, 6, 6, 6, 6, 6, 6]));
        assert!((report.overall() - 61.3).abs() < 1e-9, "{}", report.overall());
    }

    #[test]
    fn all_tens_is_one_hundred() {
        let report = aggregate(full_draft([10; 8]));
        assert!((report.overall() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn all_ones_is_ten() {
        let report = aggregate(full_draft([1; 8]));
        assert!((report.overall() - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn aggregation_is_idempotent() {
        let first = aggregate(full_draft([3, 9, 4, 1, 8, 8, 2, 6]));
        let second = aggregate(ScoreDraft::from(&first));
        assert_eq!(first, second);
    }

    #[test]
    fn partial_draft_uses_present_scores_only() {
        let mut draft = ScoreDraft::default();
        draft.insert(CategoryKey::DataCollected, 8, "");
        draft.insert(CategoryKey::Purpose, 4, "");
        let report = aggregate(draft);
        assert!(!report.is_complete());
        assert!((report.overall() - 60.0).abs() < f64::EPSILON);
        assert_eq!(report.score(CategoryKey::DataSold), None);
    }

    #[test]
    fn empty_draft_is_zero_and_incomplete() {
        let report = aggregate(ScoreDraft::default());
        assert!(!report.is_complete());
        assert!(report.overall().abs() < f64::EPSILON);
    }

    #[test]
    fn rows_follow_canonical_order_with_labels() {
        let report = aggregate(full_draft([8, 7, 5, 2, 6, 9, 4, 7]));
        let rows: Vec<_> = report.rows().collect();
        assert_eq!(rows.len(), 8);
        assert_eq!(rows[0].key, CategoryKey::DataCollected);
        assert_eq!(rows[0].label, "Data Collected");
        assert_eq!(rows[3].score, 2);
        assert_eq!(rows[7].description, "about policyClarity");
    }

    #[test]
    fn markdown_names_url_and_every_row() {
        let report = aggregate(full_draft([8, 7, 5, 2, 6, 9, 4, 7]));
        let md = report.to_markdown("https://example.com/privacy");
        assert!(md.contains("https://example.com/privacy"));
        assert!(md.contains("60/100"));
        for key in CategoryKey::ALL {
            assert!(md.contains(key.label()), "missing {key}");
        }
        assert!(!md.contains("Partial report"));
    }

    #[test]
    fn markdown_flags_partial_reports() {
        let mut draft = ScoreDraft::default();
        draft.insert(CategoryKey::DataSecurity, 9, "encrypted at rest");
        let md = aggregate(draft).to_markdown("https://example.com");
        assert!(md.contains("1 of 8 categories"));
    }

    #[test]
    fn url_is_attached_and_serialized_only_when_set() {
        let report = aggregate(full_draft([5; 8]));
        assert_eq!(report.url(), None);
        assert!(serde_json::to_value(&report).unwrap().get("url").is_none());

        let report = report.with_url("https://example.com/privacy");
        assert_eq!(report.url(), Some("https://example.com/privacy"));
        assert_eq!(
            serde_json::to_value(&report).unwrap()["url"],
            "https://example.com/privacy"
        );
    }

    #[test]
    fn report_serializes_category_keys_as_wire_names() {
        let report = aggregate(full_draft([5; 8]));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["scores"]["optOutOptions"], 5);
        assert_eq!(json["complete"], true);
        assert_eq!(json["overall"], 50.0);
    }
}
