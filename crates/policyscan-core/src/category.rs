//! The closed set of privacy categories every assessment is scored on.
//!
//! Prompt text, response validation and display labels are all derived from
//! [`CategoryKey::ALL`]; nothing else in the workspace enumerates categories.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the eight assessed aspects of a privacy policy.
///
/// Declaration order is the canonical display order (and the `Ord` order used
/// by the score maps).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CategoryKey {
    DataCollected,
    Purpose,
    DataSharing,
    DataSold,
    OptOutOptions,
    DataSecurity,
    DataDeletion,
    PolicyClarity,
}

impl CategoryKey {
    /// Every category, in canonical order.
    pub const ALL: [CategoryKey; 8] = [
        CategoryKey::DataCollected,
        CategoryKey::Purpose,
        CategoryKey::DataSharing,
        CategoryKey::DataSold,
        CategoryKey::OptOutOptions,
        CategoryKey::DataSecurity,
        CategoryKey::DataDeletion,
        CategoryKey::PolicyClarity,
    ];

    /// Key used in the structured JSON answer and in prompt text.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            CategoryKey::DataCollected => "dataCollected",
            CategoryKey::Purpose => "purpose",
            CategoryKey::DataSharing => "dataSharing",
            CategoryKey::DataSold => "dataSold",
            CategoryKey::OptOutOptions => "optOutOptions",
            CategoryKey::DataSecurity => "dataSecurity",
            CategoryKey::DataDeletion => "dataDeletion",
            CategoryKey::PolicyClarity => "policyClarity",
        }
    }

    /// Human-readable row label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            CategoryKey::DataCollected => "Data Collected",
            CategoryKey::Purpose => "Purpose",
            CategoryKey::DataSharing => "Data Sharing",
            CategoryKey::DataSold => "Data Sold",
            CategoryKey::OptOutOptions => "Opt-Out Options",
            CategoryKey::DataSecurity => "Data Security",
            CategoryKey::DataDeletion => "Data Deletion",
            CategoryKey::PolicyClarity => "Policy Clarity",
        }
    }

    /// One-sentence definition of what the category measures.
    #[must_use]
    pub const fn definition(self) -> &'static str {
        match self {
            CategoryKey::DataCollected => {
                "breadth/specificity of data types the policy discloses as collected."
            }
            CategoryKey::Purpose => "legitimacy/clarity of stated reasons for collecting data.",
            CategoryKey::DataSharing => "conditions and parties with whom data is shared.",
            CategoryKey::DataSold => "whether personal data is sold to third parties.",
            CategoryKey::OptOutOptions => "availability and simplicity of opt-out mechanisms.",
            CategoryKey::DataSecurity => "disclosed protective measures (encryption, audits).",
            CategoryKey::DataDeletion => "user ability to request/complete data deletion.",
            CategoryKey::PolicyClarity => "readability/accessibility of the policy's language.",
        }
    }
}

impl fmt::Display for CategoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not one of the eight category keys.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category key: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for CategoryKey {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}
