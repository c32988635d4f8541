//! Canonical website quality analysis.
//!
//! Earlier collector versions stored analyses under inconsistent field names
//! (`aiSummary`/`summary`, `redFlags`/`red_flags`/`flags`) and signalled a
//! failed analysis by the literal flag string alone. This module normalises
//! all of those shapes exactly once, at the ingestion boundary, and carries an
//! explicit [`AnalysisStatus`] so failure detection no longer depends on
//! string matching. The human-readable flag is still written for operators.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Red flag recorded when the AI analyzer could not produce a result.
pub const AI_UNAVAILABLE_FLAG: &str = "AI Analysis Unavailable";

/// Outcome of the AI quality analysis for a scraped website.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Complete,
    Unavailable,
}

/// AI-derived summary and quality flags for a business website.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityAnalysis {
    pub summary: Option<String>,
    pub red_flags: Vec<String>,
    pub analysis_status: AnalysisStatus,
}

impl QualityAnalysis {
    /// A completed analysis with the given summary and flags.
    #[must_use]
    pub fn complete(summary: impl Into<String>, red_flags: Vec<String>) -> Self {
        Self {
            summary: Some(summary.into()),
            red_flags,
            analysis_status: AnalysisStatus::Complete,
        }
    }

    /// The analysis produced when the AI analyzer fails or is disabled.
    ///
    /// Records the named flag so maintenance can later requeue exactly these
    /// records without re-scraping everything.
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            summary: None,
            red_flags: vec![AI_UNAVAILABLE_FLAG.to_string()],
            analysis_status: AnalysisStatus::Unavailable,
        }
    }

    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        self.analysis_status == AnalysisStatus::Unavailable
    }

    /// Normalises a stored analysis value, tolerating legacy field names.
    ///
    /// Accepts the canonical shape, `aiSummary`/`redFlags` camelCase variants,
    /// and the bare `flags` list. A missing `analysis_status` is derived from
    /// the presence of [`AI_UNAVAILABLE_FLAG`]. Returns `None` for values that
    /// are not objects (including `null`).
    #[must_use]
    pub fn from_legacy_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;

        let summary = ["summary", "aiSummary", "ai_summary"]
            .iter()
            .find_map(|k| obj.get(*k))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned);

        let red_flags: Vec<String> = ["red_flags", "redFlags", "flags"]
            .iter()
            .find_map(|k| obj.get(*k))
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(Value::as_str)
                    .map(ToOwned::to_owned)
                    .collect()
            })
            .unwrap_or_default();

        let analysis_status = ["analysis_status", "analysisStatus"]
            .iter()
            .find_map(|k| obj.get(*k))
            .and_then(Value::as_str)
            .map_or_else(
                || {
                    if red_flags.iter().any(|f| f == AI_UNAVAILABLE_FLAG) {
                        AnalysisStatus::Unavailable
                    } else {
                        AnalysisStatus::Complete
                    }
                },
                |s| {
                    if s.eq_ignore_ascii_case("unavailable") {
                        AnalysisStatus::Unavailable
                    } else {
                        AnalysisStatus::Complete
                    }
                },
            );

        Some(Self {
            summary,
            red_flags,
            analysis_status,
        })
    }
}
