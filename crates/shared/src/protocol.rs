use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    DetectionStatus, DiffType, Order, ReportId, ReviewStatus, RunId, Severity, SortType,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFilter {
    pub ids: Vec<RunId>,
    pub exact_match: bool,
}

impl RunFilter {
    pub fn exact(ids: impl Into<Vec<RunId>>) -> Self {
        Self {
            ids: ids.into(),
            exact_match: true,
        }
    }
}

/// Predicate set applied to a report listing.
///
/// `run`, `baseline` and `newcheck` select which run sets the query targets; they are
/// "set" when `Some`, even if the list is empty. Every other field narrows the result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run: Option<Vec<RunId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline: Option<Vec<RunId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub newcheck: Option<Vec<RunId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff_type: Option<DiffType>,
    #[serde(default)]
    pub checker_name: Vec<String>,
    #[serde(default)]
    pub checker_msg: Vec<String>,
    #[serde(default)]
    pub severity: Vec<Severity>,
    #[serde(default)]
    pub detection_status: Vec<DetectionStatus>,
    #[serde(default)]
    pub review_status: Vec<ReviewStatus>,
    #[serde(default)]
    pub file_path: Vec<String>,
    #[serde(default)]
    pub report_hash: Vec<String>,
    #[serde(default)]
    pub is_unique: bool,
}

impl ReportFilter {
    /// Filter matching every report carrying `hash`, duplicates across runs included.
    pub fn by_report_hash(hash: impl Into<String>) -> Self {
        Self {
            report_hash: vec![hash.into()],
            is_unique: false,
            ..Self::default()
        }
    }

    /// Sum of the lengths of every predicate list in the filter. Unset run selections
    /// and empty lists contribute nothing; `is_unique` and `diff_type` are not lists.
    pub fn active_predicate_count(&self) -> usize {
        let run_lists = [&self.run, &self.baseline, &self.newcheck]
            .into_iter()
            .flatten()
            .map(Vec::len)
            .sum::<usize>();

        run_lists
            + self.checker_name.len()
            + self.checker_msg.len()
            + self.severity.len()
            + self.detection_status.len()
            + self.review_status.len()
            + self.file_path.len()
            + self.report_hash.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareData {
    pub run_ids: Vec<RunId>,
    pub diff_type: DiffType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortMode {
    #[serde(rename = "type")]
    pub sort_type: SortType,
    pub ord: Order,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewData {
    pub status: ReviewStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
}

/// A report row exactly as the service sends it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportData {
    pub report_id: ReportId,
    pub run_id: RunId,
    pub checked_file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    pub checker_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checker_msg: Option<String>,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detection_status: Option<DetectionStatus>,
    #[serde(default)]
    pub review_data: ReviewData,
    pub bug_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunData {
    pub run_id: RunId,
    pub name: String,
    #[serde(default)]
    pub result_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunDataRequest {
    pub run_filter: RunFilter,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRequest {
    pub report_id: ReportId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResultsRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_ids: Option<Vec<RunId>>,
    pub limit: u64,
    pub offset: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_modes: Option<Vec<SortMode>>,
    pub report_filter: ReportFilter,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cmp_data: Option<CompareData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResultCountRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_ids: Option<Vec<RunId>>,
    pub report_filter: ReportFilter,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cmp_data: Option<CompareData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResultCountResponse {
    pub count: u64,
}
