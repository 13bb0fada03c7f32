use shared::{
    domain::{DetectionStatus, DiffType, ReportId, ReviewStatus, RunId, Severity},
    protocol::{CompareData, ReportData, ReportFilter, ReviewData, RunData, RunFilter},
};

pub const ALL_REPORTS_TAB: &str = "allReports";

/// A report row as the list and detail views consume it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSummary {
    pub report_id: ReportId,
    pub run_id: RunId,
    /// File path, with `" @ Line <n>"` appended when the report has a line.
    pub checked_file: String,
    pub file_path: String,
    pub line: Option<u32>,
    pub checker_id: String,
    pub checker_message: Option<String>,
    pub severity: Severity,
    pub detection_status: Option<DetectionStatus>,
    pub review_status: ReviewStatus,
    pub review_comment: String,
    pub review: ReviewData,
    pub bug_hash: String,
}

impl From<ReportData> for ReportSummary {
    fn from(data: ReportData) -> Self {
        let checked_file = match data.line {
            Some(line) => format!("{} @ Line {line}", data.checked_file),
            None => data.checked_file.clone(),
        };
        let review_comment = review_comment(&data.review_data);

        Self {
            report_id: data.report_id,
            run_id: data.run_id,
            checked_file,
            file_path: data.checked_file,
            line: data.line,
            checker_id: data.checker_id,
            checker_message: data.checker_msg,
            severity: data.severity,
            detection_status: data.detection_status,
            review_status: data.review_data.status,
            review_comment,
            review: data.review_data,
            bug_hash: data.bug_hash,
        }
    }
}

impl ReportSummary {
    /// Last path component of the checked file, used as the detail view title.
    pub fn file_name(&self) -> &str {
        self.file_path
            .rsplit_once('/')
            .map_or(self.file_path.as_str(), |(_, name)| name)
    }
}

fn review_comment(review: &ReviewData) -> String {
    match (&review.author, &review.comment) {
        (None, _) => String::new(),
        (Some(_), Some(comment)) if !comment.is_empty() => comment.clone(),
        (Some(_), _) => "-".to_string(),
    }
}

/// Grid columns of the report list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    File,
    Message,
    CheckerName,
    Severity,
    ReviewStatus,
    ReviewComment,
    DetectionStatus,
}

impl Column {
    pub const ALL: [Column; 7] = [
        Column::File,
        Column::Message,
        Column::CheckerName,
        Column::Severity,
        Column::ReviewStatus,
        Column::ReviewComment,
        Column::DetectionStatus,
    ];

    /// Column whose sort key is `field`. Aliases the service accepts have no column.
    pub fn from_field(field: &str) -> Option<Column> {
        Column::ALL.into_iter().find(|column| column.field() == field)
    }

    pub fn field(self) -> &'static str {
        match self {
            Column::File => "checkedFile",
            Column::Message => "checkerMsg",
            Column::CheckerName => "checkerId",
            Column::Severity => "severity",
            Column::ReviewStatus => "reviewStatus",
            Column::ReviewComment => "reviewComment",
            Column::DetectionStatus => "detectionStatus",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Column::File => "File",
            Column::Message => "Message",
            Column::CheckerName => "Checker name",
            Column::Severity => "Severity",
            Column::ReviewStatus => "Review status",
            Column::ReviewComment => "Review comment",
            Column::DetectionStatus => "Detection status",
        }
    }

    pub fn is_sortable(self) -> bool {
        !matches!(self, Column::Message | Column::ReviewComment)
    }
}

/// One key of a multi-key sort: a grid column and the click direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub column: String,
    pub descending: bool,
}

impl SortSpec {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: false,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: true,
        }
    }
}

impl From<(Column, bool)> for SortSpec {
    fn from((column, descending): (Column, bool)) -> Self {
        Self {
            column: column.field().to_string(),
            descending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub start: u64,
    pub count: u64,
}

impl PageRequest {
    pub fn first(count: u64) -> Self {
        Self { start: 0, count }
    }

    pub fn is_past(&self, total: u64) -> bool {
        self.start > 0 && self.start >= total
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPage {
    pub rows: Vec<ReportSummary>,
    pub total: u64,
    pub comparison: Option<CompareData>,
}

/// Run target and optional comparison a report query is issued against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunResultParam {
    pub run_ids: Option<Vec<RunId>>,
    pub cmp_data: Option<CompareData>,
}

impl RunResultParam {
    pub fn from_filter(filter: &ReportFilter) -> Self {
        if let Some(run) = &filter.run {
            return Self {
                run_ids: Some(run.clone()),
                cmp_data: None,
            };
        }

        if filter.baseline.is_none() && filter.newcheck.is_none() {
            return Self::default();
        }

        let cmp_data = filter.newcheck.as_ref().map(|newcheck| CompareData {
            run_ids: newcheck.clone(),
            diff_type: filter.diff_type.unwrap_or_default(),
        });

        Self {
            run_ids: filter.baseline.clone(),
            cmp_data,
        }
    }
}

/// Ambient run context a view controller was created for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewContext {
    pub run: Option<RunData>,
    pub baseline: Option<RunData>,
    pub newcheck: Option<RunData>,
    pub diff_type: Option<DiffType>,
    pub all_reports: bool,
}

impl ViewContext {
    pub fn for_run(run: RunData) -> Self {
        Self {
            run: Some(run),
            ..Self::default()
        }
    }

    pub fn for_comparison(
        baseline: Option<RunData>,
        newcheck: Option<RunData>,
        diff_type: Option<DiffType>,
    ) -> Self {
        Self {
            baseline,
            newcheck,
            diff_type,
            ..Self::default()
        }
    }

    pub fn all_reports() -> Self {
        Self {
            all_reports: true,
            ..Self::default()
        }
    }

    pub fn is_diff_view(&self) -> bool {
        self.baseline.is_some() || self.newcheck.is_some() || self.diff_type.is_some()
    }

    /// Identity written as the `tab` key of the address.
    pub fn tab_identity(&self) -> String {
        if self.all_reports {
            return ALL_REPORTS_TAB.to_string();
        }
        if let Some(run) = &self.run {
            return run.name.clone();
        }
        match (&self.baseline, &self.newcheck) {
            (Some(baseline), Some(newcheck)) => format!("{}_{}", baseline.name, newcheck.name),
            (Some(only), None) | (None, Some(only)) => only.name.clone(),
            (None, None) => ALL_REPORTS_TAB.to_string(),
        }
    }

    /// Filter the filter panel starts from.
    pub fn initial_filter(&self) -> ReportFilter {
        if let Some(run) = &self.run {
            return ReportFilter {
                run: Some(vec![run.run_id]),
                ..ReportFilter::default()
            };
        }

        ReportFilter {
            baseline: self.baseline.as_ref().map(|run| vec![run.run_id]),
            newcheck: self.newcheck.as_ref().map(|run| vec![run.run_id]),
            diff_type: self.diff_type,
            ..ReportFilter::default()
        }
    }

    /// Runs whose history the run-history panel shows.
    pub fn run_filter(&self) -> RunFilter {
        let ids = [&self.run, &self.baseline, &self.newcheck]
            .into_iter()
            .flatten()
            .map(|run| run.run_id)
            .collect::<Vec<_>>();
        RunFilter::exact(ids)
    }
}

#[cfg(test)]
#[path = "tests/types_tests.rs"]
mod tests;
