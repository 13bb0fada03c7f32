//! Translation of list requests into report-service calls.

use std::sync::Arc;

use shared::{
    domain::{Order, ReportId, RunId, SortType},
    protocol::{ReportFilter, RunData, RunFilter, SortMode},
};
use tracing::{debug, warn};

use crate::{
    error::ViewerError,
    events::EventBus,
    types::{PageRequest, QueryPage, ReportSummary, RunResultParam, SortSpec},
    ReportService,
};

pub const DEFAULT_MAX_QUERY_SIZE: u64 = 500;

/// Maps a grid sort key to the service sort mode. Unknown columns sort by severity.
pub fn to_sort_mode(sort: &SortSpec) -> SortMode {
    let sort_type = match sort.column.as_str() {
        "checkedFile" | "file" => SortType::Filename,
        "checkerId" | "checkerName" => SortType::CheckerName,
        "detectionStatus" => SortType::DetectionStatus,
        "reviewStatus" => SortType::ReviewStatus,
        _ => SortType::Severity,
    };
    let ord = if sort.descending {
        Order::Desc
    } else {
        Order::Asc
    };
    SortMode { sort_type, ord }
}

#[derive(Clone)]
pub struct QueryAdapter {
    service: Arc<dyn ReportService>,
    events: EventBus,
    max_query_size: u64,
}

impl QueryAdapter {
    pub fn new(service: Arc<dyn ReportService>, events: EventBus) -> Self {
        Self {
            service,
            events,
            max_query_size: DEFAULT_MAX_QUERY_SIZE,
        }
    }

    pub fn with_max_query_size(mut self, max_query_size: u64) -> Self {
        self.max_query_size = max_query_size.max(1);
        self
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Fetches one page of reports plus the total matching `filter`.
    ///
    /// The total comes from a separate count call against the same run target, filter
    /// and comparison; it is the authoritative bound for paging.
    pub async fn query(
        &self,
        filter: &ReportFilter,
        sort: &[SortSpec],
        page: PageRequest,
    ) -> Result<QueryPage, ViewerError> {
        let param = RunResultParam::from_filter(filter);
        let sort_modes = (!sort.is_empty())
            .then(|| sort.iter().map(to_sort_mode).collect::<Vec<_>>());
        let limit = page.count.min(self.max_query_size);
        let diff = param.cmp_data.is_some();

        debug!(
            run_ids = ?param.run_ids,
            diff,
            start = page.start,
            limit,
            "querying reports"
        );

        let results = self.service.get_run_results(
            param.run_ids.as_deref(),
            limit,
            page.start,
            sort_modes.as_deref(),
            filter,
            param.cmp_data.as_ref(),
        );
        let count =
            self.service
                .get_run_result_count(param.run_ids.as_deref(), filter, param.cmp_data.as_ref());

        let (reports, total) = futures::try_join!(results, count).map_err(|err| {
            warn!(%err, "report query failed");
            ViewerError::from(err)
        })?;

        let rows = reports.into_iter().map(ReportSummary::from).collect();

        Ok(QueryPage {
            rows,
            total,
            comparison: param.cmp_data,
        })
    }

    pub async fn get_report(&self, report_id: ReportId) -> Result<ReportSummary, ViewerError> {
        let data = self.service.get_report(report_id).await.map_err(|err| {
            warn!(%err, report_id = report_id.0, "failed to get report");
            ViewerError::from(err)
        })?;
        Ok(ReportSummary::from(data))
    }

    pub async fn runs(&self, filter: &RunFilter) -> Result<Vec<RunData>, ViewerError> {
        Ok(self.service.get_run_data(filter).await?)
    }

    pub async fn run_data(&self, run_id: RunId) -> Result<Option<RunData>, ViewerError> {
        let runs = self.runs(&RunFilter::exact([run_id])).await?;
        Ok(runs.into_iter().next())
    }

    /// Every report carrying `report_hash`, across all runs and without de-duplication.
    pub async fn reports_by_hash(
        &self,
        report_hash: &str,
    ) -> Result<Vec<ReportSummary>, ViewerError> {
        let filter = ReportFilter::by_report_hash(report_hash);
        let reports = self
            .service
            .get_run_results(None, self.max_query_size, 0, None, &filter, None)
            .await?;
        Ok(reports.into_iter().map(ReportSummary::from).collect())
    }
}

#[cfg(test)]
#[path = "tests/query_tests.rs"]
mod tests;
