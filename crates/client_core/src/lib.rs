use async_trait::async_trait;
use shared::{
    domain::{ReportId, RunId},
    protocol::{CompareData, ReportData, ReportFilter, RunData, RunFilter, SortMode},
};

pub mod controller;
pub mod error;
pub mod events;
pub mod navigation;
pub mod query;
pub mod report_list;
pub mod report_tabs;
pub mod transport;
pub mod types;

#[cfg(test)]
#[path = "tests/fake_service.rs"]
pub(crate) mod fake_service;

pub use controller::{ControllerState, PendingRefresh, RefreshOutcome, ViewController};
pub use error::{ServiceError, ViewerError};
pub use events::{EventBus, OpenFileRequest, ReportRef, SubtabRequest, ViewEvent};
pub use navigation::{Address, NavigationState, NavigationView, SharedAddress};
pub use query::QueryAdapter;
pub use report_tabs::{ReportTabRegistry, ViewHandle};
pub use transport::HttpReportService;
pub use types::{Column, PageRequest, QueryPage, ReportSummary, SortSpec, ViewContext};

/// Remote analysis service the viewer reads reports and runs from.
#[async_trait]
pub trait ReportService: Send + Sync {
    async fn get_run_data(&self, filter: &RunFilter) -> Result<Vec<RunData>, ServiceError>;

    async fn get_report(&self, report_id: ReportId) -> Result<ReportData, ServiceError>;

    async fn get_run_results(
        &self,
        run_ids: Option<&[RunId]>,
        limit: u64,
        offset: u64,
        sort_modes: Option<&[SortMode]>,
        filter: &ReportFilter,
        cmp_data: Option<&CompareData>,
    ) -> Result<Vec<ReportData>, ServiceError>;

    async fn get_run_result_count(
        &self,
        run_ids: Option<&[RunId]>,
        filter: &ReportFilter,
        cmp_data: Option<&CompareData>,
    ) -> Result<u64, ServiceError>;
}
