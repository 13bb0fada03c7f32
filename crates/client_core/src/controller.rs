//! View controller: ties the report list, filter panel, run history and open report
//! views of one run (or run comparison) to the shared address.

use shared::{
    domain::ReportId,
    protocol::{ReportFilter, RunData, RunFilter},
};
use tracing::{debug, info, warn};

use crate::{
    error::ViewerError,
    events::{
        ControllerId, EventBus, OpenFileRequest, PanelId, ReportRef, SubtabRequest, ViewEvent,
    },
    navigation::{self, lock_address, NavigationState, NavigationView, SharedAddress, TAB_KEY},
    query::QueryAdapter,
    report_list::{ReportList, RequestToken},
    report_tabs::{ReportTabRegistry, ViewHandle},
    types::{Column, PageRequest, QueryPage, RunResultParam, SortSpec, ViewContext},
};

pub const DEFAULT_PAGE_SIZE: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Overview,
    RunHistory,
    ReportOpen(ReportId),
}

#[derive(Debug)]
pub struct FilterPanel {
    id: PanelId,
    filter: ReportFilter,
    diff_view: bool,
}

impl FilterPanel {
    fn for_context(context: &ViewContext) -> Self {
        Self {
            id: PanelId::new(),
            filter: context.initial_filter(),
            diff_view: context.is_diff_view(),
        }
    }

    pub fn id(&self) -> PanelId {
        self.id
    }

    pub fn report_filter(&self) -> &ReportFilter {
        &self.filter
    }

    pub fn is_diff_view(&self) -> bool {
        self.diff_view
    }
}

#[derive(Debug)]
pub struct RunHistoryPanel {
    run_filter: RunFilter,
    runs: Vec<RunData>,
}

impl RunHistoryPanel {
    pub fn run_filter(&self) -> &RunFilter {
        &self.run_filter
    }

    pub fn runs(&self) -> &[RunData] {
        &self.runs
    }
}

/// A list refresh detached from the controller so that several can be in flight.
pub struct PendingRefresh {
    token: RequestToken,
    adapter: QueryAdapter,
    filter: ReportFilter,
    sort: Vec<SortSpec>,
    page: PageRequest,
}

impl PendingRefresh {
    pub fn token(&self) -> RequestToken {
        self.token
    }

    pub async fn run(self) -> RefreshOutcome {
        let result = self.adapter.query(&self.filter, &self.sort, self.page).await;
        RefreshOutcome {
            token: self.token,
            filter_count: self.filter.active_predicate_count(),
            result,
        }
    }
}

pub struct RefreshOutcome {
    token: RequestToken,
    filter_count: usize,
    result: Result<QueryPage, ViewerError>,
}

pub struct ViewController {
    id: ControllerId,
    context: ViewContext,
    tab: String,
    adapter: QueryAdapter,
    events: EventBus,
    address: SharedAddress,
    list: ReportList,
    filter_panel: FilterPanel,
    run_history: RunHistoryPanel,
    registry: ReportTabRegistry,
    state: ControllerState,
    shown: bool,
}

impl ViewController {
    pub fn new(adapter: QueryAdapter, context: ViewContext, address: SharedAddress) -> Self {
        Self::with_page_size(adapter, context, address, DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(
        adapter: QueryAdapter,
        context: ViewContext,
        address: SharedAddress,
        page_size: u64,
    ) -> Self {
        let initial = navigation::decode(&lock_address(&address));
        let state = match initial.view {
            NavigationView::RunHistory => ControllerState::RunHistory,
            // A report named by the address is opened by `start`.
            NavigationView::Overview | NavigationView::Report { .. } => ControllerState::Overview,
        };

        Self {
            id: ControllerId::new(),
            tab: context.tab_identity(),
            events: adapter.events().clone(),
            filter_panel: FilterPanel::for_context(&context),
            run_history: RunHistoryPanel {
                run_filter: context.run_filter(),
                runs: Vec::new(),
            },
            list: ReportList::new(page_size),
            registry: ReportTabRegistry::new(),
            context,
            adapter,
            address,
            state,
            shown: false,
        }
    }

    pub fn id(&self) -> ControllerId {
        self.id
    }

    pub fn tab(&self) -> &str {
        &self.tab
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn list(&self) -> &ReportList {
        &self.list
    }

    pub fn filter_panel(&self) -> &FilterPanel {
        &self.filter_panel
    }

    pub fn run_history(&self) -> &RunHistoryPanel {
        &self.run_history
    }

    pub fn registry(&self) -> &ReportTabRegistry {
        &self.registry
    }

    /// Loads the first page for the panel's filter, then replays the address.
    pub async fn start(&mut self) -> Result<(), ViewerError> {
        self.refresh_list().await?;
        self.init_by_address().await
    }

    /// Called whenever this controller's tab becomes visible.
    pub fn on_show(&mut self) {
        self.tab = self.context.tab_identity();

        if !self.shown {
            self.shown = true;
            if lock_address(&self.address).get(TAB_KEY) == Some(self.tab.as_str()) {
                debug!(tab = %self.tab, "address already names this tab");
                return;
            }
        }

        let view = self.current_view();
        self.write_navigation(view);
    }

    pub async fn handle_event(&mut self, event: &ViewEvent) -> Result<(), ViewerError> {
        match event {
            ViewEvent::AddressChanged { address } => {
                let parsed = navigation::Address::parse(address);
                let ours = parsed.get(TAB_KEY) == Some(self.tab.as_str());
                *lock_address(&self.address) = parsed;
                if !ours {
                    return Ok(());
                }
                self.init_by_address().await
            }
            ViewEvent::OpenFile(request) => self.open_report(request.clone()).await.map(|_| ()),
            ViewEvent::FilterChange { panel, filter } if *panel == self.filter_panel.id => {
                self.change_filter(filter.clone()).await.map(|_| ())
            }
            ViewEvent::SelectSubtab { controller, subtab }
                if controller.map_or(true, |id| id == self.id) =>
            {
                self.select_subtab(*subtab).await
            }
            _ => Ok(()),
        }
    }

    /// Re-derives the shown view from the current address.
    pub async fn init_by_address(&mut self) -> Result<(), ViewerError> {
        let decoded = navigation::decode(&lock_address(&self.address));
        match decoded.view {
            NavigationView::Overview => {
                self.show_overview();
                Ok(())
            }
            NavigationView::RunHistory => self.show_run_history().await,
            NavigationView::Report {
                report,
                run,
                report_hash,
                ..
            } => {
                if report.is_none() && report_hash.is_none() {
                    warn!("address names neither a report nor a report hash");
                    self.show_overview();
                    return Ok(());
                }
                let run = match run {
                    Some(run_id) => self.adapter.run_data(run_id).await?,
                    None => None,
                };
                self.open_report(OpenFileRequest {
                    report: report.map(ReportRef::Id),
                    run,
                    report_hash,
                    source: Some(self.id),
                })
                .await
                .map(|_| ())
            }
        }
    }

    /// Opens the requested report, or focuses its view when it is already open.
    ///
    /// Returns `Ok(None)` when the request is not meant for this controller. Nothing is
    /// registered when resolving the report fails.
    pub async fn open_report(
        &mut self,
        request: OpenFileRequest,
    ) -> Result<Option<ViewHandle>, ViewerError> {
        if request.source.is_some_and(|source| source != self.id) {
            return Ok(None);
        }
        if self.context.run.is_none()
            && self.context.baseline.is_none()
            && request.report_hash.is_none()
            && !self.context.all_reports
        {
            return Ok(None);
        }

        let mut report = match request.report {
            Some(ReportRef::Loaded(report)) => Some(*report),
            Some(ReportRef::Id(report_id)) => Some(self.adapter.get_report(report_id).await?),
            None => None,
        };
        let mut run = request.run;
        let mut param = RunResultParam::from_filter(self.filter_panel.report_filter());

        let lookup_hash = request.report_hash.filter(|hash| {
            report
                .as_ref()
                .map_or(true, |report| report.bug_hash != *hash)
        });
        if let Some(hash) = lookup_hash {
            let matches = self.adapter.reports_by_hash(&hash).await?;
            let Some(found) = matches.into_iter().next() else {
                return Err(ViewerError::ReportNotFound { report_hash: hash });
            };
            run = self.adapter.run_data(found.run_id).await?;
            param.run_ids = Some(vec![found.run_id]);
            report = Some(found);
        }

        let report = report.ok_or_else(|| {
            ViewerError::malformed("open request names neither a report nor a report hash")
        })?;
        let report_id = report.report_id;
        let outcome = self
            .registry
            .open_or_focus(report, run, self.context.run.as_ref(), param);

        self.state = ControllerState::ReportOpen(report_id);
        let view = self.current_view();
        self.write_navigation(view);

        if outcome.created {
            self.events.publish(ViewEvent::ShowComments {
                report_id,
                view: outcome.handle.view_id,
            });
        }

        Ok(Some(outcome.handle))
    }

    /// Closes the view of `report_id` and falls back to the overview.
    pub fn close_report(&mut self, report_id: ReportId) -> bool {
        if self.registry.close(report_id).is_none() {
            return false;
        }
        self.show_overview();
        true
    }

    pub async fn select_subtab(&mut self, subtab: SubtabRequest) -> Result<(), ViewerError> {
        match subtab {
            SubtabRequest::Overview => {
                self.show_overview();
                Ok(())
            }
            SubtabRequest::RunHistory => self.show_run_history().await,
        }
    }

    /// Handles a click on the grid: the file column opens the report, the checker
    /// column asks for the checker documentation.
    pub async fn activate_row(
        &mut self,
        index: usize,
        column: Column,
    ) -> Result<Option<ViewHandle>, ViewerError> {
        let Some(row) = self.list.select_row(index).cloned() else {
            return Ok(None);
        };

        match column {
            Column::File => {
                let report_hash = Some(row.bug_hash.clone());
                self.open_report(OpenFileRequest {
                    report: Some(ReportRef::Loaded(Box::new(row))),
                    run: self.context.run.clone(),
                    report_hash,
                    source: Some(self.id),
                })
                .await
            }
            Column::CheckerName => {
                self.events.publish(ViewEvent::ShowDocumentation {
                    checker_id: row.checker_id,
                });
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    pub async fn change_filter(&mut self, filter: ReportFilter) -> Result<bool, ViewerError> {
        self.filter_panel.filter = filter;
        let page = PageRequest::first(self.list.page().count);
        self.list.set_page(page);
        self.refresh_list().await
    }

    pub async fn sort_by(&mut self, sort: Vec<SortSpec>) -> Result<bool, ViewerError> {
        self.list.set_sort(sort);
        self.refresh_list().await
    }

    /// Moves to `page`. A page starting past the last known total is not requested and
    /// the current page stays in place.
    pub async fn go_to_page(&mut self, page: PageRequest) -> Result<bool, ViewerError> {
        if page.is_past(self.list.total()) {
            debug!(
                start = page.start,
                total = self.list.total(),
                "page starts past the last report"
            );
            return Ok(false);
        }
        self.list.set_page(page);
        self.refresh_list().await
    }

    pub fn prepare_refresh(&mut self) -> PendingRefresh {
        PendingRefresh {
            token: self.list.issue_token(),
            adapter: self.adapter.clone(),
            filter: self.filter_panel.filter.clone(),
            sort: self.list.sort().to_vec(),
            page: self.list.page(),
        }
    }

    /// Applies a finished refresh. Returns whether the rows were replaced.
    ///
    /// `FilteringChanged` is published only for an applied refresh, so listeners never
    /// see the count of a filter the list has already moved past.
    pub fn complete_refresh(&mut self, outcome: RefreshOutcome) -> Result<bool, ViewerError> {
        let diff = outcome
            .result
            .as_ref()
            .is_ok_and(|page| page.comparison.is_some());
        let applied = self.list.apply(outcome.token, outcome.result)?;
        if applied {
            self.events.publish(ViewEvent::FilteringChanged {
                count: outcome.filter_count,
                diff,
            });
        }
        Ok(applied)
    }

    pub async fn refresh_list(&mut self) -> Result<bool, ViewerError> {
        let pending = self.prepare_refresh();
        let outcome = pending.run().await;
        self.complete_refresh(outcome)
    }

    /// Tears the controller down; the address no longer describes anything.
    pub fn destroy(self) {
        info!(tab = %self.tab, "closing report list view");
        lock_address(&self.address).clear();
    }

    fn show_overview(&mut self) {
        self.state = ControllerState::Overview;
        self.write_navigation(NavigationView::Overview);
    }

    async fn show_run_history(&mut self) -> Result<(), ViewerError> {
        self.state = ControllerState::RunHistory;
        self.write_navigation(NavigationView::RunHistory);

        if self.run_history.run_filter.ids.is_empty() {
            return Ok(());
        }
        self.run_history.runs = self.adapter.runs(&self.run_history.run_filter).await?;
        Ok(())
    }

    fn current_view(&self) -> NavigationView {
        match self.state {
            ControllerState::Overview => NavigationView::Overview,
            ControllerState::RunHistory => NavigationView::RunHistory,
            ControllerState::ReportOpen(report_id) => {
                let Some(view) = self.registry.get(report_id) else {
                    return NavigationView::Overview;
                };
                NavigationView::Report {
                    subtab: report_id.to_string(),
                    report: Some(report_id),
                    run: view.run.as_ref().map(|run| run.run_id),
                    report_hash: Some(view.report.bug_hash.clone()),
                }
            }
        }
    }

    fn write_navigation(&self, view: NavigationView) {
        let state = NavigationState {
            tab: Some(self.tab.clone()),
            view,
        };
        navigation::write(&mut lock_address(&self.address), &state);
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
