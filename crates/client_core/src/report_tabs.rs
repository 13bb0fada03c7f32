//! Registry of open report detail views, at most one per report.

use std::collections::{hash_map::Entry, HashMap};

use shared::{domain::ReportId, protocol::RunData};
use tracing::{debug, info};
use uuid::Uuid;

use crate::types::{ReportSummary, RunResultParam};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewId(Uuid);

impl ViewId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewHandle {
    pub view_id: ViewId,
    pub report_id: ReportId,
}

#[derive(Debug, Clone)]
pub struct ReportView {
    pub handle: ViewHandle,
    pub title: String,
    pub report: ReportSummary,
    pub run: Option<RunData>,
    /// Run target later refreshes from inside this view are issued against.
    pub run_result_param: RunResultParam,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenOutcome {
    pub handle: ViewHandle,
    pub created: bool,
}

#[derive(Debug, Default)]
pub struct ReportTabRegistry {
    views: HashMap<ReportId, ReportView>,
}

impl ReportTabRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the view already open for `report`, or registers a new one. The new
    /// view gets `run` when given, otherwise the controller's `ambient_run`.
    pub fn open_or_focus(
        &mut self,
        report: ReportSummary,
        run: Option<RunData>,
        ambient_run: Option<&RunData>,
        run_result_param: RunResultParam,
    ) -> OpenOutcome {
        match self.views.entry(report.report_id) {
            Entry::Occupied(existing) => {
                debug!(report_id = report.report_id.0, "focusing open report view");
                OpenOutcome {
                    handle: existing.get().handle.clone(),
                    created: false,
                }
            }
            Entry::Vacant(slot) => {
                let handle = ViewHandle {
                    view_id: ViewId::new(),
                    report_id: report.report_id,
                };
                let title = report.file_name().to_string();
                info!(report_id = report.report_id.0, %title, "opening report view");
                slot.insert(ReportView {
                    handle: handle.clone(),
                    title,
                    report,
                    run: run.or_else(|| ambient_run.cloned()),
                    run_result_param,
                });
                OpenOutcome {
                    handle,
                    created: true,
                }
            }
        }
    }

    pub fn close(&mut self, report_id: ReportId) -> Option<ReportView> {
        let closed = self.views.remove(&report_id);
        if closed.is_some() {
            info!(report_id = report_id.0, "closed report view");
        }
        closed
    }

    pub fn get(&self, report_id: ReportId) -> Option<&ReportView> {
        self.views.get(&report_id)
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReportView> {
        self.views.values()
    }
}

#[cfg(test)]
#[path = "tests/report_tabs_tests.rs"]
mod tests;
