//! Model behind the report grid: current rows, sort, page and request ordering.

use shared::protocol::CompareData;
use tracing::warn;

use crate::{
    error::ViewerError,
    types::{PageRequest, QueryPage, ReportSummary, SortSpec},
};

/// Monotonic token identifying one list refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

#[derive(Debug)]
pub struct ReportList {
    rows: Vec<ReportSummary>,
    total: u64,
    comparison: Option<CompareData>,
    sort: Vec<SortSpec>,
    page: PageRequest,
    last_issued: u64,
    last_selected_row: usize,
}

impl ReportList {
    pub fn new(page_size: u64) -> Self {
        Self {
            rows: Vec::new(),
            total: 0,
            comparison: None,
            sort: Vec::new(),
            page: PageRequest::first(page_size),
            last_issued: 0,
            last_selected_row: 0,
        }
    }

    pub fn issue_token(&mut self) -> RequestToken {
        self.last_issued += 1;
        RequestToken(self.last_issued)
    }

    /// Applies the outcome of the refresh identified by `token`.
    ///
    /// Returns `Ok(false)` when a newer refresh has been issued since; the response is
    /// dropped whether it succeeded or not. A failed current refresh keeps the previous
    /// rows.
    pub fn apply(
        &mut self,
        token: RequestToken,
        result: Result<QueryPage, ViewerError>,
    ) -> Result<bool, ViewerError> {
        if token.0 < self.last_issued {
            warn!(
                token = token.0,
                newest = self.last_issued,
                "discarding stale report list response"
            );
            return Ok(false);
        }

        let page = result?;
        self.rows = page.rows;
        self.total = page.total;
        self.comparison = page.comparison;
        Ok(true)
    }

    pub fn rows(&self) -> &[ReportSummary] {
        &self.rows
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn comparison(&self) -> Option<&CompareData> {
        self.comparison.as_ref()
    }

    pub fn select_row(&mut self, index: usize) -> Option<&ReportSummary> {
        if index >= self.rows.len() {
            return None;
        }
        self.last_selected_row = index;
        self.rows.get(index)
    }

    pub fn last_selected_row(&self) -> usize {
        self.last_selected_row
    }

    pub fn sort(&self) -> &[SortSpec] {
        &self.sort
    }

    pub fn set_sort(&mut self, sort: Vec<SortSpec>) {
        self.sort = sort;
    }

    pub fn page(&self) -> PageRequest {
        self.page
    }

    pub fn set_page(&mut self, page: PageRequest) {
        self.page = page;
    }
}

#[cfg(test)]
#[path = "tests/report_list_tests.rs"]
mod tests;
