//! Typed event bus shared by view controllers and the components around them.

use shared::{
    domain::ReportId,
    protocol::{ReportFilter, RunData},
};
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use crate::{report_tabs::ViewId, types::ReportSummary};

const DEFAULT_EVENT_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControllerId(Uuid);

impl ControllerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ControllerId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PanelId(Uuid);

impl PanelId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PanelId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportRef {
    Loaded(Box<ReportSummary>),
    Id(ReportId),
}

/// Request to open (or focus) a report detail view.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OpenFileRequest {
    pub report: Option<ReportRef>,
    pub run: Option<RunData>,
    pub report_hash: Option<String>,
    /// Controller the request is meant for; `None` lets every controller react.
    pub source: Option<ControllerId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtabRequest {
    Overview,
    RunHistory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    OpenFile(OpenFileRequest),
    ShowDocumentation {
        checker_id: String,
    },
    FilterChange {
        panel: PanelId,
        filter: ReportFilter,
    },
    SelectSubtab {
        controller: Option<ControllerId>,
        subtab: SubtabRequest,
    },
    AddressChanged {
        address: String,
    },
    FilteringChanged {
        count: usize,
        diff: bool,
    },
    ShowComments {
        report_id: ReportId,
        view: ViewId,
    },
}

impl ViewEvent {
    fn name(&self) -> &'static str {
        match self {
            ViewEvent::OpenFile(_) => "open_file",
            ViewEvent::ShowDocumentation { .. } => "show_documentation",
            ViewEvent::FilterChange { .. } => "filter_change",
            ViewEvent::SelectSubtab { .. } => "select_subtab",
            ViewEvent::AddressChanged { .. } => "address_changed",
            ViewEvent::FilteringChanged { .. } => "filtering_changed",
            ViewEvent::ShowComments { .. } => "show_comments",
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ViewEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn publish(&self, event: ViewEvent) {
        let name = event.name();
        if self.sender.send(event).is_err() {
            debug!(event = name, "no subscribers for view event");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ViewEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}
