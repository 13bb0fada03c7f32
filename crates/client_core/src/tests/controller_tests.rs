use std::sync::Arc;

use super::*;
use crate::{
    fake_service::{report, run, FakeReportService, RecordedCall},
    navigation::{shared_address, Address},
};
use shared::domain::{RunId, Severity};

struct Harness {
    controller: ViewController,
    service: Arc<FakeReportService>,
    address: SharedAddress,
    events: EventBus,
}

fn harness(context: ViewContext, address: &str) -> Harness {
    let service = Arc::new(FakeReportService::new(
        vec![
            report(1, 1, "src/one.c", "h1"),
            report(2, 1, "src/two.c", "h2"),
            report(3, 2, "lib/three.c", "h3"),
            report(5, 1, "src/five.c", "h5"),
        ],
        vec![run(1, "nightly"), run(2, "weekly")],
    ));
    let events = EventBus::default();
    let adapter = QueryAdapter::new(service.clone(), events.clone());
    let address = shared_address(Address::parse(address));
    let controller = ViewController::new(adapter, context, address.clone());
    Harness {
        controller,
        service,
        address,
        events,
    }
}

fn nightly() -> ViewContext {
    ViewContext::for_run(run(1, "nightly"))
}

fn current_state(address: &SharedAddress) -> NavigationState {
    navigation::decode(&lock_address(address))
}

fn row_ids(controller: &ViewController) -> Vec<i64> {
    controller
        .list()
        .rows()
        .iter()
        .map(|row| row.report_id.0)
        .collect()
}

fn drain(rx: &mut tokio::sync::broadcast::Receiver<ViewEvent>) -> Vec<ViewEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn start_loads_context_run_and_stays_on_overview() {
    let mut h = harness(nightly(), "tab=nightly");

    h.controller.start().await.expect("start");

    assert_eq!(row_ids(&h.controller), vec![1, 2, 5]);
    assert_eq!(h.controller.list().total(), 3);
    assert_eq!(h.controller.state(), ControllerState::Overview);
    assert_eq!(lock_address(&h.address).to_string(), "tab=nightly");
}

#[tokio::test]
async fn initial_state_comes_from_address() {
    let h = harness(nightly(), "tab=nightly&subtab=runHistory");
    assert_eq!(h.controller.state(), ControllerState::RunHistory);

    let h = harness(nightly(), "");
    assert_eq!(h.controller.state(), ControllerState::Overview);
}

#[tokio::test]
async fn start_replays_report_named_by_address() {
    let mut h = harness(nightly(), "tab=nightly&subtab=2&report=2&run=1");

    h.controller.start().await.expect("start");

    assert_eq!(h.controller.state(), ControllerState::ReportOpen(ReportId(2)));
    assert!(h.controller.registry().get(ReportId(2)).is_some());
    assert!(h.service.calls().contains(&RecordedCall::Report(ReportId(2))));
    assert_eq!(
        current_state(&h.address),
        NavigationState::report(
            Some("nightly".into()),
            ReportId(2),
            Some(RunId(1)),
            Some("h2".into())
        )
    );
}

#[tokio::test]
async fn opening_the_same_report_twice_keeps_one_view() {
    let mut h = harness(nightly(), "tab=nightly");
    let mut rx = h.events.subscribe();
    let request = OpenFileRequest {
        report: Some(ReportRef::Id(ReportId(5))),
        ..OpenFileRequest::default()
    };

    let first = h
        .controller
        .open_report(request.clone())
        .await
        .expect("first open")
        .expect("handled");
    let second = h
        .controller
        .open_report(request)
        .await
        .expect("second open")
        .expect("handled");

    assert_eq!(first, second);
    assert_eq!(h.controller.registry().len(), 1);
    let comments = drain(&mut rx)
        .into_iter()
        .filter(|event| matches!(event, ViewEvent::ShowComments { .. }))
        .count();
    assert_eq!(comments, 1);
}

#[tokio::test]
async fn file_column_opens_report_and_writes_address() {
    let mut h = harness(nightly(), "tab=nightly");
    h.controller.start().await.expect("start");

    let handle = h
        .controller
        .activate_row(0, Column::File)
        .await
        .expect("activate")
        .expect("opened");

    assert_eq!(handle.report_id, ReportId(1));
    assert_eq!(h.controller.state(), ControllerState::ReportOpen(ReportId(1)));
    assert_eq!(
        current_state(&h.address),
        NavigationState::report(
            Some("nightly".into()),
            ReportId(1),
            Some(RunId(1)),
            Some("h1".into())
        )
    );
    assert_eq!(
        h.controller
            .registry()
            .get(ReportId(1))
            .map(|view| view.title.as_str()),
        Some("one.c")
    );
}

#[tokio::test]
async fn checker_column_requests_documentation() {
    let mut h = harness(nightly(), "tab=nightly");
    h.controller.start().await.expect("start");
    let mut rx = h.events.subscribe();

    let opened = h
        .controller
        .activate_row(1, Column::CheckerName)
        .await
        .expect("activate");

    assert!(opened.is_none());
    assert!(h.controller.registry().is_empty());
    assert_eq!(h.controller.list().last_selected_row(), 1);
    assert_eq!(
        drain(&mut rx),
        vec![ViewEvent::ShowDocumentation {
            checker_id: "core.NullDereference".into()
        }]
    );
}

#[tokio::test]
async fn closing_the_report_returns_to_overview() {
    let mut h = harness(nightly(), "tab=nightly");
    h.controller.start().await.expect("start");
    h.controller
        .activate_row(0, Column::File)
        .await
        .expect("activate");

    assert!(h.controller.close_report(ReportId(1)));
    assert!(!h.controller.close_report(ReportId(1)));

    assert_eq!(h.controller.state(), ControllerState::Overview);
    assert!(h.controller.registry().is_empty());
    assert_eq!(lock_address(&h.address).to_string(), "tab=nightly");
}

#[tokio::test]
async fn shared_hash_link_rediscovers_report_and_run() {
    let mut h = harness(ViewContext::all_reports(), "tab=allReports");

    h.controller
        .handle_event(&ViewEvent::AddressChanged {
            address: "tab=allReports&subtab=x&reportHash=h3".into(),
        })
        .await
        .expect("replay");

    let view = h.controller.registry().get(ReportId(3)).expect("view");
    assert_eq!(view.run.as_ref().map(|run| run.name.as_str()), Some("weekly"));
    assert_eq!(view.run_result_param.run_ids, Some(vec![RunId(2)]));
    assert_eq!(
        current_state(&h.address),
        NavigationState::report(
            Some("allReports".into()),
            ReportId(3),
            Some(RunId(2)),
            Some("h3".into())
        )
    );
}

#[tokio::test]
async fn unknown_hash_is_reported_and_registers_nothing() {
    let mut h = harness(ViewContext::all_reports(), "tab=allReports");

    let err = h
        .controller
        .handle_event(&ViewEvent::AddressChanged {
            address: "tab=allReports&subtab=x&reportHash=nope".into(),
        })
        .await
        .expect_err("should fail");

    assert_eq!(
        err,
        ViewerError::ReportNotFound {
            report_hash: "nope".into()
        }
    );
    assert!(h.controller.registry().is_empty());
    assert_eq!(h.controller.state(), ControllerState::Overview);
}

#[tokio::test]
async fn failed_report_fetch_registers_nothing() {
    let mut h = harness(nightly(), "tab=nightly");
    h.service.fail_next_calls("connection reset");

    let err = h
        .controller
        .open_report(OpenFileRequest {
            report: Some(ReportRef::Id(ReportId(1))),
            ..OpenFileRequest::default()
        })
        .await
        .expect_err("should fail");

    assert!(matches!(err, ViewerError::RemoteQuery { .. }));
    assert!(h.controller.registry().is_empty());
    assert_eq!(h.controller.state(), ControllerState::Overview);
}

#[tokio::test]
async fn address_for_another_tab_is_ignored() {
    let mut h = harness(nightly(), "tab=nightly");

    h.controller
        .handle_event(&ViewEvent::AddressChanged {
            address: "tab=weekly&subtab=3&report=3".into(),
        })
        .await
        .expect("ignored");

    assert!(h.service.calls().is_empty());
    assert!(h.controller.registry().is_empty());
    assert_eq!(h.controller.state(), ControllerState::Overview);
}

#[tokio::test]
async fn malformed_address_fails_open_to_overview() {
    let mut h = harness(nightly(), "tab=nightly&subtab=runHistory");

    h.controller
        .handle_event(&ViewEvent::AddressChanged {
            address: "tab=nightly&subtab=4&report=four".into(),
        })
        .await
        .expect("fail open");

    assert_eq!(h.controller.state(), ControllerState::Overview);
    assert!(h.controller.registry().is_empty());
}

#[tokio::test]
async fn open_requests_for_other_controllers_are_ignored() {
    let mut h = harness(nightly(), "tab=nightly");

    let handled = h
        .controller
        .handle_event(&ViewEvent::OpenFile(OpenFileRequest {
            report: Some(ReportRef::Id(ReportId(1))),
            source: Some(ControllerId::new()),
            ..OpenFileRequest::default()
        }))
        .await;

    assert!(handled.is_ok());
    assert!(h.service.calls().is_empty());
    assert!(h.controller.registry().is_empty());
}

#[tokio::test]
async fn controller_without_run_context_needs_a_hash() {
    let mut h = harness(ViewContext::default(), "");

    let opened = h
        .controller
        .open_report(OpenFileRequest {
            report: Some(ReportRef::Id(ReportId(1))),
            ..OpenFileRequest::default()
        })
        .await
        .expect("ignored");

    assert!(opened.is_none());
    assert!(h.service.calls().is_empty());
}

#[tokio::test]
async fn first_show_skips_write_when_address_names_this_tab() {
    let mut h = harness(nightly(), "tab=nightly&subtab=runHistory&checker=x");

    h.controller.on_show();
    assert_eq!(
        lock_address(&h.address).to_string(),
        "tab=nightly&subtab=runHistory&checker=x"
    );

    let mut other = harness(nightly(), "tab=weekly&subtab=7&report=7");
    other.controller.on_show();
    assert_eq!(lock_address(&other.address).to_string(), "tab=nightly");
}

#[tokio::test]
async fn subtab_selection_follows_state_machine() {
    let mut h = harness(nightly(), "tab=nightly");
    let id = h.controller.id();

    h.controller
        .handle_event(&ViewEvent::SelectSubtab {
            controller: Some(id),
            subtab: SubtabRequest::RunHistory,
        })
        .await
        .expect("run history");
    assert_eq!(h.controller.state(), ControllerState::RunHistory);
    assert_eq!(h.controller.run_history().runs().len(), 1);
    assert_eq!(current_state(&h.address).view, NavigationView::RunHistory);

    h.controller
        .handle_event(&ViewEvent::SelectSubtab {
            controller: Some(ControllerId::new()),
            subtab: SubtabRequest::Overview,
        })
        .await
        .expect("ignored");
    assert_eq!(h.controller.state(), ControllerState::RunHistory);

    h.controller
        .select_subtab(SubtabRequest::Overview)
        .await
        .expect("overview");
    assert_eq!(h.controller.state(), ControllerState::Overview);
    assert_eq!(lock_address(&h.address).to_string(), "tab=nightly");
}

#[tokio::test]
async fn filter_change_only_reacts_to_own_panel() {
    let mut h = harness(nightly(), "tab=nightly");
    h.controller.start().await.expect("start");
    h.service.clear_calls();
    let weekly = ReportFilter {
        run: Some(vec![RunId(2)]),
        ..ReportFilter::default()
    };

    h.controller
        .handle_event(&ViewEvent::FilterChange {
            panel: PanelId::new(),
            filter: weekly.clone(),
        })
        .await
        .expect("ignored");
    assert!(h.service.calls().is_empty());

    let panel = h.controller.filter_panel().id();
    h.controller
        .handle_event(&ViewEvent::FilterChange {
            panel,
            filter: weekly.clone(),
        })
        .await
        .expect("refresh");
    assert_eq!(row_ids(&h.controller), vec![3]);
    assert_eq!(h.controller.filter_panel().report_filter(), &weekly);
}

#[tokio::test]
async fn failed_refresh_leaves_previous_rows() {
    let mut h = harness(nightly(), "tab=nightly");
    h.controller.start().await.expect("start");
    h.service.fail_next_calls("database is locked");

    let err = h
        .controller
        .change_filter(ReportFilter {
            run: Some(vec![RunId(2)]),
            ..ReportFilter::default()
        })
        .await
        .expect_err("should fail");

    assert_eq!(
        err,
        ViewerError::RemoteQuery {
            message: "database is locked".into()
        }
    );
    assert_eq!(row_ids(&h.controller), vec![1, 2, 5]);
}

#[tokio::test]
async fn overlapping_refreshes_keep_the_newest_result() {
    let mut h = harness(nightly(), "tab=nightly");

    let older = h.controller.prepare_refresh();
    h.controller.filter_panel.filter = ReportFilter {
        run: Some(vec![RunId(2)]),
        ..ReportFilter::default()
    };
    let newer = h.controller.prepare_refresh();
    assert!(newer.token() > older.token());

    let newer_outcome = newer.run().await;
    let older_outcome = older.run().await;

    assert_eq!(h.controller.complete_refresh(newer_outcome), Ok(true));
    assert_eq!(h.controller.complete_refresh(older_outcome), Ok(false));
    assert_eq!(row_ids(&h.controller), vec![3]);
}

fn filtering_counts(rx: &mut tokio::sync::broadcast::Receiver<ViewEvent>) -> Vec<(usize, bool)> {
    drain(rx)
        .into_iter()
        .filter_map(|event| match event {
            ViewEvent::FilteringChanged { count, diff } => Some((count, diff)),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn older_refresh_cannot_land_after_newer_one_failed() {
    let mut h = harness(nightly(), "tab=nightly");

    let older = h.controller.prepare_refresh();
    h.controller.filter_panel.filter = ReportFilter {
        run: Some(vec![RunId(2)]),
        ..ReportFilter::default()
    };
    let newer = h.controller.prepare_refresh();

    h.service.fail_next_calls("boom");
    let newer_outcome = newer.run().await;
    h.service.recover();
    let older_outcome = older.run().await;

    assert_eq!(
        h.controller.complete_refresh(newer_outcome),
        Err(ViewerError::RemoteQuery {
            message: "boom".into()
        })
    );
    assert_eq!(h.controller.complete_refresh(older_outcome), Ok(false));
    assert!(row_ids(&h.controller).is_empty());
    assert_eq!(
        h.controller.filter_panel().report_filter().run,
        Some(vec![RunId(2)])
    );
}

#[tokio::test]
async fn stale_refresh_does_not_publish_its_count() {
    let mut h = harness(nightly(), "tab=nightly");
    let mut rx = h.events.subscribe();

    let older = h.controller.prepare_refresh();
    h.controller.filter_panel.filter = ReportFilter {
        run: Some(vec![RunId(1)]),
        checker_name: vec!["core.NullDereference".into()],
        report_hash: vec!["h1".into()],
        ..ReportFilter::default()
    };
    let newer = h.controller.prepare_refresh();

    let newer_outcome = newer.run().await;
    let older_outcome = older.run().await;
    assert_eq!(h.controller.complete_refresh(newer_outcome), Ok(true));
    assert_eq!(h.controller.complete_refresh(older_outcome), Ok(false));

    assert_eq!(filtering_counts(&mut rx), vec![(3, false)]);
    assert_eq!(row_ids(&h.controller), vec![1]);
}

#[tokio::test]
async fn applied_refresh_publishes_count_and_diff_flag() {
    let context = ViewContext::for_comparison(
        Some(run(1, "nightly")),
        Some(run(2, "weekly")),
        None,
    );
    let mut h = harness(context, "tab=nightly_weekly");
    let mut rx = h.events.subscribe();

    h.controller.refresh_list().await.expect("refresh");

    assert_eq!(filtering_counts(&mut rx), vec![(2, true)]);
}

#[tokio::test]
async fn failed_refresh_publishes_nothing() {
    let mut h = harness(nightly(), "tab=nightly");
    let mut rx = h.events.subscribe();
    h.service.fail_next_calls("database is locked");

    assert!(h.controller.refresh_list().await.is_err());
    assert!(filtering_counts(&mut rx).is_empty());
}

#[tokio::test]
async fn published_count_ignores_how_the_filter_was_assembled() {
    let mut h = harness(nightly(), "tab=nightly");
    let mut rx = h.events.subscribe();

    let mut first = ReportFilter::default();
    first.run = Some(vec![RunId(1)]);
    first.checker_name = vec!["core.NullDereference".into(), "deadcode.DeadStores".into()];
    first.severity = vec![Severity::High];
    first.file_path = vec!["src/one.c".into(), "src/two.c".into()];

    let mut second = ReportFilter::default();
    second.file_path = vec!["src/two.c".into(), "src/one.c".into()];
    second.severity = vec![Severity::High];
    second.checker_name = vec!["deadcode.DeadStores".into(), "core.NullDereference".into()];
    second.run = Some(vec![RunId(1)]);

    assert_eq!(
        first.active_predicate_count(),
        second.active_predicate_count()
    );

    h.controller.change_filter(first).await.expect("first");
    h.controller.change_filter(second).await.expect("second");

    assert_eq!(filtering_counts(&mut rx), vec![(6, false), (6, false)]);
}

#[tokio::test]
async fn page_past_the_total_is_not_requested() {
    let mut h = harness(nightly(), "tab=nightly");
    h.controller.start().await.expect("start");
    h.service.clear_calls();

    let moved = h
        .controller
        .go_to_page(PageRequest { start: 3, count: 2 })
        .await
        .expect("page");

    assert!(!moved);
    assert!(h.service.calls().is_empty());
    assert_eq!(h.controller.list().page(), PageRequest::first(DEFAULT_PAGE_SIZE));
    assert_eq!(row_ids(&h.controller), vec![1, 2, 5]);
}

#[tokio::test]
async fn sorting_and_paging_are_forwarded() {
    let mut h = harness(nightly(), "tab=nightly");

    h.controller
        .sort_by(vec![SortSpec::from((Column::File, true))])
        .await
        .expect("sort");
    h.controller
        .go_to_page(PageRequest { start: 2, count: 2 })
        .await
        .expect("page");

    assert_eq!(row_ids(&h.controller), vec![5]);
    assert!(h.service.calls().iter().any(|call| matches!(
        call,
        RecordedCall::RunResults { offset: 2, limit: 2, sort_modes: Some(modes), .. }
            if modes.len() == 1
    )));
}

#[tokio::test]
async fn destroy_clears_the_address() {
    let h = harness(nightly(), "tab=nightly&subtab=runHistory");
    h.controller.destroy();
    assert!(lock_address(&h.address).is_empty());
}
