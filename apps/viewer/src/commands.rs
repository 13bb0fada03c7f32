use anyhow::{anyhow, bail, Context, Result};
use clap::Args;
use client_core::{
    navigation::{self, lock_address, shared_address},
    Address, Column, ControllerState, NavigationView, PageRequest, QueryAdapter, SortSpec,
    ViewContext, ViewController,
};
use serde::de::DeserializeOwned;
use shared::{
    domain::{DiffType, RunId},
    protocol::{ReportFilter, RunData},
};

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Run ids to list reports of.
    #[arg(long, value_delimiter = ',')]
    pub run: Vec<i64>,
    #[arg(long, value_delimiter = ',')]
    pub baseline: Vec<i64>,
    #[arg(long, value_delimiter = ',')]
    pub newcheck: Vec<i64>,
    /// new, resolved or unresolved
    #[arg(long)]
    pub diff_type: Option<String>,
    #[arg(long)]
    pub severity: Vec<String>,
    #[arg(long)]
    pub review_status: Vec<String>,
    #[arg(long)]
    pub detection_status: Vec<String>,
    #[arg(long)]
    pub checker: Vec<String>,
    #[arg(long)]
    pub file: Vec<String>,
    #[arg(long)]
    pub hash: Vec<String>,
    /// `column` or `column:desc`, e.g. `checkedFile:desc`.
    #[arg(long)]
    pub sort: Vec<String>,
    #[arg(long, default_value_t = 0)]
    pub start: u64,
    #[arg(long)]
    pub count: Option<u64>,
    #[arg(long)]
    pub unique: bool,
}

impl ListArgs {
    pub fn filter(&self) -> Result<ReportFilter> {
        Ok(ReportFilter {
            run: run_ids(&self.run),
            baseline: run_ids(&self.baseline),
            newcheck: run_ids(&self.newcheck),
            diff_type: self
                .diff_type
                .as_deref()
                .map(|raw| parse_wire("diff type", raw))
                .transpose()?,
            checker_name: self.checker.clone(),
            severity: parse_all("severity", &self.severity)?,
            detection_status: parse_all("detection status", &self.detection_status)?,
            review_status: parse_all("review status", &self.review_status)?,
            file_path: self.file.clone(),
            report_hash: self.hash.clone(),
            is_unique: self.unique,
            ..ReportFilter::default()
        })
    }

    pub fn sort(&self) -> Result<Vec<SortSpec>> {
        self.sort.iter().map(|raw| parse_sort(raw)).collect()
    }
}

#[derive(Args, Debug)]
pub struct OpenArgs {
    /// Navigation address to replay, e.g. `tab=nightly&subtab=42&report=42&run=7`.
    #[arg(long)]
    pub address: String,
    #[arg(long, conflicts_with_all = ["baseline", "newcheck"])]
    pub run: Option<i64>,
    #[arg(long)]
    pub baseline: Option<i64>,
    #[arg(long)]
    pub newcheck: Option<i64>,
    #[arg(long)]
    pub diff_type: Option<String>,
}

pub async fn list(adapter: &QueryAdapter, args: &ListArgs, page_size: u64) -> Result<()> {
    let filter = args.filter()?;
    let sort = args.sort()?;
    let page = PageRequest {
        start: args.start,
        count: args.count.unwrap_or(page_size),
    };

    let result = adapter
        .query(&filter, &sort, page)
        .await
        .context("report query failed")?;

    println!(
        "{:>8}  {:<11}  {:<48}  {}",
        "Id",
        Column::Severity.title(),
        Column::File.title(),
        Column::CheckerName.title()
    );
    for row in &result.rows {
        println!(
            "{:>8}  {:<11}  {:<48}  {}",
            row.report_id,
            row.severity.label(),
            row.checked_file,
            row.checker_id
        );
    }
    println!(
        "reports {}..{} of {}",
        page.start,
        page.start + result.rows.len() as u64,
        result.total
    );
    if let Some(cmp) = &result.comparison {
        println!(
            "compared against runs {:?} ({:?})",
            cmp.run_ids.iter().map(|id| id.0).collect::<Vec<_>>(),
            cmp.diff_type
        );
    }

    Ok(())
}

pub async fn open(adapter: QueryAdapter, args: &OpenArgs, page_size: u64) -> Result<()> {
    let context = view_context(&adapter, args).await?;
    let address = shared_address(Address::parse(&args.address));
    let mut controller = ViewController::with_page_size(adapter, context, address.clone(), page_size);

    controller
        .start()
        .await
        .context("failed to replay navigation address")?;
    controller.on_show();

    println!("tab: {}", controller.tab());
    println!(
        "reports: {} of {}",
        controller.list().rows().len(),
        controller.list().total()
    );
    if controller.filter_panel().is_diff_view() {
        match controller.list().comparison() {
            Some(cmp) => println!(
                "diff view against runs {:?} ({:?})",
                cmp.run_ids.iter().map(|id| id.0).collect::<Vec<_>>(),
                cmp.diff_type
            ),
            None => println!("diff view without a newcheck run set"),
        }
    }
    match controller.state() {
        ControllerState::Overview => println!("showing overview"),
        ControllerState::RunHistory => {
            let history = controller.run_history();
            println!(
                "history of runs {:?}",
                history.run_filter().ids.iter().map(|id| id.0).collect::<Vec<_>>()
            );
            for run in history.runs() {
                println!("run {} {} ({} reports)", run.run_id, run.name, run.result_count);
            }
        }
        ControllerState::ReportOpen(report_id) => {
            let view = controller
                .registry()
                .get(report_id)
                .ok_or_else(|| anyhow!("report {report_id} is not registered"))?;
            println!(
                "opened {} [{}] {}",
                view.title, view.report.bug_hash, view.report.checked_file
            );
        }
    }
    println!("address: {}", lock_address(&address));

    Ok(())
}

pub fn decode(raw: &str) -> Result<()> {
    let state = navigation::try_decode(&Address::parse(raw)).context("address does not decode")?;

    println!("tab: {}", state.tab.as_deref().unwrap_or("-"));
    println!("canonical: {}", navigation::encode(&state));
    match state.view {
        NavigationView::Overview => println!("view: overview"),
        NavigationView::RunHistory => println!("view: run history"),
        NavigationView::Report {
            subtab,
            report,
            run,
            report_hash,
        } => {
            println!("view: report (subtab {subtab})");
            if let Some(report) = report {
                println!("report: {report}");
            }
            if let Some(run) = run {
                println!("run: {run}");
            }
            if let Some(hash) = report_hash {
                println!("report hash: {hash}");
            }
        }
    }

    Ok(())
}

async fn view_context(adapter: &QueryAdapter, args: &OpenArgs) -> Result<ViewContext> {
    if let Some(run) = args.run {
        return Ok(ViewContext::for_run(fetch_run(adapter, run).await?));
    }
    if args.baseline.is_none() && args.newcheck.is_none() {
        return Ok(ViewContext::all_reports());
    }

    let baseline = match args.baseline {
        Some(id) => Some(fetch_run(adapter, id).await?),
        None => None,
    };
    let newcheck = match args.newcheck {
        Some(id) => Some(fetch_run(adapter, id).await?),
        None => None,
    };
    let diff_type = args
        .diff_type
        .as_deref()
        .map(|raw| parse_wire::<DiffType>("diff type", raw))
        .transpose()?;
    Ok(ViewContext::for_comparison(baseline, newcheck, diff_type))
}

async fn fetch_run(adapter: &QueryAdapter, run_id: i64) -> Result<RunData> {
    adapter
        .run_data(RunId(run_id))
        .await
        .with_context(|| format!("failed to load run {run_id}"))?
        .ok_or_else(|| anyhow!("run {run_id} does not exist"))
}

fn run_ids(ids: &[i64]) -> Option<Vec<RunId>> {
    (!ids.is_empty()).then(|| ids.iter().copied().map(RunId).collect())
}

fn parse_sort(raw: &str) -> Result<SortSpec> {
    let (field, descending) = match raw.split_once(':') {
        None => (raw, false),
        Some((field, "asc")) => (field, false),
        Some((field, "desc")) => (field, true),
        Some((_, order)) => bail!("unknown sort order '{order}' in '{raw}'"),
    };
    if let Some(column) = Column::from_field(field).filter(|column| !column.is_sortable()) {
        bail!("the {} column cannot be sorted", column.title());
    }
    Ok(if descending {
        SortSpec::desc(field)
    } else {
        SortSpec::asc(field)
    })
}

/// Parses a wire enum from its lower-case, dashed spelling (`false-positive`).
fn parse_wire<T: DeserializeOwned>(what: &str, raw: &str) -> Result<T> {
    let wire = raw.trim().to_ascii_uppercase().replace('-', "_");
    serde_json::from_value(serde_json::Value::String(wire))
        .with_context(|| format!("unknown {what} '{raw}'"))
}

fn parse_all<T: DeserializeOwned>(what: &str, raw: &[String]) -> Result<Vec<T>> {
    raw.iter().map(|value| parse_wire(what, value)).collect()
}
