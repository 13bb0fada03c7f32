//! JSON-over-HTTP implementation of [`ReportService`].

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::{ReportId, RunId},
    error::ApiError,
    protocol::{
        CompareData, ReportData, ReportFilter, ReportRequest, RunData, RunDataRequest, RunFilter,
        RunResultCountRequest, RunResultCountResponse, RunResultsRequest, SortMode,
    },
};
use tracing::debug;
use url::Url;

use crate::{error::ServiceError, ReportService};

pub struct HttpReportService {
    http: Client,
    base_url: Url,
}

impl HttpReportService {
    /// `endpoint` is the product path under `server_url`, e.g. `v6.50/Default/CodeCheckerService`.
    pub fn new(server_url: &str, endpoint: &str) -> Result<Self, ServiceError> {
        let server_url = if server_url.ends_with('/') {
            Url::parse(server_url)?
        } else {
            Url::parse(&format!("{server_url}/"))?
        };
        let endpoint = endpoint.trim_matches('/');
        let base_url = if endpoint.is_empty() {
            server_url
        } else {
            server_url.join(&format!("{endpoint}/"))?
        };
        Ok(Self::with_client(Client::new(), base_url))
    }

    pub fn with_client(http: Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn call<Req, Resp>(&self, operation: &str, body: &Req) -> Result<Resp, ServiceError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned + Send,
    {
        let url = self.base_url.join(operation)?;
        debug!(%url, "report service call");
        let response = self.http.post(url).json(body).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<Resp>().await?);
        }

        let text = response.text().await?;
        match serde_json::from_str::<ApiError>(&text) {
            Ok(api) => Err(ServiceError::RequestFailed(api)),
            Err(_) => Err(ServiceError::Transport(format!("{operation}: {status}: {text}"))),
        }
    }
}

#[async_trait]
impl ReportService for HttpReportService {
    async fn get_run_data(&self, filter: &RunFilter) -> Result<Vec<RunData>, ServiceError> {
        self.call(
            "getRunData",
            &RunDataRequest {
                run_filter: filter.clone(),
            },
        )
        .await
    }

    async fn get_report(&self, report_id: ReportId) -> Result<ReportData, ServiceError> {
        self.call("getReport", &ReportRequest { report_id }).await
    }

    async fn get_run_results(
        &self,
        run_ids: Option<&[RunId]>,
        limit: u64,
        offset: u64,
        sort_modes: Option<&[SortMode]>,
        filter: &ReportFilter,
        cmp_data: Option<&CompareData>,
    ) -> Result<Vec<ReportData>, ServiceError> {
        let request = RunResultsRequest {
            run_ids: run_ids.map(<[RunId]>::to_vec),
            limit,
            offset,
            sort_modes: sort_modes.map(<[SortMode]>::to_vec),
            report_filter: filter.clone(),
            cmp_data: cmp_data.cloned(),
        };
        self.call("getRunResults", &request).await
    }

    async fn get_run_result_count(
        &self,
        run_ids: Option<&[RunId]>,
        filter: &ReportFilter,
        cmp_data: Option<&CompareData>,
    ) -> Result<u64, ServiceError> {
        let request = RunResultCountRequest {
            run_ids: run_ids.map(<[RunId]>::to_vec),
            report_filter: filter.clone(),
            cmp_data: cmp_data.cloned(),
        };
        let response: RunResultCountResponse = self.call("getRunResultCount", &request).await?;
        Ok(response.count)
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
