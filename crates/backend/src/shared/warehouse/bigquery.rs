use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use super::{WarehouseClient, WarehouseError, WarehouseRow};
use crate::shared::config::WarehouseConfig;

/// Server-side wait per `jobs.query` / `getQueryResults` call
const QUERY_WAIT_MS: u64 = 10_000;

const POLL_BACKOFF_START: Duration = Duration::from_millis(200);
const POLL_BACKOFF_MAX: Duration = Duration::from_secs(2);

/// HTTP client for the BigQuery REST API (`jobs.query` + `getQueryResults`)
pub struct BigQueryClient {
    client: reqwest::Client,
    base_url: String,
    project_id: String,
    location: Option<String>,
    access_token: String,
    query_timeout: Duration,
}

impl BigQueryClient {
    pub fn from_config(config: &WarehouseConfig) -> Result<Self, WarehouseError> {
        let access_token = config
            .access_token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                WarehouseError::Config(
                    "access token is required (warehouse.access_token or WAREHOUSE_ACCESS_TOKEN)"
                        .to_string(),
                )
            })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| WarehouseError::Config(format!("cannot create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
            location: config.location.clone(),
            access_token,
            query_timeout: Duration::from_secs(config.query_timeout_secs),
        })
    }

    fn project_url(&self) -> String {
        format!(
            "{}/projects/{}",
            self.base_url,
            urlencoding::encode(&self.project_id)
        )
    }

    async fn start_query(&self, sql: &str) -> Result<QueryResponse, WarehouseError> {
        let url = format!("{}/queries", self.project_url());
        let body = QueryRequest {
            query: sql,
            use_legacy_sql: false,
            timeout_ms: QUERY_WAIT_MS,
            location: self.location.as_deref(),
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| WarehouseError::Unreachable(e.to_string()))?;

        Self::read_response(response).await
    }

    async fn fetch_results(
        &self,
        job: &JobReference,
        page_token: Option<&str>,
    ) -> Result<QueryResponse, WarehouseError> {
        let url = format!(
            "{}/queries/{}",
            self.project_url(),
            urlencoding::encode(&job.job_id)
        );

        let mut query_params = vec![("timeoutMs", QUERY_WAIT_MS.to_string())];
        if let Some(location) = job.location.as_deref().or(self.location.as_deref()) {
            query_params.push(("location", location.to_string()));
        }
        if let Some(token) = page_token {
            query_params.push(("pageToken", token.to_string()));
        }

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&query_params)
            .send()
            .await
            .map_err(|e| WarehouseError::Unreachable(e.to_string()))?;

        Self::read_response(response).await
    }

    /// Start the job and poll until it completes
    async fn run_to_completion(
        &self,
        sql: &str,
    ) -> Result<(QueryResponse, JobReference), WarehouseError> {
        let mut response = self.start_query(sql).await?;
        let job = response.job_reference.clone().ok_or_else(|| {
            WarehouseError::Decode("response without jobReference".to_string())
        })?;

        let mut backoff = POLL_BACKOFF_START;
        while !response.job_complete {
            tracing::debug!("BigQuery job {} still running", job.job_id);
            tokio::time::sleep(backoff).await;
            backoff = (backoff * 2).min(POLL_BACKOFF_MAX);
            response = self.fetch_results(&job, None).await?;
        }
        Ok((response, job))
    }

    async fn read_response(response: reqwest::Response) -> Result<QueryResponse, WarehouseError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| WarehouseError::Unreachable(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            tracing::error!("BigQuery request failed with status {}: {}", status, message);
            return Err(WarehouseError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str::<QueryResponse>(&body).map_err(|e| {
            let preview: String = body.chars().take(500).collect();
            tracing::error!("Failed to parse BigQuery response: {}. Body: {}", e, preview);
            WarehouseError::Decode(e.to_string())
        })
    }
}

#[async_trait]
impl WarehouseClient for BigQueryClient {
    async fn run_query(&self, sql: &str) -> Result<Vec<WarehouseRow>, WarehouseError> {
        let started = std::time::Instant::now();
        let (mut response, job) =
            match tokio::time::timeout(self.query_timeout, self.run_to_completion(sql)).await {
                Ok(result) => result?,
                Err(_) => {
                    tracing::error!(
                        "BigQuery job did not complete within {}s",
                        self.query_timeout.as_secs()
                    );
                    return Err(WarehouseError::Unreachable(format!(
                        "query did not complete within {}s",
                        self.query_timeout.as_secs()
                    )));
                }
            };

        let fields = response
            .schema
            .as_ref()
            .map(|s| s.fields.iter().map(|f| f.name.clone()).collect::<Vec<_>>())
            .unwrap_or_default();

        let mut rows = Vec::new();
        loop {
            for raw in response.rows.take().unwrap_or_default() {
                rows.push(raw.into_row(&fields)?);
            }
            match response.page_token.take() {
                Some(token) => response = self.fetch_results(&job, Some(&token)).await?,
                None => break,
            }
        }

        tracing::info!(
            "BigQuery job {} returned {} rows in {}ms",
            job.job_id,
            rows.len(),
            started.elapsed().as_millis()
        );
        Ok(rows)
    }
}

// ============================================================================
// Request/Response structures for the BigQuery REST API
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    query: &'a str,
    use_legacy_sql: bool,
    timeout_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    #[serde(default)]
    job_complete: bool,
    #[serde(default)]
    job_reference: Option<JobReference>,
    #[serde(default)]
    schema: Option<TableSchema>,
    #[serde(default)]
    rows: Option<Vec<TableRow>>,
    #[serde(default)]
    page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobReference {
    job_id: String,
    #[serde(default)]
    location: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TableSchema {
    #[serde(default)]
    fields: Vec<TableField>,
}

#[derive(Debug, Deserialize)]
struct TableField {
    name: String,
}

#[derive(Debug, Deserialize)]
struct TableRow {
    #[serde(default)]
    f: Vec<TableCell>,
}

#[derive(Debug, Deserialize)]
struct TableCell {
    #[serde(default)]
    v: Value,
}

impl TableRow {
    fn into_row(self, fields: &[String]) -> Result<WarehouseRow, WarehouseError> {
        if self.f.len() != fields.len() {
            return Err(WarehouseError::Decode(format!(
                "row has {} cells, schema has {} fields",
                self.f.len(),
                fields.len()
            )));
        }
        Ok(fields
            .iter()
            .cloned()
            .zip(self.f.into_iter().map(|cell| cell.v))
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}
