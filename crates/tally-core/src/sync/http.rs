//! HTTP gateway remote store
//!
//! Speaks JSON to a small REST gateway in front of the remote database:
//!
//! - `POST   {base}/init`
//! - `GET    {base}/tables/{table}/rows?user_email=...`
//! - `DELETE {base}/tables/{table}/rows?user_email=...`
//! - `POST   {base}/tables/{table}/rows`
//! - `GET    {base}/tables/{table}/count?user_email=...`

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::wire::{RemoteExpense, RemoteIncome, RemoteInvestment, RemoteLentMoney};
use super::{RemoteRow, RemoteStore, RemoteTable};
use crate::config::SyncConfig;
use crate::error::{Error, Result};

const MAX_LOG_BODY_CHARS: usize = 512;

fn transport_error(err: reqwest::Error) -> Error {
    let kind = if err.is_timeout() {
        "timed out"
    } else if err.is_connect() {
        "connection failed"
    } else {
        "request failed"
    };
    Error::Replication(format!("gateway {}: {}", kind, err))
}

#[derive(Debug, Deserialize)]
struct DeletedResponse {
    deleted: u64,
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    count: u64,
}

/// Remote store reached through the HTTP gateway
#[derive(Debug, Clone)]
pub struct HttpRemoteStore {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpRemoteStore {
    /// Create a store for the gateway at `base_url`, e.g. `https://sync.example.com/api`
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn from_config(config: &SyncConfig) -> Result<Self> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| Error::Replication("no gateway URL configured".to_string()))?;
        Self::new(url, config.token.clone(), config.timeout)
    }

    fn init_url(&self) -> String {
        format!("{}/init", self.base_url)
    }

    fn rows_url(&self, table: RemoteTable) -> String {
        format!("{}/tables/{}/rows", self.base_url, table)
    }

    fn count_url(&self, table: RemoteTable) -> String {
        format!("{}/tables/{}/count", self.base_url, table)
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(ref token) = self.token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| Error::Replication("invalid gateway token format".to_string()))?;
            headers.insert(AUTHORIZATION, value);
        }

        Ok(headers)
    }

    fn log_response(status: reqwest::StatusCode, body: &str) {
        if status.is_success() {
            debug!("Gateway response status: {}", status);
            return;
        }

        let mut preview = body.chars().take(MAX_LOG_BODY_CHARS).collect::<String>();
        if body.chars().count() > MAX_LOG_BODY_CHARS {
            preview.push_str("...");
        }
        debug!("Gateway response error ({}): {}", status, preview);
    }

    /// Attach headers and send. Network failures (refused, timed out, reset)
    /// are reported as replication errors.
    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        request
            .headers(self.headers()?)
            .send()
            .await
            .map_err(transport_error)
    }

    /// Read the body, failing on a non-success status
    async fn response_body(response: Response) -> Result<String> {
        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;
        Self::log_response(status, &body);

        if !status.is_success() {
            return Err(Error::Replication(format!(
                "gateway returned {}: {}",
                status.as_u16(),
                body.trim()
            )));
        }
        Ok(body)
    }

    async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T> {
        let body = Self::response_body(response).await?;
        serde_json::from_str(&body)
            .map_err(|e| Error::Replication(format!("failed to parse gateway response: {}", e)))
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    fn name(&self) -> &str {
        "http"
    }

    /// POST /init
    async fn initialize(&self) -> Result<()> {
        let request = self.client.post(self.init_url());
        let response = self.send(request).await?;
        Self::response_body(response).await?;
        Ok(())
    }

    /// DELETE /tables/{table}/rows?user_email=
    async fn delete_for_user(&self, table: RemoteTable, email: &str) -> Result<u64> {
        let request = self
            .client
            .delete(self.rows_url(table))
            .query(&[("user_email", email)]);
        let response = self.send(request).await?;
        let deleted: DeletedResponse = Self::parse_response(response).await?;
        Ok(deleted.deleted)
    }

    /// POST /tables/{table}/rows
    async fn insert(&self, email: &str, row: &RemoteRow) -> Result<()> {
        if row.user_email() != email {
            return Err(Error::InvalidData(format!(
                "row belongs to {}, not {}",
                row.user_email(),
                email
            )));
        }

        let request = self
            .client
            .post(self.rows_url(row.table()))
            .json(row);
        let response = self.send(request).await?;
        Self::response_body(response).await?;
        Ok(())
    }

    /// GET /tables/{table}/rows?user_email=
    async fn fetch_for_user(&self, table: RemoteTable, email: &str) -> Result<Vec<RemoteRow>> {
        let request = self
            .client
            .get(self.rows_url(table))
            .query(&[("user_email", email)]);
        let response = self.send(request).await?;

        let rows = match table {
            RemoteTable::Expenses => Self::parse_response::<Vec<RemoteExpense>>(response)
                .await?
                .into_iter()
                .map(RemoteRow::Expense)
                .collect(),
            RemoteTable::Incomes => Self::parse_response::<Vec<RemoteIncome>>(response)
                .await?
                .into_iter()
                .map(RemoteRow::Income)
                .collect(),
            RemoteTable::Investments => Self::parse_response::<Vec<RemoteInvestment>>(response)
                .await?
                .into_iter()
                .map(RemoteRow::Investment)
                .collect(),
            RemoteTable::LentMoney => Self::parse_response::<Vec<RemoteLentMoney>>(response)
                .await?
                .into_iter()
                .map(RemoteRow::LentMoney)
                .collect(),
        };
        Ok(rows)
    }

    /// GET /tables/{table}/count?user_email=
    async fn count_for_user(&self, table: RemoteTable, email: &str) -> Result<u64> {
        let request = self
            .client
            .get(self.count_url(table))
            .query(&[("user_email", email)]);
        let response = self.send(request).await?;
        let count: CountResponse = Self::parse_response(response).await?;
        Ok(count.count)
    }
}
