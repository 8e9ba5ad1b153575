use async_trait::async_trait;
use common::JudgeAppConfig;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::JudgeApiError;
use crate::models::{SubmissionRequest, SubmissionResult, SubmissionToken};
use crate::status::JudgeStatus;

/// The two judge endpoints the validation pipeline depends on.
#[async_trait]
pub trait JudgeApi: Send + Sync {
    /// Submit a batch; returns one token per request, in request order.
    async fn submit_batch(
        &self,
        batch: &[SubmissionRequest],
    ) -> Result<Vec<SubmissionToken>, JudgeApiError>;

    /// Fetch the current state of the given submissions.
    ///
    /// Results may come back in any order; unknown tokens may be omitted.
    async fn fetch_batch(
        &self,
        tokens: &[SubmissionToken],
    ) -> Result<Vec<SubmissionResult>, JudgeApiError>;
}

/// HTTP client for a Judge0-compatible judge.
#[derive(Clone)]
pub struct Judge0Client {
    client: Client,
    base_url: String,
    api_key: Option<(String, String)>,
}

#[derive(Serialize)]
struct BatchSubmitBody<'a> {
    submissions: &'a [SubmissionRequest],
}

/// Rejected items carry field errors instead of a token.
#[derive(Deserialize)]
struct WireTokenItem {
    token: Option<String>,
}

#[derive(Deserialize)]
struct WireBatchResults {
    submissions: Vec<Option<WireResult>>,
}

#[derive(Deserialize)]
struct WireResult {
    token: String,
    status: WireStatus,
    stdout: Option<String>,
    stderr: Option<String>,
}

#[derive(Deserialize)]
struct WireStatus {
    id: u32,
}

impl Judge0Client {
    pub fn new(config: &JudgeAppConfig) -> Result<Self, JudgeApiError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| JudgeApiError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config
                .api_key
                .clone()
                .map(|key| (config.api_key_header.clone(), key)),
        })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some((header, key)) => request.header(header.as_str(), key.as_str()),
            None => request,
        }
    }

    async fn check_status(response: Response) -> Result<Response, JudgeApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(JudgeApiError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl JudgeApi for Judge0Client {
    async fn submit_batch(
        &self,
        batch: &[SubmissionRequest],
    ) -> Result<Vec<SubmissionToken>, JudgeApiError> {
        let request = self
            .client
            .post(format!("{}/submissions/batch", self.base_url))
            .query(&[("base64_encoded", "false")])
            .json(&BatchSubmitBody { submissions: batch });

        let response = self.authorize(request).send().await?;
        let items: Vec<WireTokenItem> = Self::check_status(response).await?.json().await?;

        debug!(submitted = batch.len(), returned = items.len(), "Judge accepted batch");

        items
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                item.token.map(SubmissionToken).ok_or_else(|| {
                    JudgeApiError::Malformed(format!("submission {i} in batch has no token"))
                })
            })
            .collect()
    }

    async fn fetch_batch(
        &self,
        tokens: &[SubmissionToken],
    ) -> Result<Vec<SubmissionResult>, JudgeApiError> {
        let joined = tokens
            .iter()
            .map(SubmissionToken::as_str)
            .collect::<Vec<_>>()
            .join(",");

        let request = self
            .client
            .get(format!("{}/submissions/batch", self.base_url))
            .query(&[
                ("tokens", joined.as_str()),
                ("base64_encoded", "false"),
                ("fields", "token,stdout,stderr,status"),
            ]);

        let response = self.authorize(request).send().await?;
        let body: WireBatchResults = Self::check_status(response).await?.json().await?;

        Ok(body
            .submissions
            .into_iter()
            .flatten()
            .map(|r| SubmissionResult {
                token: SubmissionToken(r.token),
                status: JudgeStatus::from_id(r.status.id),
                stdout: r.stdout,
                stderr: r.stderr,
            })
            .collect())
    }
}
