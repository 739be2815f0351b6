//! Thin HTTP client for placing print orders against a deployed backend.
//!
//! Fire-and-forget semantics: one wake probe, one submission, no retries.

use std::time::Duration;

use reqwest::multipart;

use crate::submit::{FormPart, SubmissionForm, SubmissionOutcome, classify_status};

/// Matches the hosting platform's cold-start ceiling.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct OrderClient {
    base_url: String,
    http: reqwest::Client,
}

impl OrderClient {
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Best-effort wake call before checkout is enabled. The caller marks
    /// the server ready regardless of the result; this only absorbs the
    /// cold-start latency so the real submission does not pay for it.
    pub async fn wake(&self) -> bool {
        self.http
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .map(|resp| resp.status().is_success())
            .unwrap_or(false)
    }

    /// Submit an assembled order payload and triage the response.
    pub async fn submit(&self, form: &SubmissionForm) -> SubmissionOutcome {
        let mut payload = multipart::Form::new();
        for (key, part) in form.fields() {
            payload = match part {
                FormPart::Text(value) => payload.text(key.clone(), value.clone()),
                FormPart::File { file_name, bytes } => payload.part(
                    key.clone(),
                    multipart::Part::bytes(bytes.clone()).file_name(file_name.clone()),
                ),
            };
        }

        let result = self
            .http
            .post(format!("{}/api/orders", self.base_url))
            .multipart(payload)
            .send()
            .await;

        match result {
            Ok(response) => {
                let status = response.status().as_u16();
                let message = response
                    .json::<serde_json::Value>()
                    .await
                    .ok()
                    .and_then(|body| {
                        body.get("message")
                            .and_then(|m| m.as_str())
                            .map(str::to_string)
                    });
                classify_status(status, message.as_deref())
            }
            Err(err) if err.is_timeout() => SubmissionOutcome::WarmingUp,
            Err(err) => SubmissionOutcome::Failed(err.to_string()),
        }
    }
}
