//! Upload Endpoints
//!
//! The tracker talks to the upload collaborator through [`UploadEndpoint`].
//! Three backends are provided:
//! - [`HttpUploadEndpoint`]: multipart POST to a real endpoint
//! - [`RandomizedUploadEndpoint`]: fixed delay, fixed success probability
//! - [`ScriptedUploadEndpoint`]: outcomes pinned in call order, for tests

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tokio::sync::Mutex;

use super::types::{FileRef, UploadError, UploadReceipt, UPLOAD_FAILED_MESSAGE};

/// Upload endpoint trait
#[async_trait]
pub trait UploadEndpoint: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Upload one file; resolves exactly once
    async fn upload(&self, file: &FileRef) -> Result<UploadReceipt, UploadError>;
}

// ============================================================================
// HTTP
// ============================================================================

/// Response envelope of the upload endpoint
#[derive(Debug, Deserialize)]
struct UploadResponse {
    success: bool,
    #[serde(default)]
    data: Option<UploadReceipt>,
    #[serde(default)]
    error: Option<String>,
}

/// Multipart upload to a real endpoint
pub struct HttpUploadEndpoint {
    client: reqwest::Client,
    url: String,
}

impl HttpUploadEndpoint {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, UploadError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| UploadError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl UploadEndpoint for HttpUploadEndpoint {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn upload(&self, file: &FileRef) -> Result<UploadReceipt, UploadError> {
        let part = Part::bytes(file.content().to_vec())
            .file_name(file.name().to_string())
            .mime_str(&file.mime_type())
            .map_err(|e| UploadError::Transport(e.to_string()))?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(&self.url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| UploadError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(
                file_name = %file.name(),
                status = %status,
                "Upload endpoint returned an error status"
            );
            return Err(UploadError::Rejected(UPLOAD_FAILED_MESSAGE.to_string()));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| UploadError::Transport(format!("Invalid upload response: {}", e)))?;

        match (body.success, body.data) {
            (true, Some(receipt)) => Ok(receipt),
            (true, None) => Ok(UploadReceipt::for_file(file)),
            (false, _) => Err(UploadError::Rejected(
                body.error
                    .unwrap_or_else(|| UPLOAD_FAILED_MESSAGE.to_string()),
            )),
        }
    }
}

// ============================================================================
// Randomized mock
// ============================================================================

/// Mock endpoint: waits `delay`, then succeeds with probability `success_rate`
pub struct RandomizedUploadEndpoint {
    success_rate: f64,
    delay: Duration,
}

impl RandomizedUploadEndpoint {
    pub fn new(success_rate: f64, delay: Duration) -> Self {
        Self {
            success_rate: success_rate.clamp(0.0, 1.0),
            delay,
        }
    }
}

impl Default for RandomizedUploadEndpoint {
    fn default() -> Self {
        Self::new(0.9, Duration::from_millis(2000))
    }
}

#[async_trait]
impl UploadEndpoint for RandomizedUploadEndpoint {
    fn name(&self) -> &'static str {
        "randomized"
    }

    async fn upload(&self, file: &FileRef) -> Result<UploadReceipt, UploadError> {
        tokio::time::sleep(self.delay).await;

        if roll(self.success_rate) {
            Ok(UploadReceipt::for_file(file))
        } else {
            Err(UploadError::Rejected(UPLOAD_FAILED_MESSAGE.to_string()))
        }
    }
}

fn roll(success_rate: f64) -> bool {
    rand::thread_rng().gen_bool(success_rate)
}

// ============================================================================
// Scripted
// ============================================================================

/// Outcome of one scripted call
#[derive(Debug, Clone)]
pub enum ScriptedOutcome {
    /// Resolve with a receipt
    Succeed,
    /// Resolve with the endpoint's failure indicator
    Fail,
    /// Fail as if the endpoint were unreachable
    Unreachable(String),
    /// Panic inside the endpoint call
    Panic,
    /// Never resolve
    Hang,
}

/// Deterministic endpoint
///
/// Outcomes keyed by file name apply to every call for that file, whatever
/// order the calls arrive in. Other calls consume the sequential script;
/// calls beyond its end fail.
pub struct ScriptedUploadEndpoint {
    outcomes: Mutex<VecDeque<ScriptedOutcome>>,
    by_name: HashMap<String, ScriptedOutcome>,
    delay: Duration,
    calls: Mutex<Vec<String>>,
}

impl ScriptedUploadEndpoint {
    /// Outcomes consumed in call order
    pub fn new(outcomes: impl IntoIterator<Item = ScriptedOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            by_name: HashMap::new(),
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Outcomes keyed by file name
    pub fn by_name<N>(outcomes: impl IntoIterator<Item = (N, ScriptedOutcome)>) -> Self
    where
        N: Into<String>,
    {
        let mut endpoint = Self::new(Vec::<ScriptedOutcome>::new());
        endpoint.by_name = outcomes
            .into_iter()
            .map(|(name, outcome)| (name.into(), outcome))
            .collect();
        endpoint
    }

    /// Wait this long before resolving each call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// File names seen so far, in call order
    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl UploadEndpoint for ScriptedUploadEndpoint {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn upload(&self, file: &FileRef) -> Result<UploadReceipt, UploadError> {
        let outcome = {
            self.calls.lock().await.push(file.name().to_string());
            match self.by_name.get(file.name()) {
                Some(outcome) => Some(outcome.clone()),
                None => self.outcomes.lock().await.pop_front(),
            }
        };

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match outcome {
            Some(ScriptedOutcome::Succeed) => Ok(UploadReceipt::for_file(file)),
            Some(ScriptedOutcome::Fail) | None => {
                Err(UploadError::Rejected(UPLOAD_FAILED_MESSAGE.to_string()))
            }
            Some(ScriptedOutcome::Unreachable(reason)) => Err(UploadError::Transport(reason)),
            Some(ScriptedOutcome::Panic) => panic!("scripted upload panic for {}", file.name()),
            Some(ScriptedOutcome::Hang) => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::{extract::Multipart, routing::post, Json, Router};
    use serde_json::{json, Value};

    async fn spawn_server(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/upload", addr)
    }

    async fn accept_upload(mut multipart: Multipart) -> Json<Value> {
        let field = multipart.next_field().await.unwrap().unwrap();
        let name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.unwrap();
        Json(json!({
            "success": true,
            "data": {
                "id": "file-1",
                "name": name,
                "size": bytes.len(),
                "status": "Success",
                "uploadedAt": "2025-01-15T10:00:00Z"
            }
        }))
    }

    #[tokio::test]
    async fn test_http_endpoint_success() {
        let url = spawn_server(Router::new().route("/upload", post(accept_upload))).await;
        let endpoint = HttpUploadEndpoint::new(url, Duration::from_secs(5)).unwrap();
        let file = FileRef::new("msa.pdf", b"%PDF-1.7".to_vec());

        let receipt = endpoint.upload(&file).await.unwrap();

        assert_eq!(receipt.name, "msa.pdf");
        assert_eq!(receipt.size, 8);
        assert_eq!(receipt.status, "Success");
    }

    #[tokio::test]
    async fn test_http_endpoint_failure_envelope() {
        let router = Router::new().route(
            "/upload",
            post(|| async { Json(json!({ "success": false, "error": "Quota exceeded" })) }),
        );
        let url = spawn_server(router).await;
        let endpoint = HttpUploadEndpoint::new(url, Duration::from_secs(5)).unwrap();

        let err = endpoint
            .upload(&FileRef::new("msa.pdf", vec![1, 2, 3]))
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::Rejected(ref msg) if msg == "Quota exceeded"));
    }

    #[tokio::test]
    async fn test_http_endpoint_error_status() {
        let router = Router::new().route(
            "/upload",
            post(|| async { (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let url = spawn_server(router).await;
        let endpoint = HttpUploadEndpoint::new(url, Duration::from_secs(5)).unwrap();

        let err = endpoint
            .upload(&FileRef::new("msa.pdf", vec![1]))
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::Rejected(_)));
    }

    #[tokio::test]
    async fn test_http_endpoint_unreachable() {
        let endpoint =
            HttpUploadEndpoint::new("http://127.0.0.1:1/upload", Duration::from_secs(2)).unwrap();

        let err = endpoint
            .upload(&FileRef::new("msa.pdf", vec![1]))
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::Transport(_)));
    }

    #[tokio::test]
    async fn test_scripted_outcomes_in_call_order() {
        let endpoint = ScriptedUploadEndpoint::new([ScriptedOutcome::Succeed, ScriptedOutcome::Fail]);
        let file = FileRef::new("a.pdf", Vec::new());

        assert!(endpoint.upload(&file).await.is_ok());
        assert!(endpoint.upload(&file).await.is_err());
        // Script exhausted
        assert!(endpoint.upload(&file).await.is_err());
        assert_eq!(endpoint.calls().await.len(), 3);
    }

    #[tokio::test]
    async fn test_scripted_outcomes_by_name() {
        let endpoint = ScriptedUploadEndpoint::by_name([
            ("good.pdf", ScriptedOutcome::Succeed),
            ("bad.pdf", ScriptedOutcome::Fail),
        ]);
        let good = FileRef::new("good.pdf", Vec::new());
        let bad = FileRef::new("bad.pdf", Vec::new());

        assert!(endpoint.upload(&bad).await.is_err());
        assert!(endpoint.upload(&good).await.is_ok());
        assert!(endpoint.upload(&good).await.is_ok());
        // Unscripted name with an empty sequence
        assert!(endpoint
            .upload(&FileRef::new("other.pdf", Vec::new()))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_randomized_extremes() {
        let file = FileRef::new("a.pdf", Vec::new());

        let always = RandomizedUploadEndpoint::new(1.0, Duration::ZERO);
        let never = RandomizedUploadEndpoint::new(0.0, Duration::ZERO);

        for _ in 0..20 {
            assert!(always.upload(&file).await.is_ok());
            assert!(never.upload(&file).await.is_err());
        }
    }
}
