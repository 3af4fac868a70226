// PDF rendering
// The résumé PDF is produced by an external service. This module only forwards
// a ResumeRecord to it and hands back the bytes.

pub mod handlers;

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::resume::ResumeRecord;

const MAX_ATTEMPTS: u32 = 3;
const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("render service returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("render service returned an empty document")]
    EmptyBody,
}

/// Turns a record into a PDF document.
///
/// Carried in `AppState` as `Option<Arc<dyn PdfRenderer>>`; `None` when no
/// render service is configured.
#[async_trait]
pub trait PdfRenderer: Send + Sync {
    async fn render(&self, record: &ResumeRecord) -> Result<Bytes, RenderError>;
}

/// Posts the record JSON to the render service.
/// Retries on 429 and 5xx with exponential backoff (1s, 2s).
#[derive(Clone)]
pub struct HttpPdfRenderer {
    client: Client,
    endpoint: String,
    backoff: Duration,
}

impl HttpPdfRenderer {
    pub fn new(endpoint: String, timeout: Duration) -> Result<Self, RenderError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RenderError::Client(e.to_string()))?;
        Ok(Self {
            client,
            endpoint,
            backoff: DEFAULT_BACKOFF,
        })
    }

    /// Overrides the base retry delay.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }
}

#[async_trait]
impl PdfRenderer for HttpPdfRenderer {
    async fn render(&self, record: &ResumeRecord) -> Result<Bytes, RenderError> {
        let mut last_error: Option<RenderError> = None;

        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                let delay = self.backoff * (1 << (attempt - 1));
                warn!(
                    "Render attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = match self.client.post(&self.endpoint).json(record).send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(RenderError::Transport(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("Render service returned {}: {}", status, body);
                last_error = Some(RenderError::Status {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let message = response.text().await.unwrap_or_default();
                return Err(RenderError::Status {
                    status: status.as_u16(),
                    message,
                });
            }

            let pdf = response.bytes().await?;
            if pdf.is_empty() {
                return Err(RenderError::EmptyBody);
            }
            debug!(bytes = pdf.len(), "render succeeded");
            return Ok(pdf);
        }

        Err(last_error.unwrap_or(RenderError::EmptyBody))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::{extract::State, http::StatusCode, routing::post, Json, Router};

    type Script = (Arc<Vec<(StatusCode, &'static str)>>, Arc<AtomicUsize>);

    async fn scripted(
        State((responses, hits)): State<Script>,
        Json(_record): Json<ResumeRecord>,
    ) -> (StatusCode, &'static str) {
        let n = hits.fetch_add(1, Ordering::SeqCst);
        responses[n.min(responses.len() - 1)]
    }

    /// Serves `responses` in order, repeating the last one.
    async fn spawn_render_service(
        responses: Vec<(StatusCode, &'static str)>,
    ) -> (String, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route("/render", post(scripted))
            .with_state((Arc::new(responses), hits.clone()));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/render"), hits)
    }

    fn renderer(endpoint: String) -> HttpPdfRenderer {
        HttpPdfRenderer::new(endpoint, Duration::from_secs(5))
            .unwrap()
            .with_backoff(Duration::from_millis(5))
    }

    #[tokio::test]
    async fn test_render_returns_document_bytes() {
        let (endpoint, hits) = spawn_render_service(vec![(StatusCode::OK, "%PDF-1.7 fake")]).await;
        let pdf = renderer(endpoint).render(&ResumeRecord::default()).await.unwrap();
        assert_eq!(&pdf[..], b"%PDF-1.7 fake");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_render_retries_server_errors() {
        let (endpoint, hits) = spawn_render_service(vec![
            (StatusCode::SERVICE_UNAVAILABLE, "warming up"),
            (StatusCode::TOO_MANY_REQUESTS, "slow down"),
            (StatusCode::OK, "%PDF"),
        ])
        .await;
        let pdf = renderer(endpoint).render(&ResumeRecord::default()).await.unwrap();
        assert_eq!(&pdf[..], b"%PDF");
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_render_gives_up_after_max_attempts() {
        let (endpoint, hits) =
            spawn_render_service(vec![(StatusCode::BAD_GATEWAY, "down")]).await;
        let err = renderer(endpoint).render(&ResumeRecord::default()).await.unwrap_err();
        assert!(matches!(err, RenderError::Status { status: 502, .. }));
        assert_eq!(hits.load(Ordering::SeqCst), MAX_ATTEMPTS as usize);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let (endpoint, hits) =
            spawn_render_service(vec![(StatusCode::BAD_REQUEST, "missing name")]).await;
        let err = renderer(endpoint).render(&ResumeRecord::default()).await.unwrap_err();
        match err {
            RenderError::Status { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "missing name");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_document_is_an_error() {
        let (endpoint, _) = spawn_render_service(vec![(StatusCode::OK, "")]).await;
        let err = renderer(endpoint).render(&ResumeRecord::default()).await.unwrap_err();
        assert!(matches!(err, RenderError::EmptyBody));
    }
}
