use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::info;

use crate::config::Config;
use crate::render::{HttpPdfRenderer, PdfRenderer};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Pluggable PDF renderer. `None` when RENDER_SERVICE_URL is unset.
    pub renderer: Option<Arc<dyn PdfRenderer>>,
}

impl AppState {
    pub fn from_config(config: Config) -> Result<Self> {
        let renderer: Option<Arc<dyn PdfRenderer>> = match &config.render_service_url {
            Some(url) => {
                let timeout = Duration::from_secs(config.render_timeout_secs);
                info!("PDF renderer configured: {url} (timeout {}s)", timeout.as_secs());
                Some(Arc::new(HttpPdfRenderer::new(url.clone(), timeout)?))
            }
            None => {
                info!("RENDER_SERVICE_URL not set; PDF rendering disabled");
                None
            }
        };
        Ok(AppState { config, renderer })
    }
}
