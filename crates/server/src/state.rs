//! Application State
//!
//! Shared state across all handlers.

use std::sync::Arc;

use agri_faq_agent::CacheManager;
use agri_faq_config::Settings;
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub manager: Arc<CacheManager>,
    /// `None` when metrics are disabled
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(settings: Settings, manager: Arc<CacheManager>) -> Self {
        Self {
            settings: Arc::new(settings),
            manager,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}
