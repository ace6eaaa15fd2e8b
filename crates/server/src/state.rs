use std::sync::Arc;
use slaterunner_core::{Config, LineupPipeline, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    pipeline: Arc<LineupPipeline>,
}

impl AppState {
    pub fn new(config: Config, pipeline: Arc<LineupPipeline>) -> Self {
        Self { config, pipeline }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn pipeline(&self) -> &LineupPipeline {
        self.pipeline.as_ref()
    }

    /// Largest accepted request body, in bytes.
    pub fn max_upload_bytes(&self) -> usize {
        self.config.server.max_upload_bytes
    }
}
