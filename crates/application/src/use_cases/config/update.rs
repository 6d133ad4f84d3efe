use crate::ports::RuntimeConfigPort;
use dnsforward_domain::{ConfigError, DnsConfigPatch};
use std::sync::Arc;
use tracing::debug;

/// Overlays a partial configuration on the published one and applies it.
pub struct UpdateConfigUseCase {
    runtime: Arc<dyn RuntimeConfigPort>,
}

impl UpdateConfigUseCase {
    pub fn new(runtime: Arc<dyn RuntimeConfigPort>) -> Self {
        Self { runtime }
    }

    pub async fn execute(&self, patch: DnsConfigPatch) -> Result<(), ConfigError> {
        let snapshot = self.runtime.update(patch).await?;
        debug!(generation = snapshot.generation, "Configuration updated");
        Ok(())
    }

    pub async fn execute_json(&self, json: &str) -> Result<(), ConfigError> {
        let patch = DnsConfigPatch::from_json(json)?;
        self.execute(patch).await
    }
}
