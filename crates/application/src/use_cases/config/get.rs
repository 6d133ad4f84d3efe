use crate::ports::RuntimeConfigPort;
use dnsforward_domain::{ConfigError, DnsConfig};
use std::sync::Arc;

pub struct GetConfigUseCase {
    runtime: Arc<dyn RuntimeConfigPort>,
}

impl GetConfigUseCase {
    pub fn new(runtime: Arc<dyn RuntimeConfigPort>) -> Self {
        Self { runtime }
    }

    pub fn execute(&self) -> Arc<DnsConfig> {
        Arc::clone(&self.runtime.snapshot().config)
    }

    /// The published configuration as the control plane sees it.
    pub fn execute_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string(&*self.execute()).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}
