// Sample source abstraction for sensor emitters
use crate::domain::reading::TelemetryValue;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Event raised by a source whenever a new reading is available
pub const DATA_AVAILABLE_EVENT: &str = "DATA_AVAILABLE";

#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub telemetry_id: String,
    pub value: TelemetryValue,
}

impl Sample {
    pub fn new(telemetry_id: impl Into<String>, value: impl Into<TelemetryValue>) -> Self {
        Self {
            telemetry_id: telemetry_id.into(),
            value: value.into(),
        }
    }
}

/// Listener endpoint; samples are delivered in emission order
pub type SampleSender = mpsc::UnboundedSender<Sample>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SensorSettings {
    pub id: String,
    pub enabled: bool,
    pub interval_ms: u64,
}

/// Partial update of a sensor's settings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorPatch {
    pub enabled: Option<bool>,
    pub interval_ms: Option<u64>,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SourceError {
    #[error("sensor {0} is not provided by source {1}")]
    UnknownSensor(String, String),
    #[error("interval must be positive for sensor {0}")]
    InvalidInterval(String),
}

pub trait SampleSource: Send + Sync {
    fn name(&self) -> &str;

    /// Whether this source emits readings for `telemetry_id`
    fn provides(&self, telemetry_id: &str) -> bool;

    fn subscribe(&self, event: &str, listener: SampleSender) -> ListenerId;

    /// Returns false when the listener was not registered
    fn unsubscribe(&self, event: &str, id: ListenerId) -> bool;

    fn sensors(&self) -> Vec<SensorSettings>;

    fn configure(&self, sensor_id: &str, patch: SensorPatch) -> Result<SensorSettings, SourceError>;
}

/// All sources known to the app, looked up by telemetry id in registration order
#[derive(Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<Arc<dyn SampleSource>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, source: Arc<dyn SampleSource>) {
        tracing::debug!("Registering sample source {}", source.name());
        self.sources.push(source);
    }

    pub fn find(&self, telemetry_id: &str) -> Option<Arc<dyn SampleSource>> {
        self.sources.iter().find(|s| s.provides(telemetry_id)).cloned()
    }

    pub fn sources(&self) -> &[Arc<dyn SampleSource>] {
        &self.sources
    }
}


#[cfg(test)]
mod tests {
    use super::fake::FakeSource;
    use super::*;

    #[test]
    fn test_registry_lookup_order() {
        let env: Arc<dyn SampleSource> = Arc::new(FakeSource::new("environment", &["temperature", "humidity"]));
        let health: Arc<dyn SampleSource> = Arc::new(FakeSource::new("health", &["heartRate", "temperature"]));
        let mut registry = SourceRegistry::new();
        registry.register(env);
        registry.register(health);

        assert_eq!(registry.find("temperature").unwrap().name(), "environment");
        assert_eq!(registry.find("heartRate").unwrap().name(), "health");
        assert!(registry.find("gps").is_none());
    }
}
