// Command service - Relays cloud commands into local sensor configuration
use crate::application::sample_source::{SensorPatch, SensorSettings, SourceError, SourceRegistry};
use crate::domain::command_log::{CommandLog, LogEntry};
use parking_lot::Mutex;
use serde::Deserialize;
use std::sync::Arc;

pub const ENABLE_DISABLE_COMMAND: &str = "enableSensors";
pub const SET_FREQUENCY_COMMAND: &str = "changeInterval";
const DEFAULT_INTERVAL_MS: u64 = 5000;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudCommand {
    pub name: String,
    /// Raw JSON payload as sent by the cloud
    pub request_payload: String,
}

#[derive(Debug, Deserialize)]
struct CommandPayload {
    sensor: Option<String>,
    enable: Option<bool>,
    /// Seconds between readings
    frequency: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    /// Sensor reconfigured; carries the reply message for the cloud
    Applied {
        reply: &'static str,
        sensor: SensorSettings,
    },
    /// Recognised command without a target sensor, or an unknown command
    Ignored,
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("invalid payload for command {name}: {source}")]
    InvalidPayload {
        name: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("no sample source provides sensor {0}")]
    UnknownSensor(String),
    #[error(transparent)]
    Source(#[from] SourceError),
}

#[derive(Clone)]
pub struct CommandService {
    registry: SourceRegistry,
    log: Arc<Mutex<CommandLog>>,
}

impl CommandService {
    pub fn new(registry: SourceRegistry, log_capacity: usize) -> Self {
        Self {
            registry,
            log: Arc::new(Mutex::new(CommandLog::new(log_capacity))),
        }
    }

    /// Apply a command and record it in the log.
    ///
    /// A payload that is not valid JSON fails before anything is recorded.
    pub fn handle(&self, command: CloudCommand) -> Result<CommandOutcome, CommandError> {
        let result = self.apply(&command);

        match &result {
            Ok(outcome) => tracing::info!("Command {} handled: {:?}", command.name, outcome),
            Err(e) => tracing::warn!("Command {} failed: {}", command.name, e),
        }

        if !matches!(result, Err(CommandError::InvalidPayload { .. })) {
            self.log.lock().push(LogEntry {
                timestamp: chrono::Utc::now(),
                event_name: command.name,
                event_data: command.request_payload,
            });
        }

        result
    }

    pub fn logs(&self) -> Vec<LogEntry> {
        self.log.lock().entries()
    }

    pub fn clear_logs(&self) {
        self.log.lock().clear();
    }

    fn apply(&self, command: &CloudCommand) -> Result<CommandOutcome, CommandError> {
        let payload: CommandPayload = match command.name.as_str() {
            ENABLE_DISABLE_COMMAND | SET_FREQUENCY_COMMAND => {
                serde_json::from_str(&command.request_payload).map_err(|source| {
                    CommandError::InvalidPayload {
                        name: command.name.clone(),
                        source,
                    }
                })?
            }
            other => {
                tracing::debug!("Ignoring unknown command {}", other);
                return Ok(CommandOutcome::Ignored);
            }
        };

        let Some(sensor_id) = payload.sensor.as_deref() else {
            return Ok(CommandOutcome::Ignored);
        };

        let (patch, reply) = Self::patch_for(&command.name, &payload);
        let source = self
            .registry
            .find(sensor_id)
            .ok_or_else(|| CommandError::UnknownSensor(sensor_id.to_string()))?;
        let sensor = source.configure(sensor_id, patch)?;

        Ok(CommandOutcome::Applied { reply, sensor })
    }

    fn patch_for(name: &str, payload: &CommandPayload) -> (SensorPatch, &'static str) {
        if name == ENABLE_DISABLE_COMMAND {
            let patch = SensorPatch {
                enabled: Some(payload.enable.unwrap_or(false)),
                ..Default::default()
            };
            (patch, "Enable")
        } else {
            let interval_ms = payload
                .frequency
                .filter(|f| *f != 0.0)
                .map(|f| (f * 1000.0).round() as u64)
                .unwrap_or(DEFAULT_INTERVAL_MS);
            let patch = SensorPatch {
                interval_ms: Some(interval_ms),
                ..Default::default()
            };
            (patch, "Frequency")
        }
    }
}
