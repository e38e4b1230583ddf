// Sensor hub - In-process sample source with a simulated driver
use crate::application::sample_source::{
    DATA_AVAILABLE_EVENT, ListenerId, Sample, SampleSender, SampleSource, SensorPatch,
    SensorSettings, SourceError,
};
use crate::domain::reading::TelemetryValue;
use parking_lot::Mutex;
use rand::Rng;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum SensorKind {
    /// Single value wandering around `base`
    Scalar { base: f64, jitter: f64 },
    /// `{x, y, z}` reading, each axis within `[-range, range]`
    Vector { range: f64 },
}

#[derive(Debug, Clone, Deserialize)]
pub struct SensorSpec {
    pub id: String,
    pub kind: SensorKind,
    pub interval_ms: u64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl SensorSpec {
    pub fn scalar(id: &str, interval_ms: u64) -> Self {
        Self {
            id: id.to_string(),
            kind: SensorKind::Scalar { base: 20.0, jitter: 0.5 },
            interval_ms,
            enabled: true,
        }
    }

    pub fn vector(id: &str, interval_ms: u64) -> Self {
        Self {
            id: id.to_string(),
            kind: SensorKind::Vector { range: 1.0 },
            interval_ms,
            enabled: true,
        }
    }
}

struct SensorState {
    kind: SensorKind,
    enabled: bool,
    interval_ms: u64,
    last: Option<f64>,
}

impl SensorState {
    fn next_value<R: Rng>(&mut self, rng: &mut R) -> TelemetryValue {
        match self.kind {
            SensorKind::Scalar { base, jitter } => {
                let previous = self.last.unwrap_or(base);
                let step = if jitter > 0.0 { rng.random_range(-jitter..=jitter) } else { 0.0 };
                // drift back towards base so the walk stays bounded
                let value = previous + step + (base - previous) * 0.1;
                self.last = Some(value);
                TelemetryValue::from(value)
            }
            SensorKind::Vector { range } => {
                let mut axis = || if range > 0.0 { rng.random_range(-range..=range) } else { 0.0 };
                TelemetryValue::composite([("x", axis()), ("y", axis()), ("z", axis())])
            }
        }
    }
}

/// A named group of sensors sharing one event emitter
pub struct SensorHub {
    name: String,
    order: Vec<String>,
    sensors: Mutex<HashMap<String, SensorState>>,
    listeners: Mutex<HashMap<String, Vec<(ListenerId, SampleSender)>>>,
    next_listener: AtomicU64,
}

impl SensorHub {
    pub fn new(name: &str, specs: Vec<SensorSpec>) -> Self {
        let order = specs.iter().map(|s| s.id.clone()).collect();
        let sensors = specs
            .into_iter()
            .map(|s| {
                let state = SensorState {
                    kind: s.kind,
                    enabled: s.enabled,
                    interval_ms: s.interval_ms,
                    last: None,
                };
                (s.id, state)
            })
            .collect();

        Self {
            name: name.to_string(),
            order,
            sensors: Mutex::new(sensors),
            listeners: Mutex::new(HashMap::new()),
            next_listener: AtomicU64::new(1),
        }
    }

    pub fn settings(&self, sensor_id: &str) -> Option<SensorSettings> {
        self.sensors.lock().get(sensor_id).map(|s| SensorSettings {
            id: sensor_id.to_string(),
            enabled: s.enabled,
            interval_ms: s.interval_ms,
        })
    }

    /// Deliver a reading to every listener of `DATA_AVAILABLE`.
    /// Listeners whose receiving side is gone are dropped.
    pub fn emit(&self, sample: Sample) -> usize {
        let mut listeners = self.listeners.lock();
        let Some(list) = listeners.get_mut(DATA_AVAILABLE_EVENT) else {
            return 0;
        };
        list.retain(|(id, tx)| {
            let alive = tx.send(sample.clone()).is_ok();
            if !alive {
                tracing::debug!("Dropping closed listener {:?} on {}", id, self.name);
            }
            alive
        });
        list.len()
    }

    /// Produce one reading for `sensor_id` if it is enabled
    pub fn sample<R: Rng>(&self, sensor_id: &str, rng: &mut R) -> Option<Sample> {
        let mut sensors = self.sensors.lock();
        let state = sensors.get_mut(sensor_id)?;
        if !state.enabled {
            return None;
        }
        Some(Sample::new(sensor_id, state.next_value(rng)))
    }

    fn interval(&self, sensor_id: &str) -> Option<Duration> {
        self.sensors
            .lock()
            .get(sensor_id)
            .map(|s| Duration::from_millis(s.interval_ms))
    }

    /// Spawn one driver task per sensor. Interval changes apply from the next tick.
    pub fn spawn_simulation(self: &Arc<Self>) -> Vec<JoinHandle<()>> {
        self.order
            .iter()
            .cloned()
            .map(|sensor_id| {
                let hub = Arc::clone(self);
                tokio::spawn(async move {
                    tracing::info!("Simulating sensor {} on {}", sensor_id, hub.name);
                    while let Some(interval) = hub.interval(&sensor_id) {
                        tokio::time::sleep(interval).await;
                        let sample = hub.sample(&sensor_id, &mut rand::rng());
                        if let Some(sample) = sample {
                            hub.emit(sample);
                        }
                    }
                })
            })
            .collect()
    }
}

impl SampleSource for SensorHub {
    fn name(&self) -> &str {
        &self.name
    }

    fn provides(&self, telemetry_id: &str) -> bool {
        self.sensors.lock().contains_key(telemetry_id)
    }

    fn subscribe(&self, event: &str, listener: SampleSender) -> ListenerId {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .entry(event.to_string())
            .or_default()
            .push((id, listener));
        id
    }

    fn unsubscribe(&self, event: &str, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let Some(list) = listeners.get_mut(event) else {
            return false;
        };
        let before = list.len();
        list.retain(|(l, _)| *l != id);
        list.len() != before
    }

    fn sensors(&self) -> Vec<SensorSettings> {
        self.order.iter().filter_map(|id| self.settings(id)).collect()
    }

    fn configure(&self, sensor_id: &str, patch: SensorPatch) -> Result<SensorSettings, SourceError> {
        let mut sensors = self.sensors.lock();
        let state = sensors
            .get_mut(sensor_id)
            .ok_or_else(|| SourceError::UnknownSensor(sensor_id.to_string(), self.name.clone()))?;

        if let Some(interval_ms) = patch.interval_ms {
            if interval_ms == 0 {
                return Err(SourceError::InvalidInterval(sensor_id.to_string()));
            }
            state.interval_ms = interval_ms;
        }
        if let Some(enabled) = patch.enabled {
            state.enabled = enabled;
        }

        tracing::info!(
            "Sensor {} on {} now enabled={} interval={}ms",
            sensor_id, self.name, state.enabled, state.interval_ms
        );

        Ok(SensorSettings {
            id: sensor_id.to_string(),
            enabled: state.enabled,
            interval_ms: state.interval_ms,
        })
    }
}
