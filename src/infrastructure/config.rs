use crate::application::series_store::DuplicatePolicy;
use crate::domain::window::{DEFAULT_LEADING_MS, DEFAULT_TRAILING_MS, WindowSpan};
use crate::infrastructure::sensor_hub::SensorSpec;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub window: WindowSettings,
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub stream: StreamSettings,
    #[serde(default)]
    pub log: LogSettings,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct WindowSettings {
    #[serde(default = "default_trailing_ms")]
    pub trailing_ms: i64,
    #[serde(default = "default_leading_ms")]
    pub leading_ms: i64,
}

fn default_trailing_ms() -> i64 {
    DEFAULT_TRAILING_MS
}

fn default_leading_ms() -> i64 {
    DEFAULT_LEADING_MS
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            trailing_ms: DEFAULT_TRAILING_MS,
            leading_ms: DEFAULT_LEADING_MS,
        }
    }
}

impl From<WindowSettings> for WindowSpan {
    fn from(settings: WindowSettings) -> Self {
        WindowSpan {
            trailing_ms: settings.trailing_ms,
            leading_ms: settings.leading_ms,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StoreSettings {
    #[serde(default)]
    pub duplicates: DuplicatePolicy,
    /// Fixed seed for series colors; random per session when absent
    pub color_seed: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StreamSettings {
    /// Render tick of the snapshot stream
    pub tick_ms: u64,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self { tick_ms: 250 }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogSettings {
    pub capacity: usize,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self { capacity: 500 }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    pub name: String,
    #[serde(default)]
    pub sensors: Vec<SensorSpec>,
}

impl AppConfig {
    /// Reject settings that would spin a driver or ticker with a zero period
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.stream.tick_ms == 0 {
            anyhow::bail!("stream.tick_ms must be greater than 0");
        }
        for source in &self.sources {
            if let Some(sensor) = source.sensors.iter().find(|s| s.interval_ms == 0) {
                anyhow::bail!(
                    "sensor {} of source {} has interval_ms = 0",
                    sensor.id,
                    source.name
                );
            }
        }
        Ok(())
    }
}

/// Load `config/insight.*` (optional) overlaid with `INSIGHT__*` environment variables
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/insight").required(false))
        .add_source(config::Environment::with_prefix("INSIGHT").separator("__"))
        .build()?;

    let mut app: AppConfig = settings.try_deserialize()?;
    if app.sources.is_empty() {
        tracing::info!("No sources configured, using the built-in simulated sensors");
        app.sources = default_sources();
    }
    app.validate()?;
    Ok(app)
}

fn default_sources() -> Vec<SourceConfig> {
    use crate::infrastructure::sensor_hub::SensorKind;

    let scalar = |id: &str, base: f64, jitter: f64, interval_ms: u64| SensorSpec {
        id: id.to_string(),
        kind: SensorKind::Scalar { base, jitter },
        interval_ms,
        enabled: true,
    };

    vec![
        SourceConfig {
            name: "environment".to_string(),
            sensors: vec![
                scalar("temperature", 21.0, 0.3, 1000),
                scalar("humidity", 45.0, 1.0, 2000),
                scalar("pressure", 1013.0, 0.5, 5000),
                SensorSpec::vector("accelerometer", 500),
                SensorSpec::vector("gyroscope", 500),
                SensorSpec::vector("magnetometer", 1000),
            ],
        },
        SourceConfig {
            name: "health".to_string(),
            sensors: vec![scalar("heartRate", 70.0, 2.0, 1000), scalar("steps", 0.0, 0.0, 5000)],
        },
    ]
}
