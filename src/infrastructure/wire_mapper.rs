// Mapper to convert domain models to JSON wire types
use crate::application::command_service::CommandOutcome;
use crate::application::sample_source::{SampleSource, SensorSettings};
use crate::application::series_store::InsightSnapshot;
use crate::domain::command_log::LogEntry;
use crate::domain::gauge::Gauge;
use crate::domain::reading::Reading;
use crate::domain::series::Series;
use crate::domain::window::VisibleWindow;
use serde::Serialize;

#[derive(Debug, Serialize, PartialEq)]
#[serde(untagged)]
pub enum WireValue {
    Number(f64),
    Text(String),
}

#[derive(Debug, Serialize)]
pub struct WirePoint {
    pub x: u64,
    pub y: WireValue,
}

#[derive(Debug, Serialize)]
pub struct WireSeries {
    pub id: String,
    pub label: String,
    pub color: String,
    pub values: Vec<WirePoint>,
}

#[derive(Debug, Serialize)]
pub struct WireGauge {
    pub id: String,
    pub fill: f64,
    pub tint: String,
    pub background: String,
    pub caption: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireSnapshot {
    pub telemetry_id: String,
    /// Wall-clock start of the session; the x values are relative to it
    pub since_ms: i64,
    pub elapsed_ms: u64,
    pub loading: bool,
    pub window: VisibleWindow,
    pub data_sets: Vec<WireSeries>,
    pub gauges: Vec<WireGauge>,
}

#[derive(Debug, Serialize)]
pub struct WireSource {
    pub name: String,
    pub sensors: Vec<SensorSettings>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireLogEntry {
    pub timestamp: String,
    pub event_name: String,
    pub event_data: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WireCommandReply {
    Success {
        message: &'static str,
        sensor: SensorSettings,
    },
    Ignored,
}

fn reading_to_wire(value: &Reading) -> WireValue {
    match value {
        Reading::Number(v) => WireValue::Number(*v),
        Reading::Text(s) => WireValue::Text(s.clone()),
    }
}

fn series_to_wire(series: &Series) -> WireSeries {
    WireSeries {
        id: series.id.clone(),
        label: series.label.clone(),
        color: series.color.to_hex(),
        values: series
            .points
            .iter()
            .map(|p| WirePoint {
                x: p.elapsed_ms,
                y: reading_to_wire(&p.value),
            })
            .collect(),
    }
}

fn gauge_to_wire(gauge: &Gauge) -> WireGauge {
    WireGauge {
        id: gauge.id.clone(),
        fill: gauge.fill,
        tint: gauge.tint.to_hex(),
        background: gauge.background.to_hex(),
        caption: gauge.caption.clone(),
    }
}

pub fn snapshot_to_wire(snapshot: &InsightSnapshot, since_ms: i64) -> WireSnapshot {
    WireSnapshot {
        telemetry_id: snapshot.telemetry_id.clone(),
        since_ms,
        elapsed_ms: snapshot.elapsed_ms,
        loading: snapshot.is_loading(),
        window: snapshot.window,
        data_sets: snapshot.series.iter().map(|s| series_to_wire(s)).collect(),
        gauges: snapshot.gauges.iter().map(gauge_to_wire).collect(),
    }
}

pub fn source_to_wire(source: &dyn SampleSource) -> WireSource {
    WireSource {
        name: source.name().to_string(),
        sensors: source.sensors(),
    }
}

pub fn log_entry_to_wire(entry: LogEntry) -> WireLogEntry {
    WireLogEntry {
        timestamp: entry.timestamp.to_rfc3339(),
        event_name: entry.event_name,
        event_data: entry.event_data,
    }
}

pub fn outcome_to_wire(outcome: CommandOutcome) -> WireCommandReply {
    match outcome {
        CommandOutcome::Applied { reply, sensor } => WireCommandReply::Success {
            message: reply,
            sensor,
        },
        CommandOutcome::Ignored => WireCommandReply::Ignored,
    }
}
