// Sensor insight - Live telemetry aggregation for chart consumers
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
