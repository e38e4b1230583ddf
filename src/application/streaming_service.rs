// Streaming insight service - One mounted session per connected chart
use crate::application::insight_session::{InsightSession, SessionOptions};
use crate::application::sample_source::SourceRegistry;
use crate::domain::reading::TelemetryValue;
use crate::infrastructure::wire_mapper::{WireSnapshot, snapshot_to_wire};
use std::time::Duration;
use tokio::sync::mpsc;

const FRAME_BUFFER: usize = 16;

#[derive(Clone)]
pub struct StreamingInsightService {
    registry: SourceRegistry,
    options: SessionOptions,
    tick: Duration,
}

impl StreamingInsightService {
    pub fn new(registry: SourceRegistry, options: SessionOptions, tick: Duration) -> Self {
        Self {
            registry,
            options,
            tick,
        }
    }

    /// Mount a session for `telemetry_id` and stream a snapshot every tick.
    ///
    /// Samples are merged as they arrive so each keeps its own elapsed time;
    /// the tick only decides when a frame goes out.
    /// The session lives inside the spawned task: once the receiver is
    /// dropped the next send fails, the task ends and the session
    /// unsubscribes from its source.
    pub fn stream_insight(
        &self,
        telemetry_id: &str,
        current_value: Option<TelemetryValue>,
    ) -> mpsc::Receiver<WireSnapshot> {
        let (tx, rx) = mpsc::channel(FRAME_BUFFER);
        let mut session =
            InsightSession::mount(self.registry.clone(), telemetry_id, current_value, &self.options);
        let mut ticker = tokio::time::interval(self.tick);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        tokio::spawn(async move {
            let since_ms = session.store().clock().start_ms();
            let mut frames = 0u64;
            let mut merged = 0usize;
            loop {
                tokio::select! {
                    stored = session.next_sample() => {
                        if stored.is_some() {
                            merged += 1;
                        }
                        continue;
                    }
                    _ = ticker.tick() => {}
                }
                let frame = snapshot_to_wire(&session.snapshot(), since_ms);
                tracing::trace!(
                    "Frame {} for {}: {} new samples, {} series",
                    frames,
                    session.telemetry_id(),
                    merged,
                    frame.data_sets.len()
                );
                if tx.send(frame).await.is_err() {
                    break;
                }
                frames += 1;
                merged = 0;
            }
            tracing::debug!("Insight stream for {} closed after {} frames", session.telemetry_id(), frames);
        });

        rx
    }
}
