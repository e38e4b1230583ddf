// Insight session - One watched telemetry stream for the lifetime of a view
use crate::application::sample_source::{
    DATA_AVAILABLE_EVENT, ListenerId, Sample, SampleSource, SourceRegistry,
};
use crate::application::series_store::{
    ColorSource, DuplicatePolicy, InsightSnapshot, RandomColors, SeriesStore,
};
use crate::domain::reading::TelemetryValue;
use crate::domain::window::{Clock, SessionClock, WindowSpan};
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Clone)]
pub struct SessionOptions {
    pub span: WindowSpan,
    pub policy: DuplicatePolicy,
    pub color_seed: Option<u64>,
    pub clock: Arc<dyn Clock>,
}

impl SessionOptions {
    fn colors(&self) -> Box<dyn ColorSource> {
        match self.color_seed {
            Some(seed) => Box::new(RandomColors::seeded(seed)),
            None => Box::new(RandomColors::from_entropy()),
        }
    }
}

struct Subscription {
    source: Arc<dyn SampleSource>,
    listener: ListenerId,
}

/// Owns the series store and is its only writer.
///
/// Sources push samples into the session's queue; [`InsightSession::pump`]
/// or [`InsightSession::next_sample`] merge them. Dropping the session
/// unsubscribes from its source.
pub struct InsightSession {
    registry: SourceRegistry,
    store: SeriesStore,
    subscription: Option<Subscription>,
    tx: mpsc::UnboundedSender<Sample>,
    rx: mpsc::UnboundedReceiver<Sample>,
}

impl InsightSession {
    pub fn mount(
        registry: SourceRegistry,
        telemetry_id: &str,
        current_value: Option<TelemetryValue>,
        options: &SessionOptions,
    ) -> Self {
        let clock = SessionClock::start(options.clock.clone());
        let store = SeriesStore::new(telemetry_id, clock, options.colors())
            .with_span(options.span)
            .with_policy(options.policy);
        let (tx, rx) = mpsc::unbounded_channel();

        let mut session = Self {
            registry,
            store,
            subscription: None,
            tx,
            rx,
        };
        session.attach(current_value);
        tracing::info!("Mounted insight session for {}", telemetry_id);
        session
    }

    pub fn telemetry_id(&self) -> &str {
        self.store.telemetry_id()
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// Watch another telemetry id: unsubscribe, reset, resubscribe
    pub fn retarget(&mut self, telemetry_id: &str, current_value: Option<TelemetryValue>) {
        if self.store.telemetry_id() == telemetry_id {
            return;
        }
        self.detach();
        self.store.watch(telemetry_id);
        // samples queued for the previous id are dropped by the decomposer
        self.attach(current_value);
    }

    /// Merge every queued sample. Returns the number of samples processed.
    pub fn pump(&mut self) -> usize {
        let mut processed = 0;
        while let Ok(sample) = self.rx.try_recv() {
            self.apply(sample);
            processed += 1;
        }
        processed
    }

    /// Wait for the next sample and merge it
    pub async fn next_sample(&mut self) -> Option<usize> {
        let sample = self.rx.recv().await?;
        Some(self.apply(sample))
    }

    pub fn snapshot(&self) -> InsightSnapshot {
        self.store.snapshot()
    }

    pub fn store(&self) -> &SeriesStore {
        &self.store
    }

    fn apply(&mut self, sample: Sample) -> usize {
        let now = self.store.clock().now_ms();
        self.store.ingest_sample(&sample.telemetry_id, &sample.value, now)
    }

    fn attach(&mut self, current_value: Option<TelemetryValue>) {
        let telemetry_id = self.store.telemetry_id().to_string();
        match self.registry.find(&telemetry_id) {
            Some(source) => {
                let listener = source.subscribe(DATA_AVAILABLE_EVENT, self.tx.clone());
                tracing::debug!("Subscribed to {} on source {}", telemetry_id, source.name());
                self.subscription = Some(Subscription { source, listener });
            }
            None => {
                tracing::warn!("No sample source provides {}", telemetry_id);
            }
        }

        if let Some(value) = current_value {
            let now = self.store.clock().now_ms();
            self.store.ingest_sample(&telemetry_id, &value, now);
        }
    }

    fn detach(&mut self) {
        if let Some(sub) = self.subscription.take() {
            if !sub.source.unsubscribe(DATA_AVAILABLE_EVENT, sub.listener) {
                tracing::warn!("Listener for {} was already gone from {}", self.store.telemetry_id(), sub.source.name());
            }
        }
    }
}

impl Drop for InsightSession {
    fn drop(&mut self) {
        self.detach();
        tracing::info!("Unmounted insight session for {}", self.store.telemetry_id());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::sample_source::fake::FakeSource;
    use crate::domain::reading::Reading;
    use crate::domain::window::ManualClock;

    const T0: i64 = 1_700_000_000_000;

    fn setup() -> (SourceRegistry, Arc<FakeSource>, Arc<FakeSource>, ManualClock, SessionOptions) {
        let env = Arc::new(FakeSource::new("environment", &["temperature", "humidity"]));
        let motion = Arc::new(FakeSource::new("motion", &["accel"]));
        let mut registry = SourceRegistry::new();
        registry.register(env.clone());
        registry.register(motion.clone());
        let clock = ManualClock::at(T0);
        let options = SessionOptions {
            span: WindowSpan::default(),
            policy: DuplicatePolicy::Faithful,
            color_seed: Some(1),
            clock: Arc::new(clock.clone()),
        };
        (registry, env, motion, clock, options)
    }

    #[test]
    fn test_mount_subscribes_and_drop_unsubscribes() {
        let (registry, env, motion, _, options) = setup();
        let session = InsightSession::mount(registry, "temperature", None, &options);
        assert!(session.is_subscribed());
        assert_eq!(env.listener_count(), 1);
        assert_eq!(motion.listener_count(), 0);

        drop(session);
        assert_eq!(env.listener_count(), 0);
    }

    #[test]
    fn test_current_value_seeds_first_sample() {
        let (registry, _, _, _, options) = setup();
        let session = InsightSession::mount(registry, "temperature", Some(19.0.into()), &options);
        let snapshot = session.snapshot();
        assert!(!snapshot.is_loading());
        let series = snapshot.series.get("temperature").unwrap();
        assert_eq!(series.points.len(), 1);
        assert_eq!(series.points[0].elapsed_ms, 0);
    }

    #[test]
    fn test_pump_merges_emitted_samples() {
        let (registry, env, _, clock, options) = setup();
        let mut session = InsightSession::mount(registry, "temperature", None, &options);

        env.emit(Sample::new("humidity", 40.0));
        assert_eq!(session.pump(), 1);
        assert!(session.snapshot().is_loading());

        clock.advance(1_000);
        env.emit(Sample::new("temperature", 21.5));
        clock.advance(1_000);
        session.pump();
        env.emit(Sample::new("temperature", 22.0));
        session.pump();

        let snapshot = session.snapshot();
        let series = snapshot.series.get("temperature").unwrap();
        let values: Vec<Reading> = series.points.iter().map(|p| p.value.clone()).collect();
        assert_eq!(values, vec![Reading::Number(21.5), Reading::Number(22.0)]);
        // stamped when merged, not when emitted
        assert_eq!(series.points[0].elapsed_ms, 2_000);
    }

    #[test]
    fn test_retarget_resets_and_moves_subscription() {
        let (registry, env, motion, _, options) = setup();
        let mut session = InsightSession::mount(registry, "temperature", Some(20.0.into()), &options);

        session.retarget("accel", None);
        assert_eq!(env.listener_count(), 0);
        assert_eq!(motion.listener_count(), 1);
        assert!(session.snapshot().is_loading());

        motion.emit(Sample::new("accel", TelemetryValue::composite([("x", 1.0), ("y", 2.0), ("z", 3.0)])));
        session.pump();
        assert_eq!(session.snapshot().series.ids(), vec!["accel.x", "accel.y", "accel.z"]);
    }

    #[test]
    fn test_unknown_source_stays_empty() {
        let (registry, _, _, _, options) = setup();
        let session = InsightSession::mount(registry, "gps", None, &options);
        assert!(!session.is_subscribed());
        assert!(session.snapshot().is_loading());
    }

    #[tokio::test]
    async fn test_next_sample_waits_for_emission() {
        let (registry, env, _, _, options) = setup();
        let mut session = InsightSession::mount(registry, "humidity", None, &options);

        let emitter = env.clone();
        tokio::spawn(async move {
            emitter.emit(Sample::new("humidity", 55.0));
        });

        assert_eq!(session.next_sample().await, Some(1));
        assert_eq!(session.snapshot().series.len(), 1);
    }
}
