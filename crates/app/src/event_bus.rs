//! In-process event bus backed by a tokio broadcast channel.

use std::future::Future;

use tokio::sync::broadcast;

use lumen_domain::error::LumenError;
use lumen_domain::event::Event;

use crate::ports::EventPublisher;

/// In-process event bus using a tokio [`broadcast`] channel.
///
/// Publishing succeeds even when there are no active subscribers
/// (the event is simply dropped).
pub struct InProcessEventBus {
    sender: broadcast::Sender<Event>,
}

impl InProcessEventBus {
    /// Create a new event bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events on this bus.
    ///
    /// Returns a receiver that will get all events published *after*
    /// the subscription is created.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl EventPublisher for InProcessEventBus {
    fn publish(&self, event: Event) -> impl Future<Output = Result<(), LumenError>> + Send {
        tracing::trace!(event_type = %event.event_type, "publishing event");
        // zero receivers is the only failure mode
        let _ = self.sender.send(event);
        async { Ok(()) }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::routine_engine::{EngineConfig, RoutineEngine, StartOptions};
    use crate::testing::{InMemoryRoutineRepo, RecordingDevice, settle};
    use lumen_domain::event::EventType;
    use lumen_domain::id::{LightId, RoutineId};
    use lumen_domain::light::LightStateSpec;
    use lumen_domain::routine::{FadeTrack, InstantTrack, RoutineDefinition, Track, Waypoint};

    fn light(id: &str) -> LightId {
        LightId::new(id).unwrap()
    }

    /// One minute wake-up: hall fades in, porch switches on at 30 seconds.
    fn wake_up() -> RoutineDefinition {
        RoutineDefinition::builder()
            .name("Wake up")
            .duration_minutes(1.0)
            .track(Track::Fade(FadeTrack {
                lights: vec![light("hall")],
                waypoints: vec![Waypoint::new(0.0, 1), Waypoint::new(1.0, 254)],
            }))
            .track(Track::Instant(InstantTrack {
                lights: vec![light("porch")],
                time: 0.5,
                state: LightStateSpec {
                    on: Some(true),
                    ..LightStateSpec::default()
                },
            }))
            .build()
            .unwrap()
    }

    fn engine_on(
        bus: &Arc<InProcessEventBus>,
    ) -> RoutineEngine<RecordingDevice, InMemoryRoutineRepo, Arc<InProcessEventBus>> {
        RoutineEngine::new(
            Arc::new(RecordingDevice::default()),
            InMemoryRoutineRepo::with([wake_up()]),
            Arc::clone(bus),
            EngineConfig::default(),
        )
    }

    fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<EventType> {
        let mut types = Vec::new();
        while let Ok(event) = rx.try_recv() {
            types.push(event.event_type);
        }
        types
    }

    #[tokio::test(start_paused = true)]
    async fn should_stream_routine_lifecycle_to_every_subscriber_in_order() {
        let bus = Arc::new(InProcessEventBus::new(16));
        let engine = engine_on(&bus);
        let mut dashboard = bus.subscribe();
        let mut logger = bus.subscribe();

        engine
            .start(&RoutineId::new("wake_up").unwrap(), StartOptions::default())
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(61)).await;
        settle().await;

        let expected = vec![
            EventType::RoutineStarted,
            EventType::InstantFired,
            EventType::RoutineCompleted,
        ];
        assert_eq!(drain(&mut dashboard), expected);
        assert_eq!(drain(&mut logger), expected);
    }

    #[tokio::test(start_paused = true)]
    async fn should_tag_lifecycle_events_with_the_routine() {
        let bus = Arc::new(InProcessEventBus::new(16));
        let engine = engine_on(&bus);
        let mut rx = bus.subscribe();
        let id = RoutineId::new("wake_up").unwrap();

        engine.start(&id, StartOptions::default()).await.unwrap();
        engine.cancel(&id).await;

        let started = rx.recv().await.unwrap();
        assert_eq!(started.routine_id.as_ref(), Some(&id));
        assert_eq!(started.data["name"], "Wake up");
        let cancelled = rx.recv().await.unwrap();
        assert_eq!(cancelled.event_type, EventType::RoutineCancelled);
        assert_eq!(cancelled.routine_id.as_ref(), Some(&id));
    }

    #[tokio::test(start_paused = true)]
    async fn should_only_see_events_after_subscribing() {
        let bus = Arc::new(InProcessEventBus::new(16));
        let engine = engine_on(&bus);
        let id = RoutineId::new("wake_up").unwrap();

        engine.start(&id, StartOptions::default()).await.unwrap();
        let mut late = bus.subscribe();
        engine.cancel(&id).await;

        assert_eq!(drain(&mut late), vec![EventType::RoutineCancelled]);
    }

    #[tokio::test(start_paused = true)]
    async fn should_keep_running_routines_without_subscribers() {
        let bus = Arc::new(InProcessEventBus::new(16));
        let engine = engine_on(&bus);
        let id = RoutineId::new("wake_up").unwrap();

        assert_eq!(bus.subscriber_count(), 0);
        engine.start(&id, StartOptions::default()).await.unwrap();

        assert!(engine.is_active(&id));
    }

    #[tokio::test(start_paused = true)]
    async fn should_report_lag_to_a_slow_subscriber_and_resume_with_newest() {
        let bus = Arc::new(InProcessEventBus::new(2));
        let engine = engine_on(&bus);
        let mut slow = bus.subscribe();
        let id = RoutineId::new("wake_up").unwrap();

        // each restart publishes cancelled then started
        for _ in 0..3 {
            engine.start(&id, StartOptions::default()).await.unwrap();
        }

        assert!(matches!(
            slow.recv().await,
            Err(broadcast::error::RecvError::Lagged(_))
        ));
        assert_eq!(
            drain(&mut slow),
            vec![EventType::RoutineCancelled, EventType::RoutineStarted]
        );
    }

    #[test]
    fn should_count_live_subscribers() {
        let bus = InProcessEventBus::new(16);
        let rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);
        drop(rx);
        assert_eq!(bus.subscriber_count(), 0);
    }
}
