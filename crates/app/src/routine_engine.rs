//! Routine engine: runs routines and owns the registry of active sessions.
//!
//! Starting a routine snapshots its definition, snaps every fade track to its
//! first waypoint and spawns a periodic tick task. Each tick either finishes
//! the run (progress ≥ 1) or runs the track processors in definition order.
//!
//! The registry lock is only held for reads and mutations of the map, never
//! across an `.await`. A tick that finds its [`SessionId`] gone (cancelled or
//! restarted in the meantime) stops without issuing anything.

use std::collections::HashMap;
use std::future::Future;
use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use lumen_domain::error::{LumenError, NotFoundError};
use lumen_domain::event::{Event, EventType};
use lumen_domain::id::{RoutineId, SessionId};
use lumen_domain::light::{FINAL_TRANSITION_DECISECONDS, LightCommand, START_TRANSITION_DECISECONDS};
use lumen_domain::routine::{FadeSample, FadeTrack, RoutineDefinition, Track, validate_duration};
use lumen_domain::time::Timestamp;

use crate::dispatch::BestEffort;
use crate::ports::{DeviceControl, EventPublisher, RoutineRepository};
use crate::session::{RoutineSession, RoutineStatus, SessionProgress};
use crate::tracks::{self, Override};

/// Engine settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Time between two ticks of a running routine.
    pub tick_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(10),
        }
    }
}

/// Options for [`RoutineEngine::start`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct StartOptions {
    /// Run the whole routine in this many minutes instead of its own duration.
    #[serde(default)]
    pub test_duration_minutes: Option<f64>,
}

/// Returned by [`RoutineEngine::start`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StartedRoutine {
    pub id: RoutineId,
    pub name: String,
    pub duration_minutes: f64,
    pub ends_at: Timestamp,
}

/// Handle on a periodic background task.
#[derive(Debug)]
pub struct ScheduledTask {
    handle: JoinHandle<()>,
}

impl ScheduledTask {
    /// Stop the task; no further ticks run.
    pub fn cancel(self) {
        self.handle.abort();
    }

    /// Let go of the handle without aborting. Used by the task itself when it
    /// ends its own session and is about to return.
    fn release(self) {
        drop(self.handle);
    }
}

/// Run `tick` every `interval`, starting one interval from now, until it
/// returns [`ControlFlow::Break`].
pub fn schedule_every<F, Fut>(interval: Duration, mut tick: F) -> ScheduledTask
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ControlFlow<()>> + Send + 'static,
{
    // interval_at panics on a zero period
    let period = interval.max(Duration::from_millis(1));
    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if tick().await.is_break() {
                break;
            }
        }
    });
    ScheduledTask { handle }
}

struct ActiveSession {
    session: RoutineSession,
    task: Option<ScheduledTask>,
}

impl ActiveSession {
    fn cancel(self) -> RoutineSession {
        if let Some(task) = self.task {
            task.cancel();
        }
        self.session
    }

    fn release(self) -> RoutineSession {
        if let Some(task) = self.task {
            task.release();
        }
        self.session
    }
}

enum TickStep {
    Gone,
    Completed(RoutineSession),
    Running(RoutineSession),
}

/// Runs routines. Cheap to clone; clones share the same registry.
pub struct RoutineEngine<D, R, P> {
    inner: Arc<Inner<D, R, P>>,
}

impl<D, R, P> Clone for RoutineEngine<D, R, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<D, R, P> {
    dispatch: BestEffort<D>,
    repo: R,
    publisher: P,
    config: EngineConfig,
    sessions: Mutex<HashMap<RoutineId, ActiveSession>>,
}

impl<D, R, P> RoutineEngine<D, R, P>
where
    D: DeviceControl + Send + Sync + 'static,
    R: RoutineRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    pub fn new(device: Arc<D>, repo: R, publisher: P, config: EngineConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                dispatch: BestEffort::new(device),
                repo,
                publisher,
                config,
                sessions: Mutex::new(HashMap::new()),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> EngineConfig {
        self.inner.config
    }

    /// Start a routine, replacing any run of the same routine.
    ///
    /// # Errors
    ///
    /// Returns [`LumenError::NotFound`] for an unknown id,
    /// [`LumenError::Validation`] when the test or stored duration is not
    /// positive or longer than a year, or a storage error from the
    /// repository. Nothing changes in those cases.
    #[tracing::instrument(skip_all, fields(routine_id = %routine_id))]
    pub async fn start(
        &self,
        routine_id: &RoutineId,
        options: StartOptions,
    ) -> Result<StartedRoutine, LumenError> {
        if let Some(minutes) = options.test_duration_minutes {
            validate_duration(minutes)?;
        }
        let definition = self
            .inner
            .repo
            .get_by_id(routine_id)
            .await?
            .ok_or_else(|| NotFoundError {
                entity: "Routine",
                id: routine_id.to_string(),
            })?;
        let definition = Arc::new(definition);
        let effective = options
            .test_duration_minutes
            .unwrap_or(definition.duration_minutes);
        validate_duration(effective)?;

        let mut session =
            RoutineSession::new(Arc::clone(&definition), effective, self.inner.config.tick_interval);
        let session_id = session.session_id;
        let started = StartedRoutine {
            id: routine_id.clone(),
            name: definition.name.clone(),
            duration_minutes: effective,
            ends_at: session.ends_at(),
        };

        let initial = snap_commands(&definition, START_TRANSITION_DECISECONDS, FadeTrack::initial);
        for command in &initial {
            session.record_expected(command.light_id.clone(), command.brightness.unwrap_or_default());
        }

        let replaced = {
            let mut sessions = self.inner.sessions();
            let replaced = sessions.insert(
                routine_id.clone(),
                ActiveSession {
                    session,
                    task: None,
                },
            );
            self.inner.dispatch.send_all(initial, "initial");
            replaced
        };
        if let Some(previous) = replaced {
            let previous = previous.cancel();
            self.inner.announce_cancelled(&previous, "restarted").await;
        }

        let task = {
            let inner = Arc::clone(&self.inner);
            let routine_id = routine_id.clone();
            schedule_every(self.inner.config.tick_interval, move || {
                let inner = Arc::clone(&inner);
                let routine_id = routine_id.clone();
                async move { inner.tick(&routine_id, session_id).await }
            })
        };
        let orphan = {
            let mut sessions = self.inner.sessions();
            match sessions.get_mut(routine_id) {
                Some(active) if active.session.session_id == session_id => {
                    active.task = Some(task);
                    None
                }
                _ => Some(task),
            }
        };
        if let Some(task) = orphan {
            task.cancel();
        }

        tracing::info!(
            name = %started.name,
            duration_minutes = started.duration_minutes,
            lights = definition.lights().len(),
            "routine started"
        );
        self.inner
            .publish(Event::new(
                EventType::RoutineStarted,
                Some(routine_id.clone()),
                serde_json::json!({
                    "name": started.name,
                    "duration_minutes": started.duration_minutes,
                    "ends_at": started.ends_at,
                    "session_id": session_id,
                }),
            ))
            .await;
        Ok(started)
    }

    /// Stop a running routine. Returns `false` if it was not running.
    #[tracing::instrument(skip_all, fields(routine_id = %routine_id))]
    pub async fn cancel(&self, routine_id: &RoutineId) -> bool {
        let removed = self.inner.sessions().remove(routine_id);
        let Some(active) = removed else {
            return false;
        };
        let session = active.cancel();
        self.inner.announce_cancelled(&session, "cancelled").await;
        true
    }

    /// Stop every running routine.
    pub async fn cancel_all(&self) -> usize {
        let drained: Vec<ActiveSession> = self.inner.sessions().drain().map(|(_, a)| a).collect();
        let count = drained.len();
        for active in drained {
            let session = active.cancel();
            self.inner.announce_cancelled(&session, "shutdown").await;
        }
        count
    }

    #[must_use]
    pub fn status(&self, routine_id: &RoutineId) -> RoutineStatus {
        let now = Instant::now();
        self.inner
            .sessions()
            .get(routine_id)
            .map_or_else(RoutineStatus::inactive, |active| {
                RoutineStatus::active(active.session.progress_report(now))
            })
    }

    /// Progress of every running routine, ordered by id.
    #[must_use]
    pub fn active_statuses(&self) -> Vec<SessionProgress> {
        let now = Instant::now();
        let mut statuses: Vec<SessionProgress> = self
            .inner
            .sessions()
            .values()
            .map(|active| active.session.progress_report(now))
            .collect();
        statuses.sort_by(|a, b| a.id.cmp(&b.id));
        statuses
    }

    #[must_use]
    pub fn is_active(&self, routine_id: &RoutineId) -> bool {
        self.inner.sessions().contains_key(routine_id)
    }
}

impl<D, R, P> Inner<D, R, P>
where
    D: DeviceControl + Send + Sync + 'static,
    R: RoutineRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    fn sessions(&self) -> MutexGuard<'_, HashMap<RoutineId, ActiveSession>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn tick(&self, routine_id: &RoutineId, session_id: SessionId) -> ControlFlow<()> {
        let now = Instant::now();
        let step = {
            let mut sessions = self.sessions();
            match sessions
                .get_mut(routine_id)
                .filter(|active| active.session.session_id == session_id)
            {
                None => TickStep::Gone,
                Some(active) => {
                    active.session.tick_count += 1;
                    if active.session.progress(now) < 1.0 {
                        TickStep::Running(active.session.clone())
                    } else {
                        let session = sessions
                            .remove(routine_id)
                            .map(ActiveSession::release);
                        session.map_or(TickStep::Gone, |session| {
                            self.dispatch.send_all(
                                snap_commands(
                                    &session.definition,
                                    FINAL_TRANSITION_DECISECONDS,
                                    FadeTrack::last,
                                ),
                                "final",
                            );
                            TickStep::Completed(session)
                        })
                    }
                }
            }
        };

        match step {
            TickStep::Gone => ControlFlow::Break(()),
            TickStep::Completed(session) => {
                tracing::info!(
                    %routine_id,
                    name = %session.definition.name,
                    ticks = session.tick_count,
                    "routine completed"
                );
                self.publish(Event::new(
                    EventType::RoutineCompleted,
                    Some(routine_id.clone()),
                    serde_json::json!({
                        "name": session.definition.name,
                        "duration_minutes": session.effective_duration_minutes,
                        "ticks": session.tick_count,
                    }),
                ))
                .await;
                ControlFlow::Break(())
            }
            TickStep::Running(snapshot) => self.run_tracks(&snapshot, now).await,
        }
    }

    async fn run_tracks(&self, snapshot: &RoutineSession, now: Instant) -> ControlFlow<()> {
        let routine_id = snapshot.routine_id();
        let definition = &snapshot.definition;
        let elapsed_minutes = snapshot.elapsed(now).as_secs_f64() / 60.0;
        let time_scale = snapshot.time_scale();
        let transition = tracks::fade::tick_transition(snapshot.tick_interval);
        let check_overrides =
            definition.override_detection && tracks::fade::is_override_check_tick(snapshot.tick_count);

        tracing::debug!(
            %routine_id,
            tick = snapshot.tick_count,
            elapsed_minutes,
            "routine tick"
        );

        for track in &definition.tracks {
            match track {
                Track::Fade(fade) => {
                    let Some(step) = tracks::fade::plan(fade, elapsed_minutes, time_scale, transition)
                    else {
                        continue;
                    };
                    if check_overrides
                        && let Some(found) = tracks::fade::detect_override(
                            self.dispatch.device(),
                            fade,
                            &snapshot.last_expected_brightness,
                        )
                        .await
                    {
                        self.handle_override(routine_id, snapshot.session_id, found).await;
                        return ControlFlow::Break(());
                    }

                    let mut sessions = self.sessions();
                    let Some(active) = sessions
                        .get_mut(routine_id)
                        .filter(|active| active.session.session_id == snapshot.session_id)
                    else {
                        return ControlFlow::Break(());
                    };
                    for command in step.commands {
                        active
                            .session
                            .record_expected(command.light_id.clone(), step.brightness);
                        self.dispatch.send(command, "fade");
                    }
                }
                Track::Instant(instant) => {
                    let Some(fire) = tracks::instant::plan(
                        instant,
                        elapsed_minutes,
                        time_scale,
                        &snapshot.fired_instants,
                    ) else {
                        continue;
                    };
                    let fired = {
                        let mut sessions = self.sessions();
                        let Some(active) = sessions
                            .get_mut(routine_id)
                            .filter(|active| active.session.session_id == snapshot.session_id)
                        else {
                            return ControlFlow::Break(());
                        };
                        let first = active.session.mark_fired(fire.key.clone());
                        if first {
                            self.dispatch.send_all(fire.commands, "instant");
                        }
                        first
                    };
                    if fired {
                        tracing::info!(%routine_id, key = %fire.key, time = instant.time, "instant event fired");
                        self.publish(Event::new(
                            EventType::InstantFired,
                            Some(routine_id.clone()),
                            serde_json::json!({
                                "key": fire.key,
                                "time": instant.time,
                                "lights": instant.lights,
                            }),
                        ))
                        .await;
                    }
                }
            }
        }
        ControlFlow::Continue(())
    }

    async fn handle_override(&self, routine_id: &RoutineId, session_id: SessionId, found: Override) {
        let removed = {
            let mut sessions = self.sessions();
            let current = sessions
                .get(routine_id)
                .is_some_and(|active| active.session.session_id == session_id);
            if current { sessions.remove(routine_id) } else { None }
        };
        let Some(active) = removed else {
            return;
        };
        let session = active.release();

        tracing::info!(
            %routine_id,
            light_id = %found.light_id,
            reason = %found.reason,
            "manual override detected, cancelling routine"
        );
        let mut data = serde_json::json!({ "light_id": found.light_id });
        if let (Some(data), Ok(serde_json::Value::Object(reason))) =
            (data.as_object_mut(), serde_json::to_value(found.reason))
        {
            data.extend(reason);
        }
        self.publish(Event::new(
            EventType::OverrideDetected,
            Some(routine_id.clone()),
            data,
        ))
        .await;
        self.announce_cancelled(&session, "override").await;
    }

    async fn announce_cancelled(&self, session: &RoutineSession, reason: &'static str) {
        tracing::info!(
            routine_id = %session.routine_id(),
            name = %session.definition.name,
            reason,
            "routine cancelled"
        );
        self.publish(Event::new(
            EventType::RoutineCancelled,
            Some(session.routine_id().clone()),
            serde_json::json!({
                "name": session.definition.name,
                "reason": reason,
                "ticks": session.tick_count,
            }),
        ))
        .await;
    }

    async fn publish(&self, event: Event) {
        let event_type = event.event_type;
        if let Err(err) = self.publisher.publish(event).await {
            tracing::warn!(%event_type, error = ?err, "failed to publish event");
        }
    }
}

/// One command per light of every fade track, using the sample `pick` returns.
fn snap_commands(
    definition: &RoutineDefinition,
    transition_deciseconds: u16,
    pick: impl Fn(&FadeTrack) -> Option<FadeSample>,
) -> Vec<LightCommand> {
    definition
        .fade_tracks()
        .filter_map(|track| pick(track).map(|sample| (track, sample)))
        .flat_map(|(track, sample)| {
            track.lights.iter().map(move |light| {
                LightCommand::on(light.clone(), sample.brightness, sample.color)
                    .with_transition(transition_deciseconds)
            })
        })
        .collect()
}
