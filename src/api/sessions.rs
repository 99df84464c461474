//! Session registry and driver tasks.
//!
//! Each session is a [`CrashSession`] behind a `tokio::sync::Mutex`: bets,
//! cash-outs and ticks all serialize on the same lock, so a cash-out and a
//! crash-detecting tick can never interleave mid-settlement. A per-session
//! driver task owns the clock, ticking the engine at the configured interval
//! and fanning events out over a broadcast channel for websocket subscribers.
//!
//! Closing a session aborts its driver before settling the round, so no tick
//! can land after teardown.

use crate::config::EngineConfig;
use crate::engine::{
    CrashPointGenerator, CrashSession, GrowthClock, OsEntropy, Round, RoundEvent, RoundPhase,
};
use crate::metrics::GameMetrics;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Buffered events per subscriber before lagging kicks in.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Event fanned out to websocket subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Periodic state sample, sent on every tick of a live round.
    Tick {
        snapshot: crate::engine::SessionSnapshot,
    },
    Milestone {
        value: u32,
    },
    CelebrationStarted {
        value: u32,
    },
    CelebrationEnded,
    Crashed {
        crash_point: f64,
    },
    RoundReset,
}

impl SessionEvent {
    fn from_round_event(event: &RoundEvent) -> Self {
        match event {
            RoundEvent::Milestone(value) => SessionEvent::Milestone { value: *value },
            RoundEvent::CelebrationStarted(value) => {
                SessionEvent::CelebrationStarted { value: *value }
            }
            RoundEvent::CelebrationEnded => SessionEvent::CelebrationEnded,
            RoundEvent::Crashed(crash_point) => SessionEvent::Crashed {
                crash_point: *crash_point,
            },
            RoundEvent::RoundReset => SessionEvent::RoundReset,
        }
    }
}

/// A live session: the engine state plus its event channel.
pub struct SessionHandle {
    pub session: Arc<Mutex<CrashSession<OsEntropy>>>,
    pub events: broadcast::Sender<SessionEvent>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    driver: JoinHandle<()>,
}

impl SessionHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}

/// Registry of live sessions keyed by session ID.
pub struct SessionRegistry {
    sessions: DashMap<Uuid, Arc<SessionHandle>>,
    engine_config: EngineConfig,
    metrics: Arc<GameMetrics>,
}

impl SessionRegistry {
    pub fn new(engine_config: EngineConfig, metrics: Arc<GameMetrics>) -> Self {
        Self {
            sessions: DashMap::new(),
            engine_config,
            metrics,
        }
    }

    /// Build a session from config and spawn its driver task.
    pub fn create(&self) -> (Uuid, Arc<SessionHandle>) {
        let cfg = &self.engine_config;
        let clock = GrowthClock::new(cfg.growth_rate);
        let round = Round::with_timing(
            clock,
            Duration::from_millis(cfg.cooldown_ms),
            Duration::from_millis(cfg.celebration_ms),
        );
        let odds = CrashPointGenerator::with_floor(OsEntropy, cfg.min_crash_point);
        let session = Arc::new(Mutex::new(CrashSession::with_options(
            round,
            odds,
            cfg.starting_balance,
            cfg.history_capacity,
        )));

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let id = Uuid::new_v4();
        let driver = spawn_driver(
            id,
            Arc::clone(&session),
            events.clone(),
            Duration::from_millis(cfg.tick_interval_ms),
            Arc::clone(&self.metrics),
        );

        let handle = Arc::new(SessionHandle {
            session,
            events,
            created_at: chrono::Utc::now(),
            driver,
        });
        self.sessions.insert(id, Arc::clone(&handle));

        self.metrics.sessions_created_total.inc();
        self.metrics.sessions_open.set(self.sessions.len() as i64);
        tracing::info!(session_id = %id, "session created");
        (id, handle)
    }

    pub fn get(&self, id: &Uuid) -> Option<Arc<SessionHandle>> {
        self.sessions.get(id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Tear down a session: stop the driver first, then settle any round in
    /// flight as a loss.
    pub async fn close(&self, id: &Uuid) -> bool {
        let Some((_, handle)) = self.sessions.remove(id) else {
            return false;
        };

        handle.driver.abort();
        handle.session.lock().await.abort_round();

        self.metrics.sessions_open.set(self.sessions.len() as i64);
        tracing::info!(session_id = %id, "session closed");
        true
    }

    /// Close every session. Used on server shutdown.
    pub async fn close_all(&self) {
        let ids: Vec<Uuid> = self.sessions.iter().map(|entry| *entry.key()).collect();
        for id in ids {
            self.close(&id).await;
        }
    }
}

fn spawn_driver(
    id: Uuid,
    session: Arc<Mutex<CrashSession<OsEntropy>>>,
    events: broadcast::Sender<SessionEvent>,
    tick_interval: Duration,
    metrics: Arc<GameMetrics>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tick_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            interval.tick().await;

            let mut session = session.lock().await;
            let round_events = session.tick(Instant::now());
            let live = session.round_phase() != RoundPhase::Idle;
            let snapshot = (live || !round_events.is_empty()).then(|| session.snapshot());
            drop(session);

            for event in &round_events {
                if let RoundEvent::Crashed(crash_point) = event {
                    metrics.rounds_crashed_total.inc();
                    tracing::debug!(session_id = %id, crash_point, "round crashed");
                }
                // Send errors just mean nobody is listening right now.
                let _ = events.send(SessionEvent::from_round_event(event));
            }
            if let Some(snapshot) = snapshot {
                let _ = events.send(SessionEvent::Tick { snapshot });
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::PlayerPhase;

    fn registry() -> SessionRegistry {
        let mut cfg = EngineConfig::default();
        // Fast ticks so driver-dependent tests settle quickly.
        cfg.tick_interval_ms = 1;
        SessionRegistry::new(cfg, Arc::new(GameMetrics::new()))
    }

    #[tokio::test]
    async fn test_create_and_get_session() {
        let registry = registry();
        let (id, _) = registry.create();

        let handle = registry.get(&id).expect("session exists");
        let session = handle.session.lock().await;
        assert_eq!(session.balance(), 1_000.0);
        assert_eq!(session.round_phase(), RoundPhase::Idle);
    }

    #[tokio::test]
    async fn test_close_settles_round_as_loss() {
        let registry = registry();
        let (id, handle) = registry.create();

        {
            let mut session = handle.session.lock().await;
            session.place_bet(100.0, Instant::now()).unwrap();
        }

        assert!(registry.close(&id).await);
        assert!(registry.get(&id).is_none());

        // The handle outlives the registry entry; the round settled as a loss.
        let session = handle.session.lock().await;
        assert_eq!(session.round_phase(), RoundPhase::Idle);
        assert_eq!(session.player_phase(), PlayerPhase::Idle);
        assert_eq!(session.balance(), 900.0);
    }

    #[tokio::test]
    async fn test_close_unknown_session() {
        let registry = registry();
        assert!(!registry.close(&Uuid::new_v4()).await);
    }

    #[tokio::test]
    async fn test_driver_broadcasts_ticks_for_live_round() {
        let registry = registry();
        let (_, handle) = registry.create();
        let mut rx = handle.subscribe();

        {
            let mut session = handle.session.lock().await;
            session.place_bet(10.0, Instant::now()).unwrap();
        }

        let event = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("driver produced an event")
            .expect("channel open");
        assert!(matches!(event, SessionEvent::Tick { .. }));
    }

    #[tokio::test]
    async fn test_sessions_open_gauge_tracks_registry() {
        let metrics = Arc::new(GameMetrics::new());
        let registry = SessionRegistry::new(EngineConfig::default(), Arc::clone(&metrics));

        let (a, _) = registry.create();
        let (_b, _) = registry.create();
        assert_eq!(metrics.sessions_open.get(), 2);

        registry.close(&a).await;
        assert_eq!(metrics.sessions_open.get(), 1);
        assert_eq!(metrics.sessions_created_total.get(), 2);
    }
}
