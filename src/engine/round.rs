//! Round state machine.
//!
//! Lifecycle: `Idle -> Running -> Crashed -> (cooldown) -> Idle`. All timing
//! state (cooldown, celebration window) lives in the round as deadlines and
//! is checked by [`Round::advance`], never by detached timers. Tearing down
//! a round can therefore never leave a callback behind to mutate freed state.
//!
//! `advance` is the single tick entry point: the host scheduler (driver task,
//! test harness) calls it with the current instant and reacts to the events
//! it returns.

use crate::engine::clock::GrowthClock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

/// Milestones that arm the celebration flag when crossed.
pub const CELEBRATION_MILESTONES: [u32; 6] = [2, 5, 10, 20, 50, 100];

/// How long the celebration flag stays armed unless retriggered.
pub const CELEBRATION_WINDOW: Duration = Duration::from_millis(800);

/// Pause between a crash and the next biddable round.
pub const ROUND_COOLDOWN: Duration = Duration::from_secs(3);

/// Round lifecycle phase.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RoundPhase {
    Idle,
    Running,
    Crashed,
}

impl fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundPhase::Idle => write!(f, "idle"),
            RoundPhase::Running => write!(f, "running"),
            RoundPhase::Crashed => write!(f, "crashed"),
        }
    }
}

/// Events emitted by a tick, in the order they occurred.
#[derive(Debug, Clone, PartialEq)]
pub enum RoundEvent {
    /// The integer part of the multiplier moved past a new milestone.
    Milestone(u32),
    /// A celebration-worthy milestone armed (or re-armed) the celebration flag.
    CelebrationStarted(u32),
    /// The celebration window expired without being retriggered.
    CelebrationEnded,
    /// The multiplier reached the drawn crash point; carries the final value.
    Crashed(f64),
    /// The post-crash cooldown finished; the round is biddable again.
    RoundReset,
}

/// One play cycle of the game.
///
/// The crash point is drawn once at start and immutable for the round's
/// lifetime; the multiplier is monotonically non-decreasing while running and
/// frozen at exactly the crash point once crashed.
#[derive(Debug, Clone)]
pub struct Round {
    clock: GrowthClock,
    cooldown: Duration,
    celebration_window: Duration,

    phase: RoundPhase,
    crash_point: Option<f64>,
    multiplier: f64,
    started_at: Option<Instant>,
    cooldown_deadline: Option<Instant>,
    last_milestone: u32,
    celebration_deadline: Option<Instant>,
}

impl Round {
    pub fn new(clock: GrowthClock) -> Self {
        Self::with_timing(clock, ROUND_COOLDOWN, CELEBRATION_WINDOW)
    }

    pub fn with_timing(
        clock: GrowthClock,
        cooldown: Duration,
        celebration_window: Duration,
    ) -> Self {
        Self {
            clock,
            cooldown,
            celebration_window,
            phase: RoundPhase::Idle,
            crash_point: None,
            multiplier: 1.0,
            started_at: None,
            cooldown_deadline: None,
            last_milestone: 1,
            celebration_deadline: None,
        }
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    /// Current multiplier: 1.00 when idle, the last sampled value while
    /// running, frozen at the crash point after a crash.
    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    pub fn celebration_active(&self) -> bool {
        self.celebration_deadline.is_some()
    }

    /// Begin a round. Only the session may call this, and only from `Idle`.
    ///
    /// The crash point is used internally as a termination bound and must not
    /// be surfaced to the player before the crash.
    pub(crate) fn start(&mut self, crash_point: f64, now: Instant) {
        debug_assert_eq!(
            self.phase,
            RoundPhase::Idle,
            "round started while {}",
            self.phase
        );
        self.phase = RoundPhase::Running;
        self.crash_point = Some(crash_point);
        self.multiplier = 1.0;
        self.started_at = Some(now);
        self.cooldown_deadline = None;
        self.last_milestone = 1;
        self.celebration_deadline = None;
    }

    /// Advance the simulation to `now` and return what happened.
    pub fn advance(&mut self, now: Instant) -> Vec<RoundEvent> {
        match self.phase {
            RoundPhase::Idle => Vec::new(),
            RoundPhase::Running => self.advance_running(now),
            RoundPhase::Crashed => self.advance_cooldown(now),
        }
    }

    fn advance_running(&mut self, now: Instant) -> Vec<RoundEvent> {
        let started_at = self.started_at.expect("running round has a start instant");
        let crash_point = self.crash_point.expect("running round has a crash point");

        let elapsed = now.saturating_duration_since(started_at);
        let sampled = self.clock.multiplier_at(elapsed);

        // Crash detection takes priority over everything else in this tick:
        // the final multiplier is clamped to the drawn crash point (no
        // overshoot is ever reported) and any pending celebration dies with
        // the round.
        if sampled >= crash_point {
            self.phase = RoundPhase::Crashed;
            self.multiplier = crash_point;
            self.celebration_deadline = None;
            self.cooldown_deadline = Some(now + self.cooldown);
            return vec![RoundEvent::Crashed(crash_point)];
        }

        self.multiplier = sampled;
        let mut events = Vec::new();

        let floor = sampled.floor() as u32;
        if floor > self.last_milestone {
            self.last_milestone = floor;
            events.push(RoundEvent::Milestone(floor));
            if CELEBRATION_MILESTONES.contains(&floor) {
                // Retriggerable: a newer milestone replaces any pending window.
                self.celebration_deadline = Some(now + self.celebration_window);
                events.push(RoundEvent::CelebrationStarted(floor));
            }
        }

        if let Some(deadline) = self.celebration_deadline {
            if now >= deadline {
                self.celebration_deadline = None;
                events.push(RoundEvent::CelebrationEnded);
            }
        }

        events
    }

    fn advance_cooldown(&mut self, now: Instant) -> Vec<RoundEvent> {
        let deadline = self
            .cooldown_deadline
            .expect("crashed round has a cooldown deadline");
        if now < deadline {
            return Vec::new();
        }
        self.reset();
        vec![RoundEvent::RoundReset]
    }

    /// Abort the round immediately, regardless of phase.
    ///
    /// Used on session teardown and when the driving scheduler fails: the
    /// round must settle rather than hang, and no deadline may survive.
    pub fn abort(&mut self) {
        self.reset();
    }

    fn reset(&mut self) {
        self.phase = RoundPhase::Idle;
        self.crash_point = None;
        self.multiplier = 1.0;
        self.started_at = None;
        self.cooldown_deadline = None;
        self.last_milestone = 1;
        self.celebration_deadline = None;
    }
}
