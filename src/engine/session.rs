//! Player session and settlement logic.
//!
//! Owns the only state shared across rounds: the balance and the crash
//! history. Both are mutated here and nowhere else. The session wraps the
//! round state machine and reacts to its events: debit on bet, credit on
//! cash-out, loss on crash, history append with eviction.

use crate::engine::clock::GrowthClock;
use crate::engine::entropy::EntropySource;
use crate::engine::odds::CrashPointGenerator;
use crate::engine::round::{Round, RoundEvent, RoundPhase};
use crate::errors::BetError;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::time::Instant;

/// Crash points kept for display, most recent first.
pub const HISTORY_CAPACITY: usize = 8;

/// Session starting balance.
pub const STARTING_BALANCE: f64 = 1000.0;

/// Player state, independent of the round lifecycle except at the
/// synchronization points (bet placement, crash, cooldown reset).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlayerPhase {
    Idle,
    InRound,
    CashedOut,
}

impl fmt::Display for PlayerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerPhase::Idle => write!(f, "idle"),
            PlayerPhase::InRound => write!(f, "in_round"),
            PlayerPhase::CashedOut => write!(f, "cashed_out"),
        }
    }
}

/// Point-in-time view of a session, served to the presentation layer on
/// every tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub multiplier: f64,
    pub round_phase: RoundPhase,
    pub player_phase: PlayerPhase,
    pub balance: f64,
    pub bet_amount: f64,
    pub celebration_active: bool,
    pub history: Vec<f64>,
}

/// A single-player crash game session.
pub struct CrashSession<E: EntropySource> {
    round: Round,
    odds: CrashPointGenerator<E>,
    player: PlayerPhase,
    balance: f64,
    bet_amount: f64,
    history: VecDeque<f64>,
    history_capacity: usize,
}

impl<E: EntropySource> CrashSession<E> {
    pub fn new(entropy: E) -> Self {
        Self::with_options(
            Round::new(GrowthClock::default()),
            CrashPointGenerator::new(entropy),
            STARTING_BALANCE,
            HISTORY_CAPACITY,
        )
    }

    pub fn with_options(
        round: Round,
        odds: CrashPointGenerator<E>,
        starting_balance: f64,
        history_capacity: usize,
    ) -> Self {
        Self {
            round,
            odds,
            player: PlayerPhase::Idle,
            balance: starting_balance,
            bet_amount: 0.0,
            history: VecDeque::with_capacity(history_capacity),
            history_capacity,
        }
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn bet_amount(&self) -> f64 {
        self.bet_amount
    }

    pub fn player_phase(&self) -> PlayerPhase {
        self.player
    }

    pub fn round_phase(&self) -> RoundPhase {
        self.round.phase()
    }

    pub fn multiplier(&self) -> f64 {
        self.round.multiplier()
    }

    pub fn celebration_active(&self) -> bool {
        self.round.celebration_active()
    }

    /// Crash history, most recent first.
    pub fn history(&self) -> impl Iterator<Item = f64> + '_ {
        self.history.iter().copied()
    }

    /// Place a bet and start a round.
    ///
    /// Rejection mutates nothing. On success the bet is debited immediately,
    /// the crash point is drawn, and the round clock starts at `now`. The bet
    /// is immutable until the round settles; the only exit is a cash-out.
    pub fn place_bet(&mut self, amount: f64, now: Instant) -> Result<(), BetError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(BetError::InvalidAmount(amount));
        }
        if amount > self.balance {
            return Err(BetError::InsufficientFunds {
                bet: amount,
                balance: self.balance,
            });
        }
        // Covers both a running round and the post-crash cooldown.
        if self.round.phase() != RoundPhase::Idle {
            return Err(BetError::RoundNotIdle);
        }

        self.balance -= amount;
        self.bet_amount = amount;
        self.player = PlayerPhase::InRound;

        let crash_point = self.odds.draw();
        self.round.start(crash_point, now);
        tracing::debug!(bet = amount, balance = self.balance, "round started");
        Ok(())
    }

    /// Lock in the current multiplier as payout.
    ///
    /// Strict no-op unless the player is in-round and the round is running:
    /// calling it twice, after a crash, or before betting does nothing. The
    /// payout uses the last *sampled* multiplier, so a cash-out processed
    /// before the crash-detecting tick settles at the value that tick had
    /// published.
    pub fn cash_out(&mut self) -> Option<f64> {
        if self.player != PlayerPhase::InRound || self.round.phase() != RoundPhase::Running {
            return None;
        }

        let payout = self.bet_amount * self.round.multiplier();
        self.balance += payout;
        self.player = PlayerPhase::CashedOut;
        tracing::debug!(payout, balance = self.balance, "cashed out");
        Some(payout)
    }

    /// Advance the session to `now`, settling whatever the round reports.
    pub fn tick(&mut self, now: Instant) -> Vec<RoundEvent> {
        let events = self.round.advance(now);
        for event in &events {
            match event {
                RoundEvent::Crashed(crash_point) => {
                    self.history.push_front(*crash_point);
                    self.history.truncate(self.history_capacity);
                    if self.player == PlayerPhase::InRound {
                        // The bet was debited at placement; losing it needs no
                        // further bookkeeping.
                        tracing::debug!(crash_point, lost = self.bet_amount, "player rode the crash");
                    }
                }
                RoundEvent::RoundReset => {
                    self.player = PlayerPhase::Idle;
                    self.bet_amount = 0.0;
                }
                _ => {}
            }
        }
        events
    }

    /// Abort the round in flight (session teardown, scheduler failure).
    ///
    /// Settles immediately as a loss: the bet stays debited, the round and
    /// player reset to idle, and all deadlines are cleared so nothing can
    /// fire after teardown. Aborted rounds are not recorded in history.
    pub fn abort_round(&mut self) {
        if self.round.phase() != RoundPhase::Idle {
            tracing::debug!(phase = %self.round.phase(), "aborting round in flight");
        }
        self.round.abort();
        self.player = PlayerPhase::Idle;
        self.bet_amount = 0.0;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            multiplier: self.round.multiplier(),
            round_phase: self.round.phase(),
            player_phase: self.player,
            balance: self.balance,
            bet_amount: self.bet_amount,
            celebration_active: self.round.celebration_active(),
            history: self.history.iter().copied().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::entropy::{OsEntropy, SequenceEntropy};
    use std::time::Duration;

    /// Far enough in the future to push any crash point past termination.
    const FAR_FUTURE: Duration = Duration::from_secs(1_000_000);

    fn session_with_crash_at(crash_h: u32) -> CrashSession<SequenceEntropy> {
        CrashSession::new(SequenceEntropy::new(vec![crash_h]))
    }

    #[test]
    fn test_balance_conservation_on_cash_out() {
        let t0 = Instant::now();
        // h = 2^31 draws a crash point of exactly 1.99... too low to reach
        // 2.50, so use a far-tail draw instead.
        let mut session = session_with_crash_at(u32::MAX);
        let clock = GrowthClock::default();

        session.place_bet(100.0, t0).unwrap();
        assert_eq!(session.balance(), 900.0);
        assert_eq!(session.player_phase(), PlayerPhase::InRound);

        session.tick(t0 + clock.time_to_reach(2.50));
        let payout = session.cash_out().unwrap();
        assert!((payout - 250.0).abs() < 1e-3);
        assert!((session.balance() - 1150.0).abs() < 1e-3);
        assert_eq!(session.player_phase(), PlayerPhase::CashedOut);
    }

    #[test]
    fn test_cash_out_is_idempotent() {
        let t0 = Instant::now();
        let mut session = session_with_crash_at(u32::MAX);
        let clock = GrowthClock::default();

        session.place_bet(100.0, t0).unwrap();
        session.tick(t0 + clock.time_to_reach(2.0));

        assert!(session.cash_out().is_some());
        let balance_after_first = session.balance();
        assert!(session.cash_out().is_none());
        assert_eq!(session.balance(), balance_after_first);
    }

    #[test]
    fn test_insufficient_funds_rejected() {
        let t0 = Instant::now();
        let mut session = session_with_crash_at(0);

        let err = session.place_bet(2000.0, t0).unwrap_err();
        assert_eq!(
            err,
            BetError::InsufficientFunds {
                bet: 2000.0,
                balance: 1000.0
            }
        );
        assert_eq!(session.balance(), 1000.0);
        assert_eq!(session.player_phase(), PlayerPhase::Idle);
        assert_eq!(session.round_phase(), RoundPhase::Idle);
    }

    #[test]
    fn test_invalid_amounts_rejected() {
        let t0 = Instant::now();
        let mut session = session_with_crash_at(0);

        for bad in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                session.place_bet(bad, t0),
                Err(BetError::InvalidAmount(_))
            ));
        }
        assert_eq!(session.balance(), 1000.0);
    }

    #[test]
    fn test_bet_rejected_while_round_running() {
        let t0 = Instant::now();
        let mut session = session_with_crash_at(u32::MAX);

        session.place_bet(100.0, t0).unwrap();
        let err = session.place_bet(50.0, t0).unwrap_err();
        assert_eq!(err, BetError::RoundNotIdle);
        assert_eq!(session.balance(), 900.0);
    }

    #[test]
    fn test_bet_rejected_during_cooldown() {
        let t0 = Instant::now();
        let mut session = session_with_crash_at(0);

        session.place_bet(100.0, t0).unwrap();
        session.tick(t0 + FAR_FUTURE);
        assert_eq!(session.round_phase(), RoundPhase::Crashed);

        // The crashed round holds the table until the cooldown elapses.
        let err = session.place_bet(50.0, t0 + FAR_FUTURE).unwrap_err();
        assert_eq!(err, BetError::RoundNotIdle);
        assert_eq!(session.balance(), 900.0);

        session.tick(t0 + FAR_FUTURE + Duration::from_secs(3));
        assert!(session
            .place_bet(50.0, t0 + FAR_FUTURE + Duration::from_secs(3))
            .is_ok());
    }

    #[test]
    fn test_loss_on_crash() {
        let t0 = Instant::now();
        // h = 0 draws the floor: crash at 1.10.
        let mut session = session_with_crash_at(0);

        session.place_bet(100.0, t0).unwrap();
        let events = session.tick(t0 + FAR_FUTURE);
        assert!(events.contains(&RoundEvent::Crashed(1.10)));

        // No further debit beyond the bet; player resets after the cooldown.
        assert_eq!(session.balance(), 900.0);
        assert_eq!(session.player_phase(), PlayerPhase::InRound);

        session.tick(t0 + FAR_FUTURE + Duration::from_secs(3));
        assert_eq!(session.player_phase(), PlayerPhase::Idle);
        assert_eq!(session.balance(), 900.0);
        assert_eq!(session.round_phase(), RoundPhase::Idle);
    }

    #[test]
    fn test_cashed_out_survives_the_crash() {
        let t0 = Instant::now();
        let mut session = session_with_crash_at(u32::MAX);
        let clock = GrowthClock::default();

        session.place_bet(100.0, t0).unwrap();
        session.tick(t0 + clock.time_to_reach(3.0));
        session.cash_out().unwrap();

        // The crash lands after the cash-out; the player stays cashed-out
        // until the cooldown reset and keeps the payout.
        session.tick(t0 + FAR_FUTURE);
        assert_eq!(session.player_phase(), PlayerPhase::CashedOut);
        let balance = session.balance();

        session.tick(t0 + FAR_FUTURE + Duration::from_secs(3));
        assert_eq!(session.player_phase(), PlayerPhase::Idle);
        assert_eq!(session.balance(), balance);
    }

    #[test]
    fn test_cash_out_after_crash_is_ignored() {
        let t0 = Instant::now();
        let mut session = session_with_crash_at(0);

        session.place_bet(100.0, t0).unwrap();
        session.tick(t0 + FAR_FUTURE);
        assert_eq!(session.round_phase(), RoundPhase::Crashed);

        assert!(session.cash_out().is_none());
        assert_eq!(session.balance(), 900.0);
    }

    #[test]
    fn test_history_keeps_last_eight_most_recent_first() {
        let t0 = Instant::now();
        let mut session = CrashSession::new(OsEntropy);
        let mut expected = Vec::new();
        let mut now = t0;

        for round in 0..9 {
            session.place_bet(1.0, now).unwrap();
            now += FAR_FUTURE;
            let events = session.tick(now);
            let crash_point = events
                .iter()
                .find_map(|e| match e {
                    RoundEvent::Crashed(c) => Some(*c),
                    _ => None,
                })
                .unwrap_or_else(|| panic!("round {} did not crash", round));
            expected.insert(0, crash_point);

            now += Duration::from_secs(3);
            session.tick(now);
        }

        expected.truncate(8);
        let history: Vec<f64> = session.history().collect();
        assert_eq!(history.len(), 8);
        assert_eq!(history, expected);
    }

    #[test]
    fn test_abort_settles_as_loss_and_leaves_history_alone() {
        let t0 = Instant::now();
        let mut session = session_with_crash_at(u32::MAX);

        session.place_bet(100.0, t0).unwrap();
        session.abort_round();

        assert_eq!(session.balance(), 900.0);
        assert_eq!(session.player_phase(), PlayerPhase::Idle);
        assert_eq!(session.round_phase(), RoundPhase::Idle);
        assert_eq!(session.history().count(), 0);

        // Ticks after teardown are inert.
        assert!(session.tick(t0 + FAR_FUTURE).is_empty());
    }

    #[test]
    fn test_snapshot_reflects_state() {
        let t0 = Instant::now();
        let mut session = session_with_crash_at(u32::MAX);
        let clock = GrowthClock::default();

        session.place_bet(250.0, t0).unwrap();
        session.tick(t0 + clock.time_to_reach(2.05));

        let snapshot = session.snapshot();
        assert_eq!(snapshot.round_phase, RoundPhase::Running);
        assert_eq!(snapshot.player_phase, PlayerPhase::InRound);
        assert_eq!(snapshot.bet_amount, 250.0);
        assert_eq!(snapshot.balance, 750.0);
        assert!(snapshot.celebration_active);
        assert!(snapshot.multiplier >= 2.0);
    }
}
