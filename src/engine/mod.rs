//! Crash game simulation engine.
//!
//! Leaves first: odds (pure draw) -> clock (time to multiplier) -> round
//! (state machine) -> session (settlement). Nothing in here schedules itself;
//! a host driver calls [`session::CrashSession::tick`] with the current
//! instant and consumes the returned events.

pub mod clock;
pub mod entropy;
pub mod odds;
pub mod round;
pub mod session;

pub use clock::GrowthClock;
pub use entropy::{EntropySource, OsEntropy, SequenceEntropy};
pub use odds::CrashPointGenerator;
pub use round::{Round, RoundEvent, RoundPhase};
pub use session::{CrashSession, PlayerPhase, SessionSnapshot};
