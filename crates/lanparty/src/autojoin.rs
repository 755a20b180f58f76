//! The auto-join sequence: look for a game for a while, join the first
//! one found, or host a new one.
//!
//! ```text
//! "searching" ─ settle ─ start search ─┬─ attempt 1 ─ found? ─┬─ "found" ─ grace ─ join
//!                                      ├─ attempt 2 ─ found? ─┤
//!                                      └─ attempt N ─ found? ─┘
//!                                                    │ never
//!                                                    ▼
//!                                      "no games" ─ fallback ─ host
//! ```
//!
//! The sequence is driven through [`AutoJoinDriver`] so it can run
//! against the live controller or a scripted fake. It parks only in
//! [`Sequence::park`] and re-checks for cancellation after every driver
//! round-trip, so once cancelled it never joins or hosts.

use std::future::Future;

use lanparty_tick::{Cancelled, Sequence};
use tracing::{debug, info, warn};

use crate::AutoJoinConfig;
use crate::events::messages;

/// What the sequence needs from its environment.
pub trait AutoJoinDriver: Send {
    /// Shows a status message.
    fn message(&mut self, text: &'static str) -> impl Future<Output = ()> + Send;

    /// Starts listening for games.
    fn start_search(&mut self) -> impl Future<Output = ()> + Send;

    /// How many games are currently discovered.
    fn peer_count(&mut self) -> impl Future<Output = usize> + Send;

    /// Joins the earliest discovered game still present. `false` if none
    /// is left.
    fn join_first(&mut self) -> impl Future<Output = bool> + Send;

    /// Hosts a new game.
    fn host(&mut self) -> impl Future<Output = ()> + Send;
}

/// How a completed sequence ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoJoinOutcome {
    Joined,
    Hosted,
}

/// The auto-join coordinator.
#[derive(Debug, Clone)]
pub struct AutoJoin {
    config: AutoJoinConfig,
}

impl AutoJoin {
    pub fn new(config: AutoJoinConfig) -> Self {
        Self {
            config: config.validated(),
        }
    }

    /// Runs the sequence to completion or until `seq` is cancelled.
    pub async fn run<D: AutoJoinDriver>(
        &self,
        seq: &mut Sequence,
        driver: &mut D,
    ) -> Result<AutoJoinOutcome, Cancelled> {
        seq.checkpoint("start")?;
        driver.message(messages::SEARCHING).await;

        seq.park("settle", self.config.settle_delay).await?;
        driver.start_search().await;

        let mut found = false;
        for attempt in 1..=self.config.attempts {
            seq.park("attempt", self.config.attempt_interval).await?;
            let peers = driver.peer_count().await;
            seq.checkpoint("attempt")?;
            debug!(attempt, peers, "auto-join looked for games");
            if peers > 0 {
                found = true;
                break;
            }
        }

        if found {
            driver.message(messages::GAME_FOUND).await;
            seq.park("grace", self.config.found_grace).await?;
            let joined = driver.join_first().await;
            seq.checkpoint("join")?;
            if joined {
                info!("auto-join joined a discovered game");
                return Ok(AutoJoinOutcome::Joined);
            }
            warn!("discovered game vanished before joining, hosting instead");
        }

        driver.message(messages::NO_GAMES).await;
        seq.park("fallback", self.config.fallback_delay).await?;
        driver.host().await;
        info!(attempts = self.config.attempts, "auto-join found no game, hosting");
        Ok(AutoJoinOutcome::Hosted)
    }
}
