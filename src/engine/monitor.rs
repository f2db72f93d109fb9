//! Game snapshot monitor.
//!
//! Polls one game from the betting API. Any failure (non-2xx, timeout,
//! connectivity, bad body) counts as "snapshot unavailable" and the
//! last-known snapshot keeps being served.

use chrono::{DateTime, Local};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::clock::{self, Clock, Countdown};
use crate::api::BettingApi;
use crate::types::GameSnapshot;

pub struct GameMonitor {
    api: Arc<dyn BettingApi>,
    game_id: String,
    last: Option<GameSnapshot>,
    last_refreshed: Option<DateTime<Local>>,
    consecutive_failures: u32,
}

impl GameMonitor {
    pub fn new(api: Arc<dyn BettingApi>, game_id: impl Into<String>) -> Self {
        Self {
            api,
            game_id: game_id.into(),
            last: None,
            last_refreshed: None,
            consecutive_failures: 0,
        }
    }

    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    /// Last snapshot successfully fetched, if any.
    pub fn snapshot(&self) -> Option<&GameSnapshot> {
        self.last.as_ref()
    }

    pub fn last_refreshed(&self) -> Option<DateTime<Local>> {
        self.last_refreshed
    }

    /// Failed refreshes since the last successful one.
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Fetch a fresh snapshot, falling back to the last-known one.
    pub async fn refresh(&mut self) -> Option<&GameSnapshot> {
        match self.api.fetch_game(&self.game_id).await {
            Ok(snapshot) => {
                if self.last.as_ref().map(|s| s.current_status) != Some(snapshot.current_status) {
                    info!(
                        game_id = %snapshot.id,
                        status = %snapshot.current_status,
                        "Game status changed"
                    );
                } else {
                    debug!(game_id = %snapshot.id, "Game snapshot refreshed");
                }
                self.last = Some(snapshot);
                self.last_refreshed = Some(Local::now());
                self.consecutive_failures = 0;
            }
            Err(e) => {
                self.consecutive_failures += 1;
                warn!(
                    game_id = %self.game_id,
                    error = %e,
                    failures = self.consecutive_failures,
                    has_fallback = self.last.is_some(),
                    "Game snapshot unavailable, using last known"
                );
            }
        }
        self.last.as_ref()
    }

    /// Countdown for the current snapshot at the clock's "now".
    pub fn countdown(&self, clock: &dyn Clock) -> Option<Countdown> {
        self.last
            .as_ref()
            .and_then(|game| clock::remaining(clock.now(), game))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
