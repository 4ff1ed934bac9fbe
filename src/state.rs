//! Dashboard state record
//!
//! The poller never mutates a published state. Each transition builds a new
//! [`DashboardState`] that replaces the previous one wholesale.

use crate::{error::FetchError, types::Coin};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Lifecycle of the market snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollStatus {
    /// Nothing requested yet
    #[default]
    Idle,
    /// A refresh is outstanding; previous coins stay visible
    Loading,
    /// Latest refresh succeeded
    Ready,
    /// Latest refresh failed; previous coins stay visible
    Error,
}

/// Immutable snapshot of what the dashboard shows
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    pub status: PollStatus,
    /// Featured coin first when it could be resolved
    pub coins: Arc<Vec<Coin>>,
    pub error: Option<FetchError>,
    /// Refresh generation whose result is shown (0 before any result)
    pub generation: u64,
    /// Newest refresh generation handed out
    pub requested: u64,
    /// When `coins` was last replaced
    pub updated_at: Option<DateTime<Utc>>,
}

/// What [`DashboardState::complete`] decided
#[derive(Debug, Clone)]
pub enum Transition {
    /// New state to publish
    Applied(DashboardState),
    /// A newer generation was already applied
    Discarded { applied_generation: u64 },
}

impl DashboardState {
    pub fn is_loading(&self) -> bool {
        self.status == PollStatus::Loading
    }

    /// Error message to show, if any
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }

    /// The state shown while a refresh is in flight
    ///
    /// Hands out the next generation as `requested`.
    pub fn begin_loading(&self) -> Self {
        Self {
            status: PollStatus::Loading,
            requested: self.requested + 1,
            ..self.clone()
        }
    }

    /// Folds the result of refresh `generation` into a new state
    ///
    /// Results not newer than the applied generation are discarded. A result
    /// older than `requested` is applied but leaves the status at `Loading`,
    /// since a newer refresh is still outstanding.
    pub fn complete(&self, generation: u64, result: Result<Vec<Coin>, FetchError>) -> Transition {
        if generation <= self.generation {
            return Transition::Discarded {
                applied_generation: self.generation,
            };
        }

        let superseded = generation < self.requested;
        let next = match result {
            Ok(coins) => Self {
                status: if superseded {
                    PollStatus::Loading
                } else {
                    PollStatus::Ready
                },
                coins: Arc::new(coins),
                error: None,
                generation,
                requested: self.requested,
                updated_at: Some(Utc::now()),
            },
            Err(error) => Self {
                status: if superseded {
                    PollStatus::Loading
                } else {
                    PollStatus::Error
                },
                coins: self.coins.clone(),
                error: Some(error),
                generation,
                requested: self.requested,
                updated_at: self.updated_at,
            },
        };

        Transition::Applied(next)
    }
}
