//! Connection resilience for a receiver that needs time to lock
//!
//! A probe opens the link and polls it a fixed number of times. Early misses
//! are expected while the receiver acquires a fix, so only the final poll
//! decides the outcome. Retrying after a failed probe is the caller's call.

use crate::core::{Fix, DEFAULT_POLL_TIMEOUT_MS, DEFAULT_PROBE_ATTEMPTS};
use crate::hardware::{CommError, PositioningSource};
use crate::processing::PositioningAdapter;
use std::time::Duration;
use tracing::{info, warn};

/// Probe state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Probing,
    Confirmed,
}

/// Proof that a probe ended on a successful poll
///
/// A navigation session refuses to run until one is attached. Only
/// [`LinkProbe`] can produce one.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkConfirmed {
    attempts: usize,
    successes: usize,
    final_fix: Fix,
}

impl LinkConfirmed {
    #[cfg(test)]
    pub(crate) fn new(attempts: usize, successes: usize, final_fix: Fix) -> Self {
        Self {
            attempts,
            successes,
            final_fix,
        }
    }

    /// Polls in the confirming probe
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Polls that returned a fresh fix
    pub fn successes(&self) -> usize {
        self.successes
    }

    /// Fix returned by the deciding poll
    pub fn final_fix(&self) -> &Fix {
        &self.final_fix
    }
}

/// Why a probe did not confirm the link
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LinkError {
    #[error("cannot open positioning link: {0}")]
    Open(#[source] CommError),
    #[error("final poll returned no fix ({successes}/{attempts} polls succeeded)")]
    NoFinalFix { successes: usize, attempts: usize },
}

/// Runs probe sequences against a positioning adapter
#[derive(Debug, Clone)]
pub struct LinkProbe {
    attempts: usize,
    poll_timeout: Duration,
    state: LinkState,
}

impl LinkProbe {
    pub fn new(attempts: usize, poll_timeout: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            poll_timeout,
            state: LinkState::Probing,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Reopen the link and run one probe sequence
    pub fn probe<S: PositioningSource>(
        &mut self,
        adapter: &mut PositioningAdapter<S>,
    ) -> Result<LinkConfirmed, LinkError> {
        self.state = LinkState::Probing;
        info!(attempts = self.attempts, "Testing positioning link");

        adapter.close();
        adapter.open().map_err(LinkError::Open)?;

        let mut successes = 0;
        let mut last = None;
        for attempt in 1..=self.attempts {
            last = match adapter.poll_fix(self.poll_timeout) {
                Ok(Some(fix)) => {
                    successes += 1;
                    info!(attempt, total = self.attempts, fix = %fix, "Probe poll");
                    Some(fix)
                }
                Ok(None) => {
                    info!(attempt, total = self.attempts, "Probe poll returned no fix");
                    None
                }
                Err(e) => {
                    warn!(attempt, total = self.attempts, error = %e, "Probe poll failed");
                    None
                }
            };
        }

        match last {
            Some(final_fix) => {
                self.state = LinkState::Confirmed;
                info!(successes, attempts = self.attempts, "Positioning link confirmed");
                Ok(LinkConfirmed {
                    attempts: self.attempts,
                    successes,
                    final_fix,
                })
            }
            None => {
                adapter.close();
                Err(LinkError::NoFinalFix {
                    successes,
                    attempts: self.attempts,
                })
            }
        }
    }

    /// Probe until confirmed, asking `retry` after every failure
    ///
    /// `retry` returning false aborts with the last failure.
    pub fn probe_with_retry<S, F>(
        &mut self,
        adapter: &mut PositioningAdapter<S>,
        mut retry: F,
    ) -> Result<LinkConfirmed, LinkError>
    where
        S: PositioningSource,
        F: FnMut(&LinkError) -> bool,
    {
        loop {
            match self.probe(adapter) {
                Ok(confirmed) => return Ok(confirmed),
                Err(e) => {
                    warn!(error = %e, "Positioning link failed");
                    if !retry(&e) {
                        return Err(e);
                    }
                }
            }
        }
    }
}

impl Default for LinkProbe {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_ATTEMPTS, Duration::from_millis(DEFAULT_POLL_TIMEOUT_MS))
    }
}
