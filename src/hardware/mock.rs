//! Scripted positioning source for testing and development

use crate::core::{FixQuality, RawFix};
use crate::hardware::{CommError, CommResult, PositioningSource};
use std::collections::VecDeque;
use std::time::Duration;

/// One scripted response of the mock receiver
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptedEvent {
    /// Data is available and reads as this report
    Fix(RawFix),
    /// The wait expires with no data
    Timeout,
    /// Data is signalled but the read fails
    ReadError(CommError),
}

/// Mock positioning source replaying a fixed script
///
/// Once the script is exhausted every wait times out.
pub struct MockPositioningSource {
    script: VecDeque<ScriptedEvent>,
    last_report: RawFix,
    open: bool,
    streaming: bool,
    failing_opens: u32,
    open_attempts: u32,
    waits: u32,
}

impl MockPositioningSource {
    /// Create a new mock source with an empty script
    pub fn new() -> Self {
        Self {
            script: VecDeque::new(),
            last_report: RawFix::unseen(),
            open: false,
            streaming: false,
            failing_opens: 0,
            open_attempts: 0,
            waits: 0,
        }
    }

    /// Create a mock source that replays `events` in order
    pub fn with_script<I: IntoIterator<Item = ScriptedEvent>>(events: I) -> Self {
        let mut source = Self::new();
        source.script.extend(events);
        source
    }

    /// Append a 2D fix at the given position and capture time
    pub fn push_fix(&mut self, latitude: f64, longitude: f64, timestamp: f64) {
        self.push(ScriptedEvent::Fix(RawFix::new(
            FixQuality::Fix2D,
            latitude,
            longitude,
            timestamp,
        )));
    }

    pub fn push(&mut self, event: ScriptedEvent) {
        self.script.push_back(event);
    }

    /// Make the next `count` calls to `open` fail
    pub fn fail_next_opens(&mut self, count: u32) {
        self.failing_opens = count;
    }

    pub fn remaining_events(&self) -> usize {
        self.script.len()
    }

    pub fn open_attempts(&self) -> u32 {
        self.open_attempts
    }

    pub fn wait_count(&self) -> u32 {
        self.waits
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }
}

impl Default for MockPositioningSource {
    fn default() -> Self {
        Self::new()
    }
}

impl PositioningSource for MockPositioningSource {
    fn open(&mut self) -> CommResult<()> {
        self.open_attempts += 1;
        if self.failing_opens > 0 {
            self.failing_opens -= 1;
            return Err(CommError::ConnectionFailed {
                address: "mock".to_string(),
                reason: "simulated open failure".to_string(),
            });
        }
        self.open = true;
        Ok(())
    }

    fn close(&mut self) {
        self.streaming = false;
        self.open = false;
    }

    fn set_streaming(&mut self, enabled: bool) -> CommResult<()> {
        if !self.open {
            return Err(CommError::NotConnected);
        }
        self.streaming = enabled;
        Ok(())
    }

    fn wait_for_data(&mut self, _timeout: Duration) -> CommResult<bool> {
        if !self.open {
            return Err(CommError::NotConnected);
        }
        self.waits += 1;

        match self.script.front() {
            None => Ok(false),
            Some(ScriptedEvent::Timeout) => {
                self.script.pop_front();
                Ok(false)
            }
            Some(_) => Ok(true),
        }
    }

    fn read(&mut self) -> CommResult<RawFix> {
        if !self.open {
            return Err(CommError::NotConnected);
        }

        match self.script.pop_front() {
            Some(ScriptedEvent::Fix(report)) => {
                self.last_report = report;
                Ok(report)
            }
            Some(ScriptedEvent::ReadError(error)) => Err(error),
            // Nothing new: the receiver still holds its previous report
            Some(ScriptedEvent::Timeout) | None => Ok(self.last_report),
        }
    }

    fn is_open(&self) -> bool {
        self.open
    }
}
