//! Positioning adapter: one poll in, one fresh fix (or nothing) out

use crate::core::Fix;
use crate::hardware::{CommResult, PositioningSource};
use std::time::Duration;

/// Wraps a [`PositioningSource`] behind a "fresh fix or nothing" contract
///
/// A report is accepted only if it carries at least a 2D fix and its capture
/// time is strictly newer than the last accepted report. Rejections do not
/// move the freshness watermark.
pub struct PositioningAdapter<S: PositioningSource> {
    source: S,
    last_accepted: Option<f64>,
}

impl<S: PositioningSource> PositioningAdapter<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            last_accepted: None,
        }
    }

    /// Open the link and enable streaming
    pub fn open(&mut self) -> CommResult<()> {
        self.source.open()?;
        self.source.set_streaming(true)
    }

    /// Disable streaming and close the link
    pub fn close(&mut self) {
        if self.source.is_open() {
            let _ = self.source.set_streaming(false);
        }
        self.source.close();
    }

    pub fn is_open(&self) -> bool {
        self.source.is_open()
    }

    /// Poll the source once, waiting at most `timeout`
    ///
    /// `Ok(None)` covers a closed link, a timeout, insufficient fix quality
    /// and stale reports. Read failures come back as `Err` so the caller can
    /// log them; they should be treated as "no fix" as well.
    pub fn poll_fix(&mut self, timeout: Duration) -> CommResult<Option<Fix>> {
        if !self.source.is_open() {
            return Ok(None);
        }
        if !self.source.wait_for_data(timeout)? {
            return Ok(None);
        }

        let report = self.source.read()?;
        if !report.quality.has_position() {
            return Ok(None);
        }
        if self.last_accepted.is_some_and(|last| report.timestamp <= last) {
            return Ok(None);
        }

        self.last_accepted = Some(report.timestamp);
        Ok(Some(Fix::from(report)))
    }

    /// Capture time of the last accepted fix
    pub fn last_accepted_timestamp(&self) -> Option<f64> {
        self.last_accepted
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FixQuality, RawFix};
    use crate::hardware::{CommError, MockPositioningSource, ScriptedEvent};

    const TIMEOUT: Duration = Duration::from_millis(100);

    fn open_adapter(source: MockPositioningSource) -> PositioningAdapter<MockPositioningSource> {
        let mut adapter = PositioningAdapter::new(source);
        adapter.open().unwrap();
        adapter
    }

    #[test]
    fn test_open_enables_streaming() {
        let adapter = open_adapter(MockPositioningSource::new());
        assert!(adapter.is_open());
        assert!(adapter.source().is_streaming());
    }

    #[test]
    fn test_duplicate_timestamp_is_stale() {
        let mut source = MockPositioningSource::new();
        source.push_fix(10.0, 20.0, 100.0);
        source.push_fix(10.0, 20.0, 100.0);
        let mut adapter = open_adapter(source);

        let first = adapter.poll_fix(TIMEOUT).unwrap();
        let second = adapter.poll_fix(TIMEOUT).unwrap();

        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(adapter.last_accepted_timestamp(), Some(100.0));
    }

    #[test]
    fn test_older_timestamp_is_stale() {
        let mut source = MockPositioningSource::new();
        source.push_fix(10.0, 20.0, 100.5);
        source.push_fix(10.0, 20.0, 100.25);
        source.push_fix(10.0, 20.0, 100.75);
        let mut adapter = open_adapter(source);

        assert!(adapter.poll_fix(TIMEOUT).unwrap().is_some());
        assert!(adapter.poll_fix(TIMEOUT).unwrap().is_none());
        assert!(adapter.poll_fix(TIMEOUT).unwrap().is_some());
    }

    #[test]
    fn test_insufficient_quality_is_dropped_without_moving_watermark() {
        let source = MockPositioningSource::with_script([
            ScriptedEvent::Fix(RawFix::new(FixQuality::NoFix, 0.0, 0.0, 50.0)),
            ScriptedEvent::Fix(RawFix::new(FixQuality::Fix3D, 1.0, 1.0, 40.0)),
        ]);
        let mut adapter = open_adapter(source);

        assert!(adapter.poll_fix(TIMEOUT).unwrap().is_none());
        assert_eq!(adapter.last_accepted_timestamp(), None);

        let fix = adapter.poll_fix(TIMEOUT).unwrap().unwrap();
        assert_eq!(fix.position.latitude, 1.0);
    }

    #[test]
    fn test_timeout_and_read_failure() {
        let source = MockPositioningSource::with_script([
            ScriptedEvent::Timeout,
            ScriptedEvent::ReadError(CommError::ReadFailed {
                reason: "socket".into(),
            }),
        ]);
        let mut adapter = open_adapter(source);

        assert_eq!(adapter.poll_fix(TIMEOUT), Ok(None));
        assert!(adapter.poll_fix(TIMEOUT).is_err());
        assert_eq!(adapter.poll_fix(TIMEOUT), Ok(None));
    }

    #[test]
    fn test_closed_link_yields_nothing() {
        let mut source = MockPositioningSource::new();
        source.push_fix(1.0, 1.0, 1.0);
        let mut adapter = PositioningAdapter::new(source);

        assert_eq!(adapter.poll_fix(TIMEOUT), Ok(None));
        assert_eq!(adapter.source().wait_count(), 0);

        adapter.open().unwrap();
        adapter.close();
        assert!(!adapter.is_open());
        assert_eq!(adapter.poll_fix(TIMEOUT), Ok(None));
    }

    #[test]
    fn test_heading_is_carried() {
        let source = MockPositioningSource::with_script([ScriptedEvent::Fix(
            RawFix::new(FixQuality::Fix2D, 5.0, 6.0, 7.0).with_heading(123.0),
        )]);
        let mut adapter = open_adapter(source);
        let fix = adapter.poll_fix(TIMEOUT).unwrap().unwrap();
        assert_eq!(fix.heading, Some(123.0));
        assert_eq!(fix.timestamp, 7.0);
    }
}
