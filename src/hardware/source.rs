//! Positioning source interface trait

use crate::core::RawFix;
use crate::hardware::CommResult;
use std::time::Duration;

/// Hardware abstraction for a streaming positioning receiver
///
/// Mirrors a GPS daemon session: open a link, turn streaming on, then
/// repeatedly wait for data and read the latest report.
pub trait PositioningSource {
    /// Open the link to the receiver
    fn open(&mut self) -> CommResult<()>;

    /// Close the link; a no-op when already closed
    fn close(&mut self);

    /// Enable or disable report streaming
    fn set_streaming(&mut self, enabled: bool) -> CommResult<()>;

    /// Block for at most `timeout` until data is available
    /// Returns Ok(true) if a read would not block, Ok(false) on timeout
    fn wait_for_data(&mut self, timeout: Duration) -> CommResult<bool>;

    /// Read the latest report
    fn read(&mut self) -> CommResult<RawFix>;

    /// Check if the link is open
    fn is_open(&self) -> bool;
}

impl<S: PositioningSource + ?Sized> PositioningSource for Box<S> {
    fn open(&mut self) -> CommResult<()> {
        (**self).open()
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn set_streaming(&mut self, enabled: bool) -> CommResult<()> {
        (**self).set_streaming(enabled)
    }

    fn wait_for_data(&mut self, timeout: Duration) -> CommResult<bool> {
        (**self).wait_for_data(timeout)
    }

    fn read(&mut self) -> CommResult<RawFix> {
        (**self).read()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }
}
