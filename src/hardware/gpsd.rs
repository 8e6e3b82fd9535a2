//! gpsd client speaking the JSON watch protocol over TCP
//!
//! The daemon streams newline-delimited JSON objects once watching is
//! enabled. Only `TPV` (time-position-velocity) reports carry a fix; every
//! other class leaves the cached report untouched, so the caller sees the
//! previous timestamp and its staleness filter drops the read.

use crate::core::{FixQuality, RawFix, GPSD_DEFAULT_PORT};
use crate::hardware::{CommError, CommResult, PositioningSource};
use serde::Deserialize;
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};
use tracing::debug;

const WATCH_ENABLE: &[u8] = b"?WATCH={\"enable\":true,\"json\":true};\n";
const WATCH_DISABLE: &[u8] = b"?WATCH={\"enable\":false};\n";

/// A zero read timeout is rejected by the socket layer
const MIN_SOCKET_TIMEOUT: Duration = Duration::from_millis(1);

/// Subset of a gpsd report that the navigator consumes
#[derive(Debug, Deserialize)]
struct GpsdReport {
    class: String,
    #[serde(default)]
    mode: Option<u8>,
    #[serde(default)]
    time: Option<String>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
    #[serde(default)]
    track: Option<f64>,
}

/// Positioning source backed by a gpsd daemon
pub struct GpsdSource {
    host: String,
    port: u16,
    connect_timeout: Duration,
    read_timeout: Duration,
    stream: Option<BufReader<TcpStream>>,
    /// Bytes of a line whose newline has not arrived yet
    pending: String,
    /// End of the window opened by the last `wait_for_data`
    deadline: Option<Instant>,
    last_report: RawFix,
}

impl GpsdSource {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            connect_timeout: Duration::from_secs(2),
            read_timeout: Duration::from_millis(500),
            stream: None,
            pending: String::new(),
            deadline: None,
            last_report: RawFix::unseen(),
        }
    }

    /// gpsd on the local machine at its standard port
    pub fn localhost() -> Self {
        Self::new("127.0.0.1", GPSD_DEFAULT_PORT)
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Bound on how long a `read` with no preceding wait blocks
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn stream(&mut self) -> CommResult<&mut BufReader<TcpStream>> {
        self.stream.as_mut().ok_or(CommError::NotConnected)
    }

    fn connection_failed(&self, reason: impl ToString) -> CommError {
        CommError::ConnectionFailed {
            address: self.address(),
            reason: reason.to_string(),
        }
    }
}

/// Fold one gpsd JSON line into the previously cached report
pub fn parse_report(line: &str, previous: &RawFix) -> CommResult<RawFix> {
    let report: GpsdReport = serde_json::from_str(line).map_err(|e| CommError::InvalidMessage {
        details: format!("{}: {}", e, line),
    })?;

    if report.class != "TPV" {
        return Ok(*previous);
    }

    // A TPV without a time stamp can never be fresh
    let timestamp = match report.time.as_deref() {
        Some(time) => parse_timestamp(time)?,
        None => 0.0,
    };

    Ok(RawFix {
        quality: FixQuality::from_gpsd_mode(report.mode.unwrap_or(0)),
        latitude: report.lat.unwrap_or(0.0),
        longitude: report.lon.unwrap_or(0.0),
        heading: report.track,
        timestamp,
    })
}

/// RFC 3339 time to fractional seconds since the Unix epoch
fn parse_timestamp(time: &str) -> CommResult<f64> {
    let parsed = chrono::DateTime::parse_from_rfc3339(time).map_err(|e| CommError::InvalidMessage {
        details: format!("bad time '{}': {}", time, e),
    })?;
    Ok(parsed.timestamp() as f64 + f64::from(parsed.timestamp_subsec_nanos()) * 1e-9)
}

/// How long `read` may block: what is left of the last wait, else `fallback`
fn read_budget(deadline: Option<Instant>, now: Instant, fallback: Duration) -> Duration {
    deadline
        .map_or(fallback, |deadline| deadline.saturating_duration_since(now))
        .max(MIN_SOCKET_TIMEOUT)
}

fn is_timeout(kind: ErrorKind) -> bool {
    matches!(kind, ErrorKind::WouldBlock | ErrorKind::TimedOut)
}

impl PositioningSource for GpsdSource {
    fn open(&mut self) -> CommResult<()> {
        let addresses = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| self.connection_failed(e))?;

        let mut last_error = self.connection_failed("no address resolved");
        for address in addresses {
            match TcpStream::connect_timeout(&address, self.connect_timeout) {
                Ok(stream) => {
                    debug!(address = %address, "Connected to gpsd");
                    self.stream = Some(BufReader::new(stream));
                    self.pending.clear();
                    return Ok(());
                }
                Err(e) => last_error = self.connection_failed(e),
            }
        }
        Err(last_error)
    }

    fn close(&mut self) {
        if self.stream.is_some() {
            let _ = self.set_streaming(false);
            if let Some(stream) = self.stream.take() {
                let _ = stream.get_ref().shutdown(std::net::Shutdown::Both);
            }
        }
    }

    fn set_streaming(&mut self, enabled: bool) -> CommResult<()> {
        let command = if enabled { WATCH_ENABLE } else { WATCH_DISABLE };
        let stream = self.stream()?;
        stream.get_mut().write_all(command)?;
        stream.get_mut().flush()?;
        Ok(())
    }

    fn wait_for_data(&mut self, timeout: Duration) -> CommResult<bool> {
        self.deadline = Some(Instant::now() + timeout);
        let stream = self.stream()?;
        if !stream.buffer().is_empty() {
            return Ok(true);
        }

        stream
            .get_ref()
            .set_read_timeout(Some(timeout.max(MIN_SOCKET_TIMEOUT)))?;
        match stream.fill_buf() {
            Ok([]) => Err(CommError::Closed),
            Ok(_) => Ok(true),
            Err(e) if is_timeout(e.kind()) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn read(&mut self) -> CommResult<RawFix> {
        let budget = read_budget(self.deadline.take(), Instant::now(), self.read_timeout);
        let stream = self.stream.as_mut().ok_or(CommError::NotConnected)?;
        stream.get_ref().set_read_timeout(Some(budget))?;

        match stream.read_line(&mut self.pending) {
            Ok(0) => Err(CommError::Closed),
            Ok(_) if !self.pending.ends_with('\n') => Err(CommError::Closed),
            Ok(_) => {
                let line = std::mem::take(&mut self.pending);
                let report = parse_report(line.trim(), &self.last_report)?;
                self.last_report = report;
                Ok(report)
            }
            Err(e) if is_timeout(e.kind()) => Err(CommError::Timeout {
                timeout_ms: budget.as_millis() as u64,
            }),
            Err(e) => Err(e.into()),
        }
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }
}

impl Drop for GpsdSource {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::net::TcpListener;
    use std::thread;

    const TPV: &str = r#"{"class":"TPV","device":"/dev/ttyACM0","mode":2,"time":"2024-05-01T12:00:00.250Z","lat":47.6205,"lon":-122.3493,"track":87.5}"#;

    #[test]
    fn test_parse_tpv() {
        let report = parse_report(TPV, &RawFix::unseen()).unwrap();
        assert_eq!(report.quality, FixQuality::Fix2D);
        assert_eq!(report.latitude, 47.6205);
        assert_eq!(report.longitude, -122.3493);
        assert_eq!(report.heading, Some(87.5));
        assert!((report.timestamp - 1_714_564_800.25).abs() < 1e-6);
    }

    #[test]
    fn test_non_tpv_keeps_previous_report() {
        let previous = RawFix::new(FixQuality::Fix3D, 1.0, 2.0, 42.0);
        let sky = r#"{"class":"SKY","device":"/dev/ttyACM0","satellites":[]}"#;
        assert_eq!(parse_report(sky, &previous).unwrap(), previous);
    }

    #[test]
    fn test_tpv_without_fix() {
        let line = r#"{"class":"TPV","mode":1}"#;
        let report = parse_report(line, &RawFix::unseen()).unwrap();
        assert_eq!(report.quality, FixQuality::NoFix);
        assert_eq!(report.timestamp, 0.0);
    }

    #[test]
    fn test_invalid_lines() {
        assert!(matches!(
            parse_report("not json", &RawFix::unseen()),
            Err(CommError::InvalidMessage { .. })
        ));
        assert!(matches!(
            parse_report(r#"{"class":"TPV","mode":2,"time":"yesterday"}"#, &RawFix::unseen()),
            Err(CommError::InvalidMessage { .. })
        ));
    }

    #[test]
    fn test_read_budget() {
        let now = Instant::now();
        let fallback = Duration::from_millis(500);

        assert_eq!(read_budget(None, now, fallback), fallback);
        assert_eq!(
            read_budget(Some(now + Duration::from_millis(120)), now, fallback),
            Duration::from_millis(120)
        );
        // An expired window still allows the socket minimum
        assert_eq!(read_budget(Some(now), now + Duration::from_secs(1), fallback), MIN_SOCKET_TIMEOUT);
    }

    #[test]
    fn test_partial_line_read_stays_within_wait() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let (done_tx, done_rx) = std::sync::mpsc::channel::<()>();

        let daemon = thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            socket.write_all(b"{\"class\":\"TPV\",").unwrap();
            socket.flush().unwrap();
            // Hold the line open until the client gives up
            let _ = done_rx.recv();
        });

        let mut source = GpsdSource::new("127.0.0.1", port).with_read_timeout(Duration::from_secs(10));
        source.open().unwrap();

        let started = Instant::now();
        assert!(source.wait_for_data(Duration::from_millis(300)).unwrap());
        assert!(matches!(source.read(), Err(CommError::Timeout { .. })));
        assert!(started.elapsed() < Duration::from_secs(5));

        done_tx.send(()).unwrap();
        daemon.join().unwrap();
    }

    #[test]
    fn test_requires_connection() {
        let mut source = GpsdSource::localhost();
        assert!(!source.is_open());
        assert_eq!(source.set_streaming(true), Err(CommError::NotConnected));
        assert_eq!(source.read(), Err(CommError::NotConnected));
    }

    #[test]
    fn test_session_against_local_daemon() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let daemon = thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            let mut command = vec![0u8; WATCH_ENABLE.len()];
            socket.read_exact(&mut command).unwrap();
            assert_eq!(command, WATCH_ENABLE);

            socket
                .write_all(b"{\"class\":\"VERSION\",\"release\":\"3.25\"}\n")
                .unwrap();
            socket.write_all(TPV.as_bytes()).unwrap();
            socket.write_all(b"\n").unwrap();
            socket.flush().unwrap();
        });

        let mut source = GpsdSource::new("127.0.0.1", port);
        source.open().unwrap();
        source.set_streaming(true).unwrap();

        let timeout = Duration::from_secs(5);
        assert!(source.wait_for_data(timeout).unwrap());
        let version = source.read().unwrap();
        assert_eq!(version.quality, FixQuality::NotSeen);

        assert!(source.wait_for_data(timeout).unwrap());
        let fix = source.read().unwrap();
        assert_eq!(fix.quality, FixQuality::Fix2D);
        assert_eq!(fix.latitude, 47.6205);

        daemon.join().unwrap();
        assert_eq!(source.wait_for_data(timeout), Err(CommError::Closed));
        source.close();
        assert!(!source.is_open());
    }
}
