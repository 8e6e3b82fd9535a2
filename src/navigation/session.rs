//! Dual-mode navigation session
//!
//! A session turns positioning fixes into steering instructions. In live mode
//! every instruction is computed from the latest fresh fix. In simulated mode
//! the position is seeded once and then dead-reckoned along the last bearing
//! at a fixed speed, which lets a tour be rehearsed without moving.

use crate::algorithms::{bearing, cross_track_distance, distance, project};
use crate::core::{Coordinate, Fix, MIN_PROXIMITY_RADIUS_M};
use crate::hardware::PositioningSource;
use crate::navigation::link::LinkConfirmed;
use crate::navigation::tour::{Advance, Tour, TourProgress, TourState};
use crate::processing::PositioningAdapter;
use crate::utils::clock::{Clock, SystemClock};
use crate::validation::NavigationError;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Where guidance positions come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationMode {
    /// Every fresh fix
    Live,
    /// Dead reckoning from a seeded start
    Simulated,
}

/// Tick time breakdown
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TickTime {
    /// Whole seconds since the Unix epoch
    pub epoch_secs: u64,
    /// Milliseconds past `epoch_secs`
    pub subsec_millis: u32,
    /// Seconds since the session's first tick
    pub elapsed_secs: f64,
}

impl TickTime {
    fn new(now: Duration, started: Duration) -> Self {
        Self {
            epoch_secs: now.as_secs(),
            subsec_millis: now.subsec_millis(),
            elapsed_secs: now.saturating_sub(started).as_secs_f64(),
        }
    }
}

/// One steering instruction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Instruction {
    /// Sequence number, starting at 1
    pub sequence: u64,
    pub mode: NavigationMode,
    /// Fix accepted on this tick, if any
    pub live_position: Option<Coordinate>,
    /// Dead-reckoned position (simulated mode only)
    pub simulated_position: Option<Coordinate>,
    pub destination: Coordinate,
    /// Destination index within the tour
    pub destination_index: usize,
    /// Initial bearing to the destination, degrees in [0, 360)
    pub bearing_deg: f64,
    pub distance_m: f64,
    /// Offset from the active leg, positive to the right of track
    pub cross_track_m: Option<f64>,
    pub velocity_mps: Option<f64>,
    pub time: TickTime,
}

impl Instruction {
    /// Position the instruction was computed from
    pub fn position(&self) -> Option<Coordinate> {
        self.simulated_position.or(self.live_position)
    }
}

/// Result of a single tick
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Instruction(Instruction),
    /// No usable position this tick
    NoFix,
    /// Every waypoint has been reached
    Completed,
}

/// Tick-driven navigation over a tour
pub struct NavigationSession<S: PositioningSource, C: Clock = SystemClock> {
    adapter: PositioningAdapter<S>,
    tour: TourState,
    clock: C,
    poll_timeout: Duration,
    link: Option<LinkConfirmed>,
    radius_set: bool,
    velocity_mps: f64,
    simulation_start: Option<Coordinate>,
    /// Fixed on the first tick
    locked_mode: Option<NavigationMode>,
    position: Option<Coordinate>,
    last_bearing: Option<f64>,
    motion_started: bool,
    started_at: Option<Duration>,
    last_tick: Option<Duration>,
    sequence: u64,
}

impl<S: PositioningSource, C: Clock> NavigationSession<S, C> {
    pub fn new(adapter: PositioningAdapter<S>, tour: Tour, clock: C, poll_timeout: Duration) -> Self {
        Self {
            adapter,
            tour: TourState::new(tour, MIN_PROXIMITY_RADIUS_M),
            clock,
            poll_timeout,
            link: None,
            radius_set: false,
            velocity_mps: 0.0,
            simulation_start: None,
            locked_mode: None,
            position: None,
            last_bearing: None,
            motion_started: false,
            started_at: None,
            last_tick: None,
            sequence: 0,
        }
    }

    /// Seed simulated motion here instead of at the first fix
    pub fn with_simulation_start(mut self, start: Coordinate) -> Self {
        self.simulation_start = Some(start);
        self
    }

    /// Returns the effective radius after clamping
    pub fn set_proximity_radius(&mut self, radius_m: f64) -> f64 {
        self.radius_set = true;
        let effective = self.tour.set_proximity_radius(radius_m);
        debug!(requested = radius_m, effective, "Proximity radius set");
        effective
    }

    /// Returns the effective velocity; zero selects live mode
    pub fn set_simulation_velocity(&mut self, velocity_mps: f64) -> Result<f64, NavigationError> {
        if self.locked_mode.is_some() {
            return Err(NavigationError::ModeLocked);
        }
        // NaN also lands on zero
        self.velocity_mps = if velocity_mps > 0.0 { velocity_mps } else { 0.0 };
        Ok(self.velocity_mps)
    }

    pub fn attach_link(&mut self, confirmed: LinkConfirmed) {
        info!(
            successes = confirmed.successes(),
            attempts = confirmed.attempts(),
            "Navigation link attached"
        );
        self.link = Some(confirmed);
    }

    pub fn is_link_confirmed(&self) -> bool {
        self.link.is_some()
    }

    pub fn mode(&self) -> NavigationMode {
        self.locked_mode.unwrap_or(if self.velocity_mps > 0.0 {
            NavigationMode::Simulated
        } else {
            NavigationMode::Live
        })
    }

    pub fn progress(&self) -> TourProgress {
        self.tour.progress()
    }

    pub fn tour_state(&self) -> &TourState {
        &self.tour
    }

    pub fn position(&self) -> Option<Coordinate> {
        self.position
    }

    pub fn last_bearing(&self) -> Option<f64> {
        self.last_bearing
    }

    pub fn adapter(&self) -> &PositioningAdapter<S> {
        &self.adapter
    }

    pub fn adapter_mut(&mut self) -> &mut PositioningAdapter<S> {
        &mut self.adapter
    }

    /// Close the positioning link
    pub fn stop(&mut self) {
        self.adapter.close();
        info!(instructions = self.sequence, "Navigation stopped");
    }

    /// Run one tick
    pub fn next_instruction(&mut self) -> Result<TickOutcome, NavigationError> {
        if self.link.is_none() {
            return Err(NavigationError::LinkNotConfirmed);
        }
        if !self.radius_set {
            return Err(NavigationError::ProximityRadiusUnset);
        }
        if self.tour.is_completed() {
            return Ok(TickOutcome::Completed);
        }

        let mode = self.mode();
        self.locked_mode = Some(mode);

        if !self.adapter.is_open() {
            self.reconnect();
            if !self.adapter.is_open() {
                // Nothing to wait on, so the tick still takes a poll window
                self.clock.sleep(self.poll_timeout);
            }
        }

        let fix = match self.adapter.poll_fix(self.poll_timeout) {
            Ok(fix) => fix,
            Err(e) => {
                warn!(error = %e, "Positioning read failed");
                if !e.is_recoverable() {
                    self.reconnect();
                }
                None
            }
        };

        let now = self.clock.now();
        let elapsed = self
            .last_tick
            .map(|previous| now.saturating_sub(previous))
            .unwrap_or_default();
        self.last_tick = Some(now);

        let position = match mode {
            NavigationMode::Live => match &fix {
                Some(fix) => fix.position,
                None => return Ok(TickOutcome::NoFix),
            },
            NavigationMode::Simulated => match self.simulate(fix.as_ref(), elapsed) {
                Some(position) => position,
                None => return Ok(TickOutcome::NoFix),
            },
        };
        self.position = Some(position);
        let started = *self.started_at.get_or_insert(now);

        match self.tour.advance(&position) {
            Advance::Completed => {
                info!(position = %position, "Tour completed");
                return Ok(TickOutcome::Completed);
            }
            Advance::Advanced(next) => {
                info!(position = %position, next = %next, "Waypoint reached");
            }
            Advance::Holding(_) => {}
        }

        let (Some(destination), Some(destination_index)) =
            (self.tour.current_destination(), self.tour.current_index())
        else {
            return Ok(TickOutcome::Completed);
        };

        let bearing_deg = bearing(&position, &destination);
        self.last_bearing = Some(bearing_deg);
        let cross_track_m = self
            .tour
            .previous_waypoint()
            .map(|previous| cross_track_distance(&previous, &destination, &position));

        self.sequence += 1;
        let simulated = mode == NavigationMode::Simulated;
        Ok(TickOutcome::Instruction(Instruction {
            sequence: self.sequence,
            mode,
            live_position: fix.map(|fix: Fix| fix.position),
            simulated_position: simulated.then_some(position),
            destination,
            destination_index,
            bearing_deg,
            distance_m: distance(&position, &destination),
            cross_track_m,
            velocity_mps: simulated.then_some(self.velocity_mps),
            time: TickTime::new(now, started),
        }))
    }

    fn reconnect(&mut self) {
        self.adapter.close();
        match self.adapter.open() {
            Ok(()) => info!("Positioning link reopened"),
            Err(e) => warn!(error = %e, "Positioning link reopen failed"),
        }
    }

    /// Next simulated position, or `None` while there is nothing to seed from
    fn simulate(&mut self, fix: Option<&Fix>, elapsed: Duration) -> Option<Coordinate> {
        if !self.motion_started {
            let seed = self.simulation_start.or(fix.map(|fix| fix.position))?;
            self.motion_started = true;
            info!(start = %seed, velocity_mps = self.velocity_mps, "Simulated motion started");
            return Some(seed);
        }

        let current = self.position?;
        let Some(heading) = self.last_bearing else {
            return Some(current);
        };

        // Land on the destination rather than overshoot it
        let remaining = self
            .tour
            .current_destination()
            .map_or(f64::INFINITY, |destination| distance(&current, &destination));
        let step = (self.velocity_mps * elapsed.as_secs_f64()).min(remaining);
        Some(project(&current, heading, step))
    }
}
