//! Tour state: the visiting order and progress along it
//!
//! Progress is an explicit state machine:
//!
//! ```text
//! Traveling(i) --arrived--> Traveling(i + 1)   for i + 1 < N
//! Traveling(N - 1) --arrived--> Completed
//! ```
//!
//! `Completed` is absorbing; a finished tour never wraps back to its first
//! waypoint.

use crate::algorithms::geodesy;
use crate::core::{Coordinate, MIN_PROXIMITY_RADIUS_M};
use std::collections::HashSet;

/// Tour construction failures
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TourError {
    #[error("tour has no waypoints")]
    Empty,
    #[error("invalid visiting order: {reason}")]
    InvalidOrder { reason: String },
}

/// Ordered, non-empty, immutable waypoint sequence
#[derive(Debug, Clone, PartialEq)]
pub struct Tour {
    waypoints: Vec<Coordinate>,
}

impl Tour {
    pub fn new(waypoints: Vec<Coordinate>) -> Result<Self, TourError> {
        if waypoints.is_empty() {
            return Err(TourError::Empty);
        }
        Ok(Self { waypoints })
    }

    /// Arrange `points` in the visiting order produced by a solver
    ///
    /// `order` must be a permutation of `0..points.len()`.
    pub fn from_solution(points: &[Coordinate], order: &[usize]) -> Result<Self, TourError> {
        if order.len() != points.len() {
            return Err(TourError::InvalidOrder {
                reason: format!("{} indices for {} points", order.len(), points.len()),
            });
        }

        let mut seen = HashSet::with_capacity(order.len());
        let mut waypoints = Vec::with_capacity(order.len());
        for &index in order {
            let point = points.get(index).ok_or_else(|| TourError::InvalidOrder {
                reason: format!("index {} out of range", index),
            })?;
            if !seen.insert(index) {
                return Err(TourError::InvalidOrder {
                    reason: format!("index {} repeated", index),
                });
            }
            waypoints.push(*point);
        }

        Self::new(waypoints)
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Coordinate> {
        self.waypoints.get(index)
    }

    pub fn waypoints(&self) -> &[Coordinate] {
        &self.waypoints
    }
}

/// Where the platform is along the tour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TourProgress {
    /// Heading for the waypoint at this index
    Traveling(usize),
    /// Every waypoint has been reached
    Completed,
}

/// Result of testing arrival at the current destination
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Advance {
    /// Not there yet; keep heading for this destination
    Holding(Coordinate),
    /// Arrived and moved on to this next destination
    Advanced(Coordinate),
    /// Arrived at the final waypoint
    Completed,
}

/// Clamp a requested proximity radius to the supported floor
pub fn clamp_proximity_radius(radius_m: f64) -> f64 {
    // f64::max discards NaN
    radius_m.max(MIN_PROXIMITY_RADIUS_M)
}

/// Tour plus progress and the arrival threshold
#[derive(Debug, Clone)]
pub struct TourState {
    tour: Tour,
    progress: TourProgress,
    proximity_radius: f64,
}

impl TourState {
    pub fn new(tour: Tour, proximity_radius_m: f64) -> Self {
        Self {
            tour,
            progress: TourProgress::Traveling(0),
            proximity_radius: clamp_proximity_radius(proximity_radius_m),
        }
    }

    /// Set the arrival threshold, returning the effective (clamped) value
    pub fn set_proximity_radius(&mut self, radius_m: f64) -> f64 {
        self.proximity_radius = clamp_proximity_radius(radius_m);
        self.proximity_radius
    }

    pub fn proximity_radius(&self) -> f64 {
        self.proximity_radius
    }

    pub fn progress(&self) -> TourProgress {
        self.progress
    }

    pub fn is_completed(&self) -> bool {
        self.progress == TourProgress::Completed
    }

    pub fn tour(&self) -> &Tour {
        &self.tour
    }

    /// Index of the current destination, `None` once completed
    pub fn current_index(&self) -> Option<usize> {
        match self.progress {
            TourProgress::Traveling(index) => Some(index),
            TourProgress::Completed => None,
        }
    }

    /// Waypoint currently being headed for, `None` once completed
    pub fn current_destination(&self) -> Option<Coordinate> {
        self.current_index()
            .and_then(|index| self.tour.get(index))
            .copied()
    }

    /// Waypoint reached just before the current destination
    pub fn previous_waypoint(&self) -> Option<Coordinate> {
        match self.current_index() {
            Some(index) if index > 0 => self.tour.get(index - 1).copied(),
            _ => None,
        }
    }

    /// True if `position` is within the proximity radius of the destination
    pub fn arrived(&self, position: &Coordinate) -> bool {
        self.current_destination()
            .is_some_and(|destination| geodesy::distance(position, &destination) <= self.proximity_radius)
    }

    /// Test arrival at `position` and move on if arrived
    pub fn advance(&mut self, position: &Coordinate) -> Advance {
        let TourProgress::Traveling(index) = self.progress else {
            return Advance::Completed;
        };
        let destination = self.tour.waypoints[index];

        if !self.arrived(position) {
            return Advance::Holding(destination);
        }

        let next = (index + 1) % self.tour.len();
        if next == 0 {
            self.progress = TourProgress::Completed;
            return Advance::Completed;
        }

        self.progress = TourProgress::Traveling(next);
        Advance::Advanced(self.tour.waypoints[next])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn equator_tour(n: usize) -> Tour {
        Tour::new((0..n).map(|i| Coordinate::new(0.0, i as f64)).collect()).unwrap()
    }

    #[test]
    fn test_empty_tour_rejected() {
        assert_eq!(Tour::new(Vec::new()), Err(TourError::Empty));
        assert_eq!(Tour::from_solution(&[], &[]), Err(TourError::Empty));
    }

    #[test]
    fn test_from_solution_permutes() {
        let points = [
            Coordinate::new(0.0, 0.0),
            Coordinate::new(1.0, 1.0),
            Coordinate::new(2.0, 2.0),
        ];
        let tour = Tour::from_solution(&points, &[2, 0, 1]).unwrap();
        assert_eq!(tour.waypoints(), &[points[2], points[0], points[1]]);
    }

    #[test]
    fn test_from_solution_rejects_bad_orders() {
        let points = [Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 1.0)];
        for order in [&[0usize][..], &[0, 2][..], &[1, 1][..], &[0, 1, 0][..]] {
            assert!(
                matches!(Tour::from_solution(&points, order), Err(TourError::InvalidOrder { .. })),
                "order {:?} accepted",
                order
            );
        }
    }

    #[test]
    fn test_proximity_radius_clamped() {
        let mut state = TourState::new(equator_tour(2), 0.5);
        assert_eq!(state.proximity_radius(), 1.0);
        assert_eq!(state.set_proximity_radius(-3.0), 1.0);
        assert_eq!(state.set_proximity_radius(f64::NAN), 1.0);
        assert_eq!(state.set_proximity_radius(25.0), 25.0);
    }

    #[test]
    fn test_arrival_boundary() {
        let destination = Coordinate::new(10.0, 20.0);
        let tour = Tour::new(vec![destination]).unwrap();

        for bearing in [0.0, 90.0, 215.0] {
            let position = geodesy::project(&destination, bearing, 250.0);
            let d = geodesy::distance(&position, &destination);

            let at_radius = TourState::new(tour.clone(), d);
            assert!(at_radius.arrived(&position));

            let just_short = TourState::new(tour.clone(), d - 1e-6);
            assert!(!just_short.arrived(&position));
        }
    }

    #[test]
    fn test_holding_when_not_arrived() {
        let mut state = TourState::new(equator_tour(3), 10.0);
        let far = Coordinate::new(0.5, 0.5);
        assert_eq!(state.advance(&far), Advance::Holding(Coordinate::new(0.0, 0.0)));
        assert_eq!(state.progress(), TourProgress::Traveling(0));
    }

    #[test]
    fn test_full_progression_completes_without_wrapping() {
        let n = 5;
        let tour = equator_tour(n);
        let mut state = TourState::new(tour.clone(), 10.0);

        for expected in 1..n {
            let here = state.current_destination().unwrap();
            assert_eq!(state.advance(&here), Advance::Advanced(tour.waypoints()[expected]));
            assert_eq!(state.progress(), TourProgress::Traveling(expected));
            assert_eq!(state.previous_waypoint(), Some(here));
        }

        let last = state.current_destination().unwrap();
        assert_eq!(state.advance(&last), Advance::Completed);
        assert!(state.is_completed());
        assert_eq!(state.current_destination(), None);

        // Absorbing, even when standing on the first waypoint again
        assert_eq!(state.advance(&tour.waypoints()[0]), Advance::Completed);
        assert!(!state.arrived(&tour.waypoints()[0]));
    }

    #[test]
    fn test_single_waypoint_tour() {
        let mut state = TourState::new(equator_tour(1), 5.0);
        assert_eq!(state.previous_waypoint(), None);
        assert_eq!(state.advance(&Coordinate::new(0.0, 0.0)), Advance::Completed);
    }
}
