//! Tour planning: waypoint CSV -> point-set file -> solver -> ordered tour

use crate::navigation::{Tour, TourError};
use crate::processing::solver::{SolverError, TourSolver};
use crate::processing::tsplib::{read_solution, write_tsp_file};
use crate::processing::waypoints::{read_waypoints, WaypointSet};
use crate::processing::TourFileError;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Any failure along the planning pipeline
#[derive(Debug, thiserror::Error)]
pub enum PlanningError {
    #[error(transparent)]
    File(#[from] TourFileError),
    #[error(transparent)]
    Solver(#[from] SolverError),
    #[error(transparent)]
    Tour(#[from] TourError),
}

/// A solved tour and how long the solver took
#[derive(Debug, Clone)]
pub struct PlannedTour {
    pub tour: Tour,
    pub solve_time: Duration,
}

/// Outcome of solving every CSV file in a directory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Directory entries inspected
    pub visited: usize,
    /// Files that produced a valid tour
    pub solved: usize,
}

/// Drives the external solver over waypoint files
pub struct TourPlanner<S: TourSolver> {
    tsp_dir: PathBuf,
    solution_dir: PathBuf,
    solver: S,
}

impl<S: TourSolver> TourPlanner<S> {
    pub fn new(tsp_dir: impl Into<PathBuf>, solution_dir: impl Into<PathBuf>, solver: S) -> Self {
        Self {
            tsp_dir: tsp_dir.into(),
            solution_dir: solution_dir.into(),
            solver,
        }
    }

    pub fn problem_path(&self, name: &str) -> PathBuf {
        self.tsp_dir.join(format!("{}.tsp", name))
    }

    pub fn solution_path(&self, name: &str) -> PathBuf {
        self.solution_dir.join(format!("{}.sol", name))
    }

    /// Read a waypoint CSV and solve it
    pub fn plan(&self, csv: &Path) -> Result<PlannedTour, PlanningError> {
        let waypoints = read_waypoints(csv)?;
        self.plan_waypoints(&waypoints)
    }

    /// Write the point-set, run the solver and load the visiting order
    pub fn plan_waypoints(&self, waypoints: &WaypointSet) -> Result<PlannedTour, PlanningError> {
        let name = waypoints.name();

        let problem = self.problem_path(&name);
        write_tsp_file(&problem, &name, &waypoints.file_name(), &waypoints.points)?;
        info!(path = %problem.display(), "Wrote TSP file");

        let solution = self.solution_path(&name);
        let started = Instant::now();
        self.solver.solve(&problem, &solution)?;
        let solve_time = started.elapsed();
        info!(
            path = %solution.display(),
            micros = solve_time.as_micros() as u64,
            "Solved tour"
        );

        let order = read_solution(&solution, waypoints.points.len())?;
        let tour = Tour::from_solution(&waypoints.points, &order)?;
        Ok(PlannedTour { tour, solve_time })
    }

    /// Solve every `.csv` file in `csv_dir`, skipping the ones that fail
    pub fn solve_directory(&self, csv_dir: &Path) -> Result<BatchSummary, TourFileError> {
        let mut entries: Vec<PathBuf> = fs::read_dir(csv_dir)
            .map_err(|e| TourFileError::io(csv_dir, e))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .collect();
        entries.sort();

        let mut summary = BatchSummary::default();
        for path in entries {
            summary.visited += 1;
            if !path.is_file() || path.extension().map_or(true, |ext| ext != "csv") {
                continue;
            }

            let waypoints = match read_waypoints(&path) {
                Ok(waypoints) => waypoints,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable waypoint file");
                    continue;
                }
            };

            match self.plan_waypoints(&waypoints) {
                Ok(_) => summary.solved += 1,
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unsolved waypoint file"),
            }
        }

        Ok(summary)
    }
}
