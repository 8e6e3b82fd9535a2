//! External tour solver invocation

use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Failure running the external solver
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    #[error("failed to start solver '{}': {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("solver exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
    #[error("solver did not produce '{}'", path.display())]
    MissingSolution { path: PathBuf },
    #[error("cannot resolve '{}': {source}", path.display())]
    Path {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Produces a visiting order for a TSPLIB point-set file
pub trait TourSolver {
    /// Solve `problem` and write the solution to `solution`
    fn solve(&self, problem: &Path, solution: &Path) -> Result<(), SolverError>;
}

impl<F> TourSolver for F
where
    F: Fn(&Path, &Path) -> Result<(), SolverError>,
{
    fn solve(&self, problem: &Path, solution: &Path) -> Result<(), SolverError> {
        self(problem, solution)
    }
}

/// Runs the Concorde executable
#[derive(Debug, Clone)]
pub struct ConcordeSolver {
    program: PathBuf,
}

impl ConcordeSolver {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for ConcordeSolver {
    fn default() -> Self {
        Self::new("concorde")
    }
}

/// Anchor `path` at the current directory
///
/// The solver runs from the solution directory, so relative paths handed to
/// it would resolve against the wrong place.
fn absolute(path: &Path) -> Result<PathBuf, SolverError> {
    std::path::absolute(path).map_err(|source| SolverError::Path {
        path: path.to_path_buf(),
        source,
    })
}

impl TourSolver for ConcordeSolver {
    fn solve(&self, problem: &Path, solution: &Path) -> Result<(), SolverError> {
        let problem = absolute(problem)?;
        let solution = absolute(solution)?;
        // Bare names are left for the PATH lookup
        let program = if self.program.components().count() > 1 {
            absolute(&self.program)?
        } else {
            self.program.clone()
        };

        let mut command = Command::new(&program);
        command.arg("-o").arg(&solution).arg(&problem);
        // Concorde drops scratch files into its working directory
        if let Some(dir) = solution.parent() {
            command.current_dir(dir);
        }

        let output = command.output().map_err(|source| SolverError::Spawn {
            program: self.program.clone(),
            source,
        })?;
        debug!(
            problem = %problem.display(),
            stdout = %String::from_utf8_lossy(&output.stdout),
            "Solver finished"
        );

        if !output.status.success() {
            return Err(SolverError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        if !solution.exists() {
            return Err(SolverError::MissingSolution { path: solution });
        }
        Ok(())
    }
}
