use fixloop_types::solution::SolutionError;
use thiserror::Error;

/// Conditions that interrupt the fix loops. `Canceled` and `Host` stop at the
/// project boundary and become project kinds; `Solution` is raised before
/// any project runs.
#[derive(Debug, Error)]
pub enum FixError {
    #[error("fix run was canceled")]
    Canceled,

    #[error("host failure: {0:#}")]
    Host(#[from] anyhow::Error),

    #[error(transparent)]
    Solution(#[from] SolutionError),
}
