//! Port traits abstracting all I/O away from the pipeline.

use camino::Utf8Path;
use fixloop_types::solution::Solution;

/// Produces the solution snapshot to fix.
pub trait SolutionSource {
    fn load_solution(&self) -> anyhow::Result<Solution>;
}

/// File-system write operations.
pub trait WritePort {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()>;
    fn create_dir_all(&self, path: &Utf8Path) -> anyhow::Result<()>;
    fn remove_file(&self, path: &Utf8Path) -> anyhow::Result<()>;
}
