//! Execution strategy for fan-out over independent tasks.

use futures::future::try_join_all;
use std::fmt;
use std::future::Future;

/// How a batch of independent tasks is awaited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExecutionMode {
    /// Await tasks one at a time, in order.
    Sequential,
    /// Launch every task and await them together.
    #[default]
    Parallel,
}

impl ExecutionMode {
    pub fn is_parallel(&self) -> bool {
        matches!(self, ExecutionMode::Parallel)
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Sequential => write!(f, "sequential"),
            ExecutionMode::Parallel => write!(f, "parallel"),
        }
    }
}

/// Await `tasks` according to `mode`.
///
/// Results are returned in input order regardless of completion order. The
/// first error wins; in sequential mode later tasks are never polled.
pub async fn run_all<I, Fut, T, E>(mode: ExecutionMode, tasks: I) -> Result<Vec<T>, E>
where
    I: IntoIterator<Item = Fut>,
    Fut: Future<Output = Result<T, E>>,
{
    match mode {
        ExecutionMode::Parallel => try_join_all(tasks).await,
        ExecutionMode::Sequential => {
            let mut results = Vec::new();
            for task in tasks {
                results.push(task.await?);
            }
            Ok(results)
        }
    }
}
