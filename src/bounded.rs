//! Bounded concurrent task set shared by the fetch and write stages.

use crate::error::MirrorError;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::error;

/// Runs every job on its own task, at most `max_in_flight` at a time.
///
/// A job does not start until it holds a permit. The first failure is
/// returned and the remaining tasks are aborted when the set is dropped.
/// Results come back in completion order.
pub(crate) async fn run_bounded<T, Fut>(
    jobs: Vec<Fut>,
    max_in_flight: usize,
    stage: &str,
) -> Result<Vec<T>, MirrorError>
where
    T: Send + 'static,
    Fut: Future<Output = Result<T, MirrorError>> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(max_in_flight));
    let mut tasks: JoinSet<Result<T, MirrorError>> = JoinSet::new();

    for job in jobs {
        let semaphore = Arc::clone(&semaphore);
        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await?;
            job.await
        });
    }

    let mut results = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(value)) => results.push(value),
            Ok(Err(e)) => {
                error!("{} failed: {}", stage, e);
                return Err(e);
            }
            Err(e) => {
                error!("Task join error: {}", e);
                return Err(MirrorError::TaskFailed(e));
            }
        }
    }

    Ok(results)
}
