//! Fan-out of independent fetch tasks
//!
//! Every task runs to completion on its own tokio task; nothing is cancelled
//! when a sibling fails. The first error to *complete* is returned, the
//! others are only logged.

use crate::error::{Result, ScrapeError};
use futures::future::BoxFuture;
use tokio::task::JoinSet;
use tracing::warn;

pub type Task<T> = BoxFuture<'static, Result<T>>;

/// Run `tasks` in parallel and wait for all of them.
///
/// On success the outputs are returned in submission order.
pub async fn concurrent_fetch<T>(tasks: Vec<Task<T>>) -> Result<Vec<T>>
where
    T: Send + 'static,
{
    let mut outputs: Vec<Option<T>> = tasks.iter().map(|_| None).collect();
    let mut set = JoinSet::new();

    for (index, task) in tasks.into_iter().enumerate() {
        set.spawn(async move { (index, task.await) });
    }

    let mut first_error = None;
    while let Some(joined) = set.join_next().await {
        let error = match joined {
            Ok((index, Ok(output))) => {
                outputs[index] = Some(output);
                continue;
            }
            Ok((_, Err(e))) => e,
            Err(e) => ScrapeError::TaskFailed(e.to_string()),
        };

        warn!(error = %error, "fetch task failed");
        if first_error.is_none() {
            first_error = Some(error);
        }
    }

    match first_error {
        Some(error) => Err(error),
        None => Ok(outputs.into_iter().flatten().collect()),
    }
}
