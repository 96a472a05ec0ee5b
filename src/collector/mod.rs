//! Fan-out/fan-in over independent sub-fetches.
//!
//! Every item is fetched concurrently on the current task. A failing fetch is
//! logged and replaced by the item's degraded record, so one failure never
//! reaches its siblings or the caller. Results keep the input order.

use futures::future::join_all;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// A record that can stand in for a failed fetch of `I`.
pub trait Degradable<I> {
    /// Same-shaped record carrying the failure marker and no child data.
    fn degraded(item: &I) -> Self;
}

pub async fn collect_all<I, T, E, F, Fut>(items: &[I], fetch: F) -> Vec<T>
where
    T: Degradable<I>,
    E: Display,
    F: Fn(&I) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let fetches = items.iter().map(|item| {
        let pending = fetch(item);
        async move {
            match pending.await {
                Ok(fetched) => fetched,
                Err(err) => {
                    warn!("Sub-fetch failed, degrading item: {}", err);
                    crate::metrics::record_collector_failure("error");
                    T::degraded(item)
                }
            }
        }
    });
    join_all(fetches).await
}

/// Like [`collect_all`], with `deadline` applied to each fetch on its own.
/// A fetch still pending at its deadline is treated as failed.
pub async fn collect_all_with_deadline<I, T, E, F, Fut>(
    items: &[I],
    deadline: Duration,
    fetch: F,
) -> Vec<T>
where
    T: Degradable<I>,
    E: Display,
    F: Fn(&I) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let fetches = items.iter().map(|item| {
        let pending = tokio::time::timeout(deadline, fetch(item));
        async move {
            match pending.await {
                Ok(Ok(fetched)) => fetched,
                Ok(Err(err)) => {
                    warn!("Sub-fetch failed, degrading item: {}", err);
                    crate::metrics::record_collector_failure("error");
                    T::degraded(item)
                }
                Err(_) => {
                    warn!("Sub-fetch timed out after {:?}, degrading item", deadline);
                    crate::metrics::record_collector_failure("timeout");
                    T::degraded(item)
                }
            }
        }
    });
    join_all(fetches).await
}
