//! Capped, bounded-concurrency batch execution with per-item error capture.

use futures::stream::{self, StreamExt};
use influencer_core::EngineResult;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::future::Future;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Items left over once the batch cap was reached.
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct BatchRunner {
    limit: usize,
    concurrency: usize,
}

impl BatchRunner {
    pub fn new(limit: usize, concurrency: usize) -> Self {
        Self {
            limit,
            concurrency: concurrency.max(1),
        }
    }

    /// Runs `op` over at most `limit` items. A failing item is logged and
    /// counted; it never stops the rest of the batch.
    pub async fn run<T, F, Fut>(&self, job: &'static str, items: Vec<T>, op: F) -> BatchSummary
    where
        T: Display + Clone,
        F: Fn(T) -> Fut,
        Fut: Future<Output = EngineResult<()>>,
    {
        let total = items.len();
        let attempted = total.min(self.limit);

        let outcomes: Vec<(T, EngineResult<()>)> = stream::iter(items.into_iter().take(attempted))
            .map(|item| {
                let fut = op(item.clone());
                async move { (item, fut.await) }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut summary = BatchSummary {
            attempted,
            skipped: total - attempted,
            ..Default::default()
        };
        for (item, outcome) in outcomes {
            match outcome {
                Ok(()) => summary.succeeded += 1,
                Err(e) => {
                    summary.failed += 1;
                    warn!(job, item = %item, error = %e, "Batch item failed");
                }
            }
        }

        metrics::counter!("scheduler.items_succeeded", "job" => job).increment(summary.succeeded as u64);
        metrics::counter!("scheduler.items_failed", "job" => job).increment(summary.failed as u64);
        info!(
            job,
            attempted = summary.attempted,
            succeeded = summary.succeeded,
            failed = summary.failed,
            skipped = summary.skipped,
            "Batch finished"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use influencer_core::EngineError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_failures_do_not_abort_batch() {
        let runner = BatchRunner::new(100, 4);
        let seen = Arc::new(AtomicUsize::new(0));
        let summary = runner
            .run("test", (0..10u32).collect(), |n| {
                let seen = seen.clone();
                async move {
                    seen.fetch_add(1, Ordering::SeqCst);
                    if n % 3 == 0 {
                        Err(EngineError::Persistence(format!("item {n} unavailable")))
                    } else {
                        Ok(())
                    }
                }
            })
            .await;

        assert_eq!(seen.load(Ordering::SeqCst), 10);
        assert_eq!(
            summary,
            BatchSummary {
                attempted: 10,
                succeeded: 6,
                failed: 4,
                skipped: 0,
            }
        );
    }

    #[tokio::test]
    async fn test_batch_is_capped() {
        let runner = BatchRunner::new(3, 2);
        let summary = runner
            .run("test", vec!["a", "b", "c", "d", "e"], |_| async { Ok(()) })
            .await;
        assert_eq!(summary.attempted, 3);
        assert_eq!(summary.succeeded, 3);
        assert_eq!(summary.skipped, 2);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let runner = BatchRunner::new(50, 3);
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        runner
            .run("test", (0..20u32).collect(), |_| {
                let active = active.clone();
                let peak = peak.clone();
                async move {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::task::yield_now().await;
                    active.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .await;
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let summary = BatchRunner::new(10, 0)
            .run("test", Vec::<u32>::new(), |_| async { Ok(()) })
            .await;
        assert_eq!(summary, BatchSummary::default());
    }
}
