//! Bounded-concurrency batch scheduling of per-URL work.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::future::join_all;
use tokio::time::Instant;
use tracing::{debug, warn};

use docmill_shared::{
    FetchOutcome, ProgressEvent, ProgressReporter, Result, Stage, UnitStatus,
};

/// Runs per-URL work in fixed-size batches.
///
/// Within a batch every unit runs concurrently and every unit settles before
/// the next batch starts; one failure never cancels its siblings. Output
/// preserves input order.
pub struct FetchScheduler {
    concurrency: usize,
    inter_batch_delay_ms: u64,
}

impl FetchScheduler {
    pub fn new(concurrency: usize, inter_batch_delay_ms: u64) -> Self {
        Self {
            concurrency: concurrency.max(1),
            inter_batch_delay_ms,
        }
    }

    /// Run `work` over every URL. Each completed unit emits one progress
    /// observation on the side channel, success or failure alike; errors
    /// become [`FetchOutcome::Failure`] values, never faults.
    pub async fn run<T, F, Fut>(
        &self,
        stage: Stage,
        urls: &[String],
        progress: &dyn ProgressReporter,
        work: F,
    ) -> Vec<FetchOutcome<T>>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let total = urls.len();
        let completed = AtomicUsize::new(0);
        let mut outcomes: Vec<FetchOutcome<T>> = Vec::with_capacity(total);

        for (batch_index, batch) in urls.chunks(self.concurrency).enumerate() {
            if batch_index > 0 && self.inter_batch_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.inter_batch_delay_ms)).await;
            }
            debug!(batch = batch_index, size = batch.len(), "starting batch");

            let units = batch.iter().map(|url| {
                let url = url.clone();
                let work = &work;
                let completed = &completed;
                async move {
                    let started = Instant::now();
                    let result = work(url.clone()).await;
                    let elapsed_ms = started.elapsed().as_millis() as u64;
                    let current = completed.fetch_add(1, Ordering::SeqCst) + 1;

                    match result {
                        Ok(value) => {
                            progress.observe(ProgressEvent::unit(
                                stage,
                                current,
                                total,
                                Some(url),
                                UnitStatus::Success,
                            ));
                            FetchOutcome::Success(value)
                        }
                        Err(e) => {
                            let error = e.to_string();
                            warn!(url, %error, elapsed_ms, "unit failed");
                            progress.observe(ProgressEvent::unit(
                                stage,
                                current,
                                total,
                                Some(url.clone()),
                                UnitStatus::Error,
                            ));
                            FetchOutcome::Failure {
                                url,
                                error,
                                elapsed_ms,
                            }
                        }
                    }
                }
            });

            outcomes.extend(join_all(units).await);
        }

        outcomes
    }
}
