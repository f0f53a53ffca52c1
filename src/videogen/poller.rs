use std::time::{Duration, Instant};

use tracing::info;

use crate::error::AppError;
use crate::videogen::types::GenerationJob;
use crate::videogen::veo::VideoGenerator;

/// How long and how often to re-query a pending generation job
#[derive(Debug, Clone)]
pub struct PollPolicy {
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub backoff_factor: f64,
    pub max_attempts: u32,
    pub timeout: Duration,
}

impl PollPolicy {
    /// Delay before the next status query, given the one just used
    fn next_delay(&self, current: Duration) -> Duration {
        let factor = if self.backoff_factor.is_finite() && self.backoff_factor >= 1.0 {
            self.backoff_factor
        } else {
            1.0
        };
        let nanos = (current.as_nanos() as f64 * factor).min(self.max_interval.as_nanos() as f64);
        Duration::from_nanos(nanos as u64)
    }
}

/// Re-query `job` until the service reports it done.
///
/// Sleeps between queries with exponential backoff. Fails with [`AppError::Timeout`] once
/// `max_attempts` queries were spent or `timeout` elapsed. Dropping the future cancels the wait.
pub async fn wait_for_completion(
    generator: &dyn VideoGenerator,
    job: GenerationJob,
    policy: &PollPolicy,
) -> Result<GenerationJob, AppError> {
    let started = Instant::now();
    let mut attempts = 0u32;

    let outcome = tokio::time::timeout(
        policy.timeout,
        poll_loop(generator, job, policy, &mut attempts),
    )
    .await;

    match outcome {
        Ok(result) => result,
        Err(_) => Err(AppError::Timeout {
            attempts,
            elapsed: started.elapsed(),
        }),
    }
}

/// `attempts` counts completed status queries and survives cancellation of this future
async fn poll_loop(
    generator: &dyn VideoGenerator,
    mut job: GenerationJob,
    policy: &PollPolicy,
    attempts: &mut u32,
) -> Result<GenerationJob, AppError> {
    let started = Instant::now();
    let mut delay = policy.initial_interval.min(policy.max_interval);

    while !job.done {
        if *attempts >= policy.max_attempts {
            return Err(AppError::Timeout {
                attempts: *attempts,
                elapsed: started.elapsed(),
            });
        }

        info!(
            "Waiting for video generation... ({} polls, {}s elapsed)",
            attempts,
            started.elapsed().as_secs()
        );
        tokio::time::sleep(delay).await;

        job = generator.refresh(&job).await?;
        *attempts += 1;
        delay = policy.next_delay(delay);
    }

    info!(
        "Operation {} completed after {} polls",
        job.name, attempts
    );
    Ok(job)
}
