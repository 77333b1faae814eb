//! Bounded completion polling
//!
//! A [`PollSession`] re-fetches the job listing once per tick, correlates the
//! requested identifier with [`find_match`], and settles on one of three
//! terminal outcomes. Elapsed time is the sum of the poll intervals slept, so a
//! session that never sees a terminal status stops at the first multiple of the
//! interval that reaches the wait budget.

use crate::error::{Error, Result};
use crate::matcher::find_match;
use crate::types::{DEFAULT_FAILURE_MESSAGE, JobRecord, JobStatus, RequestedIdentifier};
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;

/// Source of job listing snapshots
///
/// Implemented by [`UpstreamClient`](crate::upstream::UpstreamClient); tests
/// substitute scripted listings.
#[async_trait]
pub trait JobListing: Send + Sync {
    /// Fetch the full, current listing
    async fn fetch_listing(&self) -> Result<Vec<JobRecord>>;
}

/// Where a session currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    /// Still waiting for a terminal status
    Pending,
    /// The job finished successfully
    Completed,
    /// The job failed upstream
    Failed,
    /// The wait budget ran out
    Timeout,
}

impl PollState {
    /// Whether no further ticks will change the state
    pub fn is_terminal(self) -> bool {
        !matches!(self, PollState::Pending)
    }
}

/// Terminal result of a session
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// Completed; the artifact URL is absent when the record carried none
    Completed {
        /// Artifact URL by `url`, `videoUrl`, `video_url` precedence
        video_url: Option<String>,
        /// The matched record
        record: JobRecord,
    },
    /// Failed upstream
    Failed {
        /// Failure text by `error`, `message` precedence
        message: String,
        /// The matched record
        record: JobRecord,
    },
    /// No terminal status within the wait budget
    Timeout {
        /// Accumulated wait time
        elapsed: Duration,
    },
}

impl PollOutcome {
    /// The state this outcome represents
    pub fn state(&self) -> PollState {
        match self {
            PollOutcome::Completed { .. } => PollState::Completed,
            PollOutcome::Failed { .. } => PollState::Failed,
            PollOutcome::Timeout { .. } => PollState::Timeout,
        }
    }
}

/// One caller's wait for one job
#[derive(Debug)]
pub struct PollSession {
    identifier: RequestedIdentifier,
    started_at: Instant,
    interval: Duration,
    max_wait: Duration,
    elapsed: Duration,
    ticks: u32,
    outcome: Option<PollOutcome>,
}

impl PollSession {
    /// Start a session
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] for a zero poll interval, which would never
    /// accumulate elapsed time.
    pub fn new(
        identifier: impl Into<RequestedIdentifier>,
        interval: Duration,
        max_wait: Duration,
    ) -> Result<Self> {
        if interval.is_zero() {
            return Err(Error::Validation(
                "poll interval must be greater than zero".into(),
            ));
        }

        Ok(Self {
            identifier: identifier.into(),
            started_at: Instant::now(),
            interval,
            max_wait,
            elapsed: Duration::ZERO,
            ticks: 0,
            outcome: None,
        })
    }

    /// The identifier being polled
    pub fn identifier(&self) -> &RequestedIdentifier {
        &self.identifier
    }

    /// Current state
    pub fn state(&self) -> PollState {
        self.outcome
            .as_ref()
            .map_or(PollState::Pending, PollOutcome::state)
    }

    /// Terminal outcome, once reached
    pub fn outcome(&self) -> Option<&PollOutcome> {
        self.outcome.as_ref()
    }

    /// Number of listing fetches performed
    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    /// Accumulated wait time (sum of intervals slept)
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Wait budget
    pub fn max_wait(&self) -> Duration {
        self.max_wait
    }

    /// Advance by one tick.
    ///
    /// Fetches the listing, classifies the matched record, and sleeps one
    /// interval when the job is still pending. Calling this on a terminal
    /// session returns the terminal state without fetching.
    ///
    /// # Errors
    ///
    /// Any listing failure, unchanged. The session stays pending.
    pub async fn tick<L>(&mut self, listing: &L) -> Result<PollState>
    where
        L: JobListing + ?Sized,
    {
        if self.state().is_terminal() {
            return Ok(self.state());
        }

        let records = listing.fetch_listing().await?;
        self.ticks += 1;

        if let Some(found) = find_match(&self.identifier, &records) {
            let record = found.record;
            tracing::debug!(
                identifier = %self.identifier,
                tick = self.ticks,
                rule = ?found.rule,
                status = record.status.as_deref().unwrap_or_default(),
                "Poll tick matched record"
            );

            match record.job_status() {
                JobStatus::Completed => {
                    self.finish(PollOutcome::Completed {
                        video_url: record.artifact_url().map(str::to_string),
                        record: record.clone(),
                    });
                    return Ok(PollState::Completed);
                }
                JobStatus::Failed => {
                    self.finish(PollOutcome::Failed {
                        message: record
                            .error_message()
                            .unwrap_or(DEFAULT_FAILURE_MESSAGE)
                            .to_string(),
                        record: record.clone(),
                    });
                    return Ok(PollState::Failed);
                }
                JobStatus::Pending => {}
            }
        } else {
            tracing::debug!(
                identifier = %self.identifier,
                tick = self.ticks,
                listing_len = records.len(),
                "Poll tick found no matching record"
            );
        }

        tokio::time::sleep(self.interval).await;
        self.elapsed += self.interval;

        if self.elapsed >= self.max_wait {
            self.finish(PollOutcome::Timeout {
                elapsed: self.elapsed,
            });
        }

        Ok(self.state())
    }

    /// Tick until terminal and return the outcome
    pub async fn run<L>(&mut self, listing: &L) -> Result<PollOutcome>
    where
        L: JobListing + ?Sized,
    {
        loop {
            self.tick(listing).await?;
            if let Some(outcome) = &self.outcome {
                return Ok(outcome.clone());
            }
        }
    }

    fn finish(&mut self, outcome: PollOutcome) {
        tracing::info!(
            identifier = %self.identifier,
            state = ?outcome.state(),
            ticks = self.ticks,
            elapsed_secs = self.elapsed.as_secs(),
            wall_ms = self.started_at.elapsed().as_millis() as u64,
            "Poll session finished"
        );
        self.outcome = Some(outcome);
    }
}
