//! The scheduler loop — arms the earliest job, sleeps until it is due,
//! fires it as an independent task, then re-arms for the following day.

use chrono::{DateTime, FixedOffset, Utc};
use tokio::sync::watch;

use rooster_core::config::FireTimeConfig;

use crate::clock::next_occurrence;

/// A broadcast job: a daily trigger time plus an optional topic hint for
/// content enrichment. Registered once at startup, immutable thereafter.
#[derive(Debug, Clone)]
pub struct Job {
    pub name: String,
    pub fire: FireTimeConfig,
    pub topic_hint: Option<String>,
}

impl Job {
    pub fn daily(name: &str, fire: FireTimeConfig) -> Self {
        Self {
            name: name.to_string(),
            fire,
            topic_hint: None,
        }
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic_hint = Some(topic.into());
        self
    }
}

/// Observable scheduler lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// No jobs registered yet.
    Idle,
    /// Sleeping until the earliest next occurrence.
    Armed,
    /// A job is being handed off to its broadcast task.
    Firing,
    /// Shutdown requested; terminal.
    Stopped,
}

/// The timer-driven scheduler. Jobs at distinct times are independent;
/// overlapping fire times both run with no ordering promised between them.
pub struct Scheduler {
    jobs: Vec<Job>,
    offset: FixedOffset,
    state_tx: watch::Sender<SchedulerState>,
}

impl Scheduler {
    pub fn new(jobs: Vec<Job>, offset: FixedOffset) -> Self {
        let initial = if jobs.is_empty() {
            SchedulerState::Idle
        } else {
            SchedulerState::Armed
        };
        let (state_tx, _) = watch::channel(initial);
        Self {
            jobs,
            offset,
            state_tx,
        }
    }

    /// Subscribe to lifecycle transitions (used by logs and tests).
    pub fn state(&self) -> watch::Receiver<SchedulerState> {
        self.state_tx.subscribe()
    }

    /// The next UTC instant any job fires, given `now`.
    pub fn next_fire_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.jobs
            .iter()
            .map(|j| next_occurrence(j.fire, now, self.offset))
            .min()
    }

    /// Run the timer loop until `shutdown` flips to true.
    ///
    /// `on_fire` receives the due job and returns the broadcast future; the
    /// loop spawns it and immediately re-arms, so a slow pass never delays
    /// the next trigger. In-flight passes are left to finish on shutdown.
    pub async fn run<F, Fut>(self, on_fire: F, mut shutdown: watch::Receiver<bool>)
    where
        F: Fn(Job) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        if self.jobs.is_empty() {
            // Config validation rejects an empty schedule; this is only
            // reachable from tests driving the engine directly.
            let _ = self.state_tx.send(SchedulerState::Stopped);
            return;
        }

        let mut next_runs: Vec<DateTime<Utc>> = self
            .jobs
            .iter()
            .map(|j| next_occurrence(j.fire, Utc::now(), self.offset))
            .collect();

        for (job, at) in self.jobs.iter().zip(&next_runs) {
            tracing::info!("job '{}' armed, next fire at {}", job.name, at);
        }

        loop {
            let _ = self.state_tx.send(SchedulerState::Armed);

            let (idx, due_at) = match next_runs
                .iter()
                .copied()
                .enumerate()
                .min_by_key(|(_, at)| *at)
            {
                Some(found) => found,
                None => break,
            };

            let wait = (due_at - Utc::now()).to_std().unwrap_or_default();
            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                changed = shutdown.changed() => {
                    // A dropped sender counts as shutdown.
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
            }

            let _ = self.state_tx.send(SchedulerState::Firing);
            let job = self.jobs[idx].clone();
            tracing::info!("job '{}' fired", job.name);
            tokio::spawn(on_fire(job));

            // Re-arm for the following day.
            next_runs[idx] = next_occurrence(self.jobs[idx].fire, due_at + chrono::Duration::minutes(1), self.offset);
        }

        let _ = self.state_tx.send(SchedulerState::Stopped);
        tracing::info!("scheduler stopped");
    }
}
