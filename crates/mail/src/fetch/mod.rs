//! Parallel fetch coordination
//!
//! Fans out independent remote calls onto a dedicated rayon pool and joins
//! their results on the calling thread. Workers never touch caller state:
//! each job returns an [`Apply`] action that the caller runs against its
//! own `&mut S`, one at a time, in completion order.

use anyhow::{Context, Result};
use log::{debug, warn};
use std::sync::mpsc;

/// A deferred mutation produced by a worker, applied on the owning thread
pub type Apply<S> = Box<dyn FnOnce(&mut S) + Send>;

type Job<S> = Box<dyn FnOnce() -> Apply<S> + Send>;

/// A batch of jobs that will run concurrently and apply onto `S`
pub struct Parallel<S> {
    jobs: Vec<Job<S>>,
}

impl<S> Default for Parallel<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Parallel<S> {
    pub fn new() -> Self {
        Self { jobs: Vec::new() }
    }

    /// Register a job. The job runs on a worker thread; the action it
    /// returns runs on the thread that calls [`Parallel::run`].
    pub fn add<F>(&mut self, job: F)
    where
        F: FnOnce() -> Apply<S> + Send + 'static,
    {
        self.jobs.push(Box::new(job));
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Run every job and apply all results to `state`.
    ///
    /// Returns after exactly `n` actions have been applied, where `n` is the
    /// number of jobs. A failing job reports through its action; siblings
    /// keep running.
    pub fn run(self, state: &mut S) -> Result<usize>
    where
        S: 'static,
    {
        let n = self.jobs.len();
        if n == 0 {
            return Ok(0);
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .thread_name(|i| format!("fetch-{}", i))
            .build()
            .context("Failed to start fetch workers")?;

        let (tx, rx) = mpsc::channel::<Apply<S>>();
        let mut applied = 0;

        pool.in_place_scope(|scope| {
            for job in self.jobs {
                let tx = tx.clone();
                scope.spawn(move |_| {
                    // The receiver outlives the scope, so send only fails if
                    // the caller panicked while applying
                    let _ = tx.send(job());
                });
            }
            drop(tx);

            for apply in rx.iter().take(n) {
                apply(state);
                applied += 1;
            }
        });

        debug!("Applied {} of {} fetch results", applied, n);
        Ok(applied)
    }
}

/// Aggregated outcome of a batch of remote calls
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub ok: usize,
    pub failed: usize,
    /// One representative error from the failed calls
    pub last_error: Option<String>,
}

impl BatchReport {
    pub fn record<T, E: std::fmt::Display>(&mut self, result: &Result<T, E>) {
        match result {
            Ok(_) => self.ok += 1,
            Err(e) => self.record_failure(e),
        }
    }

    pub fn record_failure(&mut self, error: impl std::fmt::Display) {
        self.failed += 1;
        self.last_error = Some(error.to_string());
    }

    pub fn total(&self) -> usize {
        self.ok + self.failed
    }

    /// Status line text, e.g. `OK, archived 3 threads` or
    /// `2 archived OK, 1 failed: timeout`
    pub fn summary(&self, verb: &str) -> String {
        if self.failed == 0 {
            format!("OK, {} {} threads", verb, self.ok)
        } else {
            format!(
                "{} {} OK, {} failed: {}",
                self.ok,
                verb,
                self.failed,
                self.last_error.as_deref().unwrap_or("unknown error")
            )
        }
    }
}

/// Run `f` over every input in parallel.
///
/// Results come back in input order; a failed call leaves `None` in its slot
/// and is counted in the report.
pub fn fetch_all<I, T, F>(inputs: Vec<I>, f: F) -> (Vec<Option<T>>, BatchReport)
where
    I: Send + 'static,
    T: Send + 'static,
    F: Fn(I) -> Result<T> + Send + Sync + 'static,
{
    struct Collected<T> {
        slots: Vec<Option<T>>,
        report: BatchReport,
    }

    let f = std::sync::Arc::new(f);
    let mut collected = Collected {
        slots: inputs.iter().map(|_| None).collect(),
        report: BatchReport::default(),
    };

    let mut batch = Parallel::new();
    for (index, input) in inputs.into_iter().enumerate() {
        let f = f.clone();
        batch.add(move || -> Apply<Collected<T>> {
            let result = f(input);
            Box::new(move |c: &mut Collected<T>| match result {
                Ok(value) => {
                    c.report.ok += 1;
                    c.slots[index] = Some(value);
                }
                Err(e) => {
                    warn!("Fetch {} failed: {:#}", index, e);
                    c.report.record_failure(format!("{:#}", e));
                }
            })
        });
    }

    if let Err(e) = batch.run(&mut collected) {
        let pending = collected.slots.len() - collected.report.total();
        for _ in 0..pending {
            collected.report.record_failure(&e);
        }
    }

    (collected.slots, collected.report)
}

/// Run a task in the background, logging its error and otherwise ignoring it
pub fn spawn_best_effort<F>(name: &str, task: F)
where
    F: FnOnce() -> Result<()> + Send + 'static,
{
    let name = name.to_string();
    let spawned = std::thread::Builder::new()
        .name(name.clone())
        .spawn(move || {
            if let Err(e) = task() {
                warn!("Background task {} failed: {:#}", name, e);
            }
        });

    if let Err(e) = spawned {
        warn!("Failed to start background task: {}", e);
    }
}
