use crate::errors::BadelfError;
use crossbeam_utils::thread;
use std::ops::Range;
use sysinfo::System;

/// Memory, in GB, assumed to be needed by each worker.
pub const DEFAULT_WORKER_MEMORY: f64 = 2.;

/// How many workers a run uses.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Parallelism {
    /// One worker per core, capped by memory_budget / worker_memory (GB). The
    /// budget defaults to the memory currently available.
    Auto {
        memory_budget: Option<f64>,
        worker_memory: f64,
    },
    /// Exactly this many workers.
    Explicit(usize),
}

impl Default for Parallelism {
    fn default() -> Self {
        Self::Auto {
            memory_budget: None,
            worker_memory: DEFAULT_WORKER_MEMORY,
        }
    }
}

impl Parallelism {
    /// The worker count, never less than one.
    pub fn threads(&self) -> usize {
        match *self {
            Self::Explicit(n) => n.max(1),
            Self::Auto {
                memory_budget,
                worker_memory,
            } => {
                let cores = num_cpus::get();
                let threads = match memory_budget.or_else(available_memory) {
                    Some(budget) if worker_memory > 0. => {
                        cores.min((budget / worker_memory).floor() as usize)
                    }
                    _ => cores,
                };
                threads.max(1)
            }
        }
    }
}

/// The memory available to new allocations in GB, None if the platform does
/// not report it.
pub fn available_memory() -> Option<f64> {
    let mut system = System::new();
    system.refresh_memory();
    match system.available_memory() {
        0 => None,
        bytes => Some(bytes as f64 / 1e9),
    }
}

/// A scoped executor for one partition run. Every call splits its work into
/// one contiguous chunk per worker, runs the chunks on scoped threads and
/// joins all of them before returning, so consecutive calls are separated by
/// a barrier. The first failed chunk fails the whole call.
pub struct WorkerPool {
    pub threads: usize,
}

impl WorkerPool {
    pub fn new(parallelism: Parallelism) -> Self {
        Self {
            threads: parallelism.threads(),
        }
    }

    /// Runs `task` over consecutive ranges covering 0..len, returning the
    /// result of each range in order.
    pub fn map_ranges<T, F>(
        &self,
        len: usize,
        name: &str,
        task: F,
    ) -> Result<Vec<T>, BadelfError>
    where
        T: Send,
        F: Fn(Range<usize>) -> Result<T, BadelfError> + Sync,
    {
        if len == 0 {
            return Ok(Vec::new());
        }
        let chunk_size = (len / self.threads) + (len % self.threads).min(1);
        if self.threads == 1 {
            return task(0..len).map(|t| vec![t]);
        }
        let task = &task;
        let worker_panic = || BadelfError::WorkerPanic {
            task: String::from(name),
        };
        thread::scope(|s| {
            let spawned_threads = (0..len)
                .step_by(chunk_size)
                .map(|start| {
                    let end = (start + chunk_size).min(len);
                    s.spawn(move |_| task(start..end))
                })
                .collect::<Vec<_>>();
            spawned_threads
                .into_iter()
                .map(|thread| thread.join().map_err(|_| worker_panic())?)
                .collect::<Result<Vec<T>, BadelfError>>()
        })
        .map_err(|_| worker_panic())?
    }

    /// Runs `task` over consecutive chunks of `items`.
    pub fn map_chunks<I, T, F>(
        &self,
        items: &[I],
        name: &str,
        task: F,
    ) -> Result<Vec<T>, BadelfError>
    where
        I: Sync,
        T: Send,
        F: Fn(&[I]) -> Result<T, BadelfError> + Sync,
    {
        self.map_ranges(items.len(), name, |range| task(&items[range]))
    }
}
