use crate::converter::{Converter, ProcessResult};
use crossbeam_channel::bounded;
use std::path::Path;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

const QUEUE_CAPACITY: usize = 64;

/// Per-result counts for one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
    pub total: usize,
}

impl BatchSummary {
    pub fn succeeded(&self) -> usize {
        self.created + self.updated + self.unchanged
    }
}

#[derive(Default)]
struct Counters {
    created: AtomicUsize,
    updated: AtomicUsize,
    unchanged: AtomicUsize,
    skipped: AtomicUsize,
    failed: AtomicUsize,
}

impl Counters {
    fn record(&self, result: ProcessResult) {
        let counter = match result {
            ProcessResult::Created => &self.created,
            ProcessResult::Updated => &self.updated,
            ProcessResult::Unchanged => &self.unchanged,
            ProcessResult::Skipped => &self.skipped,
            ProcessResult::Failed => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn summary(&self, total: usize) -> BatchSummary {
        BatchSummary {
            created: self.created.load(Ordering::Relaxed),
            updated: self.updated.load(Ordering::Relaxed),
            unchanged: self.unchanged.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            total,
        }
    }
}

/// Convert `inputs` into `output_dir` on `converter.options().workers` threads.
///
/// Every file is attempted exactly once; a failure never stops the others.
/// Completion order across files is unspecified. `on_done` runs on the worker
/// thread after each file.
pub fn execute<F>(
    converter: &Converter,
    inputs: &[PathBuf],
    output_dir: &Path,
    on_done: F,
) -> BatchSummary
where
    F: Fn(&Path, ProcessResult) + Sync,
{
    let counters = Counters::default();
    if inputs.is_empty() {
        return counters.summary(0);
    }

    let (tx, rx) = bounded::<&Path>(QUEUE_CAPACITY);
    let n_workers = converter.options().workers.clamp(1, inputs.len());

    std::thread::scope(|s| {
        for _ in 0..n_workers {
            let rx = rx.clone();
            let (counters, on_done) = (&counters, &on_done);

            s.spawn(move || {
                while let Ok(input) = rx.recv() {
                    let result = converter.process(input, output_dir);
                    counters.record(result);
                    on_done(input, result);
                }
            });
        }

        drop(rx);

        for input in inputs {
            if tx.send(input.as_path()).is_err() {
                break;
            }
        }

        drop(tx);
    });

    counters.summary(inputs.len())
}
