//! Bounded parallel mapper: applies a function to every argument on a scoped
//! worker pool, collecting the arguments that failed instead of aborting the batch.
//! Progress and diagnostics go to a pluggable `ProgressSink`.
use std::any::Any;
use std::fmt;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, info, warn};

use crate::error::{Error, Result, TaskFailure};

/// Worker count used when the caller does not choose one.
pub const DEFAULT_WORKERS: usize = 40;

/// Name prefix of mapper worker threads.
pub const WORKER_THREAD_PREFIX: &str = "qytools-worker-";

/// Receives progress ticks and failure diagnostics from a running batch.
pub trait ProgressSink: Send + Sync {
    fn start(&self, total: usize);
    /// Called once per finished task; `completed` increases by one on every call.
    fn tick(&self, completed: usize, total: usize);
    fn failure(&self, arg: &str, message: &str);
    fn finish(&self, summary: &PoolSummary);
}

/// Type-erased completion summary handed to sinks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolSummary {
    pub total: usize,
    pub completed: usize,
    pub failed: Vec<String>,
}

/// Result of a mapper run
#[derive(Debug, Clone)]
pub struct PoolReport<A> {
    pub total: usize,
    pub completed: usize,
    pub failures: Vec<TaskFailure<A>>,
}

impl<A> Default for PoolReport<A> {
    fn default() -> Self {
        Self {
            total: 0,
            completed: 0,
            failures: Vec::new(),
        }
    }
}

impl<A> PoolReport<A> {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed_count(&self) -> usize {
        self.failures.len()
    }

    pub fn succeeded_count(&self) -> usize {
        self.completed - self.failures.len()
    }

    pub fn failed_args(&self) -> Vec<&A> {
        self.failures.iter().map(TaskFailure::arg).collect()
    }

    pub fn into_failed_args(self) -> Vec<A> {
        self.failures.into_iter().map(TaskFailure::into_arg).collect()
    }
}

impl<A: fmt::Debug> PoolReport<A> {
    pub fn summary(&self) -> PoolSummary {
        PoolSummary {
            total: self.total,
            completed: self.completed,
            failed: self
                .failures
                .iter()
                .map(|f| format!("{:?}", f.arg()))
                .collect(),
        }
    }
}

/// Default sink: progress at debug level, failures as warnings.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn start(&self, total: usize) {
        if total == 0 {
            info!("0 tasks");
        } else {
            info!("Processing {} tasks", total);
        }
    }

    fn tick(&self, completed: usize, total: usize) {
        debug!("Progress: {}/{}", completed, total);
    }

    fn failure(&self, arg: &str, message: &str) {
        warn!("Error processing: {} ({})", arg, message);
    }

    fn finish(&self, summary: &PoolSummary) {
        if summary.failed.is_empty() {
            info!("Completed {}/{} tasks", summary.completed, summary.total);
            return;
        }
        warn!("Total {} tasks failed:", summary.failed.len());
        for arg in &summary.failed {
            warn!("  - {}", arg);
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSink;

impl ProgressSink for SilentSink {
    fn start(&self, _total: usize) {}
    fn tick(&self, _completed: usize, _total: usize) {}
    fn failure(&self, _arg: &str, _message: &str) {}
    fn finish(&self, _summary: &PoolSummary) {}
}

/// Writes one line per event to any writer.
///
/// Lines look like `progress 3/5`, `error: 3 (boom)`, `failed 1 of 5` and `  - 3`.
pub struct LineSink<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> LineSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|e| e.into_inner())
    }

    fn write_line(&self, line: fmt::Arguments<'_>) {
        let mut out = lock(&self.out);
        // Diagnostics are best effort; a closed stream must not fail the batch.
        let _ = writeln!(out, "{}", line);
    }
}

impl LineSink<Vec<u8>> {
    /// Lines written so far.
    pub fn lines(&self) -> Vec<String> {
        let out = lock(&self.out);
        String::from_utf8_lossy(&out)
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl<W: Write + Send> ProgressSink for LineSink<W> {
    fn start(&self, total: usize) {
        self.write_line(format_args!("{} tasks", total));
    }

    fn tick(&self, completed: usize, total: usize) {
        self.write_line(format_args!("progress {}/{}", completed, total));
    }

    fn failure(&self, arg: &str, message: &str) {
        self.write_line(format_args!("error: {} ({})", arg, message));
    }

    fn finish(&self, summary: &PoolSummary) {
        if summary.failed.is_empty() {
            return;
        }
        self.write_line(format_args!(
            "failed {} of {}",
            summary.failed.len(),
            summary.total
        ));
        for arg in &summary.failed {
            self.write_line(format_args!("  - {}", arg));
        }
    }
}

/// A validated worker-pool configuration plus its progress sink.
///
/// Each `run` builds its own thread pool and joins every worker thread before
/// returning.
#[derive(Clone)]
pub struct Multipool {
    workers: usize,
    sink: Arc<dyn ProgressSink>,
}

impl fmt::Debug for Multipool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Multipool")
            .field("workers", &self.workers)
            .finish_non_exhaustive()
    }
}

impl Multipool {
    pub fn new(workers: usize) -> Result<Self> {
        validate_workers(workers)?;
        Ok(Self {
            workers,
            sink: Arc::new(TracingSink),
        })
    }

    pub fn with_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Apply `f` to every element of `args`.
    ///
    /// A task that returns `Err` or panics is recorded in the report with its
    /// argument; the remaining tasks keep running. Only a failure to build the
    /// pool itself is returned as `Err`.
    pub fn run<A, T, E, F>(&self, f: F, args: Vec<A>) -> Result<PoolReport<A>>
    where
        A: Send + fmt::Debug,
        E: fmt::Display,
        F: Fn(&A) -> std::result::Result<T, E> + Sync,
    {
        let total = args.len();
        if total == 0 {
            self.sink.start(total);
            let report = PoolReport::default();
            self.sink.finish(&report.summary());
            return Ok(report);
        }

        let registry: Mutex<Vec<TaskFailure<A>>> = Mutex::new(Vec::new());
        let completed = Mutex::new(0usize);
        let sink = self.sink.as_ref();

        with_pool(self.workers, |pool| {
            // The sink only hears about batches whose pool was actually built.
            sink.start(total);
            pool.install(|| {
                args.into_par_iter().for_each(|arg| {
                    if let Err(failure) = run_task(&f, arg) {
                        sink.failure(&format!("{:?}", failure.arg()), failure.message());
                        lock(&registry).push(failure);
                    }
                    let mut done = lock(&completed);
                    *done += 1;
                    sink.tick(*done, total);
                });
            });
        })?;

        let report = PoolReport {
            total,
            completed: completed.into_inner().unwrap_or_else(|e| e.into_inner()),
            failures: registry.into_inner().unwrap_or_else(|e| e.into_inner()),
        };
        self.sink.finish(&report.summary());
        Ok(report)
    }
}

/// Apply `f` to every argument on `workers` threads, logging through `tracing`.
///
/// ```
/// use qytools::multipool;
///
/// let report = multipool(
///     |x: &u32| if *x == 3 { Err("three") } else { Ok(()) },
///     vec![1, 2, 3, 4, 5],
///     2,
/// )
/// .unwrap();
/// assert_eq!(report.into_failed_args(), vec![3]);
/// ```
pub fn multipool<A, T, E, F>(f: F, args: Vec<A>, workers: usize) -> Result<PoolReport<A>>
where
    A: Send + fmt::Debug,
    E: fmt::Display,
    F: Fn(&A) -> std::result::Result<T, E> + Sync,
{
    Multipool::new(workers)?.run(f, args)
}

/// Run `op` inside a dedicated pool of `workers` threads and tear the pool down afterwards.
pub fn run_scoped<R, OP>(workers: usize, op: OP) -> Result<R>
where
    R: Send,
    OP: FnOnce() -> R + Send,
{
    validate_workers(workers)?;
    with_pool(workers, |pool| pool.install(op))
}

fn validate_workers(workers: usize) -> Result<()> {
    if workers == 0 {
        return Err(Error::invalid_config(format!(
            "worker count must be positive, got {}",
            workers
        )));
    }
    Ok(())
}

/// Build a pool of `workers` threads, hand it to `op`, and join every worker
/// thread before returning.
fn with_pool<R>(workers: usize, op: impl FnOnce(&ThreadPool) -> R) -> Result<R> {
    let out = ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("{}{}", WORKER_THREAD_PREFIX, i))
        .build_scoped(|thread| thread.run(), op)?;
    Ok(out)
}

fn run_task<A, T, E, F>(f: &F, arg: A) -> std::result::Result<(), TaskFailure<A>>
where
    E: fmt::Display,
    F: Fn(&A) -> std::result::Result<T, E>,
{
    match panic::catch_unwind(AssertUnwindSafe(|| f(&arg))) {
        Ok(Ok(_)) => Ok(()),
        Ok(Err(e)) => Err(TaskFailure::Failed {
            arg,
            message: e.to_string(),
        }),
        Err(payload) => Err(TaskFailure::Panicked {
            arg,
            message: panic_message(payload.as_ref()),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

// Registry and counter stay usable even if a sink panicked while holding the lock.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn line_sink() -> Arc<LineSink<Vec<u8>>> {
        Arc::new(LineSink::new(Vec::new()))
    }

    #[test]
    fn zero_workers_is_invalid_configuration() {
        let calls = AtomicUsize::new(0);
        let err = multipool(
            |_: &u8| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(())
            },
            vec![1, 2, 3],
            0,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn empty_batch_completes_immediately() {
        let sink = line_sink();
        let pool = Multipool::new(4).unwrap().with_sink(sink.clone());
        let report = pool.run(|_: &u8| Ok::<_, String>(()), Vec::new()).unwrap();
        assert!(report.is_success());
        assert_eq!(report.total, 0);
        assert_eq!(report.completed, 0);
        assert_eq!(sink.lines(), vec!["0 tasks".to_string()]);
    }

    #[test]
    fn single_failure_is_recorded_and_reported() {
        let sink = line_sink();
        let pool = Multipool::new(2).unwrap().with_sink(sink.clone());
        let report = pool
            .run(
                |x: &i32| {
                    if *x == 3 {
                        Err(format!("cannot process {}", x))
                    } else {
                        Ok(())
                    }
                },
                vec![1, 2, 3, 4, 5],
            )
            .unwrap();

        assert_eq!(report.completed, 5);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.succeeded_count(), 4);
        assert_eq!(report.failed_args(), vec![&3]);

        let lines = sink.lines();
        let ticks: Vec<&String> = lines.iter().filter(|l| l.starts_with("progress")).collect();
        assert_eq!(ticks.len(), 5);
        assert_eq!(ticks.last().unwrap().as_str(), "progress 5/5");
        assert!(lines.contains(&"error: 3 (cannot process 3)".to_string()));
        assert!(lines.contains(&"failed 1 of 5".to_string()));
        assert_eq!(lines.last().unwrap(), "  - 3");
    }

    #[test]
    fn ticks_are_strictly_increasing() {
        let sink = line_sink();
        let pool = Multipool::new(8).unwrap().with_sink(sink.clone());
        pool.run(|_: &usize| Ok::<_, String>(()), (0..200).collect())
            .unwrap();

        let ticks: Vec<usize> = sink
            .lines()
            .iter()
            .filter_map(|l| l.strip_prefix("progress "))
            .map(|l| l.split('/').next().unwrap().parse().unwrap())
            .collect();
        assert_eq!(ticks, (1..=200).collect::<Vec<_>>());
    }

    #[test]
    fn panics_are_caught_and_recorded() {
        let report = Multipool::new(3)
            .unwrap()
            .with_sink(Arc::new(SilentSink))
            .run(
                |x: &u32| -> std::result::Result<(), String> {
                    if x % 4 == 0 {
                        panic!("bad input {}", x);
                    }
                    Ok(())
                },
                (1..=12).collect(),
            )
            .unwrap();

        assert_eq!(report.completed, 12);
        assert!(report.failures.iter().all(TaskFailure::is_panic));
        assert!(report.failures[0].message().starts_with("bad input"));
        let failed: HashSet<u32> = report.into_failed_args().into_iter().collect();
        assert_eq!(failed, HashSet::from([4, 8, 12]));
    }

    #[test]
    fn more_workers_than_tasks() {
        let seen = AtomicUsize::new(0);
        let report = Multipool::new(64)
            .unwrap()
            .with_sink(Arc::new(SilentSink))
            .run(
                |_: &u8| {
                    seen.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>(())
                },
                vec![1, 2],
            )
            .unwrap();
        assert!(report.is_success());
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[derive(Default)]
    struct EventLog(Mutex<Vec<&'static str>>);

    impl ProgressSink for EventLog {
        fn start(&self, _total: usize) {
            lock(&self.0).push("start");
        }
        fn tick(&self, _completed: usize, _total: usize) {
            lock(&self.0).push("tick");
        }
        fn failure(&self, _arg: &str, _message: &str) {
            lock(&self.0).push("failure");
        }
        fn finish(&self, _summary: &PoolSummary) {
            lock(&self.0).push("finish");
        }
    }

    #[test]
    fn sink_sees_start_once_before_ticks_and_finish_last() {
        let log = Arc::new(EventLog::default());
        Multipool::new(4)
            .unwrap()
            .with_sink(log.clone())
            .run(
                |x: &u8| if *x == 2 { Err("two") } else { Ok(()) },
                vec![1, 2, 3],
            )
            .unwrap();

        let events = lock(&log.0).clone();
        assert_eq!(events.first(), Some(&"start"));
        assert_eq!(events.last(), Some(&"finish"));
        assert_eq!(events.iter().filter(|e| **e == "start").count(), 1);
        assert_eq!(events.iter().filter(|e| **e == "finish").count(), 1);
        assert_eq!(events.iter().filter(|e| **e == "tick").count(), 3);
        assert_eq!(events.iter().filter(|e| **e == "failure").count(), 1);
    }

    #[test]
    fn run_scoped_uses_requested_thread_count() {
        let threads = run_scoped(3, rayon::current_num_threads).unwrap();
        assert_eq!(threads, 3);
        assert!(matches!(
            run_scoped(0, || ()),
            Err(Error::InvalidConfiguration { .. })
        ));
    }
}
