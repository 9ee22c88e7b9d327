//! Worker thread pool with barrier semantics
//!
//! The pool is a thin layer over a [`rayon::ThreadPool`]: jobs are queued in
//! FIFO order, and a counter of pending jobs lets callers block until every
//! queued job (including jobs queued by other jobs) has run to completion.
//! A job which panics does not take down its worker; the panic is recorded
//! and reported by the next [`ThreadPool::barrier`].
use crate::Error;
use log::{error, warn};
use std::{
    any::Any,
    num::NonZeroUsize,
    panic::AssertUnwindSafe,
    sync::{Arc, Condvar, Mutex, RwLock},
};

/// Threading mode used when building a space tree
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ThreadCount {
    /// Divide recursively in the caller's thread
    One,

    /// Build a [`ThreadPool`] and queue one job per node
    ///
    /// `Many(1)` still builds a pool, with a single worker next to the
    /// (blocked) calling thread.
    Many(NonZeroUsize),
}

impl From<NonZeroUsize> for ThreadCount {
    fn from(v: NonZeroUsize) -> Self {
        match v.get() {
            1 => ThreadCount::One,
            _ => ThreadCount::Many(v),
        }
    }
}

/// Prints `-` for [`ThreadCount::One`], or the worker count
impl std::fmt::Display for ThreadCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThreadCount::One => write!(f, "-"),
            ThreadCount::Many(n) => write!(f, "{n}"),
        }
    }
}

impl ThreadCount {
    /// Returns the number of pool workers, or `None` to stay in the caller
    pub fn get(&self) -> Option<usize> {
        match self {
            ThreadCount::One => None,
            ThreadCount::Many(v) => Some(v.get()),
        }
    }
}

/// One worker per available hardware thread
impl Default for ThreadCount {
    fn default() -> Self {
        std::thread::available_parallelism()
            .map(ThreadCount::from)
            .unwrap_or(ThreadCount::One)
    }
}

////////////////////////////////////////////////////////////////////////////////

/// A counter paired with a condition variable
#[derive(Default)]
struct Counter {
    value: Mutex<usize>,
    cv: Condvar,
}

impl Counter {
    fn new(v: usize) -> Self {
        Self {
            value: Mutex::new(v),
            cv: Condvar::new(),
        }
    }

    fn increment(&self) {
        *self.value.lock().unwrap() += 1;
    }

    fn decrement(&self) {
        let mut v = self.value.lock().unwrap();
        *v -= 1;
        if *v == 0 {
            self.cv.notify_all();
        }
    }

    /// Blocks until the counter reaches zero
    fn wait_for_zero(&self) {
        let mut v = self.value.lock().unwrap();
        while *v > 0 {
            v = self.cv.wait(v).unwrap();
        }
    }
}

/// State shared between the pool handle and its running jobs
struct Inner {
    /// Worker pool, or `None` once the pool has been terminated
    workers: RwLock<Option<rayon::ThreadPool>>,

    /// Jobs which have been queued but not yet finished
    pending: Counter,

    /// Message from the first job to panic since the last barrier
    panic: Mutex<Option<String>>,
}

/// Extracts a printable message from a panic payload
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}

/// Marks one pending job as finished when dropped (even during a panic)
struct JobGuard(Arc<Inner>);

impl Drop for JobGuard {
    fn drop(&mut self) {
        self.0.pending.decrement();
    }
}

impl Inner {
    /// Queues a job, or returns it if the pool has been terminated
    fn try_spawn<F>(self: &Arc<Self>, f: F) -> Result<(), F>
    where
        F: FnOnce() + Send + 'static,
    {
        let workers = self.workers.read().unwrap();
        let Some(pool) = workers.as_ref() else {
            return Err(f);
        };
        self.pending.increment();
        let guard = JobGuard(self.clone());
        pool.spawn_fifo(move || {
            if let Err(e) = std::panic::catch_unwind(AssertUnwindSafe(f)) {
                let msg = panic_message(e.as_ref());
                error!("job panicked in thread pool: {msg}");
                guard.0.panic.lock().unwrap().get_or_insert(msg);
            }
            drop(guard);
        });
        Ok(())
    }
}

/// Handle used by running jobs to queue more work
#[derive(Clone)]
pub(crate) struct Spawner(Arc<Inner>);

impl Spawner {
    /// Queues a job, running it inline if the pool is gone
    pub(crate) fn spawn<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if let Err(f) = self.0.try_spawn(f) {
            f()
        }
    }
}

/// A fixed-size pool of worker threads
///
/// Jobs run to completion in any order, on any worker; there is no way to
/// cancel a job once it has been queued.
pub struct ThreadPool {
    inner: Arc<Inner>,
    size: usize,

    /// Number of worker threads which have not yet exited
    live: Arc<Counter>,
}

impl ThreadPool {
    /// Builds a pool with `n` worker threads
    ///
    /// Returns [`Error::EmptyThreadPool`] if `n` is zero.  Requests for more
    /// threads than the hardware supports are clamped, with a warning.
    pub fn new(n: usize) -> Result<Self, Error> {
        if n == 0 {
            return Err(Error::EmptyThreadPool);
        }
        let max = std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1);
        let size = if n > max {
            warn!("requested {n} threads, but only {max} are available");
            max
        } else {
            n
        };

        let live = Arc::new(Counter::new(size));
        let live_ = live.clone();
        let workers = rayon::ThreadPoolBuilder::new()
            .num_threads(size)
            .thread_name(|i| format!("spacetree-worker-{i}"))
            .exit_handler(move |_| live_.decrement())
            .build()?;

        Ok(Self {
            inner: Arc::new(Inner {
                workers: RwLock::new(Some(workers)),
                pending: Counter::default(),
                panic: Mutex::new(None),
            }),
            size,
            live,
        })
    }

    /// Builds a pool with one worker per available hardware thread
    pub fn with_hardware_concurrency() -> Result<Self, Error> {
        let n = std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1);
        Self::new(n)
    }

    /// Returns the number of worker threads
    pub fn size(&self) -> usize {
        self.size
    }

    /// Checks whether [`terminate`](Self::terminate) has been called
    pub fn is_terminated(&self) -> bool {
        self.inner.workers.read().unwrap().is_none()
    }

    /// Queues a job for execution; this never blocks
    ///
    /// Returns [`Error::PoolTerminated`] if the pool has been terminated.
    pub fn queue_job<F>(&self, f: F) -> Result<(), Error>
    where
        F: FnOnce() + Send + 'static,
    {
        self.inner.try_spawn(f).map_err(|_| Error::PoolTerminated)
    }

    /// Returns a handle which jobs may use to queue further jobs
    pub(crate) fn spawner(&self) -> Spawner {
        Spawner(self.inner.clone())
    }

    /// Blocks until every queued job has finished
    ///
    /// Jobs queued by other jobs are waited on as well.  This must not be
    /// called from within a job, which would wait on itself forever.
    ///
    /// Returns [`Error::JobPanicked`] if any job panicked since the previous
    /// barrier; the panic is reported once.
    pub fn barrier(&self) -> Result<(), Error> {
        self.inner.pending.wait_for_zero();
        match self.inner.panic.lock().unwrap().take() {
            Some(msg) => Err(Error::JobPanicked(msg)),
            None => Ok(()),
        }
    }

    /// Runs `f(i)` for every `i` in `0..count`, blocking until all are done
    ///
    /// Indices are partitioned into one contiguous range per worker.  After
    /// the pool has been terminated, the loop runs in the calling thread.
    pub fn parallel_for<F>(&self, count: usize, f: F)
    where
        F: Fn(usize) + Sync,
    {
        let workers = self.inner.workers.read().unwrap();
        let Some(pool) = workers.as_ref() else {
            (0..count).for_each(f);
            return;
        };
        let chunk = count.div_ceil(self.size).max(1);
        let f = &f;
        pool.scope(|s| {
            for start in (0..count).step_by(chunk) {
                let end = (start + chunk).min(count);
                s.spawn(move |_| (start..end).for_each(f));
            }
        });
    }

    /// Waits for queued work, then shuts down and joins every worker
    ///
    /// This is idempotent, and is also called when the pool is dropped.
    /// Unreported job panics are discarded (they have already been logged).
    pub fn terminate(&mut self) {
        self.inner.pending.wait_for_zero();
        let workers = self.inner.workers.write().unwrap().take();
        if let Some(workers) = workers {
            drop(workers);
            self.live.wait_for_zero();
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.terminate()
    }
}

////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn empty_pool() {
        assert!(matches!(ThreadPool::new(0), Err(Error::EmptyThreadPool)));
    }

    #[test]
    fn oversubscribed_pool_is_clamped() {
        let max = std::thread::available_parallelism().unwrap().get();
        let pool = ThreadPool::new(max + 16).unwrap();
        assert_eq!(pool.size(), max);
    }

    #[test]
    fn barrier_waits_for_nested_jobs() {
        let pool = ThreadPool::new(2).unwrap();
        let count = Arc::new(AtomicUsize::new(0));
        for _ in 0..8 {
            let count = count.clone();
            let spawner = pool.spawner();
            pool.queue_job(move || {
                for _ in 0..4 {
                    let count = count.clone();
                    spawner.spawn(move || {
                        std::thread::sleep(std::time::Duration::from_millis(1));
                        count.fetch_add(1, Ordering::Relaxed);
                    });
                }
            })
            .unwrap();
        }
        pool.barrier().unwrap();
        assert_eq!(count.load(Ordering::Relaxed), 32);
    }

    #[test]
    fn terminate() {
        let mut pool = ThreadPool::new(2).unwrap();
        let count = Arc::new(AtomicUsize::new(0));
        for _ in 0..16 {
            let count = count.clone();
            pool.queue_job(move || {
                count.fetch_add(1, Ordering::Relaxed);
            })
            .unwrap();
        }
        pool.terminate();
        assert_eq!(count.load(Ordering::Relaxed), 16);
        assert!(pool.is_terminated());
        assert!(matches!(pool.queue_job(|| ()), Err(Error::PoolTerminated)));
        pool.terminate();
    }

    #[test]
    fn panicking_job_is_reported_once() {
        let pool = ThreadPool::new(1).unwrap();
        pool.queue_job(|| panic!("oh no")).unwrap();
        match pool.barrier() {
            Err(Error::JobPanicked(msg)) => assert_eq!(msg, "oh no"),
            r => panic!("unexpected barrier result: {r:?}"),
        }
        pool.barrier().unwrap();
        let done = Arc::new(AtomicUsize::new(0));
        let done_ = done.clone();
        pool.queue_job(move || {
            done_.fetch_add(1, Ordering::Relaxed);
        })
        .unwrap();
        pool.barrier().unwrap();
        assert_eq!(done.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn parallel_for_visits_every_index() {
        let pool = ThreadPool::new(3).unwrap();
        let hits: Vec<AtomicUsize> =
            (0..100).map(|_| AtomicUsize::new(0)).collect();
        pool.parallel_for(hits.len(), |i| {
            hits[i].fetch_add(1, Ordering::Relaxed);
        });
        assert!(hits.iter().all(|h| h.load(Ordering::Relaxed) == 1));

        pool.parallel_for(0, |_| panic!("no indices"));
    }

    #[test]
    fn panic_in_nested_job() {
        let pool = ThreadPool::new(2).unwrap();
        let spawner = pool.spawner();
        pool.queue_job(move || {
            spawner.spawn(|| panic!("nested failure"));
        })
        .unwrap();
        assert!(matches!(pool.barrier(), Err(Error::JobPanicked(_))));
    }

    #[test]
    fn hardware_pool() {
        let n = std::thread::available_parallelism().unwrap().get();
        let pool = ThreadPool::with_hardware_concurrency().unwrap();
        assert_eq!(pool.size(), n);
    }

    #[test]
    fn thread_count() {
        let n = NonZeroUsize::new(1).unwrap();
        assert_eq!(ThreadCount::from(n), ThreadCount::One);
        let n = NonZeroUsize::new(4).unwrap();
        assert_eq!(ThreadCount::from(n).get(), Some(4));
        assert_eq!(ThreadCount::One.to_string(), "-");
    }
}
