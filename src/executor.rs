//! Execution contexts that continuations are dispatched onto.
//!
//! An [`Executor`] only promises to run submitted work eventually. Work sent
//! to one target runs in submission order when the target is serial
//! ([`ThreadPool::serial`], [`EventLoop`]); nothing is promised across
//! targets.
//!
use crate::{config, Fault};
use crossbeam::channel::{unbounded, Receiver, Sender};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::{
    collections::VecDeque,
    fmt,
    panic::{catch_unwind, AssertUnwindSafe},
    sync::Arc,
    thread,
};

pub type Job = Box<dyn FnOnce() + Send + 'static>;

pub trait Executor: Send + Sync {
    fn submit(&self, job: Job);
}

impl<X: Executor + ?Sized> Executor for Arc<X> {
    fn submit(&self, job: Job) {
        (**self).submit(job)
    }
}

/// Runs work immediately on the submitting thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct Inline;

impl Executor for Inline {
    fn submit(&self, job: Job) {
        job()
    }
}

/// Named worker threads draining one shared FIFO channel.
///
/// Workers exit once every clone of the pool has been dropped and the
/// channel is empty.
///
/// # Examples
///
/// ```
/// use promise_chain::{Promise, executor::ThreadPool};
/// use futures::executor::block_on;
/// let pool = ThreadPool::new("calc", 2).unwrap();
/// let doubled = Promise::fulfilled(21).then(&pool, |v| v * 2);
/// assert_eq!(block_on(doubled).unwrap(), 42);
/// ```
#[derive(Clone)]
pub struct ThreadPool {
    inner: Arc<PoolInner>,
}

struct PoolInner {
    sender: Sender<Job>,
    name: String,
    threads: usize,
}

impl ThreadPool {
    pub fn new(name: impl Into<String>, threads: usize) -> std::io::Result<Self> {
        let name = name.into();
        let threads = threads.max(1);
        let (sender, receiver) = unbounded::<Job>();
        for id in 0..threads {
            let receiver = receiver.clone();
            thread::Builder::new()
                .name(format!("{name}-{id}"))
                .spawn(move || Self::worker(receiver))?;
        }
        log::trace!("started pool {name} with {threads} worker(s)");
        Ok(Self {
            inner: Arc::new(PoolInner {
                sender,
                name,
                threads,
            }),
        })
    }

    /// A single worker: jobs run one at a time in submission order.
    pub fn serial(name: impl Into<String>) -> std::io::Result<Self> {
        Self::new(name, 1)
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn threads(&self) -> usize {
        self.inner.threads
    }

    fn worker(receiver: Receiver<Job>) {
        for job in receiver.iter() {
            if let Err(cause) = catch_unwind(AssertUnwindSafe(job)) {
                let current = thread::current();
                log::error!(
                    "job panicked on {}: {}",
                    current.name().unwrap_or("<unnamed>"),
                    panic_message(&*cause)
                );
            }
        }
    }
}

impl Executor for ThreadPool {
    fn submit(&self, job: Job) {
        if self.inner.sender.send(job).is_err() {
            log::error!("pool {} has no workers left; job dropped", self.inner.name);
        }
    }
}

impl fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadPool")
            .field("name", &self.inner.name)
            .field("threads", &self.inner.threads)
            .field("queued", &self.inner.sender.len())
            .finish()
    }
}

fn panic_message(cause: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = cause.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = cause.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}

/// A queue that only runs work when its owner drives it, like a UI or
/// event-loop thread pumping messages.
///
/// # Examples
///
/// ```
/// use promise_chain::{Promise, executor::EventLoop};
/// let main = EventLoop::new();
/// let p = Promise::fulfilled(5).then(&main, |v| v * 2);
/// assert!(p.is_pending());
/// main.run_until_idle();
/// assert_eq!(p.value(), Some(10));
/// ```
#[derive(Clone, Default)]
pub struct EventLoop {
    queue: Arc<Mutex<VecDeque<Job>>>,
}

impl EventLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    /// Run the jobs queued at the time of the call. Work they submit waits
    /// for the next turn. Returns how many jobs ran.
    pub fn run_pending(&self) -> usize {
        let turn = self.queue.lock().len();
        let mut ran = 0;
        while ran < turn {
            // Lock released before the job runs; jobs may submit more work.
            let Some(job) = self.queue.lock().pop_front() else {
                break;
            };
            job();
            ran += 1;
        }
        ran
    }

    /// Turn the loop until nothing is queued. Returns how many jobs ran.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        loop {
            match self.run_pending() {
                0 => return ran,
                n => ran += n,
            }
        }
    }
}

impl Executor for EventLoop {
    fn submit(&self, job: Job) {
        self.queue.lock().push_back(job);
    }
}

impl fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLoop").field("queued", &self.len()).finish()
    }
}

static DEFAULT: OnceCell<Arc<dyn Executor>> = OnceCell::new();

/// Install the process default executor. Fails if a default was already
/// installed or already handed out.
pub fn set_default(executor: Arc<dyn Executor>) -> Result<(), Fault> {
    DEFAULT
        .set(executor)
        .map_err(|_| Fault::AlreadyConfigured("default executor"))
}

/// The process default executor. Unless one was installed, this is a
/// [`ThreadPool`] shaped by [`config::current`].
pub fn default_executor() -> Arc<dyn Executor> {
    DEFAULT
        .get_or_init(|| {
            let config = config::current();
            let executor: Arc<dyn Executor> =
                match ThreadPool::new(config.thread_name.clone(), config.worker_threads) {
                    Ok(pool) => Arc::new(pool),
                    Err(err) => {
                        log::error!("cannot start default pool, running work inline: {err}");
                        Arc::new(Inline)
                    }
                };
            executor
        })
        .clone()
}
