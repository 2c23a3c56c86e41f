use crate::{Error, Executor, Fulfiller, Rejecter};
use parking_lot::Mutex;
use std::{
    fmt,
    future::Future,
    mem,
    panic::{catch_unwind, resume_unwind, AssertUnwindSafe},
    pin::Pin,
    sync::Arc,
    task::{Context, Poll, Waker},
};

/// Where a promise is in its life. Leaves `Pending` at most once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum State<T> {
    Pending,
    Fulfilled(T),
    Rejected(Error),
}

impl<T> State<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, State::Pending)
    }

    fn label(&self) -> &'static str {
        match self {
            State::Pending => "pending",
            State::Fulfilled(_) => "fulfilled",
            State::Rejected(_) => "rejected",
        }
    }
}

impl<T> From<Result<T, Error>> for State<T> {
    fn from(result: Result<T, Error>) -> Self {
        match result {
            Ok(value) => State::Fulfilled(value),
            Err(error) => State::Rejected(error),
        }
    }
}

pub(crate) type Callback<T> = Box<dyn FnOnce(&State<T>) + Send + 'static>;

struct Inner<T> {
    state: State<T>,
    // Only grows while `state` is pending; emptied by the settling call.
    callbacks: Vec<Callback<T>>,
    wakers: Vec<Waker>,
}

/// A settle-once container for a value of `T` or an [`Error`].
///
/// `Promise` is a handle: clones observe and settle the same promise.
///
/// # Examples
///
/// ```
/// use promise_chain::{Promise, Error, executor::Inline};
/// let doubled = Promise::fulfilled(5).then(&Inline, |v| v * 2);
/// assert_eq!(doubled.value(), Some(10));
///
/// let recovered = Promise::<i32>::rejected(Error::msg("nope"))
///     .then(&Inline, |v| v * 2)
///     .catch(&Inline, |_| 99);
/// assert_eq!(recovered.value(), Some(99));
/// ```
pub struct Promise<T> {
    shared: Arc<Mutex<Inner<T>>>,
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T: Clone + Send + 'static> Promise<T> {
    fn with_state(state: State<T>) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Inner {
                state,
                callbacks: Vec::new(),
                wakers: Vec::new(),
            })),
        }
    }

    /// Run `body` right away with the capabilities that settle the returned
    /// promise. Only the first of their calls has any effect.
    ///
    /// # Examples
    ///
    /// ```
    /// use promise_chain::{Promise, Error};
    /// let p = Promise::new(|fulfill, reject| {
    ///     fulfill.fulfill(1);
    ///     reject.reject(Error::msg("too late"));
    /// });
    /// assert_eq!(p.value(), Some(1));
    /// ```
    pub fn new<F>(body: F) -> Self
    where
        F: FnOnce(Fulfiller<T>, Rejecter<T>),
    {
        let (promise, fulfill, reject) = Self::deferred();
        body(fulfill, reject);
        promise
    }

    /// A pending promise together with the capabilities that settle it, for
    /// producers that are themselves callbacks of some other API.
    ///
    /// # Examples
    ///
    /// ```
    /// use promise_chain::Promise;
    /// use futures::executor::block_on;
    /// use std::thread;
    /// let (promise, fulfill, _reject) = Promise::<String>::deferred();
    /// let task = thread::spawn(move || fulfill.fulfill("🍓".into()));
    /// assert_eq!(block_on(promise).unwrap(), "🍓");
    /// task.join().expect("The producer thread has panicked");
    /// ```
    pub fn deferred() -> (Self, Fulfiller<T>, Rejecter<T>) {
        let promise = Self::with_state(State::Pending);
        let fulfill = Fulfiller::new(promise.clone());
        let reject = Rejecter::new(promise.clone());
        (promise, fulfill, reject)
    }

    /// Like [`Promise::new`], but `body` runs on `executor`.
    pub fn spawn_on<X, F>(executor: &X, body: F) -> Self
    where
        X: Executor + ?Sized,
        F: FnOnce(Fulfiller<T>, Rejecter<T>) + Send + 'static,
    {
        let (promise, fulfill, reject) = Self::deferred();
        executor.submit(Box::new(move || body(fulfill, reject)));
        promise
    }

    pub fn fulfilled(value: T) -> Self {
        Self::with_state(State::Fulfilled(value))
    }

    pub fn rejected(error: Error) -> Self {
        Self::with_state(State::Rejected(error))
    }

    pub fn is_pending(&self) -> bool {
        self.shared.lock().state.is_pending()
    }

    pub fn is_fulfilled(&self) -> bool {
        matches!(self.shared.lock().state, State::Fulfilled(_))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self.shared.lock().state, State::Rejected(_))
    }

    /// The value, if fulfilled by now.
    pub fn value(&self) -> Option<T> {
        match &self.shared.lock().state {
            State::Fulfilled(value) => Some(value.clone()),
            _ => None,
        }
    }

    /// The error, if rejected by now.
    pub fn error(&self) -> Option<Error> {
        match &self.shared.lock().state {
            State::Rejected(error) => Some(error.clone()),
            _ => None,
        }
    }

    pub fn state(&self) -> State<T> {
        self.shared.lock().state.clone()
    }

    /// True when both handles refer to the same promise.
    pub fn ptr_eq(&self, other: &Promise<T>) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    /// The settle-once transition. Returns false, changing nothing, if the
    /// promise had already left `Pending`.
    pub(crate) fn settle(&self, outcome: Result<T, Error>) -> bool {
        let outcome = State::from(outcome);
        let (callbacks, wakers) = {
            let mut inner = self.shared.lock();
            if !inner.state.is_pending() {
                log::debug!(
                    "ignoring {} of an already {} promise",
                    outcome.label(),
                    inner.state.label()
                );
                return false;
            }
            inner.state = outcome.clone();
            (mem::take(&mut inner.callbacks), mem::take(&mut inner.wakers))
        };
        log::trace!(
            "promise {}, draining {} callback(s)",
            outcome.label(),
            callbacks.len()
        );
        // A panicking continuation must not starve the ones queued after it.
        let mut first_panic = None;
        for callback in callbacks {
            if let Err(cause) = catch_unwind(AssertUnwindSafe(|| callback(&outcome))) {
                log::error!("continuation panicked while draining a settled promise");
                first_panic.get_or_insert(cause);
            }
        }
        for waker in wakers {
            waker.wake();
        }
        if let Some(cause) = first_panic {
            resume_unwind(cause);
        }
        true
    }

    /// Run `callback` with the final state: queued while pending, right away
    /// once settled.
    pub(crate) fn on_settle<F>(&self, callback: F)
    where
        F: FnOnce(&State<T>) + Send + 'static,
    {
        let settled = {
            let mut inner = self.shared.lock();
            if inner.state.is_pending() {
                inner.callbacks.push(Box::new(callback));
                log::trace!("queued callback #{}", inner.callbacks.len());
                return;
            }
            inner.state.clone()
        };
        callback(&settled);
    }
}

impl<T: Clone + Send + 'static> From<Result<T, Error>> for Promise<T> {
    fn from(result: Result<T, Error>) -> Self {
        Self::with_state(State::from(result))
    }
}

impl<T> fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.shared.lock();
        f.debug_struct("Promise")
            .field("state", &inner.state.label())
            .field("callbacks", &inner.callbacks.len())
            .finish()
    }
}

impl<T: Clone + Send + 'static> Future for Promise<T> {
    type Output = Result<T, Error>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut guard = self.shared.lock();
        let inner = &mut *guard;
        match &inner.state {
            State::Fulfilled(value) => Poll::Ready(Ok(value.clone())),
            State::Rejected(error) => Poll::Ready(Err(error.clone())),
            State::Pending => {
                if !inner.wakers.iter().any(|w| w.will_wake(cx.waker())) {
                    inner.wakers.push(cx.waker().clone());
                }
                Poll::Pending
            }
        }
    }
}
