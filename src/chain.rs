//! Continuations: `then`, `catch` and `finally` and their promise-returning
//! variants.
//!
//! Every operator returns a fresh derived promise (except the
//! [`on_rejected`](Promise::on_rejected) sink). The branch that runs user
//! code is submitted to the caller's executor; the pass-through branch
//! settles the derived promise synchronously on the settling thread.
//!
//! Operators take the executor by reference and keep a clone of it until
//! the source settles, so the executor must be an owned `Clone` handle.
//! Executors that are only reachable as trait objects are passed as
//! `Arc<dyn Executor>`, which is itself an [`Executor`].
use crate::{config, executor, Error, Executor, Fault, Fulfiller, Promise, Rejecter, State};

/// The outcome carried by a callback's state. Callbacks only ever run after
/// the transition out of `Pending`.
fn settled<T: Clone>(state: &State<T>) -> Result<T, Error> {
    match state {
        State::Fulfilled(value) => Ok(value.clone()),
        State::Rejected(error) => Err(error.clone()),
        State::Pending => config::raise(Fault::PendingAfterSettle),
    }
}

/// Make the derived promise behind `fulfill`/`reject` track `inner`.
fn adopt<U>(inner: Promise<U>, fulfill: Fulfiller<U>, reject: Rejecter<U>)
where
    U: Clone + Send + 'static,
{
    inner.on_settle(move |state| {
        match settled(state) {
            Ok(value) => fulfill.fulfill(value),
            Err(error) => reject.reject(error),
        };
    });
}

impl<T: Clone + Send + 'static> Promise<T> {
    /// Transform the value on `executor` once fulfilled. A rejection is
    /// passed to the derived promise unchanged and `body` never runs.
    pub fn then<U, X, F>(&self, executor: &X, body: F) -> Promise<U>
    where
        U: Clone + Send + 'static,
        X: Executor + Clone + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        if let Some(error) = self.error() {
            return Promise::rejected(error);
        }
        let (derived, fulfill, reject) = Promise::deferred();
        let executor = executor.clone();
        self.on_settle(move |state| match settled(state) {
            Ok(value) => executor.submit(Box::new(move || {
                fulfill.fulfill(body(value));
            })),
            Err(error) => {
                reject.reject(error);
            }
        });
        derived
    }

    /// Like [`then`](Self::then), but `body` returns a promise whose outcome
    /// the derived promise adopts.
    ///
    /// # Examples
    ///
    /// ```
    /// use promise_chain::{Promise, executor::Inline};
    /// let (inner, fulfill, _) = Promise::deferred();
    /// let outer = Promise::fulfilled(2).and_then(&Inline, move |_| inner);
    /// assert!(outer.is_pending());
    /// fulfill.fulfill("adopted");
    /// assert_eq!(outer.value(), Some("adopted"));
    /// ```
    pub fn and_then<U, X, F>(&self, executor: &X, body: F) -> Promise<U>
    where
        U: Clone + Send + 'static,
        X: Executor + Clone + 'static,
        F: FnOnce(T) -> Promise<U> + Send + 'static,
    {
        if let Some(error) = self.error() {
            return Promise::rejected(error);
        }
        let (derived, fulfill, reject) = Promise::deferred();
        let executor = executor.clone();
        self.on_settle(move |state| match settled(state) {
            Ok(value) => executor.submit(Box::new(move || adopt(body(value), fulfill, reject))),
            Err(error) => {
                reject.reject(error);
            }
        });
        derived
    }

    /// Recover from a rejection on `executor`. A value passes through
    /// unchanged and `body` never runs.
    pub fn catch<X, F>(&self, executor: &X, body: F) -> Promise<T>
    where
        X: Executor + Clone + 'static,
        F: FnOnce(Error) -> T + Send + 'static,
    {
        if let Some(value) = self.value() {
            return Promise::fulfilled(value);
        }
        let (derived, fulfill, _) = Promise::deferred();
        let executor = executor.clone();
        self.on_settle(move |state| match settled(state) {
            Ok(value) => {
                fulfill.fulfill(value);
            }
            Err(error) => executor.submit(Box::new(move || {
                fulfill.fulfill(body(error));
            })),
        });
        derived
    }

    /// Like [`catch`](Self::catch), but the recovery is itself a promise,
    /// which may reject again.
    pub fn or_else<X, F>(&self, executor: &X, body: F) -> Promise<T>
    where
        X: Executor + Clone + 'static,
        F: FnOnce(Error) -> Promise<T> + Send + 'static,
    {
        if let Some(value) = self.value() {
            return Promise::fulfilled(value);
        }
        let (derived, fulfill, reject) = Promise::deferred();
        let executor = executor.clone();
        self.on_settle(move |state| match settled(state) {
            Ok(value) => {
                fulfill.fulfill(value);
            }
            Err(error) => executor.submit(Box::new(move || adopt(body(error), fulfill, reject))),
        });
        derived
    }

    /// Terminate a chain: run `body` on `executor` if this promise rejects.
    pub fn on_rejected<X, F>(&self, executor: &X, body: F)
    where
        X: Executor + Clone + 'static,
        F: FnOnce(Error) + Send + 'static,
    {
        let executor = executor.clone();
        self.on_settle(move |state| {
            if let Err(error) = settled(state) {
                executor.submit(Box::new(move || body(error)));
            }
        });
    }

    /// Run `body` once on the process default executor when this promise
    /// settles either way; the derived promise then carries the original
    /// outcome.
    pub fn finally<F>(&self, body: F) -> Promise<T>
    where
        F: FnOnce() + Send + 'static,
    {
        self.finally_on(&executor::default_executor(), body)
    }

    /// [`finally`](Self::finally) on an explicit executor.
    pub fn finally_on<X, F>(&self, executor: &X, body: F) -> Promise<T>
    where
        X: Executor + Clone + 'static,
        F: FnOnce() + Send + 'static,
    {
        let (derived, fulfill, reject) = Promise::deferred();
        let executor = executor.clone();
        self.on_settle(move |state| {
            let outcome = settled(state);
            executor.submit(Box::new(move || {
                body();
                match outcome {
                    Ok(value) => fulfill.fulfill(value),
                    Err(error) => reject.reject(error),
                };
            }));
        });
        derived
    }
}
