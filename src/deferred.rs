//! The two producer capabilities handed out by [`Promise::new`] and
//! [`Promise::deferred`].
//!
//! Both are cheap clones of the same promise handle. Whichever call lands
//! first settles the promise; every later call, from either capability,
//! does nothing and returns `false`.
use crate::{Error, Promise};
use std::fmt;

/// Settles a promise with a value.
pub struct Fulfiller<T> {
    promise: Promise<T>,
}

/// Settles a promise with an [`Error`].
pub struct Rejecter<T> {
    promise: Promise<T>,
}

impl<T: Clone + Send + 'static> Fulfiller<T> {
    pub(crate) fn new(promise: Promise<T>) -> Self {
        Self { promise }
    }

    /// Returns whether this call settled the promise.
    pub fn fulfill(&self, value: T) -> bool {
        self.promise.settle(Ok(value))
    }
}

impl<T: Clone + Send + 'static> Rejecter<T> {
    pub(crate) fn new(promise: Promise<T>) -> Self {
        Self { promise }
    }

    /// Returns whether this call settled the promise.
    pub fn reject(&self, error: Error) -> bool {
        self.promise.settle(Err(error))
    }
}

impl<T> Clone for Fulfiller<T> {
    fn clone(&self) -> Self {
        Self {
            promise: self.promise.clone(),
        }
    }
}

impl<T> Clone for Rejecter<T> {
    fn clone(&self) -> Self {
        Self {
            promise: self.promise.clone(),
        }
    }
}

impl<T> fmt::Debug for Fulfiller<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Fulfiller").field(&self.promise).finish()
    }
}

impl<T> fmt::Debug for Rejecter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Rejecter").field(&self.promise).finish()
    }
}
