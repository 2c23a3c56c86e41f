//! The error payload carried by a rejected promise, and the faults raised
//! when the promise machinery itself is misused or misconfigured.
//!
use std::{error::Error as StdError, fmt, sync::Arc};

/// Opaque rejection payload.
///
/// The core never looks inside it; it is stored once and forwarded to every
/// derived promise. Cloning is cheap and keeps the identity of the original
/// error, so a rejection propagated through a chain is the *same* error.
///
/// # Examples
///
/// ```
/// use promise_chain::Error;
/// let err = Error::msg("disk on fire");
/// let forwarded = err.clone();
/// assert!(err.ptr_eq(&forwarded));
/// assert_eq!(forwarded.to_string(), "disk on fire");
/// ```
#[derive(Clone)]
pub struct Error {
    inner: Arc<dyn StdError + Send + Sync + 'static>,
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct Message(String);

impl Error {
    pub fn new<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(error),
        }
    }

    /// An error that is only a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(Message(message.into()))
    }

    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.inner.downcast_ref::<E>()
    }

    /// True when both handles point at the same stored error.
    pub fn ptr_eq(&self, other: &Error) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.inner, f)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.inner, f)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner.source()
    }
}

// Identity, not content: a forwarded rejection is the same error.
impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::new(err)
    }
}

/// Failures of the promise machinery, as opposed to rejections a producer
/// chose to report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Fault {
    #[error("a continuation observed a pending promise after settlement")]
    PendingAfterSettle,
    #[error("{0} was already configured for this process")]
    AlreadyConfigured(&'static str),
}
