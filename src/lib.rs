//! Settle-once promises with executor-dispatched continuations.
//!
//! A [`Promise`] eventually holds a value or an [`Error`]. Producers settle
//! it through a [`Fulfiller`] / [`Rejecter`] pair; consumers attach
//! continuations with [`then`](Promise::then), [`and_then`](Promise::and_then),
//! [`catch`](Promise::catch), [`or_else`](Promise::or_else),
//! [`on_rejected`](Promise::on_rejected) and [`finally`](Promise::finally).
//! Continuations run on an [`Executor`] chosen by the caller.
//!
//! # Examples
//!
//! ```
//! use promise_chain::{Promise, executor::ThreadPool};
//! use futures::executor::block_on;
//! use std::thread;
//!
//! let pool = ThreadPool::new("doc", 2).unwrap();
//! let (promise, fulfill, _reject) = Promise::deferred();
//! let total = promise
//!     .then(&pool, |v: u32| v + 1)
//!     .and_then(&pool, |v| Promise::fulfilled(v * 10));
//!
//! let producer = thread::spawn(move || fulfill.fulfill(4));
//! assert_eq!(block_on(total).unwrap(), 50);
//! producer.join().expect("The producer thread has panicked");
//! ```
mod chain;
pub mod config;
mod deferred;
mod error;
pub mod executor;
mod promise;

pub use deferred::{Fulfiller, Rejecter};
pub use error::{Error, Fault};
pub use executor::{Executor, Job};
pub use promise::{Promise, State};
