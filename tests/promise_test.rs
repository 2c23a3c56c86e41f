#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use parking_lot::Mutex;
    use promise_chain::{
        executor::{EventLoop, Inline, ThreadPool},
        Error, Promise, State,
    };
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
        thread,
        time::Duration,
    };

    #[test]
    fn test_doubling_a_fulfilled_promise() {
        let pool = ThreadPool::new("double", 2).unwrap();
        let p = Promise::fulfilled(5).then(&pool, |v| v * 2);
        assert_eq!(block_on(p).unwrap(), 10);
    }

    #[test]
    fn test_rejection_skips_then_and_is_recovered() {
        let main = EventLoop::new();
        let p = Promise::<i32>::rejected(Error::msg("E"))
            .then(&main, |v| v * 2)
            .catch(&main, |_| 99);
        main.run_until_idle();
        assert_eq!(p.value(), Some(99));
    }

    #[test]
    fn test_three_callbacks_observe_value_in_order() {
        let main = EventLoop::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (p, fulfill, _) = Promise::deferred();
        let derived: Vec<Promise<()>> = (0..3)
            .map(|id| {
                let seen = seen.clone();
                p.then(&main, move |v: i32| seen.lock().push((id, v)))
            })
            .collect();
        fulfill.fulfill(7);
        fulfill.fulfill(8);
        assert_eq!(main.run_until_idle(), 3);
        assert_eq!(*seen.lock(), vec![(0, 7), (1, 7), (2, 7)]);
        assert!(derived.iter().all(Promise::is_fulfilled));
    }

    #[test]
    fn test_late_attach_needs_no_further_event() {
        let p = Promise::fulfilled("ready");
        assert_eq!(p.then(&Inline, str::len).value(), Some(5));

        let err = Error::msg("down");
        let failed = Promise::<u8>::rejected(err.clone());
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        failed.on_rejected(&Inline, move |e| {
            assert!(e.ptr_eq(&err));
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_error_identity_survives_a_chain() {
        let main = EventLoop::new();
        let err = Error::msg("root cause");
        let (p, _, reject) = Promise::<i32>::deferred();
        let end = p
            .then(&main, |v| v + 1)
            .and_then(&main, |v| Promise::fulfilled(v.to_string()))
            .then(&main, |s| s.len());
        reject.reject(err.clone());
        assert_eq!(main.run_until_idle(), 0);
        assert!(end.error().unwrap().ptr_eq(&err));
    }

    #[test]
    fn test_adopts_already_settled_inner_promise() {
        let err = Error::msg("inner");
        let ok = Promise::fulfilled(1).and_then(&Inline, |v| Promise::fulfilled(v + 1));
        let inner_err = err.clone();
        let bad = Promise::fulfilled(1).and_then(&Inline, move |_| Promise::<i32>::rejected(inner_err));
        assert_eq!(ok.state(), State::Fulfilled(2));
        assert_eq!(bad.state(), State::Rejected(err));
    }

    #[test]
    fn test_adopts_inner_promise_settled_later() {
        let main = EventLoop::new();
        let (inner, _, reject_inner) = Promise::<String>::deferred();
        let (outer, fulfill_outer, _) = Promise::<u8>::deferred();
        let derived = outer.and_then(&main, move |_| inner);
        fulfill_outer.fulfill(1);
        main.run_until_idle();
        assert!(derived.is_pending());
        let err = Error::msg("late failure");
        reject_inner.reject(err.clone());
        assert_eq!(derived.state(), State::Rejected(err));
    }

    #[test]
    fn test_or_else_adopts_recovery() {
        let main = EventLoop::new();
        let (retry, fulfill_retry, _) = Promise::deferred();
        let derived = Promise::rejected(Error::msg("first try"))
            .or_else(&main, move |_| retry);
        main.run_until_idle();
        assert!(derived.is_pending());
        fulfill_retry.fulfill("second try");
        assert_eq!(derived.value(), Some("second try"));
    }

    #[test]
    fn test_catch_leaves_value_alone() {
        let called = Arc::new(AtomicUsize::new(0));
        let counter = called.clone();
        let derived = Promise::fulfilled(4).catch(&Inline, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            0
        });
        assert_eq!(derived.value(), Some(4));
        assert_eq!(called.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_finally_runs_once_for_either_outcome() {
        let main = EventLoop::new();
        let runs = Arc::new(AtomicUsize::new(0));

        let counter = runs.clone();
        let ok = Promise::fulfilled(3).finally_on(&main, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let err = Error::msg("kept");
        let counter = runs.clone();
        let failed = Promise::<i32>::rejected(err.clone()).finally_on(&main, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        main.run_until_idle();
        assert_eq!(runs.load(Ordering::SeqCst), 2);
        assert_eq!(ok.value(), Some(3));
        assert!(failed.error().unwrap().ptr_eq(&err));
    }

    #[test]
    fn test_finally_on_default_executor() {
        let cleaned = Arc::new(AtomicUsize::new(0));
        let counter = cleaned.clone();
        let (p, fulfill, _) = Promise::deferred();
        let derived = p.finally(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        fulfill.fulfill(11u64);
        assert_eq!(block_on(derived).unwrap(), 11);
        assert_eq!(cleaned.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_spawn_on_runs_producer_on_executor() {
        let pool = ThreadPool::serial("producer").unwrap();
        let p = Promise::spawn_on(&pool, |fulfill, _| {
            fulfill.fulfill(thread::current().name().map(str::to_owned));
        });
        let name = block_on(p).unwrap().unwrap();
        assert_eq!(name, "producer-0");
    }

    #[test]
    fn test_concurrent_attach_and_settle() {
        let (p, fulfill, _) = Promise::deferred();
        let runs = Arc::new(AtomicUsize::new(0));
        let attachers: Vec<_> = (0..8)
            .map(|_| {
                let p = p.clone();
                let runs = runs.clone();
                thread::spawn(move || {
                    (0..100)
                        .map(|_| {
                            let runs = runs.clone();
                            p.then(&Inline, move |v: usize| {
                                runs.fetch_add(1, Ordering::SeqCst);
                                v
                            })
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        let producer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(1));
            fulfill.fulfill(1)
        });
        assert!(producer.join().expect("The producer thread has panicked"));
        for handle in attachers {
            let derived = handle.join().expect("The attacher thread has panicked");
            assert!(derived.iter().all(|d| d.value() == Some(1)));
        }
        assert_eq!(runs.load(Ordering::SeqCst), 800);
    }

    #[test]
    fn test_unsettled_promise_stays_pending() {
        let (p, _, _) = Promise::<u8>::deferred();
        let derived = p.then(&Inline, |v| v);
        assert!(p.is_pending());
        assert!(derived.is_pending());
        assert_eq!(derived.value(), None);
    }
}
