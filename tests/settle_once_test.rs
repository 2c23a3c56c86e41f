#[cfg(test)]
mod tests {
    use parking_lot::Mutex;
    use promise_chain::{Error, Promise, State};
    use proptest::prelude::*;
    use std::sync::Arc;

    #[derive(Debug, Clone)]
    enum Call {
        Fulfill(i32),
        Reject(String),
    }

    fn call() -> impl Strategy<Value = Call> {
        prop_oneof![
            any::<i32>().prop_map(Call::Fulfill),
            "[a-z]{1,8}".prop_map(Call::Reject),
        ]
    }

    proptest! {
        #[test]
        fn first_call_wins(calls in prop::collection::vec(call(), 1..12), listeners in 0usize..5) {
            let (p, fulfill, reject) = Promise::deferred();
            let drained = Arc::new(Mutex::new(Vec::new()));
            for id in 0..listeners {
                let drained = drained.clone();
                p.then(&promise_chain::executor::Inline, move |v: i32| drained.lock().push((id, v)));
            }

            let mut first = None;
            for call in &calls {
                let settled = match call {
                    Call::Fulfill(v) => fulfill.fulfill(*v),
                    Call::Reject(msg) => reject.reject(Error::msg(msg.clone())),
                };
                prop_assert_eq!(settled, first.is_none());
                if first.is_none() {
                    first = Some(call.clone());
                }
            }

            match (first.unwrap(), p.state()) {
                (Call::Fulfill(v), State::Fulfilled(got)) => {
                    prop_assert_eq!(got, v);
                    let expected: Vec<_> = (0..listeners).map(|id| (id, v)).collect();
                    prop_assert_eq!(drained.lock().clone(), expected);
                }
                (Call::Reject(msg), State::Rejected(err)) => {
                    prop_assert_eq!(err.to_string(), msg);
                    prop_assert!(drained.lock().is_empty());
                }
                (first, state) => prop_assert!(false, "first call {:?} left state {:?}", first, state),
            }
        }
    }
}
