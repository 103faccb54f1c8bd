use super::*;
use std::sync::Barrier;
use std::sync::atomic::AtomicUsize;
use std::thread;

#[test]
fn test_concurrent_callers_share_one_computation() {
    let request: Request<String> = Request::new();
    let cancel = CancelToken::new();
    let runs = AtomicUsize::new(0);
    let barrier = Barrier::new(8);

    let results: Vec<Arc<String>> = thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    request
                        .get("unit", &cancel, || {
                            runs.fetch_add(1, Ordering::SeqCst);
                            thread::sleep(Duration::from_millis(30));
                            Ok("value".to_string())
                        })
                        .unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert!(results.iter().all(|r| Arc::ptr_eq(r, &results[0])));
    assert!(request.is_done());
}

#[test]
fn test_cancelled_computation_is_not_published() {
    let request: Request<u32> = Request::new();
    let cancel = CancelToken::new();
    let result = request.get("unit", &cancel, || Err(CompileError::Cancelled));
    assert!(matches!(result, Err(CompileError::Cancelled)));
    assert!(!request.is_done());
    assert!(request.peek().is_none());

    let retried = request.get("unit", &cancel, || Ok(7)).unwrap();
    assert_eq!(*retried, 7);
}

#[test]
fn test_waiter_observes_cancellation() {
    let request: Request<u32> = Request::new();
    let cancel = CancelToken::new();
    let started = Barrier::new(2);

    thread::scope(|s| {
        let worker = s.spawn(|| {
            request.get("unit", &CancelToken::new(), || {
                started.wait();
                thread::sleep(Duration::from_millis(200));
                Ok(1)
            })
        });
        started.wait();
        cancel.cancel();
        let waited = request.get("unit", &cancel, || Ok(2));
        assert!(matches!(waited, Err(CompileError::Cancelled)));
        assert_eq!(*worker.join().unwrap().unwrap(), 1);
    });
    assert_eq!(request.peek().unwrap().map(|v| *v).unwrap(), 1);
}

#[test]
fn test_panic_becomes_internal_error_for_everyone() {
    let request: Request<u32> = Request::new();
    let cancel = CancelToken::new();
    let first = request.get("Broken.as", &cancel, || panic!("handler exploded"));
    match first {
        Err(CompileError::Internal { unit, message }) => {
            assert_eq!(unit, "Broken.as");
            assert!(message.contains("handler exploded"));
        }
        other => panic!("unexpected {other:?}"),
    }
    // Published: the second caller does not run its computation.
    let second = request.get("Broken.as", &cancel, || Ok(3));
    assert!(matches!(second, Err(CompileError::Internal { .. })));
}

#[test]
fn test_slot_reset_swaps_request() {
    let slot: RequestSlot<u32> = RequestSlot::new();
    let cancel = CancelToken::new();
    let first = slot.current();
    first.get("unit", &cancel, || Ok(1)).unwrap();
    assert!(slot.is_done());

    let stale = slot.current();
    slot.reset();
    assert!(!slot.is_done());
    assert!(!slot.reset_if(&stale));
    let fresh = slot.current();
    assert!(slot.reset_if(&fresh));
    assert!(!Arc::ptr_eq(&fresh, &slot.current()));
}

#[test]
fn test_cancel_token_check() {
    let cancel = CancelToken::new();
    assert!(cancel.check().is_ok());
    cancel.clone().cancel();
    assert!(cancel.check().unwrap_err().is_cancelled());
    cancel.reset();
    assert!(!cancel.is_cancelled());
}
