//! Tests for cancellable sequences under a paused (mock) clock.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use lanparty_tick::{Cancelled, Sequence};
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn test_park_waits_the_full_duration() {
    let (mut seq, _handle) = Sequence::new();
    let start = Instant::now();

    seq.park("settle", Duration::from_millis(500)).await.unwrap();

    assert_eq!(start.elapsed(), Duration::from_millis(500));
}

#[tokio::test(start_paused = true)]
async fn test_park_after_cancel_returns_immediately() {
    let (mut seq, handle) = Sequence::new();
    handle.cancel();
    let start = Instant::now();

    let result = seq.park("settle", Duration::from_secs(10)).await;

    assert_eq!(result, Err(Cancelled { point: "settle" }));
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_wakes_a_parked_sequence() {
    let (mut seq, handle) = Sequence::new();
    let start = Instant::now();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        handle.cancel();
        // Keep the handle alive past the cancel.
        tokio::time::sleep(Duration::from_secs(60)).await;
    });

    let result = seq.park("attempt", Duration::from_secs(1)).await;

    assert_eq!(result, Err(Cancelled { point: "attempt" }));
    assert_eq!(start.elapsed(), Duration::from_millis(300));
}

#[tokio::test(start_paused = true)]
async fn test_dropping_the_handle_cancels() {
    let (mut seq, handle) = Sequence::new();
    drop(handle);

    assert!(seq.is_cancelled());
    assert!(seq.checkpoint("connect").is_err());
    assert!(seq.park("grace", Duration::from_secs(1)).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_side_effect_after_cancelled_park_never_runs() {
    let effects = Arc::new(AtomicUsize::new(0));
    let (mut seq, handle) = Sequence::new();

    let counter = Arc::clone(&effects);
    let task = tokio::spawn(async move {
        for _ in 0..3 {
            seq.park("attempt", Duration::from_secs(1)).await?;
            counter.fetch_add(1, Ordering::SeqCst);
        }
        Ok::<(), Cancelled>(())
    });

    // Let exactly one attempt complete, then cancel mid-way through the second.
    tokio::time::sleep(Duration::from_millis(1500)).await;
    handle.cancel();

    let result = task.await.unwrap();
    assert!(result.is_err());
    assert_eq!(effects.load(Ordering::SeqCst), 1);
    assert!(handle.is_cancelled());
}

#[test]
fn test_checkpoint_passes_while_live() {
    let (seq, handle) = Sequence::new();
    assert!(seq.checkpoint("start").is_ok());
    assert!(!handle.is_cancelled());
}
