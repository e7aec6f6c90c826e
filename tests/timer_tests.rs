use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use battleship_server::Timer;
use tokio::time::{sleep, Duration};

fn counter() -> (Arc<AtomicUsize>, impl FnOnce() + Send + 'static) {
    let fired = Arc::new(AtomicUsize::new(0));
    let hook = fired.clone();
    (fired, move || {
        hook.fetch_add(1, Ordering::SeqCst);
    })
}

#[tokio::test(start_paused = true)]
async fn fires_once_after_delay() {
    let (fired, callback) = counter();
    let timer = Timer::start(Duration::from_secs(5), callback);
    assert_eq!(timer.remaining_seconds(), 5);

    sleep(Duration::from_secs(4)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 0);
    assert_eq!(timer.remaining_seconds(), 1);

    sleep(Duration::from_secs(2)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert!(timer.remaining_millis() < 0);
    assert_eq!(timer.remaining_seconds(), -1);
}

#[tokio::test(start_paused = true)]
async fn disposed_timer_never_fires() {
    let (fired, callback) = counter();
    let timer = Timer::start(Duration::from_secs(1), callback);
    timer.dispose();
    timer.dispose();
    assert!(timer.is_disposed());

    sleep(Duration::from_secs(3)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn dropping_disposes() {
    let (fired, callback) = counter();
    drop(Timer::start(Duration::from_secs(1), callback));

    sleep(Duration::from_secs(3)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 0);
}
