use news_relay::Pacer;
use std::time::Duration;
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn first_wait_is_immediate_and_later_ones_are_spaced() {
    let mut pacer = Pacer::new("test", Duration::from_millis(500));
    let start = Instant::now();

    pacer.wait().await;
    assert_eq!(start.elapsed(), Duration::ZERO);

    pacer.wait().await;
    pacer.wait().await;
    assert!(start.elapsed() >= Duration::from_millis(1000));
}

#[tokio::test(start_paused = true)]
async fn slow_work_between_calls_is_not_padded() {
    let mut pacer = Pacer::new("test", Duration::from_millis(500));

    pacer.wait().await;
    tokio::time::sleep(Duration::from_millis(800)).await;

    let before = Instant::now();
    pacer.wait().await;
    assert_eq!(before.elapsed(), Duration::ZERO);
}

#[tokio::test]
async fn zero_interval_never_sleeps() {
    let mut pacer = Pacer::new("test", Duration::ZERO);
    assert_eq!(pacer.min_interval(), Duration::ZERO);

    for _ in 0..100 {
        pacer.wait().await;
    }
}
