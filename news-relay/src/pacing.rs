use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Fixed-interval gate for calls to a rate-limited collaborator.
///
/// The first `wait` passes immediately. Every later `wait` returns no sooner
/// than `min_interval` after the previous one returned, however long the
/// work in between took.
#[derive(Debug)]
pub struct Pacer {
    name: &'static str,
    min_interval: Duration,
    last: Option<Instant>,
}

impl Pacer {
    pub fn new(name: &'static str, min_interval: Duration) -> Self {
        Self {
            name,
            min_interval,
            last: None,
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub async fn wait(&mut self) {
        if let Some(last) = self.last {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                let remaining = self.min_interval - elapsed;
                debug!("Pacing {}: waiting {:?}", self.name, remaining);
                tokio::time::sleep(remaining).await;
            }
        }
        self.last = Some(Instant::now());
    }
}
