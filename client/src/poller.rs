use std::{
    future::Future,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use rand::{rngs::StdRng, Rng, SeedableRng};
use tokio::task::JoinHandle;
use tracing::debug;

/// How long to wait between two ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    Fixed(Duration),
    /// `base` plus a uniformly random extra in `[0, spread)`, drawn per tick
    /// so that many clients drift apart instead of hitting the server together.
    Jittered { base: Duration, spread: Duration },
}

impl Cadence {
    /// Player screens: every 2 to 4 seconds.
    pub const PLAY: Cadence = Cadence::Jittered {
        base: Duration::from_millis(2000),
        spread: Duration::from_millis(2000),
    };
    /// Admin console: every second.
    pub const ADMIN: Cadence = Cadence::Fixed(Duration::from_secs(1));

    pub fn next_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        match *self {
            Cadence::Fixed(period) => period,
            Cadence::Jittered { base, spread } => {
                let spread_ms = spread.as_millis() as u64;
                if spread_ms == 0 {
                    return base;
                }
                base + Duration::from_millis(rng.gen_range(0..spread_ms))
            }
        }
    }
}

/// Issues increasing sequence numbers for one kind of request. A response is
/// applied only if its number beats the last one applied, so a slow reply
/// can never overwrite a fresher one.
#[derive(Debug, Default)]
pub struct Sequencer {
    next: AtomicU64,
}

impl Sequencer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// First call returns 1.
    pub fn issue(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// Tracks the newest sequence applied to a piece of model state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Freshness {
    applied: u64,
}

impl Freshness {
    /// Records `seq` and returns true when it is newer than anything seen.
    pub fn accept(&mut self, seq: u64) -> bool {
        if seq > self.applied {
            self.applied = seq;
            true
        } else {
            false
        }
    }

    pub fn applied(&self) -> u64 {
        self.applied
    }
}

/// A repeating background task. Each tick spawns `tick()` without waiting on
/// earlier ticks. Stopping (or dropping) the poller aborts the schedule.
#[derive(Debug)]
pub struct Poller {
    name: &'static str,
    handle: JoinHandle<()>,
}

impl Poller {
    pub fn start<F, Fut>(name: &'static str, cadence: Cadence, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        debug!("poller {} started ({:?})", name, cadence);
        let handle = tokio::spawn(async move {
            let mut rng = StdRng::from_entropy();
            loop {
                let delay = cadence.next_delay(&mut rng);
                tokio::time::sleep(delay).await;
                tokio::spawn(tick());
            }
        });
        Self { name, handle }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    pub fn stop(self) {
        // Drop does the work.
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.handle.abort();
        debug!("poller {} stopped", self.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn jitter_stays_in_window() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..500 {
            let d = Cadence::PLAY.next_delay(&mut rng);
            assert!(d >= Duration::from_millis(2000));
            assert!(d < Duration::from_millis(4000));
        }
        assert_eq!(Cadence::ADMIN.next_delay(&mut rng), Duration::from_secs(1));
    }

    #[test]
    fn stale_sequences_are_refused() {
        let seq = Sequencer::new();
        let first = seq.issue();
        let second = seq.issue();
        assert!(second > first);

        let mut fresh = Freshness::default();
        assert!(fresh.accept(second));
        assert!(!fresh.accept(first));
        assert!(!fresh.accept(second));
        assert_eq!(fresh.applied(), second);
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_until_stopped() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let poller = Poller::start("test", Cadence::Fixed(Duration::from_millis(100)), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_millis(350)).await;
        tokio::task::yield_now().await;
        let seen = count.load(Ordering::SeqCst);
        assert_eq!(seen, 3);

        poller.stop();
        tokio::time::sleep(Duration::from_millis(500)).await;
        tokio::task::yield_now().await;
        assert_eq!(count.load(Ordering::SeqCst), seen);
    }
}
