use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

struct SlidingInner {
    threshold: usize,
    windows: [HashMap<IpAddr, AtomicU16>; 2],
    live: u8,
}

impl SlidingInner {
    fn new(threshold: usize) -> Self {
        Self {
            threshold,
            windows: [HashMap::new(), HashMap::new()],
            live: 0,
        }
    }

    fn tick(&mut self) {
        self.live = (self.live + 1) % 2;

        self.windows[self.live as usize].clear();
    }
}

/// Precise per-IP limiter over two alternating count windows.
///
/// A peer is over budget when its live-window count plus its previous-window
/// count reaches the threshold; the ticker rotates windows at half-window
/// cadence, so the effective window slides.
#[derive(Clone)]
pub struct SlidingRateLimiter {
    inner: Arc<RwLock<SlidingInner>>,
}

impl SlidingRateLimiter {
    pub fn new(threshold: usize, window_secs: u64) -> Self {
        let s = Self {
            inner: Arc::new(RwLock::new(SlidingInner::new(threshold))),
        };

        s.start_ticker(window_secs);

        s
    }

    /// True when the peer has exhausted its window budget.
    pub fn is_limited(&self, peer_ip: IpAddr) -> bool {
        loop {
            let read = self.inner.read().expect("locking failed");

            if let Some(entry) = read.windows[read.live as usize].get(&peer_ip) {
                let live = entry.load(Ordering::Relaxed) as usize;
                let prev = read.windows[(read.live as usize + 1) % 2]
                    .get(&peer_ip)
                    .map(|entry| entry.load(Ordering::Relaxed))
                    .unwrap_or(0) as usize;

                if live + prev < read.threshold {
                    entry.fetch_add(1, Ordering::Relaxed);
                    return false;
                }

                return true;
            }

            drop(read);

            // slow path: first sighting in this window, insert and retry
            let mut write = self.inner.write().expect("locking failed");
            let live = write.live;
            write.windows[live as usize].entry(peer_ip).or_default();
        }
    }

    fn start_ticker(&self, window_secs: u64) {
        let inner = Arc::downgrade(&self.inner);
        let tick = (window_secs / 2) + 1;
        std::thread::spawn(move || {
            // exits once the limiter is dropped
            while let Some(inner) = inner.upgrade() {
                std::thread::sleep(Duration::from_secs(tick));
                inner.write().expect("locking failed").tick();
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    #[test]
    fn counts_exactly_to_threshold() {
        let limiter = SlidingRateLimiter::new(5, 600);
        let ip = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 3));
        for _ in 0..5 {
            assert!(!limiter.is_limited(ip));
        }
        assert!(limiter.is_limited(ip));
        assert!(limiter.is_limited(ip));
    }

    #[test]
    fn tracks_peers_independently() {
        let limiter = SlidingRateLimiter::new(2, 600);
        let busy = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 4));
        let quiet = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5));
        for _ in 0..2 {
            assert!(!limiter.is_limited(busy));
        }
        assert!(limiter.is_limited(busy));
        assert!(!limiter.is_limited(quiet));
    }

    #[test]
    fn window_rotation_forgets_old_counts() {
        let limiter = SlidingRateLimiter::new(2, 600);
        let ip = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 6));
        for _ in 0..2 {
            assert!(!limiter.is_limited(ip));
        }
        assert!(limiter.is_limited(ip));

        // two rotations drop both the live and the previous window
        limiter.inner.write().expect("lock").tick();
        limiter.inner.write().expect("lock").tick();
        assert!(!limiter.is_limited(ip));
    }
}
