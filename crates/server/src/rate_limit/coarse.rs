use std::hash::{Hash, Hasher};
use std::net::IpAddr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

struct CoarseInner {
    threshold: usize,
    slots: Vec<AtomicU8>,
}

impl CoarseInner {
    const SLOT_BITS: usize = 8;
    const SLOTS_PER_LANE: usize = 1 << Self::SLOT_BITS;
    const LANE_BITS: usize = 2;
    const LANES: usize = 1 << Self::LANE_BITS;

    fn new(threshold: usize) -> Self {
        Self {
            threshold,
            slots: (0..Self::SLOTS_PER_LANE * Self::LANES)
                .map(|_| Default::default())
                .collect(),
        }
    }

    fn is_limited(&self, peer_ip: IpAddr) -> bool {
        let mut hasher = XorHasher::default();
        peer_ip.hash(&mut hasher);
        let hash = hasher.finish();

        let mut count = 0usize;
        let mut allowance = 0usize;
        for lane in 0..Self::LANES {
            // each ip walks the lanes in its own order
            let lane_offset = (hash >> (64 - Self::LANE_BITS)) as usize;
            let lane = (lane ^ lane_offset) % Self::LANES;
            let slot = (hash >> (lane * Self::SLOT_BITS)) as u8 as usize;
            debug_assert!(slot < Self::SLOTS_PER_LANE);
            let idx = lane * Self::SLOTS_PER_LANE + slot;
            count += self.slots[idx].load(Ordering::Relaxed) as usize;
            allowance += self.threshold / Self::LANES + 1;
            if count < allowance {
                // a single relaxed write at an ip-dependent position keeps
                // cachelines from ping-ponging between cpus
                self.slots[idx].fetch_add(1, Ordering::Relaxed);
                return false;
            }
        }
        true
    }

    fn tick(&self, tick_i: usize) {
        let lane = tick_i % Self::LANES;
        for slot in 0..Self::SLOTS_PER_LANE {
            self.slots[lane * Self::SLOTS_PER_LANE + slot].store(0, Ordering::Relaxed);
        }
    }
}

/// Lock-free, imprecise pre-filter.
///
/// The peer IP is hashed into one counter slot per lane; lanes are cleared
/// round-robin by a background ticker, so counts decay one lane at a time.
/// Hash collisions over-attribute traffic, which is fine for a first pass
/// that a precise limiter backstops.
#[derive(Clone)]
pub struct CoarseRateLimiter {
    inner: Arc<CoarseInner>,
}

impl CoarseRateLimiter {
    pub fn new(threshold: usize, window_secs: u64) -> Self {
        let s = Self {
            inner: Arc::new(CoarseInner::new(threshold)),
        };

        s.start_ticker(window_secs);

        s
    }

    /// True when the peer has exhausted its window budget.
    pub fn is_limited(&self, peer_ip: IpAddr) -> bool {
        self.inner.is_limited(peer_ip)
    }

    fn start_ticker(&self, window_secs: u64) {
        let inner = Arc::downgrade(&self.inner);
        let tick = (window_secs / CoarseInner::LANES as u64) + 1;
        let mut tick_i = 0;
        std::thread::spawn(move || {
            // exits once the limiter is dropped
            while let Some(inner) = inner.upgrade() {
                std::thread::sleep(Duration::from_secs(tick));
                inner.tick(tick_i);
                tick_i += 1;
            }
        });
    }
}

/// Hasher that XOR-folds the input into a single word. Not collision
/// resistant, just cheap; collisions only make the pre-filter stricter.
#[derive(Default, Clone, Copy)]
struct XorHasher {
    hash: u64,
}

impl Hasher for XorHasher {
    fn finish(&self) -> u64 {
        self.hash
    }

    fn write(&mut self, bytes: &[u8]) {
        for word in le_words(bytes) {
            self.hash ^= word;
        }
    }
}

fn le_words(data: &[u8]) -> impl Iterator<Item = u64> + '_ {
    let full = data.chunks_exact(8).map(|chunk| {
        let arr = [
            chunk[0], chunk[1], chunk[2], chunk[3], chunk[4], chunk[5], chunk[6], chunk[7],
        ];
        u64::from_le_bytes(arr)
    });

    let tail = data.chunks_exact(8).remainder();
    let mut tail_word = 0u64;
    for (i, &byte) in tail.iter().enumerate() {
        tail_word |= (byte as u64) << (i * 8);
    }

    full.chain(std::iter::once(tail_word))
        .filter(|&word| word != 0)
}
