//! Connection ceiling shared by all workers of one downloader.
//!
//! Each request reserves a slot before the transfer and releases it when the
//! returned guard drops, so network fan-out stays at or below `max` no matter
//! how many worker threads are running.

use std::sync::{Condvar, Mutex, MutexGuard};

#[derive(Debug)]
pub struct ConnectionLimiter {
    max: usize,
    in_use: Mutex<usize>,
    released: Condvar,
}

impl ConnectionLimiter {
    /// Create a limiter with the given ceiling (minimum 1).
    pub fn new(max: usize) -> Self {
        Self {
            max: max.max(1),
            in_use: Mutex::new(0),
            released: Condvar::new(),
        }
    }

    pub fn max(&self) -> usize {
        self.max
    }

    /// Number of connections currently reserved.
    pub fn in_use(&self) -> usize {
        *self.lock()
    }

    /// Free slots (max - in_use).
    pub fn available(&self) -> usize {
        self.max.saturating_sub(*self.lock())
    }

    /// Block until a slot is free, then reserve it.
    pub fn acquire(&self) -> ConnectionSlot<'_> {
        let mut in_use = self.lock();
        while *in_use >= self.max {
            in_use = self
                .released
                .wait(in_use)
                .unwrap_or_else(|e| e.into_inner());
        }
        *in_use += 1;
        ConnectionSlot { limiter: self }
    }

    /// Reserve a slot only if one is free right now.
    pub fn try_acquire(&self) -> Option<ConnectionSlot<'_>> {
        let mut in_use = self.lock();
        if *in_use >= self.max {
            return None;
        }
        *in_use += 1;
        Some(ConnectionSlot { limiter: self })
    }

    fn release(&self) {
        let mut in_use = self.lock();
        *in_use = in_use.saturating_sub(1);
        drop(in_use);
        self.released.notify_one();
    }

    fn lock(&self) -> MutexGuard<'_, usize> {
        self.in_use.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Releases the reserved connection when dropped.
#[derive(Debug)]
pub struct ConnectionSlot<'a> {
    limiter: &'a ConnectionLimiter,
}

impl Drop for ConnectionSlot<'_> {
    fn drop(&mut self) {
        self.limiter.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn acquire_and_release() {
        let limiter = ConnectionLimiter::new(2);
        assert_eq!(limiter.available(), 2);
        let a = limiter.acquire();
        let b = limiter.acquire();
        assert_eq!(limiter.in_use(), 2);
        assert!(limiter.try_acquire().is_none());
        drop(a);
        assert_eq!(limiter.available(), 1);
        drop(b);
        assert_eq!(limiter.in_use(), 0);
    }

    #[test]
    fn zero_is_clamped_to_one() {
        assert_eq!(ConnectionLimiter::new(0).max(), 1);
    }

    #[test]
    fn concurrent_holders_never_exceed_ceiling() {
        let limiter = Arc::new(ConnectionLimiter::new(3));
        let peak = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                let peak = Arc::clone(&peak);
                std::thread::spawn(move || {
                    for _ in 0..10 {
                        let _slot = limiter.acquire();
                        peak.fetch_max(limiter.in_use(), Ordering::SeqCst);
                        std::thread::sleep(Duration::from_millis(1));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(limiter.in_use(), 0);
    }
}
