//! Process counters shared between the message loop and the status endpoint.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Metrics {
    bot_requests: AtomicU64,
    bot_connected: AtomicBool,
    aml_requests: AtomicU64,
    aml_connected: AtomicBool,
}

/// Point-in-time copy of [`Metrics`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub bot_requests: u64,
    pub bot_connected: bool,
    pub aml_requests: u64,
    pub aml_connected: bool,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_bot_request(&self) {
        self.bot_requests.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_aml_request(&self) {
        self.aml_requests.fetch_add(1, Ordering::SeqCst);
    }

    pub fn set_bot_connected(&self, connected: bool) {
        self.bot_connected.store(connected, Ordering::SeqCst);
    }

    pub fn set_aml_connected(&self, connected: bool) {
        self.aml_connected.store(connected, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            bot_requests: self.bot_requests.load(Ordering::SeqCst),
            bot_connected: self.bot_connected.load(Ordering::SeqCst),
            aml_requests: self.aml_requests.load(Ordering::SeqCst),
            aml_connected: self.aml_connected.load(Ordering::SeqCst),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn starts_disconnected_with_zero_counts() {
        assert_eq!(Metrics::new().snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn flags_toggle() {
        let m = Metrics::new();
        m.set_bot_connected(true);
        m.set_aml_connected(true);
        let s = m.snapshot();
        assert!(s.bot_connected && s.aml_connected);

        m.set_bot_connected(false);
        assert!(!m.snapshot().bot_connected);
        assert!(m.snapshot().aml_connected);
    }

    #[test]
    fn concurrent_increments_are_not_lost() {
        let m = Arc::new(Metrics::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let m = Arc::clone(&m);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        m.record_bot_request();
                        m.record_aml_request();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let s = m.snapshot();
        assert_eq!(s.bot_requests, 8000);
        assert_eq!(s.aml_requests, 8000);
    }
}
