use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Counters describing how a queue has been used
///
/// Cloning shares the underlying counters.
#[derive(Debug, Clone)]
pub struct QueueMetrics {
    /// Items successfully enqueued
    puts: Arc<AtomicU64>,
    /// Items successfully dequeued
    takes: Arc<AtomicU64>,
    /// Times a producer found the queue full and had to wait
    put_waits: Arc<AtomicU64>,
    /// Times a consumer found the queue empty and had to wait
    take_waits: Arc<AtomicU64>,
    /// Blocked calls abandoned through cancellation or timeout
    abandoned: Arc<AtomicU64>,
    /// Largest depth ever observed right after a put
    high_water: Arc<AtomicUsize>,
    start_time: Instant,
}

impl QueueMetrics {
    /// Create zeroed counters; throughput is measured from now
    pub fn new() -> Self {
        Self {
            puts: Arc::new(AtomicU64::new(0)),
            takes: Arc::new(AtomicU64::new(0)),
            put_waits: Arc::new(AtomicU64::new(0)),
            take_waits: Arc::new(AtomicU64::new(0)),
            abandoned: Arc::new(AtomicU64::new(0)),
            high_water: Arc::new(AtomicUsize::new(0)),
            start_time: Instant::now(),
        }
    }

    /// Record a successful put that left the queue `depth` items deep
    pub fn record_put(&self, depth: usize) {
        self.puts.fetch_add(1, Ordering::Relaxed);
        self.high_water.fetch_max(depth, Ordering::Relaxed);
    }

    /// Record a completed take
    pub fn record_take(&self) {
        self.takes.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a put that had to wait for space
    pub fn record_put_wait(&self) {
        self.put_waits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a take that had to wait for an item
    pub fn record_take_wait(&self) {
        self.take_waits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a wait given up through cancel or timeout
    pub fn record_abandoned(&self) {
        self.abandoned.fetch_add(1, Ordering::Relaxed);
    }

    /// Get total completed puts
    pub fn total_puts(&self) -> u64 {
        self.puts.load(Ordering::Relaxed)
    }

    /// Get total completed takes
    pub fn total_takes(&self) -> u64 {
        self.takes.load(Ordering::Relaxed)
    }

    /// Get total puts that waited
    pub fn total_put_waits(&self) -> u64 {
        self.put_waits.load(Ordering::Relaxed)
    }

    /// Get total takes that waited
    pub fn total_take_waits(&self) -> u64 {
        self.take_waits.load(Ordering::Relaxed)
    }

    /// Get total abandoned waits
    pub fn total_abandoned(&self) -> u64 {
        self.abandoned.load(Ordering::Relaxed)
    }

    /// Get the largest depth ever observed
    pub fn high_water_mark(&self) -> usize {
        self.high_water.load(Ordering::Relaxed)
    }

    /// Items moved through the queue per second since creation
    pub fn throughput_ips(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed == 0.0 {
            0.0
        } else {
            self.total_takes() as f64 / elapsed
        }
    }

    /// Get a snapshot of current metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            puts: self.total_puts(),
            takes: self.total_takes(),
            put_waits: self.total_put_waits(),
            take_waits: self.total_take_waits(),
            abandoned: self.total_abandoned(),
            high_water_mark: self.high_water_mark(),
            throughput_ips: self.throughput_ips(),
            elapsed: self.start_time.elapsed(),
        }
    }
}

impl Default for QueueMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// A snapshot of metrics at a point in time
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub puts: u64,
    pub takes: u64,
    pub put_waits: u64,
    pub take_waits: u64,
    pub abandoned: u64,
    pub high_water_mark: usize,
    pub throughput_ips: f64,
    pub elapsed: Duration,
}

impl MetricsSnapshot {
    /// Format metrics as a human-readable string
    pub fn format(&self) -> String {
        format!(
            "Puts: {}, Takes: {}, Producer waits: {}, Consumer waits: {}, \
             Abandoned: {}, Peak depth: {}, Throughput: {:.2} items/s, Elapsed: {:.2}s",
            self.puts,
            self.takes,
            self.put_waits,
            self.take_waits,
            self.abandoned,
            self.high_water_mark,
            self.throughput_ips,
            self.elapsed.as_secs_f64()
        )
    }
}
