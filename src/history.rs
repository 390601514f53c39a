use crate::gpu::DeviceReading;
use std::collections::VecDeque;
use std::time::SystemTime;

/// Entries kept per device. The vertical view consumes at most one column
/// per terminal cell, so this just needs to exceed any sane terminal width.
pub const HISTORY_CAPACITY: usize = 300;

/// One derived observation, staged per device until the next display tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub utilization: f64,
    pub memory_percent: f64,
    pub timestamp: SystemTime,
}

impl Sample {
    #[must_use]
    pub fn from_reading(reading: &DeviceReading) -> Self {
        Self {
            utilization: reading.utilization,
            memory_percent: reading.memory_percent(),
            timestamp: SystemTime::now(),
        }
    }
}

/// An aggregated sample stored in a device's rolling window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryEntry {
    pub utilization: f64,
    pub memory_percent: f64,
    pub timestamp: SystemTime,
}

/// Arithmetic mean of all samples staged since the previous display tick.
/// Returns `None` for an empty batch; the caller falls back to the latest
/// instantaneous reading. Values stay `f64` — rounding to whole cells is the
/// renderer's business.
#[must_use]
pub fn aggregate(staged: &[Sample]) -> Option<HistoryEntry> {
    let last = staged.last()?;
    let n = staged.len() as f64;

    Some(HistoryEntry {
        utilization: staged.iter().map(|s| s.utilization).sum::<f64>() / n,
        memory_percent: staged.iter().map(|s| s.memory_percent).sum::<f64>() / n,
        timestamp: last.timestamp,
    })
}

/// Fixed-capacity rolling window, oldest-evicted-first.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl HistoryBuffer {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends and evicts the oldest entry once capacity is exceeded.
    pub fn push(&mut self, entry: HistoryEntry) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Current contents in chronological order, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<HistoryEntry> {
        self.entries.iter().copied().collect()
    }

    #[must_use]
    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(utilization: f64) -> HistoryEntry {
        HistoryEntry {
            utilization,
            memory_percent: 0.0,
            timestamp: SystemTime::now(),
        }
    }

    fn sample(utilization: f64, memory_percent: f64) -> Sample {
        Sample {
            utilization,
            memory_percent,
            timestamp: SystemTime::now(),
        }
    }

    #[test]
    fn test_buffer_never_exceeds_capacity() {
        let mut buffer = HistoryBuffer::new(4);
        for i in 0..20 {
            buffer.push(entry(i as f64));
            assert!(buffer.len() <= 4);
        }
    }

    #[test]
    fn test_eviction_keeps_newest_entries_oldest_first() {
        let mut buffer = HistoryBuffer::new(3);
        for i in 0..7 {
            buffer.push(entry(i as f64));
        }

        let kept: Vec<f64> = buffer.snapshot().iter().map(|e| e.utilization).collect();
        assert_eq!(kept, vec![4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_capacity_floor_of_one() {
        let mut buffer = HistoryBuffer::new(0);
        buffer.push(entry(1.0));
        buffer.push(entry(2.0));
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.latest().unwrap().utilization, 2.0);
    }

    #[test]
    fn test_aggregate_is_arithmetic_mean() {
        let staged = [sample(40.0, 20.0), sample(60.0, 30.0)];
        let entry = aggregate(&staged).unwrap();
        assert_eq!(entry.utilization, 50.0);
        assert_eq!(entry.memory_percent, 25.0);
    }

    #[test]
    fn test_aggregate_empty_batch_is_none() {
        assert!(aggregate(&[]).is_none());
    }

    #[test]
    fn test_sample_from_reading() {
        let reading = DeviceReading {
            index: 0,
            name: "TestGPU".to_string(),
            temperature: 55.0,
            utilization: 42.0,
            memory_used: 2048.0,
            memory_total: 8192.0,
        };
        let sample = Sample::from_reading(&reading);
        assert_eq!(sample.utilization, 42.0);
        assert_eq!(sample.memory_percent, 25.0);
    }
}
