use crate::gpu::{DeviceReading, GpuSampler};
use crate::history::Sample;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Sleep granularity between cancellation checks; shutdown never blocks
/// past the configured sampling interval.
const CANCEL_POLL: Duration = Duration::from_millis(100);

/// State shared between the sampling thread (producer) and the render loop
/// (consumer). Staged samples are appended per device and drained whole, so
/// nothing is lost or duplicated across ticks.
#[derive(Default)]
pub struct SharedSamples {
    staged: Mutex<HashMap<u32, Vec<Sample>>>,
    latest: Mutex<Vec<DeviceReading>>,
    probe_error: Mutex<Option<String>>,
    paused: AtomicBool,
    cancelled: AtomicBool,
}

impl SharedSamples {
    pub fn stage(&self, readings: Vec<DeviceReading>) {
        {
            let mut staged = self.staged.lock().unwrap();
            for reading in &readings {
                staged
                    .entry(reading.index)
                    .or_default()
                    .push(Sample::from_reading(reading));
            }
        }
        *self.latest.lock().unwrap() = readings;
    }

    /// Takes everything staged since the previous drain.
    #[must_use]
    pub fn drain(&self) -> HashMap<u32, Vec<Sample>> {
        std::mem::take(&mut *self.staged.lock().unwrap())
    }

    #[must_use]
    pub fn latest(&self) -> Vec<DeviceReading> {
        self.latest.lock().unwrap().clone()
    }

    /// Only the first failure is kept; the diagnostic is surfaced once.
    pub fn record_probe_error(&self, message: String) {
        let mut slot = self.probe_error.lock().unwrap();
        if slot.is_none() {
            *slot = Some(message);
        }
    }

    #[must_use]
    pub fn probe_error(&self) -> Option<String> {
        self.probe_error.lock().unwrap().clone()
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Owns the background sampling thread for the lifetime of a monitoring run.
pub struct Collector {
    shared: Arc<SharedSamples>,
    handle: Option<JoinHandle<()>>,
}

impl Collector {
    pub fn spawn(sampler: Box<dyn GpuSampler>, interval: Duration) -> Self {
        let shared = Arc::new(SharedSamples::default());
        let thread_shared = Arc::clone(&shared);

        let handle = thread::spawn(move || {
            sampling_loop(sampler.as_ref(), &thread_shared, interval);
        });

        Self {
            shared,
            handle: Some(handle),
        }
    }

    #[must_use]
    pub fn shared(&self) -> Arc<SharedSamples> {
        Arc::clone(&self.shared)
    }

    pub fn set_paused(&self, paused: bool) {
        self.shared.set_paused(paused);
    }

    pub fn stop(&mut self) {
        self.shared.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Collector {
    fn drop(&mut self) {
        self.stop();
    }
}

fn sampling_loop(sampler: &dyn GpuSampler, shared: &SharedSamples, interval: Duration) {
    while !shared.is_cancelled() {
        if !shared.is_paused() {
            match sampler.sample() {
                Ok(readings) => shared.stage(readings),
                Err(e) => shared.record_probe_error(e.to_string()),
            }
        }

        // Chunked sleep so cancellation is observed promptly.
        let mut remaining = interval;
        while !remaining.is_zero() && !shared.is_cancelled() {
            let nap = remaining.min(CANCEL_POLL);
            thread::sleep(nap);
            remaining = remaining.saturating_sub(nap);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{NvsharptopError, Result};

    struct FakeSampler {
        utilization: f64,
    }

    impl GpuSampler for FakeSampler {
        fn sample(&self) -> Result<Vec<DeviceReading>> {
            Ok(vec![DeviceReading {
                index: 0,
                name: "FakeGPU".to_string(),
                temperature: 50.0,
                utilization: self.utilization,
                memory_used: 1024.0,
                memory_total: 4096.0,
            }])
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    struct BrokenSampler;

    impl GpuSampler for BrokenSampler {
        fn sample(&self) -> Result<Vec<DeviceReading>> {
            Err(NvsharptopError::Launch("nvidia-smi: not found".to_string()))
        }

        fn is_available(&self) -> bool {
            false
        }
    }

    #[test]
    fn test_stage_and_drain_round_trip() {
        let shared = SharedSamples::default();
        let sampler = FakeSampler { utilization: 42.0 };

        shared.stage(sampler.sample().unwrap());
        shared.stage(sampler.sample().unwrap());

        let staged = shared.drain();
        assert_eq!(staged.get(&0).map(Vec::len), Some(2));

        // Draining empties the staging area; nothing is duplicated.
        assert!(shared.drain().is_empty());
        assert_eq!(shared.latest().len(), 1);
    }

    #[test]
    fn test_probe_error_is_recorded_once() {
        let shared = SharedSamples::default();
        shared.record_probe_error("first".to_string());
        shared.record_probe_error("second".to_string());
        assert_eq!(shared.probe_error().as_deref(), Some("first"));
    }

    #[test]
    fn test_collector_stages_samples_and_stops() {
        let mut collector = Collector::spawn(
            Box::new(FakeSampler { utilization: 10.0 }),
            Duration::from_millis(10),
        );
        let shared = collector.shared();

        thread::sleep(Duration::from_millis(80));
        assert!(!shared.drain().is_empty());

        collector.stop();
        assert!(shared.is_cancelled());
    }

    #[test]
    fn test_launch_failure_surfaces_one_diagnostic() {
        let mut collector =
            Collector::spawn(Box::new(BrokenSampler), Duration::from_millis(10));
        let shared = collector.shared();

        thread::sleep(Duration::from_millis(50));
        collector.stop();

        assert!(shared.probe_error().unwrap().contains("nvidia-smi"));
        assert!(shared.drain().is_empty());
    }
}
