use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Clock used for pacing frames and measuring reaction times.
pub trait Timer: Clone + Send + Sync {
    type Timestamp: Copy + Clone + Send + Sync;
    fn now(&self) -> Self::Timestamp;
    fn elapsed(&self, ts: Self::Timestamp) -> Duration;
    fn sleep(&self, d: Duration);
    fn record_frame(&mut self, d: Duration);
    fn calibration_stats(&self) -> CalibrationStats;
}

/// Summary of recorded frame durations, all in nanoseconds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalibrationStats {
    pub average_frame_time_ns: f64,
    pub jitter_ns: f64,
    pub min_frame_time_ns: f64,
    pub max_frame_time_ns: f64,
    pub effective_fps: f64,
    pub samples: usize,
}

impl CalibrationStats {
    pub fn from_frame_times(frame_times: impl IntoIterator<Item = Duration>) -> Self {
        let nanos: Vec<f64> = frame_times
            .into_iter()
            .map(|d| d.as_nanos() as f64)
            .collect();
        if nanos.is_empty() {
            return Self::default();
        }

        let n = nanos.len() as f64;
        let mean = nanos.iter().sum::<f64>() / n;
        let variance = nanos.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        Self {
            average_frame_time_ns: mean,
            jitter_ns: variance.sqrt(),
            min_frame_time_ns: nanos.iter().copied().fold(f64::INFINITY, f64::min),
            max_frame_time_ns: nanos.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            effective_fps: if mean > 0.0 { 1e9 / mean } else { 0.0 },
            samples: nanos.len(),
        }
    }
}

const DEFAULT_FRAME_SAMPLES: usize = 1000;

/// Monotonic nanosecond clock with platform-specific sleeping. Keeps the
/// most recent frame durations for calibration.
#[derive(Debug, Clone)]
pub struct HighPrecisionTimer {
    origin: Instant,
    frames: VecDeque<Duration>,
    capacity: usize,
}

impl Timer for HighPrecisionTimer {
    type Timestamp = u64;

    fn now(&self) -> u64 {
        self.origin.elapsed().as_nanos() as u64
    }

    fn elapsed(&self, ts: u64) -> Duration {
        Duration::from_nanos(self.now().saturating_sub(ts))
    }

    fn sleep(&self, d: Duration) {
        self.sleep_precise(d)
    }

    fn record_frame(&mut self, d: Duration) {
        if self.frames.len() == self.capacity {
            self.frames.pop_front();
        }
        self.frames.push_back(d);
    }

    fn calibration_stats(&self) -> CalibrationStats {
        CalibrationStats::from_frame_times(self.frames.iter().copied())
    }
}

impl HighPrecisionTimer {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_FRAME_SAMPLES)
    }

    /// Keeps at most `capacity` frame samples (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            origin: Instant::now(),
            frames: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn frame_times(&self) -> impl Iterator<Item = Duration> + '_ {
        self.frames.iter().copied()
    }

    pub fn sleep_precise(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        #[cfg(target_os = "windows")]
        self.windows_sleep(duration);
        #[cfg(target_os = "linux")]
        self.linux_sleep(duration);
        #[cfg(target_os = "macos")]
        self.macos_sleep(duration);
        #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
        std::thread::sleep(duration);
    }

    #[cfg(target_os = "windows")]
    fn windows_sleep(&self, duration: Duration) {
        use windows::Win32::Foundation::CloseHandle;
        use windows::Win32::System::Threading::{
            CreateWaitableTimerW, SetWaitableTimer, WaitForSingleObject, INFINITE,
        };

        // Negative due time means relative, in 100 ns units.
        let due_time = -((duration.as_nanos() / 100) as i64);

        unsafe {
            match CreateWaitableTimerW(None, true, None) {
                Ok(timer) => {
                    if SetWaitableTimer(timer, &due_time, 0, None, None, false).is_ok() {
                        WaitForSingleObject(timer, INFINITE);
                    } else {
                        std::thread::sleep(duration);
                    }
                    let _ = CloseHandle(timer);
                }
                Err(err) => {
                    tracing::warn!("waitable timer unavailable ({err}), falling back to thread sleep");
                    std::thread::sleep(duration);
                }
            }
        }
    }

    #[cfg(target_os = "linux")]
    fn linux_sleep(&self, duration: Duration) {
        use libc::{clock_nanosleep, timespec, CLOCK_MONOTONIC, EINTR};

        let mut request = timespec {
            tv_sec: duration.as_secs() as libc::time_t,
            tv_nsec: duration.subsec_nanos() as libc::c_long,
        };
        let mut remaining = timespec { tv_sec: 0, tv_nsec: 0 };
        // A signal cuts the sleep short; go back to sleep for the remainder.
        while unsafe { clock_nanosleep(CLOCK_MONOTONIC, 0, &request, &mut remaining) } == EINTR {
            request = remaining;
        }
    }

    #[cfg(target_os = "macos")]
    fn macos_sleep(&self, duration: Duration) {
        use mach2::mach_time::{mach_absolute_time, mach_timebase_info, mach_timebase_info_data_t};

        // The scheduler overshoots sub-100 us sleeps, so spin on the tick counter.
        if duration >= Duration::from_micros(100) {
            std::thread::sleep(duration);
            return;
        }

        let mut timebase = mach_timebase_info_data_t { numer: 0, denom: 0 };
        unsafe { mach_timebase_info(&mut timebase) };
        if timebase.numer == 0 {
            std::thread::sleep(duration);
            return;
        }
        let ticks = duration.as_nanos() as u64 * u64::from(timebase.denom) / u64::from(timebase.numer);
        let start = unsafe { mach_absolute_time() };
        while unsafe { mach_absolute_time() } - start < ticks {
            std::hint::spin_loop();
        }
    }
}

impl Default for HighPrecisionTimer {
    fn default() -> Self {
        Self::new()
    }
}
