//! Device signals and the frame budget derived from them.
//!
//! These are advisory: they only change how often frames run and whether
//! the engine pauses itself under memory pressure.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceTier {
    Low,
    Medium,
    High,
}

impl PerformanceTier {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Some(PerformanceTier::Low),
            "medium" | "mid" => Some(PerformanceTier::Medium),
            "high" => Some(PerformanceTier::High),
            _ => None,
        }
    }
}

/// What the host environment tells us about itself.
pub trait DeviceSignals {
    fn reduced_motion(&self) -> bool;
    fn performance_tier(&self) -> PerformanceTier;
    fn is_mobile(&self) -> bool;
    /// Polled while the watchdog is armed.
    fn memory_pressure(&self) -> bool;
}

/// Signals read from the environment, the CPU count and `/proc/meminfo`.
///
/// - `ASCIISCAPE_REDUCED_MOTION=1` (or `REDUCE_MOTION=1`) asks for fewer frames
/// - `ASCIISCAPE_TIER=low|medium|high` overrides the CPU-count guess
/// - `TERMUX_VERSION` / `ANDROID_ROOT` mark a phone terminal
#[derive(Debug, Clone, Default)]
pub struct EnvDeviceSignals;

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

impl DeviceSignals for EnvDeviceSignals {
    fn reduced_motion(&self) -> bool {
        env_flag("ASCIISCAPE_REDUCED_MOTION") || env_flag("REDUCE_MOTION")
    }

    fn performance_tier(&self) -> PerformanceTier {
        if let Some(tier) = std::env::var("ASCIISCAPE_TIER")
            .ok()
            .and_then(|v| PerformanceTier::parse(&v))
        {
            return tier;
        }
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        match cpus {
            0..=2 => PerformanceTier::Low,
            3..=4 => PerformanceTier::Medium,
            _ => PerformanceTier::High,
        }
    }

    fn is_mobile(&self) -> bool {
        std::env::var_os("TERMUX_VERSION").is_some() || std::env::var_os("ANDROID_ROOT").is_some()
    }

    fn memory_pressure(&self) -> bool {
        std::fs::read_to_string("/proc/meminfo")
            .ok()
            .and_then(|raw| parse_meminfo(&raw))
            .is_some_and(|(total, available)| is_under_pressure(total, available))
    }
}

/// `(MemTotal, MemAvailable)` in kB.
pub fn parse_meminfo(raw: &str) -> Option<(u64, u64)> {
    let field = |name: &str| {
        raw.lines()
            .find(|line| line.starts_with(name))
            .and_then(|line| line.split_whitespace().nth(1))
            .and_then(|v| v.parse::<u64>().ok())
    };
    Some((field("MemTotal:")?, field("MemAvailable:")?))
}

/// Less than 5% of memory left.
fn is_under_pressure(total: u64, available: u64) -> bool {
    total > 0 && available * 20 < total
}

/// Fixed signals. Clones share the memory-pressure flag so a test can raise
/// it after handing the signals to the engine.
#[derive(Debug, Clone)]
pub struct StaticSignals {
    pub reduced_motion: bool,
    pub tier: PerformanceTier,
    pub mobile: bool,
    pressure: Rc<Cell<bool>>,
}

impl Default for StaticSignals {
    fn default() -> Self {
        Self {
            reduced_motion: false,
            tier: PerformanceTier::High,
            mobile: false,
            pressure: Rc::new(Cell::new(false)),
        }
    }
}

impl StaticSignals {
    pub fn new(tier: PerformanceTier) -> Self {
        Self {
            tier,
            ..Self::default()
        }
    }

    pub fn with_reduced_motion(mut self, on: bool) -> Self {
        self.reduced_motion = on;
        self
    }

    pub fn with_mobile(mut self, on: bool) -> Self {
        self.mobile = on;
        self
    }

    pub fn set_memory_pressure(&self, on: bool) {
        self.pressure.set(on);
    }
}

impl DeviceSignals for StaticSignals {
    fn reduced_motion(&self) -> bool {
        self.reduced_motion
    }

    fn performance_tier(&self) -> PerformanceTier {
        self.tier
    }

    fn is_mobile(&self) -> bool {
        self.mobile
    }

    fn memory_pressure(&self) -> bool {
        self.pressure.get()
    }
}

const MAX_FPS: u32 = 120;

/// Target frame rate plus whether the memory watchdog runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameBudget {
    pub fps: u32,
    pub watchdog: bool,
}

impl FrameBudget {
    pub fn from_signals(signals: &dyn DeviceSignals, fps_override: Option<u32>) -> Self {
        let tier = signals.performance_tier();
        let mobile = signals.is_mobile();
        let fps = match fps_override {
            Some(fps) => fps.clamp(1, MAX_FPS),
            None if signals.reduced_motion() => 8,
            None => match tier {
                PerformanceTier::Low => 15,
                PerformanceTier::Medium => 24,
                PerformanceTier::High => 30,
            },
        };
        let budget = Self {
            fps,
            watchdog: tier == PerformanceTier::Low || mobile,
        };
        debug!(?tier, mobile, fps = budget.fps, watchdog = budget.watchdog, "frame budget");
        budget
    }

    pub fn interval(&self) -> Duration {
        Duration::from_micros(1_000_000 / u64::from(self.fps.max(1)))
    }
}

/// Polls memory pressure every `every` frames while armed.
#[derive(Debug, Clone)]
pub struct MemoryWatchdog {
    armed: bool,
    every: u64,
    frames: u64,
}

impl MemoryWatchdog {
    pub fn new(armed: bool, every: u64) -> Self {
        Self {
            armed,
            every: every.max(1),
            frames: 0,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Count a frame; true when the loop should pause.
    pub fn check(&mut self, signals: &dyn DeviceSignals) -> bool {
        if !self.armed {
            return false;
        }
        self.frames += 1;
        self.frames % self.every == 0 && signals.memory_pressure()
    }
}
