//! Resource pressure sampling used for batch backpressure

use serde::{Deserialize, Serialize};

/// Memory pressure level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum PressureLevel {
    /// Plenty of headroom
    Low,
    #[default]
    Normal,
    /// Batches should shrink
    High,
    /// Batches should shrink to the floor
    Critical,
}

impl PressureLevel {
    /// Classify a usage percentage against the budget
    pub fn from_usage_percent(percent: f64) -> Self {
        if percent > 90.0 {
            PressureLevel::Critical
        } else if percent > 75.0 {
            PressureLevel::High
        } else if percent > 50.0 {
            PressureLevel::Normal
        } else {
            PressureLevel::Low
        }
    }

    pub fn is_elevated(&self) -> bool {
        matches!(self, PressureLevel::High | PressureLevel::Critical)
    }
}

/// Source of the pressure signal sampled before and after every batch
#[cfg_attr(test, mockall::automock)]
pub trait ResourceMonitor: Send + Sync {
    fn sample(&self) -> PressureLevel;
}

/// Resident memory of this process against a fixed budget
#[derive(Debug, Clone)]
pub struct ProcessMemoryMonitor {
    max_memory_mb: u64,
}

impl ProcessMemoryMonitor {
    pub fn new(max_memory_mb: u64) -> Self {
        Self {
            max_memory_mb: max_memory_mb.max(1),
        }
    }

    pub fn max_memory_mb(&self) -> u64 {
        self.max_memory_mb
    }

    /// Resident set size in bytes, 0 when unknown
    pub fn process_memory_bytes() -> u64 {
        #[cfg(target_os = "linux")]
        {
            if let Ok(content) = std::fs::read_to_string("/proc/self/statm") {
                if let Some(rss) = content.split_whitespace().nth(1) {
                    if let Ok(pages) = rss.parse::<u64>() {
                        return pages * 4096;
                    }
                }
            }
            0
        }

        #[cfg(not(target_os = "linux"))]
        {
            0
        }
    }
}

impl Default for ProcessMemoryMonitor {
    fn default() -> Self {
        Self::new(512)
    }
}

impl ResourceMonitor for ProcessMemoryMonitor {
    fn sample(&self) -> PressureLevel {
        let used = Self::process_memory_bytes() as f64;
        let budget = self.max_memory_mb.saturating_mul(1024 * 1024) as f64;
        PressureLevel::from_usage_percent(used / budget * 100.0)
    }
}

/// Always reports the same level
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedPressureMonitor(pub PressureLevel);

impl ResourceMonitor for FixedPressureMonitor {
    fn sample(&self) -> PressureLevel {
        self.0
    }
}
