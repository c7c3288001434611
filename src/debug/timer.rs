use instant::Instant;

/// Which phase of a frame is being timed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SystemPhase {
    Simulation = 0,
    BuildInstances = 1,
    GpuUpload = 2,
    Overlay = 3,
    RenderSubmit = 4,
}

pub const PHASE_COUNT: usize = 5;

impl SystemPhase {
    pub const ALL: [SystemPhase; PHASE_COUNT] = [
        Self::Simulation,
        Self::BuildInstances,
        Self::GpuUpload,
        Self::Overlay,
        Self::RenderSubmit,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Simulation => "Simulation",
            Self::BuildInstances => "Build Inst.",
            Self::GpuUpload => "GPU Upload",
            Self::Overlay => "Overlay",
            Self::RenderSubmit => "Render",
        }
    }
}

/// Per-phase timing with exponential moving average smoothing.
pub struct SystemTimers {
    /// EMA-smoothed duration in microseconds per phase.
    pub durations_us: [f64; PHASE_COUNT],
    /// Timestamp when `begin()` was called.
    start: Instant,
}

const EMA_ALPHA: f64 = 0.1;

impl SystemTimers {
    pub fn new() -> Self {
        Self {
            durations_us: [0.0; PHASE_COUNT],
            start: Instant::now(),
        }
    }

    /// Call before a phase runs.
    pub fn begin(&mut self) {
        self.start = Instant::now();
    }

    /// Call after a phase finishes. Records elapsed time for `phase`.
    pub fn end(&mut self, phase: SystemPhase) {
        let elapsed_us = self.start.elapsed().as_secs_f64() * 1_000_000.0;
        self.record(phase, elapsed_us);
    }

    fn record(&mut self, phase: SystemPhase, elapsed_us: f64) {
        let idx = phase as usize;
        self.durations_us[idx] =
            self.durations_us[idx] * (1.0 - EMA_ALPHA) + elapsed_us * EMA_ALPHA;
    }

    /// Sum of all phase durations (microseconds).
    pub fn total_us(&self) -> f64 {
        self.durations_us.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ema_moves_toward_samples() {
        let mut timers = SystemTimers::new();
        timers.record(SystemPhase::Simulation, 100.0);
        assert!((timers.durations_us[0] - 10.0).abs() < 1e-9);
        for _ in 0..200 {
            timers.record(SystemPhase::Simulation, 100.0);
        }
        assert!((timers.durations_us[0] - 100.0).abs() < 1e-3);
        assert_eq!(timers.durations_us[SystemPhase::Overlay as usize], 0.0);
    }

    #[test]
    fn total_sums_every_phase() {
        let mut timers = SystemTimers::new();
        timers.durations_us = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(timers.total_us(), 15.0);
        assert_eq!(SystemPhase::ALL.len(), PHASE_COUNT);
    }
}
