pub mod ring;
pub mod timer;

use self::ring::RingBuffer;
use self::timer::SystemTimers;

/// Number of frame times to keep in the histogram.
pub const FRAME_HISTORY_LEN: usize = 300;
/// How often to log FPS (seconds).
const FPS_LOG_INTERVAL: f64 = 5.0;

/// Rolling frame statistics and per-phase timers shown in the debug panel.
pub struct FrameStats {
    /// Rolling window of frame times (seconds).
    pub frame_times: RingBuffer<f64>,

    pub fps: f64,
    pub frame_time_avg: f64,
    pub frame_time_min: f64,
    pub frame_time_max: f64,

    pub timers: SystemTimers,
    pub frame_count: u64,
    pub tick_count: u64,

    // Accumulators for the periodic log line.
    log_timer: f64,
    log_frame_count: u32,
    log_frame_sum: f64,
    log_frame_min: f64,
    log_frame_max: f64,
}

impl FrameStats {
    pub fn new() -> Self {
        Self {
            frame_times: RingBuffer::new(FRAME_HISTORY_LEN),
            fps: 0.0,
            frame_time_avg: 0.0,
            frame_time_min: 0.0,
            frame_time_max: 0.0,
            timers: SystemTimers::new(),
            frame_count: 0,
            tick_count: 0,
            log_timer: 0.0,
            log_frame_count: 0,
            log_frame_sum: 0.0,
            log_frame_min: f64::MAX,
            log_frame_max: 0.0,
        }
    }

    /// Record a frame time, update rolling stats, and periodically log.
    pub fn record_frame(&mut self, dt: f64) {
        self.frame_count += 1;
        self.frame_times.push(dt);

        let len = self.frame_times.len();
        if len > 0 {
            let mut sum = 0.0;
            let mut min = f64::MAX;
            let mut max = 0.0f64;
            for &t in self.frame_times.iter() {
                sum += t;
                min = min.min(t);
                max = max.max(t);
            }
            self.frame_time_avg = sum / len as f64;
            self.frame_time_min = min;
            self.frame_time_max = max;
            self.fps = if self.frame_time_avg > 0.0 { 1.0 / self.frame_time_avg } else { 0.0 };
        }

        self.log_frame_count += 1;
        self.log_frame_sum += dt;
        self.log_frame_min = self.log_frame_min.min(dt);
        self.log_frame_max = self.log_frame_max.max(dt);
        self.log_timer += dt;

        if self.log_timer >= FPS_LOG_INTERVAL {
            let avg_ms = (self.log_frame_sum / self.log_frame_count as f64) * 1000.0;
            let fps = self.log_frame_count as f64 / self.log_timer;
            log::info!(
                "FPS: {:.0} | avg: {:.2}ms | min: {:.2}ms | max: {:.2}ms | total frames: {}",
                fps,
                avg_ms,
                self.log_frame_min * 1000.0,
                self.log_frame_max * 1000.0,
                self.frame_count,
            );
            self.log_timer = 0.0;
            self.log_frame_count = 0;
            self.log_frame_sum = 0.0;
            self.log_frame_min = f64::MAX;
            self.log_frame_max = 0.0;
        }
    }
}
