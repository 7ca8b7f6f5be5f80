use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use playsync_clock::ClockStats;
use playsync_types::Ticks;

/**
    Counters shared by the producer and renderer threads.
*/
#[derive(Debug, Clone, Default, Serialize)]
pub struct SimStats {
    // Producer side
    pub frames_fed: u64,
    pub late_frames: u64,
    pub worst_late_margin_us: i64,
    // Renderer side
    pub wakeups: u64,
    pub idle_polls: u64,
    pub worst_wake_error_us: i64,
    pub conversions: u64,
    pub bound_exceeded: u64,
    // Final clock state
    pub final_delay_us: i64,
    pub clock_updates: u64,
    pub clock_late: u64,
    pub clock_discontinuities: u64,
    pub clock_paused_updates: u64,
}

pub type SharedStats = Arc<Mutex<SimStats>>;

pub fn shared() -> SharedStats {
    Arc::new(Mutex::new(SimStats::default()))
}

impl SimStats {
    pub fn record_late(&mut self, margin: Ticks) {
        self.late_frames += 1;
        self.worst_late_margin_us = self.worst_late_margin_us.max(margin.0);
    }

    pub fn record_wakeup(&mut self, error: Ticks) {
        self.wakeups += 1;
        self.worst_wake_error_us = self.worst_wake_error_us.max(error.abs().0);
    }

    pub fn record_clock(&mut self, stats: ClockStats, delay: Ticks) {
        self.final_delay_us = delay.0;
        self.clock_updates = stats.updates;
        self.clock_late = stats.late;
        self.clock_discontinuities = stats.discontinuities;
        self.clock_paused_updates = stats.paused_updates;
    }

    /**
        Human-readable summary, one counter per line.
    */
    pub fn report(&self) -> String {
        format!(
            "frames fed:          {}\n\
             late frames:         {} (worst margin {} us)\n\
             renderer wakeups:    {} (worst error {} us, {} idle polls)\n\
             conversions:         {} ({} beyond bound)\n\
             final delay:         {} us\n\
             clock updates:       {} ({} late, {} discontinuities, {} while paused)",
            self.frames_fed,
            self.late_frames,
            self.worst_late_margin_us,
            self.wakeups,
            self.worst_wake_error_us,
            self.idle_polls,
            self.conversions,
            self.bound_exceeded,
            self.final_delay_us,
            self.clock_updates,
            self.clock_late,
            self.clock_discontinuities,
            self.clock_paused_updates,
        )
    }
}
