use std::time::{Duration, Instant};

/// Wall-clock recording time excluding paused intervals.
#[derive(Debug, Clone, Default)]
pub struct ActiveClock {
    started_at: Option<Instant>,
    paused_total: Duration,
    paused_at: Option<Instant>,
}

impl ActiveClock {
    pub fn start(&mut self) {
        self.start_at(Instant::now());
    }

    pub fn pause(&mut self) {
        self.pause_at(Instant::now());
    }

    pub fn resume(&mut self) {
        self.resume_at(Instant::now());
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed_at(Instant::now())
    }

    pub fn start_at(&mut self, now: Instant) {
        self.started_at = Some(now);
        self.paused_total = Duration::ZERO;
        self.paused_at = None;
    }

    pub fn pause_at(&mut self, now: Instant) {
        if self.started_at.is_some() && self.paused_at.is_none() {
            self.paused_at = Some(now);
        }
    }

    pub fn resume_at(&mut self, now: Instant) {
        if let Some(paused_at) = self.paused_at.take() {
            self.paused_total += now.saturating_duration_since(paused_at);
        }
    }

    pub fn elapsed_at(&self, now: Instant) -> Duration {
        let Some(start) = self.started_at else {
            return Duration::ZERO;
        };
        let end = self.paused_at.unwrap_or(now);
        end.saturating_duration_since(start)
            .saturating_sub(self.paused_total)
    }
}
