use std::time::{Duration, Instant};

pub const COUNT_IN_BEATS: u32 = 4;
pub const COUNT_IN_INTERVAL: Duration = Duration::from_millis(300);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CountInStep {
    /// 1-based beat number to announce.
    Beat(u32),
    /// All beats elapsed; playback starts now.
    Done,
}

/// Four announced beats before playback starts. Beat 1 is due immediately,
/// each following beat one interval later, and playback one interval after
/// the last beat.
#[derive(Clone, Copy, Debug)]
pub struct CountIn {
    started: Instant,
    announced: u32,
}

impl CountIn {
    pub fn start(now: Instant) -> Self {
        Self {
            started: now,
            announced: 0,
        }
    }

    pub fn advance(&mut self, now: Instant) -> Vec<CountInStep> {
        let elapsed = now.saturating_duration_since(self.started);
        let due = (elapsed.as_millis() / COUNT_IN_INTERVAL.as_millis()) as u32 + 1;

        let mut steps = Vec::new();
        while self.announced < due.min(COUNT_IN_BEATS) {
            self.announced += 1;
            steps.push(CountInStep::Beat(self.announced));
        }
        if due > COUNT_IN_BEATS {
            steps.push(CountInStep::Done);
        }
        steps
    }
}
