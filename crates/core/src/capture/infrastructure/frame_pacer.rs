use std::thread;
use std::time::{Duration, Instant};

/// Holds a channel to a fixed delivery rate by sleeping before each frame.
#[derive(Debug)]
pub(crate) struct FramePacer {
    interval: Option<Duration>,
    next_due: Option<Instant>,
}

impl FramePacer {
    /// `fps <= 0` disables pacing.
    pub fn new(fps: f64) -> Self {
        let interval = (fps.is_finite() && fps > 0.0).then(|| Duration::from_secs_f64(1.0 / fps));
        Self {
            interval,
            next_due: None,
        }
    }

    /// Blocks until the next frame is due. The first call never blocks.
    pub fn wait(&mut self) {
        let Some(interval) = self.interval else {
            return;
        };
        if let Some(due) = self.next_due {
            let now = Instant::now();
            if due > now {
                thread::sleep(due - now);
            }
        }
        self.next_due = Some(Instant::now() + interval);
    }
}
