use std::fmt;

/// Why the preview loop stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitReason {
    QuitKey,
    FrameBudget,
    WindowClosed,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::QuitKey => write!(f, "quit key pressed"),
            ExitReason::FrameBudget => write!(f, "frame budget reached"),
            ExitReason::WindowClosed => write!(f, "preview window closed"),
        }
    }
}

/// Two-state loop controller. `Exiting` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Exiting(ExitReason),
}

impl LoopState {
    pub fn is_running(self) -> bool {
        self == LoopState::Running
    }

    /// Applies the latest key poll; only `quit_key` has an effect.
    pub fn on_key(self, key: Option<i32>, quit_key: i32) -> Self {
        match (self, key) {
            (LoopState::Running, Some(k)) if k == quit_key => LoopState::Exiting(ExitReason::QuitKey),
            (state, _) => state,
        }
    }

    /// Stops once `iterations` reaches the optional budget.
    pub fn on_frame_count(self, iterations: usize, budget: Option<usize>) -> Self {
        match (self, budget) {
            (LoopState::Running, Some(max)) if iterations >= max => LoopState::Exiting(ExitReason::FrameBudget),
            (state, _) => state,
        }
    }

    pub fn on_surface(self, open: bool) -> Self {
        match self {
            LoopState::Running if !open => LoopState::Exiting(ExitReason::WindowClosed),
            state => state,
        }
    }
}
