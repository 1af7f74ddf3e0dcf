use std::fmt;

use serde::Serialize;

/// Lifecycle of an analysis session.
///
/// `Idle → Running` on a successful start, `Running → Stopping` when a
/// stop is requested, `Stopping → Idle` once the capture loop has wound
/// down and released the device. A session that hits a fatal device
/// error goes straight back to `Idle` on its own.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Idle,
    Running,
    Stopping,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SessionState::Idle => "idle",
            SessionState::Running => "running",
            SessionState::Stopping => "stopping",
        };
        f.write_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(SessionState::Idle.to_string(), "idle");
        assert_eq!(SessionState::Running.to_string(), "running");
        assert_eq!(SessionState::Stopping.to_string(), "stopping");
    }
}
