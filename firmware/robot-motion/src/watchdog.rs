//! Command-loss watchdog.
//!
//! Two states: ARMED while commands are flowing (or a stop is still in
//! progress) and IDLE once the platform has confirmed neutral. The
//! controller checks `expired` every tick and, on a trip, retargets
//! neutral through the normal ramp/trajectory path; the watchdog never
//! touches the actuators itself.

/// Silence longer than this forces the target to neutral.
pub const COMMAND_TIMEOUT_MS: u64 = 500;

#[derive(Debug, Clone, Copy)]
pub struct CommandWatchdog {
    last_command_ms: u64,
    armed: bool,
}

impl CommandWatchdog {
    /// Starts IDLE: nothing can run away before the first command.
    pub fn new() -> Self {
        CommandWatchdog {
            last_command_ms: 0,
            armed: false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Record an accepted command.
    pub fn feed(&mut self, now_ms: u64) {
        self.last_command_ms = now_ms;
        self.armed = true;
    }

    /// True while ARMED and the silence window has elapsed.
    pub fn expired(&self, now_ms: u64) -> bool {
        self.armed && now_ms.saturating_sub(self.last_command_ms) > COMMAND_TIMEOUT_MS
    }

    /// Called once the platform has settled at neutral after a trip, so
    /// the forced-stop path stops re-running every tick.
    pub fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Default for CommandWatchdog {
    fn default() -> Self {
        CommandWatchdog::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_idle() {
        let wd = CommandWatchdog::new();
        assert!(!wd.is_armed());
        assert!(!wd.expired(10_000));
    }

    #[test]
    fn test_arms_on_feed() {
        let mut wd = CommandWatchdog::new();
        wd.feed(1000);
        assert!(wd.is_armed());
        assert!(!wd.expired(1000 + COMMAND_TIMEOUT_MS));
        assert!(wd.expired(1001 + COMMAND_TIMEOUT_MS));
    }

    #[test]
    fn test_feed_resets_window() {
        let mut wd = CommandWatchdog::new();
        wd.feed(0);
        wd.feed(400);
        assert!(!wd.expired(800));
        assert!(wd.expired(1000));
    }

    #[test]
    fn test_disarm_silences_expiry() {
        let mut wd = CommandWatchdog::new();
        wd.feed(0);
        assert!(wd.expired(1000));
        wd.disarm();
        assert!(!wd.expired(2000));
        // A new command re-arms from scratch.
        wd.feed(2000);
        assert!(!wd.expired(2100));
    }
}
