//! Cancellable per-session countdown handle.
//!
//! The host environment owns the actual one-second timer; the clock here only
//! arbitrates which scheduled ticks are still welcome. Every (re)start mints a
//! fresh token and every cancellation bumps the generation, so a tick that was
//! scheduled before a transition away from `Active` presents a stale token and
//! is ignored.

use serde::{Deserialize, Serialize};

/// Token minted when the clock (re)starts; each tick must present one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickToken(u32);

/// Generation-counting countdown gate bound to one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SessionClock {
    generation: u32,
    running: bool,
}

impl SessionClock {
    /// A stopped clock with no outstanding tokens.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            generation: 0,
            running: false,
        }
    }

    /// Cancel any outstanding schedule and start a fresh countdown.
    pub fn restart(&mut self) -> TickToken {
        self.generation = self.generation.wrapping_add(1);
        self.running = true;
        TickToken(self.generation)
    }

    /// Stop the clock; all previously minted tokens go stale.
    pub fn cancel(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.running = false;
    }

    /// Whether a scheduled tick carrying this token may still fire.
    #[must_use]
    pub const fn accepts(&self, token: TickToken) -> bool {
        self.running && token.0 == self.generation
    }

    /// Current token while running.
    #[must_use]
    pub const fn token(&self) -> Option<TickToken> {
        if self.running {
            Some(TickToken(self.generation))
        } else {
            None
        }
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }
}
