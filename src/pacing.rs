//! Typing-effect pacing policy.
//!
//! The policy maps the running count of characters already shown to the
//! pause that follows the next one. It never touches a clock; the client does
//! the sleeping.

use std::time::Duration;

/// One speed tier: positions below `below` pause for `delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaceTier {
    pub below: usize,
    pub delay: Duration,
}

/// Default ramp: slow start, then progressively faster.
pub const DEFAULT_TIERS: [PaceTier; 3] = [
    PaceTier {
        below: 20,
        delay: Duration::from_millis(50),
    },
    PaceTier {
        below: 50,
        delay: Duration::from_millis(30),
    },
    PaceTier {
        below: 100,
        delay: Duration::from_millis(15),
    },
];

/// Delay after the tiers run out.
pub const DEFAULT_TAIL_DELAY: Duration = Duration::from_millis(5);

/// Per-character delay policy for the typing effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypingPace {
    /// Tiers in ascending `below` order.
    tiers: Vec<PaceTier>,
    tail: Duration,
}

impl Default for TypingPace {
    fn default() -> Self {
        Self {
            tiers: DEFAULT_TIERS.to_vec(),
            tail: DEFAULT_TAIL_DELAY,
        }
    }
}

impl TypingPace {
    /// Build a custom policy. Tiers are sorted by threshold.
    pub fn new(mut tiers: Vec<PaceTier>, tail: Duration) -> Self {
        tiers.sort_by_key(|t| t.below);
        Self { tiers, tail }
    }

    /// No pauses at all (typing effect disabled).
    pub fn instant() -> Self {
        Self {
            tiers: Vec::new(),
            tail: Duration::ZERO,
        }
    }

    /// Pause after the character at position `total_chars_so_far` (0-based,
    /// counted from the start of the response, not the fragment).
    pub fn delay(&self, total_chars_so_far: usize) -> Duration {
        self.tiers
            .iter()
            .find(|t| total_chars_so_far < t.below)
            .map_or(self.tail, |t| t.delay)
    }

    pub fn is_instant(&self) -> bool {
        self.tail.is_zero() && self.tiers.iter().all(|t| t.delay.is_zero())
    }

    /// Total pause for a response of `chars` characters.
    #[cfg(test)]
    fn total_delay(&self, chars: usize) -> Duration {
        (0..chars).map(|i| self.delay(i)).sum()
    }
}
