//! Manual override flag shared between the button and motion rules

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Process-wide "ignore motion" flag
///
/// Cloning yields another handle to the same cell. The button rule is the only
/// writer; the motion rule only reads it. Starts out `false`.
#[derive(Clone, Debug, Default)]
pub struct OverrideState {
    ignore_motion: Arc<AtomicBool>,
}

impl OverrideState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.ignore_motion.load(Ordering::SeqCst)
    }

    pub fn set(&self, active: bool) {
        self.ignore_motion.store(active, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_inactive_and_clones_share_the_cell() {
        let state = OverrideState::new();
        let other = state.clone();
        assert!(!state.is_active());

        other.set(true);
        assert!(state.is_active());
        state.set(false);
        assert!(!other.is_active());
    }
}
