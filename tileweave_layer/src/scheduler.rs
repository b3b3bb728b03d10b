// Copyright 2025 the Tileweave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Coalescing of update requests into one deferred pass.

/// Tracks whether an update pass is owed.
///
/// Requests made while a pass is already pending are absorbed, so any number
/// of edits between two ticks cost one pass. Requests made while the layer is
/// detached are dropped; the dirty tracker keeps the edits until it attaches.
#[derive(Clone, Debug, Default)]
pub struct UpdateScheduler {
    pending: bool,
    passes: u64,
}

impl UpdateScheduler {
    /// Nothing pending.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for a deferred pass. Returns `true` when this call scheduled it.
    pub fn request(&mut self, active: bool) -> bool {
        if self.pending || !active {
            return false;
        }
        self.pending = true;
        true
    }

    /// Force a pass to be owed, bypassing the active check.
    pub fn force(&mut self) {
        self.pending = true;
    }

    /// Whether a pass is owed.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Start the owed pass. Returns `false` if nothing was owed.
    pub fn begin(&mut self) -> bool {
        self.pending
    }

    /// Mark the owed pass as done.
    pub fn finish(&mut self) {
        self.pending = false;
        self.passes += 1;
    }

    /// Number of passes run so far.
    pub fn passes(&self) -> u64 {
        self.passes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_coalesce() {
        let mut s = UpdateScheduler::new();
        assert!(s.request(true));
        assert!(!s.request(true));
        assert!(s.begin());
        s.finish();
        assert!(!s.is_pending());
        assert!(!s.begin());
        assert_eq!(s.passes(), 1);
    }

    #[test]
    fn inactive_requests_are_dropped() {
        let mut s = UpdateScheduler::new();
        assert!(!s.request(false));
        assert!(!s.is_pending());
        s.force();
        assert!(s.is_pending());
    }
}
