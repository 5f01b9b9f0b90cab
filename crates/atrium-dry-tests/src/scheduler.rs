// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Frame scheduler the test cranks by hand.

use atrium_core::{FrameScheduler, FrameToken};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct Inner {
    next_id: u64,
    queued: Vec<FrameToken>,
    requested: usize,
    cancelled: Vec<FrameToken>,
}

/// Hands out sequential tokens and queues them until the test delivers them.
///
/// Clones share the queue.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    inner: Arc<Mutex<Inner>>,
}

impl ManualScheduler {
    /// Empty scheduler; the first token has id 1.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Removes and returns the oldest queued (requested, not cancelled) token.
    pub fn next_frame(&self) -> Option<FrameToken> {
        let mut inner = self.lock();
        if inner.queued.is_empty() {
            None
        } else {
            Some(inner.queued.remove(0))
        }
    }

    /// Tokens requested and not yet delivered or cancelled.
    pub fn queued(&self) -> Vec<FrameToken> {
        self.lock().queued.clone()
    }

    /// Total `request_frame` calls.
    pub fn request_count(&self) -> usize {
        self.lock().requested
    }

    /// Tokens passed to `cancel_frame`.
    pub fn cancelled(&self) -> Vec<FrameToken> {
        self.lock().cancelled.clone()
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameToken {
        let mut inner = self.lock();
        inner.next_id += 1;
        inner.requested += 1;
        let token = FrameToken::new(inner.next_id);
        inner.queued.push(token);
        token
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        let mut inner = self.lock();
        inner.queued.retain(|t| *t != token);
        inner.cancelled.push(token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_tokens_are_not_delivered() {
        let mut sched = ManualScheduler::new();
        let a = sched.request_frame();
        let b = sched.request_frame();
        sched.cancel_frame(a);
        assert_eq!(sched.next_frame(), Some(b));
        assert_eq!(sched.next_frame(), None);
        assert_eq!(sched.cancelled(), vec![a]);
        assert_eq!(sched.request_count(), 2);
    }
}
