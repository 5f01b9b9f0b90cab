// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Winit-backed [`FrameScheduler`]: a frame request becomes a redraw
//! request, and the token waits in a shared slot until `RedrawRequested`.

use atrium_core::{FrameScheduler, FrameToken};
use egui_winit::winit::window::Window;
use std::cell::Cell;
use std::rc::Rc;

/// Slot holding the token of the outstanding frame request.
///
/// The event loop keeps a clone and takes the token when the window
/// delivers `RedrawRequested`.
#[derive(Clone, Default)]
pub struct FrameSignal(Rc<Cell<Option<FrameToken>>>);

impl FrameSignal {
    /// Removes and returns the pending token.
    pub fn take(&self) -> Option<FrameToken> {
        self.0.take()
    }

    pub fn pending(&self) -> Option<FrameToken> {
        self.0.get()
    }
}

pub struct WinitFrameScheduler {
    request_redraw: Box<dyn Fn()>,
    next_id: u64,
    signal: FrameSignal,
}

impl WinitFrameScheduler {
    pub fn new(window: &'static Window) -> Self {
        Self::with_redraw(move || window.request_redraw())
    }

    /// Scheduler calling `request_redraw` for each frame request.
    pub fn with_redraw(request_redraw: impl Fn() + 'static) -> Self {
        Self {
            request_redraw: Box::new(request_redraw),
            next_id: 0,
            signal: FrameSignal::default(),
        }
    }

    pub fn signal(&self) -> FrameSignal {
        self.signal.clone()
    }
}

impl FrameScheduler for WinitFrameScheduler {
    fn request_frame(&mut self) -> FrameToken {
        self.next_id += 1;
        let token = FrameToken::new(self.next_id);
        self.signal.0.set(Some(token));
        (self.request_redraw)();
        token
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        if self.signal.pending() == Some(token) {
            self.signal.0.set(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_redraw_and_parks_the_token() {
        let redraws = Rc::new(Cell::new(0));
        let counter = Rc::clone(&redraws);
        let mut sched = WinitFrameScheduler::with_redraw(move || counter.set(counter.get() + 1));
        let signal = sched.signal();

        let a = sched.request_frame();
        let b = sched.request_frame();
        assert_ne!(a, b);
        assert_eq!(redraws.get(), 2);
        assert_eq!(signal.take(), Some(b));
        assert_eq!(signal.take(), None);
    }

    #[test]
    fn cancel_clears_only_the_matching_token() {
        let mut sched = WinitFrameScheduler::with_redraw(|| {});
        let signal = sched.signal();
        let a = sched.request_frame();
        sched.cancel_frame(FrameToken::new(a.id() + 7));
        assert_eq!(signal.pending(), Some(a));
        sched.cancel_frame(a);
        assert_eq!(signal.pending(), None);
    }
}
