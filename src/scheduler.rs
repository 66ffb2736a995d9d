//! The frame pump: a thread-safe, coalesced wake signal for the UI loop.
//!
//! State mutations anywhere in the application end up as `invalidate` calls on
//! the UI thread; work arising on other threads must not touch the queue or
//! the widget tree and instead posts a wake signal here. The host event loop
//! observes the ping, calls [`take_frame_request`], and runs the synchronous
//! frame callback ([`crate::surface::Surface::render_frame`]).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use calloop::ping::Ping;

/// Coalescing frame-request latch plus the event-loop wake handle.
///
/// At most one wake is pending at a time: redundant [`post_invalidate_event`]
/// calls between two frames collapse into a single ping.
pub struct FrameScheduler {
    requested: AtomicBool,
    ping: OnceLock<Ping>,
}

impl FrameScheduler {
    pub const fn new() -> Self {
        Self {
            requested: AtomicBool::new(false),
            ping: OnceLock::new(),
        }
    }

    /// Attach the event-loop wake handle. Later attachments are ignored.
    pub fn attach(&self, ping: Ping) {
        let _ = self.ping.set(ping);
    }

    /// Request a frame. Safe to call from any thread; redundant requests
    /// coalesce and only the first one pings the event loop.
    pub fn post_invalidate_event(&self) {
        let was_requested = self.requested.swap(true, Ordering::Relaxed);
        if !was_requested {
            if let Some(ping) = self.ping.get() {
                ping.ping();
            }
        } else {
            log::trace!("invalidate event coalesced");
        }
    }

    /// Check whether a frame was requested, clearing the latch.
    pub fn take_frame_request(&self) -> bool {
        self.requested.swap(false, Ordering::Relaxed)
    }
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new()
    }
}

static SCHEDULER: FrameScheduler = FrameScheduler::new();

/// Initialize the process-wide wake mechanism (called once at startup).
pub fn init_wakeup(ping: Ping) {
    SCHEDULER.attach(ping);
}

/// Request a frame on the process-wide scheduler. May be called from any
/// thread; at most one pending wake is kept.
pub fn post_invalidate_event() {
    SCHEDULER.post_invalidate_event();
}

/// Check and clear the process-wide frame request.
pub fn take_frame_request() -> bool {
    SCHEDULER.take_frame_request()
}
