//! trellis — an incremental retained-mode UI rendering pipeline.
//!
//! A tree of positioned widgets is laid out, painted, and hit-tested
//! incrementally as state changes, without redoing full-tree work:
//!
//! - the **invalidation queue** ([`invalidation::InvalidQueue`]) collects the
//!   frame's pending layout/paint requests, merging duplicates, discarding
//!   requests subsumed by queued ancestors, and ordering entries so paint
//!   order stays correct;
//! - the **frame render pass** ([`surface::Surface::render_frame`]) turns the
//!   queue into minimal relayouts (dirty rectangle = union of old and new
//!   bounds) and minimal repaints (restarting at the nearest opaque ancestor,
//!   clipped to the dirty rectangle);
//! - the **hit-test path engine** ([`hit_test::HitTestResult`]) tracks the
//!   pointer's current widget path with accumulated window→local transforms,
//!   diffing consecutive paths for minimal hover enter/exit notifications and
//!   bubbling pointer events deepest-first.
//!
//! Widgets are stored in an arena ([`tree::Tree`]) under generational ids;
//! the pipeline references them while mounted and never owns their lifetime
//! decisions. Everything runs on one UI thread; other threads re-enter
//! through the coalesced wake signal in [`scheduler`].
//!
//! ```ignore
//! let mut surface = Surface::new();
//! let root = surface.tree_mut().register(Box::new(my_root_widget));
//! surface.mount(root);
//! surface.tree_mut().layout_widget(root, Size::new(800.0, 600.0));
//!
//! // A state change somewhere:
//! surface.invalidate(button_id, InvalidAction::Repaint, None);
//!
//! // Host event loop, once per wake signal:
//! if take_frame_request() {
//!     surface.render_frame(&mut canvas);
//! }
//! ```

pub mod canvas;
pub mod cursor;
pub mod dirty;
pub mod frame;
pub mod geometry;
pub mod invalidation;
pub mod pointer;
pub mod scheduler;
pub mod surface;
pub mod tree;
pub mod widgets;

pub mod prelude {
    pub use crate::canvas::{Canvas, Color, RecordingCanvas};
    pub use crate::cursor::CursorIcon;
    pub use crate::dirty::{ChildPaint, DirtyArea};
    pub use crate::frame::RelayoutAffects;
    pub use crate::geometry::{Point, Rect, Size, Transform};
    pub use crate::hit_test::{HitTestEntry, HitTestResult};
    pub use crate::invalidation::{InvalidAction, InvalidQueue};
    pub use crate::pointer::{PointerButton, PointerButtons, PointerEvent, PointerRouter};
    pub use crate::scheduler::{init_wakeup, post_invalidate_event, take_frame_request};
    pub use crate::surface::Surface;
    pub use crate::tree::{Tree, WidgetId};
    pub use crate::widgets::{MouseRegion, Scrollable, Widget};
}
