//! Per-surface composition root.
//!
//! A [`Surface`] ties one widget tree to its two invalidation queues (the
//! widgets queue and the relayout-only overlay queue), the pointer router,
//! and the frame pump. It exposes the sole mutation entry point,
//! [`Surface::invalidate`]: widget property setters call it and never touch a
//! queue directly.

use crate::canvas::Canvas;
use crate::frame::repaint_widget;
use crate::geometry::Rect;
use crate::invalidation::{InvalidAction, InvalidQueue};
use crate::pointer::{PointerButton, PointerRouter};
use crate::scheduler;
use crate::tree::{Tree, WidgetId};

/// One rendering surface: tree, queues, and pointer state.
///
/// Owned by the UI thread. The host event loop calls
/// [`Surface::render_frame`] once per wake signal; pointer events flow in
/// through the `pointer_*` methods independently of the frame cycle.
pub struct Surface {
    tree: Tree,
    root: Option<WidgetId>,
    overlay: Option<WidgetId>,
    widgets_queue: InvalidQueue,
    overlay_queue: InvalidQueue,
    router: PointerRouter,
    /// One pending wake at a time; reset when the frame runs.
    woken: bool,
}

impl Surface {
    pub fn new() -> Self {
        Self {
            tree: Tree::new(),
            root: None,
            overlay: None,
            widgets_queue: InvalidQueue::new(),
            overlay_queue: InvalidQueue::new(),
            router: PointerRouter::new(),
            woken: false,
        }
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut Tree {
        &mut self.tree
    }

    pub fn root(&self) -> Option<WidgetId> {
        self.root
    }

    pub fn overlay(&self) -> Option<WidgetId> {
        self.overlay
    }

    /// Mount the main widget tree root.
    pub fn mount(&mut self, root: WidgetId) {
        self.tree.mount_root(root);
        self.root = Some(root);
    }

    /// Mount the overlay root. The overlay shares the tree but drains through
    /// the relayout-only queue and is always repainted in full.
    pub fn mount_overlay(&mut self, overlay: WidgetId) {
        self.tree.mount_root(overlay);
        self.overlay = Some(overlay);
    }

    /// Queue an invalidation for `id` and wake the frame pump.
    ///
    /// Returns false when the widget is not mounted (the request is a no-op).
    /// Requests for widgets under the overlay root go to the overlay queue;
    /// overlay repaints are dropped here — the overlay is repainted in full
    /// every frame it relayouts, so a partial repaint request has nothing to
    /// add.
    pub fn invalidate(
        &mut self,
        id: WidgetId,
        action: InvalidAction,
        area: Option<Rect>,
    ) -> bool {
        if !self.tree.is_mounted(id) {
            return false;
        }

        let root = self.tree.root_of(id);
        if self.overlay.is_some() && root == self.overlay {
            if action == InvalidAction::Relayout {
                self.overlay_queue.add(&self.tree, id, action, area);
            }
        } else {
            self.widgets_queue.add(&self.tree, id, action, area);
        }

        if !self.woken {
            self.woken = true;
            scheduler::post_invalidate_event();
        }
        true
    }

    /// Whether any work is queued for the next frame.
    pub fn has_pending_work(&self) -> bool {
        !self.widgets_queue.is_empty() || !self.overlay_queue.is_empty()
    }

    /// The single synchronous frame callback.
    ///
    /// Drains the widgets queue (relayouts and repaints), relayouts the
    /// overlay queue, repaints the overlay in full when it changed, and runs
    /// a fresh hit test if any relayout moved geometry under the pointer.
    pub fn render_frame(&mut self, canvas: &mut dyn Canvas) {
        self.woken = false;

        let mut has_relayout = false;
        if !self.widgets_queue.is_empty() {
            has_relayout = self.widgets_queue.render_frame(&mut self.tree, canvas);
        }

        if !self.overlay_queue.is_empty() {
            self.overlay_queue.relayout_all(&mut self.tree);
            if let Some(overlay) = self.overlay {
                repaint_widget(&self.tree, canvas, overlay, None);
            }
        }

        canvas.flush();

        if has_relayout {
            if let Some(root) = self.root {
                self.router.run_new_hit_test(&self.tree, root);
            }
        }
    }

    // ---- pointer entry points ----------------------------------------------

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        if let Some(root) = self.root {
            self.router.pointer_move(&self.tree, root, x, y);
        }
    }

    pub fn pointer_down(&mut self, x: f32, y: f32, button: PointerButton) {
        if let Some(root) = self.root {
            self.router.pointer_down(&self.tree, root, x, y, button);
        }
    }

    pub fn pointer_up(&mut self, x: f32, y: f32, button: PointerButton) {
        if let Some(root) = self.root {
            self.router.pointer_up(&self.tree, root, x, y, button);
        }
    }

    pub fn pointer_leave(&mut self) {
        self.router.pointer_leave(&self.tree);
    }

    /// Report a scroll-offset change of `scrollable` so the hit-test path can
    /// shift in place (or rebuild when the pointer left the last-hit widget).
    pub fn scrolled(&mut self, scrollable: WidgetId, dx: f32, dy: f32) -> bool {
        match self.root {
            Some(root) => self
                .router
                .scroll_by(&self.tree, root, scrollable, dx, dy),
            None => true,
        }
    }

    pub fn pointer_router(&self) -> &PointerRouter {
        &self.router
    }
}

impl Default for Surface {
    fn default() -> Self {
        Self::new()
    }
}
