use crate::canvas::Canvas;
use crate::dirty::DirtyArea;
use crate::frame::RelayoutAffects;
use crate::geometry::{Rect, Size};
use crate::hit_test::HitTestResult;
use crate::tree::{Tree, WidgetId};
use crate::widgets::MouseRegion;

/// Scroll capability exposed by scrollable containers.
///
/// A scrollable translates its content by the scroll offset before painting
/// and hit-testing children. The offset grows as the content scrolls away
/// from the origin (scrolling down increases the vertical offset).
pub trait Scrollable {
    fn scroll_offset(&self) -> (f32, f32);

    /// When true, hit testing treats the children as if unscrolled. Used by
    /// containers whose scroll offset only affects painting (e.g. parallax
    /// backdrops).
    fn ignore_scroll_for_hit_test(&self) -> bool {
        false
    }
}

/// A node in the widget tree.
///
/// Implementations own their visual state; position, size, mount state, and
/// the parent/child links live in the [`Tree`]. The pipeline invokes these
/// operations and never holds on to a widget beyond one dispatch.
pub trait Widget {
    /// Compute this widget's size and position its children.
    ///
    /// Must call [`Tree::set_size`] for `id` before returning, and must be
    /// idempotent for identical inputs: the frame pass re-invokes `layout`
    /// with the cached available size on every relayout request.
    fn layout(&mut self, tree: &mut Tree, id: WidgetId, avail: Size);

    /// Draw this widget onto `canvas`, origin at the widget's top-left.
    ///
    /// `dirty` narrows the work: containers pass it through
    /// [`Tree::paint_children`] so untouched children are skipped.
    fn paint(&self, tree: &Tree, id: WidgetId, canvas: &mut dyn Canvas, dirty: Option<&DirtyArea>);

    /// Recursive hit-test descent. `x`/`y` are in this widget's local space.
    ///
    /// Returns true when an opaque pointer region was hit in this subtree,
    /// which stops the caller from testing siblings underneath.
    fn hit_test(
        &self,
        tree: &Tree,
        id: WidgetId,
        x: f32,
        y: f32,
        result: &mut HitTestResult,
    ) -> bool {
        if !tree.contains_local(id, x, y) {
            return false;
        }
        let mut blocked = result.add(tree, id);
        let (sx, sy) = tree.hit_test_scroll_offset(id);
        // Later siblings overlay earlier ones: test topmost first.
        for &child in tree.children_of(id).iter().rev() {
            let child_bounds = tree.bounds(child);
            let cx = x - child_bounds.x + sx;
            let cy = y - child_bounds.y + sy;
            if tree.hit_test_widget(child, cx, cy, result) {
                blocked = true;
                break;
            }
        }
        blocked
    }

    /// Replay this widget's pre-paint canvas setup.
    ///
    /// The repaint walk calls this in two phases: a clip pass (`only_transform`
    /// = false) descending root-to-target, with the target itself receiving
    /// the dirty rect to clip to, and a transform-only pass descending
    /// root-to-opaque-ancestor before painting starts.
    fn before_paint(
        &self,
        tree: &Tree,
        id: WidgetId,
        canvas: &mut dyn Canvas,
        only_transform: bool,
        dirty_rect: Option<Rect>,
    ) {
        let (ox, oy) = tree.paint_offset(id);
        canvas.translate(ox, oy);
        if only_transform {
            return;
        }
        if self.clips_children() {
            canvas.clip_rect(Rect::from_size(tree.bounds(id).size()));
        }
        if let Some(rect) = dirty_rect {
            canvas.clip_rect(rect);
        }
    }

    /// Whether this widget fully covers its bounds when painted. Repainting a
    /// descendant must restart at the nearest opaque ancestor for correct
    /// compositing.
    fn is_opaque(&self) -> bool {
        false
    }

    /// Whether painting of children is clipped to this widget's bounds.
    fn clips_children(&self) -> bool {
        false
    }

    /// Pointer-interest capability. Widgets with a region participate in the
    /// hit-test path and receive hover/pointer notifications.
    fn mouse_region(&self) -> Option<&MouseRegion> {
        None
    }

    /// Scroll capability.
    fn scrollable(&self) -> Option<&dyn Scrollable> {
        None
    }

    /// Called when `child` changed size during an incremental relayout.
    ///
    /// A container that positions children sequentially should re-run its own
    /// placement and widen `affects` to itself (capturing its old bounds
    /// first) so the repaint covers every moved sibling.
    fn child_size_changed(
        &mut self,
        tree: &mut Tree,
        id: WidgetId,
        child: WidgetId,
        affects: &mut RelayoutAffects,
    ) {
        let _ = (tree, id, child, affects);
    }
}
