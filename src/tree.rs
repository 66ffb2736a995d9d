//! Arena-based widget storage.
//!
//! The tree owns every widget in a sparse-set arena with generational indices:
//! a [`WidgetId`] stays cheap to copy, never extends a widget's lifetime, and
//! a stale id (slot reused after removal) fails validation instead of aliasing
//! a new widget. Parent links are plain ids, so walking to the root is an
//! O(depth) loop without virtual dispatch.
//!
//! The tree also carries the per-widget geometry the pipeline needs between
//! frames: bounds relative to the parent's content space, and the available
//! size from the last layout (re-used when a relayout request comes in).

use std::collections::HashSet;

use crate::canvas::Canvas;
use crate::dirty::{ChildPaint, DirtyArea};
use crate::frame::RelayoutAffects;
use crate::geometry::{Rect, Size};
use crate::hit_test::HitTestResult;
use crate::widgets::Widget;

/// Unique identifier for a widget in the tree.
///
/// Generational index design: `index` is the reusable slot position and
/// `generation` increments on reuse, so ids held across a removal go stale
/// instead of pointing at an unrelated widget.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct WidgetId {
    index: u32,
    generation: u32,
}

impl WidgetId {
    fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Combine into a single u64 (generation in the high bits), for logging
    /// and external keying.
    pub fn as_u64(self) -> u64 {
        ((self.generation as u64) << 32) | (self.index as u64)
    }
}

struct SparseEntry {
    dense_index: usize,
    generation: u32,
}

struct Node {
    widget: Box<dyn Widget>,
    parent: Option<WidgetId>,
    children: Vec<WidgetId>,
    /// Position and size relative to the parent's content space.
    bounds: Rect,
    /// Available size passed to the last `layout` call.
    cached_available: Option<Size>,
    sparse_index: u32,
}

/// Central widget storage plus the tree structure the pipeline operates on.
pub struct Tree {
    dense: Vec<Node>,
    sparse: Vec<Option<SparseEntry>>,
    free_indices: Vec<u32>,
    /// Designated roots; a widget is mounted when its parent chain ends here.
    roots: HashSet<WidgetId>,
}

impl Tree {
    pub fn new() -> Self {
        Self {
            dense: Vec::new(),
            sparse: Vec::new(),
            free_indices: Vec::new(),
            roots: HashSet::new(),
        }
    }

    /// Store a widget and return its id. The widget is not mounted until its
    /// parent chain reaches a root designated via [`Tree::mount_root`].
    pub fn register(&mut self, widget: Box<dyn Widget>) -> WidgetId {
        let (sparse_index, generation) = if let Some(idx) = self.free_indices.pop() {
            let old_gen = self.sparse[idx as usize]
                .as_ref()
                .map(|e| e.generation)
                .unwrap_or(0);
            (idx, old_gen.wrapping_add(1))
        } else {
            let idx = self.sparse.len() as u32;
            self.sparse.push(None);
            (idx, 0)
        };

        let dense_index = self.dense.len();
        let id = WidgetId::new(sparse_index, generation);

        self.dense.push(Node {
            widget,
            parent: None,
            children: Vec::new(),
            bounds: Rect::default(),
            cached_available: None,
            sparse_index,
        });
        self.sparse[sparse_index as usize] = Some(SparseEntry {
            dense_index,
            generation,
        });

        id
    }

    /// Remove a widget and its whole subtree from the tree.
    ///
    /// Ids into the removed subtree go stale; any invalidation entries queued
    /// for them are dropped at the next drain.
    pub fn unregister(&mut self, id: WidgetId) {
        let Some(dense_index) = self.get_dense_index(id) else {
            return;
        };

        if let Some(parent_id) = self.dense[dense_index].parent {
            if let Some(parent_dense) = self.get_dense_index(parent_id) {
                self.dense[parent_dense].children.retain(|&c| c != id);
            }
        }

        let children = self.dense[dense_index].children.clone();
        for child in children {
            self.unregister(child);
        }

        // Recursion may have shuffled the dense array; re-resolve.
        let Some(dense_index) = self.get_dense_index(id) else {
            return;
        };
        let last_dense_index = self.dense.len() - 1;
        let removed = self.dense.swap_remove(dense_index);
        if dense_index != last_dense_index {
            let moved_sparse = self.dense[dense_index].sparse_index;
            if let Some(entry) = self.sparse[moved_sparse as usize].as_mut() {
                entry.dense_index = dense_index;
            }
        }
        self.sparse[id.index as usize] = None;
        self.free_indices.push(id.index);
        self.roots.remove(&id);
        drop(removed);
    }

    fn get_dense_index(&self, id: WidgetId) -> Option<usize> {
        self.sparse
            .get(id.index as usize)
            .and_then(|e| e.as_ref())
            .filter(|e| e.generation == id.generation)
            .map(|e| e.dense_index)
    }

    /// Whether the id is live (registered and not stale).
    pub fn contains(&self, id: WidgetId) -> bool {
        self.get_dense_index(id).is_some()
    }

    pub fn widget_count(&self) -> usize {
        self.dense.len()
    }

    // ---- structure ---------------------------------------------------------

    /// Designate a root. Widgets become mounted when their parent chain
    /// reaches a root.
    pub fn mount_root(&mut self, id: WidgetId) {
        if self.contains(id) {
            self.roots.insert(id);
        }
    }

    /// Attach `child` under `parent`, appending to the parent's ordered
    /// children. Declaration order is paint order: later children overlay
    /// earlier ones.
    pub fn set_parent(&mut self, child_id: WidgetId, parent_id: WidgetId) {
        if let Some(child_dense) = self.get_dense_index(child_id) {
            self.dense[child_dense].parent = Some(parent_id);
        }
        if let Some(parent_dense) = self.get_dense_index(parent_id) {
            let children = &mut self.dense[parent_dense].children;
            if !children.contains(&child_id) {
                children.push(child_id);
            }
        }
    }

    pub fn parent_of(&self, id: WidgetId) -> Option<WidgetId> {
        self.get_dense_index(id).and_then(|idx| self.dense[idx].parent)
    }

    pub fn children_of(&self, id: WidgetId) -> Vec<WidgetId> {
        self.get_dense_index(id)
            .map(|idx| self.dense[idx].children.clone())
            .unwrap_or_default()
    }

    /// Position of `child` in `parent`'s declaration order.
    pub fn child_index(&self, parent: WidgetId, child: WidgetId) -> Option<usize> {
        self.get_dense_index(parent)
            .and_then(|idx| self.dense[idx].children.iter().position(|&c| c == child))
    }

    /// A widget is mounted when it is live and its parent chain reaches a
    /// designated root. Unregistering any ancestor silently unmounts the
    /// subtree.
    pub fn is_mounted(&self, id: WidgetId) -> bool {
        if !self.contains(id) {
            return false;
        }
        let mut cur = id;
        loop {
            match self.parent_of(cur) {
                Some(parent) => {
                    if !self.contains(parent) {
                        return false;
                    }
                    cur = parent;
                }
                None => return self.roots.contains(&cur),
            }
        }
    }

    /// Topmost ancestor of a live widget.
    pub fn root_of(&self, id: WidgetId) -> Option<WidgetId> {
        if !self.contains(id) {
            return None;
        }
        let mut cur = id;
        while let Some(parent) = self.parent_of(cur) {
            if !self.contains(parent) {
                return None;
            }
            cur = parent;
        }
        Some(cur)
    }

    /// Levels between this widget and its root (root = 0).
    pub fn depth(&self, id: WidgetId) -> usize {
        let mut level = 0;
        let mut cur = id;
        while let Some(parent) = self.parent_of(cur) {
            if !self.contains(parent) {
                break;
            }
            level += 1;
            cur = parent;
        }
        level
    }

    /// Strict ancestor test: a widget is not its own ancestor.
    pub fn is_ancestor_of(&self, ancestor: WidgetId, id: WidgetId) -> bool {
        let mut cur = id;
        while let Some(parent) = self.parent_of(cur) {
            if parent == ancestor {
                return true;
            }
            if !self.contains(parent) {
                return false;
            }
            cur = parent;
        }
        false
    }

    // ---- geometry ----------------------------------------------------------

    /// Bounds relative to the parent's content space. Zero for stale ids, so
    /// containment checks on unmounted widgets degrade to "outside".
    pub fn bounds(&self, id: WidgetId) -> Rect {
        self.get_dense_index(id)
            .map(|idx| self.dense[idx].bounds)
            .unwrap_or_default()
    }

    pub fn set_origin(&mut self, id: WidgetId, x: f32, y: f32) {
        if let Some(idx) = self.get_dense_index(id) {
            self.dense[idx].bounds.x = x;
            self.dense[idx].bounds.y = y;
        }
    }

    /// The size-setting primitive every `layout` implementation must call.
    pub fn set_size(&mut self, id: WidgetId, size: Size) {
        if let Some(idx) = self.get_dense_index(id) {
            self.dense[idx].bounds.width = size.width;
            self.dense[idx].bounds.height = size.height;
        }
    }

    pub fn set_bounds(&mut self, id: WidgetId, bounds: Rect) {
        if let Some(idx) = self.get_dense_index(id) {
            self.dense[idx].bounds = bounds;
        }
    }

    /// Available size passed to the last layout call.
    pub fn cached_available(&self, id: WidgetId) -> Option<Size> {
        self.get_dense_index(id)
            .and_then(|idx| self.dense[idx].cached_available)
    }

    /// Whether the point (in this widget's local space) falls within it.
    pub fn contains_local(&self, id: WidgetId, x: f32, y: f32) -> bool {
        let bounds = self.bounds(id);
        x >= 0.0 && x < bounds.width && y >= 0.0 && y < bounds.height
    }

    /// Map a point in this widget's local space to window space, walking up
    /// the parent chain and undoing each scrollable ancestor's offset.
    pub fn local_to_window(&self, id: WidgetId, x: f32, y: f32) -> (f32, f32) {
        let mut wx = x;
        let mut wy = y;
        let mut cur = id;
        loop {
            let bounds = self.bounds(cur);
            wx += bounds.x;
            wy += bounds.y;
            match self.parent_of(cur) {
                Some(parent) if self.contains(parent) => {
                    if let Some((sx, sy)) = self.scroll_offset(parent) {
                        wx -= sx;
                        wy -= sy;
                    }
                    cur = parent;
                }
                _ => break,
            }
        }
        (wx, wy)
    }

    /// The translation applied before painting this widget: its origin,
    /// shifted by the parent's scroll offset.
    pub fn paint_offset(&self, id: WidgetId) -> (f32, f32) {
        let bounds = self.bounds(id);
        let (sx, sy) = self
            .parent_of(id)
            .and_then(|p| self.scroll_offset(p))
            .unwrap_or((0.0, 0.0));
        (bounds.x - sx, bounds.y - sy)
    }

    // ---- widget capability queries -----------------------------------------

    pub fn is_opaque(&self, id: WidgetId) -> bool {
        self.with_widget(id, |w| w.is_opaque()).unwrap_or(false)
    }

    /// The widget's scroll offset, when it is a scrollable container.
    pub fn scroll_offset(&self, id: WidgetId) -> Option<(f32, f32)> {
        self.with_widget(id, |w| w.scrollable().map(|s| s.scroll_offset()))
            .flatten()
    }

    /// Scroll offset as seen by hit testing: zero when the widget is not
    /// scrollable or opts out of scroll-aware hit testing.
    pub fn hit_test_scroll_offset(&self, id: WidgetId) -> (f32, f32) {
        self.with_widget(id, |w| {
            w.scrollable()
                .filter(|s| !s.ignore_scroll_for_hit_test())
                .map(|s| s.scroll_offset())
        })
        .flatten()
        .unwrap_or((0.0, 0.0))
    }

    /// Nearest strict ancestor that is a scrollable container.
    pub fn find_scrollable_ancestor(&self, id: WidgetId) -> Option<WidgetId> {
        let mut cur = self.parent_of(id)?;
        loop {
            if !self.contains(cur) {
                return None;
            }
            if self.scroll_offset(cur).is_some() {
                return Some(cur);
            }
            cur = self.parent_of(cur)?;
        }
    }

    // ---- widget dispatch ---------------------------------------------------

    /// Access a widget via a closure.
    pub fn with_widget<R>(&self, id: WidgetId, f: impl FnOnce(&dyn Widget) -> R) -> Option<R> {
        self.get_dense_index(id).map(|idx| f(&*self.dense[idx].widget))
    }

    /// Mutate a widget via a closure that also receives the tree.
    ///
    /// The widget is temporarily extracted so the closure can hand the tree
    /// back to it (layout recursing into children, for example).
    pub fn with_widget_mut<R>(
        &mut self,
        id: WidgetId,
        f: impl FnOnce(&mut dyn Widget, &mut Tree) -> R,
    ) -> Option<R> {
        let dense_index = self.get_dense_index(id)?;

        struct PlaceholderWidget;
        impl Widget for PlaceholderWidget {
            fn layout(&mut self, _: &mut Tree, _: WidgetId, _: Size) {}
            fn paint(&self, _: &Tree, _: WidgetId, _: &mut dyn Canvas, _: Option<&DirtyArea>) {}
        }

        let mut widget = std::mem::replace(
            &mut self.dense[dense_index].widget,
            Box::new(PlaceholderWidget),
        );
        let result = f(&mut *widget, self);
        if let Some(idx) = self.get_dense_index(id) {
            self.dense[idx].widget = widget;
        }
        Some(result)
    }

    /// Record the available size and run the widget's layout.
    pub fn layout_widget(&mut self, id: WidgetId, avail: Size) {
        let Some(dense_index) = self.get_dense_index(id) else {
            return;
        };
        self.dense[dense_index].cached_available = Some(avail);
        self.with_widget_mut(id, |widget, tree| widget.layout(tree, id, avail));
    }

    pub fn paint_widget(&self, id: WidgetId, canvas: &mut dyn Canvas, dirty: Option<&DirtyArea>) {
        self.with_widget(id, |widget| widget.paint(self, id, canvas, dirty));
    }

    pub fn before_paint(
        &self,
        id: WidgetId,
        canvas: &mut dyn Canvas,
        only_transform: bool,
        dirty_rect: Option<Rect>,
    ) {
        self.with_widget(id, |widget| {
            widget.before_paint(self, id, canvas, only_transform, dirty_rect)
        });
    }

    /// Run the widget's hit-test descent with local coordinates.
    pub fn hit_test_widget(
        &self,
        id: WidgetId,
        x: f32,
        y: f32,
        result: &mut HitTestResult,
    ) -> bool {
        self.with_widget(id, |widget| widget.hit_test(self, id, x, y, result))
            .unwrap_or(false)
    }

    /// Paint this widget's children in declaration order, narrowing the dirty
    /// area per child so untouched subtrees are skipped. Containers call this
    /// from their `paint`.
    pub fn paint_children(&self, id: WidgetId, canvas: &mut dyn Canvas, dirty: Option<&DirtyArea>) {
        for &child in &self.children_of(id) {
            let plan = match dirty {
                None => ChildPaint::Paint(None),
                Some(area) => area.for_child(self, id, child),
            };
            let ChildPaint::Paint(child_area) = plan else {
                continue;
            };
            let save = canvas.save();
            self.before_paint(child, canvas, false, None);
            self.paint_widget(child, canvas, child_area.as_ref());
            canvas.restore_to_count(save);
        }
    }

    pub(crate) fn child_size_changed(
        &mut self,
        parent: WidgetId,
        child: WidgetId,
        affects: &mut RelayoutAffects,
    ) {
        self.with_widget_mut(parent, |widget, tree| {
            widget.child_size_changed(tree, parent, child, affects)
        });
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}
