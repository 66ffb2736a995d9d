//! The invalidation queue: per-surface collection of pending layout/paint
//! requests, merged and ordered so one frame does the minimum work.
//!
//! Invariants maintained on insert:
//!
//! - at most one live entry per widget (same-widget requests merge in place,
//!   `Relayout` dominating `Repaint` and dirty areas merging by union);
//! - a request subsumed by a queued ancestor is discarded, except for the
//!   ancestor-repaint/descendant-relayout case where both are kept and the
//!   descendant is flagged relayout-only;
//! - entries are ordered by ascending tree depth, and within a contiguous
//!   same-depth run siblings keep their declaration order so later siblings
//!   repaint after (over) earlier ones.

use std::thread::{self, ThreadId};

use crate::canvas::Canvas;
use crate::dirty::merge_areas;
use crate::frame::{relayout_widget, repaint_widget};
use crate::geometry::Rect;
use crate::tree::{Tree, WidgetId};

/// What a pending invalidation asks for. `Relayout` dominates `Repaint` when
/// requests for the same widget merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum InvalidAction {
    Repaint,
    Relayout,
}

#[derive(Debug)]
struct InvalidEntry {
    id: WidgetId,
    action: InvalidAction,
    /// Tree depth at insert time; the queue drains shallow-first.
    level: usize,
    /// Set when a queued ancestor repaint already covers this widget's visual:
    /// the relayout runs but skips the parent repaint it would normally queue.
    relayout_only: bool,
    /// Dirty area for repaints; `None` = whole widget.
    area: Option<Rect>,
}

/// Pending invalidation requests for one rendering surface.
///
/// Owned by the UI thread: `add` asserts it runs on the thread the queue was
/// created on. Requests from other threads must instead post a wake signal
/// ([`crate::scheduler::post_invalidate_event`]) and re-issue on the UI thread.
pub struct InvalidQueue {
    entries: Vec<InvalidEntry>,
    owner: ThreadId,
}

impl InvalidQueue {
    pub fn new() -> Self {
        Self {
            entries: Vec::with_capacity(32),
            owner: thread::current().id(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Queue an invalidation for `id`.
    ///
    /// Returns false (and does nothing) when the widget is not mounted — a
    /// request racing a tree mutation is expected and benign.
    pub fn add(
        &mut self,
        tree: &Tree,
        id: WidgetId,
        action: InvalidAction,
        area: Option<Rect>,
    ) -> bool {
        debug_assert_eq!(
            thread::current().id(),
            self.owner,
            "InvalidQueue::add called off the UI thread"
        );
        if !tree.is_mounted(id) {
            return false;
        }

        let level = tree.depth(id);
        let mut insert_pos = 0usize;
        let mut merged = false;
        let mut relayout_only = false;

        for entry in self.entries.iter_mut() {
            if entry.level > level {
                break;
            }

            if entry.id == id {
                if entry.action < action {
                    entry.action = action;
                }
                if entry.action == InvalidAction::Repaint && action == InvalidAction::Repaint {
                    entry.area = merge_areas(entry.area, area);
                }
                merged = true;
                break;
            }

            if tree.is_ancestor_of(entry.id, id) {
                if entry.action == InvalidAction::Relayout
                    || (entry.action == InvalidAction::Repaint
                        && action == InvalidAction::Repaint)
                {
                    // Already covered by the queued ancestor.
                    merged = true;
                    break;
                }
                // Ancestor repaint, descendant relayout: keep both. The
                // ancestor goes whole-area and the relayout skips its own
                // parent repaint, which the ancestor repaint already covers.
                relayout_only = true;
                entry.area = None;
            }

            insert_pos += 1;
        }

        if merged {
            return true;
        }

        // Within a contiguous same-level run, keep siblings in declaration
        // order: a later sibling repaints after an earlier one.
        if let Some(parent) = tree.parent_of(id) {
            if let Some(cur_index) = tree.child_index(parent, id) {
                let mut i = insert_pos;
                while i > 0 {
                    i -= 1;
                    let exist = &self.entries[i];
                    if exist.level < level {
                        break;
                    }
                    if tree.parent_of(exist.id) != Some(parent) {
                        continue;
                    }
                    let exist_index = tree.child_index(parent, exist.id).unwrap_or(usize::MAX);
                    if cur_index > exist_index {
                        break;
                    }
                    insert_pos = i;
                }
            }
        }

        self.entries.insert(
            insert_pos,
            InvalidEntry {
                id,
                action,
                level,
                relayout_only,
                area,
            },
        );
        true
    }

    /// Drain the queue for one frame: relayouts with dirty-union repaints,
    /// then plain repaints, in queue order.
    ///
    /// Returns whether any relayout ran — the caller must then schedule a
    /// fresh hit test, since geometry changes may invalidate the current
    /// hit-test path. Entries are taken out first, so `add` calls arising
    /// mid-frame accumulate for the next wake instead of extending this one.
    pub fn render_frame(&mut self, tree: &mut Tree, canvas: &mut dyn Canvas) -> bool {
        let entries = std::mem::take(&mut self.entries);
        let mut has_relayout = false;

        for entry in &entries {
            // May have been unmounted after queuing; skip silently.
            if !tree.is_mounted(entry.id) {
                continue;
            }

            match entry.action {
                InvalidAction::Relayout => {
                    has_relayout = true;
                    let affects = relayout_widget(tree, entry.id);
                    if !entry.relayout_only {
                        // Repaint the affected widget's parent (the relayout
                        // may have moved/resized it within the parent), or the
                        // widget itself when it is the root.
                        let target = tree.parent_of(affects.id).unwrap_or(affects.id);
                        let dirty = affects.dirty_area(tree);
                        repaint_widget(tree, canvas, target, Some(dirty));
                    }
                }
                InvalidAction::Repaint => {
                    repaint_widget(tree, canvas, entry.id, entry.area);
                }
            }
        }

        has_relayout
    }

    /// Overlay-surface drain: relayout every entry, never repaint.
    ///
    /// Queuing a `Repaint` on an overlay surface is a contract violation (the
    /// overlay is always repainted in full after its relayouts), so finding
    /// one here is fatal.
    pub fn relayout_all(&mut self, tree: &mut Tree) {
        let entries = std::mem::take(&mut self.entries);
        for entry in &entries {
            assert!(
                entry.action == InvalidAction::Relayout,
                "repaint request queued on a relayout-only surface"
            );
            if !tree.is_mounted(entry.id) {
                continue;
            }
            relayout_widget(tree, entry.id);
        }
    }

    #[cfg(test)]
    fn entry_ids(&self) -> Vec<WidgetId> {
        self.entries.iter().map(|e| e.id).collect()
    }
}

impl Default for InvalidQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::RecordingCanvas;
    use crate::dirty::DirtyArea;
    use crate::geometry::Size;
    use crate::widgets::Widget;

    struct Block {
        size: Size,
    }

    impl Block {
        fn new(width: f32, height: f32) -> Box<Self> {
            Box::new(Self {
                size: Size::new(width, height),
            })
        }
    }

    impl Widget for Block {
        fn layout(&mut self, tree: &mut Tree, id: WidgetId, _avail: Size) {
            tree.set_size(id, self.size);
            for &child in &tree.children_of(id) {
                let child_avail = tree.bounds(child).size();
                tree.layout_widget(child, child_avail);
            }
        }
        fn paint(
            &self,
            tree: &Tree,
            id: WidgetId,
            canvas: &mut dyn Canvas,
            dirty: Option<&DirtyArea>,
        ) {
            canvas.fill_rect(
                Rect::from_size(tree.bounds(id).size()),
                crate::canvas::Color::WHITE,
            );
            tree.paint_children(id, canvas, dirty);
        }
    }

    /// root -> (branch_a -> leaf_a), (branch_b)
    struct Fixture {
        tree: Tree,
        root: WidgetId,
        branch_a: WidgetId,
        branch_b: WidgetId,
        leaf_a: WidgetId,
    }

    fn fixture() -> Fixture {
        let mut tree = Tree::new();
        let root = tree.register(Block::new(200.0, 200.0));
        let branch_a = tree.register(Block::new(80.0, 80.0));
        let branch_b = tree.register(Block::new(80.0, 80.0));
        let leaf_a = tree.register(Block::new(40.0, 40.0));
        tree.set_parent(branch_a, root);
        tree.set_parent(branch_b, root);
        tree.set_parent(leaf_a, branch_a);
        tree.mount_root(root);
        tree.layout_widget(root, Size::new(200.0, 200.0));
        tree.set_origin(branch_b, 100.0, 0.0);
        Fixture {
            tree,
            root,
            branch_a,
            branch_b,
            leaf_a,
        }
    }

    #[test]
    fn test_add_unmounted_widget_is_noop() {
        let f = fixture();
        let mut tree = f.tree;
        let orphan = tree.register(Block::new(10.0, 10.0));
        let mut queue = InvalidQueue::new();
        assert!(!queue.add(&tree, orphan, InvalidAction::Repaint, None));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_merge_idempotence() {
        let f = fixture();
        let mut queue = InvalidQueue::new();
        assert!(queue.add(&f.tree, f.branch_a, InvalidAction::Repaint, None));
        assert!(queue.add(&f.tree, f.branch_a, InvalidAction::Repaint, None));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_merge_raises_action_to_relayout() {
        let f = fixture();
        let mut queue = InvalidQueue::new();
        queue.add(&f.tree, f.branch_a, InvalidAction::Repaint, None);
        queue.add(&f.tree, f.branch_a, InvalidAction::Relayout, None);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.entries[0].action, InvalidAction::Relayout);
    }

    #[test]
    fn test_merge_unions_repaint_areas() {
        let f = fixture();
        let mut queue = InvalidQueue::new();
        queue.add(
            &f.tree,
            f.branch_a,
            InvalidAction::Repaint,
            Some(Rect::new(0.0, 0.0, 10.0, 10.0)),
        );
        queue.add(
            &f.tree,
            f.branch_a,
            InvalidAction::Repaint,
            Some(Rect::new(20.0, 0.0, 10.0, 10.0)),
        );
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.entries[0].area, Some(Rect::new(0.0, 0.0, 30.0, 10.0)));
    }

    #[test]
    fn test_merge_whole_widget_absorbs_area() {
        let f = fixture();
        let mut queue = InvalidQueue::new();
        queue.add(
            &f.tree,
            f.branch_a,
            InvalidAction::Repaint,
            Some(Rect::new(0.0, 0.0, 10.0, 10.0)),
        );
        queue.add(&f.tree, f.branch_a, InvalidAction::Repaint, None);
        assert_eq!(queue.entries[0].area, None);
    }

    #[test]
    fn test_ancestor_relayout_subsumes_descendant() {
        let f = fixture();
        let mut queue = InvalidQueue::new();
        queue.add(&f.tree, f.branch_a, InvalidAction::Relayout, None);
        queue.add(&f.tree, f.leaf_a, InvalidAction::Repaint, None);
        assert_eq!(queue.entry_ids(), vec![f.branch_a]);
    }

    #[test]
    fn test_ancestor_repaint_subsumes_descendant_repaint() {
        let f = fixture();
        let mut queue = InvalidQueue::new();
        queue.add(&f.tree, f.branch_a, InvalidAction::Repaint, None);
        queue.add(&f.tree, f.leaf_a, InvalidAction::Repaint, None);
        assert_eq!(queue.entry_ids(), vec![f.branch_a]);
    }

    #[test]
    fn test_ancestor_repaint_descendant_relayout_keeps_both() {
        let f = fixture();
        let mut queue = InvalidQueue::new();
        queue.add(
            &f.tree,
            f.branch_a,
            InvalidAction::Repaint,
            Some(Rect::new(0.0, 0.0, 5.0, 5.0)),
        );
        queue.add(&f.tree, f.leaf_a, InvalidAction::Relayout, None);

        assert_eq!(queue.entry_ids(), vec![f.branch_a, f.leaf_a]);
        // Ancestor widened to whole-area; descendant flagged relayout-only.
        assert_eq!(queue.entries[0].area, None);
        assert!(queue.entries[1].relayout_only);
        assert!(!queue.entries[0].relayout_only);
    }

    #[test]
    fn test_entries_ordered_by_depth() {
        let f = fixture();
        let mut queue = InvalidQueue::new();
        queue.add(&f.tree, f.leaf_a, InvalidAction::Repaint, None);
        queue.add(&f.tree, f.branch_b, InvalidAction::Repaint, None);
        assert_eq!(queue.entry_ids(), vec![f.branch_b, f.leaf_a]);

        // Subsumption only looks at queued ancestors of the incoming request:
        // an ancestor arriving after its descendant keeps both entries, with
        // the shallower one ordered (and so processed) first.
        let mut queue = InvalidQueue::new();
        queue.add(&f.tree, f.leaf_a, InvalidAction::Repaint, None);
        queue.add(&f.tree, f.root, InvalidAction::Repaint, None);
        assert_eq!(queue.entry_ids(), vec![f.root, f.leaf_a]);
    }

    #[test]
    fn test_siblings_keep_declaration_order() {
        let f = fixture();

        // Queued in declaration order: stays put.
        let mut queue = InvalidQueue::new();
        queue.add(&f.tree, f.branch_a, InvalidAction::Repaint, None);
        queue.add(&f.tree, f.branch_b, InvalidAction::Repaint, None);
        assert_eq!(queue.entry_ids(), vec![f.branch_a, f.branch_b]);

        // Queued in reverse: the earlier sibling is re-ordered in front so it
        // paints first (the later sibling visually overlays it).
        let mut queue = InvalidQueue::new();
        queue.add(&f.tree, f.branch_b, InvalidAction::Repaint, None);
        queue.add(&f.tree, f.branch_a, InvalidAction::Repaint, None);
        assert_eq!(queue.entry_ids(), vec![f.branch_a, f.branch_b]);
    }

    #[test]
    fn test_relayout_only_skips_parent_repaint() {
        // Baseline: the ancestor repaint alone.
        let f = fixture();
        let mut tree = f.tree;
        let mut queue = InvalidQueue::new();
        queue.add(&tree, f.branch_a, InvalidAction::Repaint, None);
        let mut canvas = RecordingCanvas::new();
        queue.render_frame(&mut tree, &mut canvas);
        let baseline = canvas.fills().len();
        assert!(baseline > 0);

        // Ancestor repaint + descendant relayout: the relayout is flagged
        // relayout-only and adds no second repaint pass.
        let f = fixture();
        let mut tree = f.tree;
        let mut queue = InvalidQueue::new();
        queue.add(&tree, f.branch_a, InvalidAction::Repaint, None);
        queue.add(&tree, f.leaf_a, InvalidAction::Relayout, None);
        let mut canvas = RecordingCanvas::new();
        assert!(queue.render_frame(&mut tree, &mut canvas));
        assert_eq!(canvas.fills().len(), baseline);

        // Control: the same relayout alone does repaint the parent.
        let f = fixture();
        let mut tree = f.tree;
        let mut queue = InvalidQueue::new();
        queue.add(&tree, f.leaf_a, InvalidAction::Relayout, None);
        let mut canvas = RecordingCanvas::new();
        queue.render_frame(&mut tree, &mut canvas);
        assert!(!canvas.fills().is_empty());
    }

    #[test]
    fn test_render_frame_drops_unmounted_entries() {
        let f = fixture();
        let mut tree = f.tree;
        let mut queue = InvalidQueue::new();
        queue.add(&tree, f.leaf_a, InvalidAction::Repaint, None);
        tree.unregister(f.branch_a);

        let mut canvas = RecordingCanvas::new();
        let has_relayout = queue.render_frame(&mut tree, &mut canvas);
        assert!(!has_relayout);
        assert!(canvas.fills().is_empty());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_render_frame_reports_relayout() {
        let f = fixture();
        let mut tree = f.tree;
        let mut queue = InvalidQueue::new();
        queue.add(&tree, f.branch_a, InvalidAction::Relayout, None);
        let mut canvas = RecordingCanvas::new();
        assert!(queue.render_frame(&mut tree, &mut canvas));

        queue.add(&tree, f.branch_a, InvalidAction::Repaint, None);
        assert!(!queue.render_frame(&mut tree, &mut canvas));
    }

    #[test]
    #[should_panic(expected = "relayout-only surface")]
    fn test_relayout_all_rejects_repaint_entries() {
        let f = fixture();
        let mut tree = f.tree;
        let mut queue = InvalidQueue::new();
        queue.add(&tree, f.branch_a, InvalidAction::Repaint, None);
        queue.relayout_all(&mut tree);
    }

    #[test]
    fn test_relayout_all_relayouts_without_painting() {
        let f = fixture();
        let mut tree = f.tree;
        let mut queue = InvalidQueue::new();
        queue.add(&tree, f.branch_a, InvalidAction::Relayout, None);
        queue.relayout_all(&mut tree);
        assert!(queue.is_empty());
    }
}
