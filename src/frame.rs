//! The frame render pass: minimal relayout and minimal repaint.
//!
//! A relayout re-runs one widget's layout with its cached available size and
//! derives the dirty rectangle from the union of old and new bounds. A repaint
//! walks up to the nearest opaque ancestor (painting must restart there for
//! correct compositing), replays the ancestors' clip/transform setup, and
//! paints downward passing the dirty area so intermediate containers only
//! repaint the affected child.

use crate::canvas::Canvas;
use crate::dirty::DirtyArea;
use crate::geometry::Rect;
use crate::tree::{Tree, WidgetId};

/// Transient record of the widget a relayout affects and its pre-layout
/// bounds. Lives only for the duration of one relayout operation.
#[derive(Debug, Clone, Copy)]
pub struct RelayoutAffects {
    pub id: WidgetId,
    pub old: Rect,
}

impl RelayoutAffects {
    /// Move the affected record up to `id` (a container re-placing its
    /// children), with the container's bounds captured before the re-place.
    pub fn reassign(&mut self, id: WidgetId, old_bounds: Rect) {
        self.id = id;
        self.old = old_bounds;
    }

    /// The union of old and new bounds, translated into the parent's
    /// scroll-adjusted coordinate space. This is the region the parent must
    /// repaint after the relayout.
    pub fn dirty_area(&self, tree: &Tree) -> Rect {
        let new = tree.bounds(self.id);
        let union = self.old.union(&new);
        let (sx, sy) = tree
            .parent_of(self.id)
            .and_then(|p| tree.scroll_offset(p))
            .unwrap_or((0.0, 0.0));
        union.translate(-sx, -sy)
    }
}

/// Re-layout one widget with its cached available size.
///
/// The affected record starts at the widget itself (a relayout may end up
/// changing nothing, and the repaint must still cover the old bounds). When
/// the size changed, the parent gets a chance to re-place siblings and widen
/// the record to itself.
pub(crate) fn relayout_widget(tree: &mut Tree, id: WidgetId) -> RelayoutAffects {
    let old = tree.bounds(id);
    let mut affects = RelayoutAffects { id, old };

    let avail = tree.cached_available(id).unwrap_or_else(|| old.size());
    tree.layout_widget(id, avail);

    let new = tree.bounds(id);
    if new.width != old.width || new.height != old.height {
        if let Some(parent) = tree.parent_of(id) {
            tree.child_size_changed(parent, id, &mut affects);
        }
    }
    affects
}

/// Repaint `id` clipped to `area` (`None` = the widget's full bounds).
///
/// Two passes over the root→widget path: a clip pass establishing the dirty
/// clip in window space (the target clips to the dirty rect; empty clip skips
/// the repaint for this frame), and a transform pass that restarts at the
/// root and paints downward from the nearest opaque ancestor.
pub(crate) fn repaint_widget(
    tree: &Tree,
    canvas: &mut dyn Canvas,
    id: WidgetId,
    area: Option<Rect>,
) {
    // Walk to the root, remembering the first opaque widget on the way up.
    let mut path = Vec::new();
    let mut opaque: Option<WidgetId> = None;
    let mut cur = id;
    loop {
        path.push(cur);
        if opaque.is_none() && tree.is_opaque(cur) {
            opaque = Some(cur);
        }
        match tree.parent_of(cur) {
            Some(parent) if tree.contains(parent) => cur = parent,
            _ => break,
        }
    }
    let root = *path.last().expect("path contains at least the target");
    let opaque = opaque.unwrap_or(root);
    log::debug!(
        "repaint from {:?} to {:?} dirty={:?}",
        opaque.as_u64(),
        id.as_u64(),
        area
    );

    let save = canvas.save();

    // Clip pass: root down to the target; the target clips to its dirty rect.
    for (i, &wid) in path.iter().enumerate().rev() {
        if i == 0 {
            let bounds = tree.bounds(wid);
            let dirty_rect = area.unwrap_or(Rect::from_size(bounds.size()));
            tree.before_paint(wid, canvas, false, Some(dirty_rect));
            if canvas.is_clip_empty() {
                log::debug!("repaint clip is empty, skipping {:?}", id.as_u64());
                canvas.restore_to_count(save);
                return;
            }
        } else {
            tree.before_paint(wid, canvas, false, None);
        }
    }

    // Transform pass: restart at the root and paint from the opaque ancestor.
    canvas.reset_transform();
    for &wid in path.iter().rev() {
        tree.before_paint(wid, canvas, true, None);
        if wid == opaque {
            let dirty = if opaque == id {
                area.map(DirtyArea::Region)
            } else {
                Some(DirtyArea::DescendTo { target: id, area })
            };
            tree.paint_widget(wid, canvas, dirty.as_ref());
            break;
        }
    }

    canvas.restore_to_count(save);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{Color, RecordingCanvas};
    use crate::geometry::Size;
    use crate::widgets::Widget;

    use std::cell::Cell;
    use std::rc::Rc;

    /// A solid box that paints its bounds and forwards to its children. The
    /// size lives in a shared cell so tests can change it and relayout.
    struct Panel {
        color: Color,
        opaque: bool,
        clips: bool,
        size: Rc<Cell<Size>>,
    }

    impl Panel {
        fn new(color: Color, size: Size) -> Self {
            Self {
                color,
                opaque: false,
                clips: false,
                size: Rc::new(Cell::new(size)),
            }
        }

        fn opaque(mut self) -> Self {
            self.opaque = true;
            self
        }

        fn clipping(mut self) -> Self {
            self.clips = true;
            self
        }

        fn size_handle(&self) -> Rc<Cell<Size>> {
            self.size.clone()
        }
    }

    impl Widget for Panel {
        fn layout(&mut self, tree: &mut Tree, id: WidgetId, _avail: Size) {
            tree.set_size(id, self.size.get());
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
            canvas.fill_rect(Rect::from_size(tree.bounds(id).size()), self.color);
            tree.paint_children(id, canvas, dirty);
        }

        fn is_opaque(&self) -> bool {
            self.opaque
        }

        fn clips_children(&self) -> bool {
            self.clips
        }
    }

    const ROOT_COLOR: Color = Color::from_hex(0x111111);
    const MID_COLOR: Color = Color::from_hex(0x222222);
    const LEAF_COLOR: Color = Color::from_hex(0x333333);

    fn three_level_tree(mid_opaque: bool) -> (Tree, WidgetId, WidgetId, WidgetId) {
        let mut tree = Tree::new();
        let root = tree.register(Box::new(
            Panel::new(ROOT_COLOR, Size::new(200.0, 200.0))
                .opaque()
                .clipping(),
        ));
        let mid = if mid_opaque {
            tree.register(Box::new(
                Panel::new(MID_COLOR, Size::new(100.0, 100.0)).opaque(),
            ))
        } else {
            tree.register(Box::new(Panel::new(MID_COLOR, Size::new(100.0, 100.0))))
        };
        let leaf = tree.register(Box::new(Panel::new(LEAF_COLOR, Size::new(50.0, 50.0))));
        tree.set_parent(mid, root);
        tree.set_parent(leaf, mid);
        tree.mount_root(root);
        tree.layout_widget(root, Size::new(200.0, 200.0));
        tree.set_origin(mid, 20.0, 20.0);
        tree.set_origin(leaf, 10.0, 10.0);
        (tree, root, mid, leaf)
    }

    #[test]
    fn test_repaint_restarts_at_opaque_ancestor() {
        let (tree, _root, _mid, leaf) = three_level_tree(true);
        let mut canvas = RecordingCanvas::new();
        repaint_widget(&tree, &mut canvas, leaf, None);

        // The opaque mid panel paints first, then the leaf. The root is not
        // repainted: compositing restarts at the nearest opaque ancestor.
        let colors: Vec<Color> = canvas.fills().iter().map(|f| f.color).collect();
        assert_eq!(colors, vec![MID_COLOR, LEAF_COLOR]);
    }

    #[test]
    fn test_repaint_falls_back_to_root_without_opaque_ancestor() {
        let (tree, _root, _mid, leaf) = three_level_tree(false);
        let mut canvas = RecordingCanvas::new();
        repaint_widget(&tree, &mut canvas, leaf, None);

        let colors: Vec<Color> = canvas.fills().iter().map(|f| f.color).collect();
        assert_eq!(colors, vec![ROOT_COLOR, MID_COLOR, LEAF_COLOR]);
    }

    #[test]
    fn test_repaint_clips_to_target_bounds() {
        let (tree, _root, _mid, leaf) = three_level_tree(true);
        let mut canvas = RecordingCanvas::new();
        repaint_widget(&tree, &mut canvas, leaf, None);

        // Leaf sits at window (30, 30) and the clip covers exactly its bounds.
        let leaf_fill = canvas
            .fills()
            .iter()
            .find(|f| f.color == LEAF_COLOR)
            .unwrap();
        assert_eq!(leaf_fill.rect, Rect::new(30.0, 30.0, 50.0, 50.0));
        assert_eq!(leaf_fill.clip, Some(Rect::new(30.0, 30.0, 50.0, 50.0)));
    }

    #[test]
    fn test_degenerate_clip_skips_repaint() {
        let (tree, _root, _mid, leaf) = three_level_tree(true);
        let mut canvas = RecordingCanvas::new();
        // A dirty rect entirely outside the leaf produces an empty clip.
        repaint_widget(
            &tree,
            &mut canvas,
            leaf,
            Some(Rect::new(500.0, 500.0, 10.0, 10.0)),
        );
        assert!(canvas.fills().is_empty());
    }

    #[test]
    fn test_relayout_affects_unions_old_and_new_bounds() {
        let mut tree = Tree::new();
        let root = tree.register(Box::new(
            Panel::new(ROOT_COLOR, Size::new(100.0, 100.0)).opaque(),
        ));
        let child_panel = Panel::new(MID_COLOR, Size::new(10.0, 10.0));
        let child_size = child_panel.size_handle();
        let child = tree.register(Box::new(child_panel));
        tree.set_parent(child, root);
        tree.mount_root(root);
        tree.layout_widget(root, Size::new(100.0, 100.0));

        // Grow the child from 10x10 to 20x5: the dirty union covers 20x10.
        child_size.set(Size::new(20.0, 5.0));
        let affects = relayout_widget(&mut tree, child);
        assert_eq!(affects.dirty_area(&tree), Rect::new(0.0, 0.0, 20.0, 10.0));
    }
}
