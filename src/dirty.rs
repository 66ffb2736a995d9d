//! Dirty areas: the regions a repaint is limited to.
//!
//! Queue entries carry `Option<Rect>` where `None` means "whole widget"; merges
//! always resolve toward the more conservative value. During the paint descent
//! a richer [`DirtyArea`] is threaded down so intermediate containers can skip
//! children the repaint does not touch.

use crate::geometry::Rect;
use crate::tree::{Tree, WidgetId};

/// Merge two queued dirty areas. `None` means "whole widget" and absorbs any
/// rectangle; two rectangles merge by union.
pub fn merge_areas(a: Option<Rect>, b: Option<Rect>) -> Option<Rect> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.union(&b)),
        _ => None,
    }
}

/// The dirty region handed to [`crate::widgets::Widget::paint`].
///
/// Coordinates are local to the widget being painted.
#[derive(Debug, Clone, PartialEq)]
pub enum DirtyArea {
    /// Repaint everything intersecting this rect.
    Region(Rect),
    /// Only the child chain leading to `target` needs painting; `area` is the
    /// dirty rect in `target`'s local space (`None` = all of it). Produced by
    /// the opaque-ancestor repaint walk.
    DescendTo {
        target: WidgetId,
        area: Option<Rect>,
    },
}

/// What a container should do for one child while painting with a dirty area.
#[derive(Debug, Clone, PartialEq)]
pub enum ChildPaint {
    /// The child is untouched by the dirty region.
    Skip,
    /// Paint the child, optionally narrowed to a child-local dirty area.
    Paint(Option<DirtyArea>),
}

impl DirtyArea {
    /// The dirty rect, when this area is a plain region.
    pub fn rect(&self) -> Option<Rect> {
        match self {
            DirtyArea::Region(rect) => Some(*rect),
            DirtyArea::DescendTo { .. } => None,
        }
    }

    /// Narrow this area to one child of `parent`.
    ///
    /// Accounts for the parent's scroll offset: the child is compared (and the
    /// region translated) at its on-screen position. Unknown combinations
    /// resolve conservatively toward repainting the whole child.
    pub fn for_child(&self, tree: &Tree, parent: WidgetId, child: WidgetId) -> ChildPaint {
        match self {
            DirtyArea::Region(region) => {
                let (sx, sy) = tree.scroll_offset(parent).unwrap_or((0.0, 0.0));
                let visual = tree.bounds(child).translate(-sx, -sy);
                if region.intersects(&visual) {
                    ChildPaint::Paint(Some(DirtyArea::Region(
                        region.translate(-visual.x, -visual.y),
                    )))
                } else {
                    ChildPaint::Skip
                }
            }
            DirtyArea::DescendTo { target, area } => {
                if child == *target {
                    ChildPaint::Paint(area.map(DirtyArea::Region))
                } else if tree.is_ancestor_of(child, *target) {
                    ChildPaint::Paint(Some(self.clone()))
                } else {
                    ChildPaint::Skip
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_none_absorbs() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(merge_areas(None, Some(rect)), None);
        assert_eq!(merge_areas(Some(rect), None), None);
        assert_eq!(merge_areas(None, None), None);
    }

    #[test]
    fn test_merge_unions_rects() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);
        assert_eq!(merge_areas(Some(a), Some(b)), Some(a.union(&b)));
    }

    #[test]
    fn test_merge_idempotent() {
        let a = Rect::new(1.0, 2.0, 3.0, 4.0);
        let once = merge_areas(Some(a), Some(a));
        assert_eq!(once, Some(a));
        assert_eq!(merge_areas(once, Some(a)), once);
    }
}
