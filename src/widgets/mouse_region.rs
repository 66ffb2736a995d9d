//! Pointer-interest records attached to widgets.

use crate::cursor::{self, CursorIcon};
use crate::pointer::PointerEvent;

type HoverListener = Box<dyn Fn(bool)>;
type PointerListener = Box<dyn Fn(&mut PointerEvent)>;

/// Pointer-interest capability of a widget.
///
/// Widgets holding a `MouseRegion` appear in the hit-test path and receive
/// hover enter/exit notifications and bubbled pointer events. Listeners run
/// during event dispatch while the tree is borrowed, so they must defer tree
/// mutations (typically by recording state and invalidating afterwards).
pub struct MouseRegion {
    opaque: bool,
    cursor: Option<CursorIcon>,
    hover_changed: Vec<HoverListener>,
    pointer_down: Vec<PointerListener>,
    pointer_up: Vec<PointerListener>,
    pointer_move: Vec<PointerListener>,
}

impl MouseRegion {
    /// An opaque region: it blocks hover and pointer events from reaching
    /// widgets visually underneath it. This is the common case for
    /// interactive widgets.
    pub fn new() -> Self {
        Self {
            opaque: true,
            cursor: None,
            hover_changed: Vec::new(),
            pointer_down: Vec::new(),
            pointer_up: Vec::new(),
            pointer_move: Vec::new(),
        }
    }

    /// A translucent region: the pointer also reaches widgets underneath.
    pub fn translucent() -> Self {
        Self {
            opaque: false,
            ..Self::new()
        }
    }

    /// Whether this region blocks hit testing of widgets underneath it.
    pub fn opaque(&self) -> bool {
        self.opaque
    }

    /// Cursor to display while this region is hovered.
    pub fn with_cursor(mut self, cursor: CursorIcon) -> Self {
        self.cursor = Some(cursor);
        self
    }

    pub fn cursor(&self) -> Option<CursorIcon> {
        self.cursor
    }

    pub fn on_hover_changed(mut self, listener: impl Fn(bool) + 'static) -> Self {
        self.hover_changed.push(Box::new(listener));
        self
    }

    pub fn on_pointer_down(mut self, listener: impl Fn(&mut PointerEvent) + 'static) -> Self {
        self.pointer_down.push(Box::new(listener));
        self
    }

    pub fn on_pointer_up(mut self, listener: impl Fn(&mut PointerEvent) + 'static) -> Self {
        self.pointer_up.push(Box::new(listener));
        self
    }

    pub fn on_pointer_move(mut self, listener: impl Fn(&mut PointerEvent) + 'static) -> Self {
        self.pointer_move.push(Box::new(listener));
        self
    }

    /// Fire the hover notification. Entering applies this region's cursor.
    pub fn raise_hover_changed(&self, hovered: bool) {
        if hovered {
            if let Some(c) = self.cursor {
                cursor::set_cursor(c);
            }
        }
        for listener in &self.hover_changed {
            listener(hovered);
        }
    }

    /// Re-apply this region's cursor after a nested region underneath it was
    /// exited.
    pub fn restore_cursor(&self) {
        if let Some(c) = self.cursor {
            cursor::set_cursor(c);
        }
    }

    pub fn raise_pointer_down(&self, event: &mut PointerEvent) {
        Self::raise(&self.pointer_down, event);
    }

    pub fn raise_pointer_up(&self, event: &mut PointerEvent) {
        Self::raise(&self.pointer_up, event);
    }

    pub fn raise_pointer_move(&self, event: &mut PointerEvent) {
        Self::raise(&self.pointer_move, event);
    }

    fn raise(listeners: &[PointerListener], event: &mut PointerEvent) {
        for listener in listeners {
            listener(event);
            if event.is_handled() {
                break;
            }
        }
    }
}

impl Default for MouseRegion {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MouseRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MouseRegion")
            .field("opaque", &self.opaque)
            .field("cursor", &self.cursor)
            .finish_non_exhaustive()
    }
}
