//! Pointer events and the per-surface pointer router.
//!
//! The router owns the old/new [`HitTestResult`] pair: every pointer-move
//! evaluation builds the new path (cheaply when the pointer stayed inside the
//! last-hit widget), diffs it against the old one for minimal enter/exit
//! notifications, and swaps. Geometry changes re-enter through
//! [`PointerRouter::run_new_hit_test`].

use bitflags::bitflags;

use crate::cursor::{self, CursorIcon};
use crate::hit_test::HitTestResult;
use crate::tree::{Tree, WidgetId};
use crate::widgets::MouseRegion;

bitflags! {
    /// Currently held pointer buttons.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct PointerButtons: u8 {
        const LEFT   = 0b001;
        const RIGHT  = 0b010;
        const MIDDLE = 0b100;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Left,
    Right,
    Middle,
}

impl PointerButton {
    pub fn flag(self) -> PointerButtons {
        match self {
            PointerButton::Left => PointerButtons::LEFT,
            PointerButton::Right => PointerButtons::RIGHT,
            PointerButton::Middle => PointerButtons::MIDDLE,
        }
    }
}

/// A pointer event bubbling along the hit-test path.
///
/// `window_x`/`window_y` stay fixed at the original window coordinates; the
/// propagation rewrites `x`/`y` into each region's local space before its
/// handlers run. A handler marks the event handled to stop the bubble.
#[derive(Debug, Clone)]
pub struct PointerEvent {
    window_x: f32,
    window_y: f32,
    x: f32,
    y: f32,
    button: Option<PointerButton>,
    buttons: PointerButtons,
    delta_x: f32,
    delta_y: f32,
    handled: bool,
}

impl PointerEvent {
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            window_x: x,
            window_y: y,
            x,
            y,
            button: None,
            buttons: PointerButtons::empty(),
            delta_x: 0.0,
            delta_y: 0.0,
            handled: false,
        }
    }

    pub fn with_button(mut self, button: PointerButton) -> Self {
        self.button = Some(button);
        self
    }

    pub fn with_buttons(mut self, buttons: PointerButtons) -> Self {
        self.buttons = buttons;
        self
    }

    pub fn with_delta(mut self, dx: f32, dy: f32) -> Self {
        self.delta_x = dx;
        self.delta_y = dy;
        self
    }

    pub fn window_x(&self) -> f32 {
        self.window_x
    }

    pub fn window_y(&self) -> f32 {
        self.window_y
    }

    /// X in the coordinate space of the region currently being notified.
    pub fn x(&self) -> f32 {
        self.x
    }

    /// Y in the coordinate space of the region currently being notified.
    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn button(&self) -> Option<PointerButton> {
        self.button
    }

    pub fn buttons(&self) -> PointerButtons {
        self.buttons
    }

    pub fn delta(&self) -> (f32, f32) {
        (self.delta_x, self.delta_y)
    }

    /// Rewrite the local coordinates (done by the propagation per entry).
    pub fn set_point(&mut self, x: f32, y: f32) {
        self.x = x;
        self.y = y;
    }

    /// Stop the bubble after the current handler.
    pub fn set_handled(&mut self) {
        self.handled = true;
    }

    pub fn is_handled(&self) -> bool {
        self.handled
    }
}

/// Per-surface pointer state: the current hit-test path, the previous one for
/// diffing, the last pointer position, and held buttons.
pub struct PointerRouter {
    old_result: HitTestResult,
    new_result: HitTestResult,
    last_x: f32,
    last_y: f32,
    buttons: PointerButtons,
}

impl PointerRouter {
    pub fn new() -> Self {
        Self {
            old_result: HitTestResult::new(),
            new_result: HitTestResult::new(),
            last_x: 0.0,
            last_y: 0.0,
            buttons: PointerButtons::empty(),
        }
    }

    /// The path the pointer currently rests on.
    pub fn hit_result(&self) -> &HitTestResult {
        &self.old_result
    }

    pub fn last_position(&self) -> (f32, f32) {
        (self.last_x, self.last_y)
    }

    pub fn buttons(&self) -> PointerButtons {
        self.buttons
    }

    /// Re-evaluate the hit-test path for a pointer at (`x`, `y`) and fire the
    /// enter/exit diff.
    fn update_hit_path(&mut self, tree: &Tree, root: WidgetId, x: f32, y: f32) {
        self.last_x = x;
        self.last_y = y;
        self.new_result.reset();
        if self.old_result.is_hit_any_widget() && self.old_result.still_in_last_region(tree, x, y)
        {
            // Repeated moves inside a known widget skip the full descent.
            self.new_result.copy_from(&self.old_result);
            self.new_result.hit_test_in_last_region(tree, x, y);
        } else {
            tree.hit_test_widget(root, x, y, &mut self.new_result);
        }
        self.compare_and_swap(tree);
    }

    fn compare_and_swap(&mut self, tree: &Tree) {
        self.old_result.exit_old_region(tree, &self.new_result);
        self.new_result.enter_new_region(tree, &self.old_result);
        std::mem::swap(&mut self.old_result, &mut self.new_result);
        self.new_result.reset();
    }

    pub fn pointer_move(&mut self, tree: &Tree, root: WidgetId, x: f32, y: f32) {
        self.update_hit_path(tree, root, x, y);
        let mut event = PointerEvent::at(x, y).with_buttons(self.buttons);
        self.old_result
            .propagate_pointer_event(tree, &mut event, MouseRegion::raise_pointer_move);
    }

    pub fn pointer_down(
        &mut self,
        tree: &Tree,
        root: WidgetId,
        x: f32,
        y: f32,
        button: PointerButton,
    ) {
        self.buttons |= button.flag();
        self.update_hit_path(tree, root, x, y);
        let mut event = PointerEvent::at(x, y)
            .with_button(button)
            .with_buttons(self.buttons);
        self.old_result
            .propagate_pointer_event(tree, &mut event, MouseRegion::raise_pointer_down);
    }

    /// Release bubbles along the current path without re-deriving it: the
    /// widget that saw the press sees the release even if geometry shifted.
    pub fn pointer_up(
        &mut self,
        tree: &Tree,
        _root: WidgetId,
        x: f32,
        y: f32,
        button: PointerButton,
    ) {
        self.buttons.remove(button.flag());
        self.last_x = x;
        self.last_y = y;
        let mut event = PointerEvent::at(x, y)
            .with_button(button)
            .with_buttons(self.buttons);
        self.old_result
            .propagate_pointer_event(tree, &mut event, MouseRegion::raise_pointer_up);
    }

    /// The pointer left the surface: everything exits.
    pub fn pointer_leave(&mut self, tree: &Tree) {
        self.old_result.exit_all(tree);
        self.old_result.reset();
        self.new_result.reset();
        cursor::set_cursor(CursorIcon::Default);
    }

    /// A scrollable's offset changed by (`dx`, `dy`). Adjusts the path in
    /// place when possible; otherwise falls back to a full re-hit-test at the
    /// remembered pointer position. Returns whether the cheap path survived.
    pub fn scroll_by(
        &mut self,
        tree: &Tree,
        root: WidgetId,
        scrollable: WidgetId,
        dx: f32,
        dy: f32,
    ) -> bool {
        if self
            .old_result
            .translate_on_scroll(tree, scrollable, dx, dy, self.last_x, self.last_y)
        {
            true
        } else {
            self.run_new_hit_test(tree, root);
            false
        }
    }

    /// Rebuild the path at the remembered pointer position and fire the diff.
    /// Called after a frame in which any relayout ran.
    pub fn run_new_hit_test(&mut self, tree: &Tree, root: WidgetId) {
        self.new_result.reset();
        tree.hit_test_widget(root, self.last_x, self.last_y, &mut self.new_result);
        self.compare_and_swap(tree);
    }
}

impl Default for PointerRouter {
    fn default() -> Self {
        Self::new()
    }
}
