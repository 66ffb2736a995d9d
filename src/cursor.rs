//! Cursor management for changing the mouse cursor appearance.
//!
//! Pointer regions with a cursor request it on hover; the host event loop
//! picks pending changes up once per frame and applies them to the platform.

use std::cell::RefCell;

/// Standard cursor icons that can be displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorIcon {
    /// The default arrow cursor.
    #[default]
    Default,
    /// Text selection cursor (I-beam).
    Text,
    /// Pointer/hand cursor for clickable elements.
    Pointer,
    /// Crosshair cursor.
    Crosshair,
    /// Move/drag cursor.
    Move,
    /// Not allowed cursor.
    NotAllowed,
    /// Grab cursor (open hand).
    Grab,
    /// Grabbing cursor (closed hand).
    Grabbing,
    /// Wait/loading cursor.
    Wait,
}

thread_local! {
    /// Current requested cursor
    static CURRENT_CURSOR: RefCell<CursorIcon> = const { RefCell::new(CursorIcon::Default) };

    /// Flag indicating the cursor changed and needs to be synced to the platform
    static CURSOR_CHANGED: RefCell<bool> = const { RefCell::new(false) };
}

/// Set the cursor to display.
/// Called by pointer regions when the hover state changes.
pub fn set_cursor(cursor: CursorIcon) {
    CURRENT_CURSOR.with(|c| {
        let current = *c.borrow();
        if current != cursor {
            *c.borrow_mut() = cursor;
            CURSOR_CHANGED.with(|changed| {
                *changed.borrow_mut() = true;
            });
        }
    });
}

/// Take the pending cursor change (returns the cursor if it changed since the
/// last call). Called by the host event loop to sync the platform cursor.
pub fn take_cursor_change() -> Option<CursorIcon> {
    let changed = CURSOR_CHANGED.with(|c| {
        let was_changed = *c.borrow();
        *c.borrow_mut() = false;
        was_changed
    });

    if changed {
        Some(CURRENT_CURSOR.with(|c| *c.borrow()))
    } else {
        None
    }
}

/// Get the current cursor without clearing the change flag.
pub fn current_cursor() -> CursorIcon {
    CURRENT_CURSOR.with(|c| *c.borrow())
}

/// Reset cursor state to defaults.
pub fn reset_cursor() {
    CURRENT_CURSOR.with(|c| *c.borrow_mut() = CursorIcon::Default);
    CURSOR_CHANGED.with(|c| *c.borrow_mut() = false);
}
