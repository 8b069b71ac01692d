/// Camera distance change per zoom key press.
pub const ZOOM_STEP: f32 = 5.0;

// ---------------------------------------------------------------------------
// Key: windowing-library-independent key representation
// ---------------------------------------------------------------------------

/// A keyboard key, independent of any windowing library.
///
/// `main.rs` maps `winit::keyboard::KeyCode` → `Key`; everything else in the
/// input pipeline works purely with this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Space,
    Equal, // = / + (same physical key; Shift state ignored)
    Minus, // - / _ (same physical key; Shift state ignored)
    R,
    H,
    Q,
    Escape,
}

// ---------------------------------------------------------------------------
// InputAction: what the app does in response to input
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    ToggleAutoRotation,
    ZoomIn,
    ZoomOut,
    ResetDefaults,
    TogglePanel,
    Quit,
}

/// Translate a `Key` press into an `InputAction`.
pub fn on_key(key: Key) -> InputAction {
    match key {
        Key::Space => InputAction::ToggleAutoRotation,
        Key::Equal => InputAction::ZoomIn,
        Key::Minus => InputAction::ZoomOut,
        Key::R => InputAction::ResetDefaults,
        Key::H => InputAction::TogglePanel,
        Key::Q | Key::Escape => InputAction::Quit,
    }
}

/// Camera distance change for a zoom action. Zooming in moves the camera
/// closer; the store clamps the result when it applies the change.
pub fn zoom_delta(action: InputAction) -> Option<f32> {
    match action {
        InputAction::ZoomIn => Some(-ZOOM_STEP),
        InputAction::ZoomOut => Some(ZOOM_STEP),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
