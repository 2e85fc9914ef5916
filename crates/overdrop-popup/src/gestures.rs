//! Gesture vocabulary.
//!
//! Recognition itself lives outside this crate: some platform layer turns
//! raw pointer input into discrete tap/pan events and feeds them to a
//! controller (`tap`, `pan_began`, `pan_changed`, `pan_ended`). Before
//! starting a gesture it consults the controller's admission predicate,
//! `gesture_should_begin`, with one of these kinds.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureKind {
    Tap,
    Pan,
}
