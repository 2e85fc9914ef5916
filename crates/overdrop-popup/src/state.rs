/// Which interaction currently controls the popup's vertical offset.
/// Exactly one variant is active at any instant.
///
/// Only `PhysicsOut` carries data: the simulated downward velocity, updated
/// every frame while the free-fall dismissal runs. Equality compares that
/// payload too; code that only cares about the variant uses `matches!`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PopupState {
    /// The intro animation is sliding the container on screen.
    AnimatingIn,
    /// At rest, accepting tap and pan input.
    Idle,
    /// A drag owns the offset. Also covers the snap-back spring after a
    /// slow release: `Idle` is re-entered only once the offset settles at
    /// exactly zero.
    Panning,
    /// The outro animation is running; interaction is disabled.
    AnimatingOut,
    /// Free-fall dismissal after a fast downward flick.
    PhysicsOut { velocity: f32 },
}
