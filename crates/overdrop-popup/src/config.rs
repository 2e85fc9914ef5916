use bitflags::bitflags;

pub const DEFAULT_CORNER_RADIUS: f32 = 8.0;

bitflags! {
    /// Which dismissal gestures are enabled for a popup. Consulted by the
    /// gesture admission logic, never mutated by it.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct DismissOptions: u8 {
        const TAP = 1 << 0;
        const SWIPE = 1 << 1;
    }
}

impl Default for DismissOptions {
    fn default() -> Self {
        Self::all()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PopupConfig {
    pub corner_radius: f32,
    pub dismiss: DismissOptions,
}

impl Default for PopupConfig {
    fn default() -> Self {
        Self {
            corner_radius: DEFAULT_CORNER_RADIUS,
            dismiss: DismissOptions::all(),
        }
    }
}

impl PopupConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn corner_radius(mut self, radius: f32) -> Self {
        self.corner_radius = radius;
        self
    }

    pub fn disable_tap_to_dismiss(mut self) -> Self {
        self.dismiss.remove(DismissOptions::TAP);
        self
    }

    pub fn disable_swipe_to_dismiss(mut self) -> Self {
        self.dismiss.remove(DismissOptions::SWIPE);
        self
    }

    pub fn allows_tap(&self) -> bool {
        self.dismiss.contains(DismissOptions::TAP)
    }

    pub fn allows_swipe(&self) -> bool {
        self.dismiss.contains(DismissOptions::SWIPE)
    }
}
