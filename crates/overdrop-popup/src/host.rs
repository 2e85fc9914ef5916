//! Seams to the world outside the popup: the host screen that embeds it,
//! the content it wraps, and the keyboard notifier it watches.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use overdrop_core::{Dispose, Rect, Signal, Size, signal};
use slotmap::{SlotMap, new_key_type};
use smallvec::SmallVec;

use crate::interactive::InteractivePopup;

/// Any embeddable visual content. The popup only needs its bounding box;
/// rendering the content is the host's business.
pub trait ContentPanel {
    /// Size the panel wants within `max` (the screen minus the popup's
    /// margins). Heights beyond `max.height` get clipped by the container
    /// cap anyway.
    fn preferred_size(&self, max: Size) -> Size;
}

/// What the host embeds: a rounded container positioned by the controller,
/// over a dimming scrim.
///
/// The signals are written during the frame tick. Observers must not call
/// back into the owning controller synchronously — read, record, return.
pub struct PopupView {
    pub corner_radius: f32,
    /// Container frame in host coordinates, updated every frame.
    pub container: Signal<Rect>,
    /// Scrim opacity behind the container.
    pub scrim_alpha: Signal<f32>,
    /// False until the intro animation completes, false again the moment
    /// dismissal starts.
    pub interaction_enabled: Signal<bool>,
}

impl PopupView {
    pub(crate) fn new(corner_radius: f32) -> Self {
        Self {
            corner_radius,
            container: signal(Rect::default()),
            scrim_alpha: signal(0.0),
            interaction_enabled: signal(false),
        }
    }
}

/// The screen a popup presents over. `present` and `dismiss` are opaque and
/// animate nothing themselves; the controller's own intro/outro supply all
/// visible motion.
pub trait HostScreen {
    fn bounds(&self) -> Size;
    fn present(&self, view: Rc<PopupView>);
    /// Remove `view` and call `completion` once it has left the screen.
    fn dismiss(&self, view: &PopupView, completion: Box<dyn FnOnce()>);
    /// Optional capability interface; resolved once when the popup is
    /// shown, with permissive defaults when absent.
    fn capabilities(&self) -> Option<Rc<dyn PopupCapabilities>> {
        None
    }
}

/// Per-host overrides for dismissal gestures, plus a writable slot the
/// controller fills with a handle to itself on show.
pub trait PopupCapabilities {
    fn attach_popup(&self, popup: InteractivePopup) {
        let _ = popup;
    }

    fn allows_tap_to_dismiss(&self) -> bool {
        true
    }

    fn allows_swipe_to_dismiss(&self) -> bool {
        true
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum KeyboardEvent {
    WillShow { height: f32 },
    WillHide,
}

new_key_type! {
    struct KeyboardSubKey;
}

type KeyboardCallback = Rc<dyn Fn(KeyboardEvent)>;

/// Keyboard visibility notifications as instance-owned registrations.
///
/// The platform layer calls `notify_will_show`/`notify_will_hide` when its
/// keyboard moves; a controller subscribes while visible and runs the
/// returned [`Dispose`] on teardown, so nothing process-wide keeps
/// listening after the popup is gone.
pub struct KeyboardNotifier {
    subs: Rc<RefCell<SlotMap<KeyboardSubKey, KeyboardCallback>>>,
}

impl KeyboardNotifier {
    pub fn new() -> Self {
        Self {
            subs: Rc::new(RefCell::new(SlotMap::with_key())),
        }
    }

    pub fn subscribe(&self, f: impl Fn(KeyboardEvent) + 'static) -> Dispose {
        let key = self.subs.borrow_mut().insert(Rc::new(f));
        let weak: Weak<RefCell<SlotMap<KeyboardSubKey, KeyboardCallback>>> =
            Rc::downgrade(&self.subs);
        Dispose::new(move || {
            if let Some(subs) = weak.upgrade() {
                subs.borrow_mut().remove(key);
            }
        })
    }

    pub fn notify_will_show(&self, height: f32) {
        self.emit(KeyboardEvent::WillShow { height });
    }

    pub fn notify_will_hide(&self) {
        self.emit(KeyboardEvent::WillHide);
    }

    /// Ask for the keyboard to be resigned. A platform integration forwards
    /// this to its IME and the will-hide notification follows; this default
    /// notifier reports the hide directly.
    pub fn request_dismiss(&self) {
        self.notify_will_hide();
    }

    fn emit(&self, event: KeyboardEvent) {
        let snapshot: SmallVec<[KeyboardCallback; 4]> =
            self.subs.borrow().values().cloned().collect();
        for cb in snapshot {
            cb(event);
        }
    }
}

impl Default for KeyboardNotifier {
    fn default() -> Self {
        Self::new()
    }
}
