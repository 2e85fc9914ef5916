//! The interactive popup controller: everything the basic [`Popup`] does,
//! plus a swipe/drag dismissal path with flick physics, snap-back, and
//! keyboard avoidance.
//!
//! A small explicit state machine ([`PopupState`]) decides which interaction
//! currently owns the popup's vertical offset:
//!
//! ```text
//! AnimatingIn ──intro done──▶ Idle ◀──spring settles── (snap-back)
//!      │                       │                            ▲
//!      │ pan begins            │ pan begins/changes         │ release ≤ 50
//!      ▼                       ▼                            │
//!    (intro cancelled) ─────▶ Panning ──release > 50──▶ PhysicsOut
//!                                                           │
//!                 any state ──close()/force-dismiss──▶ AnimatingOut
//! ```
//!
//! While `PhysicsOut` runs, each frame integrates a constant downward
//! acceleration (semi-implicit Euler) and the popup force-dismisses once the
//! offset clears half the screen height.
//!
//! [`Popup`]: crate::popup::Popup

use std::cell::RefCell;
use std::rc::Rc;

use overdrop_core::{
    AnimatedValue, AnimationSpec, Dispose, Easing, FrameClock, FrameSubscription, Rect, Vec2,
};
use smallvec::SmallVec;
use web_time::{Duration, Instant};

use crate::config::PopupConfig;
use crate::gestures::GestureKind;
use crate::host::{
    ContentPanel, HostScreen, KeyboardEvent, KeyboardNotifier, PopupCapabilities, PopupView,
};
use crate::layout;
use crate::physics::{self, FLICK_VELOCITY_THRESHOLD, MAX_FRAME_DT};
use crate::popup::{
    INTRO_DURATION, INTRO_SPRING_DAMPING, OUTRO_DURATION, OUTRO_SPRING_DAMPING, SCRIM_OPACITY,
};
use crate::state::PopupState;

const SNAP_BACK_DAMPING: f32 = 0.7;
const SNAP_BACK_DURATION: Duration = Duration::from_millis(300);
/// Extra clearance between the keyboard and the shifted container.
const KEYBOARD_MARGIN: f32 = 8.0;

type Completion = Box<dyn FnOnce()>;

/// Swipe-dismissable popup dialog.
///
/// Cheaply cloneable handle over shared single-threaded state. The gesture
/// source feeds it discrete events (`tap`, `pan_began`, `pan_changed`,
/// `pan_ended`) after consulting [`gesture_should_begin`]; the frame clock
/// drives animation and physics while the popup is visible.
///
/// [`gesture_should_begin`]: InteractivePopup::gesture_should_begin
#[derive(Clone)]
pub struct InteractivePopup {
    inner: Rc<RefCell<Inner>>,
}

struct Inner {
    config: PopupConfig,
    content: Rc<dyn ContentPanel>,
    view: Rc<PopupView>,
    frames: Rc<FrameClock>,
    keyboard: Rc<KeyboardNotifier>,
    host: Option<Rc<dyn HostScreen>>,
    caps: Option<Rc<dyn PopupCapabilities>>,
    state: PopupState,

    /// 0 = container parked below the screen, 1 = resting position.
    slide: AnimatedValue<f32>,
    scrim: AnimatedValue<f32>,
    /// Spring returning the swipe offset to zero after a slow release.
    snap_back: AnimatedValue<f32>,
    /// Keyboard-avoidance shift of the vertical centering constant.
    center_offset: AnimatedValue<f32>,

    /// Accumulated drag displacement from rest, in screen units.
    swipe_offset: f32,
    keyboard_visible: bool,
    keyboard_sub: Option<Dispose>,
    frame_sub: Option<FrameSubscription>,
    /// Previous frame timestamp; the first tick after arming only records
    /// it, so integration always has a real delta.
    last_tick: Option<Instant>,

    has_animated_in: bool,
    disposed: bool,
    completions: SmallVec<[Completion; 2]>,
}

impl InteractivePopup {
    pub fn new(
        content: Rc<dyn ContentPanel>,
        config: PopupConfig,
        frames: Rc<FrameClock>,
        keyboard: Rc<KeyboardNotifier>,
    ) -> Self {
        let view = Rc::new(PopupView::new(config.corner_radius));
        Self {
            inner: Rc::new(RefCell::new(Inner {
                config,
                content,
                view,
                frames,
                keyboard,
                host: None,
                caps: None,
                state: PopupState::AnimatingIn,
                slide: AnimatedValue::new(
                    0.0,
                    AnimationSpec::spring(INTRO_SPRING_DAMPING, INTRO_DURATION),
                ),
                scrim: AnimatedValue::new(
                    0.0,
                    AnimationSpec::tween(INTRO_DURATION, Easing::EaseInOut),
                ),
                snap_back: AnimatedValue::new(
                    0.0,
                    AnimationSpec::spring(SNAP_BACK_DAMPING, SNAP_BACK_DURATION),
                ),
                center_offset: AnimatedValue::new(0.0, AnimationSpec::default()),
                swipe_offset: 0.0,
                keyboard_visible: false,
                keyboard_sub: None,
                frame_sub: None,
                last_tick: None,
                has_animated_in: false,
                disposed: false,
                completions: SmallVec::new(),
            })),
        }
    }

    /// Present the popup above `host` and start the intro animation.
    ///
    /// The host's capability interface is resolved here, once; if the host
    /// exposes one, its back-reference slot receives a handle to this
    /// controller. Calling `show` again never replays the intro.
    ///
    /// Panics if the popup was already dismissed.
    pub fn show(&self, host: Rc<dyn HostScreen>) {
        let (view, caps) = {
            let mut inner = self.inner.borrow_mut();
            if inner.disposed {
                panic!("show() on a popup whose view was already dismissed");
            }
            if inner.has_animated_in {
                log::warn!("show() called again; the intro animation plays only once");
                return;
            }
            inner.has_animated_in = true;
            inner.host = Some(host.clone());
            inner.caps = host.capabilities();
            inner.slide.set_target(1.0);
            inner.scrim.set_target(SCRIM_OPACITY);

            let weak = Rc::downgrade(&self.inner);
            let sub = inner.frames.subscribe(move |now| {
                if let Some(strong) = weak.upgrade() {
                    Inner::on_frame(&strong, now);
                }
            });
            inner.frame_sub = Some(sub);

            let weak = Rc::downgrade(&self.inner);
            let sub = inner.keyboard.subscribe(move |event| {
                if let Some(strong) = weak.upgrade() {
                    strong.borrow_mut().on_keyboard(event);
                }
            });
            inner.keyboard_sub = Some(sub);

            (inner.view.clone(), inner.caps.clone())
        };
        host.present(view);
        if let Some(caps) = caps {
            caps.attach_popup(self.clone());
        }
    }

    /// Dismiss the popup. Works from any state; interaction is cut off
    /// immediately and `completion` runs once the outro animation has fully
    /// played out and the host has removed the view.
    pub fn close(&self, completion: impl FnOnce() + 'static) {
        let mut completion = Some(Box::new(completion) as Completion);
        {
            let mut inner = self.inner.borrow_mut();
            if !inner.disposed {
                if inner.host.is_none() {
                    // Never presented; dispose on the spot.
                    inner.disposed = true;
                } else {
                    if let Some(c) = completion.take() {
                        inner.completions.push(c);
                    }
                    if !matches!(inner.state, PopupState::AnimatingOut) {
                        inner.begin_outro();
                    }
                }
            }
        }
        if let Some(c) = completion {
            c();
        }
    }

    /// Admission predicate the gesture source consults before starting a
    /// gesture.
    ///
    /// A tap is admitted with the keyboard visible (so it can dismiss the
    /// keyboard), otherwise only outside the container and with tap-dismiss
    /// enabled. A pan is admitted only with the keyboard hidden and
    /// swipe-dismiss enabled by both the config and the host.
    pub fn gesture_should_begin(&self, kind: GestureKind, at: Vec2) -> bool {
        let inner = self.inner.borrow();
        if inner.disposed || matches!(inner.state, PopupState::AnimatingOut) {
            return false;
        }
        match kind {
            GestureKind::Tap => {
                if inner.keyboard_visible {
                    return true;
                }
                inner.allows_tap() && !inner.view.container.get().contains(at)
            }
            GestureKind::Pan => !inner.keyboard_visible && inner.allows_swipe(),
        }
    }

    /// A recognized tap at `at`, in host coordinates. With the keyboard
    /// visible the tap dismisses the keyboard and nothing else; otherwise a
    /// tap outside the container starts the outro.
    pub fn tap(&self, at: Vec2) {
        let keyboard = {
            let mut inner = self.inner.borrow_mut();
            if inner.disposed {
                return;
            }
            if inner.keyboard_visible {
                inner.keyboard.clone()
            } else {
                if !inner.allows_tap() || inner.view.container.get().contains(at) {
                    log::debug!("tap at {at:?} not admitted");
                    return;
                }
                match inner.state {
                    PopupState::AnimatingIn | PopupState::Idle => inner.begin_outro(),
                    _ => log::debug!("tap ignored in state {:?}", inner.state),
                }
                return;
            }
        };
        // Outside the borrow: the will-hide notification re-enters us.
        keyboard.request_dismiss();
    }

    /// The pan gesture started. During the intro this cancels the in-flight
    /// animation (its completion never fires) and the drag takes over at
    /// the resting position.
    pub fn pan_began(&self) {
        let mut inner = self.inner.borrow_mut();
        if inner.disposed || !inner.pan_admissible() {
            return;
        }
        match inner.state {
            PopupState::AnimatingIn => {
                // Cancels the intro; no completion fires.
                inner.slide.snap_to(1.0);
                inner.transition(PopupState::Idle);
                inner.view.interaction_enabled.set(true);
                inner.transition(PopupState::Panning);
            }
            PopupState::Idle => inner.transition(PopupState::Panning),
            PopupState::Panning => {
                // Finger caught the container mid-snap-back.
                inner.snap_back.cancel();
            }
            _ => log::debug!("pan began ignored in state {:?}", inner.state),
        }
    }

    /// Drag moved; `translation` is the displacement since the gesture
    /// began.
    pub fn pan_changed(&self, translation: Vec2) {
        let mut inner = self.inner.borrow_mut();
        if inner.disposed || !inner.pan_admissible() {
            return;
        }
        match inner.state {
            PopupState::Idle => {
                inner.transition(PopupState::Panning);
                inner.swipe_offset = translation.y;
            }
            PopupState::Panning => {
                inner.snap_back.cancel();
                inner.swipe_offset = translation.y;
            }
            _ => log::debug!("pan changed ignored in state {:?}", inner.state),
        }
    }

    /// The finger lifted. A fast downward release hands the offset to the
    /// physics step; anything slower springs back to rest.
    pub fn pan_ended(&self, translation_y: f32, velocity_y: f32) {
        let mut inner = self.inner.borrow_mut();
        if inner.disposed {
            return;
        }
        if !matches!(inner.state, PopupState::Panning) || inner.snap_back.is_animating() {
            log::debug!("pan ended ignored in state {:?}", inner.state);
            return;
        }
        inner.swipe_offset = translation_y;
        if velocity_y > FLICK_VELOCITY_THRESHOLD {
            inner.transition(PopupState::PhysicsOut {
                velocity: velocity_y,
            });
        } else {
            let offset = inner.swipe_offset;
            inner.snap_back.snap_to(offset);
            inner.snap_back.animate_to(
                0.0,
                AnimationSpec::spring(SNAP_BACK_DAMPING, SNAP_BACK_DURATION),
            );
            // State stays Panning until the spring settles at zero.
        }
    }

    pub fn state(&self) -> PopupState {
        self.inner.borrow().state
    }

    /// Raw accumulated drag displacement. Exactly zero whenever the popup
    /// is `Idle`.
    pub fn swipe_offset(&self) -> f32 {
        self.inner.borrow().swipe_offset
    }

    pub fn view(&self) -> Rc<PopupView> {
        self.inner.borrow().view.clone()
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.borrow().disposed
    }
}

impl Inner {
    fn transition(&mut self, next: PopupState) {
        log::debug!("popup state {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    fn allows_tap(&self) -> bool {
        self.config.allows_tap()
            && self
                .caps
                .as_ref()
                .is_none_or(|c| c.allows_tap_to_dismiss())
    }

    fn allows_swipe(&self) -> bool {
        self.config.allows_swipe()
            && self
                .caps
                .as_ref()
                .is_none_or(|c| c.allows_swipe_to_dismiss())
    }

    fn pan_admissible(&self) -> bool {
        !self.keyboard_visible && self.allows_swipe()
    }

    fn begin_outro(&mut self) {
        self.transition(PopupState::AnimatingOut);
        self.view.interaction_enabled.set(false);
        self.snap_back.cancel();
        self.slide
            .animate_to(0.0, AnimationSpec::spring(OUTRO_SPRING_DAMPING, OUTRO_DURATION));
        self.scrim
            .animate_to(0.0, AnimationSpec::tween(OUTRO_DURATION, Easing::EaseInOut));
    }

    fn on_keyboard(&mut self, event: KeyboardEvent) {
        match event {
            KeyboardEvent::WillShow { height } => {
                self.keyboard_visible = true;
                self.center_offset
                    .animate_to(-(height + KEYBOARD_MARGIN) / 2.0, AnimationSpec::default());
            }
            KeyboardEvent::WillHide => {
                self.keyboard_visible = false;
                self.center_offset.animate_to(0.0, AnimationSpec::default());
            }
        }
    }

    fn on_frame(this: &Rc<RefCell<Inner>>, now: Instant) {
        let mut dismissal: Option<(Rc<dyn HostScreen>, Rc<PopupView>)> = None;
        {
            let mut inner = this.borrow_mut();
            let slide_was = inner.slide.is_animating();
            inner.slide.update(now);
            inner.scrim.update(now);
            inner.center_offset.update(now);

            // Snap-back owns the offset while its spring runs.
            if inner.snap_back.is_animating() {
                inner.snap_back.update(now);
                inner.swipe_offset = *inner.snap_back.get();
                if !inner.snap_back.is_animating() {
                    inner.swipe_offset = 0.0;
                    inner.transition(PopupState::Idle);
                }
            }

            // Free-fall integration. The first tick after arming only
            // records the timestamp; there is no dt to integrate with yet.
            if let PopupState::PhysicsOut { velocity } = inner.state {
                if let Some(prev) = inner.last_tick {
                    let dt = now
                        .saturating_duration_since(prev)
                        .as_secs_f32()
                        .min(MAX_FRAME_DT);
                    if dt > 0.0 {
                        let (velocity, offset) =
                            physics::fall_step(velocity, inner.swipe_offset, dt);
                        inner.swipe_offset = offset;
                        inner.state = PopupState::PhysicsOut { velocity };
                        let screen = inner.host.as_ref().map(|h| h.bounds());
                        if let Some(screen) = screen {
                            if offset > screen.height / 2.0 {
                                log::debug!(
                                    "offset {offset:.1} cleared half the screen; force-dismissing"
                                );
                                inner.begin_outro();
                            }
                        }
                    }
                }
            }
            inner.last_tick = Some(now);

            if slide_was && !inner.slide.is_animating() {
                match inner.state {
                    PopupState::AnimatingIn => {
                        inner.transition(PopupState::Idle);
                        inner.view.interaction_enabled.set(true);
                    }
                    PopupState::AnimatingOut => {
                        if let Some(sub) = inner.frame_sub.take() {
                            sub.cancel();
                        }
                        if let Some(sub) = inner.keyboard_sub.take() {
                            sub.run();
                        }
                        if let Some(host) = inner.host.clone() {
                            dismissal = Some((host, inner.view.clone()));
                        }
                    }
                    _ => {}
                }
            }

            inner.publish_frame();
        }
        if let Some((host, view)) = dismissal {
            Inner::dismiss_via(this, host, view);
        }
    }

    fn dismiss_via(this: &Rc<RefCell<Inner>>, host: Rc<dyn HostScreen>, view: Rc<PopupView>) {
        let weak = Rc::downgrade(this);
        host.dismiss(
            &view,
            Box::new(move || {
                if let Some(strong) = weak.upgrade() {
                    let drained: SmallVec<[Completion; 2]> = {
                        let mut inner = strong.borrow_mut();
                        inner.disposed = true;
                        inner.host = None;
                        inner.caps = None;
                        std::mem::take(&mut inner.completions)
                    };
                    for c in drained {
                        c();
                    }
                }
            }),
        );
    }

    fn publish_frame(&mut self) {
        let Some(host) = &self.host else {
            return;
        };
        let screen = host.bounds();
        let resting = layout::resting_container(screen, self.content.as_ref());
        let slide = *self.slide.get();
        let base_y = screen.height + (resting.y - screen.height) * slide;
        let y = base_y
            + *self.center_offset.get()
            + physics::elastic_visual_offset(self.swipe_offset, screen.width);
        self.view.container.set(Rect { y, ..resting });
        self.view.scrim_alpha.set(*self.scrim.get());
    }
}
