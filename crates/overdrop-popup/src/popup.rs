//! The basic popup controller: canned intro/outro motion and
//! tap-outside-to-dismiss, no drag interaction.

use std::cell::RefCell;
use std::rc::Rc;

use overdrop_core::{AnimatedValue, AnimationSpec, Easing, FrameClock, FrameSubscription, Rect, Vec2};
use smallvec::SmallVec;
use web_time::{Duration, Instant};

use crate::config::PopupConfig;
use crate::gestures::GestureKind;
use crate::host::{ContentPanel, HostScreen, PopupView};
use crate::layout;
use crate::state::PopupState;

pub(crate) const INTRO_DURATION: Duration = Duration::from_millis(600);
pub(crate) const OUTRO_DURATION: Duration = Duration::from_millis(1000);
pub(crate) const INTRO_SPRING_DAMPING: f32 = 0.84;
pub(crate) const OUTRO_SPRING_DAMPING: f32 = 0.8;
pub(crate) const SCRIM_OPACITY: f32 = 0.4;

type Completion = Box<dyn FnOnce()>;

/// Presents a content panel in a rounded container over a host screen,
/// slides it in from the bottom edge, and slides it back out on `close` or
/// on a tap outside the container.
///
/// Cheaply cloneable handle; all state lives behind a shared cell and all
/// methods run on the UI thread.
#[derive(Clone)]
pub struct Popup {
    inner: Rc<RefCell<Inner>>,
}

struct Inner {
    config: PopupConfig,
    content: Rc<dyn ContentPanel>,
    view: Rc<PopupView>,
    frames: Rc<FrameClock>,
    host: Option<Rc<dyn HostScreen>>,
    state: PopupState,
    /// 0 = container parked below the screen, 1 = resting position.
    slide: AnimatedValue<f32>,
    scrim: AnimatedValue<f32>,
    frame_sub: Option<FrameSubscription>,
    has_animated_in: bool,
    disposed: bool,
    completions: SmallVec<[Completion; 2]>,
}

impl Popup {
    pub fn new(content: Rc<dyn ContentPanel>, config: PopupConfig, frames: Rc<FrameClock>) -> Self {
        let view = Rc::new(PopupView::new(config.corner_radius));
        Self {
            inner: Rc::new(RefCell::new(Inner {
                config,
                content,
                view,
                frames,
                host: None,
                state: PopupState::AnimatingIn,
                slide: AnimatedValue::new(
                    0.0,
                    AnimationSpec::spring(INTRO_SPRING_DAMPING, INTRO_DURATION),
                ),
                scrim: AnimatedValue::new(
                    0.0,
                    AnimationSpec::tween(INTRO_DURATION, Easing::EaseInOut),
                ),
                frame_sub: None,
                has_animated_in: false,
                disposed: false,
                completions: SmallVec::new(),
            })),
        }
    }

    /// Present the popup above `host` and start the intro animation. The
    /// presentation itself is unanimated; the intro supplies the motion.
    /// Calling `show` again is a no-op — the intro never replays.
    ///
    /// Panics if the popup was already dismissed; a dismissed controller is
    /// dead, and reviving one is a programming mistake.
    pub fn show(&self, host: Rc<dyn HostScreen>) {
        let view = {
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
            inner.slide.set_target(1.0);
            inner.scrim.set_target(SCRIM_OPACITY);

            let weak = Rc::downgrade(&self.inner);
            let sub = inner.frames.subscribe(move |now| {
                if let Some(strong) = weak.upgrade() {
                    Inner::on_frame(&strong, now);
                }
            });
            inner.frame_sub = Some(sub);
            inner.view.clone()
        };
        host.present(view);
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
        // Already gone: nothing left to animate, complete right away.
        if let Some(c) = completion {
            c();
        }
    }

    /// A recognized tap at `at`, in host coordinates. Dismisses when it
    /// lands outside the container and tap-dismiss is enabled; anything
    /// else is a no-op.
    pub fn tap(&self, at: Vec2) {
        let mut inner = self.inner.borrow_mut();
        if inner.disposed {
            return;
        }
        if !inner.config.allows_tap() || inner.view.container.get().contains(at) {
            log::debug!("tap at {at:?} not admitted");
            return;
        }
        match inner.state {
            PopupState::AnimatingIn | PopupState::Idle => inner.begin_outro(),
            _ => log::debug!("tap ignored in state {:?}", inner.state),
        }
    }

    /// Admission predicate the gesture source consults before starting a
    /// gesture. The basic popup admits taps only.
    pub fn gesture_should_begin(&self, kind: GestureKind, at: Vec2) -> bool {
        let inner = self.inner.borrow();
        if inner.disposed || matches!(inner.state, PopupState::AnimatingOut) {
            return false;
        }
        match kind {
            GestureKind::Tap => {
                inner.config.allows_tap() && !inner.view.container.get().contains(at)
            }
            GestureKind::Pan => false,
        }
    }

    pub fn state(&self) -> PopupState {
        self.inner.borrow().state
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

    fn begin_outro(&mut self) {
        self.transition(PopupState::AnimatingOut);
        self.view.interaction_enabled.set(false);
        self.slide
            .animate_to(0.0, AnimationSpec::spring(OUTRO_SPRING_DAMPING, OUTRO_DURATION));
        self.scrim
            .animate_to(0.0, AnimationSpec::tween(OUTRO_DURATION, Easing::EaseInOut));
    }

    fn on_frame(this: &Rc<RefCell<Inner>>, now: Instant) {
        let mut dismissal: Option<(Rc<dyn HostScreen>, Rc<PopupView>)> = None;
        {
            let mut inner = this.borrow_mut();
            let slide_was = inner.slide.is_animating();
            inner.slide.update(now);
            inner.scrim.update(now);

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

    /// Hand the view back to the host; dispose and drain completions once
    /// the host reports it removed.
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
        let y = screen.height + (resting.y - screen.height) * slide;
        self.view.container.set(Rect { y, ..resting });
        self.view.scrim_alpha.set(*self.scrim.get());
    }
}
