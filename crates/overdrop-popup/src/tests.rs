#[cfg(test)]
mod tests {
    use crate::config::*;
    use crate::gestures::GestureKind;
    use crate::host::*;
    use crate::interactive::InteractivePopup;
    use crate::layout;
    use crate::physics;
    use crate::popup::Popup;
    use crate::state::PopupState;
    use overdrop_core::{FrameClock, Size, Vec2};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use web_time::{Duration, Instant};

    const FRAME: Duration = Duration::from_millis(16);

    fn screen() -> Size {
        Size {
            width: 400.0,
            height: 800.0,
        }
    }

    struct FixedPanel {
        size: Size,
    }

    impl ContentPanel for FixedPanel {
        fn preferred_size(&self, max: Size) -> Size {
            Size {
                width: self.size.width.min(max.width),
                height: self.size.height.min(max.height),
            }
        }
    }

    struct Caps {
        allow_tap: Cell<bool>,
        allow_swipe: Cell<bool>,
        attached: RefCell<Option<InteractivePopup>>,
    }

    impl Caps {
        fn permissive() -> Rc<Self> {
            Rc::new(Self {
                allow_tap: Cell::new(true),
                allow_swipe: Cell::new(true),
                attached: RefCell::new(None),
            })
        }
    }

    impl PopupCapabilities for Caps {
        fn attach_popup(&self, popup: InteractivePopup) {
            *self.attached.borrow_mut() = Some(popup);
        }
        fn allows_tap_to_dismiss(&self) -> bool {
            self.allow_tap.get()
        }
        fn allows_swipe_to_dismiss(&self) -> bool {
            self.allow_swipe.get()
        }
    }

    struct FakeHost {
        bounds: Size,
        presented: Cell<u32>,
        dismissed: Cell<u32>,
        caps: Option<Rc<Caps>>,
    }

    impl FakeHost {
        fn new() -> Rc<Self> {
            Rc::new(Self {
                bounds: screen(),
                presented: Cell::new(0),
                dismissed: Cell::new(0),
                caps: None,
            })
        }

        fn with_caps(caps: Rc<Caps>) -> Rc<Self> {
            Rc::new(Self {
                bounds: screen(),
                presented: Cell::new(0),
                dismissed: Cell::new(0),
                caps: Some(caps),
            })
        }
    }

    impl HostScreen for FakeHost {
        fn bounds(&self) -> Size {
            self.bounds
        }
        fn present(&self, _view: Rc<PopupView>) {
            self.presented.set(self.presented.get() + 1);
        }
        fn dismiss(&self, _view: &PopupView, completion: Box<dyn FnOnce()>) {
            self.dismissed.set(self.dismissed.get() + 1);
            completion();
        }
        fn capabilities(&self) -> Option<Rc<dyn PopupCapabilities>> {
            self.caps
                .clone()
                .map(|c| c as Rc<dyn PopupCapabilities>)
        }
    }

    struct Harness {
        frames: Rc<FrameClock>,
        keyboard: Rc<KeyboardNotifier>,
        host: Rc<FakeHost>,
        popup: InteractivePopup,
        now: Instant,
    }

    impl Harness {
        fn new() -> Self {
            Self::build(PopupConfig::new(), FakeHost::new())
        }

        fn with_config(config: PopupConfig) -> Self {
            Self::build(config, FakeHost::new())
        }

        fn with_host(host: Rc<FakeHost>) -> Self {
            Self::build(PopupConfig::new(), host)
        }

        fn build(config: PopupConfig, host: Rc<FakeHost>) -> Self {
            let frames = Rc::new(FrameClock::new());
            let keyboard = Rc::new(KeyboardNotifier::new());
            let popup = InteractivePopup::new(
                Rc::new(FixedPanel {
                    size: Size {
                        width: 400.0,
                        height: 200.0,
                    },
                }),
                config,
                frames.clone(),
                keyboard.clone(),
            );
            Self {
                frames,
                keyboard,
                host,
                popup,
                now: Instant::now(),
            }
        }

        fn show(&self) {
            self.popup.show(self.host.clone());
        }

        fn frame(&mut self) {
            self.now += FRAME;
            self.frames.tick(self.now);
        }

        fn run_ms(&mut self, ms: u64) {
            for _ in 0..ms.div_ceil(16) {
                self.frame();
            }
        }

        /// Show and run the intro to completion.
        fn settle(&mut self) {
            self.show();
            self.run_ms(700);
            assert_eq!(self.popup.state(), PopupState::Idle);
        }

        fn container(&self) -> overdrop_core::Rect {
            self.popup.view().container.get()
        }
    }

    // ---- intro / show contract ----

    #[test]
    fn intro_completes_to_idle_and_enables_interaction() {
        let mut h = Harness::new();
        h.show();
        assert_eq!(h.host.presented.get(), 1);
        assert_eq!(h.popup.state(), PopupState::AnimatingIn);
        assert!(!h.popup.view().interaction_enabled.get());

        h.run_ms(700);
        assert_eq!(h.popup.state(), PopupState::Idle);
        assert!(h.popup.view().interaction_enabled.get());
        // Settled at rest: (800 - 200) / 2.
        assert!((h.container().y - 300.0).abs() < 0.5);
    }

    #[test]
    fn show_twice_never_replays_intro() {
        let mut h = Harness::new();
        h.show();
        h.show();
        assert_eq!(h.host.presented.get(), 1);

        h.run_ms(700);
        assert_eq!(h.popup.state(), PopupState::Idle);
        h.show();
        assert_eq!(h.host.presented.get(), 1);
        assert_eq!(h.popup.state(), PopupState::Idle);
    }

    #[test]
    fn container_rect_respects_margins_and_centering() {
        let mut h = Harness::new();
        h.settle();
        let r = h.container();
        assert_eq!(r.x, 16.0);
        assert_eq!(r.w, 368.0);
        assert_eq!(r.h, 200.0);
        assert!((r.y - 300.0).abs() < 0.5);
    }

    // ---- close contract ----

    fn assert_close_disposes_once(mut h: Harness) {
        let completions = Rc::new(Cell::new(0));
        let c = completions.clone();
        h.popup.close(move || c.set(c.get() + 1));
        assert_eq!(h.popup.state(), PopupState::AnimatingOut);
        assert!(!h.popup.view().interaction_enabled.get());

        h.run_ms(1200);
        assert!(h.popup.is_disposed());
        assert_eq!(h.host.dismissed.get(), 1);
        assert_eq!(completions.get(), 1);
        assert_eq!(h.frames.subscriber_count(), 0);
    }

    #[test]
    fn close_from_animating_in() {
        let h = Harness::new();
        h.show();
        assert_close_disposes_once(h);
    }

    #[test]
    fn close_from_idle() {
        let mut h = Harness::new();
        h.settle();
        assert_close_disposes_once(h);
    }

    #[test]
    fn close_from_panning() {
        let mut h = Harness::new();
        h.settle();
        h.popup.pan_began();
        h.popup.pan_changed(Vec2 { x: 0.0, y: 60.0 });
        assert_eq!(h.popup.state(), PopupState::Panning);
        assert_close_disposes_once(h);
    }

    #[test]
    fn close_from_physics_out() {
        let mut h = Harness::new();
        h.settle();
        h.popup.pan_began();
        h.popup.pan_changed(Vec2 { x: 0.0, y: 80.0 });
        h.popup.pan_ended(80.0, 600.0);
        h.frame();
        assert!(matches!(h.popup.state(), PopupState::PhysicsOut { .. }));
        assert_close_disposes_once(h);
    }

    #[test]
    fn close_twice_disposes_once_and_runs_both_completions() {
        let mut h = Harness::new();
        h.settle();

        let completions = Rc::new(Cell::new(0));
        let c1 = completions.clone();
        let c2 = completions.clone();
        h.popup.close(move || c1.set(c1.get() + 1));
        assert_eq!(h.popup.state(), PopupState::AnimatingOut);
        h.popup.close(move || c2.set(c2.get() + 1));

        h.run_ms(1200);
        assert!(h.popup.is_disposed());
        assert_eq!(h.host.dismissed.get(), 1);
        assert_eq!(completions.get(), 2);
    }

    #[test]
    fn close_before_show_disposes_immediately() {
        let h = Harness::new();
        let done = Rc::new(Cell::new(false));
        let d = done.clone();
        h.popup.close(move || d.set(true));
        assert!(done.get());
        assert!(h.popup.is_disposed());
        assert_eq!(h.host.dismissed.get(), 0);
    }

    #[test]
    #[should_panic(expected = "already dismissed")]
    fn show_after_dispose_panics() {
        let mut h = Harness::new();
        h.settle();
        h.popup.close(|| {});
        h.run_ms(1200);
        assert!(h.popup.is_disposed());
        h.show();
    }

    // ---- tap admission ----

    #[test]
    fn tap_outside_dismisses() {
        let mut h = Harness::new();
        h.settle();
        h.popup.tap(Vec2 { x: 10.0, y: 10.0 });
        assert_eq!(h.popup.state(), PopupState::AnimatingOut);

        h.run_ms(1200);
        assert!(h.popup.is_disposed());
        assert_eq!(h.host.dismissed.get(), 1);
    }

    #[test]
    fn tap_inside_container_never_dismisses() {
        let mut h = Harness::new();
        h.settle();
        assert!(!h
            .popup
            .gesture_should_begin(GestureKind::Tap, Vec2 { x: 200.0, y: 400.0 }));
        h.popup.tap(Vec2 { x: 200.0, y: 400.0 });
        assert_eq!(h.popup.state(), PopupState::Idle);
    }

    #[test]
    fn tap_with_keyboard_visible_dismisses_keyboard_only() {
        let mut h = Harness::new();
        h.settle();
        h.keyboard.notify_will_show(300.0);

        // Admitted anywhere while the keyboard is up...
        assert!(h
            .popup
            .gesture_should_begin(GestureKind::Tap, Vec2 { x: 200.0, y: 400.0 }));
        h.popup.tap(Vec2 { x: 10.0, y: 10.0 });
        // ...but it only resigned the keyboard.
        assert_eq!(h.popup.state(), PopupState::Idle);

        // Keyboard is gone now, so the next outside tap dismisses.
        h.popup.tap(Vec2 { x: 10.0, y: 10.0 });
        assert_eq!(h.popup.state(), PopupState::AnimatingOut);
    }

    #[test]
    fn tap_disabled_by_config() {
        let mut h = Harness::with_config(PopupConfig::new().disable_tap_to_dismiss());
        h.settle();
        assert!(!h
            .popup
            .gesture_should_begin(GestureKind::Tap, Vec2 { x: 10.0, y: 10.0 }));
        h.popup.tap(Vec2 { x: 10.0, y: 10.0 });
        assert_eq!(h.popup.state(), PopupState::Idle);
    }

    #[test]
    fn tap_denied_by_host_capabilities() {
        let caps = Caps::permissive();
        caps.allow_tap.set(false);
        let mut h = Harness::with_host(FakeHost::with_caps(caps));
        h.settle();
        h.popup.tap(Vec2 { x: 10.0, y: 10.0 });
        assert_eq!(h.popup.state(), PopupState::Idle);
    }

    // ---- pan admission ----

    #[test]
    fn pan_denied_while_keyboard_visible() {
        let mut h = Harness::new();
        h.settle();
        h.keyboard.notify_will_show(300.0);
        assert!(!h
            .popup
            .gesture_should_begin(GestureKind::Pan, Vec2 { x: 0.0, y: 0.0 }));
        h.popup.pan_began();
        assert_eq!(h.popup.state(), PopupState::Idle);
    }

    #[test]
    fn pan_denied_by_config_and_capabilities() {
        let mut h = Harness::with_config(PopupConfig::new().disable_swipe_to_dismiss());
        h.settle();
        assert!(!h
            .popup
            .gesture_should_begin(GestureKind::Pan, Vec2 { x: 0.0, y: 0.0 }));
        h.popup.pan_began();
        assert_eq!(h.popup.state(), PopupState::Idle);

        let caps = Caps::permissive();
        caps.allow_swipe.set(false);
        let mut h = Harness::with_host(FakeHost::with_caps(caps));
        h.settle();
        h.popup.pan_began();
        assert_eq!(h.popup.state(), PopupState::Idle);
    }

    #[test]
    fn host_back_reference_is_attached_on_show() {
        let caps = Caps::permissive();
        let h = Harness::with_host(FakeHost::with_caps(caps.clone()));
        h.show();
        assert!(caps.attached.borrow().is_some());
    }

    // ---- drag, snap-back, flick ----

    #[test]
    fn slow_release_snaps_back_to_idle_with_zero_offset() {
        let mut h = Harness::new();
        h.settle();
        h.popup.pan_began();
        h.popup.pan_changed(Vec2 { x: 0.0, y: 80.0 });
        assert_eq!(h.popup.state(), PopupState::Panning);
        assert_eq!(h.popup.swipe_offset(), 80.0);

        h.popup.pan_ended(80.0, 30.0);
        // Still panning while the spring returns the offset.
        assert_eq!(h.popup.state(), PopupState::Panning);

        h.run_ms(400);
        assert_eq!(h.popup.state(), PopupState::Idle);
        assert_eq!(h.popup.swipe_offset(), 0.0);
    }

    #[test]
    fn release_at_threshold_snaps_back() {
        let mut h = Harness::new();
        h.settle();
        h.popup.pan_began();
        h.popup.pan_changed(Vec2 { x: 0.0, y: 100.0 });
        h.popup.pan_ended(100.0, physics::FLICK_VELOCITY_THRESHOLD);
        h.run_ms(400);
        assert_eq!(h.popup.state(), PopupState::Idle);
        assert_eq!(h.popup.swipe_offset(), 0.0);
    }

    #[test]
    fn upward_flick_snaps_back() {
        let mut h = Harness::new();
        h.settle();
        h.popup.pan_began();
        h.popup.pan_changed(Vec2 { x: 0.0, y: -60.0 });
        h.popup.pan_ended(-60.0, -500.0);
        h.run_ms(400);
        assert_eq!(h.popup.state(), PopupState::Idle);
        assert_eq!(h.popup.swipe_offset(), 0.0);
    }

    #[test]
    fn fast_release_enters_physics_with_release_velocity() {
        let mut h = Harness::new();
        h.settle();
        h.popup.pan_began();
        h.popup.pan_changed(Vec2 { x: 0.0, y: 120.0 });
        h.popup.pan_ended(120.0, 900.0);
        assert_eq!(
            h.popup.state(),
            PopupState::PhysicsOut { velocity: 900.0 }
        );
    }

    #[test]
    fn pan_grabs_container_during_snap_back() {
        let mut h = Harness::new();
        h.settle();
        h.popup.pan_began();
        h.popup.pan_changed(Vec2 { x: 0.0, y: 90.0 });
        h.popup.pan_ended(90.0, 10.0);
        h.run_ms(64);
        let mid = h.popup.swipe_offset();
        assert!(mid > 0.0 && mid < 90.0, "spring should be mid-flight: {mid}");

        // A new drag takes over from wherever the spring left the offset.
        h.popup.pan_began();
        assert_eq!(h.popup.state(), PopupState::Panning);
        h.popup.pan_changed(Vec2 { x: 0.0, y: 40.0 });
        assert_eq!(h.popup.swipe_offset(), 40.0);
        h.run_ms(100);
        assert_eq!(h.popup.state(), PopupState::Panning);
        assert_eq!(h.popup.swipe_offset(), 40.0);
    }

    // ---- physics-out ----

    #[test]
    fn physics_velocity_is_monotonic() {
        let mut h = Harness::new();
        h.settle();
        h.popup.pan_began();
        h.popup.pan_changed(Vec2 { x: 0.0, y: 60.0 });
        h.popup.pan_ended(60.0, 200.0);

        let mut last = 200.0;
        for _ in 0..20 {
            h.frame();
            match h.popup.state() {
                PopupState::PhysicsOut { velocity } => {
                    assert!(velocity >= last, "{velocity} < {last}");
                    last = velocity;
                }
                PopupState::AnimatingOut => break,
                other => panic!("unexpected state {other:?}"),
            }
        }
        assert!(last > 200.0);
    }

    #[test]
    fn crossing_half_screen_force_dismisses_on_that_tick() {
        let mut h = Harness::new();
        h.settle();
        h.popup.pan_began();
        h.popup.pan_changed(Vec2 { x: 0.0, y: 100.0 });
        h.popup.pan_ended(100.0, 700.0);

        let half = screen().height / 2.0;
        loop {
            h.frame();
            if h.popup.swipe_offset() > half {
                // The very tick the offset clears half the screen, the
                // popup is already animating out.
                assert_eq!(h.popup.state(), PopupState::AnimatingOut);
                break;
            }
            assert!(matches!(h.popup.state(), PopupState::PhysicsOut { .. }));
        }

        h.run_ms(1200);
        assert!(h.popup.is_disposed());
        assert_eq!(h.host.dismissed.get(), 1);
    }

    // ---- offset invariant ----

    #[test]
    fn offset_is_zero_whenever_idle() {
        let mut h = Harness::new();
        h.settle();
        assert_eq!(h.popup.swipe_offset(), 0.0);

        for (drag, velocity) in [(40.0, 0.0), (120.0, 49.0), (-80.0, -900.0)] {
            h.popup.pan_began();
            h.popup.pan_changed(Vec2 { x: 0.0, y: drag });
            h.popup.pan_ended(drag, velocity);
            h.run_ms(500);
            assert_eq!(h.popup.state(), PopupState::Idle);
            assert_eq!(h.popup.swipe_offset(), 0.0);
        }
    }

    // ---- elastic resistance ----

    #[test]
    fn elastic_mapping_matches_reference_values() {
        // Upward drag is rubber-banded: pct = 0.5, damped = 0.5 / 2.5.
        assert_eq!(physics::elastic_visual_offset(-100.0, 400.0), -40.0);
        // Downward drag tracks linearly.
        assert_eq!(physics::elastic_visual_offset(100.0, 400.0), 100.0);
        assert_eq!(physics::elastic_visual_offset(0.0, 400.0), 0.0);
    }

    #[test]
    fn upward_drag_is_damped_in_container_rect() {
        let mut h = Harness::new();
        h.settle();
        let rest_y = h.container().y;

        h.popup.pan_began();
        h.popup.pan_changed(Vec2 { x: 0.0, y: -100.0 });
        h.frame();
        assert!((h.container().y - (rest_y - 40.0)).abs() < 0.5);

        h.popup.pan_changed(Vec2 { x: 0.0, y: 100.0 });
        h.frame();
        assert!((h.container().y - (rest_y + 100.0)).abs() < 0.5);
    }

    // ---- pan during intro ----

    #[test]
    fn pan_during_intro_cancels_it_and_takes_over() {
        let mut h = Harness::new();
        h.show();
        h.run_ms(48);
        assert_eq!(h.popup.state(), PopupState::AnimatingIn);

        h.popup.pan_began();
        assert_eq!(h.popup.state(), PopupState::Panning);
        assert!(h.popup.view().interaction_enabled.get());

        h.popup.pan_changed(Vec2 { x: 0.0, y: 40.0 });
        h.frame();
        // Container snapped to rest plus the drag; the cancelled intro's
        // completion never fires and never flips the state underneath us.
        assert!((h.container().y - 340.0).abs() < 0.5);
        h.run_ms(700);
        assert_eq!(h.popup.state(), PopupState::Panning);
    }

    // ---- keyboard avoidance ----

    #[test]
    fn keyboard_show_shifts_center_by_half_height_plus_margin() {
        let mut h = Harness::new();
        h.settle();
        let rest_y = h.container().y;

        h.keyboard.notify_will_show(300.0);
        h.run_ms(400);
        // -(300 + 8) / 2 = -154.
        assert!((h.container().y - (rest_y - 154.0)).abs() < 0.5);

        h.keyboard.notify_will_hide();
        h.run_ms(400);
        assert!((h.container().y - rest_y).abs() < 0.5);
    }

    // ---- malformed sequences are no-ops ----

    #[test]
    fn gestures_outside_accepting_states_are_ignored() {
        let mut h = Harness::new();
        h.settle();
        h.popup.close(|| {});
        assert_eq!(h.popup.state(), PopupState::AnimatingOut);

        h.popup.pan_began();
        h.popup.pan_changed(Vec2 { x: 0.0, y: 50.0 });
        h.popup.pan_ended(50.0, 900.0);
        h.popup.tap(Vec2 { x: 10.0, y: 10.0 });
        assert_eq!(h.popup.state(), PopupState::AnimatingOut);
        assert_eq!(h.popup.swipe_offset(), 0.0);

        // And once gone, everything is inert.
        h.run_ms(1200);
        assert!(h.popup.is_disposed());
        h.popup.pan_began();
        h.popup.tap(Vec2 { x: 10.0, y: 10.0 });
        assert!(h.popup.is_disposed());
    }

    #[test]
    fn stray_pan_end_while_idle_is_ignored() {
        let mut h = Harness::new();
        h.settle();
        h.popup.pan_ended(100.0, 900.0);
        assert_eq!(h.popup.state(), PopupState::Idle);
        assert_eq!(h.popup.swipe_offset(), 0.0);
    }

    // ---- the basic variant ----

    fn basic_popup() -> (Rc<FrameClock>, Rc<FakeHost>, Popup) {
        let frames = Rc::new(FrameClock::new());
        let host = FakeHost::new();
        let popup = Popup::new(
            Rc::new(FixedPanel {
                size: Size {
                    width: 400.0,
                    height: 200.0,
                },
            }),
            PopupConfig::new(),
            frames.clone(),
        );
        (frames, host, popup)
    }

    #[test]
    fn basic_popup_intro_tap_outro() {
        let (frames, host, popup) = basic_popup();
        popup.show(host.clone());
        assert_eq!(popup.state(), PopupState::AnimatingIn);

        let mut now = Instant::now();
        for _ in 0..44 {
            now += FRAME;
            frames.tick(now);
        }
        assert_eq!(popup.state(), PopupState::Idle);
        assert!(popup.view().interaction_enabled.get());

        // Pans are never admitted by the basic variant.
        assert!(!popup.gesture_should_begin(GestureKind::Pan, Vec2 { x: 0.0, y: 0.0 }));

        popup.tap(Vec2 { x: 10.0, y: 10.0 });
        assert_eq!(popup.state(), PopupState::AnimatingOut);

        for _ in 0..70 {
            now += FRAME;
            frames.tick(now);
        }
        assert!(popup.is_disposed());
        assert_eq!(host.dismissed.get(), 1);
        assert_eq!(frames.subscriber_count(), 0);
    }

    #[test]
    fn basic_popup_show_twice_and_tap_inside() {
        let (frames, host, popup) = basic_popup();
        popup.show(host.clone());
        popup.show(host.clone());
        assert_eq!(host.presented.get(), 1);

        let mut now = Instant::now();
        for _ in 0..44 {
            now += FRAME;
            frames.tick(now);
        }
        popup.tap(Vec2 { x: 200.0, y: 400.0 });
        assert_eq!(popup.state(), PopupState::Idle);
    }

    // ---- pure pieces ----

    #[test]
    fn fall_step_is_semi_implicit() {
        let (v, off) = physics::fall_step(100.0, 0.0, 0.1);
        // Velocity updates first, position integrates the new velocity.
        assert_eq!(v, 100.0 + 0.1 * physics::FALL_ACCELERATION);
        assert_eq!(off, v * 0.1);
    }

    #[test]
    fn resting_container_caps_height() {
        let tall = FixedPanel {
            size: Size {
                width: 400.0,
                height: 900.0,
            },
        };
        let r = layout::resting_container(screen(), &tall);
        assert_eq!(r.x, 16.0);
        assert_eq!(r.y, 16.0);
        assert_eq!(r.w, 368.0);
        assert_eq!(r.h, 768.0);
    }
}
