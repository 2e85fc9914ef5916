use web_time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Easing {
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    /// Underdamped spring step response, parameterized by damping ratio in
    /// (0, 1). Lower damping overshoots more before settling at the target.
    Spring { damping: f32 },
}

/// Natural frequency of the spring response over the normalized [0, 1]
/// timeline. High enough that the envelope has fully decayed by t = 1 for
/// the damping ratios used here (0.7–0.84).
const SPRING_OMEGA: f32 = 14.0;

impl Easing {
    pub fn interpolate(&self, t: f32) -> f32 {
        match self {
            Easing::Linear => t,
            Easing::EaseIn => t * t,
            Easing::EaseOut => t * (2.0 - t),
            Easing::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
            Easing::Spring { damping } => {
                let zeta = damping.clamp(0.05, 0.98);
                let omega_d = SPRING_OMEGA * (1.0 - zeta * zeta).sqrt();
                let decay = (-zeta * SPRING_OMEGA * t).exp();
                let phase = omega_d * t;
                1.0 - decay * (phase.cos() + (zeta * SPRING_OMEGA / omega_d) * phase.sin())
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationSpec {
    pub duration: Duration,
    pub easing: Easing,
    pub delay: Duration,
}

impl Default for AnimationSpec {
    fn default() -> Self {
        Self {
            duration: Duration::from_millis(300),
            easing: Easing::EaseInOut,
            delay: Duration::ZERO,
        }
    }
}

impl AnimationSpec {
    pub fn tween(duration: Duration, easing: Easing) -> Self {
        Self {
            duration,
            easing,
            delay: Duration::ZERO,
        }
    }

    pub fn spring(damping: f32, duration: Duration) -> Self {
        Self {
            duration,
            easing: Easing::Spring { damping },
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

pub trait Interpolate {
    fn interpolate(&self, other: &Self, t: f32) -> Self;
}

impl Interpolate for f32 {
    fn interpolate(&self, other: &Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

/// A value that transitions toward a target over time.
///
/// The owner polls `update(now)` with each frame timestamp; the first frame
/// after a retarget anchors the animation's start time (so starting an
/// animation needs no clock access). `update` returns `true` while motion is
/// still in flight and `false` once the value has settled on the target —
/// the edge from `true` to `false` is the completion signal.
pub struct AnimatedValue<T: Interpolate + Clone> {
    current: T,
    start: T,
    target: T,
    spec: AnimationSpec,
    start_time: Option<Instant>,
    active: bool,
}

impl<T: Interpolate + Clone> AnimatedValue<T> {
    pub fn new(initial: T, spec: AnimationSpec) -> Self {
        Self {
            current: initial.clone(),
            start: initial.clone(),
            target: initial,
            spec,
            start_time: None,
            active: false,
        }
    }

    /// Begin animating from the current value toward `target`, restarting
    /// the timeline. Retargeting mid-flight continues from wherever the
    /// value currently is.
    pub fn set_target(&mut self, target: T) {
        self.start = self.current.clone();
        self.target = target;
        self.start_time = None;
        self.active = true;
    }

    /// `set_target` with a new spec for this leg of motion.
    pub fn animate_to(&mut self, target: T, spec: AnimationSpec) {
        self.spec = spec;
        self.set_target(target);
    }

    /// Jump to `target` immediately, without animating.
    pub fn snap_to(&mut self, target: T) {
        self.current = target.clone();
        self.start = target.clone();
        self.target = target;
        self.start_time = None;
        self.active = false;
    }

    /// Stop an in-flight animation where it is. No completion edge fires:
    /// after cancelling, `update` reports `false` without ever having
    /// reached the target.
    pub fn cancel(&mut self) {
        self.start_time = None;
        self.active = false;
    }

    pub fn update(&mut self, now: Instant) -> bool {
        if !self.active {
            return false;
        }

        let start = *self.start_time.get_or_insert(now);
        let elapsed = now.saturating_duration_since(start);

        if elapsed < self.spec.delay {
            return true;
        }
        let animation_time = elapsed - self.spec.delay;

        if animation_time >= self.spec.duration {
            self.current = self.target.clone();
            self.start = self.target.clone();
            self.start_time = None;
            self.active = false;
            return false;
        }

        let t = animation_time.as_secs_f32() / self.spec.duration.as_secs_f32();
        let eased = self.spec.easing.interpolate(t);
        self.current = self.start.interpolate(&self.target, eased);
        true
    }

    pub fn get(&self) -> &T {
        &self.current
    }

    pub fn is_animating(&self) -> bool {
        self.active
    }
}
