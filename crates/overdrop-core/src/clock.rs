use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use slotmap::{SlotMap, new_key_type};
use smallvec::SmallVec;
use web_time::{Duration, Instant};

use crate::effects::Dispose;

/// Source of timestamps for whoever drives the frame loop.
pub trait Clock {
    fn now(&self) -> Instant;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock tests can drive deterministically.
pub struct TestClock {
    t: Cell<Instant>,
}

impl TestClock {
    pub fn new() -> Self {
        Self {
            t: Cell::new(Instant::now()),
        }
    }

    pub fn advance(&self, d: Duration) {
        self.t.set(self.t.get() + d);
    }
}

impl Default for TestClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TestClock {
    fn now(&self) -> Instant {
        self.t.get()
    }
}

new_key_type! {
    struct FrameKey;
}

type FrameCallback = Rc<dyn Fn(Instant)>;

/// Per-frame callback registry.
///
/// The platform (or a test) calls [`FrameClock::tick`] once per display
/// frame with the frame timestamp; every live subscriber runs with it.
/// Subscribing returns a [`FrameSubscription`] whose `cancel` removes the
/// callback again — there is no ambient global timer, so a subscriber's
/// lifetime is always explicit and auditable.
pub struct FrameClock {
    subs: Rc<RefCell<SlotMap<FrameKey, FrameCallback>>>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            subs: Rc::new(RefCell::new(SlotMap::with_key())),
        }
    }

    pub fn subscribe(&self, f: impl Fn(Instant) + 'static) -> FrameSubscription {
        let key = self.subs.borrow_mut().insert(Rc::new(f));
        log::trace!("frame subscriber added ({} live)", self.subs.borrow().len());
        let weak: Weak<RefCell<SlotMap<FrameKey, FrameCallback>>> = Rc::downgrade(&self.subs);
        FrameSubscription(Dispose::new(move || {
            if let Some(subs) = weak.upgrade() {
                subs.borrow_mut().remove(key);
                log::trace!("frame subscriber removed ({} live)", subs.borrow().len());
            }
        }))
    }

    /// Deliver one frame. Callbacks may unsubscribe (their own registration
    /// or another) while the tick dispatches.
    pub fn tick(&self, now: Instant) {
        let snapshot: SmallVec<[FrameCallback; 4]> =
            self.subs.borrow().values().cloned().collect();
        for cb in snapshot {
            cb(now);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subs.borrow().len()
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to a live frame subscription; `cancel` tears it down.
pub struct FrameSubscription(Dispose);

impl FrameSubscription {
    pub fn cancel(&self) {
        self.0.run();
    }
}
