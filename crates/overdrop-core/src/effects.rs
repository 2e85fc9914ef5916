use std::cell::RefCell;
use std::rc::Rc;

/// A cleanup action that runs at most once.
///
/// Subscriptions in overdrop (frame clock, keyboard notifier, signal
/// observers) hand one of these back to the caller, which owns it and runs
/// it on teardown. Cloned handles share the same underlying action.
#[derive(Clone)]
pub struct Dispose(Rc<RefCell<Option<Box<dyn FnOnce()>>>>);

impl Dispose {
    pub fn new(f: impl FnOnce() + 'static) -> Self {
        Self(Rc::new(RefCell::new(Some(Box::new(f)))))
    }

    /// A disposer with nothing to clean up.
    pub fn noop() -> Self {
        Self(Rc::new(RefCell::new(None)))
    }

    /// Runs at most once (safe to call multiple times).
    pub fn run(&self) {
        if let Some(f) = self.0.borrow_mut().take() {
            f()
        }
    }
}
