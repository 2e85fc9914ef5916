use std::cell::RefCell;
use std::rc::{Rc, Weak};

use slotmap::{SlotMap, new_key_type};
use smallvec::SmallVec;

use crate::effects::Dispose;

new_key_type! {
    struct SubKey;
}

/// Observable, reactive value.
///
/// `Signal<T>` is a cheaply cloneable handle to a piece of state. Writers
/// call `set`/`update`; readers call `get` or register an observer with
/// `subscribe`, which returns a [`Dispose`] that removes the observer again.
///
/// Observers run synchronously during the write and must not write back into
/// the same signal.
pub struct Signal<T: 'static>(Rc<RefCell<Inner<T>>>);

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

struct Inner<T> {
    value: T,
    subs: SlotMap<SubKey, Rc<dyn Fn(&T)>>,
}

impl<T> Signal<T> {
    pub fn new(value: T) -> Self {
        Self(Rc::new(RefCell::new(Inner {
            value,
            subs: SlotMap::with_key(),
        })))
    }

    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.0.borrow().value.clone()
    }

    /// Read the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.0.borrow().value)
    }

    pub fn set(&self, v: T) {
        self.0.borrow_mut().value = v;
        self.notify();
    }

    pub fn update<F: FnOnce(&mut T)>(&self, f: F) {
        f(&mut self.0.borrow_mut().value);
        self.notify();
    }

    /// Register an observer; run the returned disposer to unregister it.
    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> Dispose {
        let key = self.0.borrow_mut().subs.insert(Rc::new(f));
        let weak: Weak<RefCell<Inner<T>>> = Rc::downgrade(&self.0);
        Dispose::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().subs.remove(key);
            }
        })
    }

    fn notify(&self) {
        // Snapshot so an observer may subscribe/unsubscribe while we
        // dispatch; observers get a shared borrow of the value.
        let subs: SmallVec<[Rc<dyn Fn(&T)>; 4]> =
            self.0.borrow().subs.values().cloned().collect();
        for s in subs {
            s(&self.0.borrow().value);
        }
    }
}

pub fn signal<T>(t: T) -> Signal<T> {
    Signal::new(t)
}
