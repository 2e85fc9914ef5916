//! # Popup dialogs with gesture dismissal
//!
//! Two controllers present a content panel as a modal dialog over a host
//! screen:
//!
//! - [`Popup`] — slide-in/slide-out motion and tap-outside-to-dismiss.
//! - [`InteractivePopup`] — adds drag-to-dismiss with flick physics,
//!   snap-back, and keyboard avoidance, coordinated by an explicit
//!   [`PopupState`] machine.
//!
//! The crate owns interaction and motion only. Presentation, rendering,
//! gesture recognition, and the keyboard are all behind seams: the
//! [`HostScreen`] trait, the [`PopupView`] signals the host reads back, the
//! discrete gesture events fed in by the platform, and the
//! [`KeyboardNotifier`].
//!
//! ```rust
//! use std::rc::Rc;
//! use overdrop_core::{FrameClock, Size};
//! use overdrop_popup::*;
//!
//! struct Panel;
//! impl ContentPanel for Panel {
//!     fn preferred_size(&self, max: Size) -> Size {
//!         Size::new(max.width, 240.0)
//!     }
//! }
//!
//! struct Screen;
//! impl HostScreen for Screen {
//!     fn bounds(&self) -> Size {
//!         Size::new(400.0, 800.0)
//!     }
//!     fn present(&self, _view: Rc<PopupView>) {}
//!     fn dismiss(&self, _view: &PopupView, completion: Box<dyn FnOnce()>) {
//!         completion();
//!     }
//! }
//!
//! let frames = Rc::new(FrameClock::new());
//! let keyboard = Rc::new(KeyboardNotifier::new());
//! let popup = InteractivePopup::new(
//!     Rc::new(Panel),
//!     PopupConfig::new(),
//!     frames.clone(),
//!     keyboard,
//! );
//! popup.show(Rc::new(Screen));
//! // The platform now calls frames.tick(now) every display frame.
//! ```

pub mod config;
pub mod gestures;
pub mod host;
pub mod interactive;
pub mod layout;
pub mod physics;
pub mod popup;
pub mod state;
pub mod tests;

pub use config::*;
pub use gestures::*;
pub use host::*;
pub use interactive::*;
pub use popup::*;
pub use state::*;
