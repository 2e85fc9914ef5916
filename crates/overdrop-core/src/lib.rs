//! # Signals, disposers, frames, and animation
//!
//! Overdrop's core is a small set of single-threaded reactive primitives the
//! popup controllers are built from:
//!
//! - [`Signal<T>`] — observable value. The controllers write the container
//!   rect and scrim alpha into signals; the embedding layout pass reads them.
//! - [`Dispose`] — a run-at-most-once cleanup guard. Every subscription in
//!   overdrop hands one back, so teardown is explicit rather than ambient.
//! - [`FrameClock`] — per-frame callback registry. The platform calls
//!   `tick(now)` once per display frame; tests call it by hand with
//!   manufactured timestamps.
//! - [`AnimatedValue<T>`] — a value that eases toward a target, polled with
//!   each frame timestamp.
//!
//! ## Driving a frame loop
//!
//! ```rust
//! use overdrop_core::*;
//! use web_time::{Duration, Instant};
//!
//! let frames = FrameClock::new();
//! let sub = frames.subscribe(|now| log::trace!("frame at {now:?}"));
//!
//! let t0 = Instant::now();
//! frames.tick(t0);
//! frames.tick(t0 + Duration::from_millis(16));
//!
//! sub.cancel();
//! assert_eq!(frames.subscriber_count(), 0);
//! ```
//!
//! Everything here assumes a single UI thread: state lives in `Rc`/`RefCell`
//! and callbacks run synchronously during `tick` or during a signal write.

pub mod animation;
pub mod clock;
pub mod effects;
pub mod geometry;
pub mod signal;

pub use animation::*;
pub use clock::*;
pub use effects::*;
pub use geometry::*;
pub use signal::*;
