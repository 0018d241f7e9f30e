//! # Vectorloop Tick
//!
//! A fixed-rate loop for driving animations. [`TickLoop`] keeps a frame
//! counter and a single repeating timer that calls back into the caller,
//! usually to render a `Surface`.
//!
//! Timers are pluggable: [`ThreadTimer`] uses background threads,
//! [`ManualTimer`] runs on a virtual clock for deterministic tests and
//! offline frame stepping.

pub mod error;
pub mod manual;
pub mod tick_loop;
pub mod timer;

pub use error::{LoopError, TimerError};
pub use manual::ManualTimer;
pub use tick_loop::{FrameCounter, LoopState, TickCallback, TickLoop, DEFAULT_FPS};
pub use timer::{interval_for, ThreadTimer, Timer, TimerId, TimerTask, MIN_INTERVAL};
