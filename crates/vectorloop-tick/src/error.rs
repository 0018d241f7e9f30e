use std::io;
use thiserror::Error;

/// Errors raised by a [`TickLoop`](crate::TickLoop).
#[derive(Error, Debug)]
pub enum LoopError {
    #[error("The tick callback must be a callable function")]
    InvalidCallback,

    #[error(transparent)]
    Timer(#[from] TimerError),
}

/// Errors raised while scheduling a repeating timer.
#[derive(Error, Debug)]
pub enum TimerError {
    #[error("Failed to spawn timer thread: {0}")]
    Spawn(#[from] io::Error),
}
