mod display;
pub mod sink;

pub use display::{Controller, DEFAULT_WINDOW, Display};
pub use sink::{FrameRecorder, FrameStats, OutputSink};

/// Run state of the display loop. `Killed` is terminal.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[repr(u8)]
pub enum State {
    /// Waits for the next state without rendering.
    Stopped = 0,
    /// Renders the foreground window once per framerate period.
    Running = 1,
    /// The loop has exited, or is about to.
    Killed = 2,
}

#[derive(Debug, thiserror::Error)]
pub enum DisplayError {
    #[error("window {0:?} not found")]
    WindowNotFound(String),
    #[error("window {0:?} is in the foreground and cannot be removed")]
    ForegroundInUse(String),
    #[error("the display loop needs a running tokio runtime")]
    NoRuntime,
    #[error("the display loop panicked")]
    LoopPanicked,
    #[error("the display loop was cancelled")]
    LoopCancelled,
}
