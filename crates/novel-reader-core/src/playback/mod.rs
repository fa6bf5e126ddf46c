//! Reading playback: the scheduler state machine, the audio output and the
//! runtime that connects them.

mod audio;
mod runtime;
mod scheduler;
mod state;

pub use audio::{AudioOutput, RodioOutput};
pub use runtime::{PlaybackRuntime, ReaderUpdate};
pub use scheduler::{PlaybackAction, PlaybackEvent, PlaybackScheduler};
pub use state::{AudioSlot, PlaybackState};
