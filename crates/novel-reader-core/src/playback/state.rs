use crate::generation::Generation;
use crate::speech::AudioClip;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Reading,
    Paused,
    Stopped,
    /// Stopped because the end of the document was reached.
    Finished,
}

impl PlaybackState {
    /// Reading or Paused: there is a session that stop/skip act on.
    pub fn is_active(self) -> bool {
        matches!(self, PlaybackState::Reading | PlaybackState::Paused)
    }

    pub fn label(self) -> &'static str {
        match self {
            PlaybackState::Idle => "idle",
            PlaybackState::Reading => "reading",
            PlaybackState::Paused => "paused",
            PlaybackState::Stopped => "stopped",
            PlaybackState::Finished => "finished",
        }
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// The single audio handle owned by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AudioSlot {
    #[default]
    Empty,
    /// Speech requested, no answer yet.
    Synthesizing(Generation),
    /// Audio arrived while paused; loaded on resume.
    Pending { generation: Generation, clip: AudioClip },
    /// Handed to the output, not yet confirmed started.
    Loading { generation: Generation, clip: AudioClip },
    Playing { generation: Generation, clip: AudioClip },
}

impl AudioSlot {
    /// Whether the audio output currently holds a clip for this slot.
    pub fn is_loaded(&self) -> bool {
        matches!(self, AudioSlot::Loading { .. } | AudioSlot::Playing { .. })
    }

    pub fn clip(&self) -> Option<&AudioClip> {
        match self {
            AudioSlot::Pending { clip, .. }
            | AudioSlot::Loading { clip, .. }
            | AudioSlot::Playing { clip, .. } => Some(clip),
            AudioSlot::Empty | AudioSlot::Synthesizing(_) => None,
        }
    }
}
