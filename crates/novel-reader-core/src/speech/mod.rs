//! Remote text-to-speech.
//!
//! Two interchangeable providers sit behind [`SpeechProvider`]; the
//! [`SpeechRouter`] picks one per phrase and falls back to the other once.

mod primary;
pub(crate) mod router;
mod secondary;
mod voices;

pub use primary::PrimaryProvider;
pub use router::SpeechRouter;
pub use secondary::SecondaryProvider;
pub use voices::{VoiceOption, find_voice, voice_catalog};

use crate::error::SynthesisError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Simple GET endpoint answering with an audio stream.
    #[default]
    Primary,
    /// JSON POST endpoint answering with raw audio bytes.
    Secondary,
}

impl ProviderKind {
    pub fn other(self) -> Self {
        match self {
            ProviderKind::Primary => ProviderKind::Secondary,
            ProviderKind::Secondary => ProviderKind::Primary,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ProviderKind::Primary => "primary",
            ProviderKind::Secondary => "secondary",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Voice selection threaded from configuration into every request.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceSettings {
    pub voice_id: String,
    pub provider: ProviderKind,
    pub speed: f32,
    /// Carried for completeness; neither endpoint accepts it.
    pub pitch: f32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        crate::config::AppConfig::default().voice_settings()
    }
}

/// Playable audio handed to the audio output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioClip {
    /// Audio that still has to be fetched.
    Remote(String),
    /// Encoded audio already in memory.
    Bytes(Vec<u8>),
}

#[async_trait]
pub trait SpeechProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    async fn synthesize(
        &self,
        phrase: &str,
        voice: &VoiceSettings,
    ) -> Result<AudioClip, SynthesisError>;
}
