use super::{AudioClip, PrimaryProvider, ProviderKind, SecondaryProvider, SpeechProvider, VoiceSettings};
use crate::config::AppConfig;
use std::sync::Arc;
use tracing::warn;

/// Picks the provider for a phrase and falls back to the other one once.
#[derive(Clone)]
pub struct SpeechRouter {
    primary: Arc<dyn SpeechProvider>,
    secondary: Arc<dyn SpeechProvider>,
    touch_primary: bool,
}

impl SpeechRouter {
    pub fn new(
        primary: Arc<dyn SpeechProvider>,
        secondary: Arc<dyn SpeechProvider>,
        touch_primary: bool,
    ) -> Self {
        Self {
            primary,
            secondary,
            touch_primary,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            Arc::new(PrimaryProvider::from_config(config)),
            Arc::new(SecondaryProvider::from_config(config)),
            config.platform.is_touch_primary(),
        )
    }

    /// Touch-primary platforms always start with the secondary provider.
    pub fn first_choice(&self, voice: &VoiceSettings) -> ProviderKind {
        if self.touch_primary {
            ProviderKind::Secondary
        } else {
            voice.provider
        }
    }

    fn provider(&self, kind: ProviderKind) -> &Arc<dyn SpeechProvider> {
        match kind {
            ProviderKind::Primary => &self.primary,
            ProviderKind::Secondary => &self.secondary,
        }
    }

    /// `None` means neither provider produced audio.
    pub async fn synthesize(&self, phrase: &str, voice: &VoiceSettings) -> Option<AudioClip> {
        let first = self.first_choice(voice);
        match self.provider(first).synthesize(phrase, voice).await {
            Ok(clip) => return Some(clip),
            Err(err) => warn!(provider = %first, "Speech generation failed: {err}"),
        }

        let fallback = first.other();
        match self.provider(fallback).synthesize(phrase, voice).await {
            Ok(clip) => Some(clip),
            Err(err) => {
                warn!(provider = %fallback, "Fallback speech generation also failed: {err}");
                None
            }
        }
    }
}
