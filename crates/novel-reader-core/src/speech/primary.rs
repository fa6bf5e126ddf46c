use super::{AudioClip, ProviderKind, SpeechProvider, VoiceSettings};
use crate::config::AppConfig;
use crate::error::SynthesisError;
use async_trait::async_trait;
use reqwest::Url;

/// Query-string endpoint. Synthesis only builds the URL; the audio output
/// fetches it when the clip is loaded.
#[derive(Debug, Clone)]
pub struct PrimaryProvider {
    endpoint: String,
    language: String,
    client_tag: String,
}

impl PrimaryProvider {
    pub fn new(
        endpoint: impl Into<String>,
        language: impl Into<String>,
        client_tag: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            language: language.into(),
            client_tag: client_tag.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.primary_endpoint.clone(),
            config.primary_language.clone(),
            config.primary_client.clone(),
        )
    }

    pub fn audio_url(&self, phrase: &str, speed: f32) -> Result<Url, SynthesisError> {
        let speed = speed.to_string();
        Url::parse_with_params(
            &self.endpoint,
            &[
                ("ie", "UTF-8"),
                ("q", phrase),
                ("tl", self.language.as_str()),
                ("client", self.client_tag.as_str()),
                ("ttsspeed", speed.as_str()),
            ],
        )
        .map_err(|err| SynthesisError::InvalidEndpoint(format!("{}: {err}", self.endpoint)))
    }
}

#[async_trait]
impl SpeechProvider for PrimaryProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Primary
    }

    async fn synthesize(
        &self,
        phrase: &str,
        voice: &VoiceSettings,
    ) -> Result<AudioClip, SynthesisError> {
        let url = self.audio_url(phrase, voice.speed)?;
        Ok(AudioClip::Remote(url.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_carries_text_language_client_and_speed() {
        let provider = PrimaryProvider::new("https://tts.example.com/translate_tts", "en", "tw-ob");
        let url = provider.audio_url("Hello, world & more", 1.5).unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("ie".to_string(), "UTF-8".to_string()),
                ("q".to_string(), "Hello, world & more".to_string()),
                ("tl".to_string(), "en".to_string()),
                ("client".to_string(), "tw-ob".to_string()),
                ("ttsspeed".to_string(), "1.5".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn synthesis_returns_a_remote_clip() {
        let provider = PrimaryProvider::from_config(&AppConfig::default());
        let clip = provider
            .synthesize("Hi.", &VoiceSettings::default())
            .await
            .unwrap();
        match clip {
            AudioClip::Remote(url) => {
                assert!(url.starts_with("https://translate.google.com/translate_tts?"));
                assert!(url.contains("ttsspeed=1"));
            }
            other => panic!("unexpected clip {other:?}"),
        }
    }

    #[tokio::test]
    async fn bad_endpoint_is_reported() {
        let provider = PrimaryProvider::new("not a url", "en", "tw-ob");
        let err = provider
            .synthesize("Hi.", &VoiceSettings::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SynthesisError::InvalidEndpoint(_)));
    }
}
