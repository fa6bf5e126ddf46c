use super::{AudioClip, ProviderKind, SpeechProvider, VoiceSettings};
use crate::config::AppConfig;
use crate::error::SynthesisError;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// JSON speech endpoint returning encoded audio bytes.
#[derive(Debug, Clone)]
pub struct SecondaryProvider {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    speed: f32,
}

impl SecondaryProvider {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.secondary_endpoint.clone(),
            config.secondary_model.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }
}

#[async_trait]
impl SpeechProvider for SecondaryProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Secondary
    }

    async fn synthesize(
        &self,
        phrase: &str,
        voice: &VoiceSettings,
    ) -> Result<AudioClip, SynthesisError> {
        let body = SpeechRequest {
            model: &self.model,
            input: phrase,
            voice: &voice.voice_id,
            speed: voice.speed,
        };
        let response = self.client.post(&self.endpoint).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SynthesisError::Status(status.as_u16()));
        }
        let bytes = response.bytes().await?;
        debug!(bytes = bytes.len(), "Received synthesized audio");
        Ok(AudioClip::Bytes(bytes.to_vec()))
    }
}
