use crate::speech::{ProviderKind, VoiceSettings};
use serde::Deserialize;
use std::time::Duration;

pub(crate) const MIN_WORDS_PER_PAGE: usize = 1;
pub(crate) const MAX_WORDS_PER_PAGE: usize = 10_000;
pub(crate) const MIN_PHRASE_WORDS: usize = 1;
pub(crate) const MAX_PHRASE_WORDS: usize = 200;
pub(crate) const MIN_TTS_RATE: f32 = 0.5;
pub(crate) const MAX_TTS_RATE: f32 = 2.0;

/// High-level app configuration, flattened from the TOML tables.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub words_per_page: usize,
    pub skip_words: usize,
    pub max_phrase_words: usize,
    pub resume_after_navigation: bool,
    pub pacing_ms: u64,
    pub synthesis_retry_ms: u64,
    pub playback_error_retry_ms: u64,
    pub blocked_retry_ms: u64,
    pub unlock_retry_ms: u64,
    pub tts_provider: ProviderKind,
    pub tts_voice: String,
    pub tts_speed: f32,
    pub tts_pitch: f32,
    pub platform: PlatformHint,
    pub primary_endpoint: String,
    pub primary_language: String,
    pub primary_client: String,
    pub secondary_endpoint: String,
    pub secondary_model: String,
    pub request_timeout_secs: u64,
    pub log_level: LogLevel,
    pub cache_dir: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        use crate::config::defaults::*;
        AppConfig {
            words_per_page: default_words_per_page(),
            skip_words: default_skip_words(),
            max_phrase_words: default_max_phrase_words(),
            resume_after_navigation: default_resume_after_navigation(),
            pacing_ms: default_pacing_ms(),
            synthesis_retry_ms: default_synthesis_retry_ms(),
            playback_error_retry_ms: default_playback_error_retry_ms(),
            blocked_retry_ms: default_blocked_retry_ms(),
            unlock_retry_ms: default_unlock_retry_ms(),
            tts_provider: default_provider(),
            tts_voice: default_voice(),
            tts_speed: default_tts_speed(),
            tts_pitch: default_tts_pitch(),
            platform: PlatformHint::default(),
            primary_endpoint: default_primary_endpoint(),
            primary_language: default_primary_language(),
            primary_client: default_primary_client(),
            secondary_endpoint: default_secondary_endpoint(),
            secondary_model: default_secondary_model(),
            request_timeout_secs: default_request_timeout_secs(),
            log_level: default_log_level(),
            cache_dir: default_cache_dir(),
        }
    }
}

impl AppConfig {
    /// Clamp numeric settings into the ranges the engine supports.
    pub fn normalized(mut self) -> Self {
        self.words_per_page = self
            .words_per_page
            .clamp(MIN_WORDS_PER_PAGE, MAX_WORDS_PER_PAGE);
        self.max_phrase_words = self
            .max_phrase_words
            .clamp(MIN_PHRASE_WORDS, MAX_PHRASE_WORDS);
        self.tts_speed = clamp_rate(self.tts_speed);
        self.tts_pitch = clamp_rate(self.tts_pitch);
        self.request_timeout_secs = self.request_timeout_secs.max(1);
        self
    }

    pub fn voice_settings(&self) -> VoiceSettings {
        VoiceSettings {
            voice_id: self.tts_voice.clone(),
            provider: self.tts_provider,
            speed: self.tts_speed,
            pitch: self.tts_pitch,
        }
    }

    pub fn timing(&self) -> Timing {
        Timing {
            pacing: Duration::from_millis(self.pacing_ms),
            synthesis_retry: Duration::from_millis(self.synthesis_retry_ms),
            playback_error_retry: Duration::from_millis(self.playback_error_retry_ms),
            blocked_retry: Duration::from_millis(self.blocked_retry_ms),
            unlock_retry: Duration::from_millis(self.unlock_retry_ms),
        }
    }
}

pub(crate) fn clamp_rate(value: f32) -> f32 {
    if value.is_nan() {
        return 1.0;
    }
    value.clamp(MIN_TTS_RATE, MAX_TTS_RATE)
}

/// Fixed delays used by the phrase loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub pacing: Duration,
    pub synthesis_retry: Duration,
    pub playback_error_retry: Duration,
    pub blocked_retry: Duration,
    pub unlock_retry: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        AppConfig::default().timing()
    }
}

/// Platform the reader runs on; touch-primary platforms prefer the
/// secondary speech provider.
#[derive(Debug, Clone, Copy, Deserialize, serde::Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlatformHint {
    #[default]
    Auto,
    Desktop,
    Touch,
}

impl PlatformHint {
    pub fn is_touch_primary(self) -> bool {
        match self {
            PlatformHint::Touch => true,
            PlatformHint::Desktop => false,
            PlatformHint::Auto => cfg!(any(target_os = "ios", target_os = "android")),
        }
    }
}

/// Supported logging verbosity levels.
#[derive(Debug, Clone, Copy, Deserialize, serde::Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_filter_str())
    }
}

impl LogLevel {
    pub fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
