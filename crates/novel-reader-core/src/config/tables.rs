use super::defaults;
use super::models::{AppConfig, LogLevel, PlatformHint};
use crate::speech::ProviderKind;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub(super) struct ConfigTables {
    #[serde(default)]
    reading: ReadingConfig,
    #[serde(default)]
    timing: TimingConfig,
    #[serde(default)]
    tts: TtsConfig,
    #[serde(default)]
    logging: LoggingConfig,
    #[serde(default)]
    storage: StorageConfig,
}

impl From<ConfigTables> for AppConfig {
    fn from(tables: ConfigTables) -> Self {
        AppConfig {
            words_per_page: tables.reading.words_per_page,
            skip_words: tables.reading.skip_words,
            max_phrase_words: tables.reading.max_phrase_words,
            resume_after_navigation: tables.reading.resume_after_navigation,
            pacing_ms: tables.timing.pacing_ms,
            synthesis_retry_ms: tables.timing.synthesis_retry_ms,
            playback_error_retry_ms: tables.timing.playback_error_retry_ms,
            blocked_retry_ms: tables.timing.blocked_retry_ms,
            unlock_retry_ms: tables.timing.unlock_retry_ms,
            tts_provider: tables.tts.provider,
            tts_voice: tables.tts.voice,
            tts_speed: tables.tts.speed,
            tts_pitch: tables.tts.pitch,
            platform: tables.tts.platform,
            primary_endpoint: tables.tts.primary_endpoint,
            primary_language: tables.tts.primary_language,
            primary_client: tables.tts.primary_client,
            secondary_endpoint: tables.tts.secondary_endpoint,
            secondary_model: tables.tts.secondary_model,
            request_timeout_secs: tables.tts.request_timeout_secs,
            log_level: tables.logging.log_level,
            cache_dir: tables.storage.cache_dir,
        }
    }
}

impl From<&AppConfig> for ConfigTables {
    fn from(config: &AppConfig) -> Self {
        ConfigTables {
            reading: ReadingConfig {
                words_per_page: config.words_per_page,
                skip_words: config.skip_words,
                max_phrase_words: config.max_phrase_words,
                resume_after_navigation: config.resume_after_navigation,
            },
            timing: TimingConfig {
                pacing_ms: config.pacing_ms,
                synthesis_retry_ms: config.synthesis_retry_ms,
                playback_error_retry_ms: config.playback_error_retry_ms,
                blocked_retry_ms: config.blocked_retry_ms,
                unlock_retry_ms: config.unlock_retry_ms,
            },
            tts: TtsConfig {
                provider: config.tts_provider,
                voice: config.tts_voice.clone(),
                speed: config.tts_speed,
                pitch: config.tts_pitch,
                platform: config.platform,
                primary_endpoint: config.primary_endpoint.clone(),
                primary_language: config.primary_language.clone(),
                primary_client: config.primary_client.clone(),
                secondary_endpoint: config.secondary_endpoint.clone(),
                secondary_model: config.secondary_model.clone(),
                request_timeout_secs: config.request_timeout_secs,
            },
            logging: LoggingConfig {
                log_level: config.log_level,
            },
            storage: StorageConfig {
                cache_dir: config.cache_dir.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct ReadingConfig {
    #[serde(default = "defaults::default_words_per_page")]
    words_per_page: usize,
    #[serde(default = "defaults::default_skip_words")]
    skip_words: usize,
    #[serde(default = "defaults::default_max_phrase_words")]
    max_phrase_words: usize,
    #[serde(default = "defaults::default_resume_after_navigation")]
    resume_after_navigation: bool,
}

impl Default for ReadingConfig {
    fn default() -> Self {
        ReadingConfig {
            words_per_page: defaults::default_words_per_page(),
            skip_words: defaults::default_skip_words(),
            max_phrase_words: defaults::default_max_phrase_words(),
            resume_after_navigation: defaults::default_resume_after_navigation(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct TimingConfig {
    #[serde(default = "defaults::default_pacing_ms")]
    pacing_ms: u64,
    #[serde(default = "defaults::default_synthesis_retry_ms")]
    synthesis_retry_ms: u64,
    #[serde(default = "defaults::default_playback_error_retry_ms")]
    playback_error_retry_ms: u64,
    #[serde(default = "defaults::default_blocked_retry_ms")]
    blocked_retry_ms: u64,
    #[serde(default = "defaults::default_unlock_retry_ms")]
    unlock_retry_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            pacing_ms: defaults::default_pacing_ms(),
            synthesis_retry_ms: defaults::default_synthesis_retry_ms(),
            playback_error_retry_ms: defaults::default_playback_error_retry_ms(),
            blocked_retry_ms: defaults::default_blocked_retry_ms(),
            unlock_retry_ms: defaults::default_unlock_retry_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct TtsConfig {
    #[serde(default = "defaults::default_provider")]
    provider: ProviderKind,
    #[serde(default = "defaults::default_voice")]
    voice: String,
    #[serde(default = "defaults::default_tts_speed")]
    speed: f32,
    #[serde(default = "defaults::default_tts_pitch")]
    pitch: f32,
    #[serde(default)]
    platform: PlatformHint,
    #[serde(default = "defaults::default_primary_endpoint")]
    primary_endpoint: String,
    #[serde(default = "defaults::default_primary_language")]
    primary_language: String,
    #[serde(default = "defaults::default_primary_client")]
    primary_client: String,
    #[serde(default = "defaults::default_secondary_endpoint")]
    secondary_endpoint: String,
    #[serde(default = "defaults::default_secondary_model")]
    secondary_model: String,
    #[serde(default = "defaults::default_request_timeout_secs")]
    request_timeout_secs: u64,
}

impl Default for TtsConfig {
    fn default() -> Self {
        TtsConfig {
            provider: defaults::default_provider(),
            voice: defaults::default_voice(),
            speed: defaults::default_tts_speed(),
            pitch: defaults::default_tts_pitch(),
            platform: PlatformHint::default(),
            primary_endpoint: defaults::default_primary_endpoint(),
            primary_language: defaults::default_primary_language(),
            primary_client: defaults::default_primary_client(),
            secondary_endpoint: defaults::default_secondary_endpoint(),
            secondary_model: defaults::default_secondary_model(),
            request_timeout_secs: defaults::default_request_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct LoggingConfig {
    #[serde(default = "defaults::default_log_level")]
    log_level: LogLevel,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            log_level: defaults::default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct StorageConfig {
    #[serde(default = "defaults::default_cache_dir")]
    cache_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            cache_dir: defaults::default_cache_dir(),
        }
    }
}
